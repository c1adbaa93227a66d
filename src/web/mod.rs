//! HTTP surface for an orchestrator.
//!
//! JSON endpoints under `/api` plus static serving of the generated image
//! and video directories. One [`Orchestrator`] is shared by every request
//! behind an async mutex, so chat turns are handled one at a time.

use crate::config::{ServerConfig, SwitchboardConfig};
use crate::error::{Result, SwitchboardError};
use crate::orchestrator::{Orchestrator, Status};
use crate::types::{CapabilityKind, GenerationOptions};
use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::{info, warn};

/// Orchestrator shared across request handlers
pub type SharedOrchestrator = Arc<Mutex<Orchestrator>>;

type ApiResponse = (StatusCode, Json<Value>);

/// Web server wrapping one orchestrator
pub struct WebServer {
    orchestrator: SharedOrchestrator,
    server: ServerConfig,
    image_dir: PathBuf,
    video_dir: PathBuf,
}

impl WebServer {
    pub fn new(orchestrator: Orchestrator, config: &SwitchboardConfig) -> Self {
        Self {
            orchestrator: Arc::new(Mutex::new(orchestrator)),
            server: config.server.clone(),
            image_dir: config.output.image_dir.clone(),
            video_dir: config.output.video_dir.clone(),
        }
    }

    /// Override the bind address from the configuration
    pub fn with_bind(mut self, host: impl Into<String>, port: u16) -> Self {
        self.server.host = host.into();
        self.server.port = port;
        self
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Bind and serve until the process is stopped
    pub async fn start(self) -> Result<()> {
        let bind_addr = self.bind_addr();
        let app = self.create_router();

        info!("Starting web server on {}", bind_addr);
        let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
        axum::serve(listener, app.into_make_service()).await?;

        Ok(())
    }

    /// Router with every API route and the artifact directories mounted
    pub fn create_router(&self) -> Router {
        Router::new()
            .route("/api/status", get(status_handler))
            .route("/api/providers", get(providers_handler))
            .route("/api/switch-provider", post(switch_provider_handler))
            .route("/api/chat", post(chat_handler))
            .route("/api/generate-image", post(generate_image_handler))
            .route("/api/generate-video", post(generate_video_handler))
            .route("/api/reset", post(reset_handler))
            .nest_service("/images", ServeDir::new(&self.image_dir))
            .nest_service("/videos", ServeDir::new(&self.video_dir))
            .layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
            .with_state(self.orchestrator.clone())
    }
}

#[derive(Debug, Deserialize)]
struct SwitchProviderRequest {
    #[serde(default)]
    provider: String,
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    #[serde(default)]
    message: String,
    #[serde(default)]
    provider: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateRequest {
    #[serde(default)]
    prompt: String,
    #[serde(default)]
    provider: Option<String>,
}

/// Reject blank request text
fn require_text<'a>(value: &'a str, field: &str) -> Result<&'a str> {
    if value.trim().is_empty() {
        return Err(SwitchboardError::invalid_input(format!("No {} provided", field)));
    }
    Ok(value)
}

/// Caller mistakes map to 400, everything else to 502
fn error_response(error: SwitchboardError) -> ApiResponse {
    let status = if error.is_user_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::BAD_GATEWAY
    };
    (status, Json(json!({ "error": error.to_string() })))
}

async fn status_handler(State(orchestrator): State<SharedOrchestrator>) -> Json<Status> {
    Json(orchestrator.lock().await.status())
}

async fn providers_handler(State(orchestrator): State<SharedOrchestrator>) -> Json<Value> {
    let orchestrator = orchestrator.lock().await;
    Json(json!({
        "providers": orchestrator.list_identities(CapabilityKind::Text),
        "current": orchestrator.active_selection(CapabilityKind::Text),
    }))
}

async fn switch_provider_handler(
    State(orchestrator): State<SharedOrchestrator>,
    Json(request): Json<SwitchProviderRequest>,
) -> ApiResponse {
    let mut orchestrator = orchestrator.lock().await;
    if orchestrator.set_active_selection(CapabilityKind::Text, &request.provider) {
        (
            StatusCode::OK,
            Json(json!({ "success": true, "provider": request.provider })),
        )
    } else {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "success": false, "error": "Provider not available" })),
        )
    }
}

async fn chat_handler(
    State(orchestrator): State<SharedOrchestrator>,
    Json(request): Json<ChatRequest>,
) -> ApiResponse {
    let message = match require_text(&request.message, "message") {
        Ok(message) => message,
        Err(e) => return error_response(e),
    };

    let mut orchestrator = orchestrator.lock().await;
    let reply = orchestrator
        .chat_reply(message, request.provider.as_deref())
        .await;
    let provider = reply
        .backend
        .or(request.provider)
        .or_else(|| {
            orchestrator
                .active_selection(CapabilityKind::Text)
                .map(str::to_string)
        });

    (
        StatusCode::OK,
        Json(json!({ "response": reply.text, "provider": provider })),
    )
}

async fn generate_image_handler(
    State(orchestrator): State<SharedOrchestrator>,
    Json(request): Json<GenerateRequest>,
) -> ApiResponse {
    generate_artifact(orchestrator, CapabilityKind::Image, "/images", request).await
}

async fn generate_video_handler(
    State(orchestrator): State<SharedOrchestrator>,
    Json(request): Json<GenerateRequest>,
) -> ApiResponse {
    generate_artifact(orchestrator, CapabilityKind::Video, "/videos", request).await
}

async fn generate_artifact(
    orchestrator: SharedOrchestrator,
    kind: CapabilityKind,
    mount: &str,
    request: GenerateRequest,
) -> ApiResponse {
    let prompt = match require_text(&request.prompt, "prompt") {
        Ok(prompt) => prompt,
        Err(e) => return error_response(e),
    };

    let orchestrator = orchestrator.lock().await;
    match orchestrator
        .try_generate(
            kind,
            prompt,
            request.provider.as_deref(),
            &GenerationOptions::default(),
        )
        .await
    {
        Ok(filepath) => {
            let filename = Path::new(&filepath)
                .file_name()
                .map(|name| name.to_string_lossy().to_string())
                .unwrap_or_default();
            (
                StatusCode::OK,
                Json(json!({
                    "success": true,
                    "filepath": filepath,
                    "url": format!("{}/{}", mount, filename),
                })),
            )
        }
        Err(e) => {
            warn!(kind = %kind, error = %e, "Artifact generation failed");
            error_response(e.into())
        }
    }
}

async fn reset_handler(State(orchestrator): State<SharedOrchestrator>) -> Json<Value> {
    orchestrator.lock().await.reset();
    Json(json!({ "success": true }))
}
