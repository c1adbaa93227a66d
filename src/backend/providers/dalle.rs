//! OpenAI DALL-E image adapter.

use super::openai::OPENAI_BASE_URL;
use super::{http_client, normalize_base_url, send_json};
use crate::backend::artifacts;
use crate::backend::error::BackendFailure;
use crate::backend::traits::ImageCapability;
use crate::types::GenerationOptions;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::time::{Duration, Instant};

const BACKEND: &str = "dalle";
const DEFAULT_MODEL: &str = "dall-e-3";

/// Image backend saving `dalle_<timestamp>.png` files
#[derive(Debug)]
pub struct DalleProvider {
    api_key: String,
    base_url: String,
    output_dir: PathBuf,
    client: reqwest::Client,
}

impl DalleProvider {
    pub fn new(
        api_key: String,
        base_url: Option<String>,
        output_dir: PathBuf,
        timeout: Duration,
    ) -> reqwest::Result<Self> {
        Ok(Self {
            api_key,
            base_url: normalize_base_url(base_url, OPENAI_BASE_URL),
            output_dir,
            client: http_client(timeout)?,
        })
    }

    /// Resolve the first image of the response to raw bytes.
    ///
    /// The API returns either a short-lived `url` or inline `b64_json`.
    async fn image_bytes(&self, response: &Value) -> Result<Vec<u8>, BackendFailure> {
        let image = response
            .get("data")
            .and_then(|d| d.as_array())
            .and_then(|d| d.first())
            .ok_or_else(|| BackendFailure::malformed(BACKEND, "missing data array"))?;

        if let Some(revised) = image.get("revised_prompt").and_then(|p| p.as_str()) {
            tracing::debug!(revised_prompt = %revised, "DALL-E revised the prompt");
        }

        if let Some(url) = image.get("url").and_then(|u| u.as_str()) {
            return artifacts::download(&self.client, BACKEND, url).await;
        }
        if let Some(encoded) = image.get("b64_json").and_then(|b| b.as_str()) {
            return STANDARD
                .decode(encoded)
                .map_err(|e| BackendFailure::malformed(BACKEND, format!("invalid b64_json: {}", e)));
        }
        Err(BackendFailure::malformed(
            BACKEND,
            "image entry has neither url nor b64_json",
        ))
    }
}

#[async_trait]
impl ImageCapability for DalleProvider {
    async fn generate_image(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, BackendFailure> {
        let model = options.model_or(DEFAULT_MODEL);
        tracing::info!(
            model,
            size = options.size(),
            quality = options.quality(),
            "Requesting image generation"
        );

        let request_body = json!({
            "model": model,
            "prompt": prompt,
            "size": options.size(),
            "quality": options.quality(),
            "n": 1,
        });

        let start_time = Instant::now();
        let response = send_json(
            BACKEND,
            self.client
                .post(format!("{}/images/generations", self.base_url))
                .bearer_auth(&self.api_key)
                .json(&request_body),
        )
        .await?;

        let bytes = self.image_bytes(&response).await?;
        let path = artifacts::artifact_path(&self.output_dir, "dalle", "png");
        artifacts::save(BACKEND, &path, &bytes).await?;

        tracing::info!(
            path = %path.display(),
            duration_ms = start_time.elapsed().as_millis() as u64,
            "Image saved"
        );
        Ok(path.display().to_string())
    }

    fn name(&self) -> &str {
        BACKEND
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer, dir: &std::path::Path) -> DalleProvider {
        DalleProvider::new(
            "sk-test".into(),
            Some(server.uri()),
            dir.to_path_buf(),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_downloads_url_result() {
        let server = MockServer::start().await;
        let dir = tempdir().unwrap();

        Mock::given(method("POST"))
            .and(path("/images/generations"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({
                "model": "dall-e-3",
                "prompt": "a red fox",
                "size": "1024x1024",
                "quality": "standard",
                "n": 1
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "created": 1700000000,
                "data": [{"url": format!("{}/files/fox.png", server.uri())}]
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/files/fox.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"PNGDATA".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let saved = provider(&server, dir.path())
            .generate_image("a red fox", &GenerationOptions::default())
            .await
            .unwrap();

        let saved = PathBuf::from(saved);
        assert!(saved.starts_with(dir.path()));
        assert!(saved
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("dalle_"));
        assert_eq!(std::fs::read(&saved).unwrap(), b"PNGDATA");
    }

    #[tokio::test]
    async fn test_decodes_inline_result() {
        let server = MockServer::start().await;
        let dir = tempdir().unwrap();

        Mock::given(method("POST"))
            .and(body_partial_json(json!({"size": "512x512"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"b64_json": STANDARD.encode(b"inline")}]
            })))
            .mount(&server)
            .await;

        let options = GenerationOptions::new().with_param("size", json!("512x512"));
        let saved = provider(&server, dir.path())
            .generate_image("tiny", &options)
            .await
            .unwrap();
        assert_eq!(std::fs::read(saved).unwrap(), b"inline");
    }

    #[tokio::test]
    async fn test_content_policy_rejection() {
        let server = MockServer::start().await;
        let dir = tempdir().unwrap();

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": {"message": "Your request was rejected by the safety system.", "code": "content_policy_violation"}
            })))
            .mount(&server)
            .await;

        let err = provider(&server, dir.path())
            .generate_image("bad", &GenerationOptions::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("safety system"));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
