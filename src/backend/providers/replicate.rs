//! Replicate text-to-video adapter.
//!
//! Creates a prediction, polls it until it reaches a terminal state, then
//! downloads the produced clip to `video_<timestamp>.mp4`. Individual HTTP
//! calls use the regular request timeout; the whole generation is bounded by
//! the separate video timeout.

use super::{http_client, normalize_base_url, send_json};
use crate::backend::artifacts;
use crate::backend::error::BackendFailure;
use crate::backend::traits::VideoCapability;
use crate::types::GenerationOptions;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Public Replicate endpoint
pub const REPLICATE_BASE_URL: &str = "https://api.replicate.com/v1";

/// zeroscope-v2-xl pinned to a known-good version
pub const DEFAULT_MODEL: &str =
    "anotherjesse/zeroscope-v2-xl:9f747673945c62801b13b84701c783929c0ee784e4748ec062204894dda1a351";

const BACKEND: &str = "replicate";

/// Video backend backed by Replicate predictions
#[derive(Debug)]
pub struct ReplicateProvider {
    api_token: String,
    base_url: String,
    output_dir: PathBuf,
    client: reqwest::Client,
    max_wait: Duration,
    poll_interval: Duration,
}

impl ReplicateProvider {
    pub fn new(
        api_token: String,
        base_url: Option<String>,
        output_dir: PathBuf,
        request_timeout: Duration,
        max_wait: Duration,
        poll_interval: Duration,
    ) -> reqwest::Result<Self> {
        Ok(Self {
            api_token,
            base_url: normalize_base_url(base_url, REPLICATE_BASE_URL),
            output_dir,
            client: http_client(request_timeout)?,
            max_wait,
            poll_interval,
        })
    }

    /// Build the create-prediction request for `owner/name[:version]`
    fn create_request(&self, model: &str, input: Value) -> reqwest::RequestBuilder {
        let (url, body) = match model.split_once(':') {
            Some((_, version)) => (
                format!("{}/predictions", self.base_url),
                json!({"version": version, "input": input}),
            ),
            None => (
                format!("{}/models/{}/predictions", self.base_url, model),
                json!({"input": input}),
            ),
        };
        self.client
            .post(url)
            .bearer_auth(&self.api_token)
            .json(&body)
    }

    /// Poll until the prediction succeeds, fails, or the budget runs out
    async fn wait_for(&self, mut prediction: Value, started: Instant) -> Result<Value, BackendFailure> {
        let id = prediction
            .get("id")
            .and_then(|i| i.as_str())
            .ok_or_else(|| BackendFailure::malformed(BACKEND, "prediction has no id"))?
            .to_string();

        loop {
            let status = prediction
                .get("status")
                .and_then(|s| s.as_str())
                .unwrap_or("starting")
                .to_string();
            tracing::debug!(prediction = %id, status = %status, "Replicate prediction status");

            match status.as_str() {
                "succeeded" => return Ok(prediction),
                "failed" | "canceled" => {
                    let reason = prediction
                        .get("error")
                        .and_then(|e| e.as_str())
                        .unwrap_or(&status);
                    return Err(BackendFailure::rejected(
                        BACKEND,
                        format!("prediction {} {}: {}", id, status, reason),
                    ));
                }
                _ => {}
            }

            if started.elapsed() >= self.max_wait {
                return Err(BackendFailure::network(
                    BACKEND,
                    format!(
                        "prediction {} did not finish within {}s",
                        id,
                        self.max_wait.as_secs()
                    ),
                ));
            }

            tokio::time::sleep(self.poll_interval).await;
            prediction = send_json(
                BACKEND,
                self.client
                    .get(format!("{}/predictions/{}", self.base_url, id))
                    .bearer_auth(&self.api_token),
            )
            .await?;
        }
    }
}

/// The model's output is a URL or a list whose first entry is the URL
fn output_url(prediction: &Value) -> Option<&str> {
    match prediction.get("output")? {
        Value::String(url) => Some(url.as_str()),
        Value::Array(items) => items.first().and_then(|u| u.as_str()),
        Value::Object(fields) => fields.get("url").and_then(|u| u.as_str()),
        _ => None,
    }
}

#[async_trait]
impl VideoCapability for ReplicateProvider {
    async fn generate_video(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, BackendFailure> {
        let model = options.model_or(DEFAULT_MODEL);
        let input = json!({
            "prompt": prompt,
            "num_frames": options.num_frames(),
            "fps": options.fps(),
        });
        tracing::info!(
            model,
            num_frames = options.num_frames(),
            fps = options.fps(),
            "Creating Replicate prediction"
        );

        let started = Instant::now();
        let created = send_json(BACKEND, self.create_request(model, input)).await?;
        let finished = self.wait_for(created, started).await?;

        let url = output_url(&finished)
            .ok_or_else(|| BackendFailure::malformed(BACKEND, "prediction has no output URL"))?;
        let bytes = artifacts::download(&self.client, BACKEND, url).await?;
        let path = artifacts::artifact_path(&self.output_dir, "video", "mp4");
        artifacts::save(BACKEND, &path, &bytes).await?;

        tracing::info!(
            path = %path.display(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Video saved"
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

    fn provider(server: &MockServer, dir: &std::path::Path, max_wait: Duration) -> ReplicateProvider {
        ReplicateProvider::new(
            "r8_test".into(),
            Some(server.uri()),
            dir.to_path_buf(),
            Duration::from_secs(5),
            max_wait,
            Duration::from_millis(10),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_polls_until_succeeded_and_downloads() {
        let server = MockServer::start().await;
        let dir = tempdir().unwrap();

        Mock::given(method("POST"))
            .and(path("/predictions"))
            .and(header("authorization", "Bearer r8_test"))
            .and(body_partial_json(json!({
                "version": "9f747673945c62801b13b84701c783929c0ee784e4748ec062204894dda1a351",
                "input": {"prompt": "waves at dusk", "num_frames": 24, "fps": 8}
            })))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(json!({"id": "p1", "status": "starting"})),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/predictions/p1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "p1",
                "status": "succeeded",
                "output": [format!("{}/files/clip.mp4", server.uri())]
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/files/clip.mp4"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"MP4".to_vec()))
            .mount(&server)
            .await;

        let saved = provider(&server, dir.path(), Duration::from_secs(5))
            .generate_video("waves at dusk", &GenerationOptions::default())
            .await
            .unwrap();

        let saved = PathBuf::from(saved);
        let name = saved.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("video_") && name.ends_with(".mp4"));
        assert_eq!(std::fs::read(saved).unwrap(), b"MP4");
    }

    #[tokio::test]
    async fn test_unversioned_model_uses_model_endpoint() {
        let server = MockServer::start().await;
        let dir = tempdir().unwrap();

        Mock::given(method("POST"))
            .and(path("/models/acme/clipper/predictions"))
            .and(body_partial_json(json!({"input": {"fps": 12}})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": "p2",
                "status": "failed",
                "error": "CUDA out of memory"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let options = GenerationOptions::new()
            .with_model("acme/clipper")
            .with_param("fps", json!(12));
        let err = provider(&server, dir.path(), Duration::from_secs(5))
            .generate_video("anything", &options)
            .await
            .unwrap_err();
        assert!(matches!(err, BackendFailure::Rejected { .. }));
        assert!(err.to_string().contains("CUDA out of memory"));
    }

    #[tokio::test]
    async fn test_gives_up_after_max_wait() {
        let server = MockServer::start().await;
        let dir = tempdir().unwrap();

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(json!({"id": "p3", "status": "starting"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/predictions/p3"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"id": "p3", "status": "processing"})),
            )
            .mount(&server)
            .await;

        let err = provider(&server, dir.path(), Duration::from_millis(50))
            .generate_video("slow", &GenerationOptions::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("did not finish"));
    }

    #[test]
    fn test_output_url_shapes() {
        assert_eq!(output_url(&json!({"output": "http://x/a.mp4"})), Some("http://x/a.mp4"));
        assert_eq!(output_url(&json!({"output": ["http://x/b.mp4"]})), Some("http://x/b.mp4"));
        assert_eq!(output_url(&json!({"output": null})), None);
    }
}
