//! Fallback video backend.
//!
//! Registered whenever no real video vendor is configured so the video
//! partition is never empty. Instead of a clip it writes a small text file
//! recording what was asked for.

use crate::backend::artifacts;
use crate::backend::error::BackendFailure;
use crate::backend::traits::VideoCapability;
use crate::types::GenerationOptions;
use async_trait::async_trait;
use chrono::Utc;
use std::path::PathBuf;

const BACKEND: &str = "placeholder";

/// Writes `video_placeholder_<timestamp>.txt` describing the request
#[derive(Debug)]
pub struct PlaceholderVideoProvider {
    output_dir: PathBuf,
}

impl PlaceholderVideoProvider {
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }

    fn describe(prompt: &str, options: &GenerationOptions) -> String {
        format!(
            "Video generation requested with prompt:\n{}\n\n\
             Frames: {}\nFPS: {}\nRequested at: {}\n\n\
             Note: To enable actual video generation, set REPLICATE_API_TOKEN.\n\
             Video generation requires additional setup and API access.\n",
            prompt,
            options.num_frames(),
            options.fps(),
            Utc::now().to_rfc3339(),
        )
    }
}

#[async_trait]
impl VideoCapability for PlaceholderVideoProvider {
    async fn generate_video(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, BackendFailure> {
        let path = artifacts::artifact_path(&self.output_dir, "video_placeholder", "txt");
        artifacts::save(BACKEND, &path, Self::describe(prompt, options).as_bytes()).await?;
        tracing::info!(path = %path.display(), "Video placeholder written");
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

    #[tokio::test]
    async fn test_writes_request_description() {
        let dir = tempdir().unwrap();
        let provider = PlaceholderVideoProvider::new(dir.path().to_path_buf());

        let saved = provider
            .generate_video("a cat surfing", &GenerationOptions::default())
            .await
            .unwrap();

        let saved = PathBuf::from(saved);
        let name = saved.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("video_placeholder_"));
        assert!(name.ends_with(".txt"));

        let contents = std::fs::read_to_string(&saved).unwrap();
        assert!(contents.contains("a cat surfing"));
        assert!(contents.contains("Frames: 24"));
        assert!(contents.contains("REPLICATE_API_TOKEN"));
    }

    #[tokio::test]
    async fn test_unwritable_directory_is_a_failure() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"").unwrap();
        let provider = PlaceholderVideoProvider::new(blocker.join("videos"));

        let err = provider
            .generate_video("x", &GenerationOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, BackendFailure::Io { .. }));
    }
}
