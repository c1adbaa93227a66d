//! Saving generated media to the output directories.

use super::error::BackendFailure;
use chrono::Local;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Choose a fresh `<prefix>_<YYYYmmdd_HHMMSS>.<extension>` path in `dir`.
///
/// Two artifacts requested within the same second get a numeric suffix
/// instead of overwriting each other.
pub fn artifact_path(dir: &Path, prefix: &str, extension: &str) -> PathBuf {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let candidate = dir.join(format!("{}_{}.{}", prefix, timestamp, extension));
    if !candidate.exists() {
        return candidate;
    }

    (1u32..)
        .map(|n| dir.join(format!("{}_{}_{}.{}", prefix, timestamp, n, extension)))
        .find(|path| !path.exists())
        .unwrap_or(candidate)
}

/// Fetch the bytes behind a vendor-hosted media URL
pub async fn download(
    client: &reqwest::Client,
    backend: &str,
    url: &str,
) -> Result<Vec<u8>, BackendFailure> {
    debug!(backend, url, "Downloading generated artifact");
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| BackendFailure::from_reqwest(backend, e))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(BackendFailure::from_status(backend, status.as_u16(), body));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| BackendFailure::from_reqwest(backend, e))?;
    Ok(bytes.to_vec())
}

/// Write an artifact, creating its directory if it vanished since startup
pub async fn save(backend: &str, path: &Path, contents: &[u8]) -> Result<(), BackendFailure> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| BackendFailure::io(backend, format!("{}: {}", parent.display(), e)))?;
    }
    tokio::fs::write(path, contents)
        .await
        .map_err(|e| BackendFailure::io(backend, format!("{}: {}", path.display(), e)))?;
    debug!(backend, path = %path.display(), bytes = contents.len(), "Artifact saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_artifact_path_shape() {
        let dir = tempdir().unwrap();
        let path = artifact_path(dir.path(), "dalle", "png");
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("dalle_"));
        assert!(name.ends_with(".png"));
        // dalle_ + YYYYmmdd_HHMMSS + .png
        assert_eq!(name.len(), "dalle_".len() + 15 + ".png".len());
    }

    #[test]
    fn test_artifact_path_avoids_collisions() {
        let dir = tempdir().unwrap();
        let first = artifact_path(dir.path(), "video", "mp4");
        std::fs::write(&first, b"x").unwrap();
        let second = artifact_path(dir.path(), "video", "mp4");
        assert_ne!(first, second);
        assert!(!second.exists());
    }

    #[tokio::test]
    async fn test_save_creates_missing_directory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gone").join("clip.txt");
        save("placeholder", &path, b"hello").await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"hello");
    }
}
