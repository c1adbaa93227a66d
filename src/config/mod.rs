//! Configuration Management
//!
//! This module loads the configuration snapshot the orchestrator is built from:
//! vendor credentials, default backend per kind, output directories, HTTP client
//! timeouts and the web server address. A TOML file can provide a base and
//! environment variables override it. Empty environment values count as unset.

use crate::utils::logging::obscure_credential;
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Environment variable parsing error: {0}")]
    EnvVarParse(String),
    #[error("File parsing error: {0}")]
    FileParse(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SwitchboardConfig {
    /// Vendor credentials
    #[serde(default)]
    pub credentials: CredentialsConfig,
    /// Default backend per capability kind
    #[serde(default)]
    pub defaults: DefaultsConfig,
    /// Where generated artifacts are written
    #[serde(default)]
    pub output: OutputConfig,
    /// Vendor HTTP client behaviour
    #[serde(default)]
    pub http_client: HttpClientConfig,
    /// Base URL overrides (proxies, self-hosted gateways, tests)
    #[serde(default)]
    pub endpoints: EndpointsConfig,
    /// Web server address
    #[serde(default)]
    pub server: ServerConfig,
}

/// Opaque vendor credentials. A vendor without one is never registered.
#[derive(Clone, Serialize, Deserialize, Default)]
pub struct CredentialsConfig {
    pub openai_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub deepseek_api_key: Option<String>,
    pub xai_api_key: Option<String>,
    pub replicate_api_token: Option<String>,
}

impl std::fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |value: &Option<String>| value.as_deref().map(obscure_credential);
        f.debug_struct("CredentialsConfig")
            .field("openai_api_key", &redact(&self.openai_api_key))
            .field("gemini_api_key", &redact(&self.gemini_api_key))
            .field("deepseek_api_key", &redact(&self.deepseek_api_key))
            .field("xai_api_key", &redact(&self.xai_api_key))
            .field("replicate_api_token", &redact(&self.replicate_api_token))
            .finish()
    }
}

/// Default active selection per kind
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Initial text backend
    #[serde(default = "default_text_provider")]
    pub text_provider: String,
    /// Initial image backend
    #[serde(default = "default_image_generator")]
    pub image_generator: String,
}

/// Output directories for generated media
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_image_dir")]
    pub image_dir: PathBuf,
    #[serde(default = "default_video_dir")]
    pub video_dir: PathBuf,
}

/// Vendor HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpClientConfig {
    /// Timeout for text and image requests, in seconds
    #[serde(with = "duration_seconds", default = "default_request_timeout")]
    pub request_timeout: Duration,
    /// Overall budget for one video generation, in seconds
    #[serde(with = "duration_seconds", default = "default_video_timeout")]
    pub video_timeout: Duration,
    /// Delay between prediction status checks, in seconds
    #[serde(with = "duration_seconds", default = "default_poll_interval")]
    pub poll_interval: Duration,
}

/// Base URL overrides. `None` means the vendor's public endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EndpointsConfig {
    pub openai_base_url: Option<String>,
    pub gemini_base_url: Option<String>,
    pub deepseek_base_url: Option<String>,
    pub grok_base_url: Option<String>,
    pub replicate_base_url: Option<String>,
}

/// Web server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            text_provider: default_text_provider(),
            image_generator: default_image_generator(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            image_dir: default_image_dir(),
            video_dir: default_video_dir(),
        }
    }
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: default_request_timeout(),
            video_timeout: default_video_timeout(),
            poll_interval: default_poll_interval(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl SwitchboardConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;

        match path.extension().and_then(|s| s.to_str()) {
            Some("toml") => {
                toml::from_str(&content).map_err(|e| ConfigError::FileParse(e.to_string()))
            }
            _ => Err(ConfigError::FileParse(format!(
                "Unsupported file format for {}. Use .toml",
                path.display()
            ))),
        }
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().merge_with_env()
    }

    /// Apply environment variable overrides (environment takes precedence)
    pub fn merge_with_env(self) -> Result<Self, ConfigError> {
        self.merge_with(env_lookup)
    }

    /// Apply overrides from an arbitrary variable source
    pub fn merge_with<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Credentials
        let credentials = &mut self.credentials;
        for (var, slot) in [
            ("OPENAI_API_KEY", &mut credentials.openai_api_key),
            ("GEMINI_API_KEY", &mut credentials.gemini_api_key),
            ("DEEPSEEK_API_KEY", &mut credentials.deepseek_api_key),
            ("XAI_API_KEY", &mut credentials.xai_api_key),
            ("REPLICATE_API_TOKEN", &mut credentials.replicate_api_token),
        ] {
            if let Some(value) = lookup(var) {
                *slot = Some(value);
            }
        }

        // Defaults
        if let Some(provider) = lookup("DEFAULT_AI_PROVIDER") {
            self.defaults.text_provider = provider.to_lowercase();
        }
        if let Some(generator) = lookup("DEFAULT_IMAGE_GENERATOR") {
            self.defaults.image_generator = generator.to_lowercase();
        }

        // Output directories
        if let Some(dir) = lookup("IMAGE_OUTPUT_DIR") {
            self.output.image_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("VIDEO_OUTPUT_DIR") {
            self.output.video_dir = PathBuf::from(dir);
        }

        // HTTP client
        if let Some(timeout) = lookup("SWITCHBOARD_REQUEST_TIMEOUT") {
            self.http_client.request_timeout =
                Duration::from_secs(timeout.parse().map_err(|e| {
                    ConfigError::EnvVarParse(format!("SWITCHBOARD_REQUEST_TIMEOUT: {}", e))
                })?);
        }
        if let Some(timeout) = lookup("SWITCHBOARD_VIDEO_TIMEOUT") {
            self.http_client.video_timeout =
                Duration::from_secs(timeout.parse().map_err(|e| {
                    ConfigError::EnvVarParse(format!("SWITCHBOARD_VIDEO_TIMEOUT: {}", e))
                })?);
        }

        // Endpoints
        let endpoints = &mut self.endpoints;
        for (var, slot) in [
            ("OPENAI_BASE_URL", &mut endpoints.openai_base_url),
            ("GEMINI_BASE_URL", &mut endpoints.gemini_base_url),
            ("REPLICATE_BASE_URL", &mut endpoints.replicate_base_url),
        ] {
            if let Some(value) = lookup(var) {
                *slot = Some(value);
            }
        }

        // Server
        if let Some(host) = lookup("SWITCHBOARD_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("SWITCHBOARD_PORT") {
            self.server.port = port
                .parse()
                .map_err(|e| ConfigError::EnvVarParse(format!("SWITCHBOARD_PORT: {}", e)))?;
        }

        Ok(self)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.defaults.text_provider.is_empty() {
            return Err(ConfigError::Validation(
                "Default text provider cannot be empty".to_string(),
            ));
        }
        if self.defaults.image_generator.is_empty() {
            return Err(ConfigError::Validation(
                "Default image generator cannot be empty".to_string(),
            ));
        }

        // The default text provider must be usable out of the box
        if let Some((var, credential)) = self.credential_for(&self.defaults.text_provider) {
            if credential.is_none() {
                return Err(ConfigError::Validation(format!(
                    "{} is required when the default text provider is '{}'",
                    var, self.defaults.text_provider
                )));
            }
        }

        if self.http_client.request_timeout.is_zero() {
            return Err(ConfigError::Validation(
                "Request timeout must be greater than 0".to_string(),
            ));
        }
        if self.http_client.video_timeout.is_zero() {
            return Err(ConfigError::Validation(
                "Video timeout must be greater than 0".to_string(),
            ));
        }
        if self.http_client.poll_interval.is_zero() {
            return Err(ConfigError::Validation(
                "Poll interval must be greater than 0".to_string(),
            ));
        }
        for (name, base_url) in [
            ("openai", &self.endpoints.openai_base_url),
            ("gemini", &self.endpoints.gemini_base_url),
            ("deepseek", &self.endpoints.deepseek_base_url),
            ("grok", &self.endpoints.grok_base_url),
            ("replicate", &self.endpoints.replicate_base_url),
        ] {
            if let Some(base_url) = base_url {
                url::Url::parse(base_url).map_err(|e| {
                    ConfigError::Validation(format!("Invalid {} base URL '{}': {}", name, base_url, e))
                })?;
            }
        }

        if self.output.image_dir.as_os_str().is_empty()
            || self.output.video_dir.as_os_str().is_empty()
        {
            return Err(ConfigError::Validation(
                "Output directories cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Create the image and video output directories
    pub fn ensure_output_dirs(&self) -> Result<(), ConfigError> {
        fs::create_dir_all(&self.output.image_dir)?;
        fs::create_dir_all(&self.output.video_dir)?;
        Ok(())
    }

    /// Credential variable and value a credentialed text provider depends on
    fn credential_for(&self, provider: &str) -> Option<(&'static str, Option<&String>)> {
        let credentials = &self.credentials;
        match provider {
            "openai" => Some(("OPENAI_API_KEY", credentials.openai_api_key.as_ref())),
            "gemini" => Some(("GEMINI_API_KEY", credentials.gemini_api_key.as_ref())),
            "deepseek" => Some(("DEEPSEEK_API_KEY", credentials.deepseek_api_key.as_ref())),
            "grok" => Some(("XAI_API_KEY", credentials.xai_api_key.as_ref())),
            _ => None,
        }
    }
}

/// Read a process environment variable, treating empty values as unset
fn env_lookup(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Custom serialization for Duration as seconds
mod duration_seconds {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// Default value functions for serde
fn default_text_provider() -> String {
    "duckduckgo".to_string()
}

fn default_image_generator() -> String {
    "dalle".to_string()
}

fn default_image_dir() -> PathBuf {
    PathBuf::from("generated_images")
}

fn default_video_dir() -> PathBuf {
    PathBuf::from("generated_videos")
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(60)
}

fn default_video_timeout() -> Duration {
    Duration::from_secs(600)
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(2)
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::{tempdir, NamedTempFile};

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = SwitchboardConfig::default();
        assert_eq!(config.defaults.text_provider, "duckduckgo");
        assert_eq!(config.defaults.image_generator, "dalle");
        assert_eq!(config.output.image_dir, PathBuf::from("generated_images"));
        assert_eq!(config.http_client.request_timeout, Duration::from_secs(60));
        assert_eq!(config.server.port, 5000);
        assert!(config.credentials.openai_api_key.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = SwitchboardConfig::default();
        config.defaults.text_provider = "openai".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("OPENAI_API_KEY"));

        config.credentials.openai_api_key = Some("sk-test".to_string());
        assert!(config.validate().is_ok());

        config.http_client.request_timeout = Duration::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        let mut config = SwitchboardConfig::default();
        config.http_client.poll_interval = Duration::ZERO;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Poll interval"));
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let mut config = SwitchboardConfig::default();
        config.endpoints.grok_base_url = Some("not a url".to_string());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("grok base URL"));

        config.endpoints.grok_base_url = Some("http://127.0.0.1:8080/v1".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_config_loading() {
        let toml_content = r#"
[credentials]
gemini_api_key = "gem-key"

[defaults]
text_provider = "gemini"

[output]
image_dir = "out/img"

[http_client]
request_timeout = 15
video_timeout = 900

[server]
port = 8080
"#;

        let temp_file = NamedTempFile::with_suffix(".toml").unwrap();
        std::fs::write(temp_file.path(), toml_content).unwrap();

        let config = SwitchboardConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.credentials.gemini_api_key.as_deref(), Some("gem-key"));
        assert_eq!(config.defaults.text_provider, "gemini");
        assert_eq!(config.defaults.image_generator, "dalle");
        assert_eq!(config.output.image_dir, PathBuf::from("out/img"));
        assert_eq!(config.output.video_dir, PathBuf::from("generated_videos"));
        assert_eq!(config.http_client.request_timeout, Duration::from_secs(15));
        assert_eq!(config.http_client.poll_interval, Duration::from_secs(2));
        assert_eq!(config.server.port, 8080);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unsupported_file_format() {
        let temp_file = NamedTempFile::with_suffix(".ini").unwrap();
        let err = SwitchboardConfig::from_file(temp_file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::FileParse(_)));
    }

    #[test]
    fn test_overrides_take_precedence() {
        let mut base = SwitchboardConfig::default();
        base.server.host = "127.0.0.1".to_string();

        let config = base
            .merge_with(vars(&[
                ("OPENAI_API_KEY", "sk-abc"),
                ("DEFAULT_AI_PROVIDER", "OpenAI"),
                ("VIDEO_OUTPUT_DIR", "/tmp/videos"),
                ("SWITCHBOARD_PORT", "9000"),
                ("GEMINI_BASE_URL", "http://localhost:1234"),
            ]))
            .unwrap();

        assert_eq!(config.credentials.openai_api_key.as_deref(), Some("sk-abc"));
        assert_eq!(config.defaults.text_provider, "openai");
        assert_eq!(config.output.video_dir, PathBuf::from("/tmp/videos"));
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(
            config.endpoints.gemini_base_url.as_deref(),
            Some("http://localhost:1234")
        );
    }

    #[test]
    fn test_invalid_numeric_override() {
        let err = SwitchboardConfig::default()
            .merge_with(vars(&[("SWITCHBOARD_REQUEST_TIMEOUT", "soon")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::EnvVarParse(_)));
    }

    #[test]
    fn test_debug_redacts_credentials() {
        let mut config = SwitchboardConfig::default();
        config.credentials.openai_api_key = Some("sk-1234567890abcdef".to_string());
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("sk-1234567890abcdef"));
    }

    #[test]
    fn test_ensure_output_dirs() {
        let dir = tempdir().unwrap();
        let mut config = SwitchboardConfig::default();
        config.output.image_dir = dir.path().join("images");
        config.output.video_dir = dir.path().join("nested").join("videos");

        config.ensure_output_dirs().unwrap();
        assert!(config.output.image_dir.is_dir());
        assert!(config.output.video_dir.is_dir());
    }
}
