//! Generation options shared by every capability.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Default sampling temperature
pub const DEFAULT_TEMPERATURE: f64 = 0.7;
/// Default output truncation bound
pub const DEFAULT_MAX_OUTPUT_UNITS: u32 = 1000;
/// Default image size
pub const DEFAULT_IMAGE_SIZE: &str = "1024x1024";
/// Default image quality
pub const DEFAULT_IMAGE_QUALITY: &str = "standard";
/// Default number of video frames
pub const DEFAULT_NUM_FRAMES: u32 = 24;
/// Default video frame rate
pub const DEFAULT_FPS: u32 = 8;

/// Configuration bag passed to every generation call.
///
/// The common keys are typed fields. Kind-specific keys (`size`, `quality`,
/// `num_frames`, `fps`) live in `extra` and are read through accessors that
/// fall back to defaults; any other key is carried along and ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Sampling randomness
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    /// Truncation bound for the generated output
    #[serde(default = "default_max_output_units")]
    pub max_output_units: u32,
    /// Override of the adapter's default model identifier
    #[serde(default)]
    pub model: Option<String>,
    /// Kind-specific and unrecognized keys
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            max_output_units: DEFAULT_MAX_OUTPUT_UNITS,
            model: None,
            extra: HashMap::new(),
        }
    }
}

impl GenerationOptions {
    /// Create options with every default
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the temperature
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the output bound
    pub fn with_max_output_units(mut self, max_output_units: u32) -> Self {
        self.max_output_units = max_output_units;
        self
    }

    /// Override the model
    pub fn with_model<S: Into<String>>(mut self, model: S) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Add an extra key
    pub fn with_param<K: Into<String>>(mut self, key: K, value: serde_json::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Model override, or the adapter's default
    pub fn model_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.model.as_deref().unwrap_or(default)
    }

    /// Requested image size
    pub fn size(&self) -> &str {
        self.str_param("size").unwrap_or(DEFAULT_IMAGE_SIZE)
    }

    /// Requested image quality
    pub fn quality(&self) -> &str {
        self.str_param("quality").unwrap_or(DEFAULT_IMAGE_QUALITY)
    }

    /// Requested number of video frames
    pub fn num_frames(&self) -> u32 {
        self.u32_param("num_frames").unwrap_or(DEFAULT_NUM_FRAMES)
    }

    /// Requested video frame rate
    pub fn fps(&self) -> u32 {
        self.u32_param("fps").unwrap_or(DEFAULT_FPS)
    }

    fn str_param(&self, key: &str) -> Option<&str> {
        self.extra.get(key).and_then(|v| v.as_str())
    }

    fn u32_param(&self, key: &str) -> Option<u32> {
        self.extra
            .get(key)
            .and_then(|v| v.as_u64())
            .and_then(|v| u32::try_from(v).ok())
    }
}

fn default_temperature() -> f64 {
    DEFAULT_TEMPERATURE
}

fn default_max_output_units() -> u32 {
    DEFAULT_MAX_OUTPUT_UNITS
}
