// Application settings
// Loaded from ~/.config/expensor/settings.json

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

pub const DEFAULT_ENDPOINT: &str = "https://dashscope.aliyuncs.com/compatible-mode/v1";
pub const DEFAULT_MODEL: &str = "qwen-vl-max";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Recognition
    #[serde(rename = "recognition.endpoint")]
    pub endpoint: String,

    #[serde(rename = "recognition.model")]
    pub model: String,

    // Batch
    #[serde(rename = "batch.maxConcurrency")]
    pub max_concurrency: usize,

    #[serde(rename = "batch.timeoutSecs")]
    pub timeout_secs: u64,

    #[serde(rename = "batch.maxRetries")]
    pub max_retries: u32,

    #[serde(rename = "batch.retryBaseDelayMs")]
    pub retry_base_delay_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            // Low-resource default; raise for paid endpoints
            max_concurrency: 2,
            timeout_secs: 60,
            max_retries: 3,
            retry_base_delay_ms: 1000,
        }
    }
}

const DEFAULT_FILE: &str = r#"{
    // Recognition endpoint (OpenAI-compatible chat completions)
    // The API key is stored in the system keychain or EXPENSOR_API_KEY,
    // never in this file
    "recognition.endpoint": "https://dashscope.aliyuncs.com/compatible-mode/v1",
    "recognition.model": "qwen-vl-max",

    // Batch processing
    "batch.maxConcurrency": 2,
    "batch.timeoutSecs": 60,
    "batch.maxRetries": 3,
    "batch.retryBaseDelayMs": 1000
}
"#;

impl Settings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("expensor");
        config_dir.join("settings.json")
    }

    /// Load settings from disk, falling back to defaults
    pub fn load() -> Self {
        let path = Self::config_path();

        if !path.exists() {
            if let Err(e) = Self::create_default_file(&path) {
                log::warn!("could not write default settings.json: {}", e);
            }
            return Self::default();
        }

        match Self::load_from(&path) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("{}; using default settings", e);
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::parse(&contents)
    }

    /// Parse settings JSON, ignoring `//` comment lines.
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        let cleaned: String = contents
            .lines()
            .filter(|line| !line.trim().starts_with("//"))
            .collect::<Vec<_>>()
            .join("\n");

        serde_json::from_str(&cleaned).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io(e.to_string()))?;
        }

        let json =
            serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))?;

        fs::write(path, json).map_err(|e| ConfigError::Io(e.to_string()))
    }

    /// Create default settings file with comments
    fn create_default_file(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io(e.to_string()))?;
        }
        fs::write(path, DEFAULT_FILE).map_err(|e| ConfigError::Io(e.to_string()))
    }
}
