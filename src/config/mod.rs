//! Configuration management for tubesent
//!
//! Loads the TOML configuration, applies profile and environment overrides,
//! and validates the result before any pipeline component is built.

use crate::classifier::BatchErrorPolicy;
use crate::error::{Result, TubesentError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

mod validator;

pub use validator::ConfigValidator;

/// Smallest comment count a run may request
pub const MIN_COMMENTS: usize = 100;
/// Largest comment count a run may request
pub const MAX_COMMENTS: usize = 5000;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(rename = "_meta")]
    pub meta: MetaConfig,
    pub storage: StorageConfig,
    pub youtube: YoutubeConfig,
    pub fetch: FetchConfig,
    #[serde(default)]
    pub normalize: NormalizeConfig,
    pub model: ModelConfig,
    pub aggregate: AggregateConfig,
    #[serde(default)]
    pub profiles: HashMap<String, ProfileOverrides>,
}

/// Metadata about the configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaConfig {
    pub schema_version: String,
    #[serde(default = "current_timestamp")]
    pub created_at: String,
    #[serde(default = "current_timestamp")]
    pub last_modified: String,
}

fn current_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

fn default_stale_analysis_secs() -> u64 {
    3600
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    /// Age after which a saved in-flight analysis is treated as abandoned
    #[serde(default = "default_stale_analysis_secs")]
    pub stale_analysis_secs: u64,
}

/// Video platform API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YoutubeConfig {
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl YoutubeConfig {
    /// Read the API key from the configured environment variable
    pub fn api_key(&self) -> Result<String> {
        match std::env::var(&self.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            Ok(_) => Err(TubesentError::Config(format!(
                "Environment variable {} is empty",
                self.api_key_env
            ))),
            Err(_) => Err(TubesentError::Config(format!(
                "Environment variable {} is not set; an API key is required for remote calls",
                self.api_key_env
            ))),
        }
    }
}

/// Comment fetch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    pub max_comments: usize,
}

/// Text normalization configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NormalizeConfig {
    /// Stopwords removed from visualization text in addition to the built-in set
    #[serde(default)]
    pub extra_stopwords: Vec<String>,
}

/// Sentiment model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub name: String,
    pub endpoint: String,
    pub api_token_env: String,
    pub batch_size: usize,
    pub max_length: usize,
    pub timeout_secs: u64,
    #[serde(default)]
    pub on_batch_error: BatchErrorPolicy,
}

impl ModelConfig {
    /// Full URL of the inference endpoint for the configured model
    pub fn model_url(&self) -> String {
        format!("{}/{}", self.endpoint.trim_end_matches('/'), self.name)
    }

    /// Optional API token, absent when the variable is unset or empty
    pub fn api_token(&self) -> Option<String> {
        std::env::var(&self.api_token_env)
            .ok()
            .filter(|t| !t.trim().is_empty())
    }
}

/// Aggregation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateConfig {
    pub sample_size: usize,
    pub top_terms: usize,
    pub bucket_hours: u32,
}

/// Profile-specific configuration overrides
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_comments: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_batch_error: Option<BatchErrorPolicy>,
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(TubesentError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| TubesentError::Io {
            source: e,
            context: format!("Failed to read config file: {:?}", path),
        })?;
        let mut config: Config = toml::from_str(&content)?;

        config.apply_env_overrides();

        ConfigValidator::validate(&config)?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| TubesentError::Io {
            source: e,
            context: format!("Failed to write config file: {:?}", path),
        })?;
        Ok(())
    }

    /// Load configuration with a specific profile applied
    pub fn load_with_profile(path: &Path, profile: &str) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_profile(profile)?;
        ConfigValidator::validate(&config)?;
        Ok(config)
    }

    /// Apply a profile's overrides to the configuration
    pub fn apply_profile(&mut self, profile: &str) -> Result<()> {
        let overrides = self.profiles.get(profile).cloned().ok_or_else(|| {
            TubesentError::Config(format!("Unknown profile: {}", profile))
        })?;

        if let Some(max) = overrides.max_comments {
            self.fetch.max_comments = max;
        }
        if let Some(name) = overrides.model_name {
            self.model.name = name;
        }
        if let Some(policy) = overrides.on_batch_error {
            self.model.on_batch_error = policy;
        }
        Ok(())
    }

    /// Apply environment variable overrides
    /// Environment variables in format: TUBESENT_SECTION__KEY=value
    pub fn apply_env_overrides(&mut self) {
        for (key, value) in std::env::vars() {
            if let Some(config_key) = key.strip_prefix("TUBESENT_") {
                if let Err(e) = self.set_value_from_env(config_key, &value) {
                    tracing::warn!("Failed to apply env override {}: {}", key, e);
                }
            }
        }
    }

    fn set_value_from_env(&mut self, path: &str, value: &str) -> Result<()> {
        match path {
            "FETCH__MAX_COMMENTS" => {
                self.fetch.max_comments =
                    value.parse().map_err(|_| TubesentError::InvalidConfigValue {
                        path: path.to_string(),
                        message: format!("Cannot parse '{}' as integer", value),
                    })?;
            }
            "STORAGE__STALE_ANALYSIS_SECS" => {
                self.storage.stale_analysis_secs =
                    value.parse().map_err(|_| TubesentError::InvalidConfigValue {
                        path: path.to_string(),
                        message: format!("Cannot parse '{}' as integer", value),
                    })?;
            }
            "MODEL__NAME" => {
                self.model.name = value.to_string();
            }
            "MODEL__ENDPOINT" => {
                self.model.endpoint = value.to_string();
            }
            "MODEL__ON_BATCH_ERROR" => {
                self.model.on_batch_error = value.parse()?;
            }
            "YOUTUBE__BASE_URL" => {
                self.youtube.base_url = value.to_string();
            }
            _ => {
                tracing::debug!("Unknown env config key: {}", path);
            }
        }
        Ok(())
    }

    /// Get the default configuration file path
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| TubesentError::Config("Cannot determine config directory".to_string()))?;

        Ok(config_dir.join("tubesent").join("config.toml"))
    }

    /// Get the default data directory
    pub fn default_data_dir() -> Result<PathBuf> {
        let home_dir = dirs::home_dir()
            .ok_or_else(|| TubesentError::Config("Cannot determine home directory".to_string()))?;

        Ok(home_dir.join(".tubesent"))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            meta: MetaConfig {
                schema_version: "1.0.0".to_string(),
                created_at: current_timestamp(),
                last_modified: current_timestamp(),
            },
            storage: StorageConfig {
                data_dir: PathBuf::from("~/.tubesent"),
                stale_analysis_secs: default_stale_analysis_secs(),
            },
            youtube: YoutubeConfig {
                api_key_env: "YOUTUBE_API_KEY".to_string(),
                base_url: "https://www.googleapis.com/youtube/v3".to_string(),
                timeout_secs: 30,
            },
            fetch: FetchConfig { max_comments: 500 },
            normalize: NormalizeConfig::default(),
            model: ModelConfig {
                name: "w11wo/indonesian-roberta-base-sentiment-classifier".to_string(),
                endpoint: "https://api-inference.huggingface.co/models".to_string(),
                api_token_env: "HF_TOKEN".to_string(),
                batch_size: 64,
                max_length: 512,
                timeout_secs: 120,
                on_batch_error: BatchErrorPolicy::Abort,
            },
            aggregate: AggregateConfig {
                sample_size: 5,
                top_terms: 50,
                bucket_hours: 6,
            },
            profiles: default_profiles(),
        }
    }
}

fn default_profiles() -> HashMap<String, ProfileOverrides> {
    let mut profiles = HashMap::new();
    profiles.insert(
        "quick".to_string(),
        ProfileOverrides {
            max_comments: Some(200),
            model_name: None,
            on_batch_error: None,
        },
    );
    profiles.insert(
        "deep".to_string(),
        ProfileOverrides {
            max_comments: Some(3000),
            model_name: None,
            on_batch_error: Some(BatchErrorPolicy::Skip),
        },
    );
    profiles
}
