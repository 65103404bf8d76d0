//! Configuration for the generator, loaded from `moodlift.toml`.
//!
//! Every key is optional; missing keys fall back to the defaults below.

use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use moodlift_resilience::CircuitBreakerConfig;
use moodlift_resilience::RetryConfig;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MoodliftConfig {
    pub ollama: OllamaConfig,
    pub retry: RetryConfig,
    pub circuit_breaker: CircuitBreakerConfig,
    pub validation: ValidationConfig,
}

/// Where and how to reach the Ollama server
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OllamaConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Absolute limit for one request, headers and body together
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_endpoint() -> String {
    moodlift_ollama::DEFAULT_ENDPOINT.to_string()
}

fn default_model() -> String {
    moodlift_ollama::DEFAULT_MODEL.to_string()
}

fn default_timeout_ms() -> u64 {
    moodlift_ollama::DEFAULT_TIMEOUT.as_millis() as u64
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl OllamaConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ValidationConfig {
    /// Trimmed responses shorter than this count as interrupted
    #[serde(default = "default_min_content_chars")]
    pub min_content_chars: usize,
}

fn default_min_content_chars() -> usize {
    10
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            min_content_chars: default_min_content_chars(),
        }
    }
}

impl MoodliftConfig {
    /// Environment variable for config path override
    pub const ENV_CONFIG_PATH: &'static str = "MOODLIFT_CONFIG";

    /// Default config filename
    pub const DEFAULT_CONFIG_FILENAME: &'static str = "moodlift.toml";

    /// Load configuration.
    ///
    /// Resolution order:
    /// 1. `explicit` (must exist)
    /// 2. `MOODLIFT_CONFIG` environment variable (must exist)
    /// 3. `./moodlift.toml`
    /// 4. `~/.config/moodlift/moodlift.toml`
    ///
    /// Falls back to defaults when no file is found.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let required = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(Self::ENV_CONFIG_PATH).map(PathBuf::from));
        if let Some(path) = required {
            if !path.exists() {
                return Err(ConfigError::NotFound(path));
            }
            return Self::load_from_path(&path);
        }

        match Self::default_search_paths().into_iter().find(|p| p.exists()) {
            Some(path) => Self::load_from_path(&path),
            None => {
                tracing::warn!("no moodlift.toml found, using default configuration");
                Ok(Self::default())
            }
        }
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&contents)?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Parse configuration from TOML string
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        let config: MoodliftConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    fn default_search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(Self::DEFAULT_CONFIG_FILENAME)];
        if let Some(home) = dirs::home_dir() {
            paths.push(
                home.join(".config")
                    .join("moodlift")
                    .join(Self::DEFAULT_CONFIG_FILENAME),
            );
        }
        paths
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ollama.endpoint.trim().is_empty() {
            return Err(ConfigError::Invalid("ollama.endpoint must not be empty".into()));
        }
        if self.ollama.model.trim().is_empty() {
            return Err(ConfigError::Invalid("ollama.model must not be empty".into()));
        }
        if self.ollama.timeout_ms == 0 {
            return Err(ConfigError::Invalid("ollama.timeout_ms must be > 0".into()));
        }
        if self.retry.backoff_multiplier < 1.0 {
            return Err(ConfigError::Invalid(format!(
                "retry.backoff_multiplier must be >= 1.0, got {}",
                self.retry.backoff_multiplier
            )));
        }
        if self.retry.max_backoff_ms < self.retry.initial_backoff_ms {
            return Err(ConfigError::Invalid(
                "retry.max_backoff_ms must be >= retry.initial_backoff_ms".into(),
            ));
        }
        if self.circuit_breaker.failure_threshold == 0 {
            return Err(ConfigError::Invalid(
                "circuit_breaker.failure_threshold must be >= 1".into(),
            ));
        }
        Ok(())
    }
}
