use anyhow::{Context, Result};
use log::{LevelFilter, warn};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::AppError;
use crate::ledger::DEFAULT_LEDGER_FILE;
use crate::translation::RetryPolicy;
use crate::translation::batch::DEFAULT_MAX_TOKENS;
use crate::translation::dispatch::{DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_OUTPUT_TOKENS};

/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Backend API key
    #[serde(default)]
    pub api_key: String,

    /// Model identifier sent with every request
    #[serde(default)]
    pub model: String,

    /// Base URL of the chat-completion API
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Input budget per batch, in tokens (≤ 0 means the default)
    #[serde(default = "default_max_tokens")]
    pub max_tokens: i64,

    /// Cap on tokens generated per reply
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    /// Attempts per batch before giving up
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Delay before the second attempt, doubled on each further attempt
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// HTTP timeout per request
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Files translated at once in directory mode
    #[serde(default = "default_concurrent_files")]
    pub concurrent_files: usize,

    /// Location of the failure ledger
    #[serde(default = "default_ledger_path")]
    pub ledger_path: PathBuf,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

fn default_endpoint() -> String {
    crate::providers::openai::DEFAULT_ENDPOINT.to_string()
}

fn default_max_tokens() -> i64 {
    DEFAULT_MAX_TOKENS
}

fn default_max_output_tokens() -> u32 {
    DEFAULT_MAX_OUTPUT_TOKENS
}

fn default_retry_count() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_retry_backoff_ms() -> u64 {
    1000 // 1 second base backoff time, doubled on each retry
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_concurrent_files() -> usize {
    1
}

fn default_ledger_path() -> PathBuf {
    PathBuf::from(DEFAULT_LEDGER_FILE)
}

impl Config {
    /// Load a configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open config file: {}", path.display()))?;
        let reader = BufReader::new(file);
        let config: Config = serde_json::from_reader(reader)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Load a configuration file, writing a default one first if it does not exist
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            return Self::from_file(path);
        }

        warn!("Config file not found at '{}', creating default config.", path.display());
        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;
        std::fs::write(path, config_json)
            .with_context(|| format!("Failed to write default config to file: {}", path.display()))?;
        Ok(config)
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<(), AppError> {
        if self.api_key.trim().is_empty() {
            return Err(AppError::Config(
                "API key is required (--apikey, OPENAI_API_KEY or api_key in the config file)".to_string(),
            ));
        }
        if self.model.trim().is_empty() {
            return Err(AppError::Config(
                "Model is required (--model or model in the config file)".to_string(),
            ));
        }
        url::Url::parse(&self.endpoint)
            .map_err(|e| AppError::Config(format!("Invalid endpoint '{}': {}", self.endpoint, e)))?;
        if self.max_output_tokens == 0 {
            return Err(AppError::Config("max_output_tokens must be positive".to_string()));
        }
        Ok(())
    }

    /// Retry policy for the dispatcher
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry_count, Duration::from_millis(self.retry_backoff_ms))
    }

    /// Request timeout for the HTTP client
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            api_key: String::new(),
            model: String::new(),
            endpoint: default_endpoint(),
            max_tokens: default_max_tokens(),
            max_output_tokens: default_max_output_tokens(),
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
            timeout_secs: default_timeout_secs(),
            concurrent_files: default_concurrent_files(),
            ledger_path: default_ledger_path(),
            log_level: LogLevel::default(),
        }
    }
}
