//! Configuration Module
//!
//! This module defines all configuration structures for the record sink.
//! Configuration is loaded from TOML files and parsed using serde.
//! Every section and key is optional; missing values fall back to defaults.

use serde::Deserialize;
use std::fs;
use std::time::Duration;

/// Main configuration structure
///
/// Contains all configuration sections for the record sink.
/// Loaded from a TOML file (e.g., config/default.toml).
///
/// # Example TOML
/// ```toml
/// [batch]
/// max_batch_size = 10
/// timeout_interval_ms = 10
///
/// [correlation]
/// await_timeout_ms = 5000
///
/// [api]
/// host = "127.0.0.1"
/// port = 8080
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub batch: BatchConfig,
    pub correlation: CorrelationConfig,
    pub validation: ValidationConfig,
    pub api: ApiConfig,
}

/// Batch window configuration
///
/// Controls when a window is closed and released as a batch.
///
/// # Fields
/// - `max_batch_size`: Close the window as soon as it holds this many records
/// - `timeout_interval_ms`: Close the window this long after its first record arrived
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub max_batch_size: usize,
    pub timeout_interval_ms: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_batch_size: 10,
            timeout_interval_ms: 10,
        }
    }
}

impl BatchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_interval_ms)
    }
}

/// Result correlation configuration
///
/// # Fields
/// - `await_timeout_ms`: How long a caller waits for its record to be committed.
///   `None` waits until the record is committed or the sink shuts down.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CorrelationConfig {
    pub await_timeout_ms: Option<u64>,
}

impl CorrelationConfig {
    pub fn await_timeout(&self) -> Option<Duration> {
        self.await_timeout_ms.map(Duration::from_millis)
    }
}

/// Payload validation limits
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    pub max_name_len: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self { max_name_len: 1024 }
    }
}

/// API server configuration
///
/// # Fields
/// - `host`: IP address to bind to (e.g., "127.0.0.1" or "0.0.0.0")
/// - `port`: TCP port to listen on (e.g., 8080)
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    /// * `path` - Path to the TOML configuration file
    ///
    /// # Returns
    /// * `Ok(Config)` if the file was successfully loaded, parsed and validated
    /// * `Err` if the file couldn't be read, the TOML is invalid, or a value is out of range
    ///
    /// # Example
    /// ```no_run
    /// # use record_sink::Config;
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would stall or break the batch window
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.batch.max_batch_size == 0 {
            anyhow::bail!("batch.max_batch_size must be at least 1");
        }
        if self.batch.timeout_interval_ms == 0 {
            anyhow::bail!("batch.timeout_interval_ms must be at least 1");
        }
        if self.correlation.await_timeout_ms == Some(0) {
            anyhow::bail!("correlation.await_timeout_ms must be at least 1 when set");
        }
        Ok(())
    }
}
