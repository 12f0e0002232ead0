//! Configuration module for the certsweep scanner

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Main configuration structure for scanning operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Maximum number of dials in flight at once (None = unbounded)
    pub max_parallel_dials: Option<usize>,

    /// Repeat the handshake once per known cipher suite
    pub enumerate_cipher_suites: bool,

    /// Timeout covering TCP connect and TLS handshake, in milliseconds
    pub dial_timeout: u64,

    /// Results buffered between dial tasks and the consumer before producers block
    pub result_buffer: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_parallel_dials: None,
            enumerate_cipher_suites: false,
            dial_timeout: 500,
            result_buffer: 1024,
        }
    }
}

impl ScanConfig {
    /// Create a new scan configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound the number of concurrent dials
    pub fn with_max_parallel_dials(mut self, max: usize) -> Self {
        self.max_parallel_dials = Some(max);
        self
    }

    /// Toggle per-suite handshake fan-out
    pub fn with_cipher_enumeration(mut self, enabled: bool) -> Self {
        self.enumerate_cipher_suites = enabled;
        self
    }

    /// Set the dial timeout in milliseconds
    pub fn with_timeout(mut self, timeout: u64) -> Self {
        self.dial_timeout = timeout;
        self
    }

    /// Set the result channel capacity
    pub fn with_result_buffer(mut self, capacity: usize) -> Self {
        self.result_buffer = capacity;
        self
    }

    /// Get timeout as Duration
    pub fn timeout_duration(&self) -> Duration {
        Duration::from_millis(self.dial_timeout)
    }

    /// Number of admission slots the gate is created with
    pub fn gate_capacity(&self) -> usize {
        match self.max_parallel_dials {
            Some(max) => max.min(Semaphore::MAX_PERMITS),
            None => Semaphore::MAX_PERMITS,
        }
    }

    /// Load configuration from TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let content = fs::read_to_string(path)?;

        let config: ScanConfig = toml::from_str(&content)
            .map_err(|e| crate::ScanError::ConfigError(format!("Failed to parse TOML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default locations
    pub fn load_default_config() -> Self {
        let home_dir = dirs::home_dir().unwrap_or_else(|| std::path::PathBuf::from("."));
        let path = home_dir.join(".certsweep.toml");

        if path.exists() {
            match Self::from_toml_file(&path) {
                Ok(config) => {
                    log::info!("Loaded config from {}", path.display());
                    return config;
                }
                Err(e) => log::warn!("Ignoring {}: {}", path.display(), e),
            }
        }

        Self::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> crate::Result<()> {
        if self.max_parallel_dials == Some(0) {
            return Err(crate::ScanError::ConfigError(
                "max_parallel_dials must be greater than 0".to_string(),
            ));
        }

        if self.dial_timeout == 0 {
            return Err(crate::ScanError::ConfigError(
                "dial_timeout must be greater than 0".to_string(),
            ));
        }

        if self.result_buffer == 0 {
            return Err(crate::ScanError::ConfigError(
                "result_buffer must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
