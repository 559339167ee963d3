//! Analysis configuration
//!
//! Values come from three layers, later ones winning: built-in defaults, an
//! optional TOML file, then command-line flags.
//!
//! # Example dxtscan.toml
//!
//! ```toml
//! # Storage block size in bytes; 1 disables false-sharing detection
//! block_size = 4096
//!
//! # Worker threads for scanning files
//! jobs = 4
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("block_size must be >= 1, got {0}")]
    InvalidBlockSize(u64),

    #[error("jobs must be >= 1, got {0}")]
    InvalidJobs(usize),
}

/// Settings fixed for the duration of one analysis run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Granularity, in bytes, at which the storage layer reads and writes
    ///
    /// Writes from different ranks that land in the same block without
    /// sharing bytes are reported as false sharing. Default: 1 (disabled).
    pub block_size: u64,

    /// Number of worker threads scanning files
    ///
    /// Files are independent, so they can be scanned in parallel; output is
    /// identical to a single-threaded run. Default: 1.
    pub jobs: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            block_size: 1,
            jobs: 1,
        }
    }
}

impl AnalysisConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        Self::from_toml_str(&content).with_context(|| format!("Invalid config {}", path.display()))
    }

    /// Load configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Failed to parse TOML")?;
        config.validate()?;
        Ok(config)
    }

    /// Override file or default values with those given on the command line
    pub fn with_overrides(mut self, block_size: Option<u64>, jobs: Option<usize>) -> Self {
        if let Some(block_size) = block_size {
            self.block_size = block_size;
        }
        if let Some(jobs) = jobs {
            self.jobs = jobs;
        }
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.block_size == 0 {
            return Err(ConfigError::InvalidBlockSize(self.block_size));
        }

        if self.jobs == 0 {
            return Err(ConfigError::InvalidJobs(self.jobs));
        }

        Ok(())
    }
}
