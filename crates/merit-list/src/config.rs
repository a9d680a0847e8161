//! Configuration for the merit list service

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::ingestion::PipelineConfig;
use crate::matching::MatcherConfig;
use crate::merit::{AnalyticsConfig, BucketSpec};

/// Environment variable naming a TOML config file
pub const CONFIG_ENV: &str = "MERIT_LIST_CONFIG";

/// Main service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MeritConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Database and upload locations
    pub storage: StorageConfig,
    /// External extraction and normalization tools
    pub pipeline: PipelineConfig,
    /// Applicant matching
    pub matcher: MatcherConfig,
    /// Dashboard aggregates
    pub analytics: AnalyticsConfig,
}

impl MeritConfig {
    /// Load from a TOML file. Missing sections take their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Invalid config {}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `$MERIT_LIST_CONFIG` if set, defaults otherwise
    pub fn load() -> Result<Self> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => {
                tracing::info!("Loading configuration from {}", PathBuf::from(&path).display());
                Self::from_file(path)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        BucketSpec::from_config(&self.analytics)?;
        if self.pipeline.extract.program.trim().is_empty() {
            return Err(Error::Config("pipeline.extract.program is empty".to_string()));
        }
        if self.pipeline.normalize.program.trim().is_empty() {
            return Err(Error::Config("pipeline.normalize.program is empty".to_string()));
        }
        if self.server.max_upload_size == 0 {
            return Err(Error::Config("server.max_upload_size must be positive".to_string()));
        }
        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
    /// Maximum upload size in bytes (default: 50MB)
    pub max_upload_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            enable_cors: true,
            max_upload_size: 50 * 1024 * 1024,
        }
    }
}

/// Storage locations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database file
    pub database_path: PathBuf,
    /// Where uploaded documents and their intermediate tables are kept
    pub upload_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let base = dirs::data_local_dir()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
            .join("merit-list");

        Self {
            database_path: base.join("merit.db"),
            upload_dir: base.join("uploads"),
        }
    }
}
