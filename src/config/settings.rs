use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::storage::StorageType;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub remote: RemoteConfig,
    pub cache: CacheConfig,
    pub usage: UsageConfig,
    pub search: SearchConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub endpoint: String,
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub enabled: bool,
}

/// Per-token prices used for cost estimates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UsageConfig {
    pub input_rate: f64,
    pub output_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    pub debounce_ms: u64,
    pub min_latency_ms: u64,
    pub max_results: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Filesystem,
    Sqlite,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            remote: RemoteConfig {
                endpoint: "http://localhost:3000".to_string(),
                timeout_ms: 10_000,
            },
            cache: CacheConfig { enabled: true },
            usage: UsageConfig {
                input_rate: 0.000_001_5,
                output_rate: 0.000_002,
            },
            search: SearchConfig {
                debounce_ms: 500,
                min_latency_ms: 300,
                max_results: 5,
            },
            storage: StorageConfig {
                backend: StorageBackend::Sqlite,
                dir: PathBuf::from("./askdoc-data"),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }
}

impl Settings {
    /// Defaults, then `config/{CONFIG_ENV}`, then `APP__SECTION__KEY` variables
    pub fn new() -> Result<Self> {
        let config_env = env::var("CONFIG_ENV").unwrap_or_else(|_| "default".to_string());

        let config = Config::builder()
            .add_source(Config::try_from(&Settings::default())?)
            .add_source(File::with_name(&format!("config/{}", config_env)).required(false))
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    pub fn storage_type(&self) -> StorageType {
        let dir = self.storage.dir.clone();
        match self.storage.backend {
            StorageBackend::Memory => StorageType::Memory,
            StorageBackend::Filesystem => StorageType::FileSystem(dir),
            StorageBackend::Sqlite => StorageType::Sqlite(dir),
        }
    }
}

impl RemoteConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl SearchConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn min_latency(&self) -> Duration {
        Duration::from_millis(self.min_latency_ms)
    }
}
