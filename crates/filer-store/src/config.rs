//! `[store]` configuration section.

use serde::{Deserialize, Serialize};

use filer_config::{Config, ConfigError};
use filer_fdb::FdbConfig;

use crate::codec::{DEFAULT_COMPRESSION_LEVEL, DEFAULT_COMPRESS_CHUNK_THRESHOLD};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Registry name of the backend to open.
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Cluster file of the engine; empty selects the default cluster.
    #[serde(default)]
    pub cluster_file: String,

    /// Per-transaction timeout handed to the engine. 0 disables it.
    #[serde(default = "default_transaction_timeout_ms")]
    pub transaction_timeout_ms: u64,

    /// Entries with more chunks than this are stored compressed.
    #[serde(default = "default_compress_chunk_threshold")]
    pub compress_chunk_threshold: usize,

    /// zstd level, 1..=22.
    #[serde(default = "default_compression_level")]
    pub compression_level: i32,
}

fn default_backend() -> String {
    "memdb".into()
}

fn default_transaction_timeout_ms() -> u64 {
    5000
}

fn default_compress_chunk_threshold() -> usize {
    DEFAULT_COMPRESS_CHUNK_THRESHOLD
}

fn default_compression_level() -> i32 {
    DEFAULT_COMPRESSION_LEVEL
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            cluster_file: String::new(),
            transaction_timeout_ms: default_transaction_timeout_ms(),
            compress_chunk_threshold: default_compress_chunk_threshold(),
            compression_level: default_compression_level(),
        }
    }
}

impl StoreConfig {
    /// Engine connection settings.
    pub fn fdb_config(&self) -> FdbConfig {
        FdbConfig {
            cluster_file: self.cluster_file.clone(),
            transaction_timeout_ms: self.transaction_timeout_ms,
        }
    }
}

impl Config for StoreConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.backend.is_empty() {
            return Err(ConfigError::Invalid("store.backend must not be empty".into()));
        }
        if !(1..=22).contains(&self.compression_level) {
            return Err(ConfigError::Invalid(format!(
                "store.compression_level must be in 1..=22, got {}",
                self.compression_level
            )));
        }
        Ok(())
    }
}
