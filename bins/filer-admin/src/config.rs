use serde::{Deserialize, Serialize};

use filer_config::{Config, ConfigError};
use filer_logging::LogConfig;
use filer_store::StoreConfig;

/// Top-level config file of the admin tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdminConfig {
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

impl Config for AdminConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.store.validate()
    }
}
