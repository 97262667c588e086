//! Configuration loading.
//!
//! Config structs are plain `serde` types; implementing [`Config`] adds
//! validation on top of TOML deserialization. [`ConfigManager`] owns the
//! active value and swaps in validated replacements.

mod manager;

pub use manager::ConfigManager;

use serde::de::DeserializeOwned;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("toml parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// A validated configuration section.
pub trait Config: DeserializeOwned + Send + Sync + 'static {
    /// Build the config from a parsed TOML document.
    fn from_toml(value: &toml::Value) -> Result<Self, ConfigError> {
        Ok(value.clone().try_into()?)
    }

    /// Reject values that deserialize but make no sense.
    fn validate(&self) -> Result<(), ConfigError> {
        Ok(())
    }
}

/// Parse and validate a config from TOML text.
pub fn parse_config<T: Config>(content: &str) -> Result<T, ConfigError> {
    let value: toml::Value = content.parse()?;
    let config = T::from_toml(&value)?;
    config.validate()?;
    Ok(config)
}
