use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::{parse_config, Config, ConfigError};

/// Holds the active configuration and replaces it atomically.
pub struct ConfigManager<T: Config> {
    config: ArcSwap<T>,
    path: Option<PathBuf>,
}

impl<T: Config> ConfigManager<T> {
    pub fn new(config: T) -> Self {
        Self {
            config: ArcSwap::from_pointee(config),
            path: None,
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config = parse_config(&content)?;
        tracing::debug!("Config loaded from {:?}", path);
        Ok(Self {
            config: ArcSwap::from_pointee(config),
            path: Some(path.to_path_buf()),
        })
    }

    pub fn get(&self) -> arc_swap::Guard<Arc<T>> {
        self.config.load()
    }

    /// File the config was loaded from, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn update(&self, new_config: T) -> Result<(), ConfigError> {
        new_config.validate()?;
        self.config.store(Arc::new(new_config));
        Ok(())
    }
}

impl<T: Config + Clone> ConfigManager<T> {
    pub fn snapshot(&self) -> T {
        (*self.config.load_full()).clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::io::Write;

    #[derive(Debug, Clone, Deserialize)]
    struct Limits {
        threshold: usize,
    }

    impl Config for Limits {
        fn validate(&self) -> Result<(), ConfigError> {
            if self.threshold == 0 {
                return Err(ConfigError::Invalid("threshold must be positive".into()));
            }
            Ok(())
        }
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "threshold = 50").unwrap();

        let manager = ConfigManager::<Limits>::load(file.path()).unwrap();
        assert_eq!(manager.get().threshold, 50);
        assert_eq!(manager.path(), Some(file.path()));
    }

    #[test]
    fn test_load_missing_file() {
        let err = ConfigManager::<Limits>::load("/nonexistent/filer.toml").err().unwrap();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_update_validates() {
        let manager = ConfigManager::new(Limits { threshold: 50 });
        assert!(manager.update(Limits { threshold: 0 }).is_err());
        assert_eq!(manager.get().threshold, 50);

        manager.update(Limits { threshold: 10 }).unwrap();
        assert_eq!(manager.snapshot().threshold, 10);
        assert!(manager.path().is_none());
    }
}
