//! Named store backends.
//!
//! A backend knows how to open a [`FilerStore`] from a [`StoreConfig`].
//! The registry maps `store.backend` to the backend that opens it.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::info;

use filer_kv_backends::MemDbEngine;
use filer_types::{make_error_msg, Result, StatusCode};

use crate::codec::EntryCodec;
use crate::config::StoreConfig;
use crate::filer_store::FilerStore;
use crate::meta_store::KvFilerStore;

pub trait StoreBackend: Send + Sync {
    /// Name matched against `store.backend`.
    fn name(&self) -> &'static str;

    /// Connect to the engine and build a store.
    fn open(&self, config: &StoreConfig) -> Result<Arc<dyn FilerStore>>;
}

/// Process-local in-memory engine. Each `open` starts empty.
pub struct MemDbBackend;

impl StoreBackend for MemDbBackend {
    fn name(&self) -> &'static str {
        "memdb"
    }

    fn open(&self, config: &StoreConfig) -> Result<Arc<dyn FilerStore>> {
        Ok(Arc::new(KvFilerStore::new(
            self.name(),
            Arc::new(MemDbEngine::new()),
            EntryCodec::from_config(config),
        )))
    }
}

#[cfg(feature = "fdb")]
pub struct FdbBackend;

#[cfg(feature = "fdb")]
impl StoreBackend for FdbBackend {
    fn name(&self) -> &'static str {
        "foundationdb"
    }

    fn open(&self, config: &StoreConfig) -> Result<Arc<dyn FilerStore>> {
        let engine = filer_fdb::FdbKvEngine::new(config.fdb_config())?;
        Ok(Arc::new(KvFilerStore::new(
            self.name(),
            Arc::new(engine),
            EntryCodec::from_config(config),
        )))
    }
}

/// Stop the FoundationDB client network thread.
///
/// Call once at process exit, after every store opened by [`FdbBackend`]
/// has been dropped.
#[cfg(feature = "fdb")]
pub fn stop_fdb_network() {
    filer_fdb::stop_network();
}

#[derive(Default)]
pub struct StoreRegistry {
    backends: BTreeMap<&'static str, Box<dyn StoreBackend>>,
}

impl StoreRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every backend compiled into this build.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.backends.insert("memdb", Box::new(MemDbBackend));
        #[cfg(feature = "fdb")]
        registry.backends.insert("foundationdb", Box::new(FdbBackend));
        registry
    }

    /// Add a backend. Names are unique.
    pub fn register(&mut self, backend: Box<dyn StoreBackend>) -> Result<()> {
        let name = backend.name();
        if self.backends.contains_key(name) {
            return make_error_msg(
                StatusCode::INVALID_ARG,
                format!("store backend {} already registered", name),
            );
        }
        self.backends.insert(name, backend);
        Ok(())
    }

    /// Registered names in ascending order.
    pub fn names(&self) -> Vec<&'static str> {
        self.backends.keys().copied().collect()
    }

    /// Open the backend named by `config.backend`.
    pub fn open(&self, config: &StoreConfig) -> Result<Arc<dyn FilerStore>> {
        let Some(backend) = self.backends.get(config.backend.as_str()) else {
            return make_error_msg(
                StatusCode::INVALID_CONFIG,
                format!(
                    "unknown store backend {}, available: {}",
                    config.backend,
                    self.names().join(", ")
                ),
            );
        };
        let store = backend
            .open(config)
            .map_err(|e| e.context(format!("open store {}", config.backend)))?;
        info!(
            backend = backend.name(),
            compress_chunk_threshold = config.compress_chunk_threshold,
            "filer store initialized"
        );
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::OpContext;
    use crate::entry::Entry;

    struct NamedBackend(&'static str);

    impl StoreBackend for NamedBackend {
        fn name(&self) -> &'static str {
            self.0
        }

        fn open(&self, config: &StoreConfig) -> Result<Arc<dyn FilerStore>> {
            MemDbBackend.open(config)
        }
    }

    #[test]
    fn test_builtin_names() {
        let registry = StoreRegistry::with_builtin();
        assert!(registry.names().contains(&"memdb"));
        assert!(StoreRegistry::new().names().is_empty());
    }

    #[test]
    fn test_register_rejects_duplicates() {
        let mut registry = StoreRegistry::with_builtin();
        registry.register(Box::new(NamedBackend("other"))).unwrap();
        let err = registry
            .register(Box::new(NamedBackend("memdb")))
            .unwrap_err();
        assert_eq!(err.code(), StatusCode::INVALID_ARG);
        assert_eq!(registry.names(), {
            let mut names = StoreRegistry::with_builtin().names();
            names.push("other");
            names.sort();
            names
        });
    }

    #[test]
    fn test_open_unknown_backend() {
        let registry = StoreRegistry::with_builtin();
        let config = StoreConfig {
            backend: "leveldb".into(),
            ..Default::default()
        };
        let err = registry.open(&config).err().unwrap();
        assert_eq!(err.code(), StatusCode::INVALID_CONFIG);
        assert!(err.message().unwrap().contains("leveldb"));
    }

    #[tokio::test]
    async fn test_open_memdb_store() {
        let registry = StoreRegistry::with_builtin();
        let store = registry.open(&StoreConfig::default()).unwrap();
        assert_eq!(store.name(), "memdb");

        let ctx = OpContext::background();
        let entry = Entry::new_directory("/home", 0o755);
        store.insert_entry(&ctx, &entry).await.unwrap();
        assert_eq!(store.find_entry(&ctx, &"/home".into()).await.unwrap(), entry);
        store.shutdown().await;
    }
}
