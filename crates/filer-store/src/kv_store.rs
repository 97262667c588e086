//! Opaque key/value records stored beside the metadata.
//!
//! Keys and values are caller bytes, written as-is into the same key space
//! as entry paths. Entry keys always start with `/`, so callers should keep
//! their keys out of that range when both are used on one engine.

use tracing::debug;

use filer_kv::KvEngine;
use filer_types::{make_error_msg, KvCode, Result};

use crate::context::OpContext;
use crate::meta_store::KvFilerStore;

fn show(key: &[u8]) -> String {
    String::from_utf8_lossy(key).into_owned()
}

impl<E: KvEngine> KvFilerStore<E> {
    pub async fn kv_put(&self, ctx: &OpContext, key: &[u8], value: &[u8]) -> Result<()> {
        self.facade
            .put(ctx, key, value)
            .await
            .map_err(|e| e.context("kv put"))?;
        debug!(key = %show(key), size = value.len(), "kv put");
        Ok(())
    }

    /// `KvCode::NOT_FOUND` when `key` is absent.
    pub async fn kv_get(&self, ctx: &OpContext, key: &[u8]) -> Result<Vec<u8>> {
        match self
            .facade
            .get(ctx, key)
            .await
            .map_err(|e| e.context("kv get"))?
        {
            Some(value) => Ok(value),
            None => make_error_msg(KvCode::NOT_FOUND, format!("kv get {}", show(key))),
        }
    }

    pub async fn kv_delete(&self, ctx: &OpContext, key: &[u8]) -> Result<()> {
        self.facade
            .delete(ctx, key)
            .await
            .map_err(|e| e.context("kv delete"))?;
        debug!(key = %show(key), "kv delete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::codec::EntryCodec;
    use crate::facade::tests::FailingEngine;
    use filer_kv_backends::MemDbEngine;
    use filer_types::{ErrorKind, TransactionCode};

    fn store() -> KvFilerStore<MemDbEngine> {
        KvFilerStore::new("memdb", Arc::new(MemDbEngine::new()), EntryCodec::default())
    }

    #[tokio::test]
    async fn test_kv_roundtrip_is_uncompressed() {
        let store = store();
        let ctx = OpContext::background();
        let value = vec![0x28, 0xB5, 0x2F, 0xFD, 1, 2, 3];
        store.kv_put(&ctx, b"gc.counter", &value).await.unwrap();
        // stored verbatim, even when it looks like a compressed frame
        assert_eq!(store.kv_get(&ctx, b"gc.counter").await.unwrap(), value);
    }

    #[tokio::test]
    async fn test_kv_overwrite_and_delete() {
        let store = store();
        let ctx = OpContext::background();
        store.kv_put(&ctx, b"k", b"1").await.unwrap();
        store.kv_put(&ctx, b"k", b"2").await.unwrap();
        assert_eq!(store.kv_get(&ctx, b"k").await.unwrap(), b"2");

        store.kv_delete(&ctx, b"k").await.unwrap();
        store.kv_delete(&ctx, b"k").await.unwrap();
        let err = store.kv_get(&ctx, b"k").await.unwrap_err();
        assert_eq!(err.code(), KvCode::NOT_FOUND);
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_kv_get_missing() {
        let err = store()
            .kv_get(&OpContext::background(), b"never")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.message(), Some("kv get never"));
    }

    #[tokio::test]
    async fn test_kv_engine_error() {
        let store = KvFilerStore::new(
            "failing",
            Arc::new(FailingEngine {
                code: TransactionCode::THROTTLED,
            }),
            EntryCodec::default(),
        );
        let err = store
            .kv_get(&OpContext::background(), b"k")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Engine);
        assert!(!err.is_not_found());
        assert_eq!(err.message(), Some("kv get: get k: injected failure"));
    }
}
