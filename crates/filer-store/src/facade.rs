//! One-transaction-per-call access to a [`KvEngine`].
//!
//! Every method opens its own transaction, runs a single statement and, for
//! writes, commits. Nothing here retries: engine errors reach the caller with
//! their engine code and the operation/key prepended to the message.

use std::sync::Arc;

use filer_kv::{GetRangeResult, KeySelector, KvEngine, ReadOnlyTransaction, ReadWriteTransaction};
use filer_types::{make_error_msg, Result, StatusCode};

use crate::context::OpContext;

fn show(key: &[u8]) -> String {
    String::from_utf8_lossy(key).into_owned()
}

pub struct KvFacade<E: KvEngine> {
    engine: Arc<E>,
}

impl<E: KvEngine> Clone for KvFacade<E> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
        }
    }
}

impl<E: KvEngine> KvFacade<E> {
    pub fn new(engine: Arc<E>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &Arc<E> {
        &self.engine
    }

    /// Unconditional upsert.
    pub async fn put(&self, ctx: &OpContext, key: &[u8], value: &[u8]) -> Result<()> {
        ctx.run(async {
            let mut txn = self.engine.create_readwrite_transaction()?;
            txn.set(key, value).await?;
            txn.commit().await
        })
        .await
        .map_err(|e| e.context(format!("put {}", show(key))))
    }

    /// Read `key`; an absent key is `Ok(None)`.
    pub async fn get(&self, ctx: &OpContext, key: &[u8]) -> Result<Option<Vec<u8>>> {
        ctx.run(async {
            let txn = self.engine.create_readonly_transaction()?;
            txn.get(key).await
        })
        .await
        .map_err(|e| e.context(format!("get {}", show(key))))
    }

    /// Remove `key`; removing an absent key succeeds.
    pub async fn delete(&self, ctx: &OpContext, key: &[u8]) -> Result<()> {
        ctx.run(async {
            let mut txn = self.engine.create_readwrite_transaction()?;
            txn.clear(key).await?;
            txn.commit().await
        })
        .await
        .map_err(|e| e.context(format!("delete {}", show(key))))
    }

    /// Atomically remove every key in `[begin, end)`.
    pub async fn clear_range(&self, ctx: &OpContext, begin: &[u8], end: &[u8]) -> Result<()> {
        ctx.run(async {
            let mut txn = self.engine.create_readwrite_transaction()?;
            txn.clear_range(begin, end).await?;
            txn.commit().await
        })
        .await
        .map_err(|e| e.context(format!("clear range [{}, {})", show(begin), show(end))))
    }

    /// Up to `limit` pairs from `[begin, end)` in ascending key order;
    /// `has_more` is set when the range holds further pairs.
    ///
    /// `limit` must be positive.
    pub async fn scan_range(
        &self,
        ctx: &OpContext,
        begin: &[u8],
        end: &[u8],
        limit: i64,
    ) -> Result<GetRangeResult> {
        if limit <= 0 {
            return make_error_msg(
                StatusCode::INVALID_ARG,
                format!("scan range: limit must be positive, got {}", limit),
            );
        }
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        let begin_sel = KeySelector::new(begin, true);
        let end_sel = KeySelector::new(end, false);
        ctx.run(async {
            let txn = self.engine.create_readonly_transaction()?;
            txn.get_range(&begin_sel, &end_sel, limit).await
        })
        .await
        .map_err(|e| e.context(format!("scan range [{}, {})", show(begin), show(end))))
    }
}
