//! In-memory KV store backed by a `BTreeMap`.
//!
//! This provides a fully functional [`KvEngine`] implementation suitable for
//! testing and single-process use. All data lives in memory behind a
//! `parking_lot::RwLock`; each transaction reads from a point-in-time snapshot
//! and buffers its mutations until commit.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use filer_kv::{
    GetRangeResult, KeySelector, KeyValue, KvEngine, ReadOnlyTransaction, ReadWriteTransaction,
};
use filer_types::Result;

type KvMap = BTreeMap<Vec<u8>, Vec<u8>>;

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// In-memory KV engine using a shared `BTreeMap`.
#[derive(Clone)]
pub struct MemDbEngine {
    data: Arc<RwLock<KvMap>>,
}

impl MemDbEngine {
    /// Create a new, empty in-memory database.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }

    /// Return the number of keys currently stored.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Return whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Return every key currently stored, in order.
    pub fn keys(&self) -> Vec<Vec<u8>> {
        self.data.read().keys().cloned().collect()
    }
}

impl Default for MemDbEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl KvEngine for MemDbEngine {
    type RoTxn = MemDbReadOnlyTxn;
    type RwTxn = MemDbReadWriteTxn;

    fn create_readonly_transaction(&self) -> Result<Self::RoTxn> {
        Ok(MemDbReadOnlyTxn {
            snapshot: self.data.read().clone(),
        })
    }

    fn create_readwrite_transaction(&self) -> Result<Self::RwTxn> {
        Ok(MemDbReadWriteTxn {
            ro: self.create_readonly_transaction()?,
            pending: Vec::new(),
            data: Arc::clone(&self.data),
        })
    }
}

// ---------------------------------------------------------------------------
// Helper: range collection
// ---------------------------------------------------------------------------

/// Collect key-value pairs from a snapshot according to `begin` / `end` key
/// selectors and a limit.
fn collect_range(
    map: &KvMap,
    begin: &KeySelector,
    end: &KeySelector,
    limit: usize,
) -> GetRangeResult {
    // BTreeMap::range panics on an inverted range.
    if begin.key > end.key {
        return GetRangeResult::default();
    }
    if begin.key == end.key && !(begin.inclusive && end.inclusive) {
        return GetRangeResult::default();
    }

    let start_bound = if begin.inclusive {
        Bound::Included(begin.key.clone())
    } else {
        Bound::Excluded(begin.key.clone())
    };

    let end_bound = if end.inclusive {
        Bound::Included(end.key.clone())
    } else {
        Bound::Excluded(end.key.clone())
    };

    let mut kvs = Vec::new();
    let mut has_more = false;

    for (k, v) in map.range((start_bound, end_bound)) {
        if kvs.len() >= limit {
            has_more = true;
            break;
        }
        kvs.push(KeyValue {
            key: k.clone(),
            value: v.clone(),
        });
    }

    GetRangeResult { kvs, has_more }
}

// ---------------------------------------------------------------------------
// Read-only transaction
// ---------------------------------------------------------------------------

/// Read-only transaction operating on a point-in-time snapshot.
pub struct MemDbReadOnlyTxn {
    snapshot: KvMap,
}

#[async_trait]
impl ReadOnlyTransaction for MemDbReadOnlyTxn {
    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.snapshot.get(key).cloned())
    }

    async fn get_range(
        &self,
        begin: &KeySelector,
        end: &KeySelector,
        limit: usize,
    ) -> Result<GetRangeResult> {
        Ok(collect_range(&self.snapshot, begin, end, limit))
    }
}

// ---------------------------------------------------------------------------
// Read-write transaction
// ---------------------------------------------------------------------------

/// A buffered mutation, applied in issue order on commit.
enum Mutation {
    Set(Vec<u8>, Vec<u8>),
    Clear(Vec<u8>),
    ClearRange(Vec<u8>, Vec<u8>),
}

/// Read-write transaction that buffers writes and applies them atomically on
/// commit.
pub struct MemDbReadWriteTxn {
    /// The underlying read-only snapshot for reads.
    ro: MemDbReadOnlyTxn,
    pending: Vec<Mutation>,
    /// Reference to the shared data store for committing.
    data: Arc<RwLock<KvMap>>,
}

#[async_trait]
impl ReadOnlyTransaction for MemDbReadWriteTxn {
    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.ro.get(key).await
    }

    async fn get_range(
        &self,
        begin: &KeySelector,
        end: &KeySelector,
        limit: usize,
    ) -> Result<GetRangeResult> {
        self.ro.get_range(begin, end, limit).await
    }
}

#[async_trait]
impl ReadWriteTransaction for MemDbReadWriteTxn {
    async fn set(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        self.pending.push(Mutation::Set(key.to_vec(), value.to_vec()));
        Ok(())
    }

    async fn clear(&mut self, key: &[u8]) -> Result<()> {
        self.pending.push(Mutation::Clear(key.to_vec()));
        Ok(())
    }

    async fn clear_range(&mut self, begin: &[u8], end: &[u8]) -> Result<()> {
        self.pending
            .push(Mutation::ClearRange(begin.to_vec(), end.to_vec()));
        Ok(())
    }

    async fn commit(&mut self) -> Result<()> {
        // Apply all buffered mutations atomically under the write lock.
        let mut store = self.data.write();
        for mutation in self.pending.drain(..) {
            match mutation {
                Mutation::Set(key, value) => {
                    store.insert(key, value);
                }
                Mutation::Clear(key) => {
                    store.remove(&key);
                }
                Mutation::ClearRange(begin, end) => {
                    if begin < end {
                        let doomed: Vec<Vec<u8>> =
                            store.range(begin..end).map(|(k, _)| k.clone()).collect();
                        for key in doomed {
                            store.remove(&key);
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
