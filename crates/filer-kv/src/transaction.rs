use async_trait::async_trait;
use filer_types::Result;

/// Key-value pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValue {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

/// Key selector for range queries.
#[derive(Debug, Clone)]
pub struct KeySelector {
    pub key: Vec<u8>,
    pub inclusive: bool,
}

impl KeySelector {
    pub fn new(key: impl Into<Vec<u8>>, inclusive: bool) -> Self {
        Self {
            key: key.into(),
            inclusive,
        }
    }
}

/// Result of a range query.
#[derive(Debug, Default)]
pub struct GetRangeResult {
    pub kvs: Vec<KeyValue>,
    /// More pairs remain in the range past the last one returned.
    pub has_more: bool,
}

/// Read-only transaction trait.
#[async_trait]
pub trait ReadOnlyTransaction: Send + Sync {
    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Read at most `limit` pairs between `begin` and `end` in ascending key
    /// order.
    async fn get_range(
        &self,
        begin: &KeySelector,
        end: &KeySelector,
        limit: usize,
    ) -> Result<GetRangeResult>;
}

/// Read-write transaction trait.
///
/// Mutations are buffered until `commit`, which applies them atomically in
/// the order they were issued.
#[async_trait]
pub trait ReadWriteTransaction: ReadOnlyTransaction {
    async fn set(&mut self, key: &[u8], value: &[u8]) -> Result<()>;

    async fn clear(&mut self, key: &[u8]) -> Result<()>;

    /// Remove every key in `[begin, end)`.
    async fn clear_range(&mut self, begin: &[u8], end: &[u8]) -> Result<()>;

    async fn commit(&mut self) -> Result<()>;
}
