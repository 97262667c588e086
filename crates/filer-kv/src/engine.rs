use filer_types::Result;

use crate::transaction::{ReadOnlyTransaction, ReadWriteTransaction};

/// KV engine trait - creates transactions.
///
/// One engine value is shared by every caller; implementations must allow
/// concurrent transactions.
pub trait KvEngine: Send + Sync {
    type RoTxn: ReadOnlyTransaction;
    type RwTxn: ReadWriteTransaction;

    fn create_readonly_transaction(&self) -> Result<Self::RoTxn>;
    fn create_readwrite_transaction(&self) -> Result<Self::RwTxn>;
}
