//! FoundationDB KV engine implementation.
//!
//! Every transaction is created from one shared `Database` handle. Reads are
//! non-snapshot so they participate in conflict detection; writes are
//! buffered by the client and applied by `commit`. No retry loop is run here:
//! errors surface to the caller with their FDB code mapped to a
//! `TransactionCode`.

use std::sync::{Arc, Mutex, OnceLock};

use async_trait::async_trait;
use foundationdb::options::{StreamingMode, TransactionOption};
use foundationdb::{Database, FdbError, KeySelector as FdbKeySelector, RangeOption, Transaction};

use filer_kv::{
    GetRangeResult, KeySelector, KeyValue, KvEngine, ReadOnlyTransaction, ReadWriteTransaction,
};
use filer_types::{make_error_msg, Result, Status, StatusCode, TransactionCode};

use crate::{status_from_fdb_code, FdbConfig, FDB_REQUIRED_API_VERSION};

/// The client network thread; started once per process.
static NETWORK: OnceLock<Mutex<Option<foundationdb::api::NetworkAutoStop>>> = OnceLock::new();

fn fdb_status(err: FdbError, ctx: &str) -> Status {
    status_from_fdb_code(err.code(), format!("{}: {}", ctx, err))
}

fn boot_network() -> Result<()> {
    let max_version = foundationdb::api::get_max_api_version();
    if max_version < FDB_REQUIRED_API_VERSION {
        return make_error_msg(
            StatusCode::KV_STORE_OPEN_FAILED,
            format!(
                "fdb client supports api version {}, need at least {}",
                max_version, FDB_REQUIRED_API_VERSION
            ),
        );
    }
    NETWORK.get_or_init(|| {
        // SAFETY: boot runs exactly once per process (guarded by the OnceLock)
        // and the guard is only dropped by `stop_network`.
        let network = unsafe { foundationdb::boot() };
        tracing::info!(max_api_version = max_version, "FoundationDB network started");
        Mutex::new(Some(network))
    });
    Ok(())
}

/// Stop the client network thread.
///
/// Must only be called after every `FdbKvEngine` has been dropped; the
/// network cannot be restarted afterwards.
pub fn stop_network() {
    if let Some(lock) = NETWORK.get() {
        if let Ok(mut guard) = lock.lock() {
            guard.take();
        }
    }
}

/// FoundationDB-backed KV engine.
pub struct FdbKvEngine {
    config: FdbConfig,
    db: Arc<Database>,
}

impl FdbKvEngine {
    /// Start the client network (once per process) and open the database
    /// named by `config.cluster_file`.
    pub fn new(config: FdbConfig) -> Result<Self> {
        boot_network()?;
        let path = (!config.cluster_file.is_empty()).then_some(config.cluster_file.as_str());
        match path {
            Some(file) => tracing::info!(cluster_file = file, "opening FoundationDB"),
            None => tracing::info!("opening FoundationDB, using default cluster"),
        }
        let db = Database::new(path).map_err(|e| fdb_status(e, "open database"))?;
        Ok(Self {
            config,
            db: Arc::new(db),
        })
    }

    /// Return a reference to the current configuration.
    pub fn config(&self) -> &FdbConfig {
        &self.config
    }

    fn create_trx(&self) -> Result<Transaction> {
        let trx = self
            .db
            .create_trx()
            .map_err(|e| fdb_status(e, "create transaction"))?;
        if self.config.transaction_timeout_ms > 0 {
            let timeout = i32::try_from(self.config.transaction_timeout_ms).unwrap_or(i32::MAX);
            trx.set_option(TransactionOption::Timeout(timeout))
                .map_err(|e| fdb_status(e, "set transaction timeout"))?;
        }
        Ok(trx)
    }
}

impl KvEngine for FdbKvEngine {
    type RoTxn = FdbReadOnlyTransaction;
    type RwTxn = FdbReadWriteTransaction;

    fn create_readonly_transaction(&self) -> Result<Self::RoTxn> {
        Ok(FdbReadOnlyTransaction {
            trx: Some(self.create_trx()?),
        })
    }

    fn create_readwrite_transaction(&self) -> Result<Self::RwTxn> {
        Ok(FdbReadWriteTransaction {
            ro: self.create_readonly_transaction()?,
        })
    }
}

fn begin_selector(sel: &KeySelector) -> FdbKeySelector<'static> {
    if sel.inclusive {
        FdbKeySelector::first_greater_or_equal(sel.key.clone())
    } else {
        FdbKeySelector::first_greater_than(sel.key.clone())
    }
}

fn end_selector(sel: &KeySelector) -> FdbKeySelector<'static> {
    if sel.inclusive {
        FdbKeySelector::first_greater_than(sel.key.clone())
    } else {
        FdbKeySelector::first_greater_or_equal(sel.key.clone())
    }
}

/// Read-only FDB transaction. `None` once committed.
pub struct FdbReadOnlyTransaction {
    trx: Option<Transaction>,
}

impl FdbReadOnlyTransaction {
    fn trx(&self) -> Result<&Transaction> {
        self.trx.as_ref().ok_or_else(|| {
            Status::with_message(TransactionCode::CANCELED, "fdb transaction already finished")
        })
    }
}

#[async_trait]
impl ReadOnlyTransaction for FdbReadOnlyTransaction {
    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let value = self
            .trx()?
            .get(key, false)
            .await
            .map_err(|e| fdb_status(e, "get"))?;
        Ok(value.map(|v| v.to_vec()))
    }

    async fn get_range(
        &self,
        begin: &KeySelector,
        end: &KeySelector,
        limit: usize,
    ) -> Result<GetRangeResult> {
        // FDB treats a zero limit as unlimited.
        if limit == 0 {
            return Ok(GetRangeResult {
                kvs: Vec::new(),
                has_more: true,
            });
        }
        let trx = self.trx()?;
        let mut opt = RangeOption {
            begin: begin_selector(begin),
            end: end_selector(end),
            limit: Some(limit),
            mode: StreamingMode::WantAll,
            ..RangeOption::default()
        };
        let mut kvs: Vec<KeyValue> = Vec::new();
        let mut iteration = 1;
        loop {
            let values = trx
                .get_range(&opt, iteration, false)
                .await
                .map_err(|e| fdb_status(e, "get_range"))?;
            for kv in values.iter() {
                kvs.push(KeyValue {
                    key: kv.key().to_vec(),
                    value: kv.value().to_vec(),
                });
            }
            let more = values.more();
            let last_key = match kvs.last() {
                Some(kv) if more && kvs.len() < limit => kv.key.clone(),
                _ => return Ok(GetRangeResult { kvs, has_more: more }),
            };
            // The server returned a partial batch; continue after the last key.
            opt.begin = FdbKeySelector::first_greater_than(last_key);
            opt.limit = Some(limit - kvs.len());
            iteration += 1;
        }
    }
}

/// Read-write FDB transaction.
pub struct FdbReadWriteTransaction {
    ro: FdbReadOnlyTransaction,
}

#[async_trait]
impl ReadOnlyTransaction for FdbReadWriteTransaction {
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
impl ReadWriteTransaction for FdbReadWriteTransaction {
    async fn set(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        self.ro.trx()?.set(key, value);
        Ok(())
    }

    async fn clear(&mut self, key: &[u8]) -> Result<()> {
        self.ro.trx()?.clear(key);
        Ok(())
    }

    async fn clear_range(&mut self, begin: &[u8], end: &[u8]) -> Result<()> {
        self.ro.trx()?.clear_range(begin, end);
        Ok(())
    }

    async fn commit(&mut self) -> Result<()> {
        let trx = self.ro.trx.take().ok_or_else(|| {
            Status::with_message(TransactionCode::CANCELED, "fdb transaction already finished")
        })?;
        trx.commit()
            .await
            .map_err(|e| fdb_status(FdbError::from(e), "commit"))?;
        Ok(())
    }
}
