//! FoundationDB KV backend.
//!
//! This crate provides an `FdbKvEngine` that implements the `filer_kv::KvEngine`
//! trait backed by FoundationDB. The engine links against `libfdb_c` and is
//! gated behind the `fdb` feature; the configuration and error mapping are
//! always available.

#[cfg(feature = "fdb")]
pub mod fdb_engine;

#[cfg(feature = "fdb")]
pub use fdb_engine::{stop_network, FdbKvEngine};

use filer_types::{Status, TransactionCode};
use serde::{Deserialize, Serialize};

/// Minimum client API version the store is written against.
pub const FDB_REQUIRED_API_VERSION: i32 = 620;

/// Connection parameters for the FoundationDB client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FdbConfig {
    /// Path to the cluster file. Empty selects the client's default
    /// (`/etc/foundationdb/fdb.cluster` or `FDB_CLUSTER_FILE`).
    #[serde(default)]
    pub cluster_file: String,
    /// Per-transaction timeout in milliseconds; 0 disables it.
    #[serde(default = "default_transaction_timeout_ms")]
    pub transaction_timeout_ms: u64,
}

fn default_transaction_timeout_ms() -> u64 {
    5000
}

impl Default for FdbConfig {
    fn default() -> Self {
        Self {
            cluster_file: String::new(),
            transaction_timeout_ms: default_transaction_timeout_ms(),
        }
    }
}

/// Translate a FoundationDB error code into a transaction status.
///
/// Codes follow `fdb_c`'s error table; anything unrecognised becomes
/// `TransactionCode::FAILED`.
pub fn status_from_fdb_code(code: i32, msg: impl Into<String>) -> Status {
    let status_code = match code {
        1007 => TransactionCode::TOO_OLD,
        1009 => TransactionCode::FUTURE_VERSION,
        1020 => TransactionCode::CONFLICT,
        1021 => TransactionCode::MAYBE_COMMITTED,
        1025 => TransactionCode::CANCELED,
        1004 | 1026 | 1031 => TransactionCode::NETWORK_ERROR,
        1037 => TransactionCode::PROCESS_BEHIND,
        1051 | 1213 => TransactionCode::THROTTLED,
        2101..=2103 => TransactionCode::RESOURCE_CONSTRAINED,
        _ => TransactionCode::FAILED,
    };
    Status::with_message(status_code, format!("fdb error {}: {}", code, msg.into()))
}
