/// Status code type alias.
#[allow(non_camel_case_types)]
pub type status_code_t = u16;

/// Common status codes (0-999).
pub mod StatusCode {
    use super::status_code_t;

    pub const OK: status_code_t = 0;
    pub const DATA_CORRUPTION: status_code_t = 2;
    pub const INVALID_ARG: status_code_t = 3;
    pub const INVALID_CONFIG: status_code_t = 4;
    pub const ENCODE_FAILED: status_code_t = 39;
    pub const KV_STORE_OPEN_FAILED: status_code_t = 63;
    pub const IO_ERROR: status_code_t = 69;
    pub const UNKNOWN: status_code_t = 999;
}

/// Transaction status codes (1xxx), reported by the KV engine.
pub mod TransactionCode {
    use super::status_code_t;

    pub const FAILED: status_code_t = 1000;
    pub const CONFLICT: status_code_t = 1001;
    pub const THROTTLED: status_code_t = 1002;
    pub const TOO_OLD: status_code_t = 1003;
    pub const NETWORK_ERROR: status_code_t = 1004;
    pub const CANCELED: status_code_t = 1005;
    pub const MAYBE_COMMITTED: status_code_t = 1006;
    pub const RESOURCE_CONSTRAINED: status_code_t = 1008;
    pub const PROCESS_BEHIND: status_code_t = 1009;
    pub const FUTURE_VERSION: status_code_t = 1010;
}

/// Metadata store status codes (3xxx).
pub mod MetaCode {
    use super::status_code_t;

    pub const NOT_FOUND: status_code_t = 3000;
    pub const OPERATION_TIMEOUT: status_code_t = 3203;
}

/// Opaque KV status codes (11xxx).
pub mod KvCode {
    use super::status_code_t;

    pub const NOT_FOUND: status_code_t = 11020;
}

/// Classification of status code ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i8)]
pub enum StatusCodeType {
    Invalid = -1,
    Common = 0,
    Transaction = 1,
    Meta = 3,
    Kv = 10,
}

/// Determine the type/category of a status code.
pub fn type_of(code: status_code_t) -> StatusCodeType {
    match code {
        0..=999 => StatusCodeType::Common,
        1000..=1999 => StatusCodeType::Transaction,
        3000..=3999 => StatusCodeType::Meta,
        11000..=11999 => StatusCodeType::Kv,
        _ => StatusCodeType::Invalid,
    }
}

/// Convert a status code to its human-readable name.
pub fn to_string(code: status_code_t) -> &'static str {
    match code {
        // Common
        StatusCode::OK => "OK",
        StatusCode::DATA_CORRUPTION => "DataCorruption",
        StatusCode::INVALID_ARG => "InvalidArg",
        StatusCode::INVALID_CONFIG => "InvalidConfig",
        StatusCode::ENCODE_FAILED => "EncodeFailed",
        StatusCode::KV_STORE_OPEN_FAILED => "KVStoreOpenFailed",
        StatusCode::IO_ERROR => "IOError",
        StatusCode::UNKNOWN => "Unknown",

        // Transaction
        TransactionCode::FAILED => "Transaction::Failed",
        TransactionCode::CONFLICT => "Transaction::Conflict",
        TransactionCode::THROTTLED => "Transaction::Throttled",
        TransactionCode::TOO_OLD => "Transaction::TooOld",
        TransactionCode::NETWORK_ERROR => "Transaction::NetworkError",
        TransactionCode::CANCELED => "Transaction::Canceled",
        TransactionCode::MAYBE_COMMITTED => "Transaction::MaybeCommitted",
        TransactionCode::RESOURCE_CONSTRAINED => "Transaction::ResourceConstrained",
        TransactionCode::PROCESS_BEHIND => "Transaction::ProcessBehind",
        TransactionCode::FUTURE_VERSION => "Transaction::FutureVersion",

        // Meta
        MetaCode::NOT_FOUND => "Meta::NotFound",
        MetaCode::OPERATION_TIMEOUT => "Meta::OperationTimeout",

        // Kv
        KvCode::NOT_FOUND => "Kv::NotFound",

        _ => "UnknownCode",
    }
}
