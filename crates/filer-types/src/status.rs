use std::fmt;

use crate::status_code::{
    self, status_code_t, KvCode, MetaCode, StatusCode, StatusCodeType, TransactionCode,
};

/// A status value carrying a code and optional message.
///
/// The `#[must_use]` attribute ensures callers do not silently ignore error
/// statuses.
#[derive(Debug, Clone)]
#[must_use]
pub struct Status {
    code: status_code_t,
    message: Option<String>,
}

/// Coarse error classes callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Connectivity, conflict or resource failure inside the KV engine.
    Engine,
    /// The requested entry or key does not exist.
    NotFound,
    /// An entry could not be serialized.
    Encoding,
    /// A stored blob could not be decompressed or parsed.
    Decoding,
    /// Malformed request parameters.
    InvalidInput,
    /// The caller's context was cancelled or its deadline passed.
    Cancelled,
    Other,
}

impl Status {
    /// Create a status with just a code.
    pub fn new(code: status_code_t) -> Self {
        Self {
            code,
            message: None,
        }
    }

    /// Create a status with a code and a descriptive message.
    pub fn with_message(code: status_code_t, msg: impl Into<String>) -> Self {
        Self {
            code,
            message: Some(msg.into()),
        }
    }

    /// Return the numeric status code.
    pub fn code(&self) -> status_code_t {
        self.code
    }

    /// Return the optional message.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Whether this status represents success (code == OK).
    pub fn is_ok(&self) -> bool {
        self.code == StatusCode::OK
    }

    /// Prefix the message with `ctx`, keeping the code.
    ///
    /// `Status::new(MetaCode::NOT_FOUND).context("find /a")` renders as
    /// `Meta::NotFound(3000) find /a`.
    pub fn context(self, ctx: impl fmt::Display) -> Self {
        let message = match self.message {
            Some(msg) => format!("{}: {}", ctx, msg),
            None => ctx.to_string(),
        };
        Self {
            code: self.code,
            message: Some(message),
        }
    }

    /// Classify the code into an [`ErrorKind`].
    pub fn kind(&self) -> ErrorKind {
        match self.code {
            MetaCode::NOT_FOUND | KvCode::NOT_FOUND => ErrorKind::NotFound,
            TransactionCode::CANCELED | MetaCode::OPERATION_TIMEOUT => ErrorKind::Cancelled,
            StatusCode::ENCODE_FAILED => ErrorKind::Encoding,
            StatusCode::DATA_CORRUPTION => ErrorKind::Decoding,
            StatusCode::INVALID_ARG => ErrorKind::InvalidInput,
            StatusCode::KV_STORE_OPEN_FAILED => ErrorKind::Engine,
            code if status_code::type_of(code) == StatusCodeType::Transaction => {
                ErrorKind::Engine
            }
            _ => ErrorKind::Other,
        }
    }

    /// Whether this status means "no such entry or key".
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    /// Produce a human-readable description like `"Meta::NotFound(3000) /a/b"`.
    pub fn describe(&self) -> String {
        let name = status_code::to_string(self.code);
        match &self.message {
            Some(msg) => format!("{}({}) {}", name, self.code, msg),
            None => format!("{}({})", name, self.code),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

impl std::error::Error for Status {}

impl From<status_code_t> for Status {
    fn from(code: status_code_t) -> Self {
        Self::new(code)
    }
}
