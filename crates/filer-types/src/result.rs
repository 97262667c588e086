use crate::status::Status;
use crate::status_code::status_code_t;

/// The standard result type used throughout the filer crates, with `Status` as the error.
pub type Result<T> = std::result::Result<T, Status>;

/// Create an error result from a status code.
pub fn make_error<T>(code: status_code_t) -> Result<T> {
    Err(Status::new(code))
}

/// Create an error result from a status code and message.
pub fn make_error_msg<T>(code: status_code_t, msg: impl Into<String>) -> Result<T> {
    Err(Status::with_message(code, msg))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status_code::{KvCode, MetaCode, StatusCode};

    #[test]
    fn test_make_error() {
        let r: Result<i32> = make_error(MetaCode::NOT_FOUND);
        assert!(r.is_err());
        assert_eq!(r.unwrap_err().code(), 3000);
    }

    #[test]
    fn test_make_error_msg() {
        let r: Result<i32> = make_error_msg(StatusCode::INVALID_ARG, "limit must be positive");
        let err = r.unwrap_err();
        assert_eq!(err.code(), 3);
        assert_eq!(err.message(), Some("limit must be positive"));
    }

    #[test]
    fn test_kv_not_found_is_distinct_from_meta_not_found() {
        let a: Result<()> = make_error(MetaCode::NOT_FOUND);
        let b: Result<()> = make_error(KvCode::NOT_FOUND);
        assert_ne!(a.unwrap_err().code(), b.unwrap_err().code());
    }
}
