//! Ordered transactional key-value engine interface.
//!
//! Keys and values are raw bytes ordered lexicographically. Engines hand out
//! short-lived transactions; a read-write transaction buffers its mutations
//! and applies them all at once on `commit`.

mod engine;
mod transaction;

pub use engine::KvEngine;
pub use transaction::*;

/// Exclusive upper bound of the range holding every key that starts with
/// `prefix`.
///
/// Trailing `0xFF` bytes are dropped and the last remaining byte is bumped,
/// so `/d\xff` yields `/e`. An empty result means there is no finite bound:
/// the prefix was empty or made only of `0xFF` bytes.
pub fn prefix_list_end_key(prefix: &[u8]) -> Vec<u8> {
    let mut end = prefix.to_vec();
    while let Some(last) = end.pop() {
        if last != 0xFF {
            end.push(last + 1);
            break;
        }
    }
    end
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_end_of_paths() {
        assert_eq!(prefix_list_end_key(b"/d"), b"/e");
        assert_eq!(prefix_list_end_key(b"/home/user"), b"/home/uses");
        assert_eq!(prefix_list_end_key(b"/"), b"0");
    }

    #[test]
    fn test_prefix_end_drops_trailing_ff() {
        assert_eq!(prefix_list_end_key(b"/d\xff"), b"/e");
        assert_eq!(prefix_list_end_key(b"/\xfe\xff\xff"), b"/\xff");
    }

    #[test]
    fn test_prefix_end_unbounded() {
        assert!(prefix_list_end_key(b"").is_empty());
        assert!(prefix_list_end_key(b"\xff").is_empty());
        assert!(prefix_list_end_key(b"\xff\xff\xff").is_empty());
    }

    #[test]
    fn test_prefix_end_bounds_descendants() {
        let end = prefix_list_end_key(b"/d");
        for key in [&b"/d"[..], b"/d/x", b"/d/sub/z", b"/dx", b"/d\xff\xff"] {
            assert!(key < end.as_slice(), "{:?}", key);
        }
        assert!(&b"/e"[..] >= end.as_slice());
    }

    #[test]
    fn test_key_selector_new() {
        let sel = KeySelector::new("/dir/a", false);
        assert_eq!(sel.key, b"/dir/a");
        assert!(!sel.inclusive);
    }
}
