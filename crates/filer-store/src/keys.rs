//! Key layout of the metadata store.
//!
//! The path bytes are the key, with no namespace prefix. A directory's
//! children therefore sort contiguously after the directory itself:
//!
//! ```text
//! /d          <- the directory entry
//! /d/a        <- children (and deeper descendants)
//! /d/sub/z
//! /d\xff      <- exclusive listing upper bound
//! ```

use filer_kv::prefix_list_end_key;
use filer_types::{make_error_msg, Result, StatusCode};

use crate::entry::FullPath;

pub const DIR_SEPARATOR: u8 = b'/';
/// Appended to a directory path to form the exclusive listing upper bound.
pub const RANGE_END_MARKER: u8 = 0xFF;

/// Key of the entry stored at `path`.
pub fn entry_key(path: &FullPath) -> Vec<u8> {
    path.as_bytes().to_vec()
}

/// Prefix shared by the keys of every child of `dir`: `dir + "/"`, or just
/// `/` for the root.
pub fn children_prefix(dir: &FullPath) -> Vec<u8> {
    let mut prefix = dir.as_bytes().to_vec();
    if prefix.last() != Some(&DIR_SEPARATOR) {
        prefix.push(DIR_SEPARATOR);
    }
    prefix
}

/// Key of child `name` of `dir`; the inclusive lower bound of a listing that
/// resumes at `name`.
pub fn child_start_key(dir: &FullPath, name: &str) -> Vec<u8> {
    let mut key = children_prefix(dir);
    key.extend_from_slice(name.as_bytes());
    key
}

/// Half-open scan range of a directory listing.
///
/// The lower bound is the children prefix when `start_name` is empty, which
/// leaves out `dir` itself and siblings such as `/d.txt` that sort before
/// `/d/`. Otherwise it is the key of the start child. The upper bound is
/// `dir` followed by `0xFF`.
pub fn directory_range(dir: &FullPath, start_name: &str) -> (Vec<u8>, Vec<u8>) {
    let begin = child_start_key(dir, start_name);
    let mut end = entry_key(dir);
    end.push(RANGE_END_MARKER);
    (begin, end)
}

/// Minimal half-open range holding every key that starts with `path`.
///
/// Fails when no finite upper bound exists (empty or all-`0xFF` input).
pub fn subtree_prefix_range(path: &[u8]) -> Result<(Vec<u8>, Vec<u8>)> {
    let end = prefix_list_end_key(path);
    if end.is_empty() {
        return make_error_msg(
            StatusCode::INVALID_ARG,
            format!(
                "no prefix range for {:?}",
                String::from_utf8_lossy(path)
            ),
        );
    }
    Ok((path.to_vec(), end))
}

/// Smallest key sorting strictly after `key`.
pub fn next_key(key: &[u8]) -> Vec<u8> {
    let mut next = Vec::with_capacity(key.len() + 1);
    next.extend_from_slice(key);
    next.push(0x00);
    next
}

/// Part of `key` after the children prefix, or `None` when `key` is not
/// below the directory (the directory itself, or a sibling like `/dx`).
pub fn child_suffix<'a>(prefix: &[u8], key: &'a [u8]) -> Option<&'a [u8]> {
    match key.strip_prefix(prefix) {
        Some(rest) if !rest.is_empty() => Some(rest),
        _ => None,
    }
}
