//! KV store backend implementations for the filer.
//!
//! - **memdb** -- In-memory BTreeMap-backed store.
//!
//! The FoundationDB engine lives in the `filer-fdb` crate.

pub mod memdb;

pub use memdb::MemDbEngine;
