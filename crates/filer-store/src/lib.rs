//! Filesystem metadata on an ordered transactional key-value engine.
//!
//! Entries are stored under their full path, so a directory listing is a
//! range scan and removing a subtree is a single range clear. Every call is
//! its own engine transaction; nothing here retries or caches.

pub mod codec;
pub mod config;
pub mod context;
pub mod entry;
pub mod facade;
pub mod filer_store;
pub mod keys;
mod kv_store;
pub mod meta_store;
pub mod registry;

pub use codec::EntryCodec;
pub use config::StoreConfig;
pub use context::{CancelHandle, OpContext};
pub use entry::{Attr, Entry, FileChunk, FullPath};
pub use facade::KvFacade;
pub use filer_store::FilerStore;
pub use meta_store::KvFilerStore;
#[cfg(feature = "fdb")]
pub use registry::{stop_fdb_network, FdbBackend};
pub use registry::{MemDbBackend, StoreBackend, StoreRegistry};
