//! Capability interface every metadata backend implements.

use async_trait::async_trait;

use filer_types::Result;

use crate::context::OpContext;
use crate::entry::{Entry, FullPath};

/// A filesystem metadata store.
///
/// Each call is its own engine transaction. The transaction methods only
/// pass the context through: a sequence of calls between
/// `begin_transaction` and `commit_transaction` is **not** atomic.
#[async_trait]
pub trait FilerStore: Send + Sync {
    /// Backend name this store was opened under.
    fn name(&self) -> &str;

    async fn begin_transaction(&self, ctx: &OpContext) -> Result<OpContext>;
    async fn commit_transaction(&self, ctx: &OpContext) -> Result<()>;
    async fn rollback_transaction(&self, ctx: &OpContext) -> Result<()>;

    async fn insert_entry(&self, ctx: &OpContext, entry: &Entry) -> Result<()>;
    /// Same as insert: last writer wins.
    async fn update_entry(&self, ctx: &OpContext, entry: &Entry) -> Result<()>;
    /// `MetaCode::NOT_FOUND` when nothing is stored at `path`.
    async fn find_entry(&self, ctx: &OpContext, path: &FullPath) -> Result<Entry>;
    async fn delete_entry(&self, ctx: &OpContext, path: &FullPath) -> Result<()>;
    /// Remove every key with `path` as a byte prefix.
    async fn delete_folder_children(&self, ctx: &OpContext, path: &FullPath) -> Result<()>;

    /// Page through the children of `dir`, returning the name of the last
    /// entry handed to `each` (empty if none). `each` returning `false`
    /// stops the listing.
    async fn list_directory_entries(
        &self,
        ctx: &OpContext,
        dir: &FullPath,
        start_file_name: &str,
        include_start_file: bool,
        limit: i64,
        each: &mut (dyn FnMut(Entry) -> bool + Send),
    ) -> Result<String>;

    /// Like [`FilerStore::list_directory_entries`], delivering only children
    /// whose name starts with `prefix`.
    #[allow(clippy::too_many_arguments)]
    async fn list_directory_prefixed_entries(
        &self,
        ctx: &OpContext,
        dir: &FullPath,
        start_file_name: &str,
        include_start_file: bool,
        limit: i64,
        prefix: &str,
        each: &mut (dyn FnMut(Entry) -> bool + Send),
    ) -> Result<String>;

    async fn kv_put(&self, ctx: &OpContext, key: &[u8], value: &[u8]) -> Result<()>;
    /// `KvCode::NOT_FOUND` when `key` is absent.
    async fn kv_get(&self, ctx: &OpContext, key: &[u8]) -> Result<Vec<u8>>;
    async fn kv_delete(&self, ctx: &OpContext, key: &[u8]) -> Result<()>;

    /// Release the engine connection.
    async fn shutdown(&self);
}
