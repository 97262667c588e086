//! Metadata store over any [`KvEngine`].
//!
//! Entries are stored under their path bytes (see [`crate::keys`]) with the
//! value produced by [`EntryCodec`]. Each public call maps to one facade
//! call, and therefore to one engine transaction, except listings: a page
//! thinned out by the name prefix filter is topped up with further range
//! reads, each in its own read transaction.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use filer_kv::KvEngine;
use filer_types::{make_error_msg, MetaCode, Result, StatusCode};

use crate::codec::EntryCodec;
use crate::context::OpContext;
use crate::entry::{Entry, FullPath};
use crate::facade::KvFacade;
use crate::filer_store::FilerStore;
use crate::keys;

pub struct KvFilerStore<E: KvEngine> {
    name: String,
    pub(crate) facade: KvFacade<E>,
    codec: EntryCodec,
}

impl<E: KvEngine> KvFilerStore<E> {
    pub fn new(name: impl Into<String>, engine: Arc<E>, codec: EntryCodec) -> Self {
        Self {
            name: name.into(),
            facade: KvFacade::new(engine),
            codec,
        }
    }

    pub fn facade(&self) -> &KvFacade<E> {
        &self.facade
    }

    pub fn codec(&self) -> &EntryCodec {
        &self.codec
    }

    pub async fn insert_entry(&self, ctx: &OpContext, entry: &Entry) -> Result<()> {
        let value = self
            .codec
            .encode(entry)
            .map_err(|e| e.context(format!("insert {}", entry.full_path)))?;
        self.facade
            .put(ctx, &keys::entry_key(&entry.full_path), &value)
            .await
            .map_err(|e| e.context(format!("insert {}", entry.full_path)))?;
        debug!(
            path = %entry.full_path,
            chunks = entry.chunks.len(),
            size = value.len(),
            "insert entry"
        );
        Ok(())
    }

    pub async fn find_entry(&self, ctx: &OpContext, path: &FullPath) -> Result<Entry> {
        let value = self
            .facade
            .get(ctx, &keys::entry_key(path))
            .await
            .map_err(|e| e.context(format!("find {}", path)))?;
        match value {
            Some(data) => self
                .codec
                .decode(path.clone(), &data)
                .map_err(|e| e.context(format!("find {}", path))),
            None => make_error_msg(MetaCode::NOT_FOUND, format!("find {}", path)),
        }
    }

    pub async fn delete_entry(&self, ctx: &OpContext, path: &FullPath) -> Result<()> {
        self.facade
            .delete(ctx, &keys::entry_key(path))
            .await
            .map_err(|e| e.context(format!("delete {}", path)))?;
        debug!(path = %path, "delete entry");
        Ok(())
    }

    /// Clear the whole byte-prefix range of `path`.
    ///
    /// The range also holds `path` itself and any lexical sibling sharing the
    /// prefix (`/dx` for `/d`).
    pub async fn delete_folder_children(&self, ctx: &OpContext, path: &FullPath) -> Result<()> {
        let (begin, end) = keys::subtree_prefix_range(path.as_bytes())
            .map_err(|e| e.context(format!("delete folder children {}", path)))?;
        self.facade
            .clear_range(ctx, &begin, &end)
            .await
            .map_err(|e| e.context(format!("delete folder children {}", path)))?;
        debug!(path = %path, "delete folder children");
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn list_directory_prefixed_entries(
        &self,
        ctx: &OpContext,
        dir: &FullPath,
        start_file_name: &str,
        include_start_file: bool,
        limit: i64,
        prefix: &str,
        each: &mut (dyn FnMut(Entry) -> bool + Send),
    ) -> Result<String> {
        if limit <= 0 {
            return make_error_msg(
                StatusCode::INVALID_ARG,
                format!("list {}: limit must be positive, got {}", dir, limit),
            );
        }
        let (mut begin, end) = keys::directory_range(dir, start_file_name);
        // one extra row makes room for the skipped start cursor
        let skip_start = !include_start_file && !start_file_name.is_empty();
        let children = keys::children_prefix(dir);
        let mut last_file_name = String::new();
        let mut delivered = 0i64;
        let mut first_page = true;
        loop {
            let wanted = limit - delivered;
            let scan_limit = if first_page && skip_start {
                wanted.saturating_add(1)
            } else {
                wanted
            };
            let page = self
                .facade
                .scan_range(ctx, &begin, &end, scan_limit)
                .await
                .map_err(|e| e.context(format!("list {}", dir)))?;
            let resume = page.kvs.last().map(|kv| keys::next_key(&kv.key));

            let mut stopped = false;
            for (idx, kv) in page.kvs.into_iter().enumerate() {
                if first_page && skip_start && idx == 0 && kv.key == begin {
                    continue;
                }
                if delivered >= limit {
                    break;
                }
                let Some(suffix) = keys::child_suffix(&children, &kv.key) else {
                    continue;
                };
                if !suffix.starts_with(prefix.as_bytes()) {
                    continue;
                }
                let entry = FullPath::from_key(&kv.key)
                    .and_then(|path| self.codec.decode(path, &kv.value))
                    .map_err(|e| {
                        warn!(
                            dir = %dir,
                            key = %String::from_utf8_lossy(&kv.key),
                            error = %e,
                            "list aborted on undecodable entry"
                        );
                        e.context(format!("list {}", dir))
                    })?;
                delivered += 1;
                last_file_name = entry.name().to_string();
                if !each(entry) {
                    stopped = true;
                    break;
                }
            }

            // rows dropped by the prefix filter leave the page short; keep
            // scanning until it is full or the range runs out
            match resume {
                Some(next) if !stopped && delivered < limit && page.has_more => {
                    begin = next;
                    first_page = false;
                }
                _ => break,
            }
        }
        debug!(dir = %dir, start = start_file_name, prefix, delivered, "list directory");
        Ok(last_file_name)
    }
}

#[async_trait]
impl<E: KvEngine + 'static> FilerStore for KvFilerStore<E> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn begin_transaction(&self, ctx: &OpContext) -> Result<OpContext> {
        ctx.check()?;
        Ok(ctx.clone())
    }

    async fn commit_transaction(&self, ctx: &OpContext) -> Result<()> {
        ctx.check()
    }

    async fn rollback_transaction(&self, ctx: &OpContext) -> Result<()> {
        ctx.check()
    }

    async fn insert_entry(&self, ctx: &OpContext, entry: &Entry) -> Result<()> {
        KvFilerStore::insert_entry(self, ctx, entry).await
    }

    async fn update_entry(&self, ctx: &OpContext, entry: &Entry) -> Result<()> {
        KvFilerStore::insert_entry(self, ctx, entry).await
    }

    async fn find_entry(&self, ctx: &OpContext, path: &FullPath) -> Result<Entry> {
        KvFilerStore::find_entry(self, ctx, path).await
    }

    async fn delete_entry(&self, ctx: &OpContext, path: &FullPath) -> Result<()> {
        KvFilerStore::delete_entry(self, ctx, path).await
    }

    async fn delete_folder_children(&self, ctx: &OpContext, path: &FullPath) -> Result<()> {
        KvFilerStore::delete_folder_children(self, ctx, path).await
    }

    async fn list_directory_entries(
        &self,
        ctx: &OpContext,
        dir: &FullPath,
        start_file_name: &str,
        include_start_file: bool,
        limit: i64,
        each: &mut (dyn FnMut(Entry) -> bool + Send),
    ) -> Result<String> {
        KvFilerStore::list_directory_prefixed_entries(
            self,
            ctx,
            dir,
            start_file_name,
            include_start_file,
            limit,
            "",
            each,
        )
        .await
    }

    async fn list_directory_prefixed_entries(
        &self,
        ctx: &OpContext,
        dir: &FullPath,
        start_file_name: &str,
        include_start_file: bool,
        limit: i64,
        prefix: &str,
        each: &mut (dyn FnMut(Entry) -> bool + Send),
    ) -> Result<String> {
        KvFilerStore::list_directory_prefixed_entries(
            self,
            ctx,
            dir,
            start_file_name,
            include_start_file,
            limit,
            prefix,
            each,
        )
        .await
    }

    async fn kv_put(&self, ctx: &OpContext, key: &[u8], value: &[u8]) -> Result<()> {
        KvFilerStore::kv_put(self, ctx, key, value).await
    }

    async fn kv_get(&self, ctx: &OpContext, key: &[u8]) -> Result<Vec<u8>> {
        KvFilerStore::kv_get(self, ctx, key).await
    }

    async fn kv_delete(&self, ctx: &OpContext, key: &[u8]) -> Result<()> {
        KvFilerStore::kv_delete(self, ctx, key).await
    }

    async fn shutdown(&self) {
        info!(store = %self.name, "filer store shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::FileChunk;
    use crate::facade::tests::FailingEngine;
    use filer_kv_backends::MemDbEngine;
    use filer_types::{ErrorKind, TransactionCode};

    fn store() -> KvFilerStore<MemDbEngine> {
        KvFilerStore::new("memdb", Arc::new(MemDbEngine::new()), EntryCodec::default())
    }

    async fn insert_files(store: &KvFilerStore<MemDbEngine>, paths: &[&str]) {
        let ctx = OpContext::background();
        for path in paths {
            store
                .insert_entry(&ctx, &Entry::new_file(*path, 0o644))
                .await
                .unwrap();
        }
    }

    async fn list(
        store: &KvFilerStore<MemDbEngine>,
        dir: &str,
        start: &str,
        include_start: bool,
        limit: i64,
        prefix: &str,
    ) -> (Vec<String>, String) {
        let mut names = Vec::new();
        let last = store
            .list_directory_prefixed_entries(
                &OpContext::background(),
                &dir.into(),
                start,
                include_start,
                limit,
                prefix,
                &mut |entry: Entry| {
                    names.push(entry.full_path.to_string());
                    true
                },
            )
            .await
            .unwrap();
        (names, last)
    }

    #[tokio::test]
    async fn test_insert_find_roundtrip() {
        let store = store();
        let ctx = OpContext::background();
        let mut entry = Entry::new_file("/d/file", 0o600).with_chunks(vec![FileChunk {
            file_id: "1,ab".into(),
            offset: 0,
            size: 10,
            modified_ts_ns: 5,
            e_tag: String::new(),
        }]);
        entry.attr.mime = "text/plain".into();
        store.insert_entry(&ctx, &entry).await.unwrap();
        assert_eq!(store.find_entry(&ctx, &"/d/file".into()).await.unwrap(), entry);
    }

    #[tokio::test]
    async fn test_last_writer_wins() {
        let store = store();
        let ctx = OpContext::background();
        let first = Entry::new_file("/d/f", 0o644);
        let mut second = first.clone();
        second.attr.uid = 1000;
        store.insert_entry(&ctx, &first).await.unwrap();
        FilerStore::update_entry(&store, &ctx, &second).await.unwrap();
        assert_eq!(store.find_entry(&ctx, &"/d/f".into()).await.unwrap(), second);
    }

    #[tokio::test]
    async fn test_find_missing_is_not_found() {
        let store = store();
        let err = store
            .find_entry(&OpContext::background(), &"/nope".into())
            .await
            .unwrap_err();
        assert_eq!(err.code(), MetaCode::NOT_FOUND);
        assert!(err.is_not_found());
        assert!(err.message().unwrap().contains("/nope"));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = store();
        let ctx = OpContext::background();
        insert_files(&store, &["/d/x"]).await;
        let path = FullPath::from("/d/x");
        store.delete_entry(&ctx, &path).await.unwrap();
        store.delete_entry(&ctx, &path).await.unwrap();
        assert!(store.find_entry(&ctx, &path).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_delete_folder_children_removes_subtree() {
        let store = store();
        let ctx = OpContext::background();
        insert_files(&store, &["/d/x", "/d/y", "/d/sub/z", "/e/keep"]).await;
        store
            .delete_folder_children(&ctx, &"/d".into())
            .await
            .unwrap();

        let engine = store.facade().engine();
        assert!(engine.keys().iter().all(|k| !k.starts_with(b"/d")));
        assert!(store.find_entry(&ctx, &"/e/keep".into()).await.is_ok());
    }

    #[tokio::test]
    async fn test_delete_folder_children_rejects_empty_path() {
        let store = store();
        let err = store
            .delete_folder_children(&OpContext::background(), &"".into())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn test_list_exclusive_and_inclusive_start() {
        let store = store();
        insert_files(&store, &["/dir/a", "/dir/b", "/dir/c"]).await;

        let (names, last) = list(&store, "/dir", "a", false, 2, "").await;
        assert_eq!(names, vec!["/dir/b", "/dir/c"]);
        assert_eq!(last, "c");

        let (names, last) = list(&store, "/dir", "a", true, 2, "").await;
        assert_eq!(names, vec!["/dir/a", "/dir/b"]);
        assert_eq!(last, "b");
    }

    #[tokio::test]
    async fn test_list_from_beginning_skips_dir_and_siblings() {
        let store = store();
        let ctx = OpContext::background();
        store
            .insert_entry(&ctx, &Entry::new_directory("/d", 0o755))
            .await
            .unwrap();
        insert_files(&store, &["/d/a", "/d/b", "/dx", "/d-sibling"]).await;

        let (names, last) = list(&store, "/d", "", false, 10, "").await;
        assert_eq!(names, vec!["/d/a", "/d/b"]);
        assert_eq!(last, "b");

        let (names, _) = list(&store, "/d", "", true, 10, "").await;
        assert_eq!(names, vec!["/d/a", "/d/b"]);
    }

    #[tokio::test]
    async fn test_list_small_pages_next_to_siblings() {
        let store = store();
        let ctx = OpContext::background();
        store
            .insert_entry(&ctx, &Entry::new_directory("/foo", 0o755))
            .await
            .unwrap();
        insert_files(&store, &["/foo.txt", "/foo-bak", "/foo/a", "/foo/b"]).await;

        let (names, last) = list(&store, "/foo", "", false, 1, "").await;
        assert_eq!(names, vec!["/foo/a"]);
        assert_eq!(last, "a");

        let mut seen = Vec::new();
        let mut cursor = String::new();
        loop {
            let (names, last) = list(&store, "/foo", &cursor, false, 1, "").await;
            if names.is_empty() {
                assert!(last.is_empty());
                break;
            }
            seen.extend(names);
            cursor = last;
        }
        assert_eq!(seen, vec!["/foo/a", "/foo/b"]);
    }

    #[tokio::test]
    async fn test_list_delivers_nested_descendants() {
        let store = store();
        insert_files(&store, &["/d/a", "/d/sub/z"]).await;
        let (names, last) = list(&store, "/d", "", false, 10, "").await;
        assert_eq!(names, vec!["/d/a", "/d/sub/z"]);
        assert_eq!(last, "z");
    }

    #[tokio::test]
    async fn test_list_root() {
        let store = store();
        insert_files(&store, &["/a", "/b/c"]).await;
        let (names, _) = list(&store, "/", "", false, 10, "").await;
        assert_eq!(names, vec!["/a", "/b/c"]);
    }

    #[tokio::test]
    async fn test_list_missing_start_cursor_delivers_limit() {
        let store = store();
        insert_files(&store, &["/d/b", "/d/c", "/d/e"]).await;
        let (names, _) = list(&store, "/d", "a", false, 2, "").await;
        assert_eq!(names, vec!["/d/b", "/d/c"]);
    }

    #[tokio::test]
    async fn test_list_pagination_cursor() {
        let store = store();
        let children = ["a", "b", "c", "d", "e"];
        let paths: Vec<String> = children.iter().map(|c| format!("/p/{}", c)).collect();
        let refs: Vec<&str> = paths.iter().map(String::as_str).collect();
        insert_files(&store, &refs).await;

        let mut seen = Vec::new();
        let mut cursor = String::new();
        loop {
            let (names, last) = list(&store, "/p", &cursor, false, 1, "").await;
            if names.is_empty() {
                assert!(last.is_empty());
                break;
            }
            assert_eq!(names.len(), 1);
            seen.extend(names);
            cursor = last;
        }
        assert_eq!(seen, paths);
    }

    #[tokio::test]
    async fn test_list_prefix_filter() {
        let store = store();
        insert_files(&store, &["/d/apple", "/d/apricot", "/d/banana", "/d/avocado"]).await;
        let (names, last) = list(&store, "/d", "", false, 10, "ap").await;
        assert_eq!(names, vec!["/d/apple", "/d/apricot"]);
        assert_eq!(last, "apricot");

        let (names, _) = list(&store, "/d", "", false, 10, "zz").await;
        assert!(names.is_empty());
    }

    #[tokio::test]
    async fn test_list_prefix_filter_reads_past_non_matching_rows() {
        let store = store();
        insert_files(&store, &["/d/a1", "/d/a2", "/d/a3", "/d/b1", "/d/b2", "/d/c1"]).await;

        let (names, last) = list(&store, "/d", "", false, 2, "b").await;
        assert_eq!(names, vec!["/d/b1", "/d/b2"]);
        assert_eq!(last, "b2");

        let (names, last) = list(&store, "/d", "b2", false, 2, "b").await;
        assert!(names.is_empty());
        assert!(last.is_empty());

        let (names, last) = list(&store, "/d", "", false, 1, "c").await;
        assert_eq!(names, vec!["/d/c1"]);
        assert_eq!(last, "c1");
    }

    #[tokio::test]
    async fn test_list_callback_stops_early() {
        let store = store();
        insert_files(&store, &["/d/a", "/d/b", "/d/c"]).await;
        let mut seen = Vec::new();
        let last = FilerStore::list_directory_entries(
            &store,
            &OpContext::background(),
            &"/d".into(),
            "",
            false,
            10,
            &mut |entry: Entry| {
                seen.push(entry.name().to_string());
                seen.len() < 2
            },
        )
        .await
        .unwrap();
        assert_eq!(seen, vec!["a", "b"]);
        assert_eq!(last, "b");
    }

    #[tokio::test]
    async fn test_list_rejects_non_positive_limit() {
        let store = store();
        let err = store
            .list_directory_prefixed_entries(
                &OpContext::background(),
                &"/d".into(),
                "",
                false,
                0,
                "",
                &mut |_: Entry| true,
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), StatusCode::INVALID_ARG);
    }

    #[tokio::test]
    async fn test_list_aborts_on_corrupt_entry() {
        let store = store();
        let ctx = OpContext::background();
        insert_files(&store, &["/d/a", "/d/c"]).await;
        store.facade().put(&ctx, b"/d/b", b"corrupt").await.unwrap();

        let mut seen = Vec::new();
        let err = store
            .list_directory_prefixed_entries(&ctx, &"/d".into(), "", false, 10, "", &mut |e: Entry| {
                seen.push(e.name().to_string());
                true
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decoding);
        assert!(err.message().unwrap().starts_with("list /d"));
        assert_eq!(seen, vec!["a"]);
    }

    #[tokio::test]
    async fn test_engine_error_surfaces_with_path() {
        let store = KvFilerStore::new(
            "failing",
            Arc::new(FailingEngine {
                code: TransactionCode::NETWORK_ERROR,
            }),
            EntryCodec::default(),
        );
        let ctx = OpContext::background();
        let err = store
            .insert_entry(&ctx, &Entry::new_file("/d/x", 0o644))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Engine);
        assert!(err.message().unwrap().starts_with("insert /d/x"));

        let err = store.find_entry(&ctx, &"/d/x".into()).await.unwrap_err();
        assert_eq!(err.code(), TransactionCode::NETWORK_ERROR);
        assert!(!err.is_not_found());
    }

    #[tokio::test]
    async fn test_transaction_passthrough_honours_cancellation() {
        let store = store();
        let ctx = store
            .begin_transaction(&OpContext::background())
            .await
            .unwrap();
        store.commit_transaction(&ctx).await.unwrap();

        let (ctx, handle) = OpContext::background().cancellable();
        handle.cancel();
        assert!(store.begin_transaction(&ctx).await.is_err());
        assert!(store.rollback_transaction(&ctx).await.is_err());
        let err = store
            .insert_entry(&ctx, &Entry::new_file("/d/x", 0o644))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Cancelled);
    }
}
