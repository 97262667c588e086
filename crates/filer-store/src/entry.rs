//! Filesystem entry model.
//!
//! An [`Entry`] is addressed by its [`FullPath`]; the path is the storage key
//! and is never part of the serialized payload. Attributes, chunks and
//! extended attributes are serialized together with `serde_json`.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use filer_types::{make_error_msg, Result, Status, StatusCode};

/// File type bits of [`Attr::mode`].
pub const S_IFMT: u32 = 0o170000;
/// Directory type bits.
pub const S_IFDIR: u32 = 0o040000;
/// Regular file type bits.
pub const S_IFREG: u32 = 0o100000;
/// Symlink type bits.
pub const S_IFLNK: u32 = 0o120000;

/// Absolute, slash-delimited path of an entry. `/` is the root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FullPath(String);

impl FullPath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn root() -> Self {
        Self("/".to_string())
    }

    /// Rebuild a path from a stored key.
    pub fn from_key(key: &[u8]) -> Result<Self> {
        match std::str::from_utf8(key) {
            Ok(s) => Ok(Self(s.to_string())),
            Err(e) => make_error_msg(
                StatusCode::DATA_CORRUPTION,
                format!("key {:?} is not a utf-8 path: {}", String::from_utf8_lossy(key), e),
            ),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    /// Last path segment; empty for the root.
    pub fn name(&self) -> &str {
        match self.0.rfind('/') {
            Some(idx) => &self.0[idx + 1..],
            None => &self.0,
        }
    }

    /// Parent directory. The parent of a top-level entry (and of the root)
    /// is the root.
    pub fn dir(&self) -> FullPath {
        match self.0.rfind('/') {
            Some(0) | None => Self::root(),
            Some(idx) => Self(self.0[..idx].to_string()),
        }
    }

    /// Join a child name onto this directory.
    pub fn child(&self, name: &str) -> FullPath {
        if self.0.ends_with('/') {
            Self(format!("{}{}", self.0, name))
        } else {
            Self(format!("{}/{}", self.0, name))
        }
    }
}

impl fmt::Display for FullPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for FullPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for FullPath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for FullPath {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// POSIX-like attributes of an entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attr {
    /// Modification time, unix seconds.
    pub mtime: i64,
    /// Creation time, unix seconds.
    pub crtime: i64,
    pub mode: u32,
    pub uid: u32,
    pub gid: u32,
    #[serde(default)]
    pub mime: String,
    #[serde(default)]
    pub ttl_sec: i32,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub group_names: Vec<String>,
    #[serde(default)]
    pub symlink_target: String,
    #[serde(default)]
    pub md5: Vec<u8>,
    #[serde(default)]
    pub file_size: u64,
}

impl Attr {
    /// Attributes stamped with the current time.
    pub fn now(mode: u32) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            mtime: now,
            crtime: now,
            mode,
            ..Default::default()
        }
    }

    pub fn is_directory(&self) -> bool {
        self.mode & S_IFMT == S_IFDIR
    }
}

/// One data chunk of a file, stored elsewhere and referenced by id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChunk {
    pub file_id: String,
    pub offset: i64,
    pub size: u64,
    pub modified_ts_ns: i64,
    #[serde(default)]
    pub e_tag: String,
}

/// A filesystem metadata record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub full_path: FullPath,
    pub attr: Attr,
    pub chunks: Vec<FileChunk>,
    pub extended: BTreeMap<String, Vec<u8>>,
}

#[derive(Serialize)]
struct PayloadRef<'a> {
    attr: &'a Attr,
    chunks: &'a [FileChunk],
    extended: &'a BTreeMap<String, Vec<u8>>,
}

#[derive(Deserialize)]
struct Payload {
    attr: Attr,
    #[serde(default)]
    chunks: Vec<FileChunk>,
    #[serde(default)]
    extended: BTreeMap<String, Vec<u8>>,
}

impl Entry {
    pub fn new(full_path: impl Into<FullPath>, attr: Attr) -> Self {
        Self {
            full_path: full_path.into(),
            attr,
            chunks: Vec::new(),
            extended: BTreeMap::new(),
        }
    }

    /// A regular file with `perm` permission bits, stamped now.
    pub fn new_file(full_path: impl Into<FullPath>, perm: u32) -> Self {
        Self::new(full_path, Attr::now(S_IFREG | (perm & 0o7777)))
    }

    /// A directory with `perm` permission bits, stamped now.
    pub fn new_directory(full_path: impl Into<FullPath>, perm: u32) -> Self {
        Self::new(full_path, Attr::now(S_IFDIR | (perm & 0o7777)))
    }

    pub fn with_chunks(mut self, chunks: Vec<FileChunk>) -> Self {
        self.attr.file_size = chunks
            .iter()
            .map(|c| c.offset.max(0) as u64 + c.size)
            .max()
            .unwrap_or(0);
        self.chunks = chunks;
        self
    }

    pub fn name(&self) -> &str {
        self.full_path.name()
    }

    pub fn is_directory(&self) -> bool {
        self.attr.is_directory()
    }

    /// Serialize everything except the path.
    pub fn encode_attributes_and_chunks(&self) -> Result<Vec<u8>> {
        let payload = PayloadRef {
            attr: &self.attr,
            chunks: &self.chunks,
            extended: &self.extended,
        };
        serde_json::to_vec(&payload).map_err(|e| {
            Status::with_message(
                StatusCode::ENCODE_FAILED,
                format!("encode {}: {}", self.full_path, e),
            )
        })
    }

    /// Replace attributes, chunks and extended attributes from `data`.
    pub fn decode_attributes_and_chunks(&mut self, data: &[u8]) -> Result<()> {
        let payload: Payload = serde_json::from_slice(data).map_err(|e| {
            Status::with_message(
                StatusCode::DATA_CORRUPTION,
                format!("decode {}: {}", self.full_path, e),
            )
        })?;
        self.attr = payload.attr;
        self.chunks = payload.chunks;
        self.extended = payload.extended;
        Ok(())
    }
}
