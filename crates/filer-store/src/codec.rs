//! Entry value encoding with optional compression.
//!
//! Entries with more chunks than the threshold are wrapped in a zstd frame.
//! Decoding sniffs the frame magic, so values written under any threshold
//! stay readable.

use filer_types::{Result, Status, StatusCode};
use filer_utils::{maybe_compress, maybe_decompress};

use crate::config::StoreConfig;
use crate::entry::{Attr, Entry, FullPath};

pub const DEFAULT_COMPRESS_CHUNK_THRESHOLD: usize = 50;
pub const DEFAULT_COMPRESSION_LEVEL: i32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryCodec {
    compress_chunk_threshold: usize,
    compression_level: i32,
}

impl Default for EntryCodec {
    fn default() -> Self {
        Self::new(DEFAULT_COMPRESS_CHUNK_THRESHOLD, DEFAULT_COMPRESSION_LEVEL)
    }
}

impl EntryCodec {
    pub fn new(compress_chunk_threshold: usize, compression_level: i32) -> Self {
        Self {
            compress_chunk_threshold,
            compression_level,
        }
    }

    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(config.compress_chunk_threshold, config.compression_level)
    }

    pub fn compress_chunk_threshold(&self) -> usize {
        self.compress_chunk_threshold
    }

    /// Whether `entry` is large enough to be compressed.
    pub fn should_compress(&self, entry: &Entry) -> bool {
        entry.chunks.len() > self.compress_chunk_threshold
    }

    pub fn encode(&self, entry: &Entry) -> Result<Vec<u8>> {
        let data = entry.encode_attributes_and_chunks()?;
        if !self.should_compress(entry) {
            return Ok(data);
        }
        maybe_compress(data, self.compression_level).map_err(|e| {
            Status::with_message(
                StatusCode::ENCODE_FAILED,
                format!("compress {}: {}", entry.full_path, e),
            )
        })
    }

    /// Decode the value stored under `full_path`.
    pub fn decode(&self, full_path: FullPath, data: &[u8]) -> Result<Entry> {
        let data = maybe_decompress(data)
            .map_err(|e| e.context(format!("decompress {}", full_path)))?;
        let mut entry = Entry::new(full_path, Attr::default());
        entry.decode_attributes_and_chunks(&data)?;
        Ok(entry)
    }
}
