use filer_types::{Result, Status, StatusCode};

/// Magic number opening every zstd frame (little-endian `0xFD2FB528`).
///
/// A stored blob that starts with these bytes is treated as compressed; any
/// other blob is handed back untouched.
pub const ZSTD_MAGIC: [u8; 4] = [0x28, 0xB5, 0x2F, 0xFD];

/// Compress data using ZSTD at the given level (1-22).
pub fn zstd_compress(data: &[u8], level: i32) -> Result<Vec<u8>> {
    zstd::encode_all(data, level).map_err(|e| {
        Status::with_message(StatusCode::IO_ERROR, format!("ZSTD compress failed: {}", e))
    })
}

/// Decompress ZSTD-compressed data.
pub fn zstd_decompress(data: &[u8]) -> Result<Vec<u8>> {
    zstd::decode_all(data).map_err(|e| {
        Status::with_message(
            StatusCode::DATA_CORRUPTION,
            format!("ZSTD decompress failed: {}", e),
        )
    })
}

/// Whether `data` carries the zstd frame marker.
pub fn is_compressed(data: &[u8]) -> bool {
    data.starts_with(&ZSTD_MAGIC)
}

/// Compress `data` unless compression does not make it smaller.
///
/// The result is always readable through [`maybe_decompress`].
pub fn maybe_compress(data: Vec<u8>, level: i32) -> Result<Vec<u8>> {
    let compressed = zstd_compress(&data, level)?;
    if compressed.len() < data.len() {
        Ok(compressed)
    } else {
        Ok(data)
    }
}

/// Decompress `data` if it is a zstd frame, otherwise return it as is.
pub fn maybe_decompress(data: &[u8]) -> Result<Vec<u8>> {
    if is_compressed(data) {
        zstd_decompress(data)
    } else {
        Ok(data.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let data = b"hello world, this is a test of ZSTD compression!";
        let compressed = zstd_compress(data, 3).unwrap();
        assert!(is_compressed(&compressed));
        let decompressed = zstd_decompress(&compressed).unwrap();
        assert_eq!(data.as_slice(), decompressed.as_slice());
    }

    #[test]
    fn test_maybe_compress_repetitive_payload() {
        let data = br#"{"chunks":["#.repeat(200);
        let out = maybe_compress(data.clone(), 3).unwrap();
        assert!(is_compressed(&out));
        assert!(out.len() < data.len());
        assert_eq!(maybe_decompress(&out).unwrap(), data);
    }

    #[test]
    fn test_maybe_compress_keeps_incompressible_payload() {
        let data = b"{}".to_vec();
        let out = maybe_compress(data.clone(), 3).unwrap();
        assert_eq!(out, data);
        assert!(!is_compressed(&out));
    }

    #[test]
    fn test_maybe_decompress_passes_raw_bytes_through() {
        let raw = br#"{"attr":{}}"#;
        assert_eq!(maybe_decompress(raw).unwrap(), raw.to_vec());
        assert_eq!(maybe_decompress(b"").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_truncated_frame_is_corruption() {
        let data = b"some payload that is long enough to compress well well well".repeat(10);
        let compressed = zstd_compress(&data, 3).unwrap();
        let truncated = &compressed[..compressed.len() / 2];
        let err = maybe_decompress(truncated).unwrap_err();
        assert_eq!(err.code(), StatusCode::DATA_CORRUPTION);
    }
}
