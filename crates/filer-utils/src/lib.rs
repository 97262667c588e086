pub mod compression;

pub use compression::{is_compressed, maybe_compress, maybe_decompress};
