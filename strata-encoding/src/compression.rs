//! General-purpose compression of whole buffers, looked up by scheme name.

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

use bytes::Bytes;
use strata_error::{StrataResult, strata_err};

/// Scheme names meaning "stored uncompressed".
const NO_COMPRESSION: [&str; 2] = ["", "none"];

/// A named buffer compression strategy.
pub trait CompressionScheme: Debug + Send + Sync {
    /// The name recorded in the encoding tree.
    fn name(&self) -> &str;

    fn compress(&self, raw: &[u8], bits_per_value: u64) -> StrataResult<Bytes>;

    fn decompress(&self, compressed: &[u8], bits_per_value: u64) -> StrataResult<Bytes>;
}

/// Zstandard at a fixed compression level.
#[derive(Debug, Clone, Copy)]
pub struct ZstdCompression {
    level: i32,
}

impl ZstdCompression {
    pub const NAME: &'static str = "zstd";

    pub fn new(level: i32) -> Self {
        Self { level }
    }
}

impl Default for ZstdCompression {
    fn default() -> Self {
        // zero selects zstd's default level
        Self::new(0)
    }
}

impl CompressionScheme for ZstdCompression {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn compress(&self, raw: &[u8], _bits_per_value: u64) -> StrataResult<Bytes> {
        Ok(Bytes::from(zstd::encode_all(raw, self.level)?))
    }

    fn decompress(&self, compressed: &[u8], _bits_per_value: u64) -> StrataResult<Bytes> {
        zstd::decode_all(compressed)
            .map(Bytes::from)
            .map_err(|e| strata_err!(CorruptData: "Failed to decompress zstd buffer: {}", e))
    }
}

/// Maps compression scheme names to strategies.
#[derive(Debug, Clone)]
pub struct CompressionRegistry {
    schemes: HashMap<String, Arc<dyn CompressionScheme>>,
}

impl CompressionRegistry {
    /// A registry without any scheme.
    pub fn empty() -> Self {
        Self {
            schemes: HashMap::new(),
        }
    }

    pub fn register(&mut self, scheme: Arc<dyn CompressionScheme>) {
        self.schemes.insert(scheme.name().to_string(), scheme);
    }

    pub fn with_scheme(mut self, scheme: Arc<dyn CompressionScheme>) -> Self {
        self.register(scheme);
        self
    }

    /// Whether `name` means the buffer is stored uncompressed.
    pub fn is_uncompressed(name: &str) -> bool {
        NO_COMPRESSION.contains(&name)
    }

    /// Resolve a scheme by name. Returns `None` for the names meaning "uncompressed".
    pub fn get(&self, name: &str) -> StrataResult<Option<Arc<dyn CompressionScheme>>> {
        if Self::is_uncompressed(name) {
            return Ok(None);
        }
        self.schemes
            .get(name)
            .cloned()
            .map(Some)
            .ok_or_else(|| strata_err!(UnsupportedEncoding: "Unknown compression scheme {}", name))
    }

    pub fn decompress(&self, name: &str, compressed: Bytes, bits_per_value: u64) -> StrataResult<Bytes> {
        match self.get(name)? {
            None => Ok(compressed),
            Some(scheme) => scheme.decompress(&compressed, bits_per_value),
        }
    }

    pub fn compress(&self, name: &str, raw: Bytes, bits_per_value: u64) -> StrataResult<Bytes> {
        match self.get(name)? {
            None => Ok(raw),
            Some(scheme) => scheme.compress(&raw, bits_per_value),
        }
    }
}

impl Default for CompressionRegistry {
    fn default() -> Self {
        Self::empty().with_scheme(Arc::new(ZstdCompression::default()))
    }
}
