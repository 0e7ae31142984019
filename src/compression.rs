//! Reversible byte transforms for container payloads
//!
//! The container codec compresses its main record and every asset record
//! through a [`Compressor`]. The wire format carries no method byte, so
//! writer and reader must agree on the method out of band.
//!
//! **Design**:
//! - `Compressor` is a plain byte-to-byte transform pair; implementations
//!   must satisfy `untransform(transform(x)) == x` for all inputs
//! - `GatedCompressor` wraps a method behind a one-time, idempotent
//!   `initialize()` step; calls before initialization fail with
//!   `CompressionUnavailable` rather than blocking

use crate::error::{CharxError, Result};
use std::sync::OnceLock;

/// Compression method for container payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    /// No compression (store bytes as-is)
    None,
    /// LZ4 compression (fast, moderate ratio)
    Lz4,
    /// Zstd compression (slower, better ratio)
    Zstd,
}

impl CompressionMethod {
    /// Construct the compressor implementing this method
    pub fn compressor(self) -> Box<dyn Compressor> {
        match self {
            CompressionMethod::None => Box::new(Passthrough),
            CompressionMethod::Lz4 => Box::new(Lz4Codec),
            CompressionMethod::Zstd => Box::new(ZstdCodec::default()),
        }
    }
}

/// Reversible byte-to-byte transform
pub trait Compressor: Send + Sync {
    /// Forward transform (compress)
    fn transform(&self, data: &[u8]) -> Result<Vec<u8>>;

    /// Inverse transform (decompress)
    fn untransform(&self, data: &[u8]) -> Result<Vec<u8>>;
}

/// Identity transform, used for testing and for byte-deterministic output
pub struct Passthrough;

impl Compressor for Passthrough {
    fn transform(&self, data: &[u8]) -> Result<Vec<u8>> {
        Ok(data.to_vec())
    }

    fn untransform(&self, data: &[u8]) -> Result<Vec<u8>> {
        Ok(data.to_vec())
    }
}

/// LZ4 transform with a size-prepended frame
pub struct Lz4Codec;

impl Compressor for Lz4Codec {
    fn transform(&self, data: &[u8]) -> Result<Vec<u8>> {
        Ok(lz4_flex::compress_prepend_size(data))
    }

    fn untransform(&self, data: &[u8]) -> Result<Vec<u8>> {
        lz4_flex::decompress_size_prepended(data)
            .map_err(|e| CharxError::Compression(format!("LZ4 decompression failed: {}", e)))
    }
}

/// Zstd transform
pub struct ZstdCodec {
    level: i32,
}

impl Default for ZstdCodec {
    fn default() -> Self {
        ZstdCodec { level: 3 }
    }
}

impl ZstdCodec {
    pub fn with_level(level: i32) -> Self {
        ZstdCodec { level }
    }
}

impl Compressor for ZstdCodec {
    fn transform(&self, data: &[u8]) -> Result<Vec<u8>> {
        zstd::stream::encode_all(data, self.level)
            .map_err(|e| CharxError::Compression(format!("Zstd compression failed: {}", e)))
    }

    fn untransform(&self, data: &[u8]) -> Result<Vec<u8>> {
        zstd::stream::decode_all(data)
            .map_err(|e| CharxError::Compression(format!("Zstd decompression failed: {}", e)))
    }
}

/// Compressor behind a one-time initialization gate
///
/// Models primitives that need asynchronous or out-of-process setup before
/// first use. `initialize()` is idempotent; the first call wins. All
/// transform calls before initialization fail with
/// [`CharxError::CompressionUnavailable`].
pub struct GatedCompressor {
    inner: OnceLock<Box<dyn Compressor>>,
}

impl GatedCompressor {
    pub fn new() -> Self {
        GatedCompressor {
            inner: OnceLock::new(),
        }
    }

    /// Install the backing method. Subsequent calls are no-ops.
    pub fn initialize(&self, method: CompressionMethod) {
        let _ = self.inner.set(method.compressor());
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.get().is_some()
    }

    fn get(&self) -> Result<&dyn Compressor> {
        self.inner
            .get()
            .map(|b| b.as_ref())
            .ok_or(CharxError::CompressionUnavailable)
    }
}

impl Default for GatedCompressor {
    fn default() -> Self {
        Self::new()
    }
}

impl Compressor for GatedCompressor {
    fn transform(&self, data: &[u8]) -> Result<Vec<u8>> {
        self.get()?.transform(data)
    }

    fn untransform(&self, data: &[u8]) -> Result<Vec<u8>> {
        self.get()?.untransform(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passthrough_round_trip() {
        let data = b"raw bytes";
        let codec = Passthrough;
        assert_eq!(codec.transform(data).unwrap(), data);
        assert_eq!(codec.untransform(data).unwrap(), data);
    }

    #[test]
    fn test_lz4_round_trip() {
        let data = b"Hello, World! ".repeat(100);
        let codec = Lz4Codec;
        let compressed = codec.transform(&data).unwrap();
        let decompressed = codec.untransform(&compressed).unwrap();

        assert_eq!(data.as_slice(), decompressed.as_slice());
        assert!(compressed.len() < data.len());
    }

    #[test]
    fn test_zstd_round_trip() {
        let data = b"Zstandard compression test data! ".repeat(100);
        let codec = ZstdCodec::default();
        let compressed = codec.transform(&data).unwrap();
        let decompressed = codec.untransform(&compressed).unwrap();

        assert_eq!(data.as_slice(), decompressed.as_slice());
        assert!(compressed.len() < data.len());
    }

    #[test]
    fn test_lz4_rejects_garbage() {
        let codec = Lz4Codec;
        let result = codec.untransform(&[0xFF; 3]);
        assert!(matches!(result, Err(CharxError::Compression(_))));
    }

    #[test]
    fn test_gate_blocks_until_initialized() {
        let gate = GatedCompressor::new();
        assert!(!gate.is_initialized());
        assert!(matches!(
            gate.transform(b"data"),
            Err(CharxError::CompressionUnavailable)
        ));
        assert!(matches!(
            gate.untransform(b"data"),
            Err(CharxError::CompressionUnavailable)
        ));

        gate.initialize(CompressionMethod::Lz4);
        assert!(gate.is_initialized());

        let compressed = gate.transform(b"data").unwrap();
        assert_eq!(gate.untransform(&compressed).unwrap(), b"data");
    }

    #[test]
    fn test_gate_initialization_is_idempotent() {
        let gate = GatedCompressor::new();
        gate.initialize(CompressionMethod::None);
        // Second initialize must not replace the installed method
        gate.initialize(CompressionMethod::Lz4);

        let out = gate.transform(b"unchanged").unwrap();
        assert_eq!(out, b"unchanged");
    }

    #[test]
    fn test_method_selector() {
        let data = b"method selector test ".repeat(50);
        for method in [
            CompressionMethod::None,
            CompressionMethod::Lz4,
            CompressionMethod::Zstd,
        ] {
            let codec = method.compressor();
            let round = codec.untransform(&codec.transform(&data).unwrap()).unwrap();
            assert_eq!(round, data);
        }
    }
}
