// Pluggable compression backends.
//
// Provides a `CompressBackend` trait with built-in implementations:
//   - NoCompression (passthrough)
//   - Snappy (via snap, feature-gated `snappy`)
//   - Zlib (via flate2, feature-gated `zlib`)
//   - Zstandard (via zstd-safe, feature-gated `zstd`)
//   - External/custom compressors via the trait
//
// Decompression output is sized up front. Snappy and zstd report the
// decompressed length in their headers; when that length is unavailable the
// backend fails instead of guessing.

use std::ops::RangeInclusive;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum CompressError {
    #[error("unknown compression type: {0}")]
    UnknownAlgorithm(String),
    #[error("{algorithm} compression level must be between {min} and {max}, got {level}")]
    LevelOutOfRange {
        algorithm: &'static str,
        level: i32,
        min: i32,
        max: i32,
    },
    #[error("{algorithm} compression failed: {reason}")]
    Compress {
        algorithm: &'static str,
        reason: String,
    },
    #[error("{algorithm} decompression failed: {reason}")]
    Decompress {
        algorithm: &'static str,
        reason: String,
    },
    #[error("cannot allocate {size} bytes for decompressed output")]
    Allocation { size: usize },
    #[error("{algorithm} compression requires the `{feature}` feature")]
    Unsupported {
        algorithm: &'static str,
        feature: &'static str,
    },
}

// ---------------------------------------------------------------------------
// CompressBackend trait
// ---------------------------------------------------------------------------

/// A compression service applied to a whole encoded stream.
///
/// # Implementing a custom backend
///
/// ```
/// use lbin::compress::{CompressBackend, CompressError};
///
/// struct Reverse;
///
/// impl CompressBackend for Reverse {
///     fn name(&self) -> &'static str { "reverse" }
///     fn compress(&self, data: &[u8], _level: i32) -> Result<Vec<u8>, CompressError> {
///         Ok(data.iter().rev().copied().collect())
///     }
///     fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, CompressError> {
///         Ok(data.iter().rev().copied().collect())
///     }
/// }
/// ```
pub trait CompressBackend: Send + Sync {
    /// Name used in error messages and logs.
    fn name(&self) -> &'static str;

    /// Accepted compression levels, or `None` when the level is ignored.
    fn level_range(&self) -> Option<RangeInclusive<i32>> {
        None
    }

    /// Compress a whole stream.
    fn compress(&self, data: &[u8], level: i32) -> Result<Vec<u8>, CompressError>;

    /// Decompress a stream produced by `compress`.
    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, CompressError>;

    /// Reject levels outside `level_range()`.
    fn check_level(&self, level: i32) -> Result<(), CompressError> {
        match self.level_range() {
            Some(range) if !range.contains(&level) => Err(CompressError::LevelOutOfRange {
                algorithm: self.name(),
                level,
                min: *range.start(),
                max: *range.end(),
            }),
            _ => Ok(()),
        }
    }
}

/// Fallibly reserve an output buffer of `size` bytes, zero-filled on request.
#[cfg_attr(
    not(any(feature = "snappy", feature = "zlib", feature = "zstd")),
    allow(dead_code)
)]
fn output_buffer(size: usize, zeroed: bool) -> Result<Vec<u8>, CompressError> {
    let mut out = Vec::new();
    out.try_reserve_exact(size)
        .map_err(|_| CompressError::Allocation { size })?;
    if zeroed {
        out.resize(size, 0);
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// No-compression backend
// ---------------------------------------------------------------------------

/// Passthrough "compressor".
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCompression;

impl CompressBackend for NoCompression {
    fn name(&self) -> &'static str {
        "none"
    }

    fn compress(&self, data: &[u8], _level: i32) -> Result<Vec<u8>, CompressError> {
        Ok(data.to_vec())
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, CompressError> {
        Ok(data.to_vec())
    }
}

// ---------------------------------------------------------------------------
// Snappy backend
// ---------------------------------------------------------------------------

/// Upper bound on snappy output per input byte; a 3-byte copy emits at most 64.
#[cfg(feature = "snappy")]
const SNAPPY_MAX_EXPANSION: usize = 32;

/// Snappy raw block format. The level is ignored.
#[cfg(feature = "snappy")]
#[derive(Debug, Clone, Copy, Default)]
pub struct SnappyBackend;

#[cfg(feature = "snappy")]
impl CompressBackend for SnappyBackend {
    fn name(&self) -> &'static str {
        "snappy"
    }

    fn compress(&self, data: &[u8], _level: i32) -> Result<Vec<u8>, CompressError> {
        snap::raw::Encoder::new()
            .compress_vec(data)
            .map_err(|e| CompressError::Compress {
                algorithm: self.name(),
                reason: e.to_string(),
            })
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, CompressError> {
        let size = snap::raw::decompress_len(data).map_err(|e| CompressError::Decompress {
            algorithm: self.name(),
            reason: format!("cannot determine decompressed length: {e}"),
        })?;
        if size > data.len().saturating_mul(SNAPPY_MAX_EXPANSION) {
            return Err(CompressError::Decompress {
                algorithm: self.name(),
                reason: format!(
                    "header claims {size} bytes from a {} byte block",
                    data.len()
                ),
            });
        }
        let mut out = output_buffer(size, true)?;
        let written = snap::raw::Decoder::new()
            .decompress(data, &mut out)
            .map_err(|e| CompressError::Decompress {
                algorithm: self.name(),
                reason: e.to_string(),
            })?;
        out.truncate(written);
        Ok(out)
    }
}

// ---------------------------------------------------------------------------
// Zlib backend
// ---------------------------------------------------------------------------

/// Zlib format (deflate + zlib header + Adler-32), levels 1-9.
#[cfg(feature = "zlib")]
#[derive(Debug, Clone, Copy, Default)]
pub struct ZlibBackend;

#[cfg(feature = "zlib")]
impl CompressBackend for ZlibBackend {
    fn name(&self) -> &'static str {
        "zlib"
    }

    fn level_range(&self) -> Option<RangeInclusive<i32>> {
        let fast = flate2::Compression::fast().level() as i32;
        let best = flate2::Compression::best().level() as i32;
        Some(fast..=best)
    }

    fn compress(&self, data: &[u8], level: i32) -> Result<Vec<u8>, CompressError> {
        use flate2::write::ZlibEncoder;
        use std::io::Write;

        self.check_level(level)?;
        let fail = |e: std::io::Error| CompressError::Compress {
            algorithm: "zlib",
            reason: e.to_string(),
        };
        let mut encoder = ZlibEncoder::new(
            Vec::with_capacity(data.len() / 2),
            flate2::Compression::new(level as u32),
        );
        encoder.write_all(data).map_err(fail)?;
        encoder.finish().map_err(fail)
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, CompressError> {
        use flate2::read::ZlibDecoder;
        use std::io::Read;

        // Zlib does not record the decompressed size; start from a guess and
        // let the reader grow the buffer.
        let mut out = output_buffer(data.len().saturating_mul(4), false)?;
        ZlibDecoder::new(data)
            .read_to_end(&mut out)
            .map_err(|e| CompressError::Decompress {
                algorithm: self.name(),
                reason: e.to_string(),
            })?;
        Ok(out)
    }
}

// ---------------------------------------------------------------------------
// Zstandard backend
// ---------------------------------------------------------------------------

/// Zstandard single frame with content size.
#[cfg(feature = "zstd")]
#[derive(Debug, Clone, Copy, Default)]
pub struct ZstdBackend;

#[cfg(feature = "zstd")]
impl CompressBackend for ZstdBackend {
    fn name(&self) -> &'static str {
        "zstd"
    }

    fn level_range(&self) -> Option<RangeInclusive<i32>> {
        Some(zstd_safe::min_c_level()..=zstd_safe::max_c_level())
    }

    fn compress(&self, data: &[u8], level: i32) -> Result<Vec<u8>, CompressError> {
        self.check_level(level)?;
        let mut out = Vec::with_capacity(zstd_safe::compress_bound(data.len()));
        zstd_safe::compress(&mut out, data, level).map_err(|code| CompressError::Compress {
            algorithm: self.name(),
            reason: zstd_safe::get_error_name(code).to_string(),
        })?;
        Ok(out)
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, CompressError> {
        let unknown = |reason: &str| CompressError::Decompress {
            algorithm: "zstd",
            reason: format!("cannot determine decompressed length: {reason}"),
        };
        let size = match zstd_safe::get_frame_content_size(data) {
            Ok(Some(size)) => size,
            Ok(None) => return Err(unknown("frame does not record its content size")),
            Err(_) => return Err(unknown("not a zstd frame")),
        };
        let size = usize::try_from(size).map_err(|_| CompressError::Allocation {
            size: usize::MAX,
        })?;
        let mut out = output_buffer(size, false)?;
        zstd_safe::decompress(&mut out, data).map_err(|code| CompressError::Decompress {
            algorithm: self.name(),
            reason: zstd_safe::get_error_name(code).to_string(),
        })?;
        Ok(out)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<u8> {
        b"Hello, world! This is test data. "
            .iter()
            .copied()
            .cycle()
            .take(1024)
            .collect()
    }

    #[test]
    fn no_compression_passthrough() {
        let backend = NoCompression;
        let data = b"test data";
        assert_eq!(backend.compress(data, 99).unwrap(), data);
        assert_eq!(backend.decompress(data).unwrap(), data);
        assert!(backend.check_level(i32::MIN).is_ok());
    }

    #[cfg(feature = "snappy")]
    #[test]
    fn snappy_roundtrip() {
        let backend = SnappyBackend;
        let data = sample();
        let compressed = backend.compress(&data, 1).unwrap();
        assert!(compressed.len() < data.len());
        assert_eq!(backend.decompress(&compressed).unwrap(), data);
    }

    #[cfg(feature = "snappy")]
    #[test]
    fn snappy_rejects_garbage() {
        let err = SnappyBackend.decompress(&[0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]).unwrap_err();
        assert!(matches!(err, CompressError::Decompress { algorithm: "snappy", .. }));
    }

    #[cfg(feature = "zlib")]
    #[test]
    fn zlib_roundtrip_all_levels() {
        let backend = ZlibBackend;
        let data = sample();
        for level in 1..=9 {
            let compressed = backend.compress(&data, level).unwrap();
            assert!(compressed.len() < data.len());
            assert_eq!(backend.decompress(&compressed).unwrap(), data);
        }
    }

    #[cfg(feature = "zlib")]
    #[test]
    fn zlib_level_bounds() {
        let backend = ZlibBackend;
        assert_eq!(backend.level_range(), Some(1..=9));
        assert!(matches!(
            backend.compress(b"x", 0),
            Err(CompressError::LevelOutOfRange { min: 1, max: 9, level: 0, .. })
        ));
        assert!(backend.check_level(10).is_err());
    }

    #[cfg(feature = "zstd")]
    #[test]
    fn zstd_roundtrip() {
        let backend = ZstdBackend;
        let data = sample();
        for level in [1, 3, 19] {
            let compressed = backend.compress(&data, level).unwrap();
            assert!(compressed.len() < data.len());
            assert_eq!(backend.decompress(&compressed).unwrap(), data);
        }
        let empty = backend.compress(&[], 1).unwrap();
        assert!(backend.decompress(&empty).unwrap().is_empty());
    }

    #[cfg(feature = "zstd")]
    #[test]
    fn zstd_level_bounds() {
        let backend = ZstdBackend;
        let range = backend.level_range().unwrap();
        assert!(range.contains(&1));
        assert!(backend.check_level(range.end() + 1).is_err());
    }

    #[cfg(feature = "zstd")]
    #[test]
    fn zstd_rejects_non_frames() {
        let err = ZstdBackend.decompress(b"not a frame").unwrap_err();
        assert!(matches!(err, CompressError::Decompress { algorithm: "zstd", .. }));
    }

    #[cfg(feature = "zstd")]
    #[test]
    fn zstd_requires_content_size() {
        let data = sample();
        let mut cctx = zstd_safe::CCtx::create();
        cctx.set_parameter(zstd_safe::CParameter::ContentSizeFlag(false))
            .unwrap();
        let mut frame = Vec::with_capacity(zstd_safe::compress_bound(data.len()));
        cctx.compress2(&mut frame, &data).unwrap();
        assert!(matches!(zstd_safe::get_frame_content_size(&frame), Ok(None)));

        let err = ZstdBackend.decompress(&frame).unwrap_err();
        assert!(matches!(err, CompressError::Decompress { algorithm: "zstd", .. }));
        assert!(err.to_string().contains("content size"));
    }

    #[cfg(feature = "snappy")]
    #[test]
    fn snappy_rejects_implausible_header_length() {
        // Varint header for u32::MAX with no block behind it.
        let err = SnappyBackend
            .decompress(&[0xFF, 0xFF, 0xFF, 0xFF, 0x0F])
            .unwrap_err();
        assert!(matches!(err, CompressError::Decompress { algorithm: "snappy", .. }));
        assert!(err.to_string().contains("4294967295"));
    }

    #[cfg(feature = "snappy")]
    #[test]
    fn snappy_highly_redundant_input_still_decodes() {
        let data = vec![0u8; 1 << 20];
        let compressed = SnappyBackend.compress(&data, 1).unwrap();
        assert_eq!(SnappyBackend.decompress(&compressed).unwrap(), data);
    }
}
