// Whole-stream pack and unpack.
//
// pack:   values -> wire encoder -> backend.compress(level)
// unpack: bytes  -> backend.decompress -> wire decoder -> values
//
// The algorithm and level are validated before any value is encoded.

use std::fmt;
use std::sync::Arc;

use super::algorithm::Algorithm;
use crate::error::Result;
use crate::value::{CodeHooks, OpaqueCode, Value};
use crate::wire::{self, DEFAULT_MAX_DEPTH};

/// Compression level used when the caller gives none.
pub const DEFAULT_LEVEL: i32 = 1;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Configuration for `pack_with` / `unpack_with`.
#[derive(Clone)]
pub struct PackOptions {
    pub algorithm: Algorithm,
    /// Ignored by backends without a level range.
    pub level: i32,
    /// Maximum table/code nesting, on both encode and decode.
    pub max_depth: usize,
    pub hooks: Arc<dyn CodeHooks>,
}

impl Default for PackOptions {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::default(),
            level: DEFAULT_LEVEL,
            max_depth: DEFAULT_MAX_DEPTH,
            hooks: Arc::new(OpaqueCode),
        }
    }
}

impl fmt::Debug for PackOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PackOptions")
            .field("algorithm", &self.algorithm)
            .field("level", &self.level)
            .field("max_depth", &self.max_depth)
            .finish_non_exhaustive()
    }
}

impl PackOptions {
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn with_level(mut self, level: i32) -> Self {
        self.level = level;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn CodeHooks>) -> Self {
        self.hooks = hooks;
        self
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Encode `values` and compress the stream.
///
/// ```
/// use lbin::compress::{pack, unpack, Algorithm};
/// use lbin::Value;
///
/// let values = [Value::from("hello"), Value::Integer(42)];
/// let packed = pack(&values, Algorithm::None, 1).unwrap();
/// assert_eq!(unpack(&packed, Algorithm::None).unwrap(), values);
/// ```
pub fn pack(values: &[Value], algorithm: Algorithm, level: i32) -> Result<Vec<u8>> {
    pack_with(
        values,
        &PackOptions::default()
            .with_algorithm(algorithm)
            .with_level(level),
    )
}

/// Decompress `data` and decode every value in it.
pub fn unpack(data: &[u8], algorithm: Algorithm) -> Result<Vec<Value>> {
    unpack_with(data, &PackOptions::default().with_algorithm(algorithm))
}

pub fn pack_with(values: &[Value], opts: &PackOptions) -> Result<Vec<u8>> {
    let backend = opts.algorithm.backend()?;
    backend.check_level(opts.level)?;
    if backend.level_range().is_none() && opts.level != DEFAULT_LEVEL {
        log::debug!(
            "{} ignores the compression level ({})",
            backend.name(),
            opts.level
        );
    }

    let encoded = wire::encode_with(values, opts.hooks.as_ref(), opts.max_depth)?;
    let packed = backend.compress(&encoded, opts.level)?;
    log::debug!(
        "packed {} values: {} bytes encoded, {} bytes with {} level {}",
        values.len(),
        encoded.len(),
        packed.len(),
        backend.name(),
        opts.level
    );
    Ok(packed)
}

pub fn unpack_with(data: &[u8], opts: &PackOptions) -> Result<Vec<Value>> {
    let backend = opts.algorithm.backend()?;
    let raw = backend.decompress(data)?;
    let values = wire::decode_all_with(&raw, opts.hooks.as_ref(), opts.max_depth)?;
    log::debug!(
        "unpacked {} values: {} bytes with {}, {} bytes decoded",
        values.len(),
        data.len(),
        backend.name(),
        raw.len()
    );
    Ok(values)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
