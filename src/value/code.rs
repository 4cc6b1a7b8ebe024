// Executable chunks and the hooks that move them across the wire.
//
// The codec never looks inside a chunk. On encode it asks the host to dump
// the chunk to bytes; on decode it hands the bytes back to the host's loader.

use std::borrow::Cow;
use std::fmt;

use thiserror::Error;

/// An opaque executable chunk.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Code {
    chunk: Vec<u8>,
}

impl Code {
    pub fn new(chunk: impl Into<Vec<u8>>) -> Self {
        Self {
            chunk: chunk.into(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.chunk
    }

    pub fn len(&self) -> usize {
        self.chunk.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunk.is_empty()
    }
}

impl fmt::Debug for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Code({} bytes)", self.chunk.len())
    }
}

/// Failure reported by a host hook.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct HookError {
    message: String,
}

impl HookError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Host compile/load hooks for `Value::Code`.
///
/// # Implementing custom hooks
///
/// ```
/// use std::borrow::Cow;
/// use lbin::value::{Code, CodeHooks, HookError};
///
/// /// Refuses chunks that do not start with a signature.
/// struct Signed;
///
/// impl CodeHooks for Signed {
///     fn dump<'c>(&self, code: &'c Code) -> Result<Cow<'c, [u8]>, HookError> {
///         Ok(Cow::Borrowed(code.as_bytes()))
///     }
///     fn load(&self, chunk: &[u8]) -> Result<Code, HookError> {
///         if chunk.starts_with(b"\x1bLua") {
///             Ok(Code::new(chunk))
///         } else {
///             Err(HookError::new("not a precompiled chunk"))
///         }
///     }
/// }
/// ```
pub trait CodeHooks: Send + Sync {
    /// Serialize a chunk. An empty result is rejected by the encoder.
    fn dump<'c>(&self, code: &'c Code) -> Result<Cow<'c, [u8]>, HookError>;

    /// Materialize a chunk from bytes read off the wire.
    fn load(&self, chunk: &[u8]) -> Result<Code, HookError>;
}

/// Default hooks: chunks are plain byte blobs, passed through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpaqueCode;

impl CodeHooks for OpaqueCode {
    fn dump<'c>(&self, code: &'c Code) -> Result<Cow<'c, [u8]>, HookError> {
        Ok(Cow::Borrowed(code.as_bytes()))
    }

    fn load(&self, chunk: &[u8]) -> Result<Code, HookError> {
        Ok(Code::new(chunk))
    }
}
