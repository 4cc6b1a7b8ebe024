// Crate-level error.
//
// Each layer reports its own error enum; `Error` lifts them into one failure
// signal and `ErrorKind` names the category independent of the layer.

use std::fmt;

use thiserror::Error;

use crate::compress::CompressError;
use crate::wire::{DecodeError, EncodeError};

/// Any failure of a pack or unpack call.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Compress(#[from] CompressError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    UnsupportedValueKind,
    DepthExceeded,
    StringTooLong,
    CodeCompileFailed,
    CodeEmptyBlob,
    CodeLoadFailed,
    AllocationFailed,
    TruncatedOrInvalidStream,
    UnknownAlgorithm,
    LevelOutOfRange,
    CompressionFailed,
    DecompressionFailed,
    /// The algorithm is known but its backend is not compiled in.
    Unsupported,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UnsupportedValueKind => "unsupported value kind",
            Self::DepthExceeded => "depth exceeded",
            Self::StringTooLong => "string too long",
            Self::CodeCompileFailed => "code compile failed",
            Self::CodeEmptyBlob => "code empty blob",
            Self::CodeLoadFailed => "code load failed",
            Self::AllocationFailed => "allocation failed",
            Self::TruncatedOrInvalidStream => "truncated or invalid stream",
            Self::UnknownAlgorithm => "unknown algorithm",
            Self::LevelOutOfRange => "level out of range",
            Self::CompressionFailed => "compression failed",
            Self::DecompressionFailed => "decompression failed",
            Self::Unsupported => "unsupported",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Encode(e) => match e {
                EncodeError::UnsupportedKind { .. } => ErrorKind::UnsupportedValueKind,
                EncodeError::DepthExceeded { .. } => ErrorKind::DepthExceeded,
                EncodeError::StringTooLong { .. } => ErrorKind::StringTooLong,
                EncodeError::CodeDump(_) => ErrorKind::CodeCompileFailed,
                EncodeError::EmptyCode => ErrorKind::CodeEmptyBlob,
            },
            Self::Decode(e) => match e {
                DecodeError::Truncated { .. } | DecodeError::Invalid { .. } => {
                    ErrorKind::TruncatedOrInvalidStream
                }
                DecodeError::CodeLoad { .. } => ErrorKind::CodeLoadFailed,
            },
            Self::Compress(e) => match e {
                CompressError::UnknownAlgorithm(_) => ErrorKind::UnknownAlgorithm,
                CompressError::LevelOutOfRange { .. } => ErrorKind::LevelOutOfRange,
                CompressError::Compress { .. } => ErrorKind::CompressionFailed,
                CompressError::Decompress { .. } => ErrorKind::DecompressionFailed,
                CompressError::Allocation { .. } => ErrorKind::AllocationFailed,
                CompressError::Unsupported { .. } => ErrorKind::Unsupported,
            },
        }
    }

    /// Stream offset for decode failures.
    pub fn offset(&self) -> Option<usize> {
        match self {
            Self::Decode(e) => Some(e.offset()),
            _ => None,
        }
    }
}
