// Compression algorithm selection.
//
// Names are matched case-insensitively. "none" and "no" both select the
// passthrough backend. Built-in algorithms whose cargo feature is disabled
// still parse, but asking for their backend fails with `Unsupported`.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use super::backend::{CompressBackend, CompressError, NoCompression};

#[cfg(feature = "snappy")]
use super::backend::SnappyBackend;
#[cfg(feature = "zlib")]
use super::backend::ZlibBackend;
#[cfg(feature = "zstd")]
use super::backend::ZstdBackend;

/// Names accepted by `Algorithm::from_str`, canonical spelling first.
pub const ALGORITHM_NAMES: &[&str] = &["none", "snappy", "zlib", "zstd"];

/// The compression applied to a whole encoded stream.
#[derive(Clone, Default)]
pub enum Algorithm {
    /// Raw wire format.
    None,
    /// Snappy raw block. Ignores the level.
    #[default]
    Snappy,
    /// Zlib, levels 1-9.
    Zlib,
    /// Zstandard, levels from the linked library's range.
    Zstd,
    /// A caller-provided backend.
    Custom(Arc<dyn CompressBackend>),
}

impl Algorithm {
    /// Canonical lowercase name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Snappy => "snappy",
            Self::Zlib => "zlib",
            Self::Zstd => "zstd",
            Self::Custom(b) => b.name(),
        }
    }

    /// Return the backend implementation.
    pub fn backend(&self) -> Result<Box<dyn CompressBackend>, CompressError> {
        match self {
            Self::None => Ok(Box::new(NoCompression)),

            #[cfg(feature = "snappy")]
            Self::Snappy => Ok(Box::new(SnappyBackend)),
            #[cfg(not(feature = "snappy"))]
            Self::Snappy => Err(CompressError::Unsupported {
                algorithm: "snappy",
                feature: "snappy",
            }),

            #[cfg(feature = "zlib")]
            Self::Zlib => Ok(Box::new(ZlibBackend)),
            #[cfg(not(feature = "zlib"))]
            Self::Zlib => Err(CompressError::Unsupported {
                algorithm: "zlib",
                feature: "zlib",
            }),

            #[cfg(feature = "zstd")]
            Self::Zstd => Ok(Box::new(ZstdBackend)),
            #[cfg(not(feature = "zstd"))]
            Self::Zstd => Err(CompressError::Unsupported {
                algorithm: "zstd",
                feature: "zstd",
            }),

            Self::Custom(b) => Ok(Box::new(ArcBackend(b.clone()))),
        }
    }

    /// Whether the stream is compressed at all.
    pub fn is_enabled(&self) -> bool {
        !matches!(self, Self::None)
    }

    /// Whether this build can produce a backend for the algorithm.
    pub fn is_available(&self) -> bool {
        self.backend().is_ok()
    }
}

impl FromStr for Algorithm {
    type Err = CompressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" | "no" => Ok(Self::None),
            "snappy" => Ok(Self::Snappy),
            "zlib" => Ok(Self::Zlib),
            "zstd" => Ok(Self::Zstd),
            _ => Err(CompressError::UnknownAlgorithm(s.to_owned())),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Debug for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::Snappy => write!(f, "Snappy"),
            Self::Zlib => write!(f, "Zlib"),
            Self::Zstd => write!(f, "Zstd"),
            Self::Custom(b) => write!(f, "Custom({})", b.name()),
        }
    }
}

impl PartialEq for Algorithm {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Custom(a), Self::Custom(b)) => Arc::ptr_eq(a, b),
            (Self::None, Self::None)
            | (Self::Snappy, Self::Snappy)
            | (Self::Zlib, Self::Zlib)
            | (Self::Zstd, Self::Zstd) => true,
            _ => false,
        }
    }
}

/// Wrapper to make `Arc<dyn CompressBackend>` implement `CompressBackend`.
struct ArcBackend(Arc<dyn CompressBackend>);

impl CompressBackend for ArcBackend {
    fn name(&self) -> &'static str {
        self.0.name()
    }
    fn level_range(&self) -> Option<std::ops::RangeInclusive<i32>> {
        self.0.level_range()
    }
    fn compress(&self, data: &[u8], level: i32) -> Result<Vec<u8>, CompressError> {
        self.0.compress(data, level)
    }
    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, CompressError> {
        self.0.decompress(data)
    }
    fn check_level(&self, level: i32) -> Result<(), CompressError> {
        self.0.check_level(level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("SNAPPY".parse::<Algorithm>().unwrap(), Algorithm::Snappy);
        assert_eq!("Zlib".parse::<Algorithm>().unwrap(), Algorithm::Zlib);
        assert_eq!("zstd".parse::<Algorithm>().unwrap(), Algorithm::Zstd);
        assert_eq!("none".parse::<Algorithm>().unwrap(), Algorithm::None);
        assert_eq!("NO".parse::<Algorithm>().unwrap(), Algorithm::None);
    }

    #[test]
    fn unknown_name_is_rejected() {
        let err = "lz4".parse::<Algorithm>().unwrap_err();
        assert!(matches!(&err, CompressError::UnknownAlgorithm(name) if name == "lz4"));
        assert_eq!(err.to_string(), "unknown compression type: lz4");
        assert!("".parse::<Algorithm>().is_err());
    }

    #[test]
    fn names_roundtrip_through_display() {
        for name in ALGORITHM_NAMES {
            let algo: Algorithm = name.parse().unwrap();
            assert_eq!(algo.to_string(), *name);
        }
    }

    #[test]
    fn default_is_snappy() {
        assert_eq!(Algorithm::default(), Algorithm::Snappy);
        assert!(Algorithm::default().is_enabled());
        assert!(!Algorithm::None.is_enabled());
        assert!(Algorithm::None.is_available());
    }

    #[cfg(not(feature = "zstd"))]
    #[test]
    fn disabled_backend_is_unsupported() {
        assert!(matches!(
            Algorithm::Zstd.backend(),
            Err(CompressError::Unsupported { algorithm: "zstd", .. })
        ));
    }

    #[test]
    fn custom_backend_forwards() {
        struct Xor;
        impl CompressBackend for Xor {
            fn name(&self) -> &'static str {
                "xor"
            }
            fn level_range(&self) -> Option<std::ops::RangeInclusive<i32>> {
                Some(0..=3)
            }
            fn compress(&self, data: &[u8], _level: i32) -> Result<Vec<u8>, CompressError> {
                Ok(data.iter().map(|b| b ^ 0x5A).collect())
            }
            fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, CompressError> {
                Ok(data.iter().map(|b| b ^ 0x5A).collect())
            }
        }

        let shared: Arc<dyn CompressBackend> = Arc::new(Xor);
        let algo = Algorithm::Custom(shared.clone());
        assert_eq!(algo.name(), "xor");
        assert_eq!(format!("{algo:?}"), "Custom(xor)");
        assert_eq!(algo, Algorithm::Custom(shared));

        let backend = algo.backend().unwrap();
        assert!(backend.check_level(4).is_err());
        let packed = backend.compress(b"abc", 1).unwrap();
        assert_eq!(backend.decompress(&packed).unwrap(), b"abc");
    }
}
