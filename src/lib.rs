//! lbin: compact tagged binary serialization for dynamic values.
//!
//! The crate provides:
//! - A dynamic value model with hybrid array/map tables (`value`)
//! - The tagged wire format encoder and decoder (`wire`)
//! - Whole-stream compression with snappy, zlib or zstd (`compress`)
//! - Host-style entry points with trailing-argument resolution (`binding`)
//! - An optional CLI (`cli` feature)
//!
//! # Quick Start
//!
//! ```
//! use lbin::compress::{self, Algorithm};
//! use lbin::value::{Table, Value};
//!
//! let mut player = Table::new();
//! player.insert("name", "ada").unwrap();
//! player.insert("level", 12).unwrap();
//!
//! let values = [Value::Table(player), Value::Boolean(true)];
//! let packed = compress::pack(&values, Algorithm::None, 1).unwrap();
//! let unpacked = compress::unpack(&packed, Algorithm::None).unwrap();
//! assert_eq!(unpacked, values);
//! ```

pub mod binding;
pub mod compress;
pub mod error;
pub mod value;
pub mod wire;

#[cfg(feature = "cli")]
pub mod cli;

pub use binding::{from_binary, to_binary};
pub use compress::{Algorithm, PackOptions, pack, unpack};
pub use error::{Error, ErrorKind, Result};
pub use value::{Table, Value};
