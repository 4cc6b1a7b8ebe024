// Compression adapter around the wire format.
//
// - `backend`   — CompressBackend trait and built-in backends
// - `algorithm` — Algorithm selection by name
// - `pack`      — pack/unpack entry points and PackOptions

pub mod algorithm;
pub mod backend;
pub mod pack;

pub use algorithm::{ALGORITHM_NAMES, Algorithm};
pub use backend::{CompressBackend, CompressError, NoCompression};
pub use pack::{DEFAULT_LEVEL, PackOptions, pack, pack_with, unpack, unpack_with};

#[cfg(feature = "snappy")]
pub use backend::SnappyBackend;
#[cfg(feature = "zlib")]
pub use backend::ZlibBackend;
#[cfg(feature = "zstd")]
pub use backend::ZstdBackend;
