// Tagged binary wire format.
//
// # Modules
//
// - `tag`     — tag byte layout and integer compaction policy
// - `reader`  — bounds-checked cursor over the input
// - `encoder` — value -> bytes, depth-bounded
// - `decoder` — bytes -> value, strict and fail-fast
//
// The format has no magic number, version or overall length: each value is
// self-delimiting and a stream is simply values written back to back.

pub mod decoder;
pub mod encoder;
pub mod reader;
pub mod tag;

pub use decoder::{DecodeError, Decoder, decode_all, decode_all_with};
pub use encoder::{DEFAULT_MAX_DEPTH, EncodeError, Encoder, encode, encode_with};
pub use reader::Reader;
pub use tag::{IntWidth, Tag, WireType};
