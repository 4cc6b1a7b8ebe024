// Value encoder.
//
// Walks each value depth-first and appends tagged units to an owned buffer.
// Tables and code chunks each add one nesting level; going past `max_depth`
// aborts the value. The depth limit is the only guard against runaway
// recursion, since value graphs are walked as trees.

use thiserror::Error;

use crate::value::{Code, CodeHooks, HookError, OpaqueCode, Table, Value};

use super::tag::{
    self, CODE_EXTENDED, INLINE_LEN_LIMIT, LONG_STRING_DWORD, LONG_STRING_WORD, MAX_COOKIE,
    TABLE_EXTENDED, Tag, WireType,
};

/// Default nesting limit for tables and code chunks.
pub const DEFAULT_MAX_DEPTH: usize = 32;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum EncodeError {
    /// The value kind has no wire representation.
    #[error("unsupported type `{kind}` to serialize")]
    UnsupportedKind { kind: &'static str },
    /// Tables or code nested deeper than the configured limit.
    #[error("cannot serialize value nested deeper than {max} levels")]
    DepthExceeded { max: usize },
    /// String longer than a 32-bit length field can express.
    #[error("string of {len} bytes exceeds the maximum encodable length")]
    StringTooLong { len: usize },
    /// The dump hook refused the chunk.
    #[error("function dump failed: {0}")]
    CodeDump(#[source] HookError),
    /// The dump hook returned no bytes.
    #[error("function dump produced an empty chunk")]
    EmptyCode,
}

// ---------------------------------------------------------------------------
// Encoder
// ---------------------------------------------------------------------------

/// Appends encoded values to an owned buffer.
///
/// # Example
/// ```
/// use lbin::value::{OpaqueCode, Value};
/// use lbin::wire::Encoder;
///
/// let mut enc = Encoder::new(&OpaqueCode);
/// enc.encode(&Value::Integer(300)).unwrap();
/// enc.encode(&Value::from("hi")).unwrap();
/// assert_eq!(enc.finish(), [0x12, 0x01, 0x2C, 0x14, b'h', b'i']);
/// ```
pub struct Encoder<'h> {
    buf: Vec<u8>,
    hooks: &'h dyn CodeHooks,
    max_depth: usize,
}

impl<'h> Encoder<'h> {
    pub fn new(hooks: &'h dyn CodeHooks) -> Self {
        Self {
            buf: Vec::new(),
            hooks,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Override the nesting limit.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Bytes written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Append one top-level value.
    ///
    /// On failure nothing from this value remains in the buffer.
    pub fn encode(&mut self, value: &Value) -> Result<(), EncodeError> {
        let mark = self.buf.len();
        let result = self.encode_at(value, 0);
        if result.is_err() {
            self.buf.truncate(mark);
        }
        result
    }

    /// Consume the encoder, returning the stream.
    pub fn finish(self) -> Vec<u8> {
        self.buf
    }

    fn enter(&self, depth: usize) -> Result<usize, EncodeError> {
        let depth = depth + 1;
        if depth > self.max_depth {
            return Err(EncodeError::DepthExceeded {
                max: self.max_depth,
            });
        }
        Ok(depth)
    }

    fn encode_at(&mut self, value: &Value, depth: usize) -> Result<(), EncodeError> {
        match value {
            Value::Nil => self.put_tag(WireType::Nil, 0),
            Value::Boolean(b) => self.put_tag(WireType::Boolean, u8::from(*b)),
            Value::Integer(i) => tag::put_integer(&mut self.buf, *i),
            Value::Real(f) => tag::put_real(&mut self.buf, *f),
            Value::String(s) => self.put_string(s)?,
            Value::Table(t) => {
                let depth = self.enter(depth)?;
                self.encode_table(t, depth)?;
            }
            Value::Code(c) => {
                self.enter(depth)?;
                self.encode_code(c)?;
            }
            Value::Userdata(_) => {
                return Err(EncodeError::UnsupportedKind {
                    kind: value.type_name(),
                });
            }
        }
        Ok(())
    }

    #[inline]
    fn put_tag(&mut self, ty: WireType, cookie: u8) {
        self.buf.push(Tag::new(ty, cookie).to_byte());
    }

    fn put_string(&mut self, s: &[u8]) -> Result<(), EncodeError> {
        let len = s.len();
        if len < MAX_COOKIE as usize {
            self.put_tag(WireType::ShortString, len as u8);
        } else if let Ok(len) = u16::try_from(len) {
            self.put_tag(WireType::LongString, LONG_STRING_WORD);
            self.buf.extend_from_slice(&len.to_be_bytes());
        } else {
            let len = u32::try_from(len).map_err(|_| EncodeError::StringTooLong { len })?;
            self.put_tag(WireType::LongString, LONG_STRING_DWORD);
            self.buf.extend_from_slice(&len.to_be_bytes());
        }
        self.buf.extend_from_slice(s);
        Ok(())
    }

    /// Array part first, then every other pair, then a nil terminator.
    fn encode_table(&mut self, table: &Table, depth: usize) -> Result<(), EncodeError> {
        let array = table.array();
        if array.len() >= INLINE_LEN_LIMIT as usize {
            self.put_tag(WireType::Table, TABLE_EXTENDED);
            tag::put_integer(&mut self.buf, array.len() as i64);
        } else {
            self.put_tag(WireType::Table, array.len() as u8);
        }
        for item in array {
            self.encode_at(item, depth)?;
        }

        let array_len = array.len() as i64;
        for (key, value) in table.pairs() {
            if matches!(*key, Value::Integer(i) if i > 0 && i <= array_len) {
                continue;
            }
            self.encode_at(key, depth)?;
            self.encode_at(value, depth)?;
        }
        self.put_tag(WireType::Nil, 0);
        Ok(())
    }

    fn encode_code(&mut self, code: &Code) -> Result<(), EncodeError> {
        let chunk = self.hooks.dump(code).map_err(EncodeError::CodeDump)?;
        if chunk.is_empty() {
            return Err(EncodeError::EmptyCode);
        }
        if chunk.len() < INLINE_LEN_LIMIT as usize {
            self.put_tag(WireType::Code, chunk.len() as u8);
        } else {
            self.put_tag(WireType::Code, CODE_EXTENDED);
            tag::put_integer(&mut self.buf, chunk.len() as i64);
        }
        self.buf.extend_from_slice(&chunk);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// One-shot helpers
// ---------------------------------------------------------------------------

/// Encode `values` back to back with the default hooks and depth limit.
pub fn encode(values: &[Value]) -> Result<Vec<u8>, EncodeError> {
    encode_with(values, &OpaqueCode, DEFAULT_MAX_DEPTH)
}

/// Encode `values` back to back.
pub fn encode_with(
    values: &[Value],
    hooks: &dyn CodeHooks,
    max_depth: usize,
) -> Result<Vec<u8>, EncodeError> {
    let mut enc = Encoder::new(hooks).with_max_depth(max_depth);
    for value in values {
        enc.encode(value)?;
    }
    log::trace!("encoded {} values into {} bytes", values.len(), enc.len());
    Ok(enc.finish())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
