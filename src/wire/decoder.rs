// Value decoder.
//
// Strict, fail-fast inverse of the encoder. Any overrun, unknown type or
// cookie that is not valid for its type aborts with the cursor offset where
// the problem was detected; there is no resynchronization.
//
// Nesting is bounded the same way as on encode so that hostile input
// cannot exhaust the call stack.

use thiserror::Error;

use crate::value::{CodeHooks, HookError, OpaqueCode, Table, TableError, Value};

use super::encoder::DEFAULT_MAX_DEPTH;
use super::reader::Reader;
use super::tag::{
    CODE_EXTENDED, IntWidth, LONG_STRING_DWORD, LONG_STRING_WORD, NUMBER_REAL, TABLE_EXTENDED, Tag,
    WireType,
};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum DecodeError {
    /// A read ran past the end of the input.
    #[error("invalid serialize stream at offset {offset}: need {needed} bytes, {available} left")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },
    /// Structurally invalid unit.
    #[error("invalid serialize stream at offset {offset}: {reason}")]
    Invalid { offset: usize, reason: &'static str },
    /// The load hook rejected a code chunk.
    #[error("function load failed at offset {offset}: {source}")]
    CodeLoad {
        offset: usize,
        #[source]
        source: HookError,
    },
}

impl DecodeError {
    /// Stream offset at which decoding stopped.
    pub fn offset(&self) -> usize {
        match *self {
            Self::Truncated { offset, .. }
            | Self::Invalid { offset, .. }
            | Self::CodeLoad { offset, .. } => offset,
        }
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// Reads values from an encoded stream.
///
/// # Example
/// ```
/// use lbin::value::{OpaqueCode, Value};
/// use lbin::wire::Decoder;
///
/// let mut dec = Decoder::new(&[0x12, 0x01, 0x2C, 0x14, b'h', b'i'], &OpaqueCode);
/// assert_eq!(dec.decode_one().unwrap(), Value::Integer(300));
/// assert_eq!(dec.decode_one().unwrap(), Value::from("hi"));
/// assert!(dec.is_empty());
/// ```
pub struct Decoder<'a, 'h> {
    reader: Reader<'a>,
    hooks: &'h dyn CodeHooks,
    max_depth: usize,
}

impl<'a, 'h> Decoder<'a, 'h> {
    pub fn new(data: &'a [u8], hooks: &'h dyn CodeHooks) -> Self {
        Self {
            reader: Reader::new(data),
            hooks,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Override the nesting limit.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn offset(&self) -> usize {
        self.reader.offset()
    }

    /// True once every byte has been consumed.
    pub fn is_empty(&self) -> bool {
        self.reader.is_empty()
    }

    /// Decode the next top-level value.
    pub fn decode_one(&mut self) -> Result<Value, DecodeError> {
        self.decode_at(0)
    }

    /// Decode values until the input is exhausted.
    pub fn decode_all(mut self) -> Result<Vec<Value>, DecodeError> {
        let mut values = Vec::new();
        while !self.is_empty() {
            values.push(self.decode_one()?);
        }
        Ok(values)
    }

    fn invalid(&self, reason: &'static str) -> DecodeError {
        DecodeError::Invalid {
            offset: self.reader.offset(),
            reason,
        }
    }

    fn enter(&self, depth: usize) -> Result<usize, DecodeError> {
        let depth = depth + 1;
        if depth > self.max_depth {
            return Err(self.invalid("nesting too deep"));
        }
        Ok(depth)
    }

    fn decode_at(&mut self, depth: usize) -> Result<Value, DecodeError> {
        let tag = Tag::from_byte(self.reader.read_u8()?);
        log::trace!(
            "tag {:?} cookie {} at offset {}",
            tag.ty,
            tag.cookie,
            self.reader.offset() - 1
        );
        match tag.ty {
            WireType::Nil => match tag.cookie {
                0 => Ok(Value::Nil),
                _ => Err(self.invalid("nil tag with non-zero cookie")),
            },
            WireType::Boolean => match tag.cookie {
                0 => Ok(Value::Boolean(false)),
                1 => Ok(Value::Boolean(true)),
                _ => Err(self.invalid("boolean cookie out of range")),
            },
            WireType::Number if tag.cookie == NUMBER_REAL => {
                let bits = u64::from_be_bytes(self.reader.read_array()?);
                Ok(Value::Real(f64::from_bits(bits)))
            }
            WireType::Number => self.read_integer(tag.cookie).map(Value::Integer),
            WireType::Userdata => Err(self.invalid("userdata cannot be deserialized")),
            WireType::ShortString => self.read_string(usize::from(tag.cookie)),
            WireType::LongString => {
                let len = match tag.cookie {
                    LONG_STRING_WORD => usize::from(u16::from_be_bytes(self.reader.read_array()?)),
                    LONG_STRING_DWORD => {
                        u32::from_be_bytes(self.reader.read_array()?) as usize
                    }
                    _ => return Err(self.invalid("long string cookie must be 2 or 4")),
                };
                self.read_string(len)
            }
            WireType::Table => {
                let depth = self.enter(depth)?;
                self.decode_table(tag.cookie, depth).map(Value::Table)
            }
            WireType::Code => {
                self.enter(depth)?;
                self.decode_code(tag.cookie)
            }
        }
    }

    /// Integer payload for a Number cookie.
    fn read_integer(&mut self, cookie: u8) -> Result<i64, DecodeError> {
        let Some(width) = IntWidth::from_cookie(cookie) else {
            return Err(self.invalid("invalid number cookie"));
        };
        let value = match width {
            IntWidth::Zero => 0,
            IntWidth::Byte => i64::from(self.reader.read_u8()?),
            IntWidth::Word => i64::from(u16::from_be_bytes(self.reader.read_array()?)),
            IntWidth::Dword => i64::from(i32::from_be_bytes(self.reader.read_array()?)),
            IntWidth::Qword => i64::from_be_bytes(self.reader.read_array()?),
        };
        Ok(value)
    }

    /// Extended length: a full Number unit holding a non-negative integer.
    fn read_length(&mut self) -> Result<usize, DecodeError> {
        let tag = Tag::from_byte(self.reader.read_u8()?);
        if tag.ty != WireType::Number || tag.cookie == NUMBER_REAL {
            return Err(self.invalid("extended length must be an integer"));
        }
        let len = self.read_integer(tag.cookie)?;
        usize::try_from(len).map_err(|_| self.invalid("negative length"))
    }

    fn read_string(&mut self, len: usize) -> Result<Value, DecodeError> {
        Ok(Value::String(self.reader.read_bytes(len)?.to_vec()))
    }

    fn decode_table(&mut self, cookie: u8, depth: usize) -> Result<Table, DecodeError> {
        let array_len = if cookie == TABLE_EXTENDED {
            self.read_length()?
        } else {
            usize::from(cookie)
        };

        // Every element takes at least one byte.
        let mut table = Table::with_capacity(array_len.min(self.reader.remaining()), 0);
        for index in 1..=array_len {
            let value = self.decode_at(depth)?;
            self.store(&mut table, Value::Integer(index as i64), value)?;
        }

        loop {
            let key = self.decode_at(depth)?;
            if key.is_nil() {
                return Ok(table);
            }
            let value = self.decode_at(depth)?;
            self.store(&mut table, key, value)?;
        }
    }

    fn store(&self, table: &mut Table, key: Value, value: Value) -> Result<(), DecodeError> {
        table.insert(key, value).map_err(|e| match e {
            TableError::NanKey => self.invalid("table index is NaN"),
            TableError::NilKey => self.invalid("table index is nil"),
        })?;
        Ok(())
    }

    fn decode_code(&mut self, cookie: u8) -> Result<Value, DecodeError> {
        let len = if cookie == CODE_EXTENDED {
            self.read_length()?
        } else {
            usize::from(cookie)
        };
        if len == 0 {
            return Err(self.invalid("empty code chunk"));
        }
        let start = self.reader.offset();
        let chunk = self.reader.read_bytes(len)?;
        self.hooks
            .load(chunk)
            .map(Value::Code)
            .map_err(|source| DecodeError::CodeLoad {
                offset: start,
                source,
            })
    }
}

// ---------------------------------------------------------------------------
// One-shot helpers
// ---------------------------------------------------------------------------

/// Decode every value in `data` with the default hooks and depth limit.
pub fn decode_all(data: &[u8]) -> Result<Vec<Value>, DecodeError> {
    decode_all_with(data, &OpaqueCode, DEFAULT_MAX_DEPTH)
}

/// Decode every value in `data`.
pub fn decode_all_with(
    data: &[u8],
    hooks: &dyn CodeHooks,
    max_depth: usize,
) -> Result<Vec<Value>, DecodeError> {
    let values = Decoder::new(data, hooks)
        .with_max_depth(max_depth)
        .decode_all()?;
    log::trace!("decoded {} values from {} bytes", values.len(), data.len());
    Ok(values)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
