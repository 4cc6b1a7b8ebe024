// Tag byte layout and numeric compaction.
//
// Every encoded unit starts with one tag byte:
//
//     bit  7 6 5 4 3 | 2 1 0
//          cookie    | type
//
// The cookie is a length, a width selector or a boolean depending on the
// type. Multi-byte payloads are big-endian.

/// Wire type in the low three bits of a tag byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WireType {
    Nil = 0,
    Boolean = 1,
    Number = 2,
    /// Reserved for host userdata; never produced by the encoder.
    Userdata = 3,
    ShortString = 4,
    LongString = 5,
    Table = 6,
    Code = 7,
}

impl WireType {
    /// Decode the low three bits of a tag byte. Every bit pattern is a type.
    pub const fn from_bits(bits: u8) -> Self {
        match bits & TYPE_MASK {
            0 => Self::Nil,
            1 => Self::Boolean,
            2 => Self::Number,
            3 => Self::Userdata,
            4 => Self::ShortString,
            5 => Self::LongString,
            6 => Self::Table,
            _ => Self::Code,
        }
    }
}

const TYPE_MASK: u8 = 0x07;
const COOKIE_SHIFT: u32 = 3;

/// Number of distinct cookie values (5 bits).
pub const MAX_COOKIE: u8 = 32;

/// Table and code lengths below this fit in the cookie.
pub const INLINE_LEN_LIMIT: u8 = MAX_COOKIE - 1;

/// Table cookie announcing an extended array length.
pub const TABLE_EXTENDED: u8 = MAX_COOKIE - 1;
/// Code cookie announcing an extended chunk length.
pub const CODE_EXTENDED: u8 = 0;

/// Long string cookie: 2-byte length field.
pub const LONG_STRING_WORD: u8 = 2;
/// Long string cookie: 4-byte length field.
pub const LONG_STRING_DWORD: u8 = 4;

/// Number cookie for an IEEE-754 double payload.
pub const NUMBER_REAL: u8 = 8;

/// A decoded tag byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tag {
    pub ty: WireType,
    pub cookie: u8,
}

impl Tag {
    /// Build a tag. `cookie` must be below `MAX_COOKIE`.
    #[inline]
    pub const fn new(ty: WireType, cookie: u8) -> Self {
        debug_assert!(cookie < MAX_COOKIE);
        Self { ty, cookie }
    }

    #[inline]
    pub const fn from_byte(byte: u8) -> Self {
        Self {
            ty: WireType::from_bits(byte),
            cookie: byte >> COOKIE_SHIFT,
        }
    }

    #[inline]
    pub const fn to_byte(self) -> u8 {
        self.ty as u8 | (self.cookie << COOKIE_SHIFT)
    }
}

/// Integer payload width chosen by the compaction policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntWidth {
    /// Value is zero; no payload.
    Zero,
    /// Unsigned 8-bit.
    Byte,
    /// Unsigned 16-bit.
    Word,
    /// 32-bit; signed for negatives, unsigned magnitude otherwise.
    Dword,
    /// Signed 64-bit.
    Qword,
}

impl IntWidth {
    /// Smallest width that represents `v` exactly.
    ///
    /// Negative values that fit in 32 bits always take the 4-byte form.
    pub const fn for_value(v: i64) -> Self {
        if v == 0 {
            Self::Zero
        } else if v != v as i32 as i64 {
            Self::Qword
        } else if v < 0 {
            Self::Dword
        } else if v < 0x100 {
            Self::Byte
        } else if v < 0x1_0000 {
            Self::Word
        } else {
            Self::Dword
        }
    }

    pub const fn cookie(self) -> u8 {
        match self {
            Self::Zero => 0,
            Self::Byte => 1,
            Self::Word => 2,
            Self::Dword => 4,
            Self::Qword => 6,
        }
    }

    /// Width for an integer number cookie. `NUMBER_REAL` and unassigned
    /// cookies return `None`.
    pub const fn from_cookie(cookie: u8) -> Option<Self> {
        match cookie {
            0 => Some(Self::Zero),
            1 => Some(Self::Byte),
            2 => Some(Self::Word),
            4 => Some(Self::Dword),
            6 => Some(Self::Qword),
            _ => None,
        }
    }
}

/// Append a Number-tagged integer using the compaction policy.
pub fn put_integer(buf: &mut Vec<u8>, v: i64) {
    let width = IntWidth::for_value(v);
    buf.push(Tag::new(WireType::Number, width.cookie()).to_byte());
    match width {
        IntWidth::Zero => {}
        IntWidth::Byte => buf.push(v as u8),
        IntWidth::Word => buf.extend_from_slice(&(v as u16).to_be_bytes()),
        // Same bits whether read back as i32 or u32: positive values here
        // are below 2^31.
        IntWidth::Dword => buf.extend_from_slice(&(v as i32).to_be_bytes()),
        IntWidth::Qword => buf.extend_from_slice(&v.to_be_bytes()),
    }
}

/// Append a Number-tagged double.
pub fn put_real(buf: &mut Vec<u8>, v: f64) {
    buf.push(Tag::new(WireType::Number, NUMBER_REAL).to_byte());
    buf.extend_from_slice(&v.to_bits().to_be_bytes());
}
