// Bounds-checked cursor over an immutable byte slice.

use super::decoder::DecodeError;

#[derive(Debug, Clone)]
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Bytes consumed so far.
    #[inline]
    pub fn offset(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Consume `len` bytes. The cursor does not move on failure.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        if len > self.remaining() {
            return Err(DecodeError::Truncated {
                offset: self.pos,
                needed: len,
                available: self.remaining(),
            });
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    #[inline]
    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.read_bytes(1)?[0])
    }

    /// Consume exactly `N` bytes into an array.
    #[inline]
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_advance_cursor() {
        let mut r = Reader::new(&[1, 2, 3, 4, 5]);
        assert_eq!(r.read_u8().unwrap(), 1);
        assert_eq!(r.read_array::<2>().unwrap(), [2, 3]);
        assert_eq!(r.offset(), 3);
        assert_eq!(r.remaining(), 2);
        assert_eq!(r.read_bytes(2).unwrap(), &[4, 5]);
        assert!(r.is_empty());
    }

    #[test]
    fn overrun_reports_offset_and_keeps_cursor() {
        let mut r = Reader::new(&[9, 9, 9]);
        r.read_u8().unwrap();
        let err = r.read_array::<4>().unwrap_err();
        assert!(matches!(
            err,
            DecodeError::Truncated {
                offset: 1,
                needed: 4,
                available: 2
            }
        ));
        assert_eq!(r.offset(), 1);
        assert_eq!(r.read_bytes(2).unwrap(), &[9, 9]);
    }

    #[test]
    fn empty_reader() {
        let mut r = Reader::new(&[]);
        assert!(r.is_empty());
        assert!(r.read_u8().is_err());
        assert_eq!(r.read_bytes(0).unwrap(), &[] as &[u8]);
    }
}
