//! Endian-aware reader over an immutable byte buffer.
//!
//! Chunks in this format mix little-endian header words with big-endian table
//! and vertex data, so every read names its byte order explicitly.

use winnow::Parser;
use winnow::binary;
use winnow::error::{ContextError, ErrMode};

pub use winnow::binary::Endianness as Endian;

use crate::error::{DecodeError, DecodeResult};

/// Sequential and random-access reader. Reads past the end fail with
/// [`DecodeError::OutOfBounds`]; nothing is clamped.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Create a cursor already positioned at `pos`.
    pub fn at(data: &'a [u8], pos: usize) -> DecodeResult<Self> {
        let mut cursor = Self::new(data);
        cursor.seek(pos)?;
        Ok(cursor)
    }

    pub fn tell(&self) -> usize {
        self.pos
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Move to an absolute position. Seeking to exactly the end is allowed.
    pub fn seek(&mut self, pos: usize) -> DecodeResult<()> {
        if pos > self.data.len() {
            return Err(self.out_of_bounds(pos, 0));
        }
        self.pos = pos;
        Ok(())
    }

    pub fn seek_relative(&mut self, delta: i64) -> DecodeResult<()> {
        let target = i64::try_from(self.pos)
            .ok()
            .and_then(|pos| pos.checked_add(delta))
            .and_then(|pos| usize::try_from(pos).ok())
            .ok_or_else(|| self.out_of_bounds(self.pos, delta.unsigned_abs() as usize))?;
        self.seek(target)
    }

    /// Advance by `count` bytes.
    pub fn skip(&mut self, count: usize) -> DecodeResult<()> {
        let target = self
            .pos
            .checked_add(count)
            .ok_or_else(|| self.out_of_bounds(self.pos, count))?;
        self.seek(target)
    }

    pub fn read_bytes(&mut self, n: usize) -> DecodeResult<&'a [u8]> {
        let bytes = self.peek(n)?;
        self.pos += n;
        Ok(bytes)
    }

    pub fn read_u16(&mut self, endian: Endian) -> DecodeResult<u16> {
        self.read_with(2, binary::u16(endian))
    }

    pub fn read_u32(&mut self, endian: Endian) -> DecodeResult<u32> {
        self.read_with(4, binary::u32(endian))
    }

    pub fn read_i32(&mut self, endian: Endian) -> DecodeResult<i32> {
        self.read_with(4, binary::i32(endian))
    }

    pub fn read_f32(&mut self, endian: Endian) -> DecodeResult<f32> {
        self.read_with(4, binary::f32(endian))
    }

    fn peek(&self, n: usize) -> DecodeResult<&'a [u8]> {
        self.pos
            .checked_add(n)
            .and_then(|end| self.data.get(self.pos..end))
            .ok_or_else(|| self.out_of_bounds(self.pos, n))
    }

    fn read_with<T, P>(&mut self, width: usize, mut parser: P) -> DecodeResult<T>
    where
        P: Parser<&'a [u8], T, ErrMode<ContextError>>,
    {
        let mut input = self.peek(width)?;
        let value = parser
            .parse_next(&mut input)
            .map_err(|_| self.out_of_bounds(self.pos, width))?;
        self.pos += width;
        Ok(value)
    }

    fn out_of_bounds(&self, offset: usize, len: usize) -> DecodeError {
        DecodeError::OutOfBounds {
            offset,
            len,
            available: self.data.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_mixed_endianness() {
        let data = [
            0x01, 0x00, 0x00, 0x00, // u32 LE = 1
            0x00, 0x00, 0x00, 0x02, // u32 BE = 2
            0xFF, 0xFF, // u16 = 65535
            0x3F, 0x80, 0x00, 0x00, // f32 BE = 1.0
            0xFF, 0xFF, 0xFF, 0xFE, // i32 BE = -2
        ];
        let mut cursor = ByteCursor::new(&data);
        assert_eq!(cursor.read_u32(Endian::Little).unwrap(), 1);
        assert_eq!(cursor.read_u32(Endian::Big).unwrap(), 2);
        assert_eq!(cursor.read_u16(Endian::Big).unwrap(), 0xFFFF);
        assert_eq!(cursor.read_f32(Endian::Big).unwrap(), 1.0);
        assert_eq!(cursor.read_i32(Endian::Big).unwrap(), -2);
        assert_eq!(cursor.tell(), data.len());
    }

    #[test]
    fn overrun_fails_without_moving() {
        let data = [0u8; 6];
        let mut cursor = ByteCursor::at(&data, 4).unwrap();
        assert_eq!(
            cursor.read_u32(Endian::Big),
            Err(DecodeError::OutOfBounds {
                offset: 4,
                len: 4,
                available: 6
            })
        );
        assert_eq!(cursor.tell(), 4);
        assert_eq!(cursor.read_bytes(2).unwrap(), &[0, 0]);
    }

    #[test]
    fn seeking() {
        let data = [0u8; 16];
        let mut cursor = ByteCursor::new(&data);
        cursor.seek(8).unwrap();
        cursor.seek_relative(-4).unwrap();
        assert_eq!(cursor.tell(), 4);
        cursor.skip(12).unwrap();
        assert_eq!(cursor.tell(), 16);
        assert!(cursor.seek(17).is_err());
        assert!(cursor.seek_relative(-17).is_err());
        assert!(ByteCursor::at(&data, 32).is_err());
    }
}
