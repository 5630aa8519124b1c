//! Positional reader over a borrowed byte buffer.
//!
//! All fixed-width reads are big-endian, matching the cache's wire order.
//! The smart integer encodings inspect the high bit of the next byte to pick
//! a width; their exact boundary behaviour is relied on by every field
//! decoder, so each read documents its bit-level contract.

use std::collections::BTreeMap;

use crate::charset::decode_byte;
use crate::{Error, Result};

/// A value stored in a parameter table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Int(i32),
    Str(String),
}

/// Positional big-endian reader over a byte slice.
#[derive(Debug)]
pub struct Reader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Current read offset.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Bytes left to read.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Take `count` raw bytes.
    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        if count > self.remaining() {
            return Err(Error::OutOfBounds {
                position: self.position,
                length: self.data.len(),
                wanted: count,
            });
        }
        let slice = &self.data[self.position..self.position + count];
        self.position += count;
        Ok(slice)
    }

    /// Advance past `count` bytes without decoding them.
    pub fn skip(&mut self, count: usize) -> Result<()> {
        self.read_bytes(count).map(|_| ())
    }

    fn peek_u8(&self) -> Result<u8> {
        self.data
            .get(self.position)
            .copied()
            .ok_or(Error::OutOfBounds {
                position: self.position,
                length: self.data.len(),
                wanted: 1,
            })
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_u8()? as i8)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let b = self.read_bytes(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(self.read_u16()? as i16)
    }

    pub fn read_u24(&mut self) -> Result<u32> {
        let b = self.read_bytes(3)?;
        Ok(u32::from_be_bytes([0, b[0], b[1], b[2]]))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let b = self.read_bytes(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(self.read_u32()? as i32)
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        let b = self.read_bytes(8)?;
        Ok(u64::from_be_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        Ok(self.read_u64()? as i64)
    }

    /// Read a u16 where `0xFFFF` is a null sentinel mapped to `-1`.
    pub fn read_u16n(&mut self) -> Result<i32> {
        let v = self.read_u16()?;
        Ok(if v == 0xFFFF { -1 } else { i32::from(v) })
    }

    /// Read a 1-or-2 byte unsigned smart.
    ///
    /// High bit of the next byte clear: one byte, value 0..=127. High bit
    /// set: two bytes minus `0x8000`, value 0..=32767.
    pub fn read_unsigned_smart(&mut self) -> Result<u16> {
        if self.peek_u8()? & 0x80 == 0 {
            Ok(u16::from(self.read_u8()?))
        } else {
            Ok(self.read_u16()? - 0x8000)
        }
    }

    /// [`read_unsigned_smart`](Self::read_unsigned_smart) minus one, for
    /// 1-based counts where 0 encodes "none".
    pub fn read_unsigned_smart_minus_one(&mut self) -> Result<i32> {
        Ok(i32::from(self.read_unsigned_smart()?) - 1)
    }

    /// Read a 2-or-4 byte signed smart.
    ///
    /// High bit of the next byte set: four bytes masked to 31 bits
    /// (`& 0x7FFF_FFFF`). Clear: [`read_u16n`](Self::read_u16n) semantics,
    /// so `0xFFFF` maps to `-1`.
    pub fn read_big_smart(&mut self) -> Result<i32> {
        if self.peek_u8()? & 0x80 != 0 {
            Ok(self.read_i32()? & 0x7FFF_FFFF)
        } else {
            self.read_u16n()
        }
    }

    /// Read a 2-or-4 byte smart with inverted polarity.
    ///
    /// High bit of the next byte set: two bytes, unsigned. Clear: four bytes
    /// masked to 31 bits.
    pub fn read_big_smart2(&mut self) -> Result<i32> {
        if self.peek_u8()? & 0x80 != 0 {
            Ok(i32::from(self.read_u16()?))
        } else {
            Ok(self.read_i32()? & 0x7FFF_FFFF)
        }
    }

    /// Read a little-endian base-128 varint: 7 data bits per byte,
    /// continuation while the high bit is set. Five bytes cover all 32-bit
    /// values; a longer encoding is rejected.
    pub fn read_varint_le(&mut self) -> Result<u32> {
        let mut value = 0u32;
        for shift in 0..5u32 {
            let byte = self.read_u8()?;
            value |= u32::from(byte & 0x7F) << (shift * 7);
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(Error::VarIntTooLong)
    }

    /// Read a zero-terminated string through the client character table.
    pub fn read_string(&mut self) -> Result<String> {
        let mut out = String::new();
        loop {
            let byte = self.read_u8()?;
            if byte == 0 {
                return Ok(out);
            }
            out.push(decode_byte(byte));
        }
    }

    /// Read a version-prefixed string: a single mandatory zero byte, then a
    /// zero-terminated string.
    pub fn read_versioned_string(&mut self) -> Result<String> {
        let version = self.read_u8()?;
        if version != 0 {
            return Err(Error::InvalidStringVersion(version));
        }
        self.read_string()
    }

    /// Read a parameter table: 1-byte count, then per entry a 1-byte type
    /// tag (0 = i32, 1 = string), a 3-byte key, and the value.
    pub fn read_params(&mut self) -> Result<BTreeMap<u32, ParamValue>> {
        let count = self.read_u8()?;
        let mut params = BTreeMap::new();
        for _ in 0..count {
            let tag = self.read_u8()?;
            let key = self.read_u24()?;
            let value = match tag {
                0 => ParamValue::Int(self.read_i32()?),
                1 => ParamValue::Str(self.read_string()?),
                other => return Err(Error::UnknownParamType(other)),
            };
            params.insert(key, value);
        }
        Ok(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn fixed_width_reads() {
        let data = [
            0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC, 0xDE, 0xF0, 0x01, 0x02, 0x03,
        ];
        let mut r = Reader::new(&data);
        assert_eq!(r.read_u8().unwrap(), 0x12);
        assert_eq!(r.read_u16().unwrap(), 0x3456);
        assert_eq!(r.read_u24().unwrap(), 0x789ABC);
        assert_eq!(r.read_i32().unwrap(), i32::from_be_bytes([0xDE, 0xF0, 0x01, 0x02]));
        assert_eq!(r.remaining(), 1);
        assert!(r.read_u16().is_err());
    }

    #[test]
    fn out_of_bounds_reports_position() {
        let mut r = Reader::new(&[0x01]);
        r.read_u8().unwrap();
        match r.read_u32() {
            Err(Error::OutOfBounds {
                position,
                length,
                wanted,
            }) => {
                assert_eq!(position, 1);
                assert_eq!(length, 1);
                assert_eq!(wanted, 4);
            }
            other => panic!("expected OutOfBounds, got {other:?}"),
        }
    }

    #[test]
    fn u16n_sentinel() {
        let mut r = Reader::new(&[0xFF, 0xFF, 0x00, 0x2A]);
        assert_eq!(r.read_u16n().unwrap(), -1);
        assert_eq!(r.read_u16n().unwrap(), 42);
    }

    #[test]
    fn unsigned_smart_boundaries() {
        // 0, 127 as one byte; 128, 32767 as two bytes biased by 0x8000.
        let data = [0x00, 0x7F, 0x80, 0x80, 0xFF, 0xFF];
        let mut r = Reader::new(&data);
        assert_eq!(r.read_unsigned_smart().unwrap(), 0);
        assert_eq!(r.read_unsigned_smart().unwrap(), 127);
        assert_eq!(r.read_unsigned_smart().unwrap(), 128);
        assert_eq!(r.read_unsigned_smart().unwrap(), 32767);
    }

    #[test]
    fn unsigned_smart_minus_one() {
        let mut r = Reader::new(&[0x00, 0x80, 0x80]);
        assert_eq!(r.read_unsigned_smart_minus_one().unwrap(), -1);
        assert_eq!(r.read_unsigned_smart_minus_one().unwrap(), 127);
    }

    #[test]
    fn big_smart_boundaries() {
        // High bit clear: u16n semantics (including the -1 sentinel).
        let mut r = Reader::new(&[0x00, 0x00, 0x7F, 0xFF, 0xFF, 0xFF]);
        assert_eq!(r.read_big_smart().unwrap(), 0);
        assert_eq!(r.read_big_smart().unwrap(), 32767);
        assert_eq!(r.read_big_smart().unwrap(), -1);

        // High bit set: four bytes, sign bit masked off.
        let mut r = Reader::new(&[0x80, 0x00, 0x80, 0x00, 0xFF, 0xFF, 0xFF, 0xFF]);
        assert_eq!(r.read_big_smart().unwrap(), 0x8000);
        assert_eq!(r.read_big_smart().unwrap(), 0x7FFF_FFFF);
    }

    #[test]
    fn big_smart2_inverted_polarity() {
        // High bit set: two bytes, unsigned.
        let mut r = Reader::new(&[0x80, 0x00, 0xFF, 0xFF]);
        assert_eq!(r.read_big_smart2().unwrap(), 0x8000);
        assert_eq!(r.read_big_smart2().unwrap(), 0xFFFF);

        // High bit clear: four bytes, masked.
        let mut r = Reader::new(&[0x00, 0x01, 0x00, 0x00]);
        assert_eq!(r.read_big_smart2().unwrap(), 0x0001_0000);
    }

    #[test]
    fn varint_le() {
        let mut r = Reader::new(&[0x08, 0x96, 0x01, 0xFF, 0xFF, 0xFF, 0xFF, 0x0F]);
        assert_eq!(r.read_varint_le().unwrap(), 8);
        assert_eq!(r.read_varint_le().unwrap(), 150);
        assert_eq!(r.read_varint_le().unwrap(), 0xFFFF_FFFF);
    }

    #[test]
    fn varint_le_too_long() {
        let mut r = Reader::new(&[0x80, 0x80, 0x80, 0x80, 0x80, 0x01]);
        assert!(matches!(r.read_varint_le(), Err(Error::VarIntTooLong)));
    }

    #[test]
    fn strings() {
        let mut r = Reader::new(b"abc\0\0def\0");
        assert_eq!(r.read_string().unwrap(), "abc");
        assert_eq!(r.read_versioned_string().unwrap(), "def");
    }

    #[test]
    fn string_extended_chars() {
        let mut r = Reader::new(&[b'a', 0x80, 0x99, 0xE9, 0x00]);
        assert_eq!(r.read_string().unwrap(), "a\u{20ac}\u{2122}é");
    }

    #[test]
    fn versioned_string_rejects_nonzero_version() {
        let mut r = Reader::new(&[0x01, b'a', 0x00]);
        assert!(matches!(
            r.read_versioned_string(),
            Err(Error::InvalidStringVersion(1))
        ));
    }

    #[test]
    fn params_table() {
        let data = [
            0x02, // two entries
            0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x2A, // key 1 -> int 42
            0x01, 0x00, 0x00, 0x02, b'h', b'i', 0x00, // key 2 -> "hi"
        ];
        let mut r = Reader::new(&data);
        let params = r.read_params().unwrap();
        assert_eq!(params.get(&1), Some(&ParamValue::Int(42)));
        assert_eq!(params.get(&2), Some(&ParamValue::Str("hi".into())));
    }

    #[test]
    fn params_unknown_tag() {
        let mut r = Reader::new(&[0x01, 0x02, 0x00, 0x00, 0x01]);
        assert!(matches!(r.read_params(), Err(Error::UnknownParamType(2))));
    }
}
