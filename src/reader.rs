//! Big-endian stream reader (spec §4.1).
//!
//! All TrueType multi-byte fields are big-endian regardless of host byte
//! order; this wraps `byteorder` the way the teacher's table loaders did,
//! but over an owned byte slice instead of a generic `Read + Seek`, and
//! turns short reads into a typed error instead of bubbling up `io::Error`.

use byteorder::{BigEndian, ByteOrder};

use crate::error::{Error, Result};

#[derive(Clone)]
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8]) -> Reader<'a> {
        Reader { data, pos: 0 }
    }

    pub fn tell(&self) -> usize {
        self.pos
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    pub fn seek(&mut self, offset: usize) -> Result<()> {
        if offset > self.data.len() {
            return Err(Error::OutOfBounds { offset, length: self.data.len() });
        }
        self.pos = offset;
        Ok(())
    }

    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.seek(self.pos + n)
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.pos + n > self.data.len() {
            return Err(Error::TruncatedInput {
                offset: self.pos,
                needed: n,
                available: self.data.len().saturating_sub(self.pos),
            });
        }
        let s = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(s)
    }

    pub fn bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        self.take(n)
    }

    pub fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn i8(&mut self) -> Result<i8> {
        Ok(self.take(1)?[0] as i8)
    }

    pub fn u16(&mut self) -> Result<u16> {
        Ok(BigEndian::read_u16(self.take(2)?))
    }

    pub fn i16(&mut self) -> Result<i16> {
        Ok(BigEndian::read_i16(self.take(2)?))
    }

    pub fn u32(&mut self) -> Result<u32> {
        Ok(BigEndian::read_u32(self.take(4)?))
    }

    pub fn i32(&mut self) -> Result<i32> {
        Ok(BigEndian::read_i32(self.take(4)?))
    }

    pub fn u64(&mut self) -> Result<u64> {
        Ok(BigEndian::read_u64(self.take(8)?))
    }

    pub fn tag(&mut self) -> Result<crate::error::Tag> {
        let b = self.take(4)?;
        Ok(crate::error::Tag([b[0], b[1], b[2], b[3]]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_big_endian() {
        let data = [0x01, 0x02, 0x03, 0x04, 0xFF, 0xFE];
        let mut r = Reader::new(&data);
        assert_eq!(r.u16().unwrap(), 0x0102);
        assert_eq!(r.u16().unwrap(), 0x0304);
        assert_eq!(r.i16().unwrap(), -2i16);
    }

    #[test]
    fn short_read_fails() {
        let data = [0x00u8];
        let mut r = Reader::new(&data);
        assert!(r.u16().is_err());
    }

    #[test]
    fn seek_past_end_fails() {
        let data = [0u8; 4];
        let mut r = Reader::new(&data);
        assert!(r.seek(5).is_err());
        assert!(r.seek(4).is_ok());
    }

    #[test]
    fn skip_and_tell() {
        let data = [0u8; 10];
        let mut r = Reader::new(&data);
        r.skip(3).unwrap();
        assert_eq!(r.tell(), 3);
    }
}
