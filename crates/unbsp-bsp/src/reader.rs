// reader.rs — bounds-checked little-endian cursor over a byte slice.
//
// Every supported format is little-endian. Reads past the end are decode
// errors, never panics: a hostile or truncated file must fail the one job
// that opened it.

use crate::error::{BspError, Result};
use unbsp_common::math::Vec3;

pub struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
    /// Label carried into Truncated errors.
    what: &'static str,
}

impl<'a> Reader<'a> {
    pub fn new(bytes: &'a [u8], what: &'static str) -> Reader<'a> {
        Reader { bytes, pos: 0, what }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    pub fn seek(&mut self, pos: usize) {
        self.pos = pos.min(self.bytes.len());
    }

    pub fn skip(&mut self, count: usize) -> Result<()> {
        self.take(count).map(|_| ())
    }

    pub fn take(&mut self, count: usize) -> Result<&'a [u8]> {
        match self.bytes.get(self.pos..self.pos + count) {
            Some(slice) => {
                self.pos += count;
                Ok(slice)
            }
            None => Err(BspError::Truncated {
                what: self.what,
                offset: self.pos,
            }),
        }
    }

    pub fn u16(&mut self) -> Result<u16> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub fn i16(&mut self) -> Result<i16> {
        let b = self.take(2)?;
        Ok(i16::from_le_bytes([b[0], b[1]]))
    }

    pub fn u32(&mut self) -> Result<u32> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn i32(&mut self) -> Result<i32> {
        let b = self.take(4)?;
        Ok(i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn f32(&mut self) -> Result<f32> {
        let b = self.take(4)?;
        Ok(f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn vec3(&mut self) -> Result<Vec3> {
        Ok(Vec3 {
            x: self.f32()?,
            y: self.f32()?,
            z: self.f32()?,
        })
    }

    /// Fixed-width, zero-padded name field. Non-UTF-8 bytes are dropped
    /// rather than failing the decode; texture names in old compilers are
    /// only nominally ASCII.
    pub fn fixed_string(&mut self, len: usize) -> Result<String> {
        let bytes = self.take(len)?;
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(len);
        Ok(String::from_utf8_lossy(&bytes[..end]).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_reads() {
        let bytes = [0x2a, 0x00, 0x00, 0x00, 0xff, 0xff, b'h', b'i', 0, 0];
        let mut r = Reader::new(&bytes, "test");
        assert_eq!(r.i32().unwrap(), 42);
        assert_eq!(r.i16().unwrap(), -1);
        assert_eq!(r.fixed_string(4).unwrap(), "hi");
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn test_truncated_read_is_error() {
        let mut r = Reader::new(&[1, 2], "planes");
        let err = r.u32().unwrap_err();
        assert!(matches!(err, BspError::Truncated { what: "planes", .. }));
    }
}
