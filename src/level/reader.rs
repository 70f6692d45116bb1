use byteorder::{ByteOrder, LittleEndian};
use glam::{Vec3, Vec4};

use crate::error::{Error, Result, TruncatedError};
use crate::terrain::codec::HeightNormalSample;

/// Sequential little-endian reader over a fully materialized level byte
/// stream. Every read reports the offset and what was being decoded when the
/// stream runs short, so truncated containers fail with a usable message.
pub struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn offset(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, len: usize, reading: &'static str) -> Result<&'a [u8]> {
        if self.remaining() < len {
            return Err(Error::Truncated(TruncatedError {
                offset: self.pos,
                needed: len,
                reading,
            }));
        }
        let slice = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    pub fn read_u8(&mut self, reading: &'static str) -> Result<u8> {
        Ok(self.take(1, reading)?[0])
    }

    pub fn read_i32(&mut self, reading: &'static str) -> Result<i32> {
        Ok(LittleEndian::read_i32(self.take(4, reading)?))
    }

    pub fn read_f32(&mut self, reading: &'static str) -> Result<f32> {
        Ok(LittleEndian::read_f32(self.take(4, reading)?))
    }

    pub fn read_vec3(&mut self, reading: &'static str) -> Result<Vec3> {
        let x = self.read_f32(reading)?;
        let y = self.read_f32(reading)?;
        let z = self.read_f32(reading)?;
        Ok(Vec3::new(x, y, z))
    }

    pub fn read_vec4(&mut self, reading: &'static str) -> Result<Vec4> {
        let x = self.read_f32(reading)?;
        let y = self.read_f32(reading)?;
        let z = self.read_f32(reading)?;
        let w = self.read_f32(reading)?;
        Ok(Vec4::new(x, y, z, w))
    }

    /// NUL-terminated byte string. The container stores plain single-byte
    /// characters; anything non-UTF8 is replaced rather than rejected.
    pub fn read_string(&mut self, reading: &'static str) -> Result<String> {
        let start = self.pos;
        let nul = self.buf[self.pos..]
            .iter()
            .position(|&b| b == 0)
            .ok_or(Error::Truncated(TruncatedError {
                offset: start,
                needed: 1,
                reading,
            }))?;
        let bytes = &self.buf[start..start + nul];
        self.pos = start + nul + 1;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }

    pub fn read_bytes(&mut self, len: usize, reading: &'static str) -> Result<Vec<u8>> {
        Ok(self.take(len, reading)?.to_vec())
    }

    /// One packed height/normal sample. The container stores the channels in
    /// BGRA byte order; samples are swizzled to RGBA on read.
    pub fn read_sample(&mut self, reading: &'static str) -> Result<HeightNormalSample> {
        let raw = self.take(4, reading)?;
        Ok(HeightNormalSample {
            r: raw[2],
            g: raw[1],
            b: raw[0],
            a: raw[3],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_primitives_in_sequence() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&7i32.to_le_bytes());
        buf.extend_from_slice(&1.5f32.to_le_bytes());
        buf.extend_from_slice(b"cell\0");
        let mut r = ByteReader::new(&buf);
        assert_eq!(r.read_i32("int").unwrap(), 7);
        assert_eq!(r.read_f32("float").unwrap(), 1.5);
        assert_eq!(r.read_string("name").unwrap(), "cell");
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn truncated_read_names_offset_and_context() {
        let buf = [1u8, 2];
        let mut r = ByteReader::new(&buf);
        let err = r.read_i32("cell count").unwrap_err();
        match err {
            Error::Truncated(t) => {
                assert_eq!(t.offset, 0);
                assert_eq!(t.needed, 4);
                assert_eq!(t.reading, "cell count");
            }
            other => panic!("expected truncation error, got {:?}", other),
        }
    }

    #[test]
    fn sample_swizzles_bgra_to_rgba() {
        let buf = [10u8, 20, 30, 40];
        let mut r = ByteReader::new(&buf);
        let s = r.read_sample("sample").unwrap();
        assert_eq!((s.r, s.g, s.b, s.a), (30, 20, 10, 40));
    }

    #[test]
    fn unterminated_string_is_truncation() {
        let buf = b"abc";
        let mut r = ByteReader::new(buf);
        assert!(matches!(
            r.read_string("name").unwrap_err(),
            Error::Truncated(_)
        ));
    }
}
