//! Sequential big-endian reader over a seekable byte source.
//!
//! The reader tracks its own offset instead of querying the underlying
//! stream, so bounds checks stay cheap. It never checks that enough bytes are
//! left before reading; callers compare [`FlvReader::remaining`] against the
//! size of the next field first.

use std::io::{self, Read, Seek, SeekFrom};

#[derive(Debug)]
pub struct FlvReader<R: Read + Seek> {
    inner: R,
    offset: u64,
    len: u64,
}

#[cfg(test)]
pub type SliceReader<'a> = FlvReader<io::Cursor<&'a [u8]>>;

impl<R> FlvReader<R>
where
    R: Read + Seek,
{
    /// Wraps `inner`, measuring its total length and rewinding to the start.
    pub fn new(mut inner: R) -> io::Result<Self> {
        let len = inner.seek(SeekFrom::End(0))?;
        inner.seek(SeekFrom::Start(0))?;

        Ok(Self {
            inner,
            offset: 0,
            len,
        })
    }

    pub fn seek(&mut self, offset: u64) -> io::Result<()> {
        self.inner.seek(SeekFrom::Start(offset))?;
        self.offset = offset;
        Ok(())
    }

    #[inline(always)]
    pub fn read_u8(&mut self) -> io::Result<u8> {
        let mut buf = [0u8; 1];
        self.fill(&mut buf)?;
        Ok(buf[0])
    }

    #[inline(always)]
    pub fn read_u24(&mut self) -> io::Result<u32> {
        let mut buf = [0u8; 3];
        self.fill(&mut buf)?;
        Ok((u32::from(buf[0]) << 16) | (u32::from(buf[1]) << 8) | u32::from(buf[2]))
    }

    #[inline(always)]
    pub fn read_u32(&mut self) -> io::Result<u32> {
        let mut buf = [0u8; 4];
        self.fill(&mut buf)?;
        Ok(u32::from_be_bytes(buf))
    }

    pub fn read_bytes(&mut self, n: usize) -> io::Result<Vec<u8>> {
        let mut buf = vec![0u8; n];
        self.fill(&mut buf)?;
        Ok(buf)
    }

    #[inline(always)]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    #[inline(always)]
    pub fn len(&self) -> u64 {
        self.len
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline(always)]
    pub fn remaining(&self) -> u64 {
        self.len.saturating_sub(self.offset)
    }

    fn fill(&mut self, buf: &mut [u8]) -> io::Result<()> {
        self.inner.read_exact(buf).map_err(|e| {
            if e.kind() == io::ErrorKind::UnexpectedEof {
                io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!(
                        "read({}): out of bounds bytes at {} of {}",
                        buf.len(),
                        self.offset,
                        self.len
                    ),
                )
            } else {
                e
            }
        })?;
        self.offset += buf.len() as u64;
        Ok(())
    }
}

#[cfg(test)]
impl<'a> SliceReader<'a> {
    pub fn from_slice(buf: &'a [u8]) -> Self {
        Self {
            inner: io::Cursor::new(buf),
            offset: 0,
            len: buf.len() as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn big_endian_integers() -> io::Result<()> {
        let data = [0x46, 0x4C, 0x56, 0x01, 0x05, 0xAB, 0xCD, 0xEF, 0xFF];
        let mut reader = SliceReader::from_slice(&data);

        assert_eq!(reader.read_u32()?, 0x464C5601);
        assert_eq!(reader.offset(), 4);
        assert_eq!(reader.read_u8()?, 0x05);
        assert_eq!(reader.read_u24()?, 0xABCDEF);
        assert_eq!(reader.offset(), 8);
        assert_eq!(reader.remaining(), 1);
        assert_eq!(reader.read_bytes(1)?, vec![0xFF]);
        assert_eq!(reader.remaining(), 0);
        Ok(())
    }

    #[test]
    fn u24_keeps_high_byte_clear() -> io::Result<()> {
        let mut reader = SliceReader::from_slice(&[0xFF, 0xFF, 0xFF]);
        assert_eq!(reader.read_u24()?, 0x00FF_FFFF);
        Ok(())
    }

    #[test]
    fn seek_resets_offset() -> io::Result<()> {
        let data = [0u8, 1, 2, 3, 4, 5, 6, 7];
        let mut reader = FlvReader::new(io::Cursor::new(&data[..]))?;
        assert_eq!(reader.len(), 8);

        reader.seek(5)?;
        assert_eq!(reader.offset(), 5);
        assert_eq!(reader.read_u8()?, 5);
        assert_eq!(reader.remaining(), 2);
        Ok(())
    }

    #[test]
    fn short_read_is_eof() {
        let mut reader = SliceReader::from_slice(&[0x01, 0x02]);
        let err = reader.read_u32().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }
}
