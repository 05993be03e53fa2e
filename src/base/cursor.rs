use crate::base::error::{Error, Result};

/// Bounds checked reader over a received frame.
///
/// Every extraction goes through [`FrameReader::read_bytes`], which verifies
/// `offset + size <= len` before touching the buffer.
#[derive(Debug)]
pub struct FrameReader<'a> {
    buf: &'a [u8],
    offset: usize,
}

impl<'a> FrameReader<'a> {
    pub fn new(buf: &'a [u8]) -> FrameReader<'a> {
        FrameReader { buf, offset: 0 }
    }

    /// Current read position.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Bytes left after the current position.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.offset
    }

    /// Takes `size` bytes and advances the cursor.
    pub fn read_bytes(&mut self, size: usize) -> Result<&'a [u8]> {
        let end = match self.offset.checked_add(size) {
            Some(end) if end <= self.buf.len() => end,
            _ => {
                return Err(Error::OutOfBounds {
                    offset: self.offset,
                    size,
                    len: self.buf.len(),
                })
            }
        };
        let bytes = &self.buf[self.offset..end];
        self.offset = end;
        Ok(bytes)
    }

    /// Takes a single byte and advances the cursor.
    pub fn read_u8(&mut self) -> Result<u8> {
        self.read_bytes(1).map(|b| b[0])
    }
}

/// Bounds checked writer into an encode buffer.
#[derive(Debug)]
pub struct FrameWriter<'a> {
    buf: &'a mut [u8],
    offset: usize,
}

impl<'a> FrameWriter<'a> {
    pub fn new(buf: &'a mut [u8]) -> FrameWriter<'a> {
        FrameWriter { buf, offset: 0 }
    }

    /// Number of bytes written so far.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Free space after the current position.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.offset
    }

    /// Copies `bytes` at the current position, refusing to write past the capacity.
    pub fn put_slice(&mut self, bytes: &[u8]) -> Result<()> {
        let end = match self.offset.checked_add(bytes.len()) {
            Some(end) if end <= self.buf.len() => end,
            _ => {
                return Err(Error::BufferOverflow {
                    offset: self.offset,
                    size: bytes.len(),
                    capacity: self.buf.len(),
                })
            }
        };
        self.buf[self.offset..end].copy_from_slice(bytes);
        self.offset = end;
        Ok(())
    }

    pub fn put_u8(&mut self, byte: u8) -> Result<()> {
        self.put_slice(&[byte])
    }
}
