//! Physical stream body.

use super::ByteStream;
use crate::error::{PdfError, Result};
use bytes::{Bytes, BytesMut};

/// One contiguous byte body with a read cursor.
///
/// The body is shared (`Bytes`), so cloning a buffer or building several
/// readers over the same stream data never copies it.
#[derive(Debug, Clone, Default)]
pub struct Buffer {
    data: Bytes,
    pos: usize,
}

impl Buffer {
    /// Create a buffer positioned at its start.
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            pos: 0,
        }
    }

    /// The whole body.
    pub fn bytes(&self) -> &Bytes {
        &self.data
    }

    /// Bytes from the cursor to the end.
    pub fn remaining(&self) -> &[u8] {
        &self.data[self.pos..]
    }

    /// Set the cursor, clamped to the body length.
    pub(crate) fn set_position(&mut self, pos: u64) {
        self.pos = (pos as usize).min(self.data.len());
    }

    fn out_of_range(&self, position: i64) -> PdfError {
        PdfError::OutOfRange {
            position,
            len: self.data.len() as u64,
        }
    }
}

impl ByteStream for Buffer {
    fn read_byte(&mut self) -> Option<u8> {
        let b = self.data.get(self.pos).copied()?;
        self.pos += 1;
        Some(b)
    }

    fn peek_byte(&mut self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    fn seek(&mut self, position: u64) -> Result<()> {
        if position > self.data.len() as u64 {
            return Err(self.out_of_range(position as i64));
        }
        self.pos = position as usize;
        Ok(())
    }

    fn skip(&mut self, offset: i64) -> Result<()> {
        let target = self.pos as i64 + offset;
        if target < 0 || target > self.data.len() as i64 {
            return Err(self.out_of_range(target));
        }
        self.pos = target as usize;
        Ok(())
    }

    fn position(&self) -> u64 {
        self.pos as u64
    }

    fn len(&self) -> u64 {
        self.data.len() as u64
    }

    fn write(&mut self, data: &[u8]) -> Result<()> {
        let mut body = BytesMut::with_capacity(self.data.len() + data.len());
        body.extend_from_slice(&self.data);
        body.extend_from_slice(data);
        self.data = body.freeze();
        self.pos = self.data.len();
        Ok(())
    }
}
