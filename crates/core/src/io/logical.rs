//! Logical stream over several physical bodies.
//!
//! A page's content may be split across multiple content streams; the
//! concatenation of their bodies, without separators, is one logical stream.
//! Operators and operands may straddle body boundaries, so the tokenizer must
//! see a single continuous byte range.

use super::{Buffer, ByteStream};
use crate::error::{PdfError, Result};
use bytes::Bytes;

/// Ordered physical bodies addressed as one seekable stream.
///
/// The current body index may sit at `-1` (before the first body) or at
/// `bodies.len()` (after the last one); in both states reads report end of
/// stream. The stream owns its bodies: `close()` releases them explicitly and
/// dropping the stream releases them on every other path.
#[derive(Debug, Default)]
pub struct LogicalStream {
    bodies: Vec<Buffer>,
    /// Index of the current body.
    index: isize,
    /// Logical offset where the current body begins.
    base_position: u64,
}

impl LogicalStream {
    /// Create a logical stream over the given bodies, positioned at 0.
    pub fn new(bodies: Vec<Bytes>) -> Self {
        Self::from_buffers(bodies.into_iter().map(Buffer::new).collect())
    }

    /// Create a logical stream over existing physical buffers.
    pub fn from_buffers(bodies: Vec<Buffer>) -> Self {
        let mut stream = Self {
            bodies,
            index: -1,
            base_position: 0,
        };
        stream.move_next();
        stream
    }

    /// Number of physical bodies.
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Index of the body holding the current position, if any.
    pub fn body_index(&self) -> Option<usize> {
        self.current().map(|_| self.index as usize)
    }

    /// Release every physical body. Further reads report end of stream.
    pub fn close(&mut self) {
        tracing::trace!(bodies = self.bodies.len(), "closing logical stream");
        self.bodies.clear();
        self.index = 0;
        self.base_position = 0;
    }

    fn current(&self) -> Option<&Buffer> {
        usize::try_from(self.index)
            .ok()
            .and_then(|i| self.bodies.get(i))
    }

    fn current_mut(&mut self) -> Option<&mut Buffer> {
        usize::try_from(self.index)
            .ok()
            .and_then(|i| self.bodies.get_mut(i))
    }

    /// Advance to the next body, rewinding it to its start.
    fn move_next(&mut self) -> bool {
        if self.index < self.bodies.len() as isize {
            if let Some(len) = self.current().map(Buffer::len) {
                self.base_position += len;
            }
            self.index += 1;
        }
        match self.current_mut() {
            Some(body) => {
                body.set_position(0);
                true
            }
            None => false,
        }
    }

    /// Step back to the previous body. Its local position is left untouched.
    fn move_previous(&mut self) -> bool {
        if self.index <= 0 {
            self.index = -1;
            self.base_position = 0;
            return false;
        }
        self.index -= 1;
        if let Some(len) = self.current().map(Buffer::len) {
            self.base_position -= len;
        }
        true
    }

    fn out_of_range(&self, position: i64) -> PdfError {
        PdfError::OutOfRange {
            position,
            len: self.len(),
        }
    }
}

impl ByteStream for LogicalStream {
    fn read_byte(&mut self) -> Option<u8> {
        loop {
            let byte = self.current_mut().and_then(Buffer::read_byte);
            if byte.is_some() || !self.move_next() {
                return byte;
            }
        }
    }

    fn seek(&mut self, position: u64) -> Result<()> {
        loop {
            if position < self.base_position {
                if !self.move_previous() {
                    return Err(self.out_of_range(position as i64));
                }
                continue;
            }
            match self.current().map(Buffer::len) {
                Some(len) if position > self.base_position + len => {
                    if !self.move_next() {
                        return Err(self.out_of_range(position as i64));
                    }
                }
                Some(_) => {
                    let local = position - self.base_position;
                    if let Some(body) = self.current_mut() {
                        body.seek(local)?;
                    }
                    return Ok(());
                }
                None if self.index < 0 => {
                    if !self.move_next() {
                        return Err(self.out_of_range(position as i64));
                    }
                }
                None => {
                    // Past the last body: only its end position is reachable.
                    if position == self.base_position && self.bodies.is_empty() {
                        return Ok(());
                    }
                    if position > self.base_position || !self.move_previous() {
                        return Err(self.out_of_range(position as i64));
                    }
                    if let Some(body) = self.current_mut() {
                        body.set_position(body.len());
                    }
                }
            }
        }
    }

    fn skip(&mut self, mut offset: i64) -> Result<()> {
        let target = self.position() as i64 + offset;
        loop {
            let Some((local, len)) = self
                .current()
                .map(|body| (body.position() as i64, body.len() as i64))
            else {
                if self.index < 0 && offset >= 0 && self.move_next() {
                    continue;
                }
                if self.index >= 0 && offset <= 0 && self.move_previous() {
                    if let Some(body) = self.current_mut() {
                        body.set_position(body.len());
                    }
                    continue;
                }
                if offset == 0 {
                    return Ok(());
                }
                return Err(self.out_of_range(target));
            };

            let position = local + offset;
            if position < 0 {
                offset += local;
                if !self.move_previous() {
                    return Err(self.out_of_range(target));
                }
                if let Some(body) = self.current_mut() {
                    body.set_position(body.len());
                }
            } else if position > len {
                offset -= len - local;
                if !self.move_next() {
                    return Err(self.out_of_range(target));
                }
            } else {
                if let Some(body) = self.current_mut() {
                    body.seek(position as u64)?;
                }
                return Ok(());
            }
        }
    }

    fn position(&self) -> u64 {
        self.base_position + self.current().map_or(0, Buffer::position)
    }

    fn len(&self) -> u64 {
        self.bodies.iter().map(Buffer::len).sum()
    }

    fn write(&mut self, _data: &[u8]) -> Result<()> {
        Err(PdfError::NotSupported("writing to a logical content stream"))
    }
}
