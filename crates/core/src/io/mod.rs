//! Byte streams.
//!
//! - `buffer` - one contiguous physical body (Buffer)
//! - `logical` - several physical bodies addressed as one (LogicalStream)

pub mod buffer;
pub mod logical;

pub use buffer::Buffer;
pub use logical::LogicalStream;

use crate::error::Result;

/// Seekable, byte-oriented input shared by physical and logical streams.
///
/// Positions are absolute byte offsets from the start of the stream. Reads
/// past the end return `None` rather than failing.
pub trait ByteStream {
    /// Read the next byte, or `None` at end of stream.
    fn read_byte(&mut self) -> Option<u8>;

    /// Return the next byte without consuming it.
    fn peek_byte(&mut self) -> Option<u8> {
        let position = self.position();
        let byte = self.read_byte()?;
        self.seek(position).ok()?;
        Some(byte)
    }

    /// Move to an absolute position. `len()` itself is a valid position.
    fn seek(&mut self, position: u64) -> Result<()>;

    /// Move relative to the current position.
    fn skip(&mut self, offset: i64) -> Result<()>;

    /// Current absolute position.
    fn position(&self) -> u64;

    /// Total length in bytes.
    fn len(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append bytes to the stream.
    fn write(&mut self, data: &[u8]) -> Result<()>;
}
