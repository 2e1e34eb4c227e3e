//! The byte source seam.
//!
//! The core never opens a port or a socket itself.  Whatever delivers the
//! headset's bytes (a Bluetooth RFCOMM device node, a capture file, a TCP
//! bridge, a test vector) implements [`ByteSource`] and is handed to
//! [`crate::Headset`].
//!
//! # Testability
//!
//! [`MemorySource`] is a queue-backed implementation for tests, benches, and
//! replaying captured streams.  Unit tests in this crate also use the
//! `mockall`-generated `MockByteSource` to script failures.

use std::collections::VecDeque;

use thiserror::Error;

/// Transport-level failures.  Unlike frame errors these propagate out of
/// [`crate::Headset::poll`]: they mean the stream itself is unusable.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The underlying reader failed.
    #[error("I/O error reading byte source: {0}")]
    Io(#[from] std::io::Error),

    /// The stream has ended and no more bytes will arrive.
    #[error("byte source closed")]
    Closed,

    /// `read_byte` was called with nothing available.
    #[error("no byte available to read")]
    NoData,
}

/// A stream of bytes that can be polled without blocking the decoder.
#[cfg_attr(test, mockall::automock)]
pub trait ByteSource {
    /// Number of bytes that can be read right now.
    fn bytes_available(&mut self) -> Result<usize, SourceError>;

    /// Reads exactly one byte.
    fn read_byte(&mut self) -> Result<u8, SourceError>;
}

impl<S: ByteSource + ?Sized> ByteSource for Box<S> {
    fn bytes_available(&mut self) -> Result<usize, SourceError> {
        (**self).bytes_available()
    }

    fn read_byte(&mut self) -> Result<u8, SourceError> {
        (**self).read_byte()
    }
}

/// An in-memory byte queue.
///
/// A *live* source reports zero bytes available once drained, like an idle
/// serial line.  A *finite* source reports [`SourceError::Closed`] instead,
/// like the end of a capture file.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    queue: VecDeque<u8>,
    close_when_drained: bool,
}

impl MemorySource {
    /// Creates a live source pre-loaded with `bytes`.
    pub fn new(bytes: impl IntoIterator<Item = u8>) -> Self {
        Self {
            queue: bytes.into_iter().collect(),
            close_when_drained: false,
        }
    }

    /// Creates a source that closes once `bytes` have been read.
    pub fn finite(bytes: impl IntoIterator<Item = u8>) -> Self {
        Self {
            queue: bytes.into_iter().collect(),
            close_when_drained: true,
        }
    }

    /// Appends bytes, as if they just arrived on the wire.
    pub fn extend(&mut self, bytes: impl IntoIterator<Item = u8>) {
        self.queue.extend(bytes);
    }

    /// Bytes not yet read.
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

impl ByteSource for MemorySource {
    fn bytes_available(&mut self) -> Result<usize, SourceError> {
        if self.queue.is_empty() && self.close_when_drained {
            return Err(SourceError::Closed);
        }
        Ok(self.queue.len())
    }

    fn read_byte(&mut self) -> Result<u8, SourceError> {
        match self.queue.pop_front() {
            Some(byte) => Ok(byte),
            None if self.close_when_drained => Err(SourceError::Closed),
            None => Err(SourceError::NoData),
        }
    }
}
