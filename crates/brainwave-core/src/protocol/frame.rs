//! Byte-at-a-time frame assembly for the headset's serial stream.
//!
//! Wire format:
//! ```text
//! [0xAA][0xAA][len:1][payload:len][checksum:1]
//! ```
//! `len` is at most [`MAX_PAYLOAD_LEN`].  The checksum is the one's
//! complement of the low byte of the payload sum; the length byte is not
//! part of it.
//!
//! # How the state machine works (for beginners)
//!
//! The stream has no framing guarantees: the reader may start listening in
//! the middle of a frame, bytes may be dropped over Bluetooth, and payload
//! bytes may themselves be `0xAA`.  The assembler therefore sits in
//! [`AssemblerState::Searching`] and throws bytes away until it sees two
//! `0xAA` in a row.  From there it reads the length, then exactly that many
//! payload bytes, then the checksum.  Whatever happens at the checksum, it
//! goes back to searching.
//!
//! Sync detection is evaluated *after* each byte has been handled by the
//! current state and only acted on when the machine is (back) in
//! `Searching`.  As a result:
//!
//! - an `0xAA 0xAA` pair inside a payload never restarts the frame;
//! - a frame that ends on `0xAA` right after another `0xAA` re-syncs on the
//!   spot;
//! - `AA AA AA 04 ...` rejects the third `AA` as an oversized length and then
//!   treats it as the second half of a fresh sync pair.

use thiserror::Error;
use tracing::trace;

/// Marker byte; two in a row start a frame.
pub const SYNC_BYTE: u8 = 0xAA;

/// Largest payload the headset is allowed to send.
pub const MAX_PAYLOAD_LEN: usize = 32;

/// Framing failures.  Neither is fatal: the assembler is already searching
/// for the next frame when one of these is returned.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// The length byte exceeds [`MAX_PAYLOAD_LEN`].
    #[error("packet length {length} is too long (maximum is {})", MAX_PAYLOAD_LEN)]
    FrameTooLong { length: u8 },

    /// The trailing checksum byte does not match the payload.
    #[error("checksum mismatch: expected 0x{expected:02X}, got 0x{actual:02X}")]
    ChecksumMismatch { expected: u8, actual: u8 },
}

/// Where the assembler is within the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AssemblerState {
    /// Discarding bytes until a `0xAA 0xAA` pair is seen.
    #[default]
    Searching,
    /// The next byte is the payload length.
    ReadingLength,
    /// The next byte is payload byte `index` (1-based) of `length`.
    ReadingPayload { index: usize, length: usize },
    /// The next byte is the checksum for a `length`-byte payload.
    ReadingChecksum { length: usize },
}

impl AssemblerState {
    /// `true` once sync has been acquired and a frame is being read.
    pub fn is_mid_frame(&self) -> bool {
        !matches!(self, AssemblerState::Searching)
    }
}

/// Result of feeding one byte, before the payload is borrowed.
enum Step {
    Pending,
    Complete { length: usize },
    Rejected(FrameError),
}

/// Reassembles checksum-validated payloads from a raw byte stream.
///
/// # Examples
///
/// ```rust
/// use brainwave_core::protocol::frame::{encode_frame, FrameAssembler};
///
/// let bytes = encode_frame(&[0x04, 0x50]).unwrap();
/// let mut assembler = FrameAssembler::new();
/// let mut payloads = Vec::new();
/// for byte in bytes {
///     if let Some(Ok(payload)) = assembler.push(byte) {
///         payloads.push(payload.to_vec());
///     }
/// }
/// assert_eq!(payloads, vec![vec![0x04, 0x50]]);
/// ```
#[derive(Debug, Clone)]
pub struct FrameAssembler {
    state: AssemblerState,
    /// Reused across frames; only `..length` of the current frame is valid.
    buffer: [u8; MAX_PAYLOAD_LEN],
    accumulator: u8,
    last_byte: Option<u8>,
}

impl FrameAssembler {
    /// Creates an assembler in the `Searching` state.
    pub fn new() -> Self {
        Self {
            state: AssemblerState::Searching,
            buffer: [0; MAX_PAYLOAD_LEN],
            accumulator: 0,
            last_byte: None,
        }
    }

    /// Current state of the machine.
    pub fn state(&self) -> AssemblerState {
        self.state
    }

    /// Drops any partial frame and forgets the previous byte.
    pub fn reset(&mut self) {
        self.state = AssemblerState::Searching;
        self.accumulator = 0;
        self.last_byte = None;
    }

    /// Advances the state machine by one byte.
    ///
    /// Returns `None` while a frame is still incomplete (or while searching),
    /// `Some(Ok(payload))` when a frame's checksum validates, and
    /// `Some(Err(_))` when a frame is abandoned.
    pub fn push(&mut self, byte: u8) -> Option<Result<&[u8], FrameError>> {
        let step = self.advance(byte);

        if self.state == AssemblerState::Searching
            && byte == SYNC_BYTE
            && self.last_byte == Some(SYNC_BYTE)
        {
            trace!("sync acquired");
            self.state = AssemblerState::ReadingLength;
            self.accumulator = 0;
        }
        self.last_byte = Some(byte);

        match step {
            Step::Pending => None,
            Step::Complete { length } => Some(Ok(&self.buffer[..length])),
            Step::Rejected(err) => Some(Err(err)),
        }
    }

    fn advance(&mut self, byte: u8) -> Step {
        match self.state {
            AssemblerState::Searching => Step::Pending,

            AssemblerState::ReadingLength => {
                let length = byte as usize;
                if length > MAX_PAYLOAD_LEN {
                    self.state = AssemblerState::Searching;
                    return Step::Rejected(FrameError::FrameTooLong { length: byte });
                }
                self.state = if length == 0 {
                    AssemblerState::ReadingChecksum { length }
                } else {
                    AssemblerState::ReadingPayload { index: 1, length }
                };
                Step::Pending
            }

            AssemblerState::ReadingPayload { index, length } => {
                // `index` is at most MAX_PAYLOAD_LEN once a length is accepted.
                let Some(slot) = self.buffer.get_mut(index - 1) else {
                    self.state = AssemblerState::Searching;
                    return Step::Rejected(FrameError::FrameTooLong {
                        length: length.min(u8::MAX as usize) as u8,
                    });
                };
                *slot = byte;
                self.accumulator = self.accumulator.wrapping_add(byte);
                self.state = if index >= length {
                    AssemblerState::ReadingChecksum { length }
                } else {
                    AssemblerState::ReadingPayload {
                        index: index + 1,
                        length,
                    }
                };
                Step::Pending
            }

            AssemblerState::ReadingChecksum { length } => {
                self.state = AssemblerState::Searching;
                let expected = 0xFF - self.accumulator;
                if byte == expected {
                    trace!(length, "frame complete");
                    Step::Complete { length }
                } else {
                    Step::Rejected(FrameError::ChecksumMismatch {
                        expected,
                        actual: byte,
                    })
                }
            }
        }
    }
}

impl Default for FrameAssembler {
    fn default() -> Self {
        Self::new()
    }
}

// ── Encoding helpers ──────────────────────────────────────────────────────────

/// Computes the trailing checksum byte for `payload`.
///
/// # Examples
///
/// ```rust
/// use brainwave_core::protocol::frame::checksum;
///
/// // Every payload byte counts, identifiers included:
/// // 0x02 + 0xC8 + 0x04 + 0x64 + 0x05 + 0x32 = 0x169, low byte 0x69,
/// // 0xFF - 0x69 = 0x96
/// assert_eq!(checksum(&[0x02, 0xC8, 0x04, 0x64, 0x05, 0x32]), 0x96);
/// ```
pub fn checksum(payload: &[u8]) -> u8 {
    let sum = payload.iter().fold(0u8, |acc, b| acc.wrapping_add(*b));
    0xFF - sum
}

/// Wraps `payload` in sync bytes, length, and checksum.
///
/// # Errors
///
/// Returns [`FrameError::FrameTooLong`] if `payload` exceeds
/// [`MAX_PAYLOAD_LEN`].
pub fn encode_frame(payload: &[u8]) -> Result<Vec<u8>, FrameError> {
    if payload.len() > MAX_PAYLOAD_LEN {
        return Err(FrameError::FrameTooLong {
            length: payload.len().min(u8::MAX as usize) as u8,
        });
    }

    let mut buf = Vec::with_capacity(payload.len() + 4);
    buf.push(SYNC_BYTE);
    buf.push(SYNC_BYTE);
    buf.push(payload.len() as u8);
    buf.extend_from_slice(payload);
    buf.push(checksum(payload));
    Ok(buf)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
