//! Errors reported for individual frames.
//!
//! A [`ReadingError`] never stops the stream: the assembler is already
//! looking for the next frame by the time one is returned.  Transport
//! failures are a different matter and live in [`crate::source::SourceError`].

use thiserror::Error;

use crate::protocol::frame::FrameError;
use crate::protocol::packet::DecodeError;

/// Why a frame did not produce a fresh reading.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReadingError {
    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error("could not parse packet: {0}")]
    Decode(#[from] DecodeError),
}

/// Flat classification of [`ReadingError`], handy for counters and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorKind {
    FrameTooLong,
    ChecksumMismatch,
    UnknownFieldId,
    TruncatedField,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 4] = [
        ErrorKind::FrameTooLong,
        ErrorKind::ChecksumMismatch,
        ErrorKind::UnknownFieldId,
        ErrorKind::TruncatedField,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::FrameTooLong => "frame_too_long",
            ErrorKind::ChecksumMismatch => "checksum_mismatch",
            ErrorKind::UnknownFieldId => "unknown_field_id",
            ErrorKind::TruncatedField => "truncated_field",
        }
    }
}

impl ReadingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ReadingError::Frame(FrameError::FrameTooLong { .. }) => ErrorKind::FrameTooLong,
            ReadingError::Frame(FrameError::ChecksumMismatch { .. }) => ErrorKind::ChecksumMismatch,
            ReadingError::Decode(DecodeError::UnknownFieldId { .. }) => ErrorKind::UnknownFieldId,
            ReadingError::Decode(DecodeError::TruncatedField { .. }) => ErrorKind::TruncatedField,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classifies_every_variant() {
        let cases = [
            (
                ReadingError::from(FrameError::FrameTooLong { length: 40 }),
                ErrorKind::FrameTooLong,
            ),
            (
                ReadingError::from(FrameError::ChecksumMismatch {
                    expected: 1,
                    actual: 2,
                }),
                ErrorKind::ChecksumMismatch,
            ),
            (
                ReadingError::from(DecodeError::UnknownFieldId { id: 0x99, offset: 0 }),
                ErrorKind::UnknownFieldId,
            ),
            (
                ReadingError::from(DecodeError::TruncatedField {
                    id: 0x83,
                    offset: 0,
                    needed: 25,
                    available: 3,
                }),
                ErrorKind::TruncatedField,
            ),
        ];

        for (err, kind) in cases {
            assert_eq!(err.kind(), kind);
        }
    }

    #[test]
    fn test_decode_errors_are_prefixed() {
        let err = ReadingError::from(DecodeError::UnknownFieldId { id: 0x99, offset: 4 });
        assert_eq!(
            err.to_string(),
            "could not parse packet: unknown field id 0x99 at offset 4"
        );
    }

    #[test]
    fn test_frame_errors_are_transparent() {
        let err = ReadingError::from(FrameError::FrameTooLong { length: 50 });
        assert_eq!(err.to_string(), FrameError::FrameTooLong { length: 50 }.to_string());
    }
}
