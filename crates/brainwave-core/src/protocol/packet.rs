//! Payload decoding: tagged fields into [`SensorState`].
//!
//! A validated payload is a flat list of fields.  Each field starts with a
//! one-byte identifier that decides how many value bytes follow:
//!
//! ```text
//! 0x02 <quality>                     signal quality
//! 0x04 <attention>                   eSense attention
//! 0x05 <meditation>                  eSense meditation
//! 0x80 <len> <hi> <lo>               raw sample, 16-bit big-endian
//! 0x83 <len> <24 bytes>              8 × 24-bit big-endian band powers
//! ```
//!
//! # Unknown identifiers (for beginners)
//!
//! The format has no universal length prefix, so the decoder cannot skip a
//! field it does not recognise.  It records the failure and carries on at
//! the *next byte*, which may well be part of the unknown field's value.
//! Fields decoded before and after that point stay written to the state,
//! even though the decode as a whole is reported as failed.

use thiserror::Error;
use tracing::debug;

use crate::domain::sensor_state::{PowerBand, PowerBands, SensorState, POWER_BAND_COUNT};

/// Field identifiers understood by the decoder.
pub mod field_id {
    pub const SIGNAL_QUALITY: u8 = 0x02;
    pub const ATTENTION: u8 = 0x04;
    pub const MEDITATION: u8 = 0x05;
    pub const RAW_WAVE: u8 = 0x80;
    pub const EEG_POWER: u8 = 0x83;
}

/// Bytes per band value in the power field.
const BAND_VALUE_LEN: usize = 3;

/// Failures found while walking a payload.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The byte at `offset` is not a known field identifier.
    #[error("unknown field id 0x{id:02X} at offset {offset}")]
    UnknownFieldId { id: u8, offset: usize },

    /// A known field's value runs past the end of the payload.
    #[error("field 0x{id:02X} at offset {offset} is truncated: needs {needed} bytes, {available} left")]
    TruncatedField {
        id: u8,
        offset: usize,
        needed: usize,
        available: usize,
    },
}

/// What one call to [`PacketDecoder::decode`] did.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DecodeOutcome {
    /// Number of fields written to the state (raw samples included).
    pub fields: usize,
    /// Last raw sample in the payload, if any.  Not stored on the state.
    pub raw_sample: Option<i16>,
    /// First failure encountered, if any.
    pub error: Option<DecodeError>,
}

impl DecodeOutcome {
    /// `true` if every identifier in the payload was recognised.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Converts the outcome into a `Result`, keeping the first error.
    pub fn into_result(self) -> Result<Self, DecodeError> {
        match self.error.clone() {
            Some(err) => Err(err),
            None => Ok(self),
        }
    }
}

/// Interprets validated payloads and applies them to a [`SensorState`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PacketDecoder;

impl PacketDecoder {
    pub fn new() -> Self {
        Self
    }

    /// Decodes `payload` into `state`.
    ///
    /// Power bands are zeroed and `has_power` cleared before any field is
    /// read.  Recognised fields are committed as they are found, so a failed
    /// outcome may still have changed the state.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use brainwave_core::{PacketDecoder, SensorState};
    ///
    /// let mut state = SensorState::new();
    /// let outcome = PacketDecoder::new().decode(&[0x02, 0x00, 0x04, 0x3C], &mut state);
    /// assert!(outcome.is_success());
    /// assert_eq!(state.signal_quality(), 0);
    /// assert_eq!(state.attention(), 60);
    /// ```
    pub fn decode(&self, payload: &[u8], state: &mut SensorState) -> DecodeOutcome {
        state.reset_power();

        let mut outcome = DecodeOutcome::default();
        let mut cursor = 0;

        while cursor < payload.len() {
            let id = payload[cursor];
            let step = match id {
                field_id::SIGNAL_QUALITY => {
                    read_value(payload, cursor, 1, 1).map(|v| state.set_signal_quality(v[0]))
                }
                field_id::ATTENTION => {
                    read_value(payload, cursor, 1, 1).map(|v| state.set_attention(v[0]))
                }
                field_id::MEDITATION => {
                    read_value(payload, cursor, 1, 1).map(|v| state.set_meditation(v[0]))
                }
                field_id::RAW_WAVE => read_value(payload, cursor, 2, 2).map(|v| {
                    outcome.raw_sample = Some(i16::from_be_bytes([v[0], v[1]]));
                }),
                field_id::EEG_POWER => {
                    read_value(payload, cursor, 2, POWER_BAND_COUNT * BAND_VALUE_LEN)
                        .map(|v| state.set_power_bands(read_bands(v)))
                }
                _ => {
                    debug!(id, offset = cursor, "unknown field id");
                    outcome
                        .error
                        .get_or_insert(DecodeError::UnknownFieldId { id, offset: cursor });
                    cursor += 1;
                    continue;
                }
            };

            match step {
                Ok(()) => {
                    outcome.fields += 1;
                    cursor += field_len(id);
                }
                Err(err) => {
                    debug!(%err, "truncated field ends decode");
                    outcome.error.get_or_insert(err);
                    break;
                }
            }
        }

        outcome
    }
}

/// Total bytes a recognised field occupies, identifier included.
fn field_len(id: u8) -> usize {
    match id {
        field_id::RAW_WAVE => 1 + 1 + 2,
        field_id::EEG_POWER => 1 + 1 + POWER_BAND_COUNT * BAND_VALUE_LEN,
        _ => 1 + 1,
    }
}

/// Borrows `len` value bytes that start `skip` bytes after the identifier
/// at `offset`.
///
/// On truncation `needed` and `available` both count the bytes after the
/// identifier.
fn read_value(payload: &[u8], offset: usize, skip: usize, len: usize) -> Result<&[u8], DecodeError> {
    let start = offset + skip;
    payload
        .get(start..start + len)
        .ok_or(DecodeError::TruncatedField {
            id: payload[offset],
            offset,
            needed: skip - 1 + len,
            available: payload.len() - offset - 1,
        })
}

/// Reads eight 24-bit big-endian values in wire order.
fn read_bands(value: &[u8]) -> PowerBands {
    let mut bands = PowerBands::default();
    for (band, chunk) in PowerBand::ALL.iter().zip(value.chunks_exact(BAND_VALUE_LEN)) {
        let v = (u32::from(chunk[0]) << 16) | (u32::from(chunk[1]) << 8) | u32::from(chunk[2]);
        bands.set(*band, v);
    }
    bands
}

// ── Tests ─────────────────────────────────────────────────────────────────────
