//! The polling front end: one byte in, at most one reading out.
//!
//! [`Headset`] ties together a [`ByteSource`], a [`FrameAssembler`], a
//! [`PacketDecoder`], and the [`SensorState`] they maintain.  It is strictly
//! single-owner and synchronous: each call to [`Headset::poll`] reads at most
//! one byte and advances the assembler exactly one step.
//!
//! # Typical loop
//!
//! ```rust
//! use brainwave_core::{encode_frame, Headset, MemorySource, PollOutcome};
//!
//! let bytes = encode_frame(&[0x02, 0x00, 0x04, 0x4B]).unwrap();
//! let mut headset = Headset::new(MemorySource::new(bytes));
//!
//! let mut readings = 0;
//! loop {
//!     match headset.poll().unwrap() {
//!         PollOutcome::NoData => break,
//!         PollOutcome::FreshReading => readings += 1,
//!         _ => {}
//!     }
//! }
//! assert_eq!(readings, 1);
//! assert_eq!(headset.state().attention(), 0x4B);
//! ```

use tracing::trace;

use crate::domain::sensor_state::SensorState;
use crate::error::ReadingError;
use crate::protocol::frame::{checksum, AssemblerState, FrameAssembler};
use crate::protocol::packet::PacketDecoder;
use crate::source::{ByteSource, SourceError};

/// What a single [`Headset::poll`] call did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// The source had nothing to read; nothing changed.
    NoData,
    /// One byte was consumed without completing a frame.
    Consumed,
    /// A frame was validated and decoded; the state holds a new reading.
    FreshReading,
    /// A frame was abandoned or failed to decode.
    Rejected(ReadingError),
}

impl PollOutcome {
    pub fn is_fresh(&self) -> bool {
        matches!(self, PollOutcome::FreshReading)
    }
}

/// Decodes a headset's byte stream into a continuously updated reading.
pub struct Headset<S> {
    source: S,
    assembler: FrameAssembler,
    decoder: PacketDecoder,
    state: SensorState,
    /// Most recent reading error; overwritten, never queued.
    last_error: Option<ReadingError>,
    /// Set on a successful decode, taken by the same `poll` that reports it.
    fresh_reading: bool,
    last_raw_sample: Option<i16>,
    /// Checksum byte of the most recent frame that passed validation.
    last_checksum: Option<u8>,
}

impl<S: ByteSource> Headset<S> {
    /// Wraps `source` with a fresh assembler and the power-on sensor state.
    pub fn new(source: S) -> Self {
        Self {
            source,
            assembler: FrameAssembler::new(),
            decoder: PacketDecoder::new(),
            state: SensorState::new(),
            last_error: None,
            fresh_reading: false,
            last_raw_sample: None,
            last_checksum: None,
        }
    }

    /// Consumes at most one byte and advances the frame state machine.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] when the source cannot be queried or read.
    /// The assembler is left exactly as it was before the call.
    pub fn poll(&mut self) -> Result<PollOutcome, SourceError> {
        if self.source.bytes_available()? == 0 {
            return Ok(PollOutcome::NoData);
        }
        let byte = self.source.read_byte()?;

        let rejected = match self.assembler.push(byte) {
            None => None,
            Some(Ok(payload)) => {
                self.last_checksum = Some(checksum(payload));
                let outcome = self.decoder.decode(payload, &mut self.state);
                if outcome.raw_sample.is_some() {
                    self.last_raw_sample = outcome.raw_sample;
                }
                match outcome.error {
                    None => {
                        trace!(fields = outcome.fields, "frame decoded");
                        self.fresh_reading = true;
                        None
                    }
                    Some(err) => Some(ReadingError::from(err)),
                }
            }
            Some(Err(err)) => Some(ReadingError::from(err)),
        };

        if let Some(err) = rejected {
            self.last_error = Some(err.clone());
            return Ok(PollOutcome::Rejected(err));
        }
        if std::mem::take(&mut self.fresh_reading) {
            return Ok(PollOutcome::FreshReading);
        }
        Ok(PollOutcome::Consumed)
    }

    // ── Accessors ─────────────────────────────────────────────────────────────

    /// The current reading.
    pub fn state(&self) -> &SensorState {
        &self.state
    }

    pub fn signal_quality(&self) -> u8 {
        self.state.signal_quality()
    }

    pub fn attention(&self) -> u8 {
        self.state.attention()
    }

    pub fn meditation(&self) -> u8 {
        self.state.meditation()
    }

    /// CSV rendering of the current reading, see [`SensorState::to_csv`].
    pub fn to_csv(&self) -> String {
        self.state.to_csv()
    }

    /// Most recent raw sample seen in a validated frame.
    pub fn last_raw_sample(&self) -> Option<i16> {
        self.last_raw_sample
    }

    /// Checksum of the most recent validated frame.  The received byte and
    /// the one computed over the payload are equal for every such frame.
    pub fn last_checksum(&self) -> Option<u8> {
        self.last_checksum
    }

    /// Most recent reading error, if any has occurred since the last clear.
    pub fn last_error(&self) -> Option<&ReadingError> {
        self.last_error.as_ref()
    }

    /// The last error as text, or an empty string if there is none.
    pub fn last_error_message(&self) -> String {
        self.last_error
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default()
    }

    pub fn clear_last_error(&mut self) {
        self.last_error = None;
    }

    /// Where the frame assembler currently is.
    pub fn assembler_state(&self) -> AssemblerState {
        self.assembler.state()
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn into_source(self) -> S {
        self.source
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
