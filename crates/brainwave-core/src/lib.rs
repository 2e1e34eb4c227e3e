//! # brainwave-core
//!
//! Decoder for the telemetry stream emitted by a brainwave-sensing headset.
//!
//! This crate is used by the monitor application and by anything else that
//! needs readings out of the headset's byte stream.  It has zero dependencies
//! on OS APIs, serial ports, or sockets: bytes arrive through the
//! [`ByteSource`] trait.
//!
//! # Architecture overview (for beginners)
//!
//! The headset sends a continuous stream of bytes.  Every so often a *frame*
//! appears in that stream:
//!
//! ```text
//! 0xAA 0xAA <len:u8> <payload: len bytes> <checksum:u8>
//! ```
//!
//! Decoding happens bottom-up in three layers:
//!
//! - **`protocol::frame`** – The [`FrameAssembler`], a byte-at-a-time state
//!   machine that hunts for the `0xAA 0xAA` sync pair, buffers the payload,
//!   and checks the trailing checksum.
//!
//! - **`protocol::packet`** – The [`PacketDecoder`], which walks a validated
//!   payload as a list of tagged fields and writes them into the
//!   [`SensorState`].
//!
//! - **`headset`** – The [`Headset`], which owns a byte source, both of the
//!   above, and the current [`SensorState`].  Callers drive it with
//!   [`Headset::poll`], one byte per call.
//!
//! The **`domain`** module holds the reading itself: signal quality,
//! attention, meditation, and eight EEG power bands.

pub mod domain;
pub mod error;
pub mod headset;
pub mod protocol;
pub mod source;

// Re-export the most-used types at the crate root so callers can write
// `brainwave_core::Headset` instead of `brainwave_core::headset::Headset`.
pub use domain::sensor_state::{PowerBand, PowerBands, SensorState};
pub use error::{ErrorKind, ReadingError};
pub use headset::{Headset, PollOutcome};
pub use protocol::frame::{encode_frame, AssemblerState, FrameAssembler, FrameError};
pub use protocol::packet::{DecodeError, DecodeOutcome, PacketDecoder};
pub use source::{ByteSource, MemorySource, SourceError};
