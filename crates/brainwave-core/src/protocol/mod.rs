//! Protocol module: frame assembly and payload decoding.

pub mod frame;
pub mod packet;

pub use frame::{
    checksum, encode_frame, AssemblerState, FrameAssembler, FrameError, MAX_PAYLOAD_LEN, SYNC_BYTE,
};
pub use packet::{field_id, DecodeError, DecodeOutcome, PacketDecoder};
