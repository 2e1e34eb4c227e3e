//! Domain layer: the sensor reading produced by the decoder.
//!
//! This module has no knowledge of the wire format.  It only describes
//! *what* a reading is; the `protocol` module decides how bytes become one.

pub mod sensor_state;

pub use sensor_state::{PowerBand, PowerBands, SensorState, POWER_BAND_COUNT};
