//! The continuously updated sensor snapshot.
//!
//! # What is in a reading? (for beginners)
//!
//! The headset reports three small scalars and one group of eight numbers:
//!
//! - **Signal quality** – `0` means good skin contact, `200` means the
//!   electrode is not touching anything.  Values in between indicate noise.
//! - **Attention / Meditation** – proprietary "eSense" scores from 0 to 100.
//! - **Power bands** – the relative power in eight EEG frequency ranges,
//!   from Delta (slow waves, deep sleep) up to Mid Gamma.  Each value is a
//!   24-bit unsigned integer on the wire, so it fits comfortably in a `u32`.
//!
//! Not every frame carries every field.  Scalars keep their previous value
//! when a frame omits them; the power bands do not, they are zeroed at the
//! start of every decode so a missing power field is never mistaken for a
//! stale one.

use std::fmt;
use std::ops::Index;

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

/// Number of EEG power bands carried by the power field.
pub const POWER_BAND_COUNT: usize = 8;

/// Signal quality value meaning "no electrode contact".
pub const NO_CONTACT_SIGNAL_QUALITY: u8 = 200;

/// One of the eight EEG frequency bands, in wire order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PowerBand {
    Delta = 0,
    Theta = 1,
    LowAlpha = 2,
    HighAlpha = 3,
    LowBeta = 4,
    HighBeta = 5,
    LowGamma = 6,
    MidGamma = 7,
}

impl PowerBand {
    /// All bands in the order they appear on the wire.
    pub const ALL: [PowerBand; POWER_BAND_COUNT] = [
        PowerBand::Delta,
        PowerBand::Theta,
        PowerBand::LowAlpha,
        PowerBand::HighAlpha,
        PowerBand::LowBeta,
        PowerBand::HighBeta,
        PowerBand::LowGamma,
        PowerBand::MidGamma,
    ];

    /// Human-readable name, e.g. `"Low Alpha"`.
    pub fn label(self) -> &'static str {
        match self {
            PowerBand::Delta => "Delta",
            PowerBand::Theta => "Theta",
            PowerBand::LowAlpha => "Low Alpha",
            PowerBand::HighAlpha => "High Alpha",
            PowerBand::LowBeta => "Low Beta",
            PowerBand::HighBeta => "High Beta",
            PowerBand::LowGamma => "Low Gamma",
            PowerBand::MidGamma => "Mid Gamma",
        }
    }

    /// Machine-friendly name used as the JSON key, e.g. `"low_alpha"`.
    pub fn key(self) -> &'static str {
        match self {
            PowerBand::Delta => "delta",
            PowerBand::Theta => "theta",
            PowerBand::LowAlpha => "low_alpha",
            PowerBand::HighAlpha => "high_alpha",
            PowerBand::LowBeta => "low_beta",
            PowerBand::HighBeta => "high_beta",
            PowerBand::LowGamma => "low_gamma",
            PowerBand::MidGamma => "mid_gamma",
        }
    }
}

/// The eight band power values, indexable by [`PowerBand`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PowerBands([u32; POWER_BAND_COUNT]);

impl PowerBands {
    /// Creates a set of bands from raw values in wire order.
    pub fn new(values: [u32; POWER_BAND_COUNT]) -> Self {
        Self(values)
    }

    /// Returns the values in wire order.
    pub fn as_array(&self) -> &[u32; POWER_BAND_COUNT] {
        &self.0
    }

    /// Returns the value for a single band.
    pub fn get(&self, band: PowerBand) -> u32 {
        self.0[band as usize]
    }

    /// Iterates `(band, value)` pairs in wire order.
    pub fn iter(&self) -> impl Iterator<Item = (PowerBand, u32)> + '_ {
        PowerBand::ALL.iter().map(move |&band| (band, self.0[band as usize]))
    }

    pub(crate) fn set(&mut self, band: PowerBand, value: u32) {
        self.0[band as usize] = value;
    }

    pub(crate) fn clear(&mut self) {
        self.0 = [0; POWER_BAND_COUNT];
    }
}

impl Index<PowerBand> for PowerBands {
    type Output = u32;

    fn index(&self, band: PowerBand) -> &u32 {
        &self.0[band as usize]
    }
}

// Serialised as a map keyed by band name so JSON consumers do not have to
// know the wire order.
impl Serialize for PowerBands {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(POWER_BAND_COUNT))?;
        for (band, value) in self.iter() {
            map.serialize_entry(band.key(), &value)?;
        }
        map.end()
    }
}

/// The externally visible, continuously updated reading.
///
/// Only the packet decoder mutates a `SensorState`; everything else reads it
/// through the accessors below.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SensorState {
    signal_quality: u8,
    attention: u8,
    meditation: u8,
    power_bands: PowerBands,
    has_power: bool,
}

impl SensorState {
    /// Creates the power-on state: no contact, zero scores, zero bands.
    pub fn new() -> Self {
        Self {
            signal_quality: NO_CONTACT_SIGNAL_QUALITY,
            attention: 0,
            meditation: 0,
            power_bands: PowerBands::default(),
            has_power: false,
        }
    }

    pub fn signal_quality(&self) -> u8 {
        self.signal_quality
    }

    pub fn attention(&self) -> u8 {
        self.attention
    }

    pub fn meditation(&self) -> u8 {
        self.meditation
    }

    pub fn power_bands(&self) -> &PowerBands {
        &self.power_bands
    }

    /// `true` only if the most recently decoded frame carried a power field.
    pub fn has_power(&self) -> bool {
        self.has_power
    }

    /// `true` when the electrode reports any contact at all.
    pub fn has_contact(&self) -> bool {
        self.signal_quality < NO_CONTACT_SIGNAL_QUALITY
    }

    pub fn delta(&self) -> u32 {
        self.power_bands[PowerBand::Delta]
    }

    pub fn theta(&self) -> u32 {
        self.power_bands[PowerBand::Theta]
    }

    pub fn low_alpha(&self) -> u32 {
        self.power_bands[PowerBand::LowAlpha]
    }

    pub fn high_alpha(&self) -> u32 {
        self.power_bands[PowerBand::HighAlpha]
    }

    pub fn low_beta(&self) -> u32 {
        self.power_bands[PowerBand::LowBeta]
    }

    pub fn high_beta(&self) -> u32 {
        self.power_bands[PowerBand::HighBeta]
    }

    pub fn low_gamma(&self) -> u32 {
        self.power_bands[PowerBand::LowGamma]
    }

    pub fn mid_gamma(&self) -> u32 {
        self.power_bands[PowerBand::MidGamma]
    }

    /// Renders `"{signal},{attention},{meditation}"`, followed by the eight
    /// band values when the last frame carried them.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use brainwave_core::SensorState;
    ///
    /// let state = SensorState::new();
    /// assert_eq!(state.to_csv(), "200,0,0");
    /// ```
    pub fn to_csv(&self) -> String {
        self.to_string()
    }

    // ── Mutation (decoder only) ───────────────────────────────────────────────

    pub(crate) fn set_signal_quality(&mut self, value: u8) {
        self.signal_quality = value;
    }

    pub(crate) fn set_attention(&mut self, value: u8) {
        self.attention = value;
    }

    pub(crate) fn set_meditation(&mut self, value: u8) {
        self.meditation = value;
    }

    pub(crate) fn set_power_bands(&mut self, bands: PowerBands) {
        self.power_bands = bands;
        self.has_power = true;
    }

    /// Forgets any power values from the previous frame.
    pub(crate) fn reset_power(&mut self) {
        self.power_bands.clear();
        self.has_power = false;
    }
}

impl Default for SensorState {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SensorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.signal_quality, self.attention, self.meditation)?;
        if self.has_power {
            for value in self.power_bands.as_array() {
                write!(f, ",{value}")?;
            }
        }
        Ok(())
    }
}
