//! Rendering of sensor readings for the console.

use brainwave_core::SensorState;
use serde::{Deserialize, Serialize};

/// Output format for printed readings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// `quality,attention,meditation[,delta,...,mid_gamma]`
    #[default]
    Csv,
    /// One JSON object per line.
    Json,
    /// A multi-line block with named fields.
    Debug,
}

/// Renders `state` in `format`, without a trailing newline.
///
/// `checksum` is the checksum byte of the frame that produced the reading;
/// only the debug block shows it.
///
/// # Errors
///
/// Returns a `serde_json` error if JSON serialisation fails.
pub fn render(
    state: &SensorState,
    checksum: Option<u8>,
    format: OutputFormat,
) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Csv => Ok(state.to_csv()),
        OutputFormat::Json => serde_json::to_string(state),
        OutputFormat::Debug => Ok(render_debug(state, checksum)),
    }
}

fn render_debug(state: &SensorState, checksum: Option<u8>) -> String {
    let mut lines = vec![
        "--- Start Packet ---".to_string(),
        format!("Signal Quality: {}", state.signal_quality()),
        format!("Attention: {}", state.attention()),
        format!("Meditation: {}", state.meditation()),
    ];
    if state.has_power() {
        lines.push("EEG POWER:".to_string());
        for (band, value) in state.power_bands().iter() {
            lines.push(format!("{}: {value}", band.label()));
        }
    }
    if let Some(checksum) = checksum {
        // Both lines agree: a frame only yields a reading once they match.
        lines.push(format!("Checksum Calculated: {checksum}"));
        lines.push(format!("Checksum Expected: {checksum}"));
    }
    lines.push("--- End Packet ---".to_string());
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use brainwave_core::{encode_frame, Headset, MemorySource, PollOutcome};

    /// Decodes one frame built from `payload` and returns the resulting state.
    fn state_from(payload: &[u8]) -> SensorState {
        decode(payload).0
    }

    /// Like [`state_from`], also returning the frame's checksum.
    fn decode(payload: &[u8]) -> (SensorState, Option<u8>) {
        let mut headset = Headset::new(MemorySource::new(encode_frame(payload).unwrap()));
        while headset.poll().unwrap() != PollOutcome::NoData {}
        (headset.state().clone(), headset.last_checksum())
    }

    fn with_power() -> SensorState {
        let mut payload = vec![0x02, 0x00, 0x83, 24];
        for v in 1u32..=8 {
            payload.extend_from_slice(&v.to_be_bytes()[1..]);
        }
        state_from(&payload)
    }

    #[test]
    fn test_csv_matches_sensor_state() {
        let state = state_from(&[0x02, 0x1A, 0x04, 0x30, 0x05, 0x40]);

        assert_eq!(render(&state, Some(0x00), OutputFormat::Csv).unwrap(), "26,48,64");
    }

    #[test]
    fn test_json_names_every_field() {
        // Arrange
        let state = with_power();

        // Act
        let json = render(&state, Some(0x00), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        // Assert
        assert_eq!(value["signal_quality"], 0);
        assert_eq!(value["has_power"], true);
        assert_eq!(value["power_bands"]["delta"], 1);
        assert_eq!(value["power_bands"]["mid_gamma"], 8);
    }

    #[test]
    fn test_debug_block_lists_bands_only_with_power() {
        let without = render(&SensorState::new(), None, OutputFormat::Debug).unwrap();
        let with = render(&with_power(), None, OutputFormat::Debug).unwrap();

        assert!(without.starts_with("--- Start Packet ---"));
        assert!(without.ends_with("--- End Packet ---"));
        assert!(!without.contains("EEG POWER"));
        assert!(with.contains("EEG POWER:"));
        assert!(with.contains("Low Alpha: 3"));
        assert!(with.contains("Mid Gamma: 8"));
    }

    #[test]
    fn test_debug_block_shows_frame_checksum() {
        // Arrange – 0x02 + 0xC8 + 0x04 + 0x64 + 0x05 + 0x32 = 0x169, so 0x96 (150)
        let (state, checksum) = decode(&[0x02, 0xC8, 0x04, 0x64, 0x05, 0x32]);

        // Act
        let block = render(&state, checksum, OutputFormat::Debug).unwrap();

        // Assert
        let lines: Vec<&str> = block.lines().collect();
        assert_eq!(
            lines,
            vec![
                "--- Start Packet ---",
                "Signal Quality: 200",
                "Attention: 100",
                "Meditation: 50",
                "Checksum Calculated: 150",
                "Checksum Expected: 150",
                "--- End Packet ---",
            ]
        );
    }

    #[test]
    fn test_checksum_only_appears_in_debug_block() {
        let (state, checksum) = decode(&[0x04, 0x10]);

        let csv = render(&state, checksum, OutputFormat::Csv).unwrap();
        let json = render(&state, checksum, OutputFormat::Json).unwrap();

        assert_eq!(csv, "200,16,0");
        assert!(!json.contains("checksum"));
    }
}
