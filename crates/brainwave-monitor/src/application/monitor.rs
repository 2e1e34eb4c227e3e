//! Monitor use case: drive a headset and print every fresh reading.
//!
//! # How the loop works (for beginners)
//!
//! [`run_monitor`] calls [`Headset::poll`] over and over.  Each call reads at
//! most one byte, so the loop is the only place that decides *when* to wait:
//!
//! ```text
//!  poll() ──► NoData        → sleep `idle_interval`, try again
//!         ──► Consumed      → keep going (mid-frame)
//!         ──► FreshReading  → render + print (unless filtered)
//!         ──► Rejected(e)   → warn!, count it, optionally print "Error: e"
//!         ──► Err(Closed)   → stop: the stream has ended
//!         ──► Err(other)    → return MonitorError::Source
//! ```
//!
//! Between polls the loop checks a shared `AtomicBool`; `main.rs` clears it
//! on Ctrl-C so the loop can stop cleanly and report its statistics.

use std::collections::BTreeMap;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use brainwave_core::{ByteSource, ErrorKind, Headset, PollOutcome, SourceError};
use thiserror::Error;
use tracing::{debug, warn};

use crate::application::output::{render, OutputFormat};

/// Runtime knobs for [`run_monitor`], usually built from `AppConfig`.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorSettings {
    pub format: OutputFormat,
    /// Print only readings whose frame carried EEG power values.
    pub only_with_power: bool,
    /// Echo each rejected frame to the error writer as `Error: <message>`.
    pub print_errors: bool,
    /// How long to sleep when the source has nothing to read.
    pub idle_interval: Duration,
    /// Stop after this many printed readings.
    pub max_readings: Option<u64>,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            only_with_power: false,
            print_errors: true,
            idle_interval: Duration::from_millis(10),
            max_readings: None,
        }
    }
}

/// Counters collected while the monitor runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonitorStats {
    /// Bytes read from the source.
    pub bytes_consumed: u64,
    /// Frames that decoded successfully.
    pub readings: u64,
    /// Readings that passed the filter and were written out.
    pub printed: u64,
    /// Rejected frames, by error kind.
    pub rejected: BTreeMap<ErrorKind, u64>,
}

impl MonitorStats {
    /// Total rejected frames across all kinds.
    pub fn total_rejected(&self) -> u64 {
        self.rejected.values().sum()
    }
}

/// Why [`run_monitor`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The byte source reported end-of-stream.
    SourceClosed,
    /// `max_readings` readings were printed.
    ReadingLimit,
    /// The running flag was cleared.
    Shutdown,
}

/// Summary returned when the loop stops normally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorReport {
    pub stop: StopReason,
    pub stats: MonitorStats,
}

/// Failures that end the monitor loop early.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("byte source failed: {0}")]
    Source(#[from] SourceError),

    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),

    #[error("failed to format reading: {0}")]
    Format(#[from] serde_json::Error),
}

/// Polls `headset` until the source closes, the reading limit is reached,
/// or `running` is cleared.
///
/// Readings go to `out`, one per line (the debug format spans several
/// lines).  Rejected frames go to `err_out` when `settings.print_errors` is
/// set, and are always logged at `warn` level.
///
/// # Errors
///
/// Returns [`MonitorError`] if the source fails with anything other than
/// end-of-stream, or if writing a reading fails.
pub fn run_monitor<S, W, E>(
    headset: &mut Headset<S>,
    settings: &MonitorSettings,
    out: &mut W,
    err_out: &mut E,
    running: &AtomicBool,
) -> Result<MonitorReport, MonitorError>
where
    S: ByteSource,
    W: Write,
    E: Write,
{
    let mut stats = MonitorStats::default();

    let stop = loop {
        if !running.load(Ordering::SeqCst) {
            break StopReason::Shutdown;
        }
        if settings.max_readings.is_some_and(|max| stats.printed >= max) {
            break StopReason::ReadingLimit;
        }

        let outcome = match headset.poll() {
            Ok(outcome) => outcome,
            Err(SourceError::Closed) => break StopReason::SourceClosed,
            Err(e) => return Err(e.into()),
        };

        match outcome {
            PollOutcome::NoData => {
                std::thread::sleep(settings.idle_interval);
                continue;
            }
            PollOutcome::Consumed => {}
            PollOutcome::FreshReading => {
                stats.readings += 1;
                let state = headset.state();
                if settings.only_with_power && !state.has_power() {
                    debug!("skipping reading without power values");
                } else {
                    let text = render(state, headset.last_checksum(), settings.format)?;
                    writeln!(out, "{text}")?;
                    out.flush()?;
                    stats.printed += 1;
                }
            }
            PollOutcome::Rejected(err) => {
                let kind = err.kind();
                warn!(kind = kind.as_str(), error = %err, "frame rejected");
                *stats.rejected.entry(kind).or_insert(0) += 1;
                if settings.print_errors {
                    writeln!(err_out, "Error: {err}")?;
                }
            }
        }
        stats.bytes_consumed += 1;
    };

    debug!(?stop, bytes = stats.bytes_consumed, "monitor loop stopped");
    Ok(MonitorReport { stop, stats })
}

#[cfg(test)]
mod tests {
    use super::*;
    use brainwave_core::{encode_frame, MemorySource};

    fn frame(payload: &[u8]) -> Vec<u8> {
        encode_frame(payload).unwrap()
    }

    fn power_payload() -> Vec<u8> {
        let mut payload = vec![0x02, 0x00, 0x83, 24];
        for v in 10u32..18 {
            payload.extend_from_slice(&v.to_be_bytes()[1..]);
        }
        payload
    }

    /// Runs the monitor over a finite stream and returns (report, stdout, stderr).
    fn run(bytes: Vec<u8>, settings: &MonitorSettings) -> (MonitorReport, String, String) {
        let mut headset = Headset::new(MemorySource::finite(bytes));
        let mut out = Vec::new();
        let mut err = Vec::new();
        let running = AtomicBool::new(true);

        let report = run_monitor(&mut headset, settings, &mut out, &mut err, &running).unwrap();

        (
            report,
            String::from_utf8(out).unwrap(),
            String::from_utf8(err).unwrap(),
        )
    }

    #[test]
    fn test_prints_one_csv_line_per_reading() {
        // Arrange
        let mut bytes = frame(&[0x02, 0x00, 0x04, 0x30]);
        bytes.extend(frame(&[0x05, 0x40]));

        // Act
        let (report, out, err) = run(bytes, &MonitorSettings::default());

        // Assert
        assert_eq!(out, "0,48,0\n0,48,64\n");
        assert!(err.is_empty());
        assert_eq!(report.stop, StopReason::SourceClosed);
        assert_eq!(report.stats.readings, 2);
        assert_eq!(report.stats.printed, 2);
    }

    #[test]
    fn test_rejected_frame_is_counted_and_echoed() {
        // Arrange: corrupt the checksum of the first frame.
        let mut bytes = frame(&[0x04, 0x10]);
        let last = bytes.len() - 1;
        bytes[last] ^= 0x01;
        bytes.extend(frame(&[0x04, 0x20]));

        // Act
        let (report, out, err) = run(bytes, &MonitorSettings::default());

        // Assert
        assert_eq!(out, "200,32,0\n");
        assert!(err.starts_with("Error: checksum mismatch"));
        assert_eq!(report.stats.total_rejected(), 1);
        assert_eq!(report.stats.rejected.get(&ErrorKind::ChecksumMismatch), Some(&1));
    }

    #[test]
    fn test_print_errors_off_keeps_error_writer_silent() {
        let bytes = vec![0xAA, 0xAA, 0x21];
        let settings = MonitorSettings {
            print_errors: false,
            ..MonitorSettings::default()
        };

        let (report, _, err) = run(bytes, &settings);

        assert!(err.is_empty());
        assert_eq!(report.stats.rejected.get(&ErrorKind::FrameTooLong), Some(&1));
    }

    #[test]
    fn test_only_with_power_filters_plain_readings() {
        // Arrange
        let mut bytes = frame(&[0x04, 0x30]);
        bytes.extend(frame(&power_payload()));
        let settings = MonitorSettings {
            only_with_power: true,
            ..MonitorSettings::default()
        };

        // Act
        let (report, out, _) = run(bytes, &settings);

        // Assert
        assert_eq!(out, "0,48,0,10,11,12,13,14,15,16,17\n");
        assert_eq!(report.stats.readings, 2);
        assert_eq!(report.stats.printed, 1);
    }

    #[test]
    fn test_reading_limit_stops_before_the_stream_ends() {
        let mut bytes = Vec::new();
        for attention in 1..=5u8 {
            bytes.extend(frame(&[0x04, attention]));
        }
        let settings = MonitorSettings {
            max_readings: Some(2),
            ..MonitorSettings::default()
        };

        let (report, out, _) = run(bytes, &settings);

        assert_eq!(report.stop, StopReason::ReadingLimit);
        assert_eq!(out.lines().count(), 2);
    }

    #[test]
    fn test_cleared_flag_stops_without_reading() {
        // Arrange
        let mut headset = Headset::new(MemorySource::finite(frame(&[0x04, 0x01])));
        let running = AtomicBool::new(false);

        // Act
        let report = run_monitor(
            &mut headset,
            &MonitorSettings::default(),
            &mut Vec::new(),
            &mut Vec::new(),
            &running,
        )
        .unwrap();

        // Assert
        assert_eq!(report.stop, StopReason::Shutdown);
        assert_eq!(report.stats, MonitorStats::default());
    }

    #[test]
    fn test_counts_every_consumed_byte() {
        let bytes = frame(&[0x04, 0x01]);
        let expected = bytes.len() as u64;

        let (report, _, _) = run(bytes, &MonitorSettings::default());

        assert_eq!(report.stats.bytes_consumed, expected);
    }
}
