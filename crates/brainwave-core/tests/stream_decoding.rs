//! Integration tests for the brainwave-core decoder.
//!
//! These tests push realistic byte streams through the public API: raw-wave
//! frames at the headset's sample rate interleaved with once-a-second
//! summary frames, noise, and corrupted frames.

use brainwave_core::{
    encode_frame, protocol::frame::checksum, AssemblerState, ErrorKind, FrameError, Headset,
    MemorySource, PollOutcome, PowerBand, ReadingError, SensorState, SourceError,
};

/// A 32-byte summary frame: quality, power bands, attention, meditation.
fn summary_payload(quality: u8, bands: [u32; 8], attention: u8, meditation: u8) -> Vec<u8> {
    let mut payload = vec![0x02, quality, 0x83, 24];
    for v in bands {
        payload.extend_from_slice(&v.to_be_bytes()[1..]);
    }
    payload.extend_from_slice(&[0x04, attention, 0x05, meditation]);
    payload
}

fn raw_frame(sample: i16) -> Vec<u8> {
    let [hi, lo] = sample.to_be_bytes();
    encode_frame(&[0x80, 0x02, hi, lo]).expect("raw frame fits")
}

/// Polls a finite source to the end, collecting fresh-reading snapshots and errors.
fn run_to_end(bytes: Vec<u8>) -> (Vec<SensorState>, Vec<ErrorKind>) {
    let mut headset = Headset::new(MemorySource::finite(bytes));
    let mut readings = Vec::new();
    let mut errors = Vec::new();
    loop {
        match headset.poll() {
            Ok(PollOutcome::FreshReading) => readings.push(headset.state().clone()),
            Ok(PollOutcome::Rejected(e)) => errors.push(e.kind()),
            Ok(_) => {}
            Err(SourceError::Closed) => return (readings, errors),
            Err(e) => panic!("unexpected source error: {e}"),
        }
    }
}

#[test]
fn test_summary_payload_is_maximum_length() {
    let payload = summary_payload(0, [0; 8], 0, 0);
    assert_eq!(payload.len(), 32);
}

#[test]
fn test_one_second_of_stream_yields_every_frame() {
    // Arrange – 512 raw frames then one summary frame
    let mut bytes = Vec::new();
    for i in 0..512 {
        bytes.extend(raw_frame((i % 200) as i16 - 100));
    }
    let bands = [120_000, 80_000, 15_000, 12_000, 9_000, 7_000, 3_000, 1_500];
    bytes.extend(encode_frame(&summary_payload(0, bands, 57, 43)).unwrap());

    // Act
    let (readings, errors) = run_to_end(bytes);

    // Assert – sample -44 (i = 56, 256, 456) ends on a 0xAA checksum, which
    // pairs with the next frame's first sync byte.  That frame's second sync
    // byte is then rejected as a length, and the frame itself still decodes.
    assert_eq!(errors, vec![ErrorKind::FrameTooLong; 3]);
    assert_eq!(readings.len(), 513);
    assert!(readings[..512].iter().all(|r| !r.has_power()));
    let last = readings.last().unwrap();
    assert!(last.has_power());
    assert_eq!(last.power_bands()[PowerBand::Delta], 120_000);
    assert_eq!(last.power_bands()[PowerBand::MidGamma], 1_500);
    assert_eq!(last.attention(), 57);
    assert_eq!(last.meditation(), 43);
    assert_eq!(
        last.to_csv(),
        "0,57,43,120000,80000,15000,12000,9000,7000,3000,1500"
    );
}

#[test]
fn test_power_bands_reset_on_following_raw_frame() {
    let mut bytes = encode_frame(&summary_payload(0, [5; 8], 1, 2)).unwrap();
    bytes.extend(raw_frame(0));

    let (readings, _) = run_to_end(bytes);

    assert_eq!(readings.len(), 2);
    assert!(readings[0].has_power());
    assert!(!readings[1].has_power());
    assert_eq!(readings[1].delta(), 0);
    // Scalars survive a frame that omits them.
    assert_eq!(readings[1].attention(), 1);
}

#[test]
fn test_stream_recovers_after_each_kind_of_error() {
    // Arrange
    let good = encode_frame(&[0x04, 0x21]).unwrap();
    let mut corrupt = encode_frame(&[0x04, 0x22]).unwrap();
    corrupt[4] = 0x23;
    let unknown = encode_frame(&[0x04, 0x24, 0x33]).unwrap();

    let mut bytes = vec![0x10, 0x20, 0xAA, 0x30]; // noise
    bytes.extend_from_slice(&good);
    bytes.extend_from_slice(&[0xAA, 0xAA, 0x40]); // too long
    bytes.extend_from_slice(&corrupt);
    bytes.extend_from_slice(&unknown);
    bytes.extend(encode_frame(&[0x04, 0x25]).unwrap());

    // Act
    let (readings, errors) = run_to_end(bytes);

    // Assert
    assert_eq!(
        errors,
        vec![
            ErrorKind::FrameTooLong,
            ErrorKind::ChecksumMismatch,
            ErrorKind::UnknownFieldId
        ]
    );
    let attention: Vec<u8> = readings.iter().map(SensorState::attention).collect();
    assert_eq!(attention, vec![0x21, 0x25]);
}

#[test]
fn test_checksum_covers_every_payload_byte() {
    // Arrange – 0x02 + 0xC8 + 0x04 + 0x64 + 0x05 + 0x32 = 0x169
    let payload = [0x02, 0xC8, 0x04, 0x64, 0x05, 0x32];
    assert_eq!(checksum(&payload), 0x96);
    let mut bytes = vec![0xAA, 0xAA, 6];
    bytes.extend_from_slice(&payload);
    bytes.push(0x96);

    // Act
    let (readings, errors) = run_to_end(bytes);

    // Assert
    assert!(errors.is_empty());
    assert_eq!(readings.len(), 1);
    assert_eq!(readings[0].to_csv(), "200,100,50");
}

#[test]
fn test_checksum_over_values_only_is_rejected() {
    // 0xC8 + 0x64 + 0x32 = 0x15E gives 0xA1 (161), which skips the identifiers.
    let bytes = [0xAA, 0xAA, 6, 0x02, 0xC8, 0x04, 0x64, 0x05, 0x32, 161];

    let mut headset = Headset::new(MemorySource::finite(bytes));
    let mut outcomes = Vec::new();
    while let Ok(outcome) = headset.poll() {
        if outcome != PollOutcome::Consumed {
            outcomes.push(outcome);
        }
    }

    assert_eq!(
        outcomes,
        vec![PollOutcome::Rejected(ReadingError::Frame(
            FrameError::ChecksumMismatch {
                expected: 0x96,
                actual: 161
            }
        ))]
    );
    assert_eq!(headset.state(), &SensorState::new());
}

#[test]
fn test_frame_with_sync_valued_checksum_costs_the_next_frame_its_sync() {
    // Arrange – raw sample -44: 0x80 + 0x02 + 0xFF + 0xD4 = 0x255, checksum 0xAA
    let first = raw_frame(-44);
    assert_eq!(first.last(), Some(&0xAA));
    let mut bytes = first;
    bytes.extend(encode_frame(&[0x04, 0x30]).unwrap());

    // Act
    let (readings, errors) = run_to_end(bytes);

    // Assert – the checksum and the next 0xAA form a sync pair, the second
    // 0xAA is read as an oversized length, then re-syncs the real frame.
    assert_eq!(errors, vec![ErrorKind::FrameTooLong]);
    assert_eq!(readings.len(), 2);
    assert_eq!(readings[1].attention(), 0x30);
}

#[test]
fn test_every_single_byte_corruption_is_detected() {
    // Flipping any one payload bit without fixing the checksum must be caught.
    let payload = summary_payload(30, [1, 2, 3, 4, 5, 6, 7, 8], 60, 70);
    let clean = encode_frame(&payload).unwrap();

    for index in 3..3 + payload.len() {
        for bit in 0..8 {
            let mut bytes = clean.clone();
            bytes[index] ^= 1 << bit;

            let (readings, errors) = run_to_end(bytes);

            assert!(readings.is_empty(), "corruption at {index}/{bit} was accepted");
            assert_eq!(errors, vec![ErrorKind::ChecksumMismatch]);
        }
    }
}

#[test]
fn test_long_noise_run_stays_searching() {
    // A deterministic pseudo-random stream with every 0xAA pair broken up.
    let mut bytes = Vec::with_capacity(10_000);
    let mut x: u32 = 0x1234_5678;
    let mut last = 0u8;
    for _ in 0..10_000 {
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        let mut b = (x & 0xFF) as u8;
        if b == 0xAA && last == 0xAA {
            b = 0x00;
        }
        bytes.push(b);
        last = b;
    }
    let mut headset = Headset::new(MemorySource::new(bytes));

    while headset.poll().unwrap() != PollOutcome::NoData {
        assert_eq!(headset.assembler_state(), AssemblerState::Searching);
    }
    assert_eq!(headset.state(), &SensorState::new());
}
