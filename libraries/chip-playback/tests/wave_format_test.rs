//! WAV format conformance for the streaming writer
//!
//! Verifies the deferred-size headers against both raw bytes and an
//! independent parser (hound).

use chip_playback::WaveWriter;
use tempfile::TempDir;

#[test]
fn stereo_round_trip_sizes_and_header() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("out.wav");
    let n: usize = 1000;

    let left: Vec<i16> = (0..n as i16).collect();
    let right: Vec<i16> = (0..n as i16).map(|v| -v).collect();

    let mut writer = WaveWriter::create(&path, 44100, true).unwrap();
    writer.write(&left, &right).unwrap();
    writer.close().unwrap();

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(bytes.len(), 44 + 4 * n);

    // RIFF size = payload + 36, data size = payload
    let riff_size = u32::from_le_bytes(bytes[4..8].try_into().unwrap());
    let data_size = u32::from_le_bytes(bytes[40..44].try_into().unwrap());
    assert_eq!(data_size, (4 * n) as u32);
    assert_eq!(riff_size, (4 * n + 36) as u32);

    // Independent parse
    let mut reader = hound::WavReader::open(&path).unwrap();
    let spec = reader.spec();
    assert_eq!(spec.channels, 2);
    assert_eq!(spec.sample_rate, 44100);
    assert_eq!(spec.bits_per_sample, 16);
    assert_eq!(spec.sample_format, hound::SampleFormat::Int);

    let samples: Vec<i16> = reader.samples::<i16>().map(Result::unwrap).collect();
    assert_eq!(samples.len(), 2 * n);
    for (i, pair) in samples.chunks_exact(2).enumerate() {
        assert_eq!(pair[0], left[i]);
        assert_eq!(pair[1], right[i]);
    }
}

#[test]
fn empty_stream_has_zero_payload() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("empty.wav");

    let mut writer = WaveWriter::create(&path, 48000, true).unwrap();
    writer.close().unwrap();

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(bytes.len(), 44);
    assert_eq!(&bytes[4..8], &36u32.to_le_bytes());
    assert_eq!(&bytes[40..44], &0u32.to_le_bytes());

    let reader = hound::WavReader::open(&path).unwrap();
    assert_eq!(reader.len(), 0);
}

#[test]
fn multiple_writes_accumulate_payload() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("chunks.wav");

    let mut writer = WaveWriter::create(&path, 32768, true).unwrap();
    for _ in 0..10 {
        writer.write(&[1; 64], &[2; 64]).unwrap();
    }
    assert_eq!(writer.payload_bytes(), 10 * 64 * 4);
    writer.close().unwrap();

    let bytes = std::fs::read(&path).unwrap();
    let data_size = u32::from_le_bytes(bytes[40..44].try_into().unwrap());
    assert_eq!(data_size, 10 * 64 * 4);
}

#[test]
fn drop_finalizes_header() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("dropped.wav");

    {
        let mut writer = WaveWriter::create(&path, 44100, true).unwrap();
        writer.write(&[5; 32], &[-5; 32]).unwrap();
        // No explicit close
    }

    let bytes = std::fs::read(&path).unwrap();
    let data_size = u32::from_le_bytes(bytes[40..44].try_into().unwrap());
    assert_eq!(data_size, 32 * 4);
    assert!(hound::WavReader::open(&path).is_ok());
}
