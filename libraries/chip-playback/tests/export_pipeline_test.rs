//! End-to-end export pipeline tests
//!
//! A scripted engine renders known amplitudes, so output files can be
//! checked sample-for-sample with an independent WAV parser.

use chip_core::{SequenceEngine, SongAddress};
use chip_playback::test_utils::ScriptedEngine;
use chip_playback::{ExportConfig, ExportEvent, ExportItem, Exporter, JobOutcome};
use std::time::Duration;
use tempfile::TempDir;

const SAMPLE_RATE: u32 = 1000;
const SAMPLES_PER_PERIOD: usize = 10;
const TRACKS: usize = 2;
const PERIODS: usize = 5;

fn scripted_engine() -> ScriptedEngine {
    ScriptedEngine::new(SAMPLE_RATE, SAMPLES_PER_PERIOD, TRACKS, PERIODS)
}

fn pcm(amplitude: f32) -> i16 {
    (amplitude * 32767.0) as i16
}

fn read_pairs(path: &std::path::Path) -> (hound::WavSpec, Vec<(i16, i16)>) {
    let mut reader = hound::WavReader::open(path).unwrap();
    let spec = reader.spec();
    let samples: Vec<i16> = reader.samples::<i16>().map(Result::unwrap).collect();
    let pairs = samples.chunks_exact(2).map(|c| (c[0], c[1])).collect();
    (spec, pairs)
}

#[test]
fn combined_export_padding_and_mix() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("song.wav");

    let config = ExportConfig {
        pad_start_secs: 0.1,
        pad_end_secs: 0.05,
    };
    let jobs = vec![ExportItem {
        output_path: path.clone(),
        song_address: SongAddress(0x200),
        split_tracks: false,
    }];

    let summary = Exporter::spawn(scripted_engine(), jobs, config).finish();
    assert!(!summary.cancelled);
    assert_eq!(summary.jobs.len(), 1);
    assert_eq!(summary.jobs[0].outcome, JobOutcome::Finished);

    let pad_start = 100; // 0.1 s at 1 kHz
    let pad_end = 50;
    let rendered = PERIODS * SAMPLES_PER_PERIOD;

    let (spec, pairs) = read_pairs(&path);
    assert_eq!(spec.channels, 2);
    assert_eq!(spec.sample_rate, SAMPLE_RATE);
    assert_eq!(pairs.len(), pad_start + rendered + pad_end);

    // Tracks convert to PCM16 individually before summing
    let mixed = pcm(ScriptedEngine::track_amplitude(0)) + pcm(ScriptedEngine::track_amplitude(1));

    assert!(pairs[..pad_start].iter().all(|p| *p == (0, 0)));
    assert!(pairs[pad_start..pad_start + rendered]
        .iter()
        .all(|p| *p == (mixed, -mixed)));
    assert!(pairs[pad_start + rendered..].iter().all(|p| *p == (0, 0)));
}

#[test]
fn split_export_one_file_per_track() {
    let dir = TempDir::new().unwrap();
    let stems = dir.path().join("stems");

    let jobs = vec![ExportItem {
        output_path: stems.clone(),
        song_address: SongAddress(0x200),
        split_tracks: true,
    }];

    let summary = Exporter::spawn(scripted_engine(), jobs, ExportConfig::default()).finish();
    assert_eq!(summary.jobs.len(), 1);
    assert_eq!(summary.jobs[0].outcome, JobOutcome::Finished);

    let rendered = PERIODS * SAMPLES_PER_PERIOD;
    for track in 0..TRACKS {
        let path = stems.join(format!("{track:04}.wav"));
        let (spec, pairs) = read_pairs(&path);
        assert_eq!(spec.channels, 2);
        assert_eq!(pairs.len(), rendered);

        let level = pcm(ScriptedEngine::track_amplitude(track));
        assert!(pairs.iter().all(|p| *p == (level, -level)));
    }
}

#[test]
fn export_includes_muted_tracks() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("muted.wav");

    let mut engine = scripted_engine();
    engine.set_track_muted(1, true);

    let jobs = vec![ExportItem {
        output_path: path.clone(),
        song_address: SongAddress(0x200),
        split_tracks: false,
    }];
    let summary = Exporter::spawn(engine, jobs, ExportConfig::default()).finish();
    assert_eq!(summary.jobs[0].outcome, JobOutcome::Finished);

    // Mute only affects live monitoring; the export still carries the mix
    let mixed = pcm(ScriptedEngine::track_amplitude(0)) + pcm(ScriptedEngine::track_amplitude(1));
    let (_, pairs) = read_pairs(&path);
    assert!(pairs.iter().all(|p| *p == (mixed, -mixed)));
}

#[test]
fn failed_job_does_not_stop_the_queue() {
    let dir = TempDir::new().unwrap();
    let first = dir.path().join("first.wav");
    let unwritable = dir.path().join("missing-dir").join("second.wav");
    let third = dir.path().join("third.wav");

    let jobs = vec![
        ExportItem {
            output_path: first.clone(),
            song_address: SongAddress(0x200),
            split_tracks: false,
        },
        ExportItem {
            output_path: unwritable.clone(),
            song_address: SongAddress(0x200),
            split_tracks: false,
        },
        ExportItem {
            output_path: third.clone(),
            song_address: SongAddress(0x200),
            split_tracks: false,
        },
    ];

    let summary = Exporter::spawn(scripted_engine(), jobs, ExportConfig::default()).finish();
    assert!(!summary.cancelled);
    assert_eq!(summary.jobs.len(), 3);
    assert_eq!(summary.jobs[0].outcome, JobOutcome::Finished);
    assert!(matches!(summary.jobs[1].outcome, JobOutcome::Failed(_)));
    assert_eq!(summary.jobs[2].outcome, JobOutcome::Finished);

    assert!(first.exists());
    assert!(!unwritable.exists());
    assert!(third.exists());
}

#[test]
fn split_job_fails_when_directory_cannot_be_created() {
    let dir = TempDir::new().unwrap();
    // A file where the job needs a directory
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, b"not a directory").unwrap();

    let jobs = vec![ExportItem {
        output_path: blocker.join("stems"),
        song_address: SongAddress(0x200),
        split_tracks: true,
    }];
    let summary = Exporter::spawn(scripted_engine(), jobs, ExportConfig::default()).finish();
    assert!(matches!(summary.jobs[0].outcome, JobOutcome::Failed(_)));
}

#[test]
fn invalid_song_address_fails_the_job() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad-song.wav");

    let engine = scripted_engine().with_invalid_address(SongAddress(0xDEAD));
    let jobs = vec![ExportItem {
        output_path: path.clone(),
        song_address: SongAddress(0xDEAD),
        split_tracks: false,
    }];
    let summary = Exporter::spawn(engine, jobs, ExportConfig::default()).finish();
    assert!(matches!(summary.jobs[0].outcome, JobOutcome::Failed(_)));
    // The job failed before any writer was opened
    assert!(!path.exists());
}

#[test]
fn cancellation_stops_before_next_job() {
    let dir = TempDir::new().unwrap();
    let long = dir.path().join("long.wav");
    let second = dir.path().join("second.wav");

    // Effectively endless song so cancellation lands mid-job
    let engine = ScriptedEngine::new(SAMPLE_RATE, SAMPLES_PER_PERIOD, TRACKS, usize::MAX);
    let jobs = vec![
        ExportItem {
            output_path: long.clone(),
            song_address: SongAddress(0x200),
            split_tracks: false,
        },
        ExportItem {
            output_path: second.clone(),
            song_address: SongAddress(0x200),
            split_tracks: false,
        },
    ];

    let exporter = Exporter::spawn(engine, jobs, ExportConfig::default());
    let events = exporter.events();

    // Wait until the first job is rendering, then cancel
    let started = events.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(started, ExportEvent::Started(long.clone()));
    exporter.cancel();

    let summary = exporter.finish();
    assert!(summary.cancelled);
    // The in-flight job gets no report and the second job never starts
    assert!(summary.jobs.is_empty());
    assert!(!second.exists());

    let remaining: Vec<ExportEvent> = events.try_iter().collect();
    assert!(remaining.contains(&ExportEvent::Cancelled));
    assert!(!remaining
        .iter()
        .any(|e| matches!(e, ExportEvent::Started(p) if *p == second)));

    // The partial file was finalized and parses
    let reader = hound::WavReader::open(&long).unwrap();
    assert_eq!(reader.spec().channels, 2);
}

#[test]
fn combined_mix_saturates_instead_of_wrapping() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("hot.wav");

    // 16 tracks of rising amplitude push the PCM sum far past i16::MAX
    let engine = ScriptedEngine::new(SAMPLE_RATE, SAMPLES_PER_PERIOD, 16, 2);
    let jobs = vec![ExportItem {
        output_path: path.clone(),
        song_address: SongAddress(0x200),
        split_tracks: false,
    }];
    let summary = Exporter::spawn(engine, jobs, ExportConfig::default()).finish();
    assert_eq!(summary.jobs[0].outcome, JobOutcome::Finished);

    let (_, pairs) = read_pairs(&path);
    assert!(pairs.iter().all(|p| p.0 == i16::MAX && p.1 == i16::MIN));
}
