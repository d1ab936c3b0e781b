//! Batch WAV export
//!
//! An [`Exporter`] drains a FIFO queue of [`ExportItem`]s on its own thread,
//! against its own engine instance, so export never contends with live
//! playback. Each job renders one song to completion into one WAV file, or
//! one file per track in split mode. A failed job is reported and the queue
//! moves on; cancellation stops the whole run.

use crate::error::{PlaybackError, Result};
use crate::events::ExportEvent;
use crate::render::{prepare, render_once, ExportSink, RenderSink};
use crate::types::{ExportConfig, ExportItem};
use crate::wave::WaveWriter;
use chip_core::{Frame, SequenceEngine};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::collections::VecDeque;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{error, info, warn};

/// Capacity of the export event channel
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Outcome of one export job
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// All writers were finalized
    Finished,
    /// The job was abandoned; the message describes why
    Failed(String),
}

/// Report for one completed or failed job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobReport {
    /// The job's requested output path
    pub output_path: PathBuf,
    /// What happened
    pub outcome: JobOutcome,
}

/// Result of a whole export run
///
/// Jobs abandoned by cancellation (including the one in flight) get no
/// report; `cancelled` records that the run was cut short.
#[derive(Debug, Clone, Default)]
pub struct ExportSummary {
    /// Per-job outcomes in queue order
    pub jobs: Vec<JobReport>,
    /// Whether cancellation ended the run
    pub cancelled: bool,
}

/// Handle to a running export thread
pub struct Exporter {
    cancel: Arc<AtomicBool>,
    event_rx: Receiver<ExportEvent>,
    handle: Option<JoinHandle<ExportSummary>>,
}

impl Exporter {
    /// Spawn an export thread over `jobs`, processed strictly in order
    ///
    /// The engine is owned by the export thread for the whole run.
    pub fn spawn<E: SequenceEngine + 'static>(
        engine: E,
        jobs: Vec<ExportItem>,
        config: ExportConfig,
    ) -> Self {
        let cancel = Arc::new(AtomicBool::new(false));
        let (event_tx, event_rx) = bounded(EVENT_CHANNEL_CAPACITY);

        let cancel_flag = Arc::clone(&cancel);
        let handle = thread::Builder::new()
            .name("chip-export".into())
            .spawn(move || run_queue(engine, jobs.into(), &config, &cancel_flag, &event_tx))
            .expect("failed to spawn export thread");

        Self {
            cancel,
            event_rx,
            handle: Some(handle),
        }
    }

    /// Receiver for export progress events
    pub fn events(&self) -> Receiver<ExportEvent> {
        self.event_rx.clone()
    }

    /// Request cooperative cancellation
    ///
    /// Observed at the next render iteration or job boundary; partially
    /// written files are finalized and left on disk.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Release);
    }

    /// Whether the export thread has exited
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Wait for the run to end and collect the summary
    pub fn finish(mut self) -> ExportSummary {
        match self.handle.take() {
            Some(handle) => handle.join().unwrap_or_else(|_| {
                error!("export thread panicked");
                ExportSummary::default()
            }),
            None => ExportSummary::default(),
        }
    }
}

/// Drain the queue: strictly FIFO, per-job error isolation, cancellation at
/// job boundaries
fn run_queue<E: SequenceEngine>(
    mut engine: E,
    mut queue: VecDeque<ExportItem>,
    config: &ExportConfig,
    cancel: &AtomicBool,
    events: &Sender<ExportEvent>,
) -> ExportSummary {
    let (pad_start, pad_end) = config.pad_frames(engine.sample_rate());
    let mut summary = ExportSummary::default();
    let mut tracks: Vec<Vec<Frame>> = Vec::new();

    while let Some(item) = queue.pop_front() {
        if cancel.load(Ordering::Acquire) {
            break;
        }
        match run_job(
            &mut engine,
            &mut tracks,
            &item,
            pad_start,
            pad_end,
            cancel,
            events,
        ) {
            Ok(JobEnd::Completed) => {
                info!("export finished: {}", item.output_path.display());
                let _ = events.try_send(ExportEvent::Finished(item.output_path.clone()));
                summary.jobs.push(JobReport {
                    output_path: item.output_path,
                    outcome: JobOutcome::Finished,
                });
            }
            Ok(JobEnd::Cancelled) => break,
            Err(e) => {
                warn!("export job failed: {e}");
                let _ = events.try_send(ExportEvent::Error(e.to_string()));
                summary.jobs.push(JobReport {
                    output_path: item.output_path,
                    outcome: JobOutcome::Failed(e.to_string()),
                });
            }
        }
    }

    if cancel.load(Ordering::Acquire) {
        info!("export cancelled");
        let _ = events.try_send(ExportEvent::Cancelled);
        summary.cancelled = true;
    }
    summary
}

enum JobEnd {
    Completed,
    Cancelled,
}

fn run_job<E: SequenceEngine>(
    engine: &mut E,
    tracks: &mut Vec<Vec<Frame>>,
    item: &ExportItem,
    pad_start: usize,
    pad_end: usize,
    cancel: &AtomicBool,
    events: &Sender<ExportEvent>,
) -> Result<JobEnd> {
    prepare(engine, tracks, item.song_address)?;
    let samples_per_period = engine.samples_per_period();
    let sample_rate = engine.sample_rate();

    let mut sink = if item.split_tracks {
        // One file per track in the target directory, named by zero-padded
        // track index
        fs::create_dir_all(&item.output_path)
            .map_err(|_| PlaybackError::CreateDirectory(item.output_path.clone()))?;
        let mut writers = Vec::with_capacity(tracks.len());
        for index in 0..tracks.len() {
            let filename = item.output_path.join(format!("{index:04}.wav"));
            // An open failure drops the writers opened so far, which
            // finalizes and abandons their stub files
            let writer = WaveWriter::create(&filename, sample_rate, true)
                .map_err(|_| PlaybackError::OpenFile(filename))?;
            writers.push(writer);
        }
        ExportSink::split(writers, samples_per_period)
    } else {
        let writer = WaveWriter::create(&item.output_path, sample_rate, true)
            .map_err(|_| PlaybackError::OpenFile(item.output_path.clone()))?;
        ExportSink::combined(writer, samples_per_period)
    };

    info!("export started: {}", item.output_path.display());
    let _ = events.try_send(ExportEvent::Started(item.output_path.clone()));
    sink.write_silence(pad_start)?;

    let mut sink = RenderSink::Export(sink);
    let mut cancelled = false;
    loop {
        if cancel.load(Ordering::Acquire) {
            cancelled = true;
            break;
        }
        if render_once(engine, tracks, &mut sink)? {
            break;
        }
    }

    if let RenderSink::Export(sink) = &mut sink {
        if cancelled {
            // Stop making progress immediately; finalize headers so partial
            // files stay parseable, and leave them on disk
            sink.close_all()?;
            return Ok(JobEnd::Cancelled);
        }
        sink.write_silence(pad_end)?;
        sink.close_all()?;
    }
    Ok(JobEnd::Completed)
}
