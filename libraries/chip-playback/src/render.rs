//! The per-buffer render cycle and its output sinks
//!
//! One render cycle implementation serves both live playback and export; the
//! per-buffer behavior differs only in the sink value passed in. A cycle is:
//! prepare the sink's accumulators, have the engine fill every track buffer
//! for one period, feed each track through the sink in index order, then let
//! the sink emit its output.

use crate::error::Result;
use crate::meter::LoudnessMeter;
use crate::transfer::TransferBuffer;
use crate::wave::WaveWriter;
use crate::VuState;
use chip_core::{Frame, SequenceEngine, SongAddress};
use std::sync::Arc;

/// Initialize the engine at `address` and reallocate the track buffers
///
/// Track count may change between songs, so the buffers are rebuilt
/// (zero-filled) on every prepare.
pub(crate) fn prepare<E: SequenceEngine + ?Sized>(
    engine: &mut E,
    tracks: &mut Vec<Vec<Frame>>,
    address: SongAddress,
) -> Result<()> {
    engine.init_song(address)?;
    let count = engine.track_count();
    let period = engine.samples_per_period();
    tracks.clear();
    tracks.resize_with(count, || vec![Frame::SILENCE; period]);
    Ok(())
}

/// Run one render cycle; returns whether the song has ended
pub(crate) fn render_once<E: SequenceEngine + ?Sized>(
    engine: &mut E,
    tracks: &mut [Vec<Frame>],
    sink: &mut RenderSink,
) -> Result<bool> {
    sink.prepare_buffers();
    engine.process(tracks)?;
    for (index, buffer) in tracks.iter().enumerate() {
        sink.process_track(index, buffer, engine.is_track_muted(index))?;
    }
    sink.output_buffers()?;
    Ok(engine.has_ended())
}

/// Per-buffer output behavior, selected per session
///
/// Live playback mixes into the transfer buffer and the VU meters; export
/// converts to PCM16 and writes WAV files. One variant per session kind
/// instead of one subclass per session kind.
pub(crate) enum RenderSink {
    Live(LiveSink),
    Export(ExportSink),
}

impl RenderSink {
    fn prepare_buffers(&mut self) {
        match self {
            RenderSink::Live(sink) => sink.prepare_buffers(),
            RenderSink::Export(sink) => sink.prepare_buffers(),
        }
    }

    fn process_track(&mut self, index: usize, buffer: &[Frame], muted: bool) -> Result<()> {
        match self {
            RenderSink::Live(sink) => {
                sink.process_track(index, buffer, muted);
                Ok(())
            }
            RenderSink::Export(sink) => sink.process_track(index, buffer),
        }
    }

    fn output_buffers(&mut self) -> Result<()> {
        match self {
            RenderSink::Live(sink) => {
                sink.output_buffers();
                Ok(())
            }
            RenderSink::Export(sink) => sink.output_buffers(),
        }
    }
}

/// Live sink: master mix -> transfer buffer, loudness -> VU state
pub(crate) struct LiveSink {
    transfer: Arc<TransferBuffer>,
    vu: Arc<VuState>,
    master: Vec<Frame>,
    master_meter: LoudnessMeter,
    track_meters: Vec<LoudnessMeter>,
}

impl LiveSink {
    pub(crate) fn new(
        transfer: Arc<TransferBuffer>,
        vu: Arc<VuState>,
        samples_per_period: usize,
        track_count: usize,
    ) -> Self {
        Self {
            transfer,
            vu,
            master: vec![Frame::SILENCE; samples_per_period],
            master_meter: LoudnessMeter::new(),
            track_meters: (0..track_count).map(|_| LoudnessMeter::new()).collect(),
        }
    }

    fn prepare_buffers(&mut self) {
        self.master.fill(Frame::SILENCE);
    }

    fn process_track(&mut self, index: usize, buffer: &[Frame], muted: bool) {
        // Muted tracks still drive their meter, they just stay out of the mix
        if let Some(meter) = self.track_meters.get_mut(index) {
            let levels = meter.process(buffer);
            self.vu.store_track(index, levels);
        }
        if muted {
            return;
        }

        for (out, frame) in self.master.iter_mut().zip(buffer) {
            out.left += frame.left;
            out.right += frame.right;
        }
    }

    fn output_buffers(&mut self) {
        // Blocks while the hardware side catches up; this is the pacing
        // point of the whole live pipeline.
        self.transfer.put(&self.master);
        let levels = self.master_meter.process(&self.master);
        self.vu.store_master(levels);
    }
}

/// Export sink: PCM16 conversion into one or many WAV writers
pub(crate) struct ExportSink {
    mode: ExportMode,
}

enum ExportMode {
    /// All tracks summed into a single file
    Combined {
        writer: WaveWriter,
        // i32 accumulators; clamped to i16 at output so loud mixes
        // saturate instead of wrapping
        sum_left: Vec<i32>,
        sum_right: Vec<i32>,
        out_left: Vec<i16>,
        out_right: Vec<i16>,
    },
    /// One file per track
    Split {
        writers: Vec<WaveWriter>,
        out_left: Vec<i16>,
        out_right: Vec<i16>,
    },
}

impl ExportSink {
    pub(crate) fn combined(writer: WaveWriter, samples_per_period: usize) -> Self {
        Self {
            mode: ExportMode::Combined {
                writer,
                sum_left: vec![0; samples_per_period],
                sum_right: vec![0; samples_per_period],
                out_left: vec![0; samples_per_period],
                out_right: vec![0; samples_per_period],
            },
        }
    }

    pub(crate) fn split(writers: Vec<WaveWriter>, samples_per_period: usize) -> Self {
        Self {
            mode: ExportMode::Split {
                writers,
                out_left: vec![0; samples_per_period],
                out_right: vec![0; samples_per_period],
            },
        }
    }

    fn prepare_buffers(&mut self) {
        if let ExportMode::Combined {
            sum_left, sum_right, ..
        } = &mut self.mode
        {
            sum_left.fill(0);
            sum_right.fill(0);
        }
    }

    // Export disregards mute flags: every track reaches the output
    fn process_track(&mut self, index: usize, buffer: &[Frame]) -> Result<()> {
        match &mut self.mode {
            ExportMode::Combined {
                sum_left, sum_right, ..
            } => {
                for (i, frame) in buffer.iter().enumerate() {
                    let (l, r) = frame.to_pcm16();
                    sum_left[i] += i32::from(l);
                    sum_right[i] += i32::from(r);
                }
            }
            ExportMode::Split {
                writers,
                out_left,
                out_right,
            } => {
                for (i, frame) in buffer.iter().enumerate() {
                    let (l, r) = frame.to_pcm16();
                    out_left[i] = l;
                    out_right[i] = r;
                }
                writers[index].write(&out_left[..buffer.len()], &out_right[..buffer.len()])?;
            }
        }
        Ok(())
    }

    fn output_buffers(&mut self) -> Result<()> {
        if let ExportMode::Combined {
            writer,
            sum_left,
            sum_right,
            out_left,
            out_right,
        } = &mut self.mode
        {
            for (out, sum) in out_left.iter_mut().zip(sum_left.iter()) {
                *out = (*sum).clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16;
            }
            for (out, sum) in out_right.iter_mut().zip(sum_right.iter()) {
                *out = (*sum).clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16;
            }
            writer.write(out_left, out_right)?;
        }
        Ok(())
    }

    /// Write `frames` of silence to every writer (start/end padding)
    pub(crate) fn write_silence(&mut self, frames: usize) -> Result<()> {
        if frames == 0 {
            return Ok(());
        }
        match &mut self.mode {
            ExportMode::Combined {
                writer, out_left, ..
            } => {
                let chunk = out_left.len().max(1);
                let zeros = vec![0i16; chunk];
                let mut remaining = frames;
                while remaining > 0 {
                    let n = remaining.min(chunk);
                    writer.write(&zeros[..n], &zeros[..n])?;
                    remaining -= n;
                }
            }
            ExportMode::Split {
                writers, out_left, ..
            } => {
                let chunk = out_left.len().max(1);
                let zeros = vec![0i16; chunk];
                for writer in writers.iter_mut() {
                    let mut remaining = frames;
                    while remaining > 0 {
                        let n = remaining.min(chunk);
                        writer.write(&zeros[..n], &zeros[..n])?;
                        remaining -= n;
                    }
                }
            }
        }
        Ok(())
    }

    /// Finalize every writer's header
    pub(crate) fn close_all(&mut self) -> Result<()> {
        match &mut self.mode {
            ExportMode::Combined { writer, .. } => writer.close()?,
            ExportMode::Split { writers, .. } => {
                for writer in writers.iter_mut() {
                    writer.close()?;
                }
            }
        }
        Ok(())
    }
}
