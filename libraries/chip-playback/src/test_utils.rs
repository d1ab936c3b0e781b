//! Deterministic collaborators for pipeline testing
//!
//! A scripted [`SequenceEngine`] that renders a fixed number of periods of
//! known amplitudes, plus a no-op [`StreamControl`]. Used by the unit and
//! integration tests; no real synthesis or hardware involved.

use chip_core::{ChipError, EngineError, Frame, SequenceEngine, SongAddress, StreamControl};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Scripted engine: `track_count` tracks of constant amplitude, ending after
/// a fixed number of periods
///
/// Track `i` renders `Frame { left: amp(i), right: -amp(i) }` every sample,
/// so tests can predict mixes and PCM output exactly.
pub struct ScriptedEngine {
    sample_rate: u32,
    samples_per_period: usize,
    track_count: usize,
    total_periods: usize,
    rendered: Arc<AtomicUsize>,
    current_song: SongAddress,
    muted: Vec<bool>,
    invalid_address: Option<SongAddress>,
    fail_at_period: Option<usize>,
}

impl ScriptedEngine {
    /// Create an engine that ends after `total_periods` periods
    pub fn new(
        sample_rate: u32,
        samples_per_period: usize,
        track_count: usize,
        total_periods: usize,
    ) -> Self {
        Self {
            sample_rate,
            samples_per_period,
            track_count,
            total_periods,
            rendered: Arc::new(AtomicUsize::new(0)),
            current_song: SongAddress(0),
            muted: vec![false; track_count],
            invalid_address: None,
            fail_at_period: None,
        }
    }

    /// Treat `address` as unplayable: `init_song` there fails
    pub fn with_invalid_address(mut self, address: SongAddress) -> Self {
        self.invalid_address = Some(address);
        self
    }

    /// Fail `process` once `period` periods have been rendered
    pub fn with_failure_at_period(mut self, period: usize) -> Self {
        self.fail_at_period = Some(period);
        self
    }

    /// Constant amplitude rendered by track `index`
    pub fn track_amplitude(index: usize) -> f32 {
        0.05 * (index + 1) as f32
    }

    /// Shared counter of periods rendered since the last `init_song`
    pub fn rendered_handle(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.rendered)
    }
}

impl SequenceEngine for ScriptedEngine {
    fn init_song(&mut self, address: SongAddress) -> Result<(), EngineError> {
        if self.invalid_address == Some(address) {
            return Err(EngineError::InvalidSongAddress(address));
        }
        self.current_song = address;
        self.rendered.store(0, Ordering::SeqCst);
        Ok(())
    }

    fn process(&mut self, tracks: &mut [Vec<Frame>]) -> Result<(), EngineError> {
        let period = self.rendered.load(Ordering::SeqCst);
        if self.fail_at_period == Some(period) {
            return Err(EngineError::Internal("scripted process failure".into()));
        }
        for (index, buffer) in tracks.iter_mut().enumerate() {
            let amp = Self::track_amplitude(index);
            buffer.fill(Frame::new(amp, -amp));
        }
        self.rendered.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn has_ended(&self) -> bool {
        self.rendered.load(Ordering::SeqCst) >= self.total_periods
    }

    fn song_header_address(&self) -> SongAddress {
        self.current_song
    }

    fn track_count(&self) -> usize {
        self.track_count
    }

    fn samples_per_period(&self) -> usize {
        self.samples_per_period
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn is_track_muted(&self, track: usize) -> bool {
        self.muted.get(track).copied().unwrap_or(false)
    }

    fn set_track_muted(&mut self, track: usize, muted: bool) {
        if let Some(slot) = self.muted.get_mut(track) {
            *slot = muted;
        }
    }
}

/// Stream control that records start/stop without touching hardware
#[derive(Default)]
pub struct NullStream {
    started: Arc<AtomicBool>,
    fail_on_start: bool,
}

impl NullStream {
    /// Create a stream that always starts
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a stream whose `start` fails, for hardware-failure tests
    pub fn failing() -> Self {
        Self {
            started: Arc::new(AtomicBool::new(false)),
            fail_on_start: true,
        }
    }

    /// Shared flag tracking whether the stream is running
    pub fn started_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.started)
    }
}

impl StreamControl for NullStream {
    fn start(&mut self) -> chip_core::Result<()> {
        if self.fail_on_start {
            return Err(ChipError::stream("scripted stream failure"));
        }
        self.started.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&mut self) {
        self.started.store(false, Ordering::SeqCst);
    }
}
