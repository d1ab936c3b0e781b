//! Per-buffer loudness metering
//!
//! The render thread measures every mixed buffer and publishes the result
//! into [`VuState`], which a UI polls on its own timer. Publication is
//! lock-free: each field is an atomic f32 bit cell, and a reader may observe
//! fields from two different buffers. Displayed loudness is inherently
//! approximate, so eventual consistency is the intended trade for keeping
//! locks off the hot render path.

use chip_core::Frame;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

/// Per-buffer release factor: rise is instantaneous, fall is exponential
/// so meters decay smoothly across buffers instead of flickering.
const RELEASE: f32 = 0.85;

/// One loudness measurement (smoothed RMS and absolute peak per channel)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Loudness {
    /// Smoothed RMS, left channel
    pub rms_left: f32,
    /// Smoothed RMS, right channel
    pub rms_right: f32,
    /// Peak absolute sample, left channel
    pub peak_left: f32,
    /// Peak absolute sample, right channel
    pub peak_right: f32,
}

/// Loudness accumulator for one signal
///
/// Owned by the render thread; one per track plus one for the master mix.
/// `process` folds one buffer into the smoothed levels and returns the
/// snapshot to publish.
#[derive(Debug, Default)]
pub struct LoudnessMeter {
    current: Loudness,
}

impl LoudnessMeter {
    /// Create a meter at silence
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one buffer into the meter and return the updated levels
    pub fn process(&mut self, frames: &[Frame]) -> Loudness {
        if frames.is_empty() {
            return self.current;
        }

        let mut sum_left = 0.0f32;
        let mut sum_right = 0.0f32;
        let mut peak_left = 0.0f32;
        let mut peak_right = 0.0f32;
        for frame in frames {
            sum_left += frame.left * frame.left;
            sum_right += frame.right * frame.right;
            peak_left = peak_left.max(frame.left.abs());
            peak_right = peak_right.max(frame.right.abs());
        }
        let count = frames.len() as f32;
        let rms_left = (sum_left / count).sqrt();
        let rms_right = (sum_right / count).sqrt();

        self.current = Loudness {
            rms_left: rms_left.max(self.current.rms_left * RELEASE),
            rms_right: rms_right.max(self.current.rms_right * RELEASE),
            peak_left: peak_left.max(self.current.peak_left * RELEASE),
            peak_right: peak_right.max(self.current.peak_right * RELEASE),
        };
        self.current
    }

    /// Drop back to silence
    pub fn reset(&mut self) {
        self.current = Loudness::default();
    }
}

/// Lock-free loudness cell for one channel
#[derive(Debug, Default)]
struct VuChannel {
    rms_left: AtomicU32,
    rms_right: AtomicU32,
    peak_left: AtomicU32,
    peak_right: AtomicU32,
}

impl VuChannel {
    fn store(&self, levels: Loudness) {
        self.rms_left.store(levels.rms_left.to_bits(), Ordering::Relaxed);
        self.rms_right
            .store(levels.rms_right.to_bits(), Ordering::Relaxed);
        self.peak_left
            .store(levels.peak_left.to_bits(), Ordering::Relaxed);
        self.peak_right
            .store(levels.peak_right.to_bits(), Ordering::Relaxed);
    }

    fn load(&self) -> Loudness {
        Loudness {
            rms_left: f32::from_bits(self.rms_left.load(Ordering::Relaxed)),
            rms_right: f32::from_bits(self.rms_right.load(Ordering::Relaxed)),
            peak_left: f32::from_bits(self.peak_left.load(Ordering::Relaxed)),
            peak_right: f32::from_bits(self.peak_right.load(Ordering::Relaxed)),
        }
    }

    fn reset(&self) {
        self.store(Loudness::default());
    }
}

/// Shared meter state: one master channel plus one channel per track
///
/// Written by the render thread after each buffer, read by the UI on a
/// timer. Allocated once per session with a fixed track capacity so the hot
/// path never reallocates.
#[derive(Debug)]
pub struct VuState {
    master: VuChannel,
    tracks: Vec<VuChannel>,
    active_tracks: AtomicUsize,
}

impl VuState {
    /// Allocate meter state for up to `track_capacity` tracks
    pub fn new(track_capacity: usize) -> Self {
        Self {
            master: VuChannel::default(),
            tracks: (0..track_capacity).map(|_| VuChannel::default()).collect(),
            active_tracks: AtomicUsize::new(0),
        }
    }

    /// Number of track channels with live data
    pub fn active_tracks(&self) -> usize {
        self.active_tracks.load(Ordering::Relaxed)
    }

    /// Set the active track count (clamped to capacity) and zero the rest
    pub fn set_active_tracks(&self, count: usize) {
        let count = count.min(self.tracks.len());
        self.active_tracks.store(count, Ordering::Relaxed);
        for channel in &self.tracks[count..] {
            channel.reset();
        }
    }

    /// Master mix levels
    pub fn master(&self) -> Loudness {
        self.master.load()
    }

    /// Per-track levels; `None` past the allocated capacity
    pub fn track(&self, index: usize) -> Option<Loudness> {
        self.tracks.get(index).map(VuChannel::load)
    }

    /// Zero every channel
    pub fn reset(&self) {
        self.master.reset();
        for channel in &self.tracks {
            channel.reset();
        }
    }

    pub(crate) fn store_master(&self, levels: Loudness) {
        self.master.store(levels);
    }

    pub(crate) fn store_track(&self, index: usize, levels: Loudness) {
        if let Some(channel) = self.tracks.get(index) {
            channel.store(levels);
        }
    }
}
