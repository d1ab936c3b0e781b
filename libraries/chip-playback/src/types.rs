//! Core types for the playback pipeline

use chip_core::SongAddress;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU8, Ordering};

/// Live playback state
///
/// Exactly one instance per live session, stored in a [`StateCell`]. The
/// controller requests `Restart`, `Paused`/`Playing` and `Shutdown`; the
/// render thread only transitions `Playing -> Shutdown` itself, on natural
/// song end. `Terminated` is terminal and set by the render thread as its
/// very last step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerState {
    /// Re-prepare the current song from its header, then keep playing
    Restart,

    /// Render one period per iteration into the transfer buffer
    Playing,

    /// Keep the hardware callback fed with silence
    Paused,

    /// Stop requested; the render thread exits its loop
    Shutdown,

    /// The render thread has fully torn down
    Terminated,
}

impl PlayerState {
    fn as_u8(self) -> u8 {
        match self {
            PlayerState::Restart => 0,
            PlayerState::Playing => 1,
            PlayerState::Paused => 2,
            PlayerState::Shutdown => 3,
            PlayerState::Terminated => 4,
        }
    }

    fn from_u8(value: u8) -> Option<PlayerState> {
        match value {
            0 => Some(PlayerState::Restart),
            1 => Some(PlayerState::Playing),
            2 => Some(PlayerState::Paused),
            3 => Some(PlayerState::Shutdown),
            4 => Some(PlayerState::Terminated),
            _ => None,
        }
    }
}

/// Atomic cell holding a [`PlayerState`]
///
/// Written by the controller, read once per iteration by the render thread;
/// a change takes effect on the next iteration, never mid-buffer.
#[derive(Debug)]
pub(crate) struct StateCell(AtomicU8);

impl StateCell {
    pub(crate) fn new(state: PlayerState) -> Self {
        Self(AtomicU8::new(state.as_u8()))
    }

    pub(crate) fn store(&self, state: PlayerState) {
        self.0.store(state.as_u8(), Ordering::Release);
    }

    pub(crate) fn load(&self) -> PlayerState {
        // Only as_u8 values are ever stored, so the raw word always decodes
        PlayerState::from_u8(self.0.load(Ordering::Acquire))
            .unwrap_or(PlayerState::Terminated)
    }

    /// Raw load for the render loop's exhaustive decode
    pub(crate) fn load_raw(&self) -> u8 {
        self.0.load(Ordering::Acquire)
    }

    pub(crate) fn decode(value: u8) -> Option<PlayerState> {
        PlayerState::from_u8(value)
    }
}

/// One pending export job
///
/// Immutable once enqueued; consumed FIFO by the [`Exporter`](crate::Exporter).
/// In split mode `output_path` names a directory that receives one file per
/// track; otherwise it names the single output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportItem {
    /// Output file (combined) or directory (split)
    pub output_path: PathBuf,

    /// Song to render
    pub song_address: SongAddress,

    /// Export each track to its own file
    pub split_tracks: bool,
}

/// Configuration for a live playback session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Transfer buffer capacity, in render periods (default: 8)
    ///
    /// Enough to absorb scheduling jitter between the render thread and the
    /// hardware callback without either side spinning.
    pub transfer_periods: usize,

    /// Poll interval in milliseconds for the synchronous stop wait (default: 5)
    ///
    /// A latency tunable, not a correctness dependency.
    pub shutdown_poll_ms: u64,

    /// Number of VU meter track channels to allocate (default: 16)
    ///
    /// Songs with more tracks than this still play; only their metering is
    /// capped.
    pub track_capacity: usize,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            transfer_periods: 8,
            shutdown_poll_ms: 5,
            track_capacity: 16,
        }
    }
}

/// Configuration for export jobs
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Seconds of silence written before the first rendered sample (default: 0)
    pub pad_start_secs: f64,

    /// Seconds of silence written after the last rendered sample (default: 0)
    pub pad_end_secs: f64,
}

impl ExportConfig {
    /// Padding lengths in frames at the given sample rate
    pub(crate) fn pad_frames(&self, sample_rate: u32) -> (usize, usize) {
        let rate = f64::from(sample_rate);
        (
            (self.pad_start_secs * rate).round() as usize,
            (self.pad_end_secs * rate).round() as usize,
        )
    }
}
