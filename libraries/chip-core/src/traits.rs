//! Core traits for Chip Player

use crate::error::{EngineError, Result};
use crate::types::{Frame, SongAddress};

/// Sequence engine contract
///
/// Implementers decode a sequenced song and synthesize one period of audio
/// per call into per-track sample buffers. The engine is driven exclusively
/// from a single render thread; all methods are synchronous.
///
/// Failures are returned as [`EngineError`] values, never panics. A failed
/// call is fatal to the current playback session or export job and is not
/// retried.
pub trait SequenceEngine: Send {
    /// Initialize the song located at `address`
    ///
    /// After this call the track count and period length reported by the
    /// engine are fixed until the next `init_song`.
    ///
    /// # Errors
    /// Returns an error if the address does not point at a playable song
    fn init_song(&mut self, address: SongAddress) -> std::result::Result<(), EngineError>;

    /// Render one period of audio into the per-track buffers
    ///
    /// `tracks` holds one buffer per sequencer track, each sized to
    /// [`samples_per_period`](Self::samples_per_period); the engine overwrites
    /// every buffer in full.
    ///
    /// # Errors
    /// Returns an error if sequence data is malformed mid-song
    fn process(&mut self, tracks: &mut [Vec<Frame>]) -> std::result::Result<(), EngineError>;

    /// Whether the prepared song has played to its end
    fn has_ended(&self) -> bool;

    /// Address of the prepared song's header
    ///
    /// Used to re-initialize the engine into a clean state after playback.
    fn song_header_address(&self) -> SongAddress;

    /// Number of tracks in the prepared song
    fn track_count(&self) -> usize;

    /// Samples rendered per track per `process` call
    fn samples_per_period(&self) -> usize;

    /// Output sample rate in Hz
    fn sample_rate(&self) -> u32;

    /// Whether the given track is muted
    fn is_track_muted(&self, track: usize) -> bool;

    /// Mute or unmute a track
    fn set_track_muted(&mut self, track: usize, muted: bool);
}

/// Hardware output stream control
///
/// Implementers own a platform audio stream that pulls rendered audio at its
/// own cadence (e.g. through a cpal callback). The pipeline only needs to
/// start and stop it; the data path is wired up at construction time.
pub trait StreamControl: Send {
    /// Start the stream
    ///
    /// # Errors
    /// Returns an error if the platform refuses to start the stream; this is
    /// fatal to starting playback and is not retried
    fn start(&mut self) -> Result<()>;

    /// Stop the stream
    ///
    /// Stopping an already-stopped stream is a no-op.
    fn stop(&mut self);
}
