//! Error types shared across the Chip Player crates

use crate::types::SongAddress;
use thiserror::Error;

/// Result type for core operations
pub type Result<T> = std::result::Result<T, ChipError>;

/// Errors raised by a sequence engine implementation
///
/// The engine is an external collaborator; these variants cover the failures
/// its contract is allowed to surface. An engine failure is fatal to the
/// current unit of work (a playback session or one export job) and is never
/// retried.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The song address does not point at a valid song header
    #[error("No valid song at address {0}")]
    InvalidSongAddress(SongAddress),

    /// The sequence data was readable but malformed
    #[error("Sequence data fault: {0}")]
    SequenceFault(String),

    /// A track index outside the prepared song's track count was used
    #[error("Track index out of range: {0}")]
    TrackOutOfRange(usize),

    /// Any other engine-internal failure
    #[error("Engine error: {0}")]
    Internal(String),
}

/// Unified error for the core trait contracts
#[derive(Debug, Error)]
pub enum ChipError {
    /// Sequence engine failure
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// Hardware audio stream failure
    #[error("Audio stream error: {0}")]
    Stream(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ChipError {
    /// Create a stream error from any displayable value
    pub fn stream(message: impl Into<String>) -> Self {
        Self::Stream(message.into())
    }
}
