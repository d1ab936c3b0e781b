//! Error types for the playback pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Playback errors
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// Sequence engine failure; fatal to the current session or export job
    #[error("Engine error: {0}")]
    Engine(#[from] chip_core::EngineError),

    /// Hardware audio stream failure; fatal to starting playback
    #[error("Audio stream error: {0}")]
    Stream(String),

    /// Export output directory could not be created
    #[error("Unable to create directory {0}")]
    CreateDirectory(PathBuf),

    /// Export output file could not be opened
    #[error("Unable to open {0}")]
    OpenFile(PathBuf),

    /// The player state word held a value outside the state machine
    #[error("Internal player state error: {0}")]
    InvalidState(u8),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<chip_core::ChipError> for PlaybackError {
    fn from(err: chip_core::ChipError) -> Self {
        match err {
            chip_core::ChipError::Engine(e) => PlaybackError::Engine(e),
            chip_core::ChipError::Stream(msg) => PlaybackError::Stream(msg),
            chip_core::ChipError::Io(e) => PlaybackError::Io(e),
        }
    }
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
