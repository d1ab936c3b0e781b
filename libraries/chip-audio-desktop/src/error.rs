/// Audio output errors
use thiserror::Error;

/// Result type for audio output operations
pub type Result<T> = std::result::Result<T, AudioError>;

/// Audio errors
#[derive(Debug, Error)]
pub enum AudioError {
    /// No output device found
    #[error("Audio device not found")]
    DeviceNotFound,

    /// Requested backend is not available on this system
    #[error("Audio backend unavailable: {0}")]
    BackendUnavailable(&'static str),

    /// Failed to build the output stream
    #[error("Failed to build output stream: {0}")]
    StreamBuildError(String),

    /// Failed to start the stream
    #[error("Failed to start stream: {0}")]
    PlayError(String),

    /// Failed to pause the stream
    #[error("Failed to pause stream: {0}")]
    PauseError(String),

    /// The audio thread exited unexpectedly
    #[error("Audio thread is not running")]
    ThreadGone,
}

impl From<cpal::BuildStreamError> for AudioError {
    fn from(err: cpal::BuildStreamError) -> Self {
        AudioError::StreamBuildError(err.to_string())
    }
}

impl From<cpal::PlayStreamError> for AudioError {
    fn from(err: cpal::PlayStreamError) -> Self {
        AudioError::PlayError(err.to_string())
    }
}

impl From<cpal::PauseStreamError> for AudioError {
    fn from(err: cpal::PauseStreamError) -> Self {
        AudioError::PauseError(err.to_string())
    }
}

impl From<AudioError> for chip_core::ChipError {
    fn from(err: AudioError) -> Self {
        chip_core::ChipError::stream(err.to_string())
    }
}
