//! Chip Player desktop audio output
//!
//! CPAL-backed stereo f32 output stream whose hardware callback pulls frames
//! from a [`chip_playback::TransferBuffer`]. The callback does nothing else:
//! it never touches the engine or file writers and never blocks beyond the
//! transfer buffer's short copy.
//!
//! The cpal `Stream` lives on a dedicated audio thread owned by
//! [`DesktopOutput`], driven by a command channel, so the output handle is
//! freely `Send` without any unsafe impls.

pub mod backend;
pub mod error;
pub mod output;

pub use backend::AudioBackend;
pub use error::{AudioError, Result};
pub use output::DesktopOutput;
