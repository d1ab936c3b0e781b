//! Chip Player playback pipeline
//!
//! The real-time rendering and export pipeline: the producer/consumer audio
//! path between a render loop and a hardware audio callback, the playback and
//! export state machines, the bounded transfer buffer bridging them, the
//! streaming WAV writer used for export, and the lock-free loudness metering
//! path that feeds a UI without blocking rendering.
//!
//! # Architecture
//!
//! - [`TransferBuffer`]: bounded, blocking, single-producer/single-consumer
//!   frame queue between the render thread and the hardware callback
//! - [`Player`]: live playback session and its state machine
//! - [`Exporter`]: batch WAV export over a FIFO job queue
//! - [`WaveWriter`]: streaming RIFF/WAVE encoder with deferred size patch-up
//! - [`VuState`] / [`LoudnessMeter`]: per-buffer loudness for level meters
//!
//! The synthesis engine is an external collaborator consumed through
//! [`chip_core::SequenceEngine`]; the hardware stream through
//! [`chip_core::StreamControl`].
//!
//! # Wiring
//!
//! ```ignore
//! let transfer = Arc::new(TransferBuffer::new(
//!     config.transfer_periods * engine.samples_per_period(),
//! ));
//! let output = DesktopOutput::open(transfer.clone(), engine.sample_rate())?;
//! let mut player = Player::new(engine, output, transfer, config);
//! player.select_song(address)?;
//! player.play()?;
//! ```

pub mod error;
pub mod events;
pub mod export;
pub mod meter;
pub mod player;
pub mod test_utils;
pub mod transfer;
pub mod types;
pub mod wave;

mod render;

pub use error::{PlaybackError, Result};
pub use events::{ExportEvent, PlayerEvent};
pub use export::{ExportSummary, Exporter, JobOutcome, JobReport};
pub use meter::{Loudness, LoudnessMeter, VuState};
pub use player::Player;
pub use transfer::TransferBuffer;
pub use types::{ExportConfig, ExportItem, PlayerConfig, PlayerState};
pub use wave::WaveWriter;
