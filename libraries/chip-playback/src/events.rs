//! Events emitted by the playback and export threads
//!
//! Both loops report progress over bounded crossbeam channels. Sends never
//! block the render path: if the consumer is not draining, events are dropped
//! rather than stalling audio.

use crate::types::PlayerState;
use std::path::PathBuf;

/// Events emitted by a live playback session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerEvent {
    /// The player state changed
    StateChanged(PlayerState),

    /// The prepared song played to its natural end
    SongEnded,

    /// The render thread hit a fatal error and is tearing down
    Error(String),
}

/// Events emitted by an export run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportEvent {
    /// A job's writers are open and rendering has begun
    Started(PathBuf),

    /// A job completed and its files were finalized
    Finished(PathBuf),

    /// A job failed; the queue continues with the next job
    Error(String),

    /// Cancellation was observed; remaining jobs were abandoned
    Cancelled,
}
