//! Chip Player Core
//!
//! Platform-agnostic core types and traits for Chip Player.
//!
//! This crate provides the foundational building blocks shared by the
//! rendering pipeline and the platform audio backends.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: [`Frame`], [`SongAddress`]
//! - **Core Traits**: [`SequenceEngine`] (the synthesis engine contract),
//!   [`StreamControl`] (hardware output stream control)
//! - **Error Handling**: [`ChipError`], [`EngineError`] and the crate
//!   [`Result`] type
//!
//! The synthesis engine itself lives outside this repository; everything here
//! consumes it through [`SequenceEngine`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use error::{ChipError, EngineError, Result};
pub use traits::{SequenceEngine, StreamControl};
pub use types::{Frame, SongAddress};
