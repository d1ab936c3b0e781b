//! Core types for the rendering pipeline

use serde::{Deserialize, Serialize};
use std::fmt;

/// One stereo sample pair, the unit of the internal mix pipeline
///
/// All rendering happens in 32-bit float; export converts to signed 16-bit
/// PCM at the last step via [`Frame::to_pcm16`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Frame {
    /// Left channel sample
    pub left: f32,
    /// Right channel sample
    pub right: f32,
}

impl Frame {
    /// The silent frame
    pub const SILENCE: Frame = Frame {
        left: 0.0,
        right: 0.0,
    };

    /// Create a frame from left/right samples
    pub fn new(left: f32, right: f32) -> Self {
        Self { left, right }
    }

    /// Convert to signed 16-bit PCM (scale by 32767, truncate toward zero)
    pub fn to_pcm16(self) -> (i16, i16) {
        ((self.left * 32767.0) as i16, (self.right * 32767.0) as i16)
    }
}

/// Opaque identifier the engine uses to locate a song's sequence data
///
/// Typically a cartridge offset; the pipeline never interprets it beyond
/// passing it back to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SongAddress(pub u32);

impl fmt::Display for SongAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08X}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pcm16_conversion() {
        assert_eq!(Frame::new(0.0, 0.0).to_pcm16(), (0, 0));
        assert_eq!(Frame::new(1.0, -1.0).to_pcm16(), (32767, -32767));
        // Truncation toward zero, not rounding
        assert_eq!(Frame::new(0.5, -0.5).to_pcm16(), (16383, -16383));
    }

    #[test]
    fn pcm16_saturates_out_of_range() {
        let (l, r) = Frame::new(2.0, -2.0).to_pcm16();
        assert_eq!(l, i16::MAX);
        assert_eq!(r, i16::MIN);
    }

    #[test]
    fn song_address_display() {
        assert_eq!(SongAddress(0x08F0_1234).to_string(), "0x08F01234");
    }
}
