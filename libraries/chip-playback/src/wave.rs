//! Streaming RIFF/WAVE encoder
//!
//! Emits a canonical 44-byte header followed by 16-bit little-endian PCM.
//! When the total length is unknown up front the `RIFF` and `data` size
//! fields are written as `0xFFFF_FFFF` placeholders and patched with the
//! true totals when the stream is closed, which requires the sink to be
//! seekable (a plain file is).

use std::fs::File;
use std::io::{self, BufWriter, Seek, SeekFrom, Write};
use std::path::Path;
use tracing::warn;

/// Byte offset of the `RIFF` chunk size field
const RIFF_SIZE_OFFSET: u64 = 4;
/// Byte offset of the `data` chunk size field
const DATA_SIZE_OFFSET: u64 = 40;
/// Bytes between the start of the file and the PCM payload
const HEADER_BYTES: u32 = 44;

/// Streaming 16-bit PCM WAV writer with deferred size patch-up
///
/// Closing finalizes the header; dropping an open writer closes it on a
/// best-effort basis. All write/close operations assume `create` succeeded.
pub struct WaveWriter {
    file: Option<BufWriter<File>>,
    payload_bytes: u32,
    stereo: bool,
    rewrite_size: bool,
}

impl WaveWriter {
    /// Create a WAV file of unknown length at `path`
    ///
    /// The header's size fields are placeholders until [`close`](Self::close).
    ///
    /// # Errors
    /// Returns the underlying IO error if the file cannot be created
    pub fn create(path: impl AsRef<Path>, sample_rate: u32, stereo: bool) -> io::Result<Self> {
        Self::with_payload_size(path, sample_rate, stereo, None)
    }

    /// Create a WAV file whose payload size is known up front
    ///
    /// The true sizes are written immediately and `close` patches nothing.
    pub fn create_sized(
        path: impl AsRef<Path>,
        sample_rate: u32,
        stereo: bool,
        payload_bytes: u32,
    ) -> io::Result<Self> {
        Self::with_payload_size(path, sample_rate, stereo, Some(payload_bytes))
    }

    fn with_payload_size(
        path: impl AsRef<Path>,
        sample_rate: u32,
        stereo: bool,
        payload: Option<u32>,
    ) -> io::Result<Self> {
        let mut file = BufWriter::new(File::create(path)?);

        let channels: u16 = if stereo { 2 } else { 1 };
        let block_align: u16 = channels * 2;
        let byte_rate: u32 = sample_rate * u32::from(block_align);
        let (riff_size, data_size) = match payload {
            Some(bytes) => (bytes + HEADER_BYTES - 8, bytes),
            None => (0xFFFF_FFFF, 0xFFFF_FFFF),
        };

        file.write_all(b"RIFF")?;
        file.write_all(&riff_size.to_le_bytes())?;
        file.write_all(b"WAVE")?;
        file.write_all(b"fmt ")?;
        file.write_all(&16u32.to_le_bytes())?; // fmt chunk size
        file.write_all(&1u16.to_le_bytes())?; // PCM
        file.write_all(&channels.to_le_bytes())?;
        file.write_all(&sample_rate.to_le_bytes())?;
        file.write_all(&byte_rate.to_le_bytes())?;
        file.write_all(&block_align.to_le_bytes())?;
        file.write_all(&16u16.to_le_bytes())?; // bits per sample
        file.write_all(b"data")?;
        file.write_all(&data_size.to_le_bytes())?;

        Ok(Self {
            file: Some(file),
            payload_bytes: 0,
            stereo,
            rewrite_size: payload.is_none(),
        })
    }

    /// Append interleaved stereo samples
    ///
    /// The shorter channel is padded with zero when lengths differ.
    ///
    /// # Panics
    /// Panics if the writer was created mono.
    pub fn write(&mut self, left: &[i16], right: &[i16]) -> io::Result<()> {
        assert!(self.stereo, "stereo write on a mono WaveWriter");
        let file = self.file.as_mut().expect("write after close");

        let words = left.len().max(right.len());
        for i in 0..words {
            let l = left.get(i).copied().unwrap_or(0);
            let r = right.get(i).copied().unwrap_or(0);
            file.write_all(&l.to_le_bytes())?;
            file.write_all(&r.to_le_bytes())?;
        }
        self.payload_bytes += (words * 4) as u32;
        Ok(())
    }

    /// Append mono samples
    ///
    /// # Panics
    /// Panics if the writer was created stereo.
    pub fn write_mono(&mut self, samples: &[i16]) -> io::Result<()> {
        assert!(!self.stereo, "mono write on a stereo WaveWriter");
        let file = self.file.as_mut().expect("write after close");

        for sample in samples {
            file.write_all(&sample.to_le_bytes())?;
        }
        self.payload_bytes += (samples.len() * 2) as u32;
        Ok(())
    }

    /// PCM payload bytes written so far
    pub fn payload_bytes(&self) -> u32 {
        self.payload_bytes
    }

    /// Finalize the stream
    ///
    /// Patches the deferred `RIFF` and `data` size fields with the true
    /// totals, then flushes and releases the file. Closing an already-closed
    /// writer is a no-op.
    pub fn close(&mut self) -> io::Result<()> {
        let Some(mut file) = self.file.take() else {
            return Ok(());
        };

        if self.rewrite_size {
            file.flush()?;
            file.seek(SeekFrom::Start(RIFF_SIZE_OFFSET))?;
            file.write_all(&(self.payload_bytes + HEADER_BYTES - 8).to_le_bytes())?;
            file.seek(SeekFrom::Start(DATA_SIZE_OFFSET))?;
            file.write_all(&self.payload_bytes.to_le_bytes())?;
        }
        file.flush()?;
        Ok(())
    }
}

impl Drop for WaveWriter {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!("failed to finalize WAV file on drop: {e}");
        }
    }
}
