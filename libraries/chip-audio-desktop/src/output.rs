//! CPAL output stream pulling from a transfer buffer
//!
//! The cpal `Stream` is not `Send`, so it lives on a dedicated audio thread
//! that owns it for its whole life. The rest of the system talks to that
//! thread over a bounded command channel; `start` waits for a reply so
//! hardware failures surface to the caller instead of dying on the audio
//! thread.

use crate::backend::AudioBackend;
use crate::error::{AudioError, Result};
use chip_core::{ChipError, StreamControl};
use chip_playback::TransferBuffer;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, Device, SampleRate, StreamConfig};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

/// Commands sent to the audio thread
enum StreamCommand {
    /// Start the stream; the reply carries the platform's verdict
    Start(Sender<Result<()>>),
    /// Pause the stream
    Stop,
    /// Drop the stream and exit the thread
    Shutdown,
}

/// Desktop hardware output
///
/// Opens a stereo f32 output stream against the selected backend's default
/// device; the stream's data callback is exactly one
/// [`TransferBuffer::take_interleaved`] call. Selection happens once at open
/// time, with no automatic fallback.
pub struct DesktopOutput {
    command_tx: Sender<StreamCommand>,
    sample_rate: u32,
    audio_thread: Option<JoinHandle<()>>,
}

impl DesktopOutput {
    /// Open an output stream on the system default backend
    ///
    /// # Errors
    /// Returns an error if no device is available or the stream cannot be
    /// built at the requested sample rate
    pub fn open(transfer: Arc<TransferBuffer>, sample_rate: u32) -> Result<Self> {
        Self::open_with_backend(transfer, sample_rate, AudioBackend::Default)
    }

    /// Open an output stream on a specific backend
    ///
    /// # Errors
    /// Returns an error if the backend or device is unavailable or the
    /// stream cannot be built
    pub fn open_with_backend(
        transfer: Arc<TransferBuffer>,
        sample_rate: u32,
        backend: AudioBackend,
    ) -> Result<Self> {
        let host = backend.to_cpal_host()?;
        let device = host
            .default_output_device()
            .ok_or(AudioError::DeviceNotFound)?;
        debug!(
            "opening {} output at {sample_rate} Hz on {}",
            backend.name(),
            device.name().unwrap_or_else(|_| "<unknown>".into())
        );

        let config = StreamConfig {
            channels: 2,
            sample_rate: SampleRate(sample_rate),
            buffer_size: BufferSize::Default,
        };

        let (command_tx, command_rx) = bounded(8);
        let (ready_tx, ready_rx) = bounded(1);
        let audio_thread = thread::spawn(move || {
            audio_thread_run(&device, &config, transfer, &command_rx, &ready_tx);
        });

        // The stream is built on the audio thread; wait for its verdict so
        // open failures are synchronous
        match ready_rx.recv() {
            Ok(Ok(())) => Ok(Self {
                command_tx,
                sample_rate,
                audio_thread: Some(audio_thread),
            }),
            Ok(Err(e)) => {
                let _ = audio_thread.join();
                Err(e)
            }
            Err(_) => Err(AudioError::ThreadGone),
        }
    }

    /// Sample rate the stream was opened at
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

impl StreamControl for DesktopOutput {
    fn start(&mut self) -> chip_core::Result<()> {
        let (reply_tx, reply_rx) = bounded(1);
        self.command_tx
            .send(StreamCommand::Start(reply_tx))
            .map_err(|_| ChipError::from(AudioError::ThreadGone))?;
        reply_rx
            .recv()
            .map_err(|_| ChipError::from(AudioError::ThreadGone))?
            .map_err(ChipError::from)
    }

    fn stop(&mut self) {
        let _ = self.command_tx.send(StreamCommand::Stop);
    }
}

impl Drop for DesktopOutput {
    fn drop(&mut self) {
        let _ = self.command_tx.send(StreamCommand::Shutdown);
        if let Some(handle) = self.audio_thread.take() {
            let _ = handle.join();
        }
    }
}

/// Audio thread main: build the stream, then serve commands until shutdown
fn audio_thread_run(
    device: &Device,
    config: &StreamConfig,
    transfer: Arc<TransferBuffer>,
    command_rx: &Receiver<StreamCommand>,
    ready_tx: &Sender<Result<()>>,
) {
    let built = device.build_output_stream(
        config,
        move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
            // Hardware callback context: read what exists, shortfall is
            // silence; nothing here may block or fail
            transfer.take_interleaved(data);
        },
        |err| warn!("audio stream error: {err}"),
        None,
    );

    let stream = match built {
        Ok(stream) => {
            let _ = ready_tx.send(Ok(()));
            stream
        }
        Err(e) => {
            let _ = ready_tx.send(Err(AudioError::from(e)));
            return;
        }
    };

    while let Ok(command) = command_rx.recv() {
        match command {
            StreamCommand::Start(reply) => {
                let _ = reply.send(stream.play().map_err(AudioError::from));
            }
            StreamCommand::Stop => {
                if let Err(e) = stream.pause() {
                    warn!("failed to pause stream: {e}");
                }
            }
            StreamCommand::Shutdown => break,
        }
    }
    debug!("audio thread exiting");
}
