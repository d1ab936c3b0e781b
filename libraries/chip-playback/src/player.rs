//! Live playback session
//!
//! A [`Player`] owns one engine, one hardware stream and one render thread.
//! The controller mutates the shared [`PlayerState`] word; the render thread
//! reads it once per iteration and performs exactly one state's action per
//! buffer. Teardown always ends by storing `Terminated`, which is what a
//! controller blocked in [`Player::stop`] is polling for.

use crate::error::{PlaybackError, Result};
use crate::events::PlayerEvent;
use crate::meter::VuState;
use crate::render::{prepare, render_once, LiveSink, RenderSink};
use crate::transfer::TransferBuffer;
use crate::types::{PlayerConfig, PlayerState, StateCell};
use chip_core::{Frame, SequenceEngine, SongAddress, StreamControl};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info};

/// Capacity of the event channel; sends never block, overflow is dropped
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Live playback session driving a render thread against a hardware stream
///
/// The transfer buffer is created by the caller so the hardware output can be
/// wired to it before the player exists (see the crate docs for the wiring
/// order).
pub struct Player<E: SequenceEngine + 'static, S: StreamControl + 'static> {
    engine: Arc<Mutex<E>>,
    stream: Arc<Mutex<S>>,
    transfer: Arc<TransferBuffer>,
    vu: Arc<VuState>,
    state: Arc<StateCell>,
    config: PlayerConfig,
    event_tx: Sender<PlayerEvent>,
    event_rx: Receiver<PlayerEvent>,
    render_thread: Option<JoinHandle<()>>,
}

impl<E: SequenceEngine + 'static, S: StreamControl + 'static> Player<E, S> {
    /// Create a session around an engine and a hardware stream
    pub fn new(engine: E, stream: S, transfer: Arc<TransferBuffer>, config: PlayerConfig) -> Self {
        let (event_tx, event_rx) = bounded(EVENT_CHANNEL_CAPACITY);
        Self {
            engine: Arc::new(Mutex::new(engine)),
            stream: Arc::new(Mutex::new(stream)),
            transfer,
            vu: Arc::new(VuState::new(config.track_capacity)),
            state: Arc::new(StateCell::new(PlayerState::Terminated)),
            config,
            event_tx,
            event_rx,
            render_thread: None,
        }
    }

    /// Current player state
    pub fn state(&self) -> PlayerState {
        self.state.load()
    }

    /// Shared VU meter state, for a polling UI
    pub fn vu(&self) -> Arc<VuState> {
        Arc::clone(&self.vu)
    }

    /// Receiver for session events
    pub fn events(&self) -> Receiver<PlayerEvent> {
        self.event_rx.clone()
    }

    /// Stop playback and prepare the song at `address`
    ///
    /// # Errors
    /// Returns an engine error if `address` is not a playable song
    pub fn select_song(&mut self, address: SongAddress) -> Result<()> {
        self.stop();
        let mut engine = self.engine.lock().unwrap();
        engine.init_song(address)?;
        self.vu.set_active_tracks(engine.track_count());
        debug!("selected song at {}", address);
        Ok(())
    }

    /// Start, restart or resume playback
    ///
    /// From `Terminated` this starts the hardware stream and spawns the
    /// render thread; while `Playing` it requests a restart of the current
    /// song; while `Paused` it resumes.
    ///
    /// # Errors
    /// Returns a stream error if the hardware stream cannot be started
    pub fn play(&mut self) -> Result<()> {
        match self.state.load() {
            PlayerState::Terminated => {
                self.reap_render_thread();
                self.stream.lock().unwrap().start()?;
                self.set_state(PlayerState::Playing);
                if let Err(e) = self.spawn_render_thread() {
                    self.stream.lock().unwrap().stop();
                    self.set_state(PlayerState::Terminated);
                    return Err(e);
                }
                info!("playback started");
            }
            PlayerState::Playing => self.set_state(PlayerState::Restart),
            PlayerState::Paused => self.set_state(PlayerState::Playing),
            PlayerState::Restart | PlayerState::Shutdown => {}
        }
        Ok(())
    }

    /// Toggle between paused and playing
    ///
    /// No effect unless a session is live.
    pub fn pause(&mut self) {
        match self.state.load() {
            PlayerState::Playing => self.set_state(PlayerState::Paused),
            PlayerState::Paused => self.set_state(PlayerState::Playing),
            _ => {}
        }
    }

    /// Play when stopped, otherwise toggle pause
    ///
    /// # Errors
    /// Returns a stream error if starting playback fails
    pub fn toggle_play(&mut self) -> Result<()> {
        if self.state.load() == PlayerState::Terminated {
            self.play()
        } else {
            self.pause();
            Ok(())
        }
    }

    /// Stop playback synchronously
    ///
    /// Requests `Shutdown` and waits until the render thread reports
    /// `Terminated`, polling at the configured interval. The transfer buffer
    /// is cleared while waiting so a producer blocked on a full buffer can
    /// observe the request.
    pub fn stop(&mut self) {
        let poll = Duration::from_millis(self.config.shutdown_poll_ms);

        // Let a pending restart settle first so its Playing store does not
        // race the Shutdown request
        while self.state.load() == PlayerState::Restart {
            thread::sleep(poll);
        }
        if self.state.load() != PlayerState::Terminated {
            self.set_state(PlayerState::Shutdown);
        }
        while self.state.load() != PlayerState::Terminated {
            self.transfer.clear();
            thread::sleep(poll);
        }
        self.reap_render_thread();
    }

    /// Mute or unmute a sequencer track
    pub fn set_track_muted(&self, track: usize, muted: bool) {
        self.engine.lock().unwrap().set_track_muted(track, muted);
    }

    fn set_state(&self, state: PlayerState) {
        self.state.store(state);
        let _ = self.event_tx.try_send(PlayerEvent::StateChanged(state));
    }

    fn reap_render_thread(&mut self) {
        if let Some(handle) = self.render_thread.take() {
            let _ = handle.join();
        }
    }

    fn spawn_render_thread(&mut self) -> Result<()> {
        let engine = Arc::clone(&self.engine);
        let stream = Arc::clone(&self.stream);
        let transfer = Arc::clone(&self.transfer);
        let vu = Arc::clone(&self.vu);
        let state = Arc::clone(&self.state);
        let events = self.event_tx.clone();

        let handle = thread::Builder::new()
            .name("chip-render".into())
            .spawn(move || {
                render_thread_main(&engine, &stream, &transfer, &vu, &state, &events);
            })
            .map_err(PlaybackError::Io)?;
        self.render_thread = Some(handle);
        Ok(())
    }
}

impl<E: SequenceEngine + 'static, S: StreamControl + 'static> Drop for Player<E, S> {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Render thread entry: run the session, then tear down unconditionally
///
/// Teardown order matters: the stream stops before meters and buffered audio
/// are discarded, and `Terminated` is stored as the very last step so a
/// controller waiting in `stop` observes a fully torn down session.
fn render_thread_main<E: SequenceEngine, S: StreamControl>(
    engine: &Mutex<E>,
    stream: &Mutex<S>,
    transfer: &Arc<TransferBuffer>,
    vu: &Arc<VuState>,
    state: &StateCell,
    events: &Sender<PlayerEvent>,
) {
    if let Err(e) = run_session(engine, transfer, vu, state, events) {
        error!("fatal error on render thread: {e}");
        let _ = events.try_send(PlayerEvent::Error(e.to_string()));
    }
    stream.lock().unwrap().stop();
    vu.reset();
    transfer.clear();
    state.store(PlayerState::Terminated);
    let _ = events.try_send(PlayerEvent::StateChanged(PlayerState::Terminated));
    debug!("render thread terminated");
}

/// The per-iteration state machine
fn run_session<E: SequenceEngine>(
    engine: &Mutex<E>,
    transfer: &Arc<TransferBuffer>,
    vu: &Arc<VuState>,
    state: &StateCell,
    events: &Sender<PlayerEvent>,
) -> Result<()> {
    let mut tracks: Vec<Vec<Frame>> = Vec::new();

    // Prepare the selected song from its header; this also sizes the track
    // buffers for the session
    let (samples_per_period, track_count) = {
        let mut engine = engine.lock().unwrap();
        let header = engine.song_header_address();
        prepare(&mut *engine, &mut tracks, header)?;
        (engine.samples_per_period(), engine.track_count())
    };

    let mut sink = RenderSink::Live(LiveSink::new(
        Arc::clone(transfer),
        Arc::clone(vu),
        samples_per_period,
        track_count,
    ));
    let silence = vec![Frame::SILENCE; samples_per_period];

    loop {
        let raw = state.load_raw();
        let Some(current) = StateCell::decode(raw) else {
            return Err(PlaybackError::InvalidState(raw));
        };
        match current {
            PlayerState::Shutdown | PlayerState::Terminated => break,
            PlayerState::Restart => {
                let mut engine = engine.lock().unwrap();
                let header = engine.song_header_address();
                prepare(&mut *engine, &mut tracks, header)?;
                drop(engine);
                state.store(PlayerState::Playing);
                let _ = events.try_send(PlayerEvent::StateChanged(PlayerState::Playing));
            }
            PlayerState::Playing => {
                let ended = {
                    let mut engine = engine.lock().unwrap();
                    render_once(&mut *engine, &mut tracks, &mut sink)?
                };
                if ended {
                    state.store(PlayerState::Shutdown);
                    let _ = events.try_send(PlayerEvent::SongEnded);
                    break;
                }
            }
            PlayerState::Paused => transfer.put(&silence),
        }
    }

    // Reset the engine so the next playback starts from a clean state
    let mut engine = engine.lock().unwrap();
    let header = engine.song_header_address();
    prepare(&mut *engine, &mut tracks, header)?;
    Ok(())
}
