//! Speech session controller: `SpeechSynthesizer.Speak` → playback → events.
//!
//! # Flow
//!
//! ```text
//! Speak directive
//!   └─▶ dialog check ──stale──▶ dropped
//!   └─▶ arbitrate (stop alerts | pause background audio)
//!   └─▶ record token, resolve cid: ──missing──▶ dropped
//!   └─▶ SpeechStarted, engine.play(file://…), on_speaking      [Playing]
//!
//! engine eos / error for the run in flight (worker thread), or stop()
//!   └─▶ release file, set completion, resume audio player,
//!       SpeechFinished                                          [Finished]
//! ```
//!
//! Each utterance remembers the engine run playing it.  Terminal events of
//! any other run arrive late or after `stop()` and are ignored.
//!
//! [`SpeechSynthesizer::speak`] never waits for playback.  Callers that need
//! a join point use [`SpeechSynthesizer::wait`], but never from a playback
//! callback: the callback is what sets the signal.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use thiserror::Error;

use crate::cache::AttachmentStore;
use crate::player::{Playback, PlaybackEvent, PlaybackEventKind, PlayerState};
use crate::protocol::{Directive, Event, SpeakPayload};

use super::peers::{AlertsState, AudioPlayerState, Peers};
use super::state::{CompletionSignal, Finished, Session, SpeechPhase, Utterance};

const CID_SCHEME: &str = "cid:";

// ---------------------------------------------------------------------------
// SpeakError
// ---------------------------------------------------------------------------

/// Reasons a `Speak` directive is dropped without starting speech.
#[derive(Debug, Error)]
pub enum SpeakError {
    /// The directive belongs to a dialog that is no longer active.
    #[error("directive for dialog {directive} but active dialog is {active:?}")]
    StaleDialog {
        directive: String,
        active: Option<String>,
    },

    #[error("invalid Speak payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),

    /// Only `cid:` references to attachments are played.
    #[error("unsupported speech url: {0}")]
    UnsupportedUrl(String),

    #[error("speech audio not found: {}", .0.display())]
    ResourceNotFound(PathBuf),
}

// ---------------------------------------------------------------------------
// SpeechSynthesizer
// ---------------------------------------------------------------------------

/// Maps `Speak` directives onto the playback engine and reports the
/// lifecycle of each utterance.
///
/// Construct with [`SpeechSynthesizer::new`], which returns an `Arc` because
/// the engine's callbacks hold a weak reference back to the controller.
pub struct SpeechSynthesizer {
    playback: Arc<dyn Playback>,
    peers: Peers,
    store: Arc<dyn AttachmentStore>,
    session: Mutex<Session>,
    finished: CompletionSignal,
}

impl SpeechSynthesizer {
    pub fn new(
        playback: Arc<dyn Playback>,
        peers: Peers,
        store: Arc<dyn AttachmentStore>,
    ) -> Arc<Self> {
        let synth = Arc::new(Self {
            playback,
            peers,
            store,
            session: Mutex::new(Session::default()),
            finished: CompletionSignal::default(),
        });

        for kind in [PlaybackEventKind::Eos, PlaybackEventKind::Error] {
            let weak = Arc::downgrade(&synth);
            synth.playback.subscribe(
                kind,
                Box::new(move |event| {
                    if let Some(synth) = weak.upgrade() {
                        synth.on_playback_event(event);
                    }
                }),
            );
        }

        synth
    }

    // -----------------------------------------------------------------------
    // Directives
    // -----------------------------------------------------------------------

    /// Handle `SpeechSynthesizer.Speak`.
    ///
    /// Returns once playback has been handed to the engine.  Every `Err` means
    /// the directive was dropped with no event sent and no session started.
    pub fn speak(&self, directive: &Directive) -> Result<(), SpeakError> {
        if let Some(id) = directive.header.dialog_request_id.as_deref() {
            let active = self.peers.dialog.dialog_request_id();
            if active.as_deref() != Some(id) {
                log::debug!("speech: dropping Speak for inactive dialog {id}");
                return Err(SpeakError::StaleDialog {
                    directive: id.to_string(),
                    active,
                });
            }
        }

        let payload: SpeakPayload = directive.payload_as().map_err(|e| {
            log::warn!("speech: bad Speak payload: {e}");
            SpeakError::from(e)
        })?;

        let paused_audio_player = self.arbitrate();

        self.lock_session().token.clone_from(&payload.token);

        let resource = match self.resolve(&payload.url) {
            Ok(path) => path,
            Err(e) => {
                log::warn!("speech: {e}");
                self.settle_aborted_pause(paused_audio_player);
                return Err(e);
            }
        };

        self.peers
            .events
            .send_event(Event::speech_started(&payload.token));

        let superseded = {
            let mut session = self.lock_session();
            self.finished.clear();
            session.paused_audio_player |= paused_audio_player;
            session.phase = SpeechPhase::Playing;
            // `play` runs under the session lock, so the new run's terminal
            // event cannot be handled before its id is recorded.
            let run = self.playback.play(&file_uri(&resource));
            session.in_flight = Some(Utterance {
                token: payload.token.clone(),
                run,
            });
            session
                .resource
                .replace(resource.clone())
                .filter(|old| *old != resource)
        };
        if let Some(old) = superseded {
            log::debug!("speech: releasing preempted {}", old.display());
            self.store.release(&old);
        }
        log::info!("speech: playing {}", resource.display());

        self.peers.activity.on_speaking();
        Ok(())
    }

    /// Finalize the current utterance.
    ///
    /// A call with nothing in flight is ignored, so each utterance reports
    /// `SpeechFinished` once.
    pub fn speech_finished(&self) {
        let done = self.lock_session().finish();
        match done {
            Some(done) => self.finalize(done),
            None => log::debug!("speech: finish with nothing in flight, ignored"),
        }
    }

    fn finalize(&self, done: Finished) {
        if let Some(path) = &done.resource {
            self.store.release(path);
        }
        self.finished.set();

        // The activity listener is not told: it would re-enter listening
        // while its speaking callback is still unwinding.
        if done.resume_audio_player
            && self.peers.audio_player.state() == AudioPlayerState::Paused
        {
            log::info!("speech: resuming audio player");
            self.peers.audio_player.resume();
        }

        self.peers
            .events
            .send_event(Event::speech_finished(done.token));
    }

    // -----------------------------------------------------------------------
    // Control
    // -----------------------------------------------------------------------

    /// Ask the engine to stop and finalize the current utterance now.
    ///
    /// The player exits asynchronously; the terminal event of the stopped
    /// run is ignored when it arrives.
    pub fn stop(&self) {
        self.finished.set();
        self.playback.stop();
        self.speech_finished();
        self.lock_session().phase = SpeechPhase::Finished;
    }

    /// Block until the current utterance is finished or stopped.
    ///
    /// Must not be called from a playback callback.
    pub fn wait(&self) {
        self.finished.wait();
    }

    /// [`wait`](Self::wait) with a limit; `true` if speech finished in time.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        self.finished.wait_timeout(timeout)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// `Playing` only while both this controller and the engine say so.
    pub fn state(&self) -> SpeechPhase {
        let phase = self.lock_session().phase;
        if phase == SpeechPhase::Playing && self.playback.state() == PlayerState::Playing {
            SpeechPhase::Playing
        } else {
            SpeechPhase::Finished
        }
    }

    /// `SpeechState` report for the global context.
    pub fn context(&self) -> Event {
        let state = self.state();
        let offset = match state {
            SpeechPhase::Playing => self.playback.position_ms(),
            SpeechPhase::Finished => 0,
        };
        Event::speech_state(self.token(), offset, state.activity())
    }

    /// Token of the last `Speak` directive seen.
    pub fn token(&self) -> String {
        self.lock_session().token.clone()
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn lock_session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn on_playback_event(&self, event: &PlaybackEvent) {
        match event {
            PlaybackEvent::EndOfStream { run } => log::debug!("speech: end of stream (run {run})"),
            PlaybackEvent::Error { run, message } => {
                log::warn!("speech: playback failed (run {run}): {message}");
            }
        }
        let done = self.lock_session().finish_run(event.run());
        match done {
            Some(done) => self.finalize(done),
            None => log::debug!("speech: run {} is not in flight, ignored", event.run()),
        }
    }

    /// Alerts win over background audio.  Returns `true` if the audio player
    /// was paused.
    fn arbitrate(&self) -> bool {
        if self.peers.alerts.state() == AlertsState::Foreground {
            log::info!("speech: stopping alerts");
            self.peers.alerts.stop();
            false
        } else if self.peers.audio_player.state() == AudioPlayerState::Playing {
            log::info!("speech: pausing audio player");
            self.peers.audio_player.pause();
            true
        } else {
            false
        }
    }

    /// The directive was dropped after pausing the audio player.  Hand the
    /// resume to the utterance in flight, or resume now if there is none.
    fn settle_aborted_pause(&self, paused_audio_player: bool) {
        if !paused_audio_player {
            return;
        }
        let mut session = self.lock_session();
        if session.in_flight.is_some() {
            session.paused_audio_player = true;
        } else {
            drop(session);
            self.peers.audio_player.resume();
        }
    }

    fn resolve(&self, url: &str) -> Result<PathBuf, SpeakError> {
        let content_id = url
            .strip_prefix(CID_SCHEME)
            .ok_or_else(|| SpeakError::UnsupportedUrl(url.to_string()))?;
        let path = self.store.path_for(content_id);
        if path.is_file() {
            Ok(path)
        } else {
            Err(SpeakError::ResourceNotFound(path))
        }
    }
}

fn file_uri(path: &Path) -> String {
    format!("file://{}", path.display())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
