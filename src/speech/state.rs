//! Speech session state and the completion gate.
//!
//! [`Session`] is the controller's record of the current utterance.  It is
//! owned by the [`SpeechSynthesizer`](super::SpeechSynthesizer) behind a
//! mutex; the lock is only held for short field updates and the engine's
//! non-blocking `play`, never while calling out to a collaborator.
//!
//! [`CompletionSignal`] is the gate `wait()` blocks on.

use std::path::PathBuf;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::player::RunId;
use crate::protocol::PlayerActivity;

// ---------------------------------------------------------------------------
// SpeechPhase
// ---------------------------------------------------------------------------

/// Controller-side phase of an utterance.
///
/// ```text
/// Finished ──Speak accepted──▶ Playing ──eos / error / stop──▶ Finished
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpeechPhase {
    Playing,
    /// Initial state, and the state after every utterance.
    #[default]
    Finished,
}

impl SpeechPhase {
    pub fn activity(self) -> PlayerActivity {
        match self {
            SpeechPhase::Playing => PlayerActivity::Playing,
            SpeechPhase::Finished => PlayerActivity::Finished,
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// The current (or last) utterance.
#[derive(Debug, Default)]
pub struct Session {
    /// Token of the last `Speak` directive seen, accepted or not.
    pub token: String,

    pub phase: SpeechPhase,

    /// Local audio file owned by the current utterance.
    pub resource: Option<PathBuf>,

    /// Set when playback is handed to the engine, cleared by the one
    /// finalization that follows.
    pub in_flight: Option<Utterance>,

    /// The background audio player was paused on our behalf and is owed a
    /// resume.
    pub paused_audio_player: bool,
}

/// The utterance the engine is playing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
    pub token: String,
    /// Engine run playing it; only that run's terminal event ends it.
    pub run: RunId,
}

impl Session {
    /// Everything finalization needs, leaving the session `Finished`.
    ///
    /// Returns `None` when nothing is in flight.
    pub fn finish(&mut self) -> Option<Finished> {
        let utterance = self.in_flight.take()?;
        self.phase = SpeechPhase::Finished;
        Some(Finished {
            token: utterance.token,
            resource: self.resource.take(),
            resume_audio_player: std::mem::take(&mut self.paused_audio_player),
        })
    }

    /// [`finish`](Self::finish), but only if `run` is the one in flight.
    pub fn finish_run(&mut self, run: RunId) -> Option<Finished> {
        match &self.in_flight {
            Some(utterance) if utterance.run == run => self.finish(),
            _ => None,
        }
    }
}

/// Snapshot taken out of a [`Session`] when an utterance ends.
#[derive(Debug, PartialEq, Eq)]
pub struct Finished {
    pub token: String,
    pub resource: Option<PathBuf>,
    pub resume_audio_player: bool,
}

// ---------------------------------------------------------------------------
// CompletionSignal
// ---------------------------------------------------------------------------

/// Single-writer, multi-waiter gate.
///
/// Starts set so that waiting with nothing in flight returns at once.
#[derive(Debug)]
pub struct CompletionSignal {
    done: Mutex<bool>,
    cond: Condvar,
}

impl Default for CompletionSignal {
    fn default() -> Self {
        Self {
            done: Mutex::new(true),
            cond: Condvar::new(),
        }
    }
}

impl CompletionSignal {
    fn lock(&self) -> MutexGuard<'_, bool> {
        self.done.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set(&self) {
        *self.lock() = true;
        self.cond.notify_all();
    }

    pub fn clear(&self) {
        *self.lock() = false;
    }

    pub fn wait(&self) {
        let mut done = self.lock();
        while !*done {
            done = self.cond.wait(done).unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Returns `true` if the signal was set before `timeout` elapsed.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let done = self.lock();
        let (done, _) = self
            .cond
            .wait_timeout_while(done, timeout, |done| !*done)
            .unwrap_or_else(PoisonError::into_inner);
        *done
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
