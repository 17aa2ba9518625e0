//! Playback engine driving an external media player process.
//!
//! # Architecture
//!
//! ```text
//! caller thread                       playback-worker thread
//! ─────────────                       ──────────────────────
//! play(uri) ──start signal──────────▶ spawn player (pty stdin)
//! pause/resume/stop ──keystrokes──▶   │  blocks on process exit
//!                                     ▼
//!                         not preempted? ──▶ EndOfStream / Error callback
//! ```
//!
//! The worker is the only owner of the process lifecycle.  Every other
//! method either flips the start signal or writes keystrokes into the
//! control channel through the [`PlayerBackend`] in use, so the engine does
//! not care which player binary backs it.

pub mod backend;
pub mod control;
pub mod engine;
#[cfg(test)]
pub mod mock;
#[cfg(test)]
pub(crate) mod testing;

use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use backend::{Mpg123, Mpv, PlayerBackend, PlayerKind};
pub use control::ControlChannel;
pub use engine::PlaybackEngine;

#[cfg(test)]
pub use mock::MockPlayback;

// ---------------------------------------------------------------------------
// PlayerState
// ---------------------------------------------------------------------------

/// Engine state machine.
///
/// ```text
/// Idle ──play──▶ Playing ──pause──▶ Paused ──resume──▶ Playing
/// Playing | Paused ──stop / eos / error──▶ Idle
/// Playing | Paused ──play──▶ Playing   (current process preempted)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlayerState {
    #[default]
    Idle,
    Playing,
    Paused,
}

// ---------------------------------------------------------------------------
// PlaybackEvent
// ---------------------------------------------------------------------------

/// Identifies one [`Playback::play`] call.  Increases with every call.
pub type RunId = u64;

/// Terminal events delivered from the worker thread, tagged with the run
/// they end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackEvent {
    /// The player process ran to completion (or was told to quit).
    EndOfStream { run: RunId },
    /// The player could not be started or exited abnormally.
    Error { run: RunId, message: String },
}

impl PlaybackEvent {
    pub fn kind(&self) -> PlaybackEventKind {
        match self {
            PlaybackEvent::EndOfStream { .. } => PlaybackEventKind::Eos,
            PlaybackEvent::Error { .. } => PlaybackEventKind::Error,
        }
    }

    pub fn run(&self) -> RunId {
        match self {
            PlaybackEvent::EndOfStream { run } | PlaybackEvent::Error { run, .. } => *run,
        }
    }
}

/// Subscription slot selector, one per [`PlaybackEvent`] variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaybackEventKind {
    Eos,
    Error,
}

/// Handler invoked on the worker thread.  Must not block on the engine's own
/// completion.
pub type PlaybackCallback = Box<dyn Fn(&PlaybackEvent) + Send + Sync>;

/// One callback slot per event kind; the last registration wins.
#[derive(Default)]
pub(crate) struct CallbackSlots {
    slots: Mutex<Slots>,
}

#[derive(Default)]
struct Slots {
    eos: Option<Arc<dyn Fn(&PlaybackEvent) + Send + Sync>>,
    error: Option<Arc<dyn Fn(&PlaybackEvent) + Send + Sync>>,
}

impl CallbackSlots {
    pub(crate) fn set(&self, kind: PlaybackEventKind, callback: PlaybackCallback) {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        let callback = Some(Arc::from(callback));
        match kind {
            PlaybackEventKind::Eos => slots.eos = callback,
            PlaybackEventKind::Error => slots.error = callback,
        }
    }

    /// Invoke the matching handler.  The slot lock is released first so the
    /// handler may re-register or call back into the engine.
    pub(crate) fn emit(&self, event: &PlaybackEvent) {
        let handler = {
            let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            match event.kind() {
                PlaybackEventKind::Eos => slots.eos.clone(),
                PlaybackEventKind::Error => slots.error.clone(),
            }
        };
        match handler {
            Some(handler) => handler(event),
            None => log::debug!("player: no subscriber for {:?}", event.kind()),
        }
    }
}

// ---------------------------------------------------------------------------
// Playback trait
// ---------------------------------------------------------------------------

/// Object-safe interface the speech controller drives.
///
/// All methods return immediately; process start and exit are observed on
/// the engine's worker thread and reported through [`subscribe`](Self::subscribe).
pub trait Playback: Send + Sync {
    /// Start playing `uri`, preempting whatever is playing now.
    ///
    /// The returned id is carried by the terminal event of this run.  A
    /// preempted run may never report.
    fn play(&self, uri: &str) -> RunId;
    /// Pause; effective only while [`PlayerState::Playing`].
    fn pause(&self);
    /// Resume; effective only while [`PlayerState::Paused`].
    fn resume(&self);
    /// Ask the current process to quit and go [`PlayerState::Idle`].
    fn stop(&self);
    fn state(&self) -> PlayerState;
    /// Best-effort play position of the current item in milliseconds.
    fn position_ms(&self) -> u64;
    /// Length of the current item; `0` when the player exposes none.
    fn duration_ms(&self) -> u64 {
        0
    }
    /// Register the handler for `kind`, replacing any previous one.
    fn subscribe(&self, kind: PlaybackEventKind, callback: PlaybackCallback);
}

// Compile-time assertion: Arc<dyn Playback> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Arc<dyn Playback>) {}
};

// ---------------------------------------------------------------------------
// PlayerError
// ---------------------------------------------------------------------------

/// Errors raised while choosing or launching a player.
#[derive(Debug, Error)]
pub enum PlayerError {
    /// None of the candidate player binaries is on `PATH`.
    #[error("no media player found on PATH (tried: {0})")]
    NotInstalled(String),

    /// The player process could not be spawned.
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The pseudo-terminal for keystroke control could not be opened.
    #[error("cannot open player control channel: {0}")]
    ControlChannel(#[source] std::io::Error),

    /// The worker thread could not be started.
    #[error("cannot start playback worker: {0}")]
    Worker(#[source] std::io::Error),
}
