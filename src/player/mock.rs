//! Scriptable [`Playback`] double for controller tests.
//!
//! Records every call and lets the test decide when the "process" ends via
//! [`MockPlayback::finish`] or [`MockPlayback::fail`], or deliver a late
//! event for an older run with [`MockPlayback::finish_run`].  Events fire on
//! the calling thread.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use super::{
    CallbackSlots, Playback, PlaybackCallback, PlaybackEvent, PlaybackEventKind, PlayerState,
    RunId,
};

#[derive(Default)]
pub struct MockPlayback {
    state: Mutex<PlayerState>,
    calls: Mutex<Vec<String>>,
    position: AtomicU64,
    runs: AtomicU64,
    callbacks: CallbackSlots,
}

impl MockPlayback {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Calls so far, e.g. `["play file:///tmp/x.mp3", "stop"]`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn set_state(&self, state: PlayerState) {
        *self.state.lock().unwrap() = state;
    }

    pub fn set_position(&self, ms: u64) {
        self.position.store(ms, Ordering::SeqCst);
    }

    /// Id returned by the latest `play`.
    pub fn last_run(&self) -> RunId {
        self.runs.load(Ordering::SeqCst)
    }

    /// Simulate a natural end of stream of the latest run.
    pub fn finish(&self) {
        self.finish_run(self.last_run());
    }

    /// End of stream for `run`, which may be an older one.
    pub fn finish_run(&self, run: RunId) {
        if run == self.last_run() {
            self.set_state(PlayerState::Idle);
        }
        self.callbacks.emit(&PlaybackEvent::EndOfStream { run });
    }

    /// Simulate a failure of the latest run.
    pub fn fail(&self, message: &str) {
        self.set_state(PlayerState::Idle);
        self.callbacks.emit(&PlaybackEvent::Error {
            run: self.last_run(),
            message: message.to_string(),
        });
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

impl Playback for MockPlayback {
    fn play(&self, uri: &str) -> RunId {
        self.record(format!("play {uri}"));
        self.set_state(PlayerState::Playing);
        self.runs.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn pause(&self) {
        self.record("pause".into());
        self.set_state(PlayerState::Paused);
    }

    fn resume(&self) {
        self.record("resume".into());
        self.set_state(PlayerState::Playing);
    }

    fn stop(&self) {
        self.record("stop".into());
        self.set_state(PlayerState::Idle);
    }

    fn state(&self) -> PlayerState {
        *self.state.lock().unwrap()
    }

    fn position_ms(&self) -> u64 {
        self.position.load(Ordering::SeqCst)
    }

    fn subscribe(&self, kind: PlaybackEventKind, callback: PlaybackCallback) {
        self.callbacks.set(kind, callback);
    }
}
