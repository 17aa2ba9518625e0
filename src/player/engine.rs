//! [`PlaybackEngine`]: the production [`Playback`] implementation.
//!
//! One `playback-worker` OS thread lives as long as the engine.  It waits for
//! a start signal, spawns the player, blocks until the process exits, and
//! then reports the outcome unless a newer `play` (or shutdown) arrived in
//! the meantime.  Every report carries the [`RunId`] that `play` returned.
//! Public methods never touch the [`Child`] directly.

use std::process::{Child, ExitStatus};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use super::control::{spawn_player, ControlChannel};
use super::{
    CallbackSlots, Playback, PlaybackCallback, PlaybackEvent, PlaybackEventKind, PlayerBackend,
    PlayerError, PlayerState, RunId,
};

// ---------------------------------------------------------------------------
// PlayClock
// ---------------------------------------------------------------------------

/// Wall-clock play time of the running process, excluding paused spans.
#[derive(Debug, Default)]
struct PlayClock {
    started: Option<Instant>,
    paused_at: Option<Instant>,
    paused_total: Duration,
}

impl PlayClock {
    fn start(&mut self, now: Instant) {
        *self = Self {
            started: Some(now),
            ..Self::default()
        };
    }

    fn reset(&mut self) {
        *self = Self::default();
    }

    fn pause(&mut self, now: Instant) {
        if self.started.is_some() && self.paused_at.is_none() {
            self.paused_at = Some(now);
        }
    }

    fn resume(&mut self, now: Instant) {
        if let Some(at) = self.paused_at.take() {
            self.paused_total += now.duration_since(at);
        }
    }

    fn elapsed(&self, now: Instant) -> Duration {
        let Some(started) = self.started else {
            return Duration::ZERO;
        };
        let end = self.paused_at.unwrap_or(now);
        end.duration_since(started).saturating_sub(self.paused_total)
    }
}

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct Inner {
    state: PlayerState,
    /// Last URI handed to `play`.
    uri: Option<String>,
    /// Id of the last `play`.
    run: RunId,
    /// Start signal; set by `play`, consumed by the worker.  Still being set
    /// when a process exits means that process was preempted.
    start_requested: bool,
    /// Present while a process is running.
    control: Option<ControlChannel>,
    clock: PlayClock,
    shutdown: bool,
}

struct Shared {
    backend: Arc<dyn PlayerBackend>,
    inner: Mutex<Inner>,
    wake: Condvar,
    callbacks: CallbackSlots,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Type the quit key into the running process, if any.
    fn quit_running(&self, inner: &mut Inner) {
        if let Some(control) = inner.control.as_mut() {
            if let Err(e) = self.backend.send_quit(control.writer()) {
                log::warn!("player: failed to send quit to {}: {e}", self.backend.name());
            }
        }
    }
}

// ---------------------------------------------------------------------------
// PlaybackEngine
// ---------------------------------------------------------------------------

/// Drives one external player process at a time.
///
/// Create once at startup with [`PlaybackEngine::new`]; call
/// [`shutdown`](Self::shutdown) (or drop it) when the host exits.
pub struct PlaybackEngine {
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for PlaybackEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackEngine")
            .field("backend", &self.shared.backend.name())
            .field("state", &self.shared.lock().state)
            .finish_non_exhaustive()
    }
}

impl PlaybackEngine {
    /// Start the worker thread for `backend`.
    ///
    /// # Errors
    ///
    /// [`PlayerError::Worker`] if the OS refuses to create the thread.
    pub fn new(backend: Arc<dyn PlayerBackend>) -> Result<Self, PlayerError> {
        let shared = Arc::new(Shared {
            backend,
            inner: Mutex::new(Inner::default()),
            wake: Condvar::new(),
            callbacks: CallbackSlots::default(),
        });

        let worker_shared = Arc::clone(&shared);
        let worker = std::thread::Builder::new()
            .name("playback-worker".into())
            .spawn(move || run_worker(&worker_shared))
            .map_err(PlayerError::Worker)?;

        Ok(Self {
            shared,
            worker: Some(worker),
        })
    }

    /// Quit any running process and wait for the worker to exit.
    ///
    /// No terminal event is delivered for a process cut short here.
    pub fn shutdown(mut self) {
        self.request_shutdown();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("player: worker thread panicked");
            }
        }
    }

    fn request_shutdown(&self) {
        let mut inner = self.shared.lock();
        inner.shutdown = true;
        self.shared.quit_running(&mut inner);
        self.shared.wake.notify_all();
    }
}

impl Drop for PlaybackEngine {
    fn drop(&mut self) {
        // The worker may be blocked on a player that ignores quit; never join
        // here.
        if self.worker.is_some() {
            self.request_shutdown();
        }
    }
}

impl Playback for PlaybackEngine {
    fn play(&self, uri: &str) -> RunId {
        let mut inner = self.shared.lock();
        // The worker sees `start_requested` when the old process exits and
        // suppresses its end-of-stream.
        self.shared.quit_running(&mut inner);
        inner.run += 1;
        inner.uri = Some(uri.to_string());
        inner.start_requested = true;
        inner.state = PlayerState::Playing;
        self.shared.wake.notify_all();
        log::debug!("player: run {} requested for {uri}", inner.run);
        inner.run
    }

    fn pause(&self) {
        let mut inner = self.shared.lock();
        if inner.state != PlayerState::Playing {
            return;
        }
        let Some(control) = inner.control.as_mut() else {
            log::debug!("player: pause ignored, process not started yet");
            return;
        };
        if let Err(e) = self.shared.backend.send_pause(control.writer()) {
            log::warn!("player: failed to send pause: {e}");
            return;
        }
        inner.state = PlayerState::Paused;
        inner.clock.pause(Instant::now());
    }

    fn resume(&self) {
        let mut inner = self.shared.lock();
        if inner.state != PlayerState::Paused {
            return;
        }
        if let Some(control) = inner.control.as_mut() {
            if let Err(e) = self.shared.backend.send_resume(control.writer()) {
                log::warn!("player: failed to send resume: {e}");
                return;
            }
        }
        inner.state = PlayerState::Playing;
        inner.clock.resume(Instant::now());
    }

    fn stop(&self) {
        let mut inner = self.shared.lock();
        self.shared.quit_running(&mut inner);
        inner.state = PlayerState::Idle;
    }

    fn state(&self) -> PlayerState {
        self.shared.lock().state
    }

    fn position_ms(&self) -> u64 {
        let elapsed = self.shared.lock().clock.elapsed(Instant::now());
        u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
    }

    fn subscribe(&self, kind: PlaybackEventKind, callback: PlaybackCallback) {
        self.shared.callbacks.set(kind, callback);
    }
}

// ---------------------------------------------------------------------------
// Worker loop
// ---------------------------------------------------------------------------

fn run_worker(shared: &Shared) {
    loop {
        let Some((run, uri, mut child)) = next_process(shared) else {
            break;
        };

        log::info!("player: playing {uri} (run {run})");
        let status = child.wait();
        log::info!("player: finished {uri} (run {run})");

        let outcome = {
            let mut inner = shared.lock();
            inner.control = None;
            inner.clock.reset();
            if inner.start_requested || inner.shutdown {
                None
            } else {
                inner.state = PlayerState::Idle;
                Some(exit_event(shared.backend.name(), run, status))
            }
        };

        match outcome {
            Some(event) => shared.callbacks.emit(&event),
            None => log::debug!("player: {uri} preempted, end-of-stream suppressed"),
        }
    }
    log::debug!("player: worker exiting");
}

/// Block until a start is requested and spawn the player for it.
///
/// Starts that fail, or that were stopped before spawning, are reported from
/// here and the wait resumes.  Returns `None` on shutdown.
fn next_process(shared: &Shared) -> Option<(RunId, String, Child)> {
    loop {
        let mut inner = shared.lock();
        while !inner.start_requested && !inner.shutdown {
            inner = shared
                .wake
                .wait(inner)
                .unwrap_or_else(PoisonError::into_inner);
        }
        if inner.shutdown {
            return None;
        }
        inner.start_requested = false;
        let run = inner.run;
        let uri = inner.uri.clone().unwrap_or_default();

        if inner.state == PlayerState::Idle {
            drop(inner);
            log::debug!("player: {uri} stopped before it started");
            shared.callbacks.emit(&PlaybackEvent::EndOfStream { run });
            continue;
        }

        // Spawned under the lock so a concurrent `play` always finds the
        // control channel of the process it preempts.
        match spawn_player(shared.backend.as_ref(), &uri) {
            Ok((child, control)) => {
                inner.control = Some(control);
                inner.state = PlayerState::Playing;
                inner.clock.start(Instant::now());
                return Some((run, uri, child));
            }
            Err(e) => {
                inner.state = PlayerState::Idle;
                drop(inner);
                log::error!("player: cannot play {uri}: {e}");
                shared.callbacks.emit(&PlaybackEvent::Error {
                    run,
                    message: e.to_string(),
                });
            }
        }
    }
}

fn exit_event(program: &str, run: RunId, status: std::io::Result<ExitStatus>) -> PlaybackEvent {
    let message = match status {
        Ok(status) if status.success() => return PlaybackEvent::EndOfStream { run },
        Ok(status) => format!("{program} exited with {status}"),
        Err(e) => format!("waiting for {program} failed: {e}"),
    };
    PlaybackEvent::Error { run, message }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
