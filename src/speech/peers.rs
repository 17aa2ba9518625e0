//! Interfaces of the sibling components the speech controller coordinates
//! with.
//!
//! Only the slice of each component the controller needs is modelled here.
//! [`Peers::standalone`] wires inert stand-ins for running the controller on
//! its own.

use std::sync::{Arc, Mutex, PoisonError};

use crate::protocol::Event;

// ---------------------------------------------------------------------------
// Collaborator traits
// ---------------------------------------------------------------------------

/// The recognizer's currently active dialog.
pub trait DialogSource: Send + Sync {
    fn dialog_request_id(&self) -> Option<String>;
}

/// Alert playback states that matter for arbitration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlertsState {
    #[default]
    Idle,
    /// An alert is sounding.
    Foreground,
    Background,
}

/// Alarms and timers.
pub trait Alerts: Send + Sync {
    fn state(&self) -> AlertsState;
    fn stop(&self);
}

/// Background audio player states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AudioPlayerState {
    #[default]
    Idle,
    Playing,
    Paused,
    Stopped,
    Finished,
}

/// Background music / podcast player.
pub trait AudioPlayer: Send + Sync {
    fn state(&self) -> AudioPlayerState;
    fn pause(&self);
    fn resume(&self);
}

/// Gets told when speech output begins (drives LEDs, mic gating, ...).
pub trait ActivityListener: Send + Sync {
    fn on_speaking(&self);
}

/// Delivery channel to the remote session.
pub trait EventSink: Send + Sync {
    fn send_event(&self, event: Event);
}

// ---------------------------------------------------------------------------
// Peers
// ---------------------------------------------------------------------------

/// Everything the controller talks to besides the playback engine and the
/// attachment store.
#[derive(Clone)]
pub struct Peers {
    pub dialog: Arc<dyn DialogSource>,
    pub alerts: Arc<dyn Alerts>,
    pub audio_player: Arc<dyn AudioPlayer>,
    pub activity: Arc<dyn ActivityListener>,
    pub events: Arc<dyn EventSink>,
}

impl Peers {
    /// No alerts, no background audio; the active dialog is whatever was last
    /// set on the returned [`SharedDialog`].
    pub fn standalone(events: Arc<dyn EventSink>) -> (Self, Arc<SharedDialog>) {
        let dialog = Arc::new(SharedDialog::default());
        let peers = Self {
            dialog: Arc::clone(&dialog) as Arc<dyn DialogSource>,
            alerts: Arc::new(NoAlerts),
            audio_player: Arc::new(NoAudioPlayer),
            activity: Arc::new(LogActivity),
            events,
        };
        (peers, dialog)
    }
}

// ---------------------------------------------------------------------------
// Standalone stand-ins
// ---------------------------------------------------------------------------

/// Dialog id settable from outside, standing in for a recognizer.
#[derive(Debug, Default)]
pub struct SharedDialog {
    current: Mutex<Option<String>>,
}

impl SharedDialog {
    pub fn set(&self, id: impl Into<String>) {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = Some(id.into());
    }
}

impl DialogSource for SharedDialog {
    fn dialog_request_id(&self) -> Option<String> {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[derive(Debug)]
struct NoAlerts;

impl Alerts for NoAlerts {
    fn state(&self) -> AlertsState {
        AlertsState::Idle
    }
    fn stop(&self) {}
}

#[derive(Debug)]
struct NoAudioPlayer;

impl AudioPlayer for NoAudioPlayer {
    fn state(&self) -> AudioPlayerState {
        AudioPlayerState::Idle
    }
    fn pause(&self) {}
    fn resume(&self) {}
}

#[derive(Debug)]
struct LogActivity;

impl ActivityListener for LogActivity {
    fn on_speaking(&self) {
        log::debug!("speech: speaking");
    }
}
