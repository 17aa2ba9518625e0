//! Speech session controller.
//!
//! [`SpeechSynthesizer`] turns `SpeechSynthesizer.Speak` directives into
//! playback on a [`Playback`](crate::player::Playback) engine, keeps only
//! one utterance in flight, arbitrates with the alerts and background audio
//! components listed in [`Peers`], and reports `SpeechStarted` /
//! `SpeechFinished` through the event sink.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use speech_synthesizer::cache::TempDirStore;
//! use speech_synthesizer::player::{PlaybackEngine, PlayerKind};
//! use speech_synthesizer::speech::{Peers, SpeechSynthesizer};
//! # use speech_synthesizer::{protocol::Event, speech::EventSink};
//! # struct Print;
//! # impl EventSink for Print { fn send_event(&self, e: Event) { println!("{e:?}") } }
//!
//! let backend = PlayerKind::Auto.resolve(&[]).expect("install mpg123 or mpv");
//! let engine = Arc::new(PlaybackEngine::new(backend).unwrap());
//! let (peers, _dialog) = Peers::standalone(Arc::new(Print));
//! let synth = SpeechSynthesizer::new(engine, peers, Arc::new(TempDirStore::default()));
//!
//! // synth.speak(&directive)?;  synth.wait();
//! ```

pub mod peers;
pub mod state;
pub mod synthesizer;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use peers::{
    ActivityListener, Alerts, AlertsState, AudioPlayer, AudioPlayerState, DialogSource,
    EventSink, Peers, SharedDialog,
};
pub use state::{CompletionSignal, Finished, Session, SpeechPhase, Utterance};
pub use synthesizer::{SpeakError, SpeechSynthesizer};
