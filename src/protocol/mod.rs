//! Wire types exchanged with the remote session.
//!
//! Inbound [`Directive`]s arrive as `{header, payload}` JSON objects; the
//! payload stays an untyped [`serde_json::Value`] until the handler for the
//! directive's namespace decodes it with [`Directive::payload_as`].
//!
//! Outbound [`Event`]s share the same header shape and carry either a bare
//! token or a state report.

pub mod directive;
pub mod event;

pub use directive::{Directive, Header, SpeakPayload, AUDIO_MPEG};
pub use event::{Event, EventPayload, PlayerActivity};

/// Namespace owned by the speech session controller.
pub const SPEECH_SYNTHESIZER: &str = "SpeechSynthesizer";
