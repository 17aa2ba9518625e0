//! Speech playback for a voice assistant client.
//!
//! Receives `SpeechSynthesizer.Speak` directives, plays the referenced audio
//! attachment through an external player process, and reports
//! `SpeechStarted` / `SpeechFinished` back to the remote session while
//! keeping alerts and background audio out of the way.
//!
//! - [`player`]: playback engine around a long-lived worker thread.
//! - [`speech`]: the speech session controller.
//! - [`protocol`]: directive and event wire types.
//! - [`cache`]: resolving `cid:` references to local files.
//! - [`config`]: `settings.toml` persistence.
//! - [`app`]: directive routing and the standalone runner's plumbing.

pub mod app;
pub mod cache;
pub mod config;
pub mod player;
pub mod protocol;
pub mod speech;
