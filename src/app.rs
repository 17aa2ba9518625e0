//! Directive dispatch and the standalone runner's plumbing.
//!
//! ```text
//! stdin ──InboundReader thread──▶ mpsc<Inbound> ──run_dispatch()──▶ DirectiveRouter
//!                                                                     │
//!                     stdout ◀── mpsc<Event> ◀── ChannelSink ◀── SpeechSynthesizer
//! ```
//!
//! Each input line is one JSON object: either `{"directive": {...}}` or
//! `{"dialogRequestId": "..."}`, the latter standing in for the recognizer
//! by marking which dialog is active.

use std::io::BufRead;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::protocol::{Directive, Event, SPEECH_SYNTHESIZER};
use crate::speech::{EventSink, SharedDialog, SpeakError, SpeechSynthesizer};

// ---------------------------------------------------------------------------
// Inbound
// ---------------------------------------------------------------------------

/// One line of runner input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Inbound {
    Directive {
        directive: Directive,
    },
    Dialog {
        #[serde(rename = "dialogRequestId")]
        dialog_request_id: String,
    },
}

// ---------------------------------------------------------------------------
// DispatchError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("no handler for directive {namespace}.{name}")]
    Unsupported { namespace: String, name: String },

    #[error(transparent)]
    Speak(#[from] SpeakError),
}

// ---------------------------------------------------------------------------
// DirectiveRouter
// ---------------------------------------------------------------------------

/// Routes directives to the component owning their namespace.
#[derive(Clone)]
pub struct DirectiveRouter {
    speech: Arc<SpeechSynthesizer>,
}

impl DirectiveRouter {
    pub fn new(speech: Arc<SpeechSynthesizer>) -> Self {
        Self { speech }
    }

    pub fn speech(&self) -> &Arc<SpeechSynthesizer> {
        &self.speech
    }

    pub fn dispatch(&self, directive: &Directive) -> Result<(), DispatchError> {
        if directive.is(SPEECH_SYNTHESIZER, "Speak") {
            return self.speech.speak(directive).map_err(DispatchError::from);
        }
        Err(DispatchError::Unsupported {
            namespace: directive.header.namespace.clone(),
            name: directive.header.name.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// run_dispatch
// ---------------------------------------------------------------------------

/// Consume inbound messages until the channel closes.
///
/// Dropped directives are not fatal; the controller has already logged why.
pub async fn run_dispatch(
    router: &DirectiveRouter,
    dialog: &SharedDialog,
    mut inbound_rx: mpsc::Receiver<Inbound>,
) {
    while let Some(message) = inbound_rx.recv().await {
        match message {
            Inbound::Dialog { dialog_request_id } => {
                log::debug!("dispatch: active dialog is now {dialog_request_id}");
                dialog.set(dialog_request_id);
            }
            Inbound::Directive { directive } => match router.dispatch(&directive) {
                Ok(()) => {}
                Err(DispatchError::Speak(e)) => log::debug!("dispatch: Speak dropped: {e}"),
                Err(e) => log::warn!("dispatch: {e}"),
            },
        }
    }

    log::info!("dispatch: input closed, dispatcher shutting down");
}

// ---------------------------------------------------------------------------
// InboundReader
// ---------------------------------------------------------------------------

/// Dedicated OS thread parsing input lines into [`Inbound`] messages.
///
/// Stops at end of input or when the receiving side is dropped.  Malformed
/// lines are logged and skipped.
pub struct InboundReader {
    thread: std::thread::JoinHandle<()>,
}

impl InboundReader {
    /// Spawn the reader thread.  It uses `blocking_send`, so `reader` may
    /// block freely.
    pub fn start<R>(reader: R, tx: mpsc::Sender<Inbound>) -> std::io::Result<Self>
    where
        R: BufRead + Send + 'static,
    {
        let thread = std::thread::Builder::new()
            .name("inbound-reader".into())
            .spawn(move || read_inbound(reader, &tx))?;
        Ok(Self { thread })
    }

    /// Wait for the reader to reach end of input.
    pub fn join(self) {
        if self.thread.join().is_err() {
            log::error!("input: reader thread panicked");
        }
    }
}

fn read_inbound<R: BufRead>(reader: R, tx: &mpsc::Sender<Inbound>) {
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                log::error!("input: read failed: {e}");
                break;
            }
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match serde_json::from_str::<Inbound>(line) {
            Ok(message) => {
                if tx.blocking_send(message).is_err() {
                    log::debug!("input: dispatcher gone, reader stopping");
                    return;
                }
            }
            Err(e) => log::warn!("input: skipping malformed line: {e}"),
        }
    }
    log::info!("input: end of input");
}

// ---------------------------------------------------------------------------
// ChannelSink
// ---------------------------------------------------------------------------

/// [`EventSink`] forwarding events over an unbounded channel.
///
/// Unbounded because events are sent both from the async dispatcher and from
/// the playback worker thread, and neither may block.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Event>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::UnboundedSender<Event>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelSink {
    fn send_event(&self, event: Event) {
        if self.tx.send(event).is_err() {
            log::warn!("events: receiver closed, event dropped");
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
