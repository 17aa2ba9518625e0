//! Standalone speech playback runner.
//!
//! # Startup sequence
//!
//! 1. Load [`AppConfig`] from disk (defaults on first run).
//! 2. Initialise logging with the configured filter.
//! 3. Resolve the player binary and start the [`PlaybackEngine`].
//! 4. Build the [`SpeechSynthesizer`] with standalone collaborators.
//! 5. Spawn the stdin reader thread and the stdout event printer.
//! 6. Dispatch input until end of input or Ctrl-C, then let the current
//!    utterance finish (or stop it when interrupted).

use std::io::BufReader;
use std::sync::Arc;

use anyhow::Context;
use tokio::sync::mpsc;

use speech_synthesizer::{
    app::{run_dispatch, ChannelSink, DirectiveRouter, Inbound, InboundReader},
    config::AppConfig,
    player::PlaybackEngine,
    protocol::Event,
    speech::{Peers, SpeechSynthesizer},
};

fn main() -> anyhow::Result<()> {
    // 1. Configuration
    let (config, load_error) = match AppConfig::load() {
        Ok(config) => (config, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };

    // 2. Logging
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.filter.as_str()),
    )
    .init();
    log::info!("speech synthesizer starting up");
    if let Some(e) = load_error {
        log::warn!("Failed to load config ({e:#}); using defaults");
    }

    // Tokio runtime (dispatcher + event printer)
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;

    // 3. Playback engine
    let backend = config
        .player
        .kind
        .resolve(&config.player.extra_args)
        .context("no usable media player")?;
    let engine = Arc::new(PlaybackEngine::new(backend)?);

    // 4. Speech controller
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();
    let (peers, dialog) = Peers::standalone(Arc::new(ChannelSink::new(event_tx)));
    let store = config.attachment_store();
    log::info!("attachments are read from {}", store.dir().display());
    let synth = SpeechSynthesizer::new(engine, peers, Arc::new(store));
    let router = DirectiveRouter::new(Arc::clone(&synth));

    // 5. Input and output
    let printer = rt.spawn(async move {
        while let Some(event) = event_rx.recv().await {
            match serde_json::to_string(&event) {
                Ok(line) => println!("{line}"),
                Err(e) => log::error!("cannot encode event: {e}"),
            }
        }
    });

    let (inbound_tx, inbound_rx) = mpsc::channel::<Inbound>(16);
    let _reader = InboundReader::start(BufReader::new(std::io::stdin()), inbound_tx)
        .context("failed to spawn input reader")?;

    // 6. Dispatch
    let interrupted = rt.block_on(async {
        tokio::select! {
            () = run_dispatch(&router, &dialog, inbound_rx) => false,
            _ = tokio::signal::ctrl_c() => true,
        }
    });

    if interrupted {
        log::info!("interrupted, stopping speech");
        synth.stop();
    }
    synth.wait();

    // Dropping the last controller handle drops the engine (quitting any
    // player) and the event sink, which ends the printer.
    drop(router);
    drop(synth);
    if let Err(e) = rt.block_on(printer) {
        log::error!("event printer failed: {e}");
    }

    log::info!("speech synthesizer exiting");
    Ok(())
}
