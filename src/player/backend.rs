//! Player binaries and their keystroke protocols.
//!
//! Each [`PlayerBackend`] knows how to build the command line for a URI and
//! which keys pause, resume and quit it when typed into its terminal.  The
//! binary is chosen once at startup via [`PlayerKind::resolve`].

use std::fmt;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::Command;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::PlayerError;

/// Capability interface over a concrete player executable.
pub trait PlayerBackend: Send + Sync + fmt::Debug {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Command that plays `uri`.  Stdio is wired by the engine.
    fn command(&self, uri: &str) -> Command;

    fn send_pause(&self, control: &mut dyn Write) -> io::Result<()>;

    fn send_resume(&self, control: &mut dyn Write) -> io::Result<()>;

    fn send_quit(&self, control: &mut dyn Write) -> io::Result<()>;
}

fn send_key(control: &mut dyn Write, key: &[u8]) -> io::Result<()> {
    control.write_all(key)?;
    control.flush()
}

// ---------------------------------------------------------------------------
// mpv
// ---------------------------------------------------------------------------

/// `mpv --no-video <uri>`; space toggles pause, `q` quits.
#[derive(Debug, Clone)]
pub struct Mpv {
    program: PathBuf,
    extra_args: Vec<String>,
}

impl Mpv {
    pub fn new(program: impl Into<PathBuf>, extra_args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            extra_args,
        }
    }
}

impl PlayerBackend for Mpv {
    fn name(&self) -> &str {
        "mpv"
    }

    fn command(&self, uri: &str) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("--no-video").args(&self.extra_args).arg(uri);
        cmd
    }

    fn send_pause(&self, control: &mut dyn Write) -> io::Result<()> {
        send_key(control, b" ")
    }

    fn send_resume(&self, control: &mut dyn Write) -> io::Result<()> {
        send_key(control, b" ")
    }

    fn send_quit(&self, control: &mut dyn Write) -> io::Result<()> {
        send_key(control, b"q")
    }
}

// ---------------------------------------------------------------------------
// mpg123
// ---------------------------------------------------------------------------

/// `mpg123 -q -C <path>`; `s` toggles pause, `q` quits.
///
/// mpg123 does not understand `file://` URIs, so local files are passed as
/// plain paths.
#[derive(Debug, Clone)]
pub struct Mpg123 {
    program: PathBuf,
    extra_args: Vec<String>,
}

impl Mpg123 {
    pub fn new(program: impl Into<PathBuf>, extra_args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            extra_args,
        }
    }
}

impl PlayerBackend for Mpg123 {
    fn name(&self) -> &str {
        "mpg123"
    }

    fn command(&self, uri: &str) -> Command {
        let target = uri.strip_prefix("file://").unwrap_or(uri);
        let mut cmd = Command::new(&self.program);
        cmd.args(["-q", "-C"]).args(&self.extra_args).arg(target);
        cmd
    }

    fn send_pause(&self, control: &mut dyn Write) -> io::Result<()> {
        send_key(control, b"s")
    }

    fn send_resume(&self, control: &mut dyn Write) -> io::Result<()> {
        send_key(control, b"s")
    }

    fn send_quit(&self, control: &mut dyn Write) -> io::Result<()> {
        send_key(control, b"q")
    }
}

// ---------------------------------------------------------------------------
// PlayerKind
// ---------------------------------------------------------------------------

/// Player selection from the configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerKind {
    /// Probe `PATH`, preferring mpg123 (quicker to start) over mpv.
    #[default]
    Auto,
    Mpg123,
    Mpv,
}

impl PlayerKind {
    /// Locate the binary on `PATH` and build its backend.
    pub fn resolve(self, extra_args: &[String]) -> Result<Arc<dyn PlayerBackend>, PlayerError> {
        let candidates: &[PlayerKind] = match self {
            PlayerKind::Auto => &[PlayerKind::Mpg123, PlayerKind::Mpv],
            PlayerKind::Mpg123 => &[PlayerKind::Mpg123],
            PlayerKind::Mpv => &[PlayerKind::Mpv],
        };

        for kind in candidates {
            if let Ok(program) = which::which(kind.binary()) {
                log::info!("player: using {} at {}", kind.binary(), program.display());
                return Ok(kind.build(program, extra_args.to_vec()));
            }
            log::debug!("player: {} not on PATH", kind.binary());
        }

        let tried: Vec<&str> = candidates.iter().map(|k| k.binary()).collect();
        Err(PlayerError::NotInstalled(tried.join(", ")))
    }

    fn binary(self) -> &'static str {
        match self {
            PlayerKind::Auto | PlayerKind::Mpg123 => "mpg123",
            PlayerKind::Mpv => "mpv",
        }
    }

    fn build(self, program: PathBuf, extra_args: Vec<String>) -> Arc<dyn PlayerBackend> {
        match self {
            PlayerKind::Mpv => Arc::new(Mpv::new(program, extra_args)),
            PlayerKind::Auto | PlayerKind::Mpg123 => Arc::new(Mpg123::new(program, extra_args)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(cmd: &Command) -> Vec<String> {
        cmd.get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn mpv_command_line() {
        let mpv = Mpv::new("mpv", vec!["--volume=50".into()]);
        let cmd = mpv.command("file:///tmp/a.mp3");
        assert_eq!(cmd.get_program(), "mpv");
        assert_eq!(args(&cmd), ["--no-video", "--volume=50", "file:///tmp/a.mp3"]);
    }

    #[test]
    fn mpg123_strips_file_scheme() {
        let mpg = Mpg123::new("/usr/bin/mpg123", Vec::new());
        let cmd = mpg.command("file:///tmp/a.mp3");
        assert_eq!(args(&cmd), ["-q", "-C", "/tmp/a.mp3"]);

        let cmd = mpg.command("http://example.com/a.mp3");
        assert_eq!(args(&cmd), ["-q", "-C", "http://example.com/a.mp3"]);
    }

    #[test]
    fn keystrokes() {
        let mpv = Mpv::new("mpv", Vec::new());
        let mut out = Vec::new();
        mpv.send_pause(&mut out).unwrap();
        mpv.send_resume(&mut out).unwrap();
        mpv.send_quit(&mut out).unwrap();
        assert_eq!(out, b"  q");

        let mpg = Mpg123::new("mpg123", Vec::new());
        let mut out = Vec::new();
        mpg.send_pause(&mut out).unwrap();
        mpg.send_quit(&mut out).unwrap();
        assert_eq!(out, b"sq");
    }

    #[test]
    fn player_kind_parses_lowercase() {
        #[derive(Deserialize)]
        struct Wrapper {
            kind: PlayerKind,
        }
        let w: Wrapper = toml::from_str("kind = \"mpv\"").unwrap();
        assert_eq!(w.kind, PlayerKind::Mpv);
        let w: Wrapper = toml::from_str("kind = \"auto\"").unwrap();
        assert_eq!(w.kind, PlayerKind::Auto);
    }
}
