//! Player backends for tests that need a real process but no media player.

use std::io::{self, Write};
use std::process::Command;

use super::PlayerBackend;

/// Runs `sh` on its URI: a `file://` URI names a script file, anything else
/// is a script itself.  Quit types a line, so scripts block with `read`.
#[derive(Debug)]
pub(crate) struct Shell;

impl PlayerBackend for Shell {
    fn name(&self) -> &str {
        "sh"
    }

    fn command(&self, uri: &str) -> Command {
        let mut cmd = Command::new("sh");
        match uri.strip_prefix("file://") {
            Some(path) => cmd.arg(path),
            None => cmd.args(["-c", uri]),
        };
        cmd
    }

    fn send_pause(&self, control: &mut dyn Write) -> io::Result<()> {
        control.write_all(b"p")?;
        control.flush()
    }

    fn send_resume(&self, control: &mut dyn Write) -> io::Result<()> {
        control.write_all(b"r")?;
        control.flush()
    }

    fn send_quit(&self, control: &mut dyn Write) -> io::Result<()> {
        control.write_all(b"q\n")?;
        control.flush()
    }
}

/// Points at a binary that does not exist.
#[derive(Debug)]
pub(crate) struct Missing;

impl PlayerBackend for Missing {
    fn name(&self) -> &str {
        "missing"
    }

    fn command(&self, _: &str) -> Command {
        Command::new("/nonexistent/player-binary")
    }

    fn send_pause(&self, _: &mut dyn Write) -> io::Result<()> {
        Ok(())
    }

    fn send_resume(&self, _: &mut dyn Write) -> io::Result<()> {
        Ok(())
    }

    fn send_quit(&self, _: &mut dyn Write) -> io::Result<()> {
        Ok(())
    }
}
