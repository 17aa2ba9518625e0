//! Spawning a player bound to a keystroke control channel.
//!
//! On unix the player's stdin is the slave side of a fresh pseudo-terminal,
//! so players that only read keys from a tty (mpv, mpg123 `-C`) accept our
//! keystrokes; we keep the master side.  Elsewhere a plain stdin pipe is used.

use std::fmt;
use std::io::{self, Write};
use std::process::{Child, Stdio};

use super::{PlayerBackend, PlayerError};

/// Write end of a player's terminal.
pub struct ControlChannel {
    writer: Box<dyn Write + Send>,
}

impl ControlChannel {
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self { writer }
    }

    pub fn writer(&mut self) -> &mut dyn Write {
        &mut *self.writer
    }
}

impl fmt::Debug for ControlChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControlChannel").finish_non_exhaustive()
    }
}

/// Start `backend` on `uri` with its stdin attached to a new control channel.
pub fn spawn_player(
    backend: &dyn PlayerBackend,
    uri: &str,
) -> Result<(Child, ControlChannel), PlayerError> {
    let mut command = backend.command(uri);
    command.stdout(Stdio::null()).stderr(Stdio::null());

    let spawn_error = |source: io::Error| PlayerError::Spawn {
        program: backend.name().to_string(),
        source,
    };

    #[cfg(unix)]
    {
        let pty = nix::pty::openpty(None, None)
            .map_err(|errno| PlayerError::ControlChannel(io::Error::from(errno)))?;
        command.stdin(Stdio::from(pty.slave));
        let child = command.spawn().map_err(spawn_error)?;
        // Drop our copy of the slave so the tty goes away with the child.
        drop(command);
        let master = std::fs::File::from(pty.master);
        Ok((child, ControlChannel::new(Box::new(master))))
    }

    #[cfg(not(unix))]
    {
        command.stdin(Stdio::piped());
        let mut child = command.spawn().map_err(spawn_error)?;
        let stdin = child.stdin.take().ok_or_else(|| {
            PlayerError::ControlChannel(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "player stdin was not captured",
            ))
        })?;
        Ok((child, ControlChannel::new(Box::new(stdin))))
    }
}
