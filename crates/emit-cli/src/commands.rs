//! Line commands read from stdin.
//!
//! ```text
//! reset 250ms   change the period
//! pause         same as `reset 0s`
//! stop | quit   stop the ticker and exit
//! ```

use crossbeam_channel::{unbounded, Receiver};
use emit_common::config::parse_period;
use emit_common::error::EmitError;
use std::io::BufRead;
use std::str::FromStr;
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

/// A control command for the running ticker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Change the period; zero pauses.
    Reset(Duration),
    /// Pause ticking.
    Pause,
    /// Stop the ticker and exit.
    Stop,
}

impl FromStr for Command {
    type Err = EmitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (verb, rest) = s.split_once(char::is_whitespace).unwrap_or((s, ""));
        let rest = rest.trim();

        match verb.to_ascii_lowercase().as_str() {
            "reset" if rest.is_empty() => Err(EmitError::InvalidCommand(
                "reset needs a period, e.g. `reset 100ms`".into(),
            )),
            "reset" => Ok(Command::Reset(parse_period(rest)?)),
            "pause" if rest.is_empty() => Ok(Command::Pause),
            "stop" | "quit" | "exit" if rest.is_empty() => Ok(Command::Stop),
            _ => Err(EmitError::InvalidCommand(s.to_string())),
        }
    }
}

/// Read commands from `input` on a background thread.
///
/// The returned channel disconnects at end of input.
///
/// # Errors
///
/// Returns an error if the reader thread cannot be spawned.
pub fn spawn_reader<R>(input: R) -> std::io::Result<Receiver<Command>>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = unbounded();

    thread::Builder::new()
        .name("emit-commands".into())
        .spawn(move || {
            for line in input.lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        warn!("Failed to read command: {e}");
                        break;
                    }
                };
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<Command>() {
                    Ok(command) => {
                        if tx.send(command).is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!("{e}"),
                }
            }
            debug!("Command input closed");
        })?;

    Ok(rx)
}
