//! Operator console on stdin.
//!
//! Lines are read on a dedicated OS thread: a pending stdin read would
//! otherwise hold the runtime open at shutdown.

use std::io::BufRead;
use std::thread;

use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Printed by `help`.
pub const HELP_TEXT: &str = "Available commands: stop, reload, uptime, status, pubkey, help";

/// One line typed by the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    /// `stop`, `exit` or `quit`.
    Stop,
    Reload,
    Uptime,
    Status,
    PubKey,
    Help,
    /// Anything else, lowercased.
    Unknown(String),
}

impl ConsoleCommand {
    /// Parse a line. Blank lines yield `None`.
    pub fn parse(line: &str) -> Option<Self> {
        let cmd = line.trim().to_lowercase();
        let command = match cmd.as_str() {
            "" => return None,
            "stop" | "exit" | "quit" => Self::Stop,
            "reload" => Self::Reload,
            "uptime" => Self::Uptime,
            "status" => Self::Status,
            "pubkey" => Self::PubKey,
            "help" => Self::Help,
            _ => Self::Unknown(cmd),
        };
        Some(command)
    }
}

/// Forward parsed commands from `input` until it closes or the receiver
/// goes away. Blocks the calling thread.
pub fn read_commands<R>(input: R, tx: mpsc::Sender<ConsoleCommand>)
where
    R: BufRead,
{
    for line in input.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "Console input failed");
                return;
            }
        };
        let Some(command) = ConsoleCommand::parse(&line) else {
            continue;
        };
        if tx.blocking_send(command).is_err() {
            return;
        }
    }
    debug!("Console input closed");
}

/// Read stdin on a detached thread.
pub fn spawn_stdin_reader(tx: mpsc::Sender<ConsoleCommand>) -> std::io::Result<()> {
    thread::Builder::new()
        .name("votifier-console".to_string())
        .spawn(move || read_commands(std::io::stdin().lock(), tx))
        .map(|_| ())
}
