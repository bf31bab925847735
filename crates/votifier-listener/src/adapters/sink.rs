//! Vote sink adapters.
//!
//! - `LoggingVoteSink` - default operator-facing sink (structured log line)
//! - `ChannelVoteSink` - forwards votes to an embedding application
//! - `InMemoryVoteSink` - records votes for tests and diagnostics

use std::sync::Mutex;

use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::domain::Vote;
use crate::ports::VoteSink;

/// Logs every vote at `info`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingVoteSink;

impl LoggingVoteSink {
    /// Create a new logging sink.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl VoteSink for LoggingVoteSink {
    fn emit(&self, vote: &Vote) {
        info!(
            protocol = %vote.source_protocol_version,
            service = %vote.service_name,
            username = %vote.username,
            address = %vote.address,
            timestamp = %vote.timestamp,
            "Received vote"
        );
    }
}

/// Forwards votes over an unbounded tokio channel.
#[derive(Debug, Clone)]
pub struct ChannelVoteSink {
    tx: mpsc::UnboundedSender<Vote>,
}

impl ChannelVoteSink {
    /// Create a sink and the receiver that consumes its votes.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Vote>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl VoteSink for ChannelVoteSink {
    fn emit(&self, vote: &Vote) {
        if self.tx.send(vote.clone()).is_err() {
            warn!(service = %vote.service_name, "Vote receiver dropped, vote discarded");
        }
    }
}

/// Stores every vote it receives.
#[derive(Debug, Default)]
pub struct InMemoryVoteSink {
    votes: Mutex<Vec<Vote>>,
}

impl InMemoryVoteSink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All votes received so far.
    #[must_use]
    pub fn votes(&self) -> Vec<Vote> {
        match self.votes.lock() {
            Ok(votes) => votes.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Number of votes received.
    #[must_use]
    pub fn len(&self) -> usize {
        self.votes().len()
    }

    /// Whether no vote has been received.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl VoteSink for InMemoryVoteSink {
    fn emit(&self, vote: &Vote) {
        let mut votes = match self.votes.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        votes.push(vote.clone());
    }
}
