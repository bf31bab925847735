//! # Driven Ports (Outbound SPI)
//!
//! Interfaces the host application provides to the listener.

use crate::domain::Vote;

/// Consumer of decoded votes.
///
/// Called once per accepted vote from the connection's own task, before the
/// V2 acknowledgment is written.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`: every connection task shares the
/// same sink.
///
/// # Example Implementation
///
/// ```rust,ignore
/// struct RewardSink { tx: Sender<Vote> }
///
/// impl VoteSink for RewardSink {
///     fn emit(&self, vote: &Vote) {
///         let _ = self.tx.try_send(vote.clone());
///     }
/// }
/// ```
pub trait VoteSink: Send + Sync {
    /// Deliver one decoded vote.
    fn emit(&self, vote: &Vote);
}
