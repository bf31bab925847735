//! # Ports Layer - Hexagonal Architecture Boundaries
//!
//! The listener has one driven port: somewhere to hand decoded votes.
//! Configuration and keys are plain values passed in at construction.

pub mod outbound;

pub use outbound::VoteSink;
