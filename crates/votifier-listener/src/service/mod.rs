//! # Service Layer
//!
//! Wires the domain decoders to sockets:
//!
//! - `context` - Immutable snapshot of tokens, keys and sink
//! - `connection` - Per-connection state machine under one deadline
//! - `listener` - TCP accept loop with start/stop lifecycle

pub mod connection;
pub mod context;
pub mod error;
pub mod listener;

pub use connection::ConnectionHandler;
pub use context::{ServerContext, CONNECTION_DEADLINE};
pub use error::{ConnectionError, ListenerError};
pub use listener::VoteListener;
