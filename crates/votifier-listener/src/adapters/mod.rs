//! # Adapters
//!
//! Concrete implementations at the edges of the listener:
//!
//! - `keys` - RSA key files (load, generate, export)
//! - `sink` - Vote sinks (logging, channel, in-memory)

pub mod keys;
pub mod sink;

pub use keys::{
    generate_and_save_keys, load_or_generate_keys, load_private_key, public_key_pem,
    public_key_single_line, KeyError, PRIVATE_KEY_FILE, PUBLIC_KEY_FILE,
};
pub use sink::{ChannelVoteSink, InMemoryVoteSink, LoggingVoteSink};

#[cfg(test)]
mod tests;
