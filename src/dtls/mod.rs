//! DTLS handshake reassembly.
//!
//! Handshake messages arrive as fragments that may be duplicated, reordered,
//! overlapping, or belong to a message we never saw the start of. One
//! [`FragmentCollector`] per message sequence merges the pieces; the
//! [`FragmentManager`] owns the collectors of one connection.

mod collector;
mod manager;

pub use collector::FragmentCollector;
pub use manager::FragmentManager;
