//! End-to-end runs of workflow traces between two in-memory peers.

mod common;
mod dtls;
mod handshake;
mod overrides;
mod records;
