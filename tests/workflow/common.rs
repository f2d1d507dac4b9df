//! Shared helpers for the workflow integration tests.

#![allow(unused)]

use tlsforge::record::{parse_records, Record};
use tlsforge::types::{CipherSuite, ConnectionEnd, ProtocolVersion};
use tlsforge::workflow::{MemoryTransport, Transport, WorkflowExecutor, WorkflowTrace};
use tlsforge::Config;

pub const SRP_SUITE: CipherSuite = CipherSuite::TLS_SRP_SHA_WITH_AES_128_CBC_SHA;

pub fn init() {
    let _ = env_logger::try_init();
}

pub fn tls12_config(end: ConnectionEnd, suite: CipherSuite) -> Config {
    Config::builder()
        .connection_end(end)
        .default_selected_cipher_suite(suite)
        .build()
}

pub fn dtls12_config(end: ConnectionEnd, max_fragment: usize) -> Config {
    Config::builder()
        .connection_end(end)
        .highest_protocol_version(ProtocolVersion::DTLS1_2)
        .default_selected_protocol_version(ProtocolVersion::DTLS1_2)
        .dtls_max_fragment_length(max_fragment)
        .build()
}

pub fn executor(config: Config) -> WorkflowExecutor<MemoryTransport> {
    WorkflowExecutor::new(config, MemoryTransport::new())
}

/// Run one action of `trace`.
pub fn step(executor: &mut WorkflowExecutor<MemoryTransport>, trace: &mut WorkflowTrace, index: usize) {
    executor
        .execute_action(&mut trace.actions_mut()[index])
        .unwrap();
}

/// Move everything `from` sent into the inbound queue of `to`.
pub fn relay(
    from: &mut WorkflowExecutor<MemoryTransport>,
    to: &mut WorkflowExecutor<MemoryTransport>,
) -> usize {
    let sent = from.transport_mut().take_sent();
    let count = sent.len();
    for chunk in sent {
        to.transport_mut().push_inbound(chunk);
    }
    count
}

/// Plaintext TLS records of one sent chunk.
pub fn records_of(wire: &[u8]) -> Vec<Record> {
    parse_records(wire, false).unwrap()
}
