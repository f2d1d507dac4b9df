use tlsforge::dtls::FragmentManager;
use tlsforge::message::{
    fragment_handshake, ChangeCipherSpec, ClientHello, DtlsHandshakeMessageFragment, Finished,
    ServerHello, ServerHelloDone, SrpServerKeyExchange,
};
use tlsforge::record::parse_records;
use tlsforge::types::{ConnectionEnd, ContentType, HandshakeType, ProtocolVersion};
use tlsforge::workflow::WorkflowTrace;
use tlsforge::Config;

use crate::common::*;

const MESSAGE: &[u8] = &[
    0x01, // ClientHello
    0x00, 0x00, 0x0A, // length
    0, 1, 2, 3, 4, 5, 6, 7, 8, 9,
];

const ORDERS: [[usize; 3]; 6] = [
    [0, 1, 2],
    [0, 2, 1],
    [1, 0, 2],
    [1, 2, 0],
    [2, 0, 1],
    [2, 1, 0],
];

#[test]
fn reassembly_in_every_order() {
    init();

    let fragments = fragment_handshake(MESSAGE, 3, 4).unwrap();
    assert_eq!(fragments.len(), 3);

    for order in ORDERS {
        let mut manager = FragmentManager::new();
        for (n, &i) in order.iter().enumerate() {
            assert!(!manager.is_complete(3));
            let complete = manager.add_fragment(&fragments[i]);
            assert_eq!(complete, n == 2, "order {:?}", order);
            assert_eq!(manager.is_complete(3), complete);
        }

        let combined = manager.combined_fragment(3).unwrap();
        assert_eq!(combined.fragment_offset.get().unwrap(), 0);
        assert_eq!(combined.fragment_length.get().unwrap(), 10);
        assert_eq!(combined.to_handshake_bytes().unwrap(), MESSAGE);
    }
}

#[test]
fn duplicates_and_overlaps_complete_once() {
    init();

    let fragments = fragment_handshake(MESSAGE, 0, 4).unwrap();
    let overlap =
        DtlsHandshakeMessageFragment::new(HandshakeType::ClientHello, 10, 0, 2, vec![2, 3, 4, 5]);

    let mut manager = FragmentManager::new();
    manager.add_fragment(&fragments[0]);
    manager.add_fragment(&fragments[0]);
    manager.add_fragment(&overlap);
    assert!(!manager.is_complete(0));
    manager.add_fragment(&fragments[2]);
    assert!(manager.is_complete(0));
    // Late duplicate of a covered range.
    manager.add_fragment(&fragments[1]);

    let bytes = manager.combined_bytes(0).unwrap();
    assert_eq!(bytes.len(), 12 + 10);
    assert_eq!(&bytes[12..], &MESSAGE[4..]);
}

#[test]
fn gap_keeps_message_incomplete() {
    init();

    let fragments = fragment_handshake(MESSAGE, 1, 4).unwrap();
    let mut manager = FragmentManager::new();
    manager.add_fragment(&fragments[0]);
    manager.add_fragment(&fragments[2]);

    assert!(!manager.is_complete(1));
    assert!(manager.combined_fragment(1).is_none());
    assert!(!manager.is_complete(0));

    manager.clear(1);
    assert!(manager.is_empty());
}

#[test]
fn overlapping_bytes_keep_first_value() {
    init();

    let mut manager = FragmentManager::new();
    let first = DtlsHandshakeMessageFragment::new(HandshakeType::Finished, 10, 4, 0, vec![0xAA; 6]);
    let second =
        DtlsHandshakeMessageFragment::new(HandshakeType::Finished, 10, 4, 4, vec![0xBB; 6]);
    assert!(!manager.add_fragment(&first));
    assert!(manager.add_fragment(&second));

    let combined = manager.combined_fragment(4).unwrap();
    let mut expected = vec![0xAA; 6];
    expected.extend_from_slice(&[0xBB; 4]);
    assert_eq!(combined.content.get().unwrap(), expected);
    assert_eq!(combined.msg_type.get().unwrap(), HandshakeType::Finished.as_u8());
}

#[test]
fn fragmented_flights_with_loss_free_shuffle() {
    init();

    let mut client = executor(dtls12_config(ConnectionEnd::Client, 24));
    let mut server = executor(dtls12_config(ConnectionEnd::Server, 24));

    let mut client_hello = WorkflowTrace::new().send(vec![ClientHello::new().into()]);
    assert!(client.execute(&mut client_hello));

    let mut datagrams = client.transport_mut().take_sent();
    assert!(datagrams.len() > 2);
    for (i, datagram) in datagrams.iter().enumerate() {
        let records = parse_records(datagram, true).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].epoch.get().unwrap(), 0);
        assert_eq!(records[0].sequence_number.get().unwrap(), i as u64);
        assert_eq!(records[0].content_type().unwrap(), ContentType::Handshake);
    }

    // Odd datagrams first, then everything again.
    let mut shuffled: Vec<Vec<u8>> = datagrams.iter().skip(1).step_by(2).cloned().collect();
    shuffled.extend(datagrams.iter().step_by(2).cloned());
    shuffled.append(&mut datagrams);
    for d in shuffled {
        server.transport_mut().push_inbound(d);
    }

    let mut server_trace = WorkflowTrace::new()
        .receive(vec![ClientHello::new().into()])
        .send(vec![ServerHello::new().into(), ServerHelloDone::new().into()]);
    assert!(server.execute(&mut server_trace));
    assert_eq!(server.context().read_message_seq(), 1);

    relay(&mut server, &mut client);
    let mut client_trace =
        WorkflowTrace::new().receive(vec![ServerHello::new().into(), ServerHelloDone::new().into()]);
    assert!(client.execute(&mut client_trace));
    assert_eq!(client.context().read_message_seq(), 2);

    assert_eq!(client.context().transcript(), server.context().transcript());
}

fn dtls12_srp_config(end: ConnectionEnd) -> Config {
    Config::builder()
        .connection_end(end)
        .highest_protocol_version(ProtocolVersion::DTLS1_2)
        .default_selected_protocol_version(ProtocolVersion::DTLS1_2)
        .default_selected_cipher_suite(SRP_SUITE)
        .build()
}

#[test]
fn stale_epoch_retransmission_is_dropped() {
    init();

    let mut client = executor(dtls12_srp_config(ConnectionEnd::Client));
    let mut server = executor(dtls12_srp_config(ConnectionEnd::Server));

    let mut client_trace = WorkflowTrace::new()
        .send(vec![ClientHello::new().into()])
        .receive(vec![
            ServerHello::new().into(),
            SrpServerKeyExchange::new().into(),
            ServerHelloDone::new().into(),
        ])
        .send(vec![ChangeCipherSpec::new().into(), Finished::new().into()])
        .receive(vec![ChangeCipherSpec::new().into(), Finished::new().into()]);

    let mut server_trace = WorkflowTrace::new()
        .receive(vec![ClientHello::new().into()])
        .send(vec![
            ServerHello::new().into(),
            SrpServerKeyExchange::new().into(),
            ServerHelloDone::new().into(),
        ])
        .receive(vec![ChangeCipherSpec::new().into(), Finished::new().into()])
        .send(vec![ChangeCipherSpec::new().into(), Finished::new().into()]);

    step(&mut client, &mut client_trace, 0);
    let hello = client.transport_mut().take_sent();
    for datagram in &hello {
        server.transport_mut().push_inbound(datagram.clone());
    }

    step(&mut server, &mut server_trace, 0);
    step(&mut server, &mut server_trace, 1);
    relay(&mut server, &mut client);

    step(&mut client, &mut client_trace, 1);
    step(&mut client, &mut client_trace, 2);

    // The ClientHello datagrams show up again between CCS and Finished.
    let mut flight = client.transport_mut().take_sent().into_iter();
    let ccs = flight.next().unwrap();
    assert_eq!(parse_records(&ccs, true).unwrap()[0].epoch.get().unwrap(), 0);
    server.transport_mut().push_inbound(ccs);
    for datagram in hello {
        server.transport_mut().push_inbound(datagram);
    }
    for datagram in flight {
        assert_eq!(parse_records(&datagram, true).unwrap()[0].epoch.get().unwrap(), 1);
        server.transport_mut().push_inbound(datagram);
    }

    step(&mut server, &mut server_trace, 2);
    assert_eq!(server.record_layer().decryptor().epoch(), 1);
    step(&mut server, &mut server_trace, 3);
    relay(&mut server, &mut client);
    step(&mut client, &mut client_trace, 3);

    assert!(client_trace.executed_as_planned());
    assert!(server_trace.executed_as_planned());
    assert_eq!(client.context().transcript(), server.context().transcript());
}
