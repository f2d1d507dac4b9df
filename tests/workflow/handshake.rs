use tlsforge::message::{
    ChangeCipherSpec, ClientHello, Finished, ProtocolMessage, ServerHello, ServerHelloDone,
    SrpServerKeyExchange,
};
use tlsforge::types::ConnectionEnd;
use tlsforge::workflow::WorkflowTrace;

use crate::common::*;

fn finished_verify_data<'a>(mut messages: impl Iterator<Item = &'a ProtocolMessage>) -> Vec<u8> {
    match messages.find(|m| matches!(m, ProtocolMessage::Finished(_))) {
        Some(ProtocolMessage::Finished(f)) => f.verify_data.get().unwrap(),
        _ => panic!("no Finished message"),
    }
}

#[test]
fn srp_handshake_between_two_executors() {
    init();

    let mut client = executor(tls12_config(ConnectionEnd::Client, SRP_SUITE));
    let mut server = executor(tls12_config(ConnectionEnd::Server, SRP_SUITE));

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
    relay(&mut client, &mut server);

    step(&mut server, &mut server_trace, 0);
    step(&mut server, &mut server_trace, 1);
    relay(&mut server, &mut client);

    step(&mut client, &mut client_trace, 1);
    step(&mut client, &mut client_trace, 2);
    assert_eq!(relay(&mut client, &mut server), 2);

    step(&mut server, &mut server_trace, 2);
    step(&mut server, &mut server_trace, 3);
    relay(&mut server, &mut client);

    step(&mut client, &mut client_trace, 3);

    assert!(client_trace.executed_as_planned());
    assert!(server_trace.executed_as_planned());

    assert_eq!(client.context().transcript(), server.context().transcript());
    assert_eq!(client.context().client_random(), server.context().client_random());
    assert_eq!(client.context().server_random(), server.context().server_random());

    assert_eq!(
        finished_verify_data(client_trace.sent_messages()),
        finished_verify_data(server_trace.received_messages())
    );
    assert_eq!(
        finished_verify_data(server_trace.sent_messages()),
        finished_verify_data(client_trace.received_messages())
    );
    assert_ne!(
        finished_verify_data(client_trace.sent_messages()),
        finished_verify_data(server_trace.sent_messages())
    );

    // Both sides protect their records after the change of cipher spec.
    assert!(!client.record_layer().encryptor().is_null());
    assert!(!client.record_layer().decryptor().is_null());
    assert!(!server.record_layer().encryptor().is_null());
    assert!(!server.record_layer().decryptor().is_null());
}

#[test]
fn srp_parameters_reach_the_client() {
    init();

    let mut client = executor(tls12_config(ConnectionEnd::Client, SRP_SUITE));
    let mut server = executor(tls12_config(ConnectionEnd::Server, SRP_SUITE));

    let mut server_trace = WorkflowTrace::new().send(vec![
        ServerHello::new().into(),
        SrpServerKeyExchange::new().into(),
        ServerHelloDone::new().into(),
    ]);
    assert!(server.execute(&mut server_trace));
    relay(&mut server, &mut client);

    let mut client_trace = WorkflowTrace::new().receive(vec![
        ServerHello::new().into(),
        SrpServerKeyExchange::new().into(),
        ServerHelloDone::new().into(),
    ]);
    assert!(client.execute(&mut client_trace));

    let sent = match &server_trace.actions()[0].observed()[1] {
        ProtocolMessage::SrpServerKeyExchange(m) => m.clone(),
        other => panic!("unexpected {}", other.name()),
    };
    let received = match &client_trace.actions()[0].observed()[1] {
        ProtocolMessage::SrpServerKeyExchange(m) => m.clone(),
        other => panic!("unexpected {}", other.name()),
    };

    assert_eq!(received.modulus.get().unwrap(), sent.modulus.get().unwrap());
    assert_eq!(received.salt.get().unwrap(), sent.salt.get().unwrap());
    assert_eq!(
        received.public_key.get().unwrap(),
        sent.public_key.get().unwrap()
    );
    // Anonymous SRP carries no signature.
    assert!(!received.signature.is_set());
}

#[test]
fn unexpected_flight_stops_the_trace() {
    init();

    let mut client = executor(tls12_config(ConnectionEnd::Client, SRP_SUITE));
    let mut server = executor(tls12_config(ConnectionEnd::Server, SRP_SUITE));

    let mut server_trace = WorkflowTrace::new().send(vec![
        ServerHello::new().into(),
        ServerHelloDone::new().into(),
    ]);
    assert!(server.execute(&mut server_trace));
    relay(&mut server, &mut client);

    let mut client_trace = WorkflowTrace::new()
        .receive(vec![
            ServerHello::new().into(),
            SrpServerKeyExchange::new().into(),
            ServerHelloDone::new().into(),
        ])
        .send(vec![ChangeCipherSpec::new().into()]);
    assert!(!client.execute(&mut client_trace));

    assert_eq!(client_trace.actions()[0].observed().len(), 2);
    assert!(!client_trace.actions()[1].is_executed());
    assert!(client.transport().sent().is_empty());
}
