//! Messages sent with overridden fields reach the wire exactly as modified.

use tlsforge::message::{
    CertificateVerify, ClientHello, Heartbeat, ParseContext, ProtocolMessage, ServerHello,
    SrpServerKeyExchange,
};
use tlsforge::types::{
    ConnectionEnd, ContentType, HashAlgorithm, SignatureAlgorithm, SignatureAndHashAlgorithm,
};
use tlsforge::workflow::WorkflowTrace;
use tlsforge::{Config, Modification};

use crate::common::*;

#[test]
fn heartbeat_payload_length_lie() {
    init();

    let config = Config::builder()
        .heartbeat_payload_length(1)
        .heartbeat_padding_length(16)
        .build();
    let mut client = executor(config);

    let mut heartbeat = Heartbeat::new();
    heartbeat
        .payload_length
        .set_modification(Modification::explicit(0x4000));
    let mut trace = WorkflowTrace::new().send(vec![heartbeat.into()]);
    assert!(client.execute(&mut trace));

    let sent = client.transport().sent();
    assert_eq!(sent.len(), 1);
    let wire = &sent[0];
    // type(1) + declared length(2) + payload(1) + padding(16)
    assert_eq!(&wire[..5], &[0x18, 0x03, 0x03, 0x00, 20]);
    assert_eq!(wire[5], 0x01);
    assert_eq!(&wire[6..8], &[0x40, 0x00]);
    assert_eq!(wire.len(), 5 + 20);

    // A peer that trusts the declared length cannot parse it.
    let body = &wire[5..];
    assert!(ProtocolMessage::parse(ContentType::Heartbeat, body, &ParseContext::default()).is_err());

    let mut server = executor(tls12_config(ConnectionEnd::Server, SRP_SUITE));
    relay(&mut client, &mut server);
    let mut receive = WorkflowTrace::new().receive(vec![Heartbeat::new().into()]);
    assert!(!server.execute(&mut receive));
    assert!(receive.actions()[0].observed().is_empty());
}

#[test]
fn certificate_verify_signature_length_lie() {
    use p256::ecdsa::SigningKey;
    use p256::pkcs8::EncodePrivateKey;

    init();

    let key = SigningKey::random(&mut rand::rngs::OsRng);
    let der = key.to_pkcs8_der().unwrap().as_bytes().to_vec();
    let config = Config::builder()
        .private_key(der)
        .signature_and_hash_algorithm(SignatureAndHashAlgorithm::new(
            HashAlgorithm::SHA256,
            SignatureAlgorithm::ECDSA,
        ))
        .build();
    let mut client = executor(config);

    let mut verify = CertificateVerify::new();
    verify
        .signature_length
        .set_modification(Modification::explicit(0xFFFF));
    let mut trace = WorkflowTrace::new().send(vec![verify.into()]);
    assert!(client.execute(&mut trace));

    let sent = match &trace.actions()[0].observed()[0] {
        ProtocolMessage::CertificateVerify(m) => m.clone(),
        other => panic!("unexpected {}", other.name()),
    };
    let signature = sent.signature.get().unwrap();

    let wire = &client.transport().sent()[0];
    let body = &wire[5..];
    assert_eq!(body[0], 0x0F);
    // The handshake length still describes the real body.
    let declared = u32::from_be_bytes([0, body[1], body[2], body[3]]) as usize;
    assert_eq!(declared, 2 + 2 + signature.len());
    assert_eq!(&body[4..6], &[0x04, 0x03]);
    assert_eq!(&body[6..8], &[0xFF, 0xFF]);
    assert_eq!(&body[8..], &signature[..]);

    // The transcript holds the modified bytes.
    assert_eq!(client.context().transcript(), body);
}

#[test]
fn srp_modulus_length_lie_keeps_content() {
    init();

    let mut clean = executor(tls12_config(ConnectionEnd::Server, SRP_SUITE));
    let mut trace = WorkflowTrace::new().send(vec![SrpServerKeyExchange::new().into()]);
    assert!(clean.execute(&mut trace));
    let clean_wire = clean.transport().sent()[0].clone();

    let mut server = executor(tls12_config(ConnectionEnd::Server, SRP_SUITE));
    let mut ske = SrpServerKeyExchange::new();
    ske.modulus_length.set_modification(Modification::add(1));
    let mut trace = WorkflowTrace::new().send(vec![ske.into()]);
    assert!(server.execute(&mut trace));
    let wire = &server.transport().sent()[0];

    assert_eq!(wire.len(), clean_wire.len());
    // record header(5) + handshake header(4)
    assert_eq!(&wire[9..11], &[0x00, 0x81]);
    assert_eq!(&clean_wire[9..11], &[0x00, 0x80]);
    assert_eq!(&wire[11..], &clean_wire[11..]);
}

#[test]
fn client_hello_field_overrides() {
    init();

    let config = Config::builder()
        .default_client_random(vec![0x11; 32])
        .build();
    let mut client = executor(config);

    let mut hello = ClientHello::new();
    hello
        .random
        .set_modification(Modification::xor_bytes(vec![0xFF; 28]));
    hello
        .session_id
        .set_modification(Modification::explicit(vec![0x42; 32]));
    let mut trace = WorkflowTrace::new().send(vec![hello.into()]);
    assert!(client.execute(&mut trace));

    let observed = match &trace.actions()[0].observed()[0] {
        ProtocolMessage::ClientHello(m) => m.clone(),
        other => panic!("unexpected {}", other.name()),
    };
    assert_eq!(observed.unix_time.get().unwrap(), vec![0x11; 4]);
    assert_eq!(observed.random.get().unwrap(), vec![0xEE; 28]);
    assert_eq!(observed.random.base(), Some(&vec![0x11; 28]));

    // Lengths are computed from the effective value.
    assert_eq!(observed.session_id_length.get().unwrap(), 32);

    // The context learns the random that actually went out.
    let random = client.context().client_random().unwrap();
    assert_eq!(&random[..4], &[0x11; 4]);
    assert_eq!(&random[4..], &[0xEE; 28]);

    // A server sees the modified hello.
    let mut server = executor(tls12_config(ConnectionEnd::Server, SRP_SUITE));
    relay(&mut client, &mut server);
    let mut receive = WorkflowTrace::new().receive(vec![ClientHello::new().into()]);
    assert!(server.execute(&mut receive));
    assert_eq!(server.context().client_random(), client.context().client_random());
    assert_eq!(server.context().client_session_id(), Some(&[0x42; 32][..]));

    let mut reply = WorkflowTrace::new().send(vec![ServerHello::new().into()]);
    assert!(server.execute(&mut reply));
}
