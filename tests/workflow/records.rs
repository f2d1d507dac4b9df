use tlsforge::record::{Direction, KeySet, Record, RecordCipher, RecordLayer};
use tlsforge::types::{CipherSuite, ConnectionEnd, ContentType, ProtocolVersion};
use tlsforge::{Chooser, Config, Error, Modification, TlsContext};

use crate::common::*;

fn layer_pair(
    version: ProtocolVersion,
    suite: CipherSuite,
    keys: &KeySet,
    epoch: u16,
) -> (RecordLayer, RecordLayer) {
    let mut client = RecordLayer::new(version);
    client
        .set_encryptor(
            RecordCipher::new(Direction::Write, ConnectionEnd::Client, version, suite, keys, epoch)
                .unwrap(),
        )
        .unwrap();

    let mut server = RecordLayer::new(version);
    server
        .set_decryptor(
            RecordCipher::new(Direction::Read, ConnectionEnd::Server, version, suite, keys, epoch)
                .unwrap(),
        )
        .unwrap();

    (client, server)
}

#[test]
fn aead_nonces_never_repeat() {
    init();

    let suite = CipherSuite::TLS_RSA_WITH_AES_128_GCM_SHA256;
    let config = Config::builder().default_selected_cipher_suite(suite).build();
    let context = TlsContext::new();
    let chooser = Chooser::new(&config, &context);
    let keys = KeySet::derive_tls12(&chooser).unwrap();
    let (mut client, _) = layer_pair(ProtocolVersion::TLS1_2, suite, &keys, 0);

    let mut nonces = Vec::new();
    for _ in 0..3 {
        let records = client
            .prepare_records(ContentType::ApplicationData, b"ping", &chooser)
            .unwrap();
        nonces.push(records[0].protocol_message_bytes.get().unwrap()[..8].to_vec());
    }

    // Jump ahead, then continue from there.
    let mut jump = Record::new(ContentType::ApplicationData, ProtocolVersion::TLS1_2, b"x".to_vec());
    jump.sequence_number
        .set_modification(Modification::explicit(10));
    client.encrypt_record(&mut jump).unwrap();
    nonces.push(jump.protocol_message_bytes.get().unwrap()[..8].to_vec());

    let records = client
        .prepare_records(ContentType::ApplicationData, b"pong", &chooser)
        .unwrap();
    assert_eq!(records[0].sequence_number.get().unwrap(), 11);
    nonces.push(records[0].protocol_message_bytes.get().unwrap()[..8].to_vec());

    let expected: Vec<Vec<u8>> = [0u64, 1, 2, 10, 11]
        .iter()
        .map(|n| n.to_be_bytes().to_vec())
        .collect();
    assert_eq!(nonces, expected);

    // Going back would reuse a nonce under the same key.
    let mut back = Record::new(ContentType::ApplicationData, ProtocolVersion::TLS1_2, b"y".to_vec());
    back.sequence_number
        .set_modification(Modification::explicit(2));
    assert!(matches!(
        client.encrypt_record(&mut back),
        Err(Error::NonceReuse(2))
    ));
    assert_eq!(client.encryptor().next_sequence(), 12);
}

#[test]
fn dtls_aead_reads_sequence_from_header() {
    init();

    let suite = CipherSuite::TLS_RSA_WITH_AES_256_GCM_SHA384;
    let version = ProtocolVersion::DTLS1_2;
    let config = Config::builder()
        .highest_protocol_version(version)
        .default_selected_protocol_version(version)
        .default_selected_cipher_suite(suite)
        .build();
    let context = TlsContext::new();
    let keys = KeySet::derive_tls12(&Chooser::new(&config, &context)).unwrap();
    let (mut client, mut server) = layer_pair(version, suite, &keys, 1);

    let mut record = Record::new(ContentType::ApplicationData, version, b"datagram".to_vec());
    record
        .sequence_number
        .set_modification(Modification::explicit(5));
    client.encrypt_record(&mut record).unwrap();
    assert_eq!(record.epoch.get().unwrap(), 1);

    let wire = client.serialize_records(&[record]).unwrap();
    assert_eq!(&wire[3..5], &[0x00, 0x01]);
    assert_eq!(&wire[5..11], &[0, 0, 0, 0, 0, 5]);

    let mut received = server.parse_records(&wire).unwrap();
    server.decrypt_record(&mut received[0]).unwrap();
    assert_eq!(
        received[0].clean_protocol_message_bytes.get().unwrap(),
        b"datagram"
    );
}

#[test]
fn tls13_records_hide_content_type() {
    init();

    let suite = CipherSuite::TLS_AES_128_GCM_SHA256;
    let version = ProtocolVersion::TLS1_3;
    let config = Config::builder()
        .highest_protocol_version(version)
        .default_selected_protocol_version(version)
        .default_selected_cipher_suite(suite)
        .record_padding_length(7)
        .build();
    let context = TlsContext::new();
    let chooser = Chooser::new(&config, &context);
    let keys = KeySet::derive_tls13(suite, &[1; 32], &[2; 32]).unwrap();
    let (mut client, mut server) = layer_pair(version, suite, &keys, 0);

    let records = client
        .prepare_records(ContentType::Handshake, b"hello", &chooser)
        .unwrap();
    let wire = client.serialize_records(&records).unwrap();
    // content(5) + inner type(1) + padding(7) + tag(16)
    assert_eq!(&wire[..5], &[0x17, 0x03, 0x03, 0x00, 29]);

    let mut received = server.parse_records(&wire).unwrap();
    server.decrypt_record(&mut received[0]).unwrap();
    assert_eq!(received[0].content_type().unwrap(), ContentType::ApplicationData);
    assert_eq!(received[0].inner_content_type().unwrap(), ContentType::Handshake);
    assert_eq!(
        received[0].clean_protocol_message_bytes.get().unwrap(),
        b"hello"
    );
}

#[test]
fn cbc_record_with_lying_length_fails_to_decrypt() {
    init();

    let suite = CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA;
    let config = Config::builder().default_selected_cipher_suite(suite).build();
    let context = TlsContext::new();
    let chooser = Chooser::new(&config, &context);
    let keys = KeySet::derive_tls12(&chooser).unwrap();
    let (mut client, mut server) = layer_pair(ProtocolVersion::TLS1_2, suite, &keys, 0);

    let mut records = client
        .prepare_records(ContentType::ApplicationData, b"secret", &chooser)
        .unwrap();
    let payload = records[0].protocol_message_bytes.get().unwrap();
    // Drop the last block and shorten the length to match.
    records[0]
        .protocol_message_bytes
        .set_modification(Modification::truncate(payload.len() - 16));
    records[0]
        .length
        .set_modification(Modification::explicit((payload.len() - 16) as u16));

    let wire = client.serialize_records(&records).unwrap();
    let mut received = server.parse_records(&wire).unwrap();
    assert!(matches!(
        server.decrypt_record(&mut received[0]),
        Err(Error::CryptoFailure(_))
    ));
}
