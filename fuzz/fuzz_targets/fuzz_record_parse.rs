#![no_main]

//! Fuzz target for record and message parsing.
//!
//! The input is parsed as a run of TLS records and as a run of DTLS records.
//! Every record body is then parsed as protocol messages of its content type
//! and serialized again. Neither step may panic.

use libfuzzer_sys::fuzz_target;

use tlsforge::message::{ParseContext, ProtocolMessage, Serialize};
use tlsforge::record::parse_records;
use tlsforge::types::{CipherSuite, ProtocolVersion};

fuzz_target!(|data: &[u8]| {
    for (dtls, version) in [
        (false, ProtocolVersion::TLS1_2),
        (true, ProtocolVersion::DTLS1_2),
    ] {
        let Ok(records) = parse_records(data, dtls) else {
            continue;
        };

        let ctx = ParseContext::new(version, CipherSuite::TLS_SRP_SHA_WITH_AES_128_CBC_SHA);
        for record in records {
            let (Ok(content_type), Ok(body)) =
                (record.content_type(), record.protocol_message_bytes.get())
            else {
                continue;
            };

            let mut input = &body[..];
            while !input.is_empty() {
                let Ok((rest, message)) = ProtocolMessage::parse(content_type, input, &ctx) else {
                    break;
                };
                let _ = message.to_bytes();
                if rest.len() == input.len() {
                    break;
                }
                input = rest;
            }
        }
    }
});
