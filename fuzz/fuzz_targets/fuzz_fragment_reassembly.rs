#![no_main]

//! Fuzz target for DTLS handshake fragment reassembly.
//!
//! The input is read as a run of 12-byte-header handshake fragments, each fed
//! to a fragment manager. Inconsistent fragments must be rejected without
//! panicking, and a message reported complete must combine into a fragment
//! covering its full declared length.

use libfuzzer_sys::fuzz_target;

use tlsforge::dtls::FragmentManager;
use tlsforge::message::{DtlsHandshakeMessageFragment, Parse, ParseContext};

fuzz_target!(|data: &[u8]| {
    let ctx = ParseContext::default();
    let mut manager = FragmentManager::new();

    let mut input = data;
    while let Ok((rest, fragment)) = DtlsHandshakeMessageFragment::parse(input, &ctx) {
        input = rest;

        manager.add_fragment(&fragment);
        let Ok(seq) = fragment.message_seq.get() else {
            continue;
        };
        if let Some(combined) = manager.combined_fragment(seq) {
            assert_eq!(combined.fragment_offset.get().ok(), Some(0));
            assert_eq!(
                combined.fragment_length.get().ok(),
                combined.length.get().ok()
            );
        }
    }
});
