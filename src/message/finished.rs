use nom::IResult;

use super::handshake::handshake_message;
use super::{write_bytes, HandshakeHeader, ParseContext};
use crate::crypto::{digest, hkdf_expand_label, hmac, prf_tls12};
use crate::types::{ConnectionEnd, HandshakeType};
use crate::{Chooser, Error, Modifiable};

#[derive(Debug, Clone, Default)]
pub struct Finished {
    pub header: HandshakeHeader,
    pub verify_data: Modifiable<Vec<u8>>,
}

handshake_message!(Finished, HandshakeType::Finished);

impl Finished {
    pub fn new() -> Self {
        Self::default()
    }

    fn parse_body<'a>(input: &'a [u8], _ctx: &ParseContext) -> IResult<&'a [u8], Finished> {
        let finished = Finished {
            verify_data: input.to_vec().into(),
            ..Default::default()
        };
        Ok((&input[input.len()..], finished))
    }

    fn prepare_body(&mut self, chooser: &Chooser<'_>) -> Result<(), Error> {
        let suite = chooser.cipher_suite();
        let hash = suite.prf_hash();
        let transcript_hash = digest(hash, chooser.transcript())?;

        let verify_data = if chooser.protocol_version().is_tls13() {
            let secret = match chooser.connection_end() {
                ConnectionEnd::Client => chooser.client_handshake_traffic_secret(),
                ConnectionEnd::Server => chooser.server_handshake_traffic_secret(),
            };
            let finished_key =
                hkdf_expand_label(hash, secret, "finished", &[], hash.output_len())?;
            hmac(hash, &finished_key, &[&transcript_hash])?
        } else {
            let label = match chooser.connection_end() {
                ConnectionEnd::Client => "client finished",
                ConnectionEnd::Server => "server finished",
            };
            prf_tls12(
                chooser.master_secret(),
                label,
                &transcript_hash,
                suite.verify_data_length(),
                hash,
            )?
        };

        self.verify_data.set_base(verify_data);
        Ok(())
    }

    fn serialize_body(&self, output: &mut Vec<u8>) -> Result<(), Error> {
        write_bytes(output, &self.verify_data)
    }
}
