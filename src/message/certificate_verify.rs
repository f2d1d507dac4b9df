use nom::bytes::complete::take;
use nom::number::complete::be_u16;
use nom::IResult;

use super::handshake::handshake_message;
use super::{len_u16, write_bytes, write_u16, HandshakeHeader, ParseContext};
use crate::crypto::{digest, sign_data};
use crate::types::{ConnectionEnd, HandshakeType};
use crate::{Chooser, Error, Modifiable};

#[derive(Debug, Clone, Default)]
pub struct CertificateVerify {
    pub header: HandshakeHeader,
    /// TLS 1.2 and later. On the wire exactly when set.
    pub signature_hash_algorithm: Modifiable<Vec<u8>>,
    pub signature_length: Modifiable<u16>,
    pub signature: Modifiable<Vec<u8>>,
}

handshake_message!(CertificateVerify, HandshakeType::CertificateVerify);

impl CertificateVerify {
    pub fn new() -> Self {
        Self::default()
    }

    fn parse_body<'a>(input: &'a [u8], ctx: &ParseContext) -> IResult<&'a [u8], CertificateVerify> {
        let mut verify = CertificateVerify::default();

        let input = if ctx.version.is_tls12_or_later() {
            let (input, alg) = take(2_usize)(input)?;
            verify.signature_hash_algorithm.set_base(alg.to_vec());
            input
        } else {
            input
        };

        let (input, signature_length) = be_u16(input)?;
        let (input, signature) = take(signature_length as usize)(input)?;
        verify.signature_length.set_base(signature_length);
        verify.signature.set_base(signature.to_vec());

        Ok((input, verify))
    }

    fn prepare_body(&mut self, chooser: &Chooser<'_>) -> Result<(), Error> {
        let version = chooser.protocol_version();
        if !version.is_tls12_or_later() {
            // Pre-1.2 signatures are over MD5 || SHA-1, which we do not carry.
            return Err(Error::UnsupportedAlgorithm(format!(
                "CertificateVerify for {}",
                version
            )));
        }

        let algorithm = chooser.signature_and_hash_algorithm();
        let key = chooser
            .private_key()
            .ok_or_else(|| Error::CryptoFailure("no private key configured".into()))?;

        let to_be_signed = if version.is_tls13() {
            let context_string: &[u8] = match chooser.connection_end() {
                ConnectionEnd::Client => b"TLS 1.3, client CertificateVerify",
                ConnectionEnd::Server => b"TLS 1.3, server CertificateVerify",
            };
            let hash = digest(chooser.cipher_suite().prf_hash(), chooser.transcript())?;
            let mut content = vec![0x20; 64];
            content.extend_from_slice(context_string);
            content.push(0);
            content.extend_from_slice(&hash);
            content
        } else {
            chooser.transcript().to_vec()
        };

        let signature = sign_data(key, &to_be_signed, algorithm)?;
        trace!("CertificateVerify signed with {:?}", algorithm);

        self.signature_hash_algorithm.set_base(algorithm.to_bytes());
        self.signature.set_base(signature);
        self.signature_length
            .set_base(len_u16(self.signature.get()?.len())?);
        Ok(())
    }

    fn serialize_body(&self, output: &mut Vec<u8>) -> Result<(), Error> {
        if self.signature_hash_algorithm.is_set() {
            write_bytes(output, &self.signature_hash_algorithm)?;
        }
        write_u16(output, &self.signature_length)?;
        write_bytes(output, &self.signature)?;
        Ok(())
    }
}
