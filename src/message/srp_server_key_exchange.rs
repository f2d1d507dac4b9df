//! ServerKeyExchange for the SRP suites (RFC 5054, section 2.8).

use nom::bytes::complete::take;
use nom::number::complete::{be_u16, be_u8};
use nom::IResult;
use num_bigint::BigUint;

use super::handshake::handshake_message;
use super::{len_u16, len_u8, write_bytes, write_u16, write_u8, HandshakeHeader, ParseContext};
use crate::crypto::{sign_data, srp};
use crate::types::{HandshakeType, KeyExchangeAlgorithm};
use crate::{Chooser, Error, Modifiable};

/// Inputs to the public key and signature. Never on the wire, but each one
/// can be modified before preparation like any other field.
#[derive(Debug, Clone, Default)]
pub struct SrpComputations {
    pub modulus: Modifiable<BigUint>,
    pub generator: Modifiable<BigUint>,
    pub salt: Modifiable<Vec<u8>>,
    pub private_key: Modifiable<BigUint>,
    pub identity: Modifiable<Vec<u8>>,
    pub password: Modifiable<Vec<u8>>,
    pub client_random: Modifiable<Vec<u8>>,
    pub server_random: Modifiable<Vec<u8>>,
}

#[derive(Debug, Clone, Default)]
pub struct SrpServerKeyExchange {
    pub header: HandshakeHeader,
    pub modulus_length: Modifiable<u16>,
    pub modulus: Modifiable<Vec<u8>>,
    pub generator_length: Modifiable<u16>,
    pub generator: Modifiable<Vec<u8>>,
    pub salt_length: Modifiable<u8>,
    pub salt: Modifiable<Vec<u8>>,
    pub public_key_length: Modifiable<u16>,
    pub public_key: Modifiable<Vec<u8>>,
    /// TLS 1.2 and later, signed suites only. On the wire exactly when set.
    pub signature_hash_algorithm: Modifiable<Vec<u8>>,
    /// Signed suites only. On the wire exactly when set.
    pub signature_length: Modifiable<u16>,
    pub signature: Modifiable<Vec<u8>>,
    pub computations: SrpComputations,
}

handshake_message!(SrpServerKeyExchange, HandshakeType::ServerKeyExchange);

impl SrpServerKeyExchange {
    pub fn new() -> Self {
        Self::default()
    }

    fn parse_body<'a>(
        input: &'a [u8],
        ctx: &ParseContext,
    ) -> IResult<&'a [u8], SrpServerKeyExchange> {
        let (input, modulus_length) = be_u16(input)?;
        let (input, modulus) = take(modulus_length as usize)(input)?;
        let (input, generator_length) = be_u16(input)?;
        let (input, generator) = take(generator_length as usize)(input)?;
        let (input, salt_length) = be_u8(input)?;
        let (input, salt) = take(salt_length as usize)(input)?;
        let (input, public_key_length) = be_u16(input)?;
        let (input, public_key) = take(public_key_length as usize)(input)?;

        let mut message = SrpServerKeyExchange {
            modulus_length: modulus_length.into(),
            modulus: modulus.to_vec().into(),
            generator_length: generator_length.into(),
            generator: generator.to_vec().into(),
            salt_length: salt_length.into(),
            salt: salt.to_vec().into(),
            public_key_length: public_key_length.into(),
            public_key: public_key.to_vec().into(),
            ..Default::default()
        };

        // Anonymous SRP ends here.
        if input.is_empty() {
            return Ok((input, message));
        }

        let input = if ctx.version.is_tls12_or_later() {
            let (input, alg) = take(2_usize)(input)?;
            message.signature_hash_algorithm.set_base(alg.to_vec());
            input
        } else {
            input
        };
        let (input, signature_length) = be_u16(input)?;
        let (input, signature) = take(signature_length as usize)(input)?;
        message.signature_length.set_base(signature_length);
        message.signature.set_base(signature.to_vec());

        Ok((input, message))
    }

    fn prepare_body(&mut self, chooser: &Chooser<'_>) -> Result<(), Error> {
        let c = &mut self.computations;
        c.modulus.set_base(chooser.srp_modulus().clone());
        c.generator.set_base(chooser.srp_generator().clone());
        c.salt.set_base(chooser.srp_salt().to_vec());
        c.private_key
            .set_base(chooser.srp_server_private_key().clone());
        c.identity.set_base(chooser.srp_identity().to_vec());
        c.password.set_base(chooser.srp_password().to_vec());

        let modulus = c.modulus.get()?;
        let generator = c.generator.get()?;
        let salt = c.salt.get()?;

        let public_key = srp::server_public_key(
            &modulus,
            &generator,
            &c.private_key.get()?,
            &c.identity.get()?,
            &c.password.get()?,
            &salt,
        )?;
        trace!("SRP public key: {:x}", public_key);

        self.modulus.set_base(modulus.to_bytes_be());
        self.modulus_length
            .set_base(len_u16(self.modulus.get()?.len())?);
        self.generator.set_base(generator.to_bytes_be());
        self.generator_length
            .set_base(len_u16(self.generator.get()?.len())?);
        self.salt.set_base(salt);
        self.salt_length.set_base(len_u8(self.salt.get()?.len())?);
        self.public_key.set_base(public_key.to_bytes_be());
        self.public_key_length
            .set_base(len_u16(self.public_key.get()?.len())?);

        if chooser.cipher_suite().key_exchange() == Some(KeyExchangeAlgorithm::SRP) {
            return Ok(());
        }

        let algorithm = chooser.signature_and_hash_algorithm();
        if chooser.protocol_version().is_tls12_or_later() {
            self.signature_hash_algorithm.set_base(algorithm.to_bytes());
        }
        self.computations
            .client_random
            .set_base(chooser.client_random().to_vec());
        self.computations
            .server_random
            .set_base(chooser.server_random().to_vec());

        let key = chooser
            .private_key()
            .ok_or_else(|| Error::CryptoFailure("no private key configured".into()))?;
        let signature = sign_data(key, &self.to_be_signed()?, algorithm)?;

        self.signature.set_base(signature);
        self.signature_length
            .set_base(len_u16(self.signature.get()?.len())?);
        Ok(())
    }

    /// `client_random || server_random || ServerSRPParams`, from the
    /// effective field values.
    pub fn to_be_signed(&self) -> Result<Vec<u8>, Error> {
        let mut out = self.computations.client_random.get()?;
        out.extend_from_slice(&self.computations.server_random.get()?);
        self.serialize_params(&mut out)?;
        Ok(out)
    }

    fn serialize_params(&self, output: &mut Vec<u8>) -> Result<(), Error> {
        write_u16(output, &self.modulus_length)?;
        write_bytes(output, &self.modulus)?;
        write_u16(output, &self.generator_length)?;
        write_bytes(output, &self.generator)?;
        write_u8(output, &self.salt_length)?;
        write_bytes(output, &self.salt)?;
        write_u16(output, &self.public_key_length)?;
        write_bytes(output, &self.public_key)?;
        Ok(())
    }

    fn serialize_body(&self, output: &mut Vec<u8>) -> Result<(), Error> {
        self.serialize_params(output)?;
        if self.signature_hash_algorithm.is_set() {
            write_bytes(output, &self.signature_hash_algorithm)?;
        }
        if self.signature_length.is_set() {
            write_u16(output, &self.signature_length)?;
            write_bytes(output, &self.signature)?;
        }
        Ok(())
    }
}
