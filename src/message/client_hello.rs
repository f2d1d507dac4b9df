use nom::bytes::complete::take;
use nom::number::complete::{be_u16, be_u8};
use nom::IResult;

use super::handshake::{handshake_message, parse_extensions};
use super::{len_u16, len_u8, write_bytes, write_u16, write_u8, HandshakeHeader, ParseContext};
use crate::types::{CipherSuite, HandshakeType, ProtocolVersion};
use crate::{Chooser, Error, Modifiable, TlsContext};

#[derive(Debug, Clone, Default)]
pub struct ClientHello {
    pub header: HandshakeHeader,
    pub protocol_version: Modifiable<u16>,
    pub unix_time: Modifiable<Vec<u8>>,
    pub random: Modifiable<Vec<u8>>,
    pub session_id_length: Modifiable<u8>,
    pub session_id: Modifiable<Vec<u8>>,
    /// DTLS only. On the wire exactly when set.
    pub cookie_length: Modifiable<u8>,
    pub cookie: Modifiable<Vec<u8>>,
    pub cipher_suites_length: Modifiable<u16>,
    pub cipher_suites: Modifiable<Vec<u8>>,
    pub compressions_length: Modifiable<u8>,
    pub compressions: Modifiable<Vec<u8>>,
    /// On the wire exactly when set.
    pub extensions_length: Modifiable<u16>,
    pub extensions: Modifiable<Vec<u8>>,
}

handshake_message!(ClientHello, HandshakeType::ClientHello);

impl ClientHello {
    pub fn new() -> Self {
        Self::default()
    }

    fn parse_body<'a>(input: &'a [u8], ctx: &ParseContext) -> IResult<&'a [u8], ClientHello> {
        let (input, protocol_version) = be_u16(input)?;
        let (input, unix_time) = take(4_usize)(input)?;
        let (input, random) = take(28_usize)(input)?;
        let (input, session_id_length) = be_u8(input)?;
        let (input, session_id) = take(session_id_length as usize)(input)?;

        let mut hello = ClientHello {
            protocol_version: protocol_version.into(),
            unix_time: unix_time.to_vec().into(),
            random: random.to_vec().into(),
            session_id_length: session_id_length.into(),
            session_id: session_id.to_vec().into(),
            ..Default::default()
        };

        let input = if ctx.version.is_dtls() {
            let (input, cookie_length) = be_u8(input)?;
            let (input, cookie) = take(cookie_length as usize)(input)?;
            hello.cookie_length.set_base(cookie_length);
            hello.cookie.set_base(cookie.to_vec());
            input
        } else {
            input
        };

        let (input, cipher_suites_length) = be_u16(input)?;
        let (input, cipher_suites) = take(cipher_suites_length as usize)(input)?;
        let (input, compressions_length) = be_u8(input)?;
        let (input, compressions) = take(compressions_length as usize)(input)?;
        let (input, extensions) = parse_extensions(input)?;

        hello.cipher_suites_length.set_base(cipher_suites_length);
        hello.cipher_suites.set_base(cipher_suites.to_vec());
        hello.compressions_length.set_base(compressions_length);
        hello.compressions.set_base(compressions.to_vec());
        if let Some((length, extensions)) = extensions {
            hello.extensions_length.set_base(length);
            hello.extensions.set_base(extensions.to_vec());
        }

        Ok((input, hello))
    }

    fn prepare_body(&mut self, chooser: &Chooser<'_>) -> Result<(), Error> {
        let config = chooser.config();
        let version = config.highest_protocol_version();
        self.protocol_version
            .set_base(version.hello_version().as_u16());

        let client_random = chooser.client_random();
        let (time, random) = client_random.split_at(client_random.len().min(4));
        self.unix_time.set_base(time.to_vec());
        self.random.set_base(random.to_vec());

        self.session_id.set_base(chooser.client_session_id().to_vec());
        self.session_id_length
            .set_base(len_u8(self.session_id.get()?.len())?);

        if version.is_dtls() {
            self.cookie.set_base(chooser.dtls_cookie().to_vec());
            self.cookie_length.set_base(len_u8(self.cookie.get()?.len())?);
        }

        let suites: Vec<u8> = config
            .client_supported_cipher_suites()
            .iter()
            .flat_map(|s| s.as_u16().to_be_bytes())
            .collect();
        self.cipher_suites.set_base(suites);
        self.cipher_suites_length
            .set_base(len_u16(self.cipher_suites.get()?.len())?);

        let compressions: Vec<u8> = config
            .client_supported_compression_methods()
            .iter()
            .map(|c| c.as_u8())
            .collect();
        self.compressions.set_base(compressions);
        self.compressions_length
            .set_base(len_u8(self.compressions.get()?.len())?);

        if let Some(extensions) = config.client_extensions() {
            self.extensions.set_base(extensions.to_vec());
            self.extensions_length
                .set_base(len_u16(self.extensions.get()?.len())?);
        }

        trace!(
            "ClientHello version {} with {} cipher suites",
            version,
            config.client_supported_cipher_suites().len()
        );

        Ok(())
    }

    fn serialize_body(&self, output: &mut Vec<u8>) -> Result<(), Error> {
        write_u16(output, &self.protocol_version)?;
        write_bytes(output, &self.unix_time)?;
        write_bytes(output, &self.random)?;
        write_u8(output, &self.session_id_length)?;
        write_bytes(output, &self.session_id)?;
        if self.cookie_length.is_set() {
            write_u8(output, &self.cookie_length)?;
            write_bytes(output, &self.cookie)?;
        }
        write_u16(output, &self.cipher_suites_length)?;
        write_bytes(output, &self.cipher_suites)?;
        write_u8(output, &self.compressions_length)?;
        write_bytes(output, &self.compressions)?;
        if self.extensions_length.is_set() {
            write_u16(output, &self.extensions_length)?;
            if self.extensions.is_set() {
                write_bytes(output, &self.extensions)?;
            }
        }
        Ok(())
    }

    /// The effective cipher suite list.
    pub fn offered_cipher_suites(&self) -> Result<Vec<CipherSuite>, Error> {
        Ok(self
            .cipher_suites
            .get()?
            .chunks_exact(2)
            .map(|c| CipherSuite::from_u16(u16::from_be_bytes([c[0], c[1]])))
            .collect())
    }

    pub(crate) fn adjust_context(&self, context: &mut TlsContext) {
        if let (Ok(time), Ok(random)) = (self.unix_time.get(), self.random.get()) {
            let mut client_random = time;
            client_random.extend_from_slice(&random);
            context.set_client_random(client_random);
        }
        if let Ok(v) = self.protocol_version.get() {
            context.set_highest_client_protocol_version(ProtocolVersion::from_u16(v));
        }
        if let Ok(id) = self.session_id.get() {
            context.set_client_session_id(id);
        }
        if let Ok(cookie) = self.cookie.get() {
            context.set_dtls_cookie(cookie);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::message::{Parse, Prepare, Serialize};
    use crate::Config;

    const MESSAGE: &[u8] = &[
        0x01, 0x00, 0x00, 0x31, // Handshake header
        0x03, 0x03, // TLS 1.2
        0x5A, 0x5A, 0x5A, 0x5A, // unix time
        0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A, 0x0B, 0x0C, 0x0D, 0x0E,
        0x0F, 0x10, 0x11, 0x12, 0x13, 0x14, 0x15, 0x16, 0x17, 0x18, 0x19, 0x1A, 0x1B,
        0x1C, // random
        0x00, // session id length
        0x00, 0x04, // cipher suites length
        0x00, 0x2F, 0xC0, 0x1D, // suites
        0x01, 0x00, // compressions
        0x00, 0x04, // extensions length
        0xFF, 0x01, 0x00, 0x00, // renegotiation_info
    ];

    #[test]
    fn roundtrip() {
        let ctx = ParseContext::default();
        let (rest, hello) = ClientHello::parse(MESSAGE, &ctx).unwrap();
        assert!(rest.is_empty());
        assert_eq!(hello.header.length.get().unwrap(), 0x31);
        assert_eq!(
            hello.offered_cipher_suites().unwrap(),
            vec![
                CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA,
                CipherSuite::TLS_SRP_SHA_WITH_AES_128_CBC_SHA
            ]
        );
        assert_eq!(hello.to_bytes().unwrap(), MESSAGE);
    }

    #[test]
    fn dtls_cookie_only_for_dtls() {
        let config = Config::builder()
            .highest_protocol_version(ProtocolVersion::DTLS1_2)
            .default_dtls_cookie(vec![0xC0, 0x0C])
            .build();
        let context = TlsContext::new();
        let chooser = Chooser::new(&config, &context);

        let mut hello = ClientHello::new();
        hello.prepare(&chooser).unwrap();
        let bytes = hello.to_bytes().unwrap();

        // header(4) + version(2) + random(32) + sid(1) + cookie(1 + 2)
        assert_eq!(&bytes[4..6], &[0xFE, 0xFD]);
        assert_eq!(&bytes[38..42], &[0x00, 0x02, 0xC0, 0x0C]);

        let ctx = ParseContext::new(ProtocolVersion::DTLS1_2, CipherSuite::default());
        let (_, parsed) = ClientHello::parse(&bytes, &ctx).unwrap();
        assert_eq!(parsed.cookie.get().unwrap(), vec![0xC0, 0x0C]);
        assert_eq!(parsed.to_bytes().unwrap(), bytes);

        // A TLS parser reads the cookie as a suites length and runs short.
        let tls = ParseContext::default();
        assert!(ClientHello::parse(&bytes, &tls).is_err());
    }

    #[test]
    fn prepare_uses_config() {
        let config = Config::builder()
            .default_client_random((0..32).collect())
            .client_extensions(vec![0xFF, 0x01, 0x00, 0x01, 0x00])
            .build();
        let context = TlsContext::new();
        let chooser = Chooser::new(&config, &context);

        let mut hello = ClientHello::new();
        hello.prepare(&chooser).unwrap();
        assert_eq!(hello.unix_time.get().unwrap(), vec![0, 1, 2, 3]);
        assert_eq!(hello.random.get().unwrap().len(), 28);
        assert_eq!(hello.cipher_suites_length.get().unwrap(), 6);
        assert_eq!(hello.extensions_length.get().unwrap(), 5);

        let bytes = hello.to_bytes().unwrap();
        assert_eq!(hello.header.length.get().unwrap() as usize, bytes.len() - 4);
    }
}
