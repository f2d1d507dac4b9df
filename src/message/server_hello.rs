use nom::bytes::complete::take;
use nom::number::complete::{be_u16, be_u8};
use nom::IResult;

use super::handshake::{find_extension, handshake_message, parse_extensions};
use super::{len_u16, len_u8, write_bytes, write_u16, write_u8, HandshakeHeader, ParseContext};
use crate::types::{CipherSuite, CompressionMethod, HandshakeType, ProtocolVersion};
use crate::{Chooser, Error, Modifiable, TlsContext};

const SUPPORTED_VERSIONS: u16 = 0x002B;

#[derive(Debug, Clone, Default)]
pub struct ServerHello {
    pub header: HandshakeHeader,
    pub protocol_version: Modifiable<u16>,
    pub unix_time: Modifiable<Vec<u8>>,
    pub random: Modifiable<Vec<u8>>,
    pub session_id_length: Modifiable<u8>,
    pub session_id: Modifiable<Vec<u8>>,
    pub selected_cipher_suite: Modifiable<u16>,
    pub selected_compression_method: Modifiable<u8>,
    /// On the wire exactly when set.
    pub extensions_length: Modifiable<u16>,
    pub extensions: Modifiable<Vec<u8>>,
}

handshake_message!(ServerHello, HandshakeType::ServerHello);

impl ServerHello {
    pub fn new() -> Self {
        Self::default()
    }

    fn parse_body<'a>(input: &'a [u8], _ctx: &ParseContext) -> IResult<&'a [u8], ServerHello> {
        let (input, protocol_version) = be_u16(input)?;
        let (input, unix_time) = take(4_usize)(input)?;
        let (input, random) = take(28_usize)(input)?;
        let (input, session_id_length) = be_u8(input)?;
        let (input, session_id) = take(session_id_length as usize)(input)?;
        let (input, selected_cipher_suite) = be_u16(input)?;
        let (input, selected_compression_method) = be_u8(input)?;
        let (input, extensions) = parse_extensions(input)?;

        let mut hello = ServerHello {
            protocol_version: protocol_version.into(),
            unix_time: unix_time.to_vec().into(),
            random: random.to_vec().into(),
            session_id_length: session_id_length.into(),
            session_id: session_id.to_vec().into(),
            selected_cipher_suite: selected_cipher_suite.into(),
            selected_compression_method: selected_compression_method.into(),
            ..Default::default()
        };
        if let Some((length, extensions)) = extensions {
            hello.extensions_length.set_base(length);
            hello.extensions.set_base(extensions.to_vec());
        }

        Ok((input, hello))
    }

    fn prepare_body(&mut self, chooser: &Chooser<'_>) -> Result<(), Error> {
        let version = chooser.protocol_version();
        self.protocol_version
            .set_base(version.hello_version().as_u16());

        let server_random = chooser.server_random();
        let (time, random) = server_random.split_at(server_random.len().min(4));
        self.unix_time.set_base(time.to_vec());
        self.random.set_base(random.to_vec());

        self.session_id.set_base(chooser.server_session_id().to_vec());
        self.session_id_length
            .set_base(len_u8(self.session_id.get()?.len())?);

        let suite = chooser.cipher_suite();
        self.selected_cipher_suite.set_base(suite.as_u16());
        self.selected_compression_method
            .set_base(chooser.compression_method().as_u8());

        if let Some(extensions) = chooser.config().server_extensions() {
            self.extensions.set_base(extensions.to_vec());
            self.extensions_length
                .set_base(len_u16(self.extensions.get()?.len())?);
        }

        trace!("ServerHello selects {} {:?}", version, suite);

        Ok(())
    }

    fn serialize_body(&self, output: &mut Vec<u8>) -> Result<(), Error> {
        write_u16(output, &self.protocol_version)?;
        write_bytes(output, &self.unix_time)?;
        write_bytes(output, &self.random)?;
        write_u8(output, &self.session_id_length)?;
        write_bytes(output, &self.session_id)?;
        write_u16(output, &self.selected_cipher_suite)?;
        write_u8(output, &self.selected_compression_method)?;
        if self.extensions_length.is_set() {
            write_u16(output, &self.extensions_length)?;
            if self.extensions.is_set() {
                write_bytes(output, &self.extensions)?;
            }
        }
        Ok(())
    }

    /// The version the server picked, honouring a supported_versions
    /// extension over the legacy field.
    pub fn selected_version(&self) -> Result<ProtocolVersion, Error> {
        if let Ok(extensions) = self.extensions.get() {
            if let Some(v) = find_extension(&extensions, SUPPORTED_VERSIONS) {
                if v.len() == 2 {
                    return Ok(ProtocolVersion::from_u16(u16::from_be_bytes([v[0], v[1]])));
                }
            }
        }
        Ok(ProtocolVersion::from_u16(self.protocol_version.get()?))
    }

    pub(crate) fn adjust_context(&self, context: &mut TlsContext) {
        if let (Ok(time), Ok(random)) = (self.unix_time.get(), self.random.get()) {
            let mut server_random = time;
            server_random.extend_from_slice(&random);
            context.set_server_random(server_random);
        }
        if let Ok(v) = self.selected_version() {
            context.set_selected_protocol_version(v);
        }
        if let Ok(suite) = self.selected_cipher_suite.get() {
            context.set_selected_cipher_suite(CipherSuite::from_u16(suite));
        }
        if let Ok(method) = self.selected_compression_method.get() {
            context.set_selected_compression_method(CompressionMethod::from_u8(method));
        }
        if let Ok(id) = self.session_id.get() {
            context.set_server_session_id(id);
        }
    }
}
