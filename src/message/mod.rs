//! Protocol messages and the parse, prepare and serialize pipeline.
//!
//! Every message variant implements [`Parse`], [`Prepare`] and [`Serialize`].
//! [`ProtocolMessage`] wraps the variants and dispatches on the content type
//! and handshake type tag.

mod alert;
mod certificate_verify;
mod change_cipher_spec;
mod client_hello;
mod finished;
mod fragment;
mod handshake;
mod heartbeat;
mod server_hello;
mod server_hello_done;
mod srp_server_key_exchange;
mod unknown;

pub use alert::Alert;
pub use certificate_verify::CertificateVerify;
pub use change_cipher_spec::ChangeCipherSpec;
pub use client_hello::ClientHello;
pub use finished::Finished;
pub use fragment::{fragment_handshake, DtlsHandshakeMessageFragment};
pub(crate) use fragment::unfragmented_bytes;
pub use handshake::{find_extension, HandshakeHeader};
pub use heartbeat::Heartbeat;
pub use server_hello::ServerHello;
pub use server_hello_done::ServerHelloDone;
pub use srp_server_key_exchange::{SrpComputations, SrpServerKeyExchange};
pub use unknown::UnknownMessage;

use nom::IResult;

use crate::types::{CipherSuite, ContentType, HandshakeType, ProtocolVersion};
use crate::util::put_uint;
use crate::{Chooser, Error, Modifiable, TlsContext};

/// What a parser needs to know beyond the bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseContext {
    /// Gates version-dependent fields (DTLS cookie, signature algorithm).
    pub version: ProtocolVersion,
    /// Selects the ServerKeyExchange layout.
    pub cipher_suite: CipherSuite,
}

impl ParseContext {
    pub fn new(version: ProtocolVersion, cipher_suite: CipherSuite) -> Self {
        ParseContext {
            version,
            cipher_suite,
        }
    }

    pub fn from_chooser(chooser: &Chooser<'_>) -> Self {
        Self::new(chooser.protocol_version(), chooser.cipher_suite())
    }
}

/// Read a message from wire bytes. Every parsed field carries a base value
/// and no modification.
pub trait Parse: Sized {
    fn parse<'a>(input: &'a [u8], ctx: &ParseContext) -> IResult<&'a [u8], Self>;
}

/// Compute the base values of an outbound message.
pub trait Prepare {
    fn prepare(&mut self, chooser: &Chooser<'_>) -> Result<(), Error>;
}

/// Write the effective field values in wire order.
///
/// Declared lengths are written as they are, even when a modification made
/// them disagree with their payload.
pub trait Serialize {
    fn serialize(&self, output: &mut Vec<u8>) -> Result<(), Error>;

    fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        let mut output = Vec::new();
        self.serialize(&mut output)?;
        Ok(output)
    }
}

#[derive(Debug, Clone)]
pub enum ProtocolMessage {
    ClientHello(ClientHello),
    ServerHello(ServerHello),
    ServerHelloDone(ServerHelloDone),
    CertificateVerify(CertificateVerify),
    SrpServerKeyExchange(SrpServerKeyExchange),
    Finished(Finished),
    ChangeCipherSpec(ChangeCipherSpec),
    Alert(Alert),
    Heartbeat(Heartbeat),
    DtlsFragment(DtlsHandshakeMessageFragment),
    Unknown(UnknownMessage),
}

macro_rules! dispatch {
    ($self:expr, $m:ident => $e:expr) => {
        match $self {
            ProtocolMessage::ClientHello($m) => $e,
            ProtocolMessage::ServerHello($m) => $e,
            ProtocolMessage::ServerHelloDone($m) => $e,
            ProtocolMessage::CertificateVerify($m) => $e,
            ProtocolMessage::SrpServerKeyExchange($m) => $e,
            ProtocolMessage::Finished($m) => $e,
            ProtocolMessage::ChangeCipherSpec($m) => $e,
            ProtocolMessage::Alert($m) => $e,
            ProtocolMessage::Heartbeat($m) => $e,
            ProtocolMessage::DtlsFragment($m) => $e,
            ProtocolMessage::Unknown($m) => $e,
        }
    };
}

macro_rules! from_variant {
    ($($v:ident),*) => {
        $(
            impl From<$v> for ProtocolMessage {
                fn from(m: $v) -> Self {
                    ProtocolMessage::$v(m)
                }
            }
        )*
    };
}

from_variant!(
    ClientHello,
    ServerHello,
    ServerHelloDone,
    CertificateVerify,
    SrpServerKeyExchange,
    Finished,
    ChangeCipherSpec,
    Alert,
    Heartbeat
);

impl From<UnknownMessage> for ProtocolMessage {
    fn from(m: UnknownMessage) -> Self {
        ProtocolMessage::Unknown(m)
    }
}

impl From<DtlsHandshakeMessageFragment> for ProtocolMessage {
    fn from(m: DtlsHandshakeMessageFragment) -> Self {
        ProtocolMessage::DtlsFragment(m)
    }
}

impl ProtocolMessage {
    /// Parse one message of `content_type` from the front of `input`.
    ///
    /// Handshake messages are selected by their type byte. A
    /// ServerKeyExchange is only understood for SRP suites; other unsupported
    /// messages come back as [`UnknownMessage`] so they still round-trip.
    pub fn parse<'a>(
        content_type: ContentType,
        input: &'a [u8],
        ctx: &ParseContext,
    ) -> Result<(&'a [u8], ProtocolMessage), Error> {
        let (rest, message) = match content_type {
            ContentType::Handshake => {
                let (_, msg_type) = HandshakeType::parse(input)?;
                match msg_type {
                    HandshakeType::ClientHello => wrap(ClientHello::parse(input, ctx)?),
                    HandshakeType::ServerHello => wrap(ServerHello::parse(input, ctx)?),
                    HandshakeType::ServerHelloDone => wrap(ServerHelloDone::parse(input, ctx)?),
                    HandshakeType::CertificateVerify => {
                        wrap(CertificateVerify::parse(input, ctx)?)
                    }
                    HandshakeType::ServerKeyExchange if ctx.cipher_suite.is_srp() => {
                        wrap(SrpServerKeyExchange::parse(input, ctx)?)
                    }
                    HandshakeType::Finished => wrap(Finished::parse(input, ctx)?),
                    _ => wrap(UnknownMessage::parse_handshake(input)?),
                }
            }
            ContentType::ChangeCipherSpec => wrap(ChangeCipherSpec::parse(input, ctx)?),
            ContentType::Alert => wrap(Alert::parse(input, ctx)?),
            ContentType::Heartbeat => wrap(Heartbeat::parse(input, ctx)?),
            _ => wrap(UnknownMessage::parse_raw(content_type, input)?),
        };
        Ok((rest, message))
    }

    pub fn content_type(&self) -> ContentType {
        match self {
            ProtocolMessage::ChangeCipherSpec(_) => ContentType::ChangeCipherSpec,
            ProtocolMessage::Alert(_) => ContentType::Alert,
            ProtocolMessage::Heartbeat(_) => ContentType::Heartbeat,
            ProtocolMessage::Unknown(m) => m.content_type(),
            _ => ContentType::Handshake,
        }
    }

    /// The handshake type this variant stands for, `None` for non-handshake
    /// messages.
    pub fn handshake_type(&self) -> Option<HandshakeType> {
        match self {
            ProtocolMessage::ClientHello(_) => Some(HandshakeType::ClientHello),
            ProtocolMessage::ServerHello(_) => Some(HandshakeType::ServerHello),
            ProtocolMessage::ServerHelloDone(_) => Some(HandshakeType::ServerHelloDone),
            ProtocolMessage::CertificateVerify(_) => Some(HandshakeType::CertificateVerify),
            ProtocolMessage::SrpServerKeyExchange(_) => Some(HandshakeType::ServerKeyExchange),
            ProtocolMessage::Finished(_) => Some(HandshakeType::Finished),
            ProtocolMessage::DtlsFragment(m) => m.msg_type.get().ok().map(HandshakeType::from_u8),
            ProtocolMessage::Unknown(m) => m.handshake_type(),
            _ => None,
        }
    }

    pub fn is_handshake(&self) -> bool {
        self.content_type() == ContentType::Handshake
    }

    pub fn name(&self) -> &'static str {
        match self {
            ProtocolMessage::ClientHello(_) => "ClientHello",
            ProtocolMessage::ServerHello(_) => "ServerHello",
            ProtocolMessage::ServerHelloDone(_) => "ServerHelloDone",
            ProtocolMessage::CertificateVerify(_) => "CertificateVerify",
            ProtocolMessage::SrpServerKeyExchange(_) => "SrpServerKeyExchange",
            ProtocolMessage::Finished(_) => "Finished",
            ProtocolMessage::ChangeCipherSpec(_) => "ChangeCipherSpec",
            ProtocolMessage::Alert(_) => "Alert",
            ProtocolMessage::Heartbeat(_) => "Heartbeat",
            ProtocolMessage::DtlsFragment(_) => "DtlsHandshakeMessageFragment",
            ProtocolMessage::Unknown(_) => "Unknown",
        }
    }

    /// Record what this message negotiates, whichever side sent it.
    pub fn adjust_context(&self, context: &mut TlsContext) {
        match self {
            ProtocolMessage::ClientHello(m) => m.adjust_context(context),
            ProtocolMessage::ServerHello(m) => m.adjust_context(context),
            _ => {}
        }
    }
}

fn wrap<'a, M: Into<ProtocolMessage>>((rest, m): (&'a [u8], M)) -> (&'a [u8], ProtocolMessage) {
    (rest, m.into())
}

impl Prepare for ProtocolMessage {
    fn prepare(&mut self, chooser: &Chooser<'_>) -> Result<(), Error> {
        dispatch!(self, m => m.prepare(chooser))
    }
}

impl Serialize for ProtocolMessage {
    fn serialize(&self, output: &mut Vec<u8>) -> Result<(), Error> {
        dispatch!(self, m => m.serialize(output))
    }
}

pub(crate) fn write_u8(output: &mut Vec<u8>, field: &Modifiable<u8>) -> Result<(), Error> {
    output.push(field.get()?);
    Ok(())
}

pub(crate) fn write_u16(output: &mut Vec<u8>, field: &Modifiable<u16>) -> Result<(), Error> {
    output.extend_from_slice(&field.get()?.to_be_bytes());
    Ok(())
}

pub(crate) fn write_u24(output: &mut Vec<u8>, field: &Modifiable<u32>) -> Result<(), Error> {
    put_uint(output, field.get()? as u64, 3)
}

pub(crate) fn write_bytes(output: &mut Vec<u8>, field: &Modifiable<Vec<u8>>) -> Result<(), Error> {
    output.extend_from_slice(&field.get()?);
    Ok(())
}

pub(crate) fn len_u8(len: usize) -> Result<u8, Error> {
    u8::try_from(len).map_err(|_| Error::MalformedInput(format!("length {} exceeds u8", len)))
}

pub(crate) fn len_u16(len: usize) -> Result<u16, Error> {
    u16::try_from(len).map_err(|_| Error::MalformedInput(format!("length {} exceeds u16", len)))
}
