use nom::IResult;

use super::{write_bytes, HandshakeHeader, Prepare, Serialize};
use crate::types::{ContentType, HandshakeType};
use crate::{Chooser, Error, Modifiable};

/// A message we carry as raw bytes: application data, unsupported
/// handshake messages (header included) and unknown content types.
#[derive(Debug, Clone)]
pub struct UnknownMessage {
    content_type: ContentType,
    pub bytes: Modifiable<Vec<u8>>,
}

impl UnknownMessage {
    pub fn new(content_type: ContentType, bytes: Vec<u8>) -> Self {
        UnknownMessage {
            content_type,
            bytes: bytes.into(),
        }
    }

    /// One complete handshake message, header included.
    pub fn parse_handshake(input: &[u8]) -> IResult<&[u8], UnknownMessage> {
        let (rest, _) = HandshakeHeader::parse_with_body(input)?;
        let raw = &input[..input.len() - rest.len()];
        Ok((rest, Self::new(ContentType::Handshake, raw.to_vec())))
    }

    /// Everything that is left.
    pub fn parse_raw(content_type: ContentType, input: &[u8]) -> IResult<&[u8], UnknownMessage> {
        Ok((&input[input.len()..], Self::new(content_type, input.to_vec())))
    }

    pub fn content_type(&self) -> ContentType {
        self.content_type
    }

    pub fn handshake_type(&self) -> Option<HandshakeType> {
        if self.content_type != ContentType::Handshake {
            return None;
        }
        self.bytes
            .get()
            .ok()
            .and_then(|b| b.first().copied())
            .map(HandshakeType::from_u8)
    }
}

impl Prepare for UnknownMessage {
    /// Raw bytes are sent as configured.
    fn prepare(&mut self, _chooser: &Chooser<'_>) -> Result<(), Error> {
        Ok(())
    }
}

impl Serialize for UnknownMessage {
    fn serialize(&self, output: &mut Vec<u8>) -> Result<(), Error> {
        write_bytes(output, &self.bytes)
    }
}
