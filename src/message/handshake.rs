use nom::bytes::complete::take;
use nom::number::complete::{be_u16, be_u24, be_u8};
use nom::IResult;

use super::{write_u24, write_u8};
use crate::types::HandshakeType;
use crate::{Error, Modifiable};

/// The 4-byte TLS handshake header: type and 24-bit body length.
#[derive(Debug, Clone, Default)]
pub struct HandshakeHeader {
    pub msg_type: Modifiable<u8>,
    pub length: Modifiable<u32>,
}

impl HandshakeHeader {
    /// Parse the header and split off exactly `length` body bytes.
    pub fn parse_with_body(input: &[u8]) -> IResult<&[u8], (HandshakeHeader, &[u8])> {
        let (input, msg_type) = be_u8(input)?;
        let (input, length) = be_u24(input)?;
        let (input, body) = take(length as usize)(input)?;

        let header = HandshakeHeader {
            msg_type: msg_type.into(),
            length: length.into(),
        };

        Ok((input, (header, body)))
    }

    pub fn prepare(&mut self, msg_type: HandshakeType, body_len: usize) {
        self.msg_type.set_base(msg_type.as_u8());
        self.length.set_base(body_len as u32);
    }

    pub fn serialize(&self, output: &mut Vec<u8>) -> Result<(), Error> {
        write_u8(output, &self.msg_type)?;
        write_u24(output, &self.length)?;
        Ok(())
    }
}

/// Implements `Parse`, `Prepare` and `Serialize` for a handshake message in
/// terms of its inherent `parse_body`, `prepare_body` and `serialize_body`.
///
/// The type must have a `header: HandshakeHeader` field. Preparation fills
/// the body first, then derives the header length from the serialized body.
macro_rules! handshake_message {
    ($t:ty, $kind:expr) => {
        impl $crate::message::Parse for $t {
            fn parse<'a>(
                input: &'a [u8],
                ctx: &$crate::message::ParseContext,
            ) -> nom::IResult<&'a [u8], Self> {
                let (rest, (header, body)) =
                    $crate::message::HandshakeHeader::parse_with_body(input)?;
                let (body_rest, mut message) = Self::parse_body(body, ctx)?;
                $crate::util::all_consumed(body_rest)?;
                message.header = header;
                Ok((rest, message))
            }
        }

        impl $crate::message::Prepare for $t {
            fn prepare(&mut self, chooser: &$crate::Chooser<'_>) -> Result<(), $crate::Error> {
                self.prepare_body(chooser)?;
                let mut body = Vec::new();
                self.serialize_body(&mut body)?;
                self.header.prepare($kind, body.len());
                Ok(())
            }
        }

        impl $crate::message::Serialize for $t {
            fn serialize(&self, output: &mut Vec<u8>) -> Result<(), $crate::Error> {
                let mut body = Vec::new();
                self.serialize_body(&mut body)?;
                self.header.serialize(output)?;
                output.extend_from_slice(&body);
                Ok(())
            }
        }
    };
}

pub(crate) use handshake_message;

/// Optional trailing extension block of the hello messages.
///
/// Present exactly when bytes remain after the fixed fields.
pub(crate) fn parse_extensions(input: &[u8]) -> IResult<&[u8], Option<(u16, &[u8])>> {
    if input.is_empty() {
        return Ok((input, None));
    }
    let (input, length) = be_u16(input)?;
    let (input, extensions) = take(length as usize)(input)?;
    Ok((input, Some((length, extensions))))
}

/// Body of the first extension of `ext_type` in a raw extension block.
pub fn find_extension(mut block: &[u8], ext_type: u16) -> Option<&[u8]> {
    while block.len() >= 4 {
        let t = u16::from_be_bytes([block[0], block[1]]);
        let len = u16::from_be_bytes([block[2], block[3]]) as usize;
        let data = block.get(4..4 + len)?;
        if t == ext_type {
            return Some(data);
        }
        block = &block[4 + len..];
    }
    None
}
