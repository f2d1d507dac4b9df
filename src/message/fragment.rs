use nom::bytes::complete::take;
use nom::number::complete::{be_u16, be_u24, be_u8};
use nom::IResult;

use super::{write_bytes, write_u16, write_u24, write_u8, Parse, ParseContext, Prepare, Serialize};
use crate::types::HandshakeType;
use crate::util::put_uint;
use crate::{Chooser, Error, Modifiable};

/// A DTLS handshake message, or a piece of one.
///
/// The 12-byte header extends the TLS handshake header with the message
/// sequence and the fragment's position in the full message body.
#[derive(Debug, Clone, Default)]
pub struct DtlsHandshakeMessageFragment {
    pub msg_type: Modifiable<u8>,
    /// Declared length of the full message body.
    pub length: Modifiable<u32>,
    pub message_seq: Modifiable<u16>,
    pub fragment_offset: Modifiable<u32>,
    pub fragment_length: Modifiable<u32>,
    pub content: Modifiable<Vec<u8>>,
}

impl DtlsHandshakeMessageFragment {
    pub fn new(
        msg_type: HandshakeType,
        length: u32,
        message_seq: u16,
        fragment_offset: u32,
        content: Vec<u8>,
    ) -> Self {
        DtlsHandshakeMessageFragment {
            msg_type: msg_type.as_u8().into(),
            length: length.into(),
            message_seq: message_seq.into(),
            fragment_offset: fragment_offset.into(),
            fragment_length: (content.len() as u32).into(),
            content: content.into(),
        }
    }

    /// The TLS form of a complete message: type, 24-bit length, body.
    pub fn to_handshake_bytes(&self) -> Result<Vec<u8>, Error> {
        let mut out = Vec::new();
        write_u8(&mut out, &self.msg_type)?;
        write_u24(&mut out, &self.length)?;
        write_bytes(&mut out, &self.content)?;
        Ok(out)
    }
}

impl Parse for DtlsHandshakeMessageFragment {
    fn parse<'a>(input: &'a [u8], _ctx: &ParseContext) -> IResult<&'a [u8], Self> {
        let (input, msg_type) = be_u8(input)?;
        let (input, length) = be_u24(input)?;
        let (input, message_seq) = be_u16(input)?;
        let (input, fragment_offset) = be_u24(input)?;
        let (input, fragment_length) = be_u24(input)?;
        let (input, content) = take(fragment_length as usize)(input)?;

        Ok((
            input,
            DtlsHandshakeMessageFragment {
                msg_type: msg_type.into(),
                length: length.into(),
                message_seq: message_seq.into(),
                fragment_offset: fragment_offset.into(),
                fragment_length: fragment_length.into(),
                content: content.to_vec().into(),
            },
        ))
    }
}

impl Prepare for DtlsHandshakeMessageFragment {
    /// Derives the fragment length from the content. Type, sequence, offset
    /// and total length must already be set, usually by [`fragment_handshake`].
    fn prepare(&mut self, _chooser: &Chooser<'_>) -> Result<(), Error> {
        let len = self.content.get()?.len();
        self.fragment_length.set_base(len as u32);
        Ok(())
    }
}

impl Serialize for DtlsHandshakeMessageFragment {
    fn serialize(&self, output: &mut Vec<u8>) -> Result<(), Error> {
        write_u8(output, &self.msg_type)?;
        write_u24(output, &self.length)?;
        write_u16(output, &self.message_seq)?;
        write_u24(output, &self.fragment_offset)?;
        write_u24(output, &self.fragment_length)?;
        write_bytes(output, &self.content)?;
        Ok(())
    }
}

/// Split a serialized TLS-form handshake message into DTLS fragments with
/// bodies of at most `max_fragment_length` bytes.
///
/// An empty body yields a single empty fragment.
pub fn fragment_handshake(
    message: &[u8],
    message_seq: u16,
    max_fragment_length: usize,
) -> Result<Vec<DtlsHandshakeMessageFragment>, Error> {
    if message.len() < 4 {
        return Err(Error::MalformedInput("handshake message without header".into()));
    }
    if max_fragment_length == 0 {
        return Err(Error::MalformedInput("zero maximum fragment length".into()));
    }
    let msg_type = HandshakeType::from_u8(message[0]);
    // The declared length is kept even if it disagrees with the body.
    let length = u32::from_be_bytes([0, message[1], message[2], message[3]]);
    let body = &message[4..];

    if body.is_empty() {
        return Ok(vec![DtlsHandshakeMessageFragment::new(
            msg_type,
            length,
            message_seq,
            0,
            Vec::new(),
        )]);
    }

    let fragments = body
        .chunks(max_fragment_length)
        .enumerate()
        .map(|(i, chunk)| {
            let offset = (i * max_fragment_length) as u32;
            DtlsHandshakeMessageFragment::new(msg_type, length, message_seq, offset, chunk.to_vec())
        })
        .collect();
    Ok(fragments)
}

/// The DTLS transcript form of a whole message: one fragment spanning the body.
pub(crate) fn unfragmented_bytes(message: &[u8], message_seq: u16) -> Result<Vec<u8>, Error> {
    if message.len() < 4 {
        return Err(Error::MalformedInput("handshake message without header".into()));
    }
    let mut out = Vec::with_capacity(message.len() + 8);
    out.extend_from_slice(&message[..4]);
    out.extend_from_slice(&message_seq.to_be_bytes());
    put_uint(&mut out, 0, 3)?;
    out.extend_from_slice(&message[1..4]);
    out.extend_from_slice(&message[4..]);
    Ok(out)
}
