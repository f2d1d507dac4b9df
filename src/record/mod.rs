//! Record layer: the wire unit, per-direction record protection and the
//! layer splitting serialized messages into records.

mod cipher;
mod keys;
mod layer;

pub use cipher::{Direction, RecordCipher};
pub use keys::KeySet;
pub use layer::RecordLayer;

use nom::bytes::complete::take;
use nom::number::complete::{be_u16, be_u8};
use nom::IResult;

use crate::message::{len_u16, write_bytes, write_u16, write_u8};
use crate::modifiable::Modifiable;
use crate::types::{ContentType, ProtocolVersion};
use crate::util::{be_u48, put_uint};
use crate::Error;

pub const TLS_HEADER_LEN: usize = 5;
pub const DTLS_HEADER_LEN: usize = 13;

/// Largest sequence number a DTLS record header can carry.
pub const DTLS_MAX_SEQUENCE: u64 = (1 << 48) - 1;

/// One TLS or DTLS record.
///
/// Outbound, the record layer sets `content_type`, `protocol_version` and
/// `clean_protocol_message_bytes`; the record cipher computes the rest.
/// Inbound, parsing fills the header and `protocol_message_bytes`, and
/// decryption fills the plaintext side.
#[derive(Debug, Clone, Default)]
pub struct Record {
    pub content_type: Modifiable<u8>,
    pub protocol_version: Modifiable<u16>,
    /// DTLS only.
    pub epoch: Modifiable<u16>,
    /// Written to the header for DTLS, implicit for TLS.
    pub sequence_number: Modifiable<u64>,
    pub length: Modifiable<u16>,
    /// The payload as it appears on the wire.
    pub protocol_message_bytes: Modifiable<Vec<u8>>,
    /// The payload before protection (or after removing it).
    pub clean_protocol_message_bytes: Modifiable<Vec<u8>>,
    /// TLS 1.3 inner content type.
    pub content_message_type: Modifiable<u8>,
    pub padding_length: Modifiable<usize>,
    pub mac: Modifiable<Vec<u8>>,
    pub padding: Modifiable<Vec<u8>>,
    /// Explicit IV (CBC) or explicit nonce (TLS 1.2 AEAD).
    pub iv: Modifiable<Vec<u8>>,
}

impl Record {
    /// An outbound record carrying `content` in the clear.
    pub fn new(content_type: ContentType, version: ProtocolVersion, content: Vec<u8>) -> Self {
        Record {
            content_type: content_type.as_u8().into(),
            protocol_version: version.record_version().as_u16().into(),
            clean_protocol_message_bytes: content.into(),
            ..Default::default()
        }
    }

    pub fn header_len(dtls: bool) -> usize {
        if dtls {
            DTLS_HEADER_LEN
        } else {
            TLS_HEADER_LEN
        }
    }

    /// The effective content type.
    pub fn content_type(&self) -> Result<ContentType, Error> {
        Ok(ContentType::from_u8(self.content_type.get()?))
    }

    /// The content type of the protected payload: the inner type under
    /// TLS 1.3, otherwise the header type.
    pub fn inner_content_type(&self) -> Result<ContentType, Error> {
        if self.content_message_type.is_set() {
            return Ok(ContentType::from_u8(self.content_message_type.get()?));
        }
        self.content_type()
    }

    pub fn parse(input: &[u8], dtls: bool) -> IResult<&[u8], Record> {
        let (input, content_type) = be_u8(input)?;
        let (input, protocol_version) = be_u16(input)?;
        let (input, epoch, sequence_number) = if dtls {
            let (input, epoch) = be_u16(input)?;
            let (input, seq) = be_u48(input)?;
            (input, Some(epoch), Some(seq))
        } else {
            (input, None, None)
        };
        let (input, length) = be_u16(input)?;
        let (input, payload) = take(length as usize)(input)?;

        let mut record = Record {
            content_type: content_type.into(),
            protocol_version: protocol_version.into(),
            length: length.into(),
            protocol_message_bytes: payload.to_vec().into(),
            ..Default::default()
        };
        if let (Some(epoch), Some(seq)) = (epoch, sequence_number) {
            record.epoch.set_base(epoch);
            record.sequence_number.set_base(seq);
        }

        Ok((input, record))
    }

    pub fn serialize(&self, output: &mut Vec<u8>, dtls: bool) -> Result<(), Error> {
        write_u8(output, &self.content_type)?;
        write_u16(output, &self.protocol_version)?;
        if dtls {
            write_u16(output, &self.epoch)?;
            put_uint(output, self.sequence_number.get()?, 6)?;
        }
        write_u16(output, &self.length)?;
        write_bytes(output, &self.protocol_message_bytes)
    }

    /// Set the base `length` from the wire payload.
    pub(crate) fn set_length_from_payload(&mut self) -> Result<(), Error> {
        let len = len_u16(self.protocol_message_bytes.get()?.len())?;
        self.length.set_base(len);
        Ok(())
    }
}

/// Parse all complete records in `input`.
///
/// A truncated trailing record is an error; nothing is returned for it.
pub fn parse_records(mut input: &[u8], dtls: bool) -> Result<Vec<Record>, Error> {
    let mut records = Vec::new();
    while !input.is_empty() {
        let (rest, record) = Record::parse(input, dtls)?;
        records.push(record);
        input = rest;
    }
    Ok(records)
}

pub fn serialize_records(records: &[Record], dtls: bool) -> Result<Vec<u8>, Error> {
    let mut output = Vec::new();
    for record in records {
        record.serialize(&mut output, dtls)?;
    }
    Ok(output)
}
