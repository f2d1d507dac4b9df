use nom::bytes::complete::take;
use nom::number::complete::{be_u16, be_u8};
use nom::IResult;
use rand::RngCore;

use super::{len_u16, write_bytes, write_u16, write_u8, Parse, ParseContext, Prepare, Serialize};
use crate::types::HeartbeatMessageType;
use crate::{Chooser, Error, Modifiable};

/// RFC 6520 minimum padding.
const MIN_PADDING: usize = 16;

#[derive(Debug, Clone, Default)]
pub struct Heartbeat {
    pub heartbeat_message_type: Modifiable<u8>,
    pub payload_length: Modifiable<u16>,
    pub payload: Modifiable<Vec<u8>>,
    pub padding: Modifiable<Vec<u8>>,
}

impl Heartbeat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn message_type(&self) -> Result<HeartbeatMessageType, Error> {
        Ok(HeartbeatMessageType::from_u8(
            self.heartbeat_message_type.get()?,
        ))
    }
}

impl Parse for Heartbeat {
    /// Everything after the declared payload is padding.
    fn parse<'a>(input: &'a [u8], _ctx: &ParseContext) -> IResult<&'a [u8], Self> {
        let (input, heartbeat_message_type) = be_u8(input)?;
        let (input, payload_length) = be_u16(input)?;
        let (input, payload) = take(payload_length as usize)(input)?;
        let padding = input;

        Ok((
            &input[input.len()..],
            Heartbeat {
                heartbeat_message_type: heartbeat_message_type.into(),
                payload_length: payload_length.into(),
                payload: payload.to_vec().into(),
                padding: padding.to_vec().into(),
            },
        ))
    }
}

impl Prepare for Heartbeat {
    fn prepare(&mut self, chooser: &Chooser<'_>) -> Result<(), Error> {
        let config = chooser.config();
        let mut rng = rand::thread_rng();

        let mut payload = vec![0u8; config.heartbeat_payload_length()];
        rng.fill_bytes(&mut payload);
        let mut padding = vec![0u8; config.heartbeat_padding_length().max(MIN_PADDING)];
        rng.fill_bytes(&mut padding);

        self.heartbeat_message_type
            .set_base(HeartbeatMessageType::Request.as_u8());
        self.payload.set_base(payload);
        self.payload_length
            .set_base(len_u16(self.payload.get()?.len())?);
        self.padding.set_base(padding);
        Ok(())
    }
}

impl Serialize for Heartbeat {
    fn serialize(&self, output: &mut Vec<u8>) -> Result<(), Error> {
        write_u8(output, &self.heartbeat_message_type)?;
        write_u16(output, &self.payload_length)?;
        write_bytes(output, &self.payload)?;
        write_bytes(output, &self.padding)?;
        Ok(())
    }
}
