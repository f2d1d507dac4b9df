use nom::number::complete::be_u8;
use nom::IResult;

use super::{write_u8, Parse, ParseContext, Prepare, Serialize};
use crate::{Chooser, Error, Modifiable};

#[derive(Debug, Clone, Default)]
pub struct ChangeCipherSpec {
    pub ccs_protocol_type: Modifiable<u8>,
}

impl ChangeCipherSpec {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Parse for ChangeCipherSpec {
    fn parse<'a>(input: &'a [u8], _ctx: &ParseContext) -> IResult<&'a [u8], Self> {
        let (input, ccs_protocol_type) = be_u8(input)?;
        Ok((
            input,
            ChangeCipherSpec {
                ccs_protocol_type: ccs_protocol_type.into(),
            },
        ))
    }
}

impl Prepare for ChangeCipherSpec {
    fn prepare(&mut self, _chooser: &Chooser<'_>) -> Result<(), Error> {
        self.ccs_protocol_type.set_base(1);
        Ok(())
    }
}

impl Serialize for ChangeCipherSpec {
    fn serialize(&self, output: &mut Vec<u8>) -> Result<(), Error> {
        write_u8(output, &self.ccs_protocol_type)
    }
}
