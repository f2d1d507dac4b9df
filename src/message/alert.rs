use nom::number::complete::be_u8;
use nom::IResult;

use super::{write_u8, Parse, ParseContext, Prepare, Serialize};
use crate::types::AlertLevel;
use crate::{Chooser, Error, Modifiable};

#[derive(Debug, Clone, Default)]
pub struct Alert {
    pub level: Modifiable<u8>,
    pub description: Modifiable<u8>,
}

impl Alert {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alert_level(&self) -> Result<AlertLevel, Error> {
        Ok(AlertLevel::from_u8(self.level.get()?))
    }
}

impl Parse for Alert {
    fn parse<'a>(input: &'a [u8], _ctx: &ParseContext) -> IResult<&'a [u8], Self> {
        let (input, level) = be_u8(input)?;
        let (input, description) = be_u8(input)?;
        Ok((
            input,
            Alert {
                level: level.into(),
                description: description.into(),
            },
        ))
    }
}

impl Prepare for Alert {
    fn prepare(&mut self, chooser: &Chooser<'_>) -> Result<(), Error> {
        let config = chooser.config();
        self.level.set_base(config.default_alert_level().as_u8());
        self.description
            .set_base(config.default_alert_description());
        Ok(())
    }
}

impl Serialize for Alert {
    fn serialize(&self, output: &mut Vec<u8>) -> Result<(), Error> {
        write_u8(output, &self.level)?;
        write_u8(output, &self.description)
    }
}
