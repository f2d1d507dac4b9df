use nom::IResult;

use super::handshake::handshake_message;
use super::{HandshakeHeader, ParseContext};
use crate::types::HandshakeType;
use crate::{Chooser, Error};

/// Empty-bodied end of the server's hello flight.
#[derive(Debug, Clone, Default)]
pub struct ServerHelloDone {
    pub header: HandshakeHeader,
}

handshake_message!(ServerHelloDone, HandshakeType::ServerHelloDone);

impl ServerHelloDone {
    pub fn new() -> Self {
        Self::default()
    }

    fn parse_body<'a>(input: &'a [u8], _ctx: &ParseContext) -> IResult<&'a [u8], ServerHelloDone> {
        Ok((input, ServerHelloDone::default()))
    }

    fn prepare_body(&mut self, _chooser: &Chooser<'_>) -> Result<(), Error> {
        Ok(())
    }

    fn serialize_body(&self, _output: &mut Vec<u8>) -> Result<(), Error> {
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::message::{Parse, Serialize};

    #[test]
    fn roundtrip() {
        let bytes = [0x0E, 0x00, 0x00, 0x00];
        let (rest, done) = ServerHelloDone::parse(&bytes, &ParseContext::default()).unwrap();
        assert!(rest.is_empty());
        assert_eq!(done.to_bytes().unwrap(), bytes);
    }

    #[test]
    fn body_is_rejected() {
        let bytes = [0x0E, 0x00, 0x00, 0x01, 0xFF];
        assert!(ServerHelloDone::parse(&bytes, &ParseContext::default()).is_err());
    }
}
