use std::fmt;

use nom::number::complete::be_u16;
use nom::IResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
pub enum ProtocolVersion {
    SSL3,
    TLS1_0,
    TLS1_1,
    TLS1_2,
    TLS1_3,
    DTLS1_0,
    DTLS1_2,
    Unknown(u16),
}

impl Default for ProtocolVersion {
    fn default() -> Self {
        Self::TLS1_2
    }
}

impl ProtocolVersion {
    pub fn from_u16(value: u16) -> Self {
        match value {
            0x0300 => ProtocolVersion::SSL3,
            0x0301 => ProtocolVersion::TLS1_0,
            0x0302 => ProtocolVersion::TLS1_1,
            0x0303 => ProtocolVersion::TLS1_2,
            0x0304 => ProtocolVersion::TLS1_3,
            0xFEFF => ProtocolVersion::DTLS1_0,
            0xFEFD => ProtocolVersion::DTLS1_2,
            _ => ProtocolVersion::Unknown(value),
        }
    }

    pub fn as_u16(&self) -> u16 {
        match self {
            ProtocolVersion::SSL3 => 0x0300,
            ProtocolVersion::TLS1_0 => 0x0301,
            ProtocolVersion::TLS1_1 => 0x0302,
            ProtocolVersion::TLS1_2 => 0x0303,
            ProtocolVersion::TLS1_3 => 0x0304,
            ProtocolVersion::DTLS1_0 => 0xFEFF,
            ProtocolVersion::DTLS1_2 => 0xFEFD,
            ProtocolVersion::Unknown(value) => *value,
        }
    }

    pub fn parse(input: &[u8]) -> IResult<&[u8], ProtocolVersion> {
        let (input, value) = be_u16(input)?;
        Ok((input, ProtocolVersion::from_u16(value)))
    }

    pub fn is_dtls(&self) -> bool {
        matches!(self, ProtocolVersion::DTLS1_0 | ProtocolVersion::DTLS1_2)
    }

    pub fn is_tls13(&self) -> bool {
        matches!(self, ProtocolVersion::TLS1_3)
    }

    /// TLS 1.2 semantics: signature algorithm fields, PRF with SHA-256/384,
    /// explicit AEAD nonces.
    pub fn is_tls12_or_later(&self) -> bool {
        matches!(
            self,
            ProtocolVersion::TLS1_2 | ProtocolVersion::TLS1_3 | ProtocolVersion::DTLS1_2
        )
    }

    /// CBC records carry an explicit per-record IV from TLS 1.1 on.
    pub fn uses_explicit_iv(&self) -> bool {
        !matches!(self, ProtocolVersion::SSL3 | ProtocolVersion::TLS1_0)
    }

    /// The version written into record headers.
    ///
    /// TLS 1.3 records claim TLS 1.2 on the wire.
    pub fn record_version(&self) -> ProtocolVersion {
        match self {
            ProtocolVersion::TLS1_3 => ProtocolVersion::TLS1_2,
            v => *v,
        }
    }

    /// The version written into the hello `legacy_version` field.
    pub fn hello_version(&self) -> ProtocolVersion {
        self.record_version()
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolVersion::SSL3 => write!(f, "SSL 3.0"),
            ProtocolVersion::TLS1_0 => write!(f, "TLS 1.0"),
            ProtocolVersion::TLS1_1 => write!(f, "TLS 1.1"),
            ProtocolVersion::TLS1_2 => write!(f, "TLS 1.2"),
            ProtocolVersion::TLS1_3 => write!(f, "TLS 1.3"),
            ProtocolVersion::DTLS1_0 => write!(f, "DTLS 1.0"),
            ProtocolVersion::DTLS1_2 => write!(f, "DTLS 1.2"),
            ProtocolVersion::Unknown(v) => write!(f, "Unknown(0x{:04x})", v),
        }
    }
}
