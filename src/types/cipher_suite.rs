//! Cipher suite definitions and their record-layer properties.

use nom::number::complete::be_u16;
use nom::IResult;

use super::HashAlgorithm;

#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CipherSuite {
    TLS_NULL_WITH_NULL_NULL,                   // 0000
    TLS_RSA_WITH_NULL_SHA,                     // 0002
    TLS_RSA_WITH_RC4_128_SHA,                  // 0005
    TLS_RSA_WITH_AES_128_CBC_SHA,              // 002f
    TLS_RSA_WITH_AES_256_CBC_SHA,              // 0035
    TLS_RSA_WITH_AES_128_CBC_SHA256,           // 003c
    TLS_RSA_WITH_AES_128_GCM_SHA256,           // 009c
    TLS_RSA_WITH_AES_256_GCM_SHA384,           // 009d
    TLS_SRP_SHA_WITH_AES_128_CBC_SHA,          // c01d
    TLS_SRP_SHA_RSA_WITH_AES_128_CBC_SHA,      // c01e
    TLS_SRP_SHA_WITH_AES_256_CBC_SHA,          // c020
    TLS_SRP_SHA_RSA_WITH_AES_256_CBC_SHA,      // c021
    TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256,   // c02b
    TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256,     // c02f
    TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384,     // c030
    TLS_AES_128_GCM_SHA256,                    // 1301
    TLS_AES_256_GCM_SHA384,                    // 1302
    Unknown(u16),
}

impl Default for CipherSuite {
    fn default() -> Self {
        Self::TLS_NULL_WITH_NULL_NULL
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(non_camel_case_types, clippy::upper_case_acronyms)]
pub enum KeyExchangeAlgorithm {
    Null,
    RSA,
    /// Anonymous SRP: the server key exchange carries no signature.
    SRP,
    SRP_RSA,
    ECDHE_RSA,
    ECDHE_ECDSA,
    /// TLS 1.3 suites do not name the key exchange.
    TLS13,
}

/// How a record payload is protected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CipherType {
    Null,
    Stream,
    Block,
    Aead,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkCipher {
    Null,
    Rc4_128,
    Aes128Cbc,
    Aes256Cbc,
    Aes128Gcm,
    Aes256Gcm,
}

impl BulkCipher {
    pub fn key_len(&self) -> usize {
        match self {
            BulkCipher::Null => 0,
            BulkCipher::Rc4_128 | BulkCipher::Aes128Cbc | BulkCipher::Aes128Gcm => 16,
            BulkCipher::Aes256Cbc | BulkCipher::Aes256Gcm => 32,
        }
    }

    pub fn block_size(&self) -> usize {
        match self {
            BulkCipher::Aes128Cbc | BulkCipher::Aes256Cbc => 16,
            _ => 0,
        }
    }

    /// Length of the IV taken from the key block (TLS 1.2) or traffic
    /// secret (TLS 1.3).
    pub fn fixed_iv_len(&self, tls13: bool) -> usize {
        match self {
            BulkCipher::Null | BulkCipher::Rc4_128 => 0,
            BulkCipher::Aes128Cbc | BulkCipher::Aes256Cbc => 16,
            BulkCipher::Aes128Gcm | BulkCipher::Aes256Gcm if tls13 => 12,
            BulkCipher::Aes128Gcm | BulkCipher::Aes256Gcm => 4,
        }
    }

    pub fn cipher_type(&self) -> CipherType {
        match self {
            BulkCipher::Null => CipherType::Null,
            BulkCipher::Rc4_128 => CipherType::Stream,
            BulkCipher::Aes128Cbc | BulkCipher::Aes256Cbc => CipherType::Block,
            BulkCipher::Aes128Gcm | BulkCipher::Aes256Gcm => CipherType::Aead,
        }
    }
}

impl CipherSuite {
    pub fn from_u16(value: u16) -> Self {
        use CipherSuite::*;
        match value {
            0x0000 => TLS_NULL_WITH_NULL_NULL,
            0x0002 => TLS_RSA_WITH_NULL_SHA,
            0x0005 => TLS_RSA_WITH_RC4_128_SHA,
            0x002F => TLS_RSA_WITH_AES_128_CBC_SHA,
            0x0035 => TLS_RSA_WITH_AES_256_CBC_SHA,
            0x003C => TLS_RSA_WITH_AES_128_CBC_SHA256,
            0x009C => TLS_RSA_WITH_AES_128_GCM_SHA256,
            0x009D => TLS_RSA_WITH_AES_256_GCM_SHA384,
            0xC01D => TLS_SRP_SHA_WITH_AES_128_CBC_SHA,
            0xC01E => TLS_SRP_SHA_RSA_WITH_AES_128_CBC_SHA,
            0xC020 => TLS_SRP_SHA_WITH_AES_256_CBC_SHA,
            0xC021 => TLS_SRP_SHA_RSA_WITH_AES_256_CBC_SHA,
            0xC02B => TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256,
            0xC02F => TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256,
            0xC030 => TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384,
            0x1301 => TLS_AES_128_GCM_SHA256,
            0x1302 => TLS_AES_256_GCM_SHA384,
            _ => Unknown(value),
        }
    }

    pub fn as_u16(&self) -> u16 {
        use CipherSuite::*;
        match self {
            TLS_NULL_WITH_NULL_NULL => 0x0000,
            TLS_RSA_WITH_NULL_SHA => 0x0002,
            TLS_RSA_WITH_RC4_128_SHA => 0x0005,
            TLS_RSA_WITH_AES_128_CBC_SHA => 0x002F,
            TLS_RSA_WITH_AES_256_CBC_SHA => 0x0035,
            TLS_RSA_WITH_AES_128_CBC_SHA256 => 0x003C,
            TLS_RSA_WITH_AES_128_GCM_SHA256 => 0x009C,
            TLS_RSA_WITH_AES_256_GCM_SHA384 => 0x009D,
            TLS_SRP_SHA_WITH_AES_128_CBC_SHA => 0xC01D,
            TLS_SRP_SHA_RSA_WITH_AES_128_CBC_SHA => 0xC01E,
            TLS_SRP_SHA_WITH_AES_256_CBC_SHA => 0xC020,
            TLS_SRP_SHA_RSA_WITH_AES_256_CBC_SHA => 0xC021,
            TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256 => 0xC02B,
            TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256 => 0xC02F,
            TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384 => 0xC030,
            TLS_AES_128_GCM_SHA256 => 0x1301,
            TLS_AES_256_GCM_SHA384 => 0x1302,
            Unknown(value) => *value,
        }
    }

    pub fn parse(input: &[u8]) -> IResult<&[u8], CipherSuite> {
        let (input, value) = be_u16(input)?;
        Ok((input, CipherSuite::from_u16(value)))
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, CipherSuite::Unknown(_))
    }

    pub fn is_tls13(&self) -> bool {
        matches!(
            self,
            CipherSuite::TLS_AES_128_GCM_SHA256 | CipherSuite::TLS_AES_256_GCM_SHA384
        )
    }

    pub fn is_srp(&self) -> bool {
        matches!(
            self.key_exchange(),
            Some(KeyExchangeAlgorithm::SRP) | Some(KeyExchangeAlgorithm::SRP_RSA)
        )
    }

    pub fn key_exchange(&self) -> Option<KeyExchangeAlgorithm> {
        use CipherSuite::*;
        Some(match self {
            TLS_NULL_WITH_NULL_NULL => KeyExchangeAlgorithm::Null,
            TLS_RSA_WITH_NULL_SHA
            | TLS_RSA_WITH_RC4_128_SHA
            | TLS_RSA_WITH_AES_128_CBC_SHA
            | TLS_RSA_WITH_AES_256_CBC_SHA
            | TLS_RSA_WITH_AES_128_CBC_SHA256
            | TLS_RSA_WITH_AES_128_GCM_SHA256
            | TLS_RSA_WITH_AES_256_GCM_SHA384 => KeyExchangeAlgorithm::RSA,
            TLS_SRP_SHA_WITH_AES_128_CBC_SHA | TLS_SRP_SHA_WITH_AES_256_CBC_SHA => {
                KeyExchangeAlgorithm::SRP
            }
            TLS_SRP_SHA_RSA_WITH_AES_128_CBC_SHA | TLS_SRP_SHA_RSA_WITH_AES_256_CBC_SHA => {
                KeyExchangeAlgorithm::SRP_RSA
            }
            TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256 => KeyExchangeAlgorithm::ECDHE_ECDSA,
            TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256 | TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384 => {
                KeyExchangeAlgorithm::ECDHE_RSA
            }
            TLS_AES_128_GCM_SHA256 | TLS_AES_256_GCM_SHA384 => KeyExchangeAlgorithm::TLS13,
            Unknown(_) => return None,
        })
    }

    pub fn bulk_cipher(&self) -> Option<BulkCipher> {
        use CipherSuite::*;
        Some(match self {
            TLS_NULL_WITH_NULL_NULL | TLS_RSA_WITH_NULL_SHA => BulkCipher::Null,
            TLS_RSA_WITH_RC4_128_SHA => BulkCipher::Rc4_128,
            TLS_RSA_WITH_AES_128_CBC_SHA
            | TLS_RSA_WITH_AES_128_CBC_SHA256
            | TLS_SRP_SHA_WITH_AES_128_CBC_SHA
            | TLS_SRP_SHA_RSA_WITH_AES_128_CBC_SHA => BulkCipher::Aes128Cbc,
            TLS_RSA_WITH_AES_256_CBC_SHA
            | TLS_SRP_SHA_WITH_AES_256_CBC_SHA
            | TLS_SRP_SHA_RSA_WITH_AES_256_CBC_SHA => BulkCipher::Aes256Cbc,
            TLS_RSA_WITH_AES_128_GCM_SHA256
            | TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256
            | TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256
            | TLS_AES_128_GCM_SHA256 => BulkCipher::Aes128Gcm,
            TLS_RSA_WITH_AES_256_GCM_SHA384
            | TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384
            | TLS_AES_256_GCM_SHA384 => BulkCipher::Aes256Gcm,
            Unknown(_) => return None,
        })
    }

    /// HMAC hash for non-AEAD suites. `None` for AEAD and null-MAC suites.
    pub fn mac_algorithm(&self) -> Option<HashAlgorithm> {
        use CipherSuite::*;
        match self {
            TLS_RSA_WITH_NULL_SHA
            | TLS_RSA_WITH_RC4_128_SHA
            | TLS_RSA_WITH_AES_128_CBC_SHA
            | TLS_RSA_WITH_AES_256_CBC_SHA
            | TLS_SRP_SHA_WITH_AES_128_CBC_SHA
            | TLS_SRP_SHA_RSA_WITH_AES_128_CBC_SHA
            | TLS_SRP_SHA_WITH_AES_256_CBC_SHA
            | TLS_SRP_SHA_RSA_WITH_AES_256_CBC_SHA => Some(HashAlgorithm::SHA1),
            TLS_RSA_WITH_AES_128_CBC_SHA256 => Some(HashAlgorithm::SHA256),
            _ => None,
        }
    }

    /// Hash used by the PRF / HKDF for this suite.
    pub fn prf_hash(&self) -> HashAlgorithm {
        use CipherSuite::*;
        match self {
            TLS_RSA_WITH_AES_256_GCM_SHA384
            | TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384
            | TLS_AES_256_GCM_SHA384 => HashAlgorithm::SHA384,
            _ => HashAlgorithm::SHA256,
        }
    }

    pub fn verify_data_length(&self) -> usize {
        if self.is_tls13() {
            self.prf_hash().output_len()
        } else {
            12
        }
    }
}
