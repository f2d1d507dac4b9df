use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};

use crate::types::HashAlgorithm;
use crate::Error;

/// A running hash context for the algorithms the record and handshake
/// layers need.
#[derive(Clone)]
pub enum Hash {
    Sha1(Sha1),
    Sha224(Sha224),
    Sha256(Sha256),
    Sha384(Sha384),
    Sha512(Sha512),
}

impl Hash {
    pub fn new(algorithm: HashAlgorithm) -> Result<Self, Error> {
        Ok(match algorithm {
            HashAlgorithm::SHA1 => Hash::Sha1(Sha1::new()),
            HashAlgorithm::SHA224 => Hash::Sha224(Sha224::new()),
            HashAlgorithm::SHA256 => Hash::Sha256(Sha256::new()),
            HashAlgorithm::SHA384 => Hash::Sha384(Sha384::new()),
            HashAlgorithm::SHA512 => Hash::Sha512(Sha512::new()),
            _ => {
                return Err(Error::UnsupportedAlgorithm(format!(
                    "hash {:?}",
                    algorithm
                )))
            }
        })
    }

    pub fn update(&mut self, data: &[u8]) {
        match self {
            Hash::Sha1(h) => h.update(data),
            Hash::Sha224(h) => h.update(data),
            Hash::Sha256(h) => h.update(data),
            Hash::Sha384(h) => h.update(data),
            Hash::Sha512(h) => h.update(data),
        }
    }

    /// Finalize a copy of the state, so hashing can continue.
    pub fn clone_and_finalize(&self) -> Vec<u8> {
        match self {
            Hash::Sha1(h) => h.clone().finalize().to_vec(),
            Hash::Sha224(h) => h.clone().finalize().to_vec(),
            Hash::Sha256(h) => h.clone().finalize().to_vec(),
            Hash::Sha384(h) => h.clone().finalize().to_vec(),
            Hash::Sha512(h) => h.clone().finalize().to_vec(),
        }
    }
}

/// One-shot digest.
pub fn digest(algorithm: HashAlgorithm, data: &[u8]) -> Result<Vec<u8>, Error> {
    let mut hash = Hash::new(algorithm)?;
    hash.update(data);
    Ok(hash.clone_and_finalize())
}

/// HMAC over the concatenation of `parts`.
pub fn hmac(algorithm: HashAlgorithm, key: &[u8], parts: &[&[u8]]) -> Result<Vec<u8>, Error> {
    fn run<M: Mac + KeyInit>(key: &[u8], parts: &[&[u8]]) -> Result<Vec<u8>, Error> {
        let mut mac = <M as KeyInit>::new_from_slice(key)
            .map_err(|_| Error::CryptoFailure("invalid HMAC key length".into()))?;
        for part in parts {
            mac.update(part);
        }
        Ok(mac.finalize().into_bytes().to_vec())
    }

    match algorithm {
        HashAlgorithm::SHA1 => run::<Hmac<Sha1>>(key, parts),
        HashAlgorithm::SHA256 => run::<Hmac<Sha256>>(key, parts),
        HashAlgorithm::SHA384 => run::<Hmac<Sha384>>(key, parts),
        HashAlgorithm::SHA512 => run::<Hmac<Sha512>>(key, parts),
        _ => Err(Error::UnsupportedAlgorithm(format!("HMAC {:?}", algorithm))),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_sha256() {
        let mut hash = Hash::new(HashAlgorithm::SHA256).unwrap();
        hash.update(b"hello");
        hash.update(b" ");
        hash.update(b"world");
        let result = hash.clone_and_finalize();

        // Expected SHA256 hash of "hello world"
        let expected = [
            0xb9, 0x4d, 0x27, 0xb9, 0x93, 0x4d, 0x3e, 0x08, 0xa5, 0x2e, 0x52, 0xd7, 0xda, 0x7d,
            0xab, 0xfa, 0xc4, 0x84, 0xef, 0xe3, 0x7a, 0x53, 0x80, 0xee, 0x90, 0x88, 0xf7, 0xac,
            0xe2, 0xef, 0xcd, 0xe9,
        ];

        assert_eq!(result, expected);
    }

    #[test]
    fn test_sha1_abc() {
        let result = digest(HashAlgorithm::SHA1, b"abc").unwrap();
        let expected = [
            0xa9, 0x99, 0x3e, 0x36, 0x47, 0x06, 0x81, 0x6a, 0xba, 0x3e, 0x25, 0x71, 0x78, 0x50,
            0xc2, 0x6c, 0x9c, 0xd0, 0xd8, 0x9d,
        ];
        assert_eq!(result, expected);
    }

    #[test]
    fn hmac_parts_equal_concatenation() {
        let a = hmac(HashAlgorithm::SHA256, b"key", &[b"ab", b"cd"]).unwrap();
        let b = hmac(HashAlgorithm::SHA256, b"key", &[b"abcd"]).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 32);
    }

    #[test]
    fn md5_is_unsupported() {
        assert!(matches!(
            digest(HashAlgorithm::MD5, b""),
            Err(Error::UnsupportedAlgorithm(_))
        ));
    }
}
