use p256::ecdsa::{Signature as P256Signature, SigningKey as P256SigningKey};
use p384::ecdsa::{Signature as P384Signature, SigningKey as P384SigningKey};
use pkcs8::DecodePrivateKey;
use rsa::pkcs1v15::SigningKey as RsaSigningKey;
use rsa::RsaPrivateKey;
use sha1::Sha1;
use sha2::{Sha256, Sha384, Sha512};
use signature::{SignatureEncoding, Signer};

use crate::types::{HashAlgorithm, SignatureAlgorithm, SignatureAndHashAlgorithm};
use crate::Error;

/// Sign data using RSA PKCS#1 v1.5 with the given hash.
///
/// The key is PKCS#8, DER or PEM.
fn sign_rsa(private_key_data: &[u8], data: &[u8], hash: HashAlgorithm) -> Result<Vec<u8>, Error> {
    let private_key = match RsaPrivateKey::from_pkcs8_der(private_key_data) {
        Ok(key) => key,
        Err(_) => {
            let pem = std::str::from_utf8(private_key_data)
                .map_err(|e| Error::CryptoFailure(format!("Invalid UTF-8 in private key: {}", e)))?;
            RsaPrivateKey::from_pkcs8_pem(pem)
                .map_err(|e| Error::CryptoFailure(format!("Failed to parse RSA private key: {}", e)))?
        }
    };

    let signature = match hash {
        HashAlgorithm::SHA1 => RsaSigningKey::<Sha1>::new(private_key).try_sign(data),
        HashAlgorithm::SHA256 => RsaSigningKey::<Sha256>::new(private_key).try_sign(data),
        HashAlgorithm::SHA384 => RsaSigningKey::<Sha384>::new(private_key).try_sign(data),
        HashAlgorithm::SHA512 => RsaSigningKey::<Sha512>::new(private_key).try_sign(data),
        _ => {
            return Err(Error::UnsupportedAlgorithm(format!(
                "hash algorithm for RSA: {:?}",
                hash
            )))
        }
    };

    signature
        .map(|s| s.to_vec())
        .map_err(|e| Error::CryptoFailure(format!("RSA signing failed: {}", e)))
}

/// Sign data using ECDSA. The curve follows the key, the digest follows the
/// curve (P-256 with SHA-256, P-384 with SHA-384).
fn sign_ecdsa(private_key_data: &[u8], data: &[u8], hash: HashAlgorithm) -> Result<Vec<u8>, Error> {
    let pem = std::str::from_utf8(private_key_data).ok();

    let p256 = P256SigningKey::from_pkcs8_der(private_key_data)
        .ok()
        .or_else(|| pem.and_then(|p| P256SigningKey::from_pkcs8_pem(p).ok()));
    if let Some(key) = p256 {
        if hash != HashAlgorithm::SHA256 {
            return Err(Error::UnsupportedAlgorithm(format!(
                "{:?} with a P-256 key",
                hash
            )));
        }
        let signature: P256Signature = key
            .try_sign(data)
            .map_err(|e| Error::CryptoFailure(format!("ECDSA signing failed: {}", e)))?;
        return Ok(signature.to_der().as_bytes().to_vec());
    }

    let p384 = P384SigningKey::from_pkcs8_der(private_key_data)
        .ok()
        .or_else(|| pem.and_then(|p| P384SigningKey::from_pkcs8_pem(p).ok()));
    if let Some(key) = p384 {
        if hash != HashAlgorithm::SHA384 {
            return Err(Error::UnsupportedAlgorithm(format!(
                "{:?} with a P-384 key",
                hash
            )));
        }
        let signature: P384Signature = key
            .try_sign(data)
            .map_err(|e| Error::CryptoFailure(format!("ECDSA signing failed: {}", e)))?;
        return Ok(signature.to_der().as_bytes().to_vec());
    }

    Err(Error::CryptoFailure(
        "Failed to parse ECDSA private key or unsupported curve".into(),
    ))
}

/// Sign data with the private key under the given signature/hash pair.
pub fn sign_data(
    private_key_data: &[u8],
    data: &[u8],
    algorithm: SignatureAndHashAlgorithm,
) -> Result<Vec<u8>, Error> {
    match algorithm.signature {
        SignatureAlgorithm::RSA => sign_rsa(private_key_data, data, algorithm.hash),
        SignatureAlgorithm::ECDSA => sign_ecdsa(private_key_data, data, algorithm.hash),
        _ => Err(Error::UnsupportedAlgorithm(format!(
            "signature algorithm {:?}",
            algorithm.signature
        ))),
    }
}
