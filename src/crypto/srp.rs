//! SRP-6a server-side math (RFC 5054), with SHA-1 as the hash.
//!
//! All functions are pure: identical inputs yield identical outputs.

use num_bigint::BigUint;

use super::digest;
use crate::types::HashAlgorithm;
use crate::Error;

/// Left-pad the big-endian encoding of `value` with zeros to `len` bytes.
///
/// Values already `len` bytes or longer are returned unpadded.
pub fn pad(value: &BigUint, len: usize) -> Vec<u8> {
    let bytes = value.to_bytes_be();
    if bytes.len() >= len {
        return bytes;
    }
    let mut out = vec![0u8; len - bytes.len()];
    out.extend_from_slice(&bytes);
    out
}

/// `k = SHA1(N || PAD(g))`
pub fn multiplier(modulus: &BigUint, generator: &BigUint) -> Result<BigUint, Error> {
    let n = modulus.to_bytes_be();
    let mut input = n.clone();
    input.extend_from_slice(&pad(generator, n.len()));
    let hash = digest(HashAlgorithm::SHA1, &input)?;
    Ok(BigUint::from_bytes_be(&hash))
}

/// `x = SHA1(s || SHA1(I || ":" || P))`
pub fn private_exponent(salt: &[u8], identity: &[u8], password: &[u8]) -> Result<BigUint, Error> {
    let mut inner = Vec::with_capacity(identity.len() + 1 + password.len());
    inner.extend_from_slice(identity);
    inner.push(0x3A);
    inner.extend_from_slice(password);
    let inner = digest(HashAlgorithm::SHA1, &inner)?;

    let mut outer = salt.to_vec();
    outer.extend_from_slice(&inner);
    let hash = digest(HashAlgorithm::SHA1, &outer)?;
    Ok(BigUint::from_bytes_be(&hash))
}

/// `v = g^x mod N`
pub fn verifier(modulus: &BigUint, generator: &BigUint, x: &BigUint) -> Result<BigUint, Error> {
    check_modulus(modulus)?;
    Ok(generator.modpow(x, modulus))
}

/// `B = (k*v + g^b) mod N`
pub fn server_public_key(
    modulus: &BigUint,
    generator: &BigUint,
    private_key: &BigUint,
    identity: &[u8],
    password: &[u8],
    salt: &[u8],
) -> Result<BigUint, Error> {
    check_modulus(modulus)?;
    let k = multiplier(modulus, generator)?;
    let x = private_exponent(salt, identity, password)?;
    let v = verifier(modulus, generator, &x)?;
    let gb = generator.modpow(private_key, modulus);
    Ok((k * v + gb) % modulus)
}

fn check_modulus(modulus: &BigUint) -> Result<(), Error> {
    if modulus.bits() == 0 {
        return Err(Error::CryptoFailure("SRP modulus is zero".into()));
    }
    Ok(())
}
