use crate::types::HashAlgorithm;
use crate::Error;

use super::hmac;

/// PRF for TLS 1.2
/// as specified in RFC 5246 Section 5.
///
/// PRF(secret, label, seed) = P_<hash>(secret, label + seed)
///
/// The seed parameter is the seed data WITHOUT the label.
pub fn prf_tls12(
    secret: &[u8],
    label: &str,
    seed: &[u8],
    output_len: usize,
    hash: HashAlgorithm,
) -> Result<Vec<u8>, Error> {
    if !matches!(hash, HashAlgorithm::SHA256 | HashAlgorithm::SHA384) {
        return Err(Error::UnsupportedAlgorithm(format!(
            "PRF hash for TLS1.2: {:?}",
            hash
        )));
    }

    let mut full_seed = Vec::with_capacity(label.len() + seed.len());
    full_seed.extend_from_slice(label.as_bytes());
    full_seed.extend_from_slice(seed);

    p_hash(hash, secret, &full_seed, output_len)
}

fn p_hash(
    hash: HashAlgorithm,
    secret: &[u8],
    full_seed: &[u8],
    output_len: usize,
) -> Result<Vec<u8>, Error> {
    let mut result = Vec::with_capacity(output_len);

    // A(1) = HMAC_hash(secret, A(0)) where A(0) = seed
    let mut a = hmac(hash, secret, &[full_seed])?;

    while result.len() < output_len {
        // HMAC_hash(secret, A(i) + seed)
        let output = hmac(hash, secret, &[&a, full_seed])?;

        let remaining = output_len - result.len();
        let to_copy = remaining.min(output.len());
        result.extend_from_slice(&output[..to_copy]);

        if result.len() < output_len {
            a = hmac(hash, secret, &[&a])?;
        }
    }

    Ok(result)
}

/// Key expansion for TLS 1.2
/// as specified in RFC 5246 Section 6.3
pub fn key_expansion(
    master_secret: &[u8],
    client_random: &[u8],
    server_random: &[u8],
    key_material_length: usize,
    hash: HashAlgorithm,
) -> Result<Vec<u8>, Error> {
    // For key expansion, the seed is server_random + client_random
    let mut seed = Vec::with_capacity(server_random.len() + client_random.len());
    seed.extend_from_slice(server_random);
    seed.extend_from_slice(client_random);

    prf_tls12(
        master_secret,
        "key expansion",
        &seed,
        key_material_length,
        hash,
    )
}
