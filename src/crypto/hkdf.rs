use hkdf::Hkdf;
use sha2::{Sha256, Sha384};

use crate::types::HashAlgorithm;
use crate::Error;

/// HKDF-Expand-Label from RFC 8446, section 7.1.
///
/// `secret` is used directly as the PRK.
pub fn hkdf_expand_label(
    hash: HashAlgorithm,
    secret: &[u8],
    label: &str,
    context: &[u8],
    output_len: usize,
) -> Result<Vec<u8>, Error> {
    let full_label_len = 6 + label.len();
    if full_label_len > 255 || context.len() > 255 || output_len > u16::MAX as usize {
        return Err(Error::CryptoFailure("HKDF label too long".into()));
    }

    let mut info = Vec::with_capacity(4 + full_label_len + context.len());
    info.extend_from_slice(&(output_len as u16).to_be_bytes());
    info.push(full_label_len as u8);
    info.extend_from_slice(b"tls13 ");
    info.extend_from_slice(label.as_bytes());
    info.push(context.len() as u8);
    info.extend_from_slice(context);

    let mut out = vec![0u8; output_len];
    let expanded = match hash {
        HashAlgorithm::SHA256 => Hkdf::<Sha256>::from_prk(secret)
            .map_err(|e| Error::CryptoFailure(format!("Invalid PRK: {:?}", e)))?
            .expand(&info, &mut out),
        HashAlgorithm::SHA384 => Hkdf::<Sha384>::from_prk(secret)
            .map_err(|e| Error::CryptoFailure(format!("Invalid PRK: {:?}", e)))?
            .expand(&info, &mut out),
        _ => {
            return Err(Error::UnsupportedAlgorithm(format!(
                "HKDF with {:?}",
                hash
            )))
        }
    };
    expanded.map_err(|e| Error::CryptoFailure(format!("HKDF expand failed: {:?}", e)))?;

    Ok(out)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn output_length_and_determinism() {
        let secret = [0x42u8; 32];
        let a = hkdf_expand_label(HashAlgorithm::SHA256, &secret, "key", &[], 16).unwrap();
        let b = hkdf_expand_label(HashAlgorithm::SHA256, &secret, "key", &[], 16).unwrap();
        let iv = hkdf_expand_label(HashAlgorithm::SHA256, &secret, "iv", &[], 12).unwrap();
        assert_eq!(a.len(), 16);
        assert_eq!(iv.len(), 12);
        assert_eq!(a, b);
        assert_ne!(&a[..12], &iv[..]);
    }

    #[test]
    fn short_prk_is_rejected() {
        let res = hkdf_expand_label(HashAlgorithm::SHA256, &[1, 2, 3], "key", &[], 16);
        assert!(matches!(res, Err(Error::CryptoFailure(_))));
    }
}
