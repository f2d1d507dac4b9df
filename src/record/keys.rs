use zeroize::Zeroize;

use crate::chooser::Chooser;
use crate::crypto::{hkdf_expand_label, key_expansion};
use crate::types::{CipherSuite, ConnectionEnd, ProtocolVersion};
use crate::Error;

/// Record protection keys for both directions of a connection.
///
/// Cleared from memory on drop.
#[derive(Clone, Default)]
pub struct KeySet {
    pub client_write_mac_key: Vec<u8>,
    pub server_write_mac_key: Vec<u8>,
    pub client_write_key: Vec<u8>,
    pub server_write_key: Vec<u8>,
    pub client_write_iv: Vec<u8>,
    pub server_write_iv: Vec<u8>,
}

impl KeySet {
    /// Split a TLS 1.2 key block (RFC 5246, section 6.3).
    pub fn from_key_block(
        block: &[u8],
        mac_len: usize,
        key_len: usize,
        iv_len: usize,
    ) -> Result<KeySet, Error> {
        let needed = 2 * (mac_len + key_len + iv_len);
        if block.len() < needed {
            return Err(Error::CryptoFailure(format!(
                "key block of {} bytes, need {}",
                block.len(),
                needed
            )));
        }

        let mut rest = block;
        let mut next = |len: usize| {
            let (head, tail) = rest.split_at(len);
            rest = tail;
            head.to_vec()
        };

        Ok(KeySet {
            client_write_mac_key: next(mac_len),
            server_write_mac_key: next(mac_len),
            client_write_key: next(key_len),
            server_write_key: next(key_len),
            client_write_iv: next(iv_len),
            server_write_iv: next(iv_len),
        })
    }

    /// Expand the master secret into a key block.
    ///
    /// Only the TLS 1.2 PRF is available; earlier versions need an
    /// explicitly constructed key set.
    pub fn derive_tls12(chooser: &Chooser<'_>) -> Result<KeySet, Error> {
        let version = chooser.protocol_version();
        if !version.is_tls12_or_later() || version.is_tls13() {
            return Err(Error::UnsupportedAlgorithm(format!(
                "key derivation for {}",
                version
            )));
        }

        let suite = chooser.cipher_suite();
        let (mac_len, key_len, iv_len) = Self::lengths(suite, version)?;
        let block = key_expansion(
            chooser.master_secret(),
            chooser.client_random(),
            chooser.server_random(),
            2 * (mac_len + key_len + iv_len),
            suite.prf_hash(),
        )?;

        Self::from_key_block(&block, mac_len, key_len, iv_len)
    }

    /// Traffic keys from TLS 1.3 traffic secrets (RFC 8446, section 7.3).
    pub fn derive_tls13(
        suite: CipherSuite,
        client_secret: &[u8],
        server_secret: &[u8],
    ) -> Result<KeySet, Error> {
        let (_, key_len, iv_len) = Self::lengths(suite, ProtocolVersion::TLS1_3)?;
        let hash = suite.prf_hash();

        Ok(KeySet {
            client_write_mac_key: Vec::new(),
            server_write_mac_key: Vec::new(),
            client_write_key: hkdf_expand_label(hash, client_secret, "key", &[], key_len)?,
            server_write_key: hkdf_expand_label(hash, server_secret, "key", &[], key_len)?,
            client_write_iv: hkdf_expand_label(hash, client_secret, "iv", &[], iv_len)?,
            server_write_iv: hkdf_expand_label(hash, server_secret, "iv", &[], iv_len)?,
        })
    }

    /// TLS 1.3 handshake keys from the chooser's handshake traffic secrets.
    pub fn derive_tls13_handshake(chooser: &Chooser<'_>) -> Result<KeySet, Error> {
        Self::derive_tls13(
            chooser.cipher_suite(),
            chooser.client_handshake_traffic_secret(),
            chooser.server_handshake_traffic_secret(),
        )
    }

    /// (mac key, key, iv) used by records written by `sender`.
    pub fn keys_for(&self, sender: ConnectionEnd) -> (&[u8], &[u8], &[u8]) {
        match sender {
            ConnectionEnd::Client => (
                &self.client_write_mac_key,
                &self.client_write_key,
                &self.client_write_iv,
            ),
            ConnectionEnd::Server => (
                &self.server_write_mac_key,
                &self.server_write_key,
                &self.server_write_iv,
            ),
        }
    }

    fn lengths(
        suite: CipherSuite,
        version: ProtocolVersion,
    ) -> Result<(usize, usize, usize), Error> {
        let bulk = suite
            .bulk_cipher()
            .ok_or_else(|| Error::UnsupportedAlgorithm(format!("cipher suite {:?}", suite)))?;
        let mac_len = suite.mac_algorithm().map(|h| h.output_len()).unwrap_or(0);
        Ok((
            mac_len,
            bulk.key_len(),
            bulk.fixed_iv_len(version.is_tls13()),
        ))
    }
}

impl std::fmt::Debug for KeySet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeySet")
            .field("mac_len", &self.client_write_mac_key.len())
            .field("key_len", &self.client_write_key.len())
            .field("iv_len", &self.client_write_iv.len())
            .finish()
    }
}

impl Drop for KeySet {
    fn drop(&mut self) {
        self.client_write_mac_key.zeroize();
        self.server_write_mac_key.zeroize();
        self.client_write_key.zeroize();
        self.server_write_key.zeroize();
        self.client_write_iv.zeroize();
        self.server_write_iv.zeroize();
    }
}
