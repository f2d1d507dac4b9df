use std::collections::HashSet;

use aes::{Aes128, Aes256};
use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes128Gcm, Aes256Gcm, Nonce as AesGcmNonce};
use cbc::cipher::block_padding::NoPadding;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::RngCore;
use rc4::consts::U16;
use rc4::{Rc4, StreamCipher};
use zeroize::Zeroize;

use super::{KeySet, Record, DTLS_MAX_SEQUENCE};
use crate::crypto::hmac;
use crate::types::{
    BulkCipher, CipherSuite, ConnectionEnd, ContentType, HashAlgorithm, ProtocolVersion,
};
use crate::Error;

const GCM_TAG_LEN: usize = 16;
const GCM_EXPLICIT_NONCE_LEN: usize = 8;

/// The direction a [`RecordCipher`] protects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Read,
    Write,
}

enum Gcm {
    Aes128(Box<Aes128Gcm>),
    Aes256(Box<Aes256Gcm>),
}

impl Gcm {
    fn new(key: &[u8]) -> Result<Self, Error> {
        let invalid = |_| Error::CryptoFailure(format!("invalid AES-GCM key length {}", key.len()));
        match key.len() {
            16 => Ok(Gcm::Aes128(Box::new(
                Aes128Gcm::new_from_slice(key).map_err(invalid)?,
            ))),
            32 => Ok(Gcm::Aes256(Box::new(
                Aes256Gcm::new_from_slice(key).map_err(invalid)?,
            ))),
            _ => Err(Error::CryptoFailure(format!(
                "invalid AES-GCM key length {}",
                key.len()
            ))),
        }
    }

    fn seal(&self, nonce: &[u8; 12], aad: &[u8], msg: &[u8]) -> Result<Vec<u8>, Error> {
        let nonce = AesGcmNonce::from_slice(nonce);
        let payload = Payload { msg, aad };
        match self {
            Gcm::Aes128(c) => c.encrypt(nonce, payload),
            Gcm::Aes256(c) => c.encrypt(nonce, payload),
        }
        .map_err(|_| Error::CryptoFailure("AES-GCM encryption failed".into()))
    }

    fn open(&self, nonce: &[u8; 12], aad: &[u8], msg: &[u8]) -> Result<Vec<u8>, Error> {
        let nonce = AesGcmNonce::from_slice(nonce);
        let payload = Payload { msg, aad };
        match self {
            Gcm::Aes128(c) => c.decrypt(nonce, payload),
            Gcm::Aes256(c) => c.decrypt(nonce, payload),
        }
        .map_err(|_| Error::CryptoFailure("AES-GCM authentication failed".into()))
    }
}

enum Bulk {
    Null,
    Rc4(Box<Rc4<U16>>),
    Cbc {
        cipher: BulkCipher,
        key: Vec<u8>,
        /// Last ciphertext block, the next IV for TLS 1.0.
        chained_iv: Vec<u8>,
    },
    Gcm(Gcm),
}

/// Record layout, the null cipher counts as a stream cipher.
#[derive(Clone, Copy)]
enum Family {
    Stream,
    Block,
    Aead12,
    Aead13,
}

/// Protection state for one direction of a connection.
///
/// Owns the direction's keys and sequence number. Calls must be ordered:
/// every record consumes exactly one sequence number.
pub struct RecordCipher {
    direction: Direction,
    version: ProtocolVersion,
    bulk: Bulk,
    mac_algorithm: Option<HashAlgorithm>,
    mac_key: Vec<u8>,
    fixed_iv: Vec<u8>,
    epoch: u16,
    next_sequence: u64,
    exhausted: bool,
    last_aead_sequence: Option<u64>,
    /// Explicit nonces already sealed under this key (TLS 1.2 AEAD).
    explicit_nonces: HashSet<[u8; GCM_EXPLICIT_NONCE_LEN]>,
}

impl RecordCipher {
    /// The initial, unprotected state.
    pub fn null(direction: Direction, version: ProtocolVersion) -> Self {
        RecordCipher {
            direction,
            version,
            bulk: Bulk::Null,
            mac_algorithm: None,
            mac_key: Vec::new(),
            fixed_iv: Vec::new(),
            epoch: 0,
            next_sequence: 0,
            exhausted: false,
            last_aead_sequence: None,
            explicit_nonces: HashSet::new(),
        }
    }

    /// A cipher for `suite` keyed from `keys`.
    ///
    /// `local` is our side of the connection: a write cipher uses our keys,
    /// a read cipher the peer's.
    pub fn new(
        direction: Direction,
        local: ConnectionEnd,
        version: ProtocolVersion,
        suite: CipherSuite,
        keys: &KeySet,
        epoch: u16,
    ) -> Result<Self, Error> {
        let sender = match direction {
            Direction::Write => local,
            Direction::Read => local.peer(),
        };
        let (mac_key, key, iv) = keys.keys_for(sender);

        let cipher = suite
            .bulk_cipher()
            .ok_or_else(|| Error::UnsupportedAlgorithm(format!("cipher suite {:?}", suite)))?;
        if key.len() != cipher.key_len() {
            return Err(Error::CryptoFailure(format!(
                "{:?} needs a {} byte key, got {}",
                cipher,
                cipher.key_len(),
                key.len()
            )));
        }

        let bulk = match cipher {
            BulkCipher::Null => Bulk::Null,
            BulkCipher::Rc4_128 => Bulk::Rc4(Box::new(
                <Rc4<U16> as rc4::KeyInit>::new_from_slice(key)
                    .map_err(|_| Error::CryptoFailure("invalid RC4 key".into()))?,
            )),
            BulkCipher::Aes128Cbc | BulkCipher::Aes256Cbc => Bulk::Cbc {
                cipher,
                key: key.to_vec(),
                chained_iv: iv.to_vec(),
            },
            BulkCipher::Aes128Gcm | BulkCipher::Aes256Gcm => {
                let expected = cipher.fixed_iv_len(version.is_tls13());
                if iv.len() != expected {
                    return Err(Error::CryptoFailure(format!(
                        "AES-GCM needs a {} byte IV, got {}",
                        expected,
                        iv.len()
                    )));
                }
                Bulk::Gcm(Gcm::new(key)?)
            }
        };

        debug!(
            "{:?} cipher for {:?} at epoch {} ({})",
            direction, suite, epoch, version
        );

        Ok(RecordCipher {
            direction,
            version,
            bulk,
            mac_algorithm: suite.mac_algorithm(),
            mac_key: mac_key.to_vec(),
            fixed_iv: iv.to_vec(),
            epoch,
            next_sequence: 0,
            exhausted: false,
            last_aead_sequence: None,
            explicit_nonces: HashSet::new(),
        })
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn epoch(&self) -> u16 {
        self.epoch
    }

    /// The sequence number the next record will use.
    pub fn next_sequence(&self) -> u64 {
        self.next_sequence
    }

    pub fn is_aead(&self) -> bool {
        matches!(self.bulk, Bulk::Gcm(_))
    }

    pub fn is_null(&self) -> bool {
        matches!(self.bulk, Bulk::Null) && self.mac_algorithm.is_none()
    }

    fn family(&self) -> Family {
        match self.bulk {
            Bulk::Null | Bulk::Rc4(_) => Family::Stream,
            Bulk::Cbc { .. } => Family::Block,
            Bulk::Gcm(_) if self.version.is_tls13() => Family::Aead13,
            Bulk::Gcm(_) => Family::Aead12,
        }
    }

    fn sequence_limit(&self) -> u64 {
        if self.version.is_dtls() {
            DTLS_MAX_SEQUENCE
        } else {
            u64::MAX
        }
    }

    /// How many more records this cipher can protect.
    pub fn remaining_sequences(&self) -> u64 {
        if self.exhausted || self.next_sequence > self.sequence_limit() {
            return 0;
        }
        (self.sequence_limit() - self.next_sequence).saturating_add(1)
    }

    fn consume_sequence(&mut self, seq: u64) {
        if seq >= self.sequence_limit() {
            self.exhausted = true;
        } else {
            self.next_sequence = seq + 1;
        }
    }

    /// The 8 sequence bytes fed to the MAC, the AAD and the TLS 1.2 AEAD
    /// explicit nonce. DTLS replaces the top two bytes with the epoch.
    fn sequence_field(&self, epoch: u16, seq: u64) -> [u8; 8] {
        let mut field = seq.to_be_bytes();
        if self.version.is_dtls() {
            field[..2].copy_from_slice(&epoch.to_be_bytes());
        }
        field
    }

    fn compute_mac(
        &self,
        seq_field: &[u8; 8],
        content_type: u8,
        version: u16,
        content: &[u8],
    ) -> Result<Vec<u8>, Error> {
        let Some(alg) = self.mac_algorithm else {
            return Ok(Vec::new());
        };
        let len = u16::try_from(content.len())
            .map_err(|_| Error::MalformedInput("record content exceeds u16".into()))?;
        hmac(
            alg,
            &self.mac_key,
            &[
                seq_field,
                &[content_type],
                &version.to_be_bytes(),
                &len.to_be_bytes(),
                content,
            ],
        )
    }

    fn mac_len(&self) -> usize {
        self.mac_algorithm.map(|h| h.output_len()).unwrap_or(0)
    }

    /// Protect `record.clean_protocol_message_bytes`.
    ///
    /// Computes the base values of the sequence number, epoch, MAC,
    /// padding, IV, wire payload and length. Overrides attached to any of
    /// these beforehand take effect in the output.
    pub fn encrypt(&mut self, record: &mut Record) -> Result<(), Error> {
        if self.exhausted {
            return Err(Error::SequenceExhausted);
        }

        record.sequence_number.set_base(self.next_sequence);
        let seq = record.sequence_number.get()?;
        if seq > self.sequence_limit() {
            return Err(Error::SequenceExhausted);
        }
        if self.is_aead() {
            if let Some(last) = self.last_aead_sequence {
                if seq <= last {
                    return Err(Error::NonceReuse(seq));
                }
            }
        }

        if self.version.is_dtls() {
            record.epoch.set_base(self.epoch);
        }
        let epoch = record.epoch.get().unwrap_or(self.epoch);
        let seq_field = self.sequence_field(epoch, seq);
        let content = record.clean_protocol_message_bytes.get()?;

        let payload = match self.family() {
            Family::Stream => self.encrypt_stream(record, &seq_field, content)?,
            Family::Block => self.encrypt_block(record, &seq_field, content)?,
            Family::Aead12 => self.encrypt_aead12(record, &seq_field, content)?,
            Family::Aead13 => self.encrypt_aead13(record, seq, content)?,
        };

        record.protocol_message_bytes.set_base(payload);
        record.set_length_from_payload()?;

        if self.is_aead() {
            self.last_aead_sequence = Some(seq);
        }
        self.consume_sequence(seq);
        trace!("Encrypted record seq {} epoch {}", seq, epoch);

        Ok(())
    }

    fn encrypt_stream(
        &mut self,
        record: &mut Record,
        seq_field: &[u8; 8],
        content: Vec<u8>,
    ) -> Result<Vec<u8>, Error> {
        let mac = self.compute_mac(
            seq_field,
            record.content_type.get()?,
            record.protocol_version.get()?,
            &content,
        )?;
        record.mac.set_base(mac);

        let mut payload = content;
        payload.extend_from_slice(&record.mac.get()?);
        if let Bulk::Rc4(rc4) = &mut self.bulk {
            rc4.apply_keystream(&mut payload);
        }
        Ok(payload)
    }

    fn encrypt_block(
        &mut self,
        record: &mut Record,
        seq_field: &[u8; 8],
        content: Vec<u8>,
    ) -> Result<Vec<u8>, Error> {
        let mac = self.compute_mac(
            seq_field,
            record.content_type.get()?,
            record.protocol_version.get()?,
            &content,
        )?;
        record.mac.set_base(mac);
        let mac = record.mac.get()?;

        let Bulk::Cbc {
            cipher,
            key,
            chained_iv,
        } = &mut self.bulk
        else {
            return Err(Error::UnsupportedAlgorithm("not a block cipher".into()));
        };
        let block_size = cipher.block_size();

        let unpadded = content.len() + mac.len();
        record
            .padding_length
            .set_base((block_size - (unpadded + 1) % block_size) % block_size);
        let padding_length = record.padding_length.get()?;
        let pad_byte = u8::try_from(padding_length)
            .map_err(|_| Error::MalformedInput(format!("padding length {}", padding_length)))?;
        record.padding.set_base(vec![pad_byte; padding_length + 1]);

        let explicit_iv = self.version.uses_explicit_iv();
        if explicit_iv {
            let mut iv = vec![0u8; block_size];
            rand::thread_rng().fill_bytes(&mut iv);
            record.iv.set_base(iv);
        } else {
            record.iv.set_base(chained_iv.clone());
        }
        let iv = record.iv.get()?;

        let mut plaintext = content;
        plaintext.extend_from_slice(&mac);
        plaintext.extend_from_slice(&record.padding.get()?);
        let ciphertext = cbc_encrypt(*cipher, key, &iv, plaintext)?;

        if explicit_iv {
            let mut payload = iv;
            payload.extend_from_slice(&ciphertext);
            Ok(payload)
        } else {
            if ciphertext.len() >= block_size {
                *chained_iv = ciphertext[ciphertext.len() - block_size..].to_vec();
            }
            Ok(ciphertext)
        }
    }

    fn encrypt_aead12(
        &mut self,
        record: &mut Record,
        seq_field: &[u8; 8],
        content: Vec<u8>,
    ) -> Result<Vec<u8>, Error> {
        record.iv.set_base(seq_field.to_vec());
        let explicit = record.iv.get()?;
        let nonce = self.nonce12(&explicit)?;
        let mut used = [0u8; GCM_EXPLICIT_NONCE_LEN];
        used.copy_from_slice(&explicit);
        if self.explicit_nonces.contains(&used) {
            return Err(Error::NonceReuse(u64::from_be_bytes(used)));
        }

        let len = u16::try_from(content.len())
            .map_err(|_| Error::MalformedInput("record content exceeds u16".into()))?;
        let mut aad = seq_field.to_vec();
        aad.push(record.content_type.get()?);
        aad.extend_from_slice(&record.protocol_version.get()?.to_be_bytes());
        aad.extend_from_slice(&len.to_be_bytes());

        let Bulk::Gcm(gcm) = &self.bulk else {
            return Err(Error::UnsupportedAlgorithm("not an AEAD cipher".into()));
        };
        let sealed = gcm.seal(&nonce, &aad, &content)?;
        self.explicit_nonces.insert(used);

        let mut payload = explicit;
        payload.extend_from_slice(&sealed);
        Ok(payload)
    }

    fn encrypt_aead13(
        &self,
        record: &mut Record,
        seq: u64,
        content: Vec<u8>,
    ) -> Result<Vec<u8>, Error> {
        let inner_type = record.content_type.base().copied().ok_or(Error::UnsetValue)?;
        record.content_message_type.set_base(inner_type);
        record
            .content_type
            .set_base(ContentType::ApplicationData.as_u8());

        if !record.padding_length.is_set() {
            record.padding_length.set_base(0);
        }
        record
            .padding
            .set_base(vec![0u8; record.padding_length.get()?]);

        let mut inner = content;
        inner.push(record.content_message_type.get()?);
        inner.extend_from_slice(&record.padding.get()?);

        let len = u16::try_from(inner.len() + GCM_TAG_LEN)
            .map_err(|_| Error::MalformedInput("record content exceeds u16".into()))?;
        let mut aad = vec![record.content_type.get()?];
        aad.extend_from_slice(&record.protocol_version.get()?.to_be_bytes());
        aad.extend_from_slice(&len.to_be_bytes());

        let Bulk::Gcm(gcm) = &self.bulk else {
            return Err(Error::UnsupportedAlgorithm("not an AEAD cipher".into()));
        };
        gcm.seal(&self.nonce13(seq)?, &aad, &inner)
    }

    /// fixed IV (4) ‖ explicit nonce (8)
    fn nonce12(&self, explicit: &[u8]) -> Result<[u8; 12], Error> {
        if self.fixed_iv.len() != 4 || explicit.len() != GCM_EXPLICIT_NONCE_LEN {
            return Err(Error::CryptoFailure(format!(
                "AEAD nonce from {} byte IV and {} byte explicit nonce",
                self.fixed_iv.len(),
                explicit.len()
            )));
        }
        let mut nonce = [0u8; 12];
        nonce[..4].copy_from_slice(&self.fixed_iv);
        nonce[4..].copy_from_slice(explicit);
        Ok(nonce)
    }

    /// RFC 8446, section 5.3: IV XOR left-padded sequence number.
    fn nonce13(&self, seq: u64) -> Result<[u8; 12], Error> {
        let mut nonce: [u8; 12] = self
            .fixed_iv
            .as_slice()
            .try_into()
            .map_err(|_| Error::CryptoFailure("TLS 1.3 IV must be 12 bytes".into()))?;
        for (n, s) in nonce[4..].iter_mut().zip(seq.to_be_bytes()) {
            *n ^= s;
        }
        Ok(nonce)
    }

    /// Remove protection from `record.protocol_message_bytes`.
    ///
    /// Fills the plaintext side of the record. DTLS records use the
    /// sequence number from their header, TLS records the implicit one.
    pub fn decrypt(&mut self, record: &mut Record) -> Result<(), Error> {
        if self.exhausted {
            return Err(Error::SequenceExhausted);
        }
        if !record.sequence_number.is_set() {
            record.sequence_number.set_base(self.next_sequence);
        }
        let seq = record.sequence_number.get()?;
        let epoch = record.epoch.base().copied().unwrap_or(self.epoch);
        let seq_field = self.sequence_field(epoch, seq);
        let payload = record.protocol_message_bytes.get()?;

        let clean = match self.family() {
            Family::Stream => self.decrypt_stream(record, &seq_field, payload)?,
            Family::Block => self.decrypt_block(record, &seq_field, payload)?,
            Family::Aead12 => self.decrypt_aead12(record, &seq_field, payload)?,
            Family::Aead13 => self.decrypt_aead13(record, seq, payload)?,
        };

        record.clean_protocol_message_bytes.set_base(clean);
        self.consume_sequence(seq);
        trace!("Decrypted record seq {} epoch {}", seq, epoch);

        Ok(())
    }

    fn verify_mac(
        &self,
        record: &mut Record,
        seq_field: &[u8; 8],
        content: &[u8],
        received: Vec<u8>,
    ) -> Result<(), Error> {
        let expected = self.compute_mac(
            seq_field,
            record.content_type.get()?,
            record.protocol_version.get()?,
            content,
        )?;
        let matches = expected == received;
        record.mac.set_base(received);
        if !matches {
            return Err(Error::CryptoFailure("bad record MAC".into()));
        }
        Ok(())
    }

    fn decrypt_stream(
        &mut self,
        record: &mut Record,
        seq_field: &[u8; 8],
        mut payload: Vec<u8>,
    ) -> Result<Vec<u8>, Error> {
        if let Bulk::Rc4(rc4) = &mut self.bulk {
            rc4.apply_keystream(&mut payload);
        }
        let mac_len = self.mac_len();
        if payload.len() < mac_len {
            return Err(Error::CryptoFailure("record shorter than its MAC".into()));
        }
        let mac = payload.split_off(payload.len() - mac_len);
        self.verify_mac(record, seq_field, &payload, mac)?;
        Ok(payload)
    }

    fn decrypt_block(
        &mut self,
        record: &mut Record,
        seq_field: &[u8; 8],
        payload: Vec<u8>,
    ) -> Result<Vec<u8>, Error> {
        let explicit_iv = self.version.uses_explicit_iv();
        let mac_len = self.mac_len();
        let Bulk::Cbc {
            cipher,
            key,
            chained_iv,
        } = &mut self.bulk
        else {
            return Err(Error::UnsupportedAlgorithm("not a block cipher".into()));
        };
        let block_size = cipher.block_size();

        let (iv, ciphertext) = if explicit_iv {
            if payload.len() < block_size {
                return Err(Error::CryptoFailure("record shorter than its IV".into()));
            }
            let (iv, ct) = payload.split_at(block_size);
            (iv.to_vec(), ct.to_vec())
        } else {
            (chained_iv.clone(), payload)
        };
        if ciphertext.is_empty() || ciphertext.len() % block_size != 0 {
            return Err(Error::CryptoFailure(format!(
                "CBC record of {} bytes is not block aligned",
                ciphertext.len()
            )));
        }
        if !explicit_iv {
            *chained_iv = ciphertext[ciphertext.len() - block_size..].to_vec();
        }

        let mut plaintext = cbc_decrypt(*cipher, key, &iv, ciphertext)?;
        record.iv.set_base(iv);

        let padding_length = *plaintext.last().unwrap_or(&0) as usize;
        if padding_length + 1 + mac_len > plaintext.len() {
            return Err(Error::CryptoFailure("bad record padding".into()));
        }
        let padding = plaintext.split_off(plaintext.len() - padding_length - 1);
        if padding.iter().any(|b| *b as usize != padding_length) {
            return Err(Error::CryptoFailure("bad record padding".into()));
        }
        record.padding_length.set_base(padding_length);
        record.padding.set_base(padding);

        let mac = plaintext.split_off(plaintext.len() - mac_len);
        self.verify_mac(record, seq_field, &plaintext, mac)?;
        Ok(plaintext)
    }

    fn decrypt_aead12(
        &self,
        record: &mut Record,
        seq_field: &[u8; 8],
        payload: Vec<u8>,
    ) -> Result<Vec<u8>, Error> {
        if payload.len() < GCM_EXPLICIT_NONCE_LEN + GCM_TAG_LEN {
            return Err(Error::CryptoFailure("AEAD record too short".into()));
        }
        let (explicit, sealed) = payload.split_at(GCM_EXPLICIT_NONCE_LEN);
        let nonce = self.nonce12(explicit)?;

        let len = (sealed.len() - GCM_TAG_LEN) as u16;
        let mut aad = seq_field.to_vec();
        aad.push(record.content_type.get()?);
        aad.extend_from_slice(&record.protocol_version.get()?.to_be_bytes());
        aad.extend_from_slice(&len.to_be_bytes());

        let Bulk::Gcm(gcm) = &self.bulk else {
            return Err(Error::UnsupportedAlgorithm("not an AEAD cipher".into()));
        };
        let clean = gcm.open(&nonce, &aad, sealed)?;
        record.iv.set_base(explicit.to_vec());
        Ok(clean)
    }

    fn decrypt_aead13(
        &self,
        record: &mut Record,
        seq: u64,
        payload: Vec<u8>,
    ) -> Result<Vec<u8>, Error> {
        let len = u16::try_from(payload.len())
            .map_err(|_| Error::MalformedInput("record exceeds u16".into()))?;
        let mut aad = vec![record.content_type.get()?];
        aad.extend_from_slice(&record.protocol_version.get()?.to_be_bytes());
        aad.extend_from_slice(&len.to_be_bytes());

        let Bulk::Gcm(gcm) = &self.bulk else {
            return Err(Error::UnsupportedAlgorithm("not an AEAD cipher".into()));
        };
        let mut inner = gcm.open(&self.nonce13(seq)?, &aad, &payload)?;

        let Some(type_pos) = inner.iter().rposition(|b| *b != 0) else {
            return Err(Error::MalformedInput(
                "TLS 1.3 record without inner content type".into(),
            ));
        };
        let padding = inner.split_off(type_pos + 1);
        let inner_type = inner.pop().unwrap_or(0);
        record.content_message_type.set_base(inner_type);
        record.padding_length.set_base(padding.len());
        record.padding.set_base(padding);
        Ok(inner)
    }
}

impl std::fmt::Debug for RecordCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let bulk = match &self.bulk {
            Bulk::Null => "Null",
            Bulk::Rc4(_) => "Rc4",
            Bulk::Cbc { .. } => "Cbc",
            Bulk::Gcm(_) => "Gcm",
        };
        f.debug_struct("RecordCipher")
            .field("direction", &self.direction)
            .field("version", &self.version)
            .field("bulk", &bulk)
            .field("mac", &self.mac_algorithm)
            .field("epoch", &self.epoch)
            .field("next_sequence", &self.next_sequence)
            .finish()
    }
}

impl Drop for RecordCipher {
    fn drop(&mut self) {
        self.mac_key.zeroize();
        self.fixed_iv.zeroize();
        if let Bulk::Cbc { key, .. } = &mut self.bulk {
            key.zeroize();
        }
    }
}

fn cbc_encrypt(
    cipher: BulkCipher,
    key: &[u8],
    iv: &[u8],
    mut buf: Vec<u8>,
) -> Result<Vec<u8>, Error> {
    let msg_len = buf.len();
    let invalid = |_| Error::CryptoFailure("invalid AES-CBC key or IV length".into());
    let result = match cipher {
        BulkCipher::Aes128Cbc => cbc::Encryptor::<Aes128>::new_from_slices(key, iv)
            .map_err(invalid)?
            .encrypt_padded_mut::<NoPadding>(&mut buf, msg_len)
            .map(|ct| ct.len()),
        BulkCipher::Aes256Cbc => cbc::Encryptor::<Aes256>::new_from_slices(key, iv)
            .map_err(invalid)?
            .encrypt_padded_mut::<NoPadding>(&mut buf, msg_len)
            .map(|ct| ct.len()),
        _ => return Err(Error::UnsupportedAlgorithm(format!("{:?} in CBC mode", cipher))),
    };
    result.map_err(|_| Error::CryptoFailure("CBC plaintext is not block aligned".into()))?;
    Ok(buf)
}

fn cbc_decrypt(
    cipher: BulkCipher,
    key: &[u8],
    iv: &[u8],
    mut buf: Vec<u8>,
) -> Result<Vec<u8>, Error> {
    let invalid = |_| Error::CryptoFailure("invalid AES-CBC key or IV length".into());
    let result = match cipher {
        BulkCipher::Aes128Cbc => cbc::Decryptor::<Aes128>::new_from_slices(key, iv)
            .map_err(invalid)?
            .decrypt_padded_mut::<NoPadding>(&mut buf)
            .map(|pt| pt.len()),
        BulkCipher::Aes256Cbc => cbc::Decryptor::<Aes256>::new_from_slices(key, iv)
            .map_err(invalid)?
            .decrypt_padded_mut::<NoPadding>(&mut buf)
            .map(|pt| pt.len()),
        _ => return Err(Error::UnsupportedAlgorithm(format!("{:?} in CBC mode", cipher))),
    };
    let len =
        result.map_err(|_| Error::CryptoFailure("CBC ciphertext is not block aligned".into()))?;
    buf.truncate(len);
    Ok(buf)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::Modification;

    fn hex(s: &str) -> Vec<u8> {
        (0..s.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&s[i..i + 2], 16).unwrap())
            .collect()
    }

    const SERVER_HS_SECRET: &str =
        "acc9db33ee0968fae7e06daa34d642b146092ce7f9c9cf47670c66a0a6ce1c8c";

    fn pair(
        version: ProtocolVersion,
        suite: CipherSuite,
        keys: &KeySet,
    ) -> (RecordCipher, RecordCipher) {
        let write = RecordCipher::new(
            Direction::Write,
            ConnectionEnd::Client,
            version,
            suite,
            keys,
            1,
        )
        .unwrap();
        let read = RecordCipher::new(
            Direction::Read,
            ConnectionEnd::Server,
            version,
            suite,
            keys,
            1,
        )
        .unwrap();
        (write, read)
    }

    fn tls12_keys(mac_len: usize, key_len: usize, iv_len: usize) -> KeySet {
        let block: Vec<u8> = (0..2 * (mac_len + key_len + iv_len))
            .map(|i| i as u8)
            .collect();
        KeySet::from_key_block(&block, mac_len, key_len, iv_len).unwrap()
    }

    fn wire(record: &Record) -> Record {
        let mut out = Vec::new();
        record.serialize(&mut out, false).unwrap();
        Record::parse(&out, false).unwrap().1
    }

    #[test]
    fn tls13_known_answer() {
        let secret = hex(SERVER_HS_SECRET);
        let keys = KeySet::derive_tls13(CipherSuite::TLS_AES_128_GCM_SHA256, &secret, &secret)
            .unwrap();
        let mut cipher = RecordCipher::new(
            Direction::Write,
            ConnectionEnd::Server,
            ProtocolVersion::TLS1_3,
            CipherSuite::TLS_AES_128_GCM_SHA256,
            &keys,
            0,
        )
        .unwrap();

        let mut record = Record::new(
            ContentType::Handshake,
            ProtocolVersion::TLS1_3,
            hex("080000020000"),
        );
        cipher.encrypt(&mut record).unwrap();

        let mut out = Vec::new();
        record.serialize(&mut out, false).unwrap();
        assert_eq!(&out[..5], &hex("1703030017")[..]);
        assert_eq!(&out[5..], &hex("1bb3293a919e0d3cad446539b2101b0cc1105b5a4bb7b9")[..]);
        assert_eq!(record.content_message_type.get().unwrap(), 0x16);
    }

    #[test]
    fn tls13_padding_roundtrip() {
        let secret = [3u8; 32];
        let keys = KeySet::derive_tls13(CipherSuite::TLS_AES_128_GCM_SHA256, &secret, &[4u8; 32])
            .unwrap();
        let (mut write, mut read) =
            pair(ProtocolVersion::TLS1_3, CipherSuite::TLS_AES_128_GCM_SHA256, &keys);

        let mut record = Record::new(ContentType::Alert, ProtocolVersion::TLS1_3, vec![2, 40]);
        record.padding_length.set_base(5);
        write.encrypt(&mut record).unwrap();
        assert_eq!(record.length.get().unwrap() as usize, 2 + 1 + 5 + GCM_TAG_LEN);

        let mut received = wire(&record);
        read.decrypt(&mut received).unwrap();
        assert_eq!(received.clean_protocol_message_bytes.get().unwrap(), [2, 40]);
        assert_eq!(received.inner_content_type().unwrap(), ContentType::Alert);
        assert_eq!(received.padding_length.get().unwrap(), 5);
    }

    #[test]
    fn aead_sequence_strictly_increases() {
        let keys = tls12_keys(0, 16, 4);
        let (mut write, _) = pair(
            ProtocolVersion::TLS1_2,
            CipherSuite::TLS_RSA_WITH_AES_128_GCM_SHA256,
            &keys,
        );

        let mut nonces = Vec::new();
        for expected in 0..5u64 {
            let mut record = Record::new(ContentType::ApplicationData, ProtocolVersion::TLS1_2, vec![0; 3]);
            write.encrypt(&mut record).unwrap();
            assert_eq!(record.sequence_number.get().unwrap(), expected);
            nonces.push(record.iv.get().unwrap());
        }
        nonces.sort();
        nonces.dedup();
        assert_eq!(nonces.len(), 5);
        assert_eq!(write.next_sequence(), 5);
    }

    #[test]
    fn overridden_sequence_cannot_repeat_nonce() {
        let keys = tls12_keys(0, 16, 4);
        let (mut write, _) = pair(
            ProtocolVersion::TLS1_2,
            CipherSuite::TLS_RSA_WITH_AES_128_GCM_SHA256,
            &keys,
        );

        let mut first = Record::new(ContentType::ApplicationData, ProtocolVersion::TLS1_2, vec![1]);
        write.encrypt(&mut first).unwrap();

        let mut second = Record::new(ContentType::ApplicationData, ProtocolVersion::TLS1_2, vec![2]);
        second
            .sequence_number
            .set_modification(Modification::explicit(0));
        assert!(matches!(write.encrypt(&mut second), Err(Error::NonceReuse(0))));
        // The failed record consumed nothing.
        assert_eq!(write.next_sequence(), 1);
    }

    #[test]
    fn overridden_explicit_nonce_cannot_repeat() {
        let keys = tls12_keys(0, 16, 4);
        let (mut write, mut read) = pair(
            ProtocolVersion::TLS1_2,
            CipherSuite::TLS_RSA_WITH_AES_128_GCM_SHA256,
            &keys,
        );

        let mut first = Record::new(ContentType::ApplicationData, ProtocolVersion::TLS1_2, vec![1]);
        write.encrypt(&mut first).unwrap();
        assert_eq!(first.iv.get().unwrap(), vec![0; 8]);

        // Fresh sequence number, but the nonce of record 0.
        let mut second = Record::new(ContentType::ApplicationData, ProtocolVersion::TLS1_2, vec![2]);
        second.iv.set_modification(Modification::explicit(vec![0; 8]));
        assert!(matches!(write.encrypt(&mut second), Err(Error::NonceReuse(0))));
        assert_eq!(write.next_sequence(), 1);

        // An unused explicit nonce is accepted and decrypts.
        let mut third = Record::new(ContentType::ApplicationData, ProtocolVersion::TLS1_2, vec![3]);
        third.iv.set_modification(Modification::explicit(vec![0, 0, 0, 0, 0, 0, 0, 9]));
        write.encrypt(&mut third).unwrap();
        assert_eq!(write.next_sequence(), 2);

        let mut received = wire(&first);
        read.decrypt(&mut received).unwrap();
        let mut received = wire(&third);
        read.decrypt(&mut received).unwrap();
        assert_eq!(received.clean_protocol_message_bytes.get().unwrap(), [3]);
    }

    #[test]
    fn aead12_roundtrip_and_tamper() {
        let keys = tls12_keys(0, 32, 4);
        let (mut write, mut read) = pair(
            ProtocolVersion::TLS1_2,
            CipherSuite::TLS_RSA_WITH_AES_256_GCM_SHA384,
            &keys,
        );

        let mut record = Record::new(ContentType::Handshake, ProtocolVersion::TLS1_2, vec![0x14, 0, 0, 0]);
        write.encrypt(&mut record).unwrap();
        assert_eq!(record.length.get().unwrap(), 8 + 4 + 16);

        let mut received = wire(&record);
        read.decrypt(&mut received).unwrap();
        assert_eq!(received.clean_protocol_message_bytes.get().unwrap(), [0x14, 0, 0, 0]);

        let mut record = Record::new(ContentType::Handshake, ProtocolVersion::TLS1_2, vec![1, 2, 3]);
        write.encrypt(&mut record).unwrap();
        let mut tampered = wire(&record);
        tampered
            .protocol_message_bytes
            .set_modification(Modification::xor_bytes(vec![0, 0, 0, 0, 0, 0, 0, 0, 0xFF]));
        assert!(matches!(read.decrypt(&mut tampered), Err(Error::CryptoFailure(_))));
    }

    #[test]
    fn cbc_roundtrip() {
        let keys = tls12_keys(20, 16, 16);
        let (mut write, mut read) = pair(
            ProtocolVersion::TLS1_2,
            CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA,
            &keys,
        );

        for content in [vec![], vec![7u8; 11], vec![9u8; 40]] {
            let mut record = Record::new(ContentType::ApplicationData, ProtocolVersion::TLS1_2, content.clone());
            write.encrypt(&mut record).unwrap();
            let len = record.length.get().unwrap() as usize;
            assert_eq!(len % 16, 0);
            assert_eq!(record.iv.get().unwrap().len(), 16);

            let mut received = wire(&record);
            read.decrypt(&mut received).unwrap();
            assert_eq!(received.clean_protocol_message_bytes.get().unwrap(), content);
            assert_eq!(received.mac.get().unwrap(), record.mac.get().unwrap());
        }
    }

    #[test]
    fn cbc_tls10_chains_iv() {
        let keys = tls12_keys(20, 32, 16);
        let (mut write, mut read) = pair(
            ProtocolVersion::TLS1_0,
            CipherSuite::TLS_RSA_WITH_AES_256_CBC_SHA,
            &keys,
        );

        let mut first = Record::new(ContentType::ApplicationData, ProtocolVersion::TLS1_0, vec![1; 5]);
        write.encrypt(&mut first).unwrap();
        let first_payload = first.protocol_message_bytes.get().unwrap();

        let mut second = Record::new(ContentType::ApplicationData, ProtocolVersion::TLS1_0, vec![2; 5]);
        write.encrypt(&mut second).unwrap();
        assert_eq!(second.iv.get().unwrap(), &first_payload[first_payload.len() - 16..]);

        for record in [first, second] {
            let mut received = wire(&record);
            read.decrypt(&mut received).unwrap();
            assert_eq!(
                received.clean_protocol_message_bytes.get().unwrap(),
                record.clean_protocol_message_bytes.get().unwrap()
            );
        }
    }

    #[test]
    fn cbc_padding_override() {
        let keys = tls12_keys(20, 16, 16);
        let (mut write, mut read) = pair(
            ProtocolVersion::TLS1_2,
            CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA,
            &keys,
        );

        // 11 + 20 + 1 = 32: no padding needed, force a full extra block.
        let mut record = Record::new(ContentType::ApplicationData, ProtocolVersion::TLS1_2, vec![7; 11]);
        record.padding_length.set_modification(Modification::add(16));
        write.encrypt(&mut record).unwrap();
        assert_eq!(record.padding.get().unwrap(), vec![16u8; 17]);
        assert_eq!(record.length.get().unwrap(), 16 + 48);

        let mut received = wire(&record);
        read.decrypt(&mut received).unwrap();
        assert_eq!(received.padding_length.get().unwrap(), 16);

        // Misaligned padding cannot be encrypted.
        let mut record = Record::new(ContentType::ApplicationData, ProtocolVersion::TLS1_2, vec![7; 11]);
        record.padding_length.set_modification(Modification::add(1));
        assert!(matches!(write.encrypt(&mut record), Err(Error::CryptoFailure(_))));
    }

    #[test]
    fn bad_mac_is_rejected() {
        let keys = tls12_keys(20, 16, 0);
        let (mut write, mut read) = pair(
            ProtocolVersion::TLS1_2,
            CipherSuite::TLS_RSA_WITH_RC4_128_SHA,
            &keys,
        );

        let mut record = Record::new(ContentType::ApplicationData, ProtocolVersion::TLS1_2, b"hello".to_vec());
        record.mac.set_modification(Modification::xor_bytes(vec![1]));
        write.encrypt(&mut record).unwrap();
        assert_eq!(record.length.get().unwrap(), 5 + 20);

        let mut received = wire(&record);
        assert!(matches!(read.decrypt(&mut received), Err(Error::CryptoFailure(_))));
    }

    #[test]
    fn rc4_roundtrip() {
        let keys = tls12_keys(20, 16, 0);
        let (mut write, mut read) = pair(
            ProtocolVersion::TLS1_2,
            CipherSuite::TLS_RSA_WITH_RC4_128_SHA,
            &keys,
        );

        for content in [b"first".to_vec(), b"second".to_vec()] {
            let mut record = Record::new(ContentType::ApplicationData, ProtocolVersion::TLS1_2, content.clone());
            write.encrypt(&mut record).unwrap();
            assert_ne!(&record.protocol_message_bytes.get().unwrap()[..content.len()], &content[..]);

            let mut received = wire(&record);
            read.decrypt(&mut received).unwrap();
            assert_eq!(received.clean_protocol_message_bytes.get().unwrap(), content);
        }
    }

    #[test]
    fn null_cipher_passes_through() {
        let mut write = RecordCipher::null(Direction::Write, ProtocolVersion::TLS1_2);
        assert!(write.is_null());
        let mut record = Record::new(ContentType::Handshake, ProtocolVersion::TLS1_2, vec![0x0E, 0, 0, 0]);
        write.encrypt(&mut record).unwrap();
        assert_eq!(record.protocol_message_bytes.get().unwrap(), [0x0E, 0, 0, 0]);
        assert_eq!(record.length.get().unwrap(), 4);
    }

    #[test]
    fn dtls_sequence_exhaustion() {
        let keys = tls12_keys(0, 16, 4);
        let (mut write, _) = pair(
            ProtocolVersion::DTLS1_2,
            CipherSuite::TLS_RSA_WITH_AES_128_GCM_SHA256,
            &keys,
        );

        let mut record = Record::new(ContentType::ApplicationData, ProtocolVersion::DTLS1_2, vec![1]);
        record
            .sequence_number
            .set_modification(Modification::explicit(DTLS_MAX_SEQUENCE));
        write.encrypt(&mut record).unwrap();
        assert_eq!(record.epoch.get().unwrap(), 1);
        assert_eq!(&record.iv.get().unwrap()[..2], &[0, 1]);

        let mut record = Record::new(ContentType::ApplicationData, ProtocolVersion::DTLS1_2, vec![2]);
        assert!(matches!(write.encrypt(&mut record), Err(Error::SequenceExhausted)));
    }
}
