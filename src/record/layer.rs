use super::{parse_records, serialize_records, Direction, Record, RecordCipher};
use crate::chooser::Chooser;
use crate::types::{ContentType, ProtocolVersion};
use crate::Error;

/// Splits serialized messages into records and applies the current
/// protection of each direction.
#[derive(Debug)]
pub struct RecordLayer {
    dtls: bool,
    encryptor: RecordCipher,
    decryptor: RecordCipher,
}

impl RecordLayer {
    /// A record layer with null protection in both directions.
    pub fn new(version: ProtocolVersion) -> Self {
        RecordLayer {
            dtls: version.is_dtls(),
            encryptor: RecordCipher::null(Direction::Write, version),
            decryptor: RecordCipher::null(Direction::Read, version),
        }
    }

    pub fn is_dtls(&self) -> bool {
        self.dtls
    }

    pub fn encryptor(&self) -> &RecordCipher {
        &self.encryptor
    }

    pub fn decryptor(&self) -> &RecordCipher {
        &self.decryptor
    }

    pub fn set_encryptor(&mut self, cipher: RecordCipher) -> Result<(), Error> {
        if cipher.direction() != Direction::Write {
            return Err(Error::CryptoFailure("encryptor must be a write cipher".into()));
        }
        self.encryptor = cipher;
        Ok(())
    }

    pub fn set_decryptor(&mut self, cipher: RecordCipher) -> Result<(), Error> {
        if cipher.direction() != Direction::Read {
            return Err(Error::CryptoFailure("decryptor must be a read cipher".into()));
        }
        self.decryptor = cipher;
        Ok(())
    }

    /// Wrap `content` into protected records no larger than the configured
    /// maximum record length. Empty content yields one empty record.
    ///
    /// Fails without consuming a sequence number if the encryptor cannot
    /// protect every chunk. A crypto failure midway leaves the encryptor
    /// advanced past the records already protected.
    pub fn prepare_records(
        &mut self,
        content_type: ContentType,
        content: &[u8],
        chooser: &Chooser<'_>,
    ) -> Result<Vec<Record>, Error> {
        let version = chooser.protocol_version();
        let max = chooser.config().max_record_length().max(1);

        let mut chunks: Vec<&[u8]> = content.chunks(max).collect();
        if chunks.is_empty() {
            chunks.push(&[]);
        }
        if chunks.len() as u64 > self.encryptor.remaining_sequences() {
            return Err(Error::SequenceExhausted);
        }

        let mut records = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            let mut record = Record::new(content_type, version, chunk.to_vec());
            if version.is_tls13() && !self.encryptor.is_null() {
                record
                    .padding_length
                    .set_base(chooser.config().record_padding_length());
            }
            self.encrypt_record(&mut record)?;
            records.push(record);
        }

        trace!(
            "{} bytes of {:?} in {} record(s)",
            content.len(),
            content_type,
            records.len()
        );
        Ok(records)
    }

    /// Protect a record built by the caller.
    pub fn encrypt_record(&mut self, record: &mut Record) -> Result<(), Error> {
        self.encryptor.encrypt(record)
    }

    pub fn decrypt_record(&mut self, record: &mut Record) -> Result<(), Error> {
        self.decryptor.decrypt(record)
    }

    pub fn parse_records(&self, input: &[u8]) -> Result<Vec<Record>, Error> {
        parse_records(input, self.dtls)
    }

    pub fn serialize_records(&self, records: &[Record]) -> Result<Vec<u8>, Error> {
        serialize_records(records, self.dtls)
    }
}
