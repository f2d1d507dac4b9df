use thiserror::Error;

/// Errors surfaced by the message, record and reassembly pipelines.
#[derive(Debug, Error)]
pub enum Error {
    /// The buffer is shorter than a declared length requires, or a field
    /// carries a value the wire format cannot hold.
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// A DTLS fragment does not belong to the message stored for its sequence.
    #[error("Reassembly inconsistency for message_seq {message_seq}: {reason}")]
    ReassemblyInconsistency { message_seq: u16, reason: String },

    #[error("Crypto failure: {0}")]
    CryptoFailure(String),

    /// A field was read with neither a base value nor an explicit override.
    #[error("Field has neither a value nor an explicit modification")]
    UnsetValue,

    /// An AEAD record would reuse a sequence number (and thereby a nonce).
    #[error("AEAD sequence number {0} already used")]
    NonceReuse(u64),

    #[error("Record sequence number exhausted")]
    SequenceExhausted,

    #[error("Transport: {0}")]
    Transport(#[from] std::io::Error),
}

impl<'a> From<nom::Err<nom::error::Error<&'a [u8]>>> for Error {
    fn from(value: nom::Err<nom::error::Error<&'a [u8]>>) -> Self {
        match value {
            nom::Err::Incomplete(_) => Error::MalformedInput("incomplete input".into()),
            nom::Err::Error(e) | nom::Err::Failure(e) => Error::MalformedInput(format!(
                "{:?} with {} bytes remaining",
                e.code,
                e.input.len()
            )),
        }
    }
}
