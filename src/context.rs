use crate::types::{CipherSuite, CompressionMethod, ProtocolVersion, SignatureAndHashAlgorithm};

/// Values negotiated or observed on one connection.
///
/// Owned by the [`WorkflowExecutor`](crate::workflow::WorkflowExecutor) and
/// updated as messages are sent and received. Every field starts unset; the
/// [`Chooser`](crate::Chooser) falls back to the config until it is set.
#[derive(Debug, Default, Clone)]
pub struct TlsContext {
    selected_protocol_version: Option<ProtocolVersion>,
    highest_client_protocol_version: Option<ProtocolVersion>,
    selected_cipher_suite: Option<CipherSuite>,
    selected_compression_method: Option<CompressionMethod>,
    selected_signature_and_hash_algorithm: Option<SignatureAndHashAlgorithm>,
    client_random: Option<Vec<u8>>,
    server_random: Option<Vec<u8>>,
    client_session_id: Option<Vec<u8>>,
    server_session_id: Option<Vec<u8>>,
    dtls_cookie: Option<Vec<u8>>,
    master_secret: Option<Vec<u8>>,
    client_handshake_traffic_secret: Option<Vec<u8>>,
    server_handshake_traffic_secret: Option<Vec<u8>>,
    transcript: Vec<u8>,
    write_message_seq: u16,
    read_message_seq: u16,
}

impl TlsContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected_protocol_version(&self) -> Option<ProtocolVersion> {
        self.selected_protocol_version
    }

    pub fn set_selected_protocol_version(&mut self, v: ProtocolVersion) {
        self.selected_protocol_version = Some(v);
    }

    pub fn highest_client_protocol_version(&self) -> Option<ProtocolVersion> {
        self.highest_client_protocol_version
    }

    pub fn set_highest_client_protocol_version(&mut self, v: ProtocolVersion) {
        self.highest_client_protocol_version = Some(v);
    }

    pub fn selected_cipher_suite(&self) -> Option<CipherSuite> {
        self.selected_cipher_suite
    }

    pub fn set_selected_cipher_suite(&mut self, suite: CipherSuite) {
        self.selected_cipher_suite = Some(suite);
    }

    pub fn selected_compression_method(&self) -> Option<CompressionMethod> {
        self.selected_compression_method
    }

    pub fn set_selected_compression_method(&mut self, method: CompressionMethod) {
        self.selected_compression_method = Some(method);
    }

    pub fn selected_signature_and_hash_algorithm(&self) -> Option<SignatureAndHashAlgorithm> {
        self.selected_signature_and_hash_algorithm
    }

    pub fn set_selected_signature_and_hash_algorithm(&mut self, alg: SignatureAndHashAlgorithm) {
        self.selected_signature_and_hash_algorithm = Some(alg);
    }

    pub fn client_random(&self) -> Option<&[u8]> {
        self.client_random.as_deref()
    }

    pub fn set_client_random(&mut self, random: Vec<u8>) {
        self.client_random = Some(random);
    }

    pub fn server_random(&self) -> Option<&[u8]> {
        self.server_random.as_deref()
    }

    pub fn set_server_random(&mut self, random: Vec<u8>) {
        self.server_random = Some(random);
    }

    pub fn client_session_id(&self) -> Option<&[u8]> {
        self.client_session_id.as_deref()
    }

    pub fn set_client_session_id(&mut self, id: Vec<u8>) {
        self.client_session_id = Some(id);
    }

    pub fn server_session_id(&self) -> Option<&[u8]> {
        self.server_session_id.as_deref()
    }

    pub fn set_server_session_id(&mut self, id: Vec<u8>) {
        self.server_session_id = Some(id);
    }

    pub fn dtls_cookie(&self) -> Option<&[u8]> {
        self.dtls_cookie.as_deref()
    }

    pub fn set_dtls_cookie(&mut self, cookie: Vec<u8>) {
        self.dtls_cookie = Some(cookie);
    }

    pub fn master_secret(&self) -> Option<&[u8]> {
        self.master_secret.as_deref()
    }

    pub fn set_master_secret(&mut self, secret: Vec<u8>) {
        self.master_secret = Some(secret);
    }

    pub fn client_handshake_traffic_secret(&self) -> Option<&[u8]> {
        self.client_handshake_traffic_secret.as_deref()
    }

    pub fn set_client_handshake_traffic_secret(&mut self, secret: Vec<u8>) {
        self.client_handshake_traffic_secret = Some(secret);
    }

    pub fn server_handshake_traffic_secret(&self) -> Option<&[u8]> {
        self.server_handshake_traffic_secret.as_deref()
    }

    pub fn set_server_handshake_traffic_secret(&mut self, secret: Vec<u8>) {
        self.server_handshake_traffic_secret = Some(secret);
    }

    /// Concatenated handshake messages, as hashed for Finished and
    /// CertificateVerify.
    pub fn transcript(&self) -> &[u8] {
        &self.transcript
    }

    pub fn append_transcript(&mut self, bytes: &[u8]) {
        self.transcript.extend_from_slice(bytes);
    }

    /// Next DTLS message_seq to send, post-incremented.
    pub fn next_write_message_seq(&mut self) -> u16 {
        let seq = self.write_message_seq;
        self.write_message_seq = self.write_message_seq.wrapping_add(1);
        seq
    }

    pub fn read_message_seq(&self) -> u16 {
        self.read_message_seq
    }

    pub fn set_read_message_seq(&mut self, seq: u16) {
        self.read_message_seq = seq;
    }
}
