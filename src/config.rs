use num_bigint::BigUint;

use crate::types::{
    AlertLevel, CipherSuite, CompressionMethod, ConnectionEnd, HashAlgorithm, ProtocolVersion,
    SignatureAlgorithm, SignatureAndHashAlgorithm,
};

// RFC 5054, Appendix A, 1024-bit group.
const SRP_MODULUS_1024: &[u8] = &[
    0xEE, 0xAF, 0x0A, 0xB9, 0xAD, 0xB3, 0x8D, 0xD6, 0x9C, 0x33, 0xF8, 0x0A, 0xFA, 0x8F, 0xC5, 0xE8,
    0x60, 0x72, 0x61, 0x87, 0x75, 0xFF, 0x3C, 0x0B, 0x9E, 0xA2, 0x31, 0x4C, 0x9C, 0x25, 0x65, 0x76,
    0xD6, 0x74, 0xDF, 0x74, 0x96, 0xEA, 0x81, 0xD3, 0x38, 0x3B, 0x48, 0x13, 0xD6, 0x92, 0xC6, 0xE0,
    0xE0, 0xD5, 0xD8, 0xE2, 0x50, 0xB9, 0x8B, 0xE4, 0x8E, 0x49, 0x5C, 0x1D, 0x60, 0x89, 0xDA, 0xD1,
    0x5D, 0xC7, 0xD7, 0xB4, 0x61, 0x54, 0xD6, 0xB6, 0xCE, 0x8E, 0xF4, 0xAD, 0x69, 0xB1, 0x5D, 0x49,
    0x82, 0x55, 0x9B, 0x29, 0x7B, 0xCF, 0x18, 0x85, 0xC5, 0x29, 0xF5, 0x66, 0x66, 0x0E, 0x57, 0xEC,
    0x68, 0xED, 0xBC, 0x3C, 0x05, 0x72, 0x6C, 0xC0, 0x2F, 0xD4, 0xCB, 0xF4, 0x97, 0x6E, 0xAA, 0x9A,
    0xFD, 0x51, 0x38, 0xFE, 0x83, 0x76, 0x43, 0x5B, 0x9F, 0xC6, 0x1D, 0x2F, 0xC0, 0xEB, 0x06, 0xE3,
];

// RFC 5054, Appendix B.
const SRP_SALT: &[u8] = &[
    0xBE, 0xB2, 0x53, 0x79, 0xD1, 0xA8, 0x58, 0x1E, 0xB5, 0xA7, 0x27, 0x67, 0x3A, 0x24, 0x41, 0xEE,
];
const SRP_SERVER_PRIVATE_KEY: &[u8] = &[
    0xE4, 0x87, 0xCB, 0x59, 0xD3, 0x1A, 0xC5, 0x50, 0x47, 0x1E, 0x81, 0xF0, 0x0F, 0x69, 0x28, 0xE0,
    0x1D, 0xDA, 0x08, 0xE9, 0x74, 0xA0, 0x04, 0xF4, 0x9E, 0x61, 0xF5, 0xD1, 0x05, 0x28, 0x4D, 0x20,
];

/// Fallback values for everything the [`Chooser`](crate::Chooser) resolves
/// before (or instead of) negotiation.
#[derive(Clone, Debug)]
pub struct Config {
    connection_end: ConnectionEnd,
    highest_protocol_version: ProtocolVersion,
    default_selected_protocol_version: ProtocolVersion,
    client_supported_cipher_suites: Vec<CipherSuite>,
    default_selected_cipher_suite: CipherSuite,
    client_supported_compression_methods: Vec<CompressionMethod>,
    default_selected_compression_method: CompressionMethod,
    default_client_random: Vec<u8>,
    default_server_random: Vec<u8>,
    default_client_session_id: Vec<u8>,
    default_server_session_id: Vec<u8>,
    default_dtls_cookie: Vec<u8>,
    signature_and_hash_algorithm: SignatureAndHashAlgorithm,
    private_key: Option<Vec<u8>>,
    srp_modulus: BigUint,
    srp_generator: BigUint,
    srp_salt: Vec<u8>,
    srp_server_private_key: BigUint,
    srp_identity: Vec<u8>,
    srp_password: Vec<u8>,
    heartbeat_payload_length: usize,
    heartbeat_padding_length: usize,
    record_padding_length: usize,
    max_record_length: usize,
    dtls_max_fragment_length: usize,
    client_extensions: Option<Vec<u8>>,
    server_extensions: Option<Vec<u8>>,
    default_alert_level: AlertLevel,
    default_alert_description: u8,
    default_master_secret: Vec<u8>,
    default_client_handshake_traffic_secret: Vec<u8>,
    default_server_handshake_traffic_secret: Vec<u8>,
}

impl Config {
    /// Create a new configuration builder.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder {
            config: Config {
                connection_end: ConnectionEnd::Client,
                highest_protocol_version: ProtocolVersion::TLS1_2,
                default_selected_protocol_version: ProtocolVersion::TLS1_2,
                client_supported_cipher_suites: vec![
                    CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA,
                    CipherSuite::TLS_RSA_WITH_AES_128_GCM_SHA256,
                    CipherSuite::TLS_SRP_SHA_WITH_AES_128_CBC_SHA,
                ],
                default_selected_cipher_suite: CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA,
                client_supported_compression_methods: vec![CompressionMethod::Null],
                default_selected_compression_method: CompressionMethod::Null,
                default_client_random: vec![0; 32],
                default_server_random: vec![0; 32],
                default_client_session_id: Vec::new(),
                default_server_session_id: Vec::new(),
                default_dtls_cookie: Vec::new(),
                signature_and_hash_algorithm: SignatureAndHashAlgorithm::new(
                    HashAlgorithm::SHA256,
                    SignatureAlgorithm::RSA,
                ),
                private_key: None,
                srp_modulus: BigUint::from_bytes_be(SRP_MODULUS_1024),
                srp_generator: BigUint::from(2u8),
                srp_salt: SRP_SALT.to_vec(),
                srp_server_private_key: BigUint::from_bytes_be(SRP_SERVER_PRIVATE_KEY),
                srp_identity: b"alice".to_vec(),
                srp_password: b"password123".to_vec(),
                heartbeat_payload_length: 256,
                heartbeat_padding_length: 256,
                record_padding_length: 0,
                max_record_length: 16384,
                dtls_max_fragment_length: 1400,
                client_extensions: None,
                server_extensions: None,
                default_alert_level: AlertLevel::Fatal,
                default_alert_description: 40,
                default_master_secret: vec![0; 48],
                default_client_handshake_traffic_secret: vec![0; 32],
                default_server_handshake_traffic_secret: vec![0; 32],
            },
        }
    }

    /// Which side of the connection we play.
    #[inline(always)]
    pub fn connection_end(&self) -> ConnectionEnd {
        self.connection_end
    }

    /// Version offered in the ClientHello.
    #[inline(always)]
    pub fn highest_protocol_version(&self) -> ProtocolVersion {
        self.highest_protocol_version
    }

    /// Version used until a ServerHello selects one.
    #[inline(always)]
    pub fn default_selected_protocol_version(&self) -> ProtocolVersion {
        self.default_selected_protocol_version
    }

    #[inline(always)]
    pub fn client_supported_cipher_suites(&self) -> &[CipherSuite] {
        &self.client_supported_cipher_suites
    }

    #[inline(always)]
    pub fn default_selected_cipher_suite(&self) -> CipherSuite {
        self.default_selected_cipher_suite
    }

    #[inline(always)]
    pub fn client_supported_compression_methods(&self) -> &[CompressionMethod] {
        &self.client_supported_compression_methods
    }

    #[inline(always)]
    pub fn default_selected_compression_method(&self) -> CompressionMethod {
        self.default_selected_compression_method
    }

    #[inline(always)]
    pub fn default_client_random(&self) -> &[u8] {
        &self.default_client_random
    }

    #[inline(always)]
    pub fn default_server_random(&self) -> &[u8] {
        &self.default_server_random
    }

    #[inline(always)]
    pub fn default_client_session_id(&self) -> &[u8] {
        &self.default_client_session_id
    }

    #[inline(always)]
    pub fn default_server_session_id(&self) -> &[u8] {
        &self.default_server_session_id
    }

    #[inline(always)]
    pub fn default_dtls_cookie(&self) -> &[u8] {
        &self.default_dtls_cookie
    }

    /// Algorithm used for ServerKeyExchange and CertificateVerify signatures.
    #[inline(always)]
    pub fn signature_and_hash_algorithm(&self) -> SignatureAndHashAlgorithm {
        self.signature_and_hash_algorithm
    }

    /// Signing key, PKCS#8 in DER or PEM.
    #[inline(always)]
    pub fn private_key(&self) -> Option<&[u8]> {
        self.private_key.as_deref()
    }

    #[inline(always)]
    pub fn srp_modulus(&self) -> &BigUint {
        &self.srp_modulus
    }

    #[inline(always)]
    pub fn srp_generator(&self) -> &BigUint {
        &self.srp_generator
    }

    #[inline(always)]
    pub fn srp_salt(&self) -> &[u8] {
        &self.srp_salt
    }

    #[inline(always)]
    pub fn srp_server_private_key(&self) -> &BigUint {
        &self.srp_server_private_key
    }

    #[inline(always)]
    pub fn srp_identity(&self) -> &[u8] {
        &self.srp_identity
    }

    #[inline(always)]
    pub fn srp_password(&self) -> &[u8] {
        &self.srp_password
    }

    #[inline(always)]
    pub fn heartbeat_payload_length(&self) -> usize {
        self.heartbeat_payload_length
    }

    /// Requested heartbeat padding. Never less than 16 on the wire.
    #[inline(always)]
    pub fn heartbeat_padding_length(&self) -> usize {
        self.heartbeat_padding_length
    }

    /// Zero padding appended inside TLS 1.3 records.
    #[inline(always)]
    pub fn record_padding_length(&self) -> usize {
        self.record_padding_length
    }

    /// Largest plaintext carried by one record.
    #[inline(always)]
    pub fn max_record_length(&self) -> usize {
        self.max_record_length
    }

    /// Largest body carried by one DTLS handshake fragment.
    #[inline(always)]
    pub fn dtls_max_fragment_length(&self) -> usize {
        self.dtls_max_fragment_length
    }

    /// Raw extension block for the ClientHello, without its length prefix.
    #[inline(always)]
    pub fn client_extensions(&self) -> Option<&[u8]> {
        self.client_extensions.as_deref()
    }

    /// Raw extension block for the ServerHello, without its length prefix.
    #[inline(always)]
    pub fn server_extensions(&self) -> Option<&[u8]> {
        self.server_extensions.as_deref()
    }

    #[inline(always)]
    pub fn default_alert_level(&self) -> AlertLevel {
        self.default_alert_level
    }

    #[inline(always)]
    pub fn default_alert_description(&self) -> u8 {
        self.default_alert_description
    }

    #[inline(always)]
    pub fn default_master_secret(&self) -> &[u8] {
        &self.default_master_secret
    }

    #[inline(always)]
    pub fn default_client_handshake_traffic_secret(&self) -> &[u8] {
        &self.default_client_handshake_traffic_secret
    }

    #[inline(always)]
    pub fn default_server_handshake_traffic_secret(&self) -> &[u8] {
        &self.default_server_handshake_traffic_secret
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::builder().build()
    }
}

/// Builder for [`Config`].
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Defaults to client.
    pub fn connection_end(mut self, end: ConnectionEnd) -> Self {
        self.config.connection_end = end;
        self
    }

    /// Defaults to TLS 1.2.
    pub fn highest_protocol_version(mut self, version: ProtocolVersion) -> Self {
        self.config.highest_protocol_version = version;
        self
    }

    /// Defaults to TLS 1.2.
    pub fn default_selected_protocol_version(mut self, version: ProtocolVersion) -> Self {
        self.config.default_selected_protocol_version = version;
        self
    }

    pub fn client_supported_cipher_suites(mut self, suites: Vec<CipherSuite>) -> Self {
        self.config.client_supported_cipher_suites = suites;
        self
    }

    pub fn default_selected_cipher_suite(mut self, suite: CipherSuite) -> Self {
        self.config.default_selected_cipher_suite = suite;
        self
    }

    pub fn client_supported_compression_methods(mut self, methods: Vec<CompressionMethod>) -> Self {
        self.config.client_supported_compression_methods = methods;
        self
    }

    pub fn default_selected_compression_method(mut self, method: CompressionMethod) -> Self {
        self.config.default_selected_compression_method = method;
        self
    }

    /// Defaults to 32 zero bytes.
    pub fn default_client_random(mut self, random: Vec<u8>) -> Self {
        self.config.default_client_random = random;
        self
    }

    /// Defaults to 32 zero bytes.
    pub fn default_server_random(mut self, random: Vec<u8>) -> Self {
        self.config.default_server_random = random;
        self
    }

    pub fn default_client_session_id(mut self, id: Vec<u8>) -> Self {
        self.config.default_client_session_id = id;
        self
    }

    pub fn default_server_session_id(mut self, id: Vec<u8>) -> Self {
        self.config.default_server_session_id = id;
        self
    }

    pub fn default_dtls_cookie(mut self, cookie: Vec<u8>) -> Self {
        self.config.default_dtls_cookie = cookie;
        self
    }

    /// Defaults to rsa_pkcs1_sha256.
    pub fn signature_and_hash_algorithm(mut self, alg: SignatureAndHashAlgorithm) -> Self {
        self.config.signature_and_hash_algorithm = alg;
        self
    }

    pub fn private_key(mut self, key: Vec<u8>) -> Self {
        self.config.private_key = Some(key);
        self
    }

    /// Defaults to the RFC 5054 1024-bit group.
    pub fn srp_modulus(mut self, modulus: BigUint) -> Self {
        self.config.srp_modulus = modulus;
        self
    }

    /// Defaults to 2.
    pub fn srp_generator(mut self, generator: BigUint) -> Self {
        self.config.srp_generator = generator;
        self
    }

    pub fn srp_salt(mut self, salt: Vec<u8>) -> Self {
        self.config.srp_salt = salt;
        self
    }

    pub fn srp_server_private_key(mut self, key: BigUint) -> Self {
        self.config.srp_server_private_key = key;
        self
    }

    pub fn srp_identity(mut self, identity: Vec<u8>) -> Self {
        self.config.srp_identity = identity;
        self
    }

    pub fn srp_password(mut self, password: Vec<u8>) -> Self {
        self.config.srp_password = password;
        self
    }

    /// Defaults to 256.
    pub fn heartbeat_payload_length(mut self, len: usize) -> Self {
        self.config.heartbeat_payload_length = len;
        self
    }

    /// Defaults to 256.
    pub fn heartbeat_padding_length(mut self, len: usize) -> Self {
        self.config.heartbeat_padding_length = len;
        self
    }

    /// Defaults to 0.
    pub fn record_padding_length(mut self, len: usize) -> Self {
        self.config.record_padding_length = len;
        self
    }

    /// Defaults to 16384.
    pub fn max_record_length(mut self, len: usize) -> Self {
        self.config.max_record_length = len;
        self
    }

    /// Defaults to 1400.
    pub fn dtls_max_fragment_length(mut self, len: usize) -> Self {
        self.config.dtls_max_fragment_length = len;
        self
    }

    pub fn client_extensions(mut self, extensions: Vec<u8>) -> Self {
        self.config.client_extensions = Some(extensions);
        self
    }

    pub fn server_extensions(mut self, extensions: Vec<u8>) -> Self {
        self.config.server_extensions = Some(extensions);
        self
    }

    /// Defaults to fatal handshake_failure.
    pub fn default_alert(mut self, level: AlertLevel, description: u8) -> Self {
        self.config.default_alert_level = level;
        self.config.default_alert_description = description;
        self
    }

    pub fn default_master_secret(mut self, secret: Vec<u8>) -> Self {
        self.config.default_master_secret = secret;
        self
    }

    pub fn default_client_handshake_traffic_secret(mut self, secret: Vec<u8>) -> Self {
        self.config.default_client_handshake_traffic_secret = secret;
        self
    }

    pub fn default_server_handshake_traffic_secret(mut self, secret: Vec<u8>) -> Self {
        self.config.default_server_handshake_traffic_secret = secret;
        self
    }

    /// Build the configuration.
    ///
    /// Values are taken as given. Nonsensical combinations are a legitimate
    /// test input.
    pub fn build(self) -> Config {
        self.config
    }
}
