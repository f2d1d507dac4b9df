use num_bigint::BigUint;

use crate::types::{
    CipherSuite, CompressionMethod, ConnectionEnd, ProtocolVersion, SignatureAndHashAlgorithm,
};
use crate::{Config, TlsContext};

/// Negotiated value if there is one, else the config default.
///
/// A `Chooser` is a borrowed view; it is rebuilt for every preparation step
/// and owns nothing.
#[derive(Clone, Copy)]
pub struct Chooser<'a> {
    config: &'a Config,
    context: &'a TlsContext,
}

impl<'a> Chooser<'a> {
    pub fn new(config: &'a Config, context: &'a TlsContext) -> Self {
        Chooser { config, context }
    }

    pub fn config(&self) -> &'a Config {
        self.config
    }

    pub fn context(&self) -> &'a TlsContext {
        self.context
    }

    pub fn connection_end(&self) -> ConnectionEnd {
        self.config.connection_end()
    }

    pub fn protocol_version(&self) -> ProtocolVersion {
        self.context
            .selected_protocol_version()
            .unwrap_or_else(|| self.config.default_selected_protocol_version())
    }

    pub fn highest_client_protocol_version(&self) -> ProtocolVersion {
        self.context
            .highest_client_protocol_version()
            .unwrap_or_else(|| self.config.highest_protocol_version())
    }

    pub fn cipher_suite(&self) -> CipherSuite {
        self.context
            .selected_cipher_suite()
            .unwrap_or_else(|| self.config.default_selected_cipher_suite())
    }

    pub fn compression_method(&self) -> CompressionMethod {
        self.context
            .selected_compression_method()
            .unwrap_or_else(|| self.config.default_selected_compression_method())
    }

    pub fn signature_and_hash_algorithm(&self) -> SignatureAndHashAlgorithm {
        self.context
            .selected_signature_and_hash_algorithm()
            .unwrap_or_else(|| self.config.signature_and_hash_algorithm())
    }

    pub fn client_random(&self) -> &'a [u8] {
        self.context
            .client_random()
            .unwrap_or_else(|| self.config.default_client_random())
    }

    pub fn server_random(&self) -> &'a [u8] {
        self.context
            .server_random()
            .unwrap_or_else(|| self.config.default_server_random())
    }

    pub fn client_session_id(&self) -> &'a [u8] {
        self.context
            .client_session_id()
            .unwrap_or_else(|| self.config.default_client_session_id())
    }

    pub fn server_session_id(&self) -> &'a [u8] {
        self.context
            .server_session_id()
            .unwrap_or_else(|| self.config.default_server_session_id())
    }

    pub fn dtls_cookie(&self) -> &'a [u8] {
        self.context
            .dtls_cookie()
            .unwrap_or_else(|| self.config.default_dtls_cookie())
    }

    pub fn master_secret(&self) -> &'a [u8] {
        self.context
            .master_secret()
            .unwrap_or_else(|| self.config.default_master_secret())
    }

    pub fn client_handshake_traffic_secret(&self) -> &'a [u8] {
        self.context
            .client_handshake_traffic_secret()
            .unwrap_or_else(|| self.config.default_client_handshake_traffic_secret())
    }

    pub fn server_handshake_traffic_secret(&self) -> &'a [u8] {
        self.context
            .server_handshake_traffic_secret()
            .unwrap_or_else(|| self.config.default_server_handshake_traffic_secret())
    }

    pub fn private_key(&self) -> Option<&'a [u8]> {
        self.config.private_key()
    }

    pub fn srp_modulus(&self) -> &'a BigUint {
        self.config.srp_modulus()
    }

    pub fn srp_generator(&self) -> &'a BigUint {
        self.config.srp_generator()
    }

    pub fn srp_salt(&self) -> &'a [u8] {
        self.config.srp_salt()
    }

    pub fn srp_server_private_key(&self) -> &'a BigUint {
        self.config.srp_server_private_key()
    }

    pub fn srp_identity(&self) -> &'a [u8] {
        self.config.srp_identity()
    }

    pub fn srp_password(&self) -> &'a [u8] {
        self.config.srp_password()
    }

    pub fn transcript(&self) -> &'a [u8] {
        self.context.transcript()
    }
}
