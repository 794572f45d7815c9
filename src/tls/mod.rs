//! Matched TLS configurations for test clients and servers
//!
//! WARNING: both sides skip certificate verification. These configurations
//! exist so harness endpoints can talk HTTP/2-over-TLS to each other and
//! must never be used outside tests.

mod verifier;

#[cfg(test)]
mod tests;

use crate::{FixtureError, Result};
use rustls::crypto::{CryptoProvider, ring};
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::server::NoServerSessionStorage;
use rustls::{ClientConfig, ServerConfig};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;
use verifier::{AcceptAnyClientCert, SkipServerVerification};

/// ALPN identifier advertised by both sides
pub const ALPN_H2: &[u8] = b"h2";

/// Protocol versions offered; the single cipher suite is TLS 1.2 only
pub static PROTOCOL_VERSIONS: &[&rustls::SupportedProtocolVersion] = &[&rustls::version::TLS12];

/// Server and client configuration sharing one certificate
///
/// The server requests a client certificate without verifying it and never
/// issues session tickets; the client presents the same certificate, accepts
/// any server certificate and never resumes sessions. Both negotiate only
/// TLS 1.2 with `TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256`, the server's
/// cipher order wins, and `h2` is the only ALPN protocol.
#[derive(Debug, Clone)]
pub struct TlsConfig {
    pub server: Arc<ServerConfig>,
    pub client: Arc<ClientConfig>,
}

impl TlsConfig {
    /// Builds both configurations from a certificate chain and its key
    pub fn new(certs: Vec<CertificateDer<'static>>, key: PrivateKeyDer<'static>) -> Result<Self> {
        if certs.is_empty() {
            return Err(FixtureError::Config("empty certificate chain".to_string()));
        }

        let provider = Arc::new(provider());
        let schemes = provider.signature_verification_algorithms.supported_schemes();

        let mut server = ServerConfig::builder_with_provider(provider.clone())
            .with_protocol_versions(PROTOCOL_VERSIONS)?
            .with_client_cert_verifier(Arc::new(AcceptAnyClientCert::new(schemes.clone())))
            .with_single_cert(certs.clone(), key.clone_key())?;
        server.ignore_client_order = true;
        server.send_tls13_tickets = 0;
        server.session_storage = Arc::new(NoServerSessionStorage {});
        server.alpn_protocols = vec![ALPN_H2.to_vec()];

        let mut client = ClientConfig::builder_with_provider(provider)
            .with_protocol_versions(PROTOCOL_VERSIONS)?
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(SkipServerVerification::new(schemes)))
            .with_client_auth_cert(certs, key)?;
        client.resumption = rustls::client::Resumption::disabled();
        client.alpn_protocols = vec![ALPN_H2.to_vec()];

        debug!(alpn = ?server.alpn_protocols, "Test TLS configuration built");

        Ok(Self {
            server: Arc::new(server),
            client: Arc::new(client),
        })
    }

    /// Builds both configurations from PEM-encoded certificate chain and key
    pub fn from_pem(cert_pem: &[u8], key_pem: &[u8]) -> Result<Self> {
        let certs = rustls_pemfile::certs(&mut &cert_pem[..]).collect::<std::io::Result<Vec<_>>>()?;
        let key = rustls_pemfile::private_key(&mut &key_pem[..])?
            .ok_or_else(|| FixtureError::Config("no private key found in PEM input".to_string()))?;
        Self::new(certs, key)
    }

    pub fn from_pem_files(cert_path: impl AsRef<Path>, key_path: impl AsRef<Path>) -> Result<Self> {
        let read = |path: &Path| {
            std::fs::read(path).map_err(|source| FixtureError::File {
                path: path.to_path_buf(),
                source,
            })
        };
        Self::from_pem(&read(cert_path.as_ref())?, &read(key_path.as_ref())?)
    }
}

/// The ring provider restricted to a single cipher suite
fn provider() -> CryptoProvider {
    let mut provider = ring::default_provider();
    provider.cipher_suites = vec![ring::cipher_suite::TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256];
    provider
}
