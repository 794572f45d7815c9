use super::{ALPN_H2, TlsConfig};
use crate::FixtureError;
use rustls::{CipherSuite, ClientConnection, Connection, ProtocolVersion, ServerConnection};
use std::io::{Read, Write};
use std::sync::Arc;

const CERT_PEM: &[u8] = include_bytes!("../../testdata/cert.pem");
const KEY_PEM: &[u8] = include_bytes!("../../testdata/key.pem");

/// Moves pending TLS records from `from` to `to`
fn transfer(from: &mut Connection, to: &mut Connection) {
    let mut records = Vec::new();
    while from.wants_write() {
        from.write_tls(&mut records).unwrap();
    }
    let mut pending = records.as_slice();
    while !pending.is_empty() {
        to.read_tls(&mut pending).unwrap();
        to.process_new_packets().unwrap();
    }
}

fn handshake(config: &TlsConfig) -> (Connection, Connection) {
    let mut client: Connection = ClientConnection::new(
        Arc::clone(&config.client),
        "localhost".try_into().unwrap(),
    )
    .unwrap()
    .into();
    let mut server: Connection = ServerConnection::new(Arc::clone(&config.server))
        .unwrap()
        .into();

    for _ in 0..10 {
        if !client.is_handshaking() && !server.is_handshaking() {
            break;
        }
        transfer(&mut client, &mut server);
        transfer(&mut server, &mut client);
    }
    assert!(!client.is_handshaking(), "client handshake did not finish");
    assert!(!server.is_handshaking(), "server handshake did not finish");

    (client, server)
}

#[test]
fn test_config_settings() {
    let config = TlsConfig::from_pem(CERT_PEM, KEY_PEM).unwrap();

    assert!(config.server.ignore_client_order);
    assert_eq!(config.server.send_tls13_tickets, 0);
    assert!(!config.server.ticketer.enabled());
    assert_eq!(config.server.alpn_protocols, vec![ALPN_H2.to_vec()]);
    assert_eq!(config.client.alpn_protocols, vec![ALPN_H2.to_vec()]);

    for provider in [config.server.crypto_provider(), config.client.crypto_provider()] {
        let suites: Vec<_> = provider.cipher_suites.iter().map(|s| s.suite()).collect();
        assert_eq!(suites, vec![CipherSuite::TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256]);
    }
}

#[test]
fn test_handshake_negotiates_h2_over_tls12() {
    let config = TlsConfig::from_pem(CERT_PEM, KEY_PEM).unwrap();
    let (client, server) = handshake(&config);

    for conn in [&client, &server] {
        assert_eq!(conn.alpn_protocol(), Some(ALPN_H2));
        assert_eq!(conn.protocol_version(), Some(ProtocolVersion::TLSv1_2));
        assert_eq!(
            conn.negotiated_cipher_suite().map(|s| s.suite()),
            Some(CipherSuite::TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256)
        );
    }

    // The server asked for, and got, the client's certificate without checking it
    assert!(server.peer_certificates().is_some_and(|certs| !certs.is_empty()));
}

#[test]
fn test_application_data_round_trip() {
    let config = TlsConfig::from_pem(CERT_PEM, KEY_PEM).unwrap();
    let (mut client, mut server) = handshake(&config);

    client.writer().write_all(b"PRI * HTTP/2.0").unwrap();
    transfer(&mut client, &mut server);

    let mut received = [0u8; 14];
    server.reader().read_exact(&mut received).unwrap();
    assert_eq!(&received, b"PRI * HTTP/2.0");
}

#[test]
fn test_from_pem_files() {
    let root = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("testdata");
    let config = TlsConfig::from_pem_files(root.join("cert.pem"), root.join("key.pem"));
    assert!(config.is_ok());
}

#[test]
fn test_missing_key_is_config_error() {
    let result = TlsConfig::from_pem(CERT_PEM, b"");
    assert!(matches!(result, Err(FixtureError::Config(_))));
}

#[test]
fn test_empty_chain_is_config_error() {
    let result = TlsConfig::from_pem(b"", KEY_PEM);
    assert!(matches!(result, Err(FixtureError::Config(_))));
}
