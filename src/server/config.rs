use crate::routing::Protocol;
use std::net::SocketAddr;
use std::time::Duration;

/// Configuration for the harness TCP server
///
/// # Examples
///
/// ```
/// use tunfixture::{Protocol, ServerConfig};
/// use std::time::Duration;
///
/// let config = ServerConfig {
///     bind_addr: "127.0.0.1:8080".parse().unwrap(),
///     max_connections: 100,
///     read_timeout: Duration::from_secs(30),
///     handler_timeout: Duration::from_secs(30),
///     protocol: Protocol::Http,
/// };
/// ```
///
/// Using the default configuration:
///
/// ```
/// use tunfixture::{Protocol, ServerConfig};
///
/// let config = ServerConfig::default();
/// assert_eq!(config.protocol, Protocol::Http);
/// ```
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Maximum number of concurrent connections
    pub max_connections: usize,
    /// Time allowed to receive an HTTP request head
    pub read_timeout: Duration,
    /// Time allowed for the handler to finish one connection
    pub handler_timeout: Duration,
    /// Protocol tag put on every accepted connection
    pub protocol: Protocol,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            max_connections: 100,
            read_timeout: Duration::from_secs(30),
            handler_timeout: Duration::from_secs(30),
            protocol: Protocol::Http,
        }
    }
}
