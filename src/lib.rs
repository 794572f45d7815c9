use std::path::PathBuf;
use thiserror::Error;

/// Error types for the tunfixture library
#[derive(Error, Debug)]
pub enum FixtureError {
    /// A directory could not be resolved to an absolute path
    #[error("failed to resolve directory {path:?}: {source}")]
    Path {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Stream read/write errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A fixture file could not be opened or read
    #[error("failed to read file {path:?}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Directory walk errors
    #[error("failed to walk directory: {0}")]
    Walk(#[from] walkdir::Error),

    /// Malformed HTTP request
    #[error("HTTP parsing error: {0}")]
    Parse(String),

    /// The stream ended before a full HTTP request was read
    #[error("Incomplete request")]
    IncompleteRequest,

    /// A response declared a content length that does not match its body
    #[error("content length {declared} does not match body length {actual}")]
    ContentLengthMismatch { declared: u64, actual: u64 },

    /// Timeout errors
    #[error("Timeout error: {0}")]
    Timeout(String),

    /// TLS configuration errors
    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<httparse::Error> for FixtureError {
    fn from(err: httparse::Error) -> Self {
        FixtureError::Parse(err.to_string())
    }
}

/// Result type for the tunfixture library
pub type Result<T> = std::result::Result<T, FixtureError>;

pub mod http;
pub mod library;
pub mod logging;
pub mod proxy;
pub mod routing;
pub mod server;
pub mod tls;

// Re-export main types for convenience
pub use http::{Body, ResponseDescriptor, content_type_for};
pub use library::{FileServer, ResponseLibrary, file_to_response};
pub use logging::LogConfig;
pub use proxy::{Dispatcher, HttpEcho, ProxyHandler, RawEcho};
pub use routing::{Protocol, RoutingDescriptor};
pub use server::{HarnessServer, ServerConfig};
pub use tls::TlsConfig;
