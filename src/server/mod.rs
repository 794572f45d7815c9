//! TCP server driving a [`ProxyHandler`](crate::ProxyHandler) per connection
//!
//! Stands in for the tunnel transport: every accepted connection is tagged
//! with the configured protocol and, for HTTP, the request target of its
//! first request.

pub mod config;
pub mod server;

pub use config::ServerConfig;
pub use server::HarnessServer;
