//! Proxy handlers: the single call surface a tunnel transport drives
//!
//! A handler receives the inbound stream (`source`), an output `sink` and
//! the [`RoutingDescriptor`] of the request. It owns neither stream; the
//! caller closes both.

pub mod dispatcher;
pub mod http_echo;
pub mod raw;

#[cfg(test)]
mod tests;

use crate::Result;
use crate::routing::RoutingDescriptor;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};

pub use dispatcher::Dispatcher;
pub use http_echo::HttpEcho;
pub use raw::RawEcho;

/// A handler turning an inbound stream into an outbound response
#[async_trait]
pub trait ProxyHandler: Send + Sync {
    /// Handles one tunneled stream
    async fn proxy(
        &self,
        sink: &mut (dyn AsyncWrite + Send + Unpin),
        source: &mut (dyn AsyncRead + Send + Unpin),
        descriptor: &RoutingDescriptor,
    ) -> Result<()>;
}

#[async_trait]
impl<H: ProxyHandler + ?Sized> ProxyHandler for Arc<H> {
    async fn proxy(
        &self,
        sink: &mut (dyn AsyncWrite + Send + Unpin),
        source: &mut (dyn AsyncRead + Send + Unpin),
        descriptor: &RoutingDescriptor,
    ) -> Result<()> {
        (**self).proxy(sink, source, descriptor).await
    }
}
