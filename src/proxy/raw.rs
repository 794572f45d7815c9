use super::ProxyHandler;
use crate::Result;
use crate::routing::RoutingDescriptor;
use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tracing::debug;

/// Copies the source to the sink verbatim until the source ends
#[derive(Debug, Clone, Copy, Default)]
pub struct RawEcho;

#[async_trait]
impl ProxyHandler for RawEcho {
    async fn proxy(
        &self,
        sink: &mut (dyn AsyncWrite + Send + Unpin),
        source: &mut (dyn AsyncRead + Send + Unpin),
        descriptor: &RoutingDescriptor,
    ) -> Result<()> {
        let copied = tokio::io::copy(source, sink).await?;
        sink.flush().await?;
        debug!(%descriptor, size = copied, "Echoed raw stream");
        Ok(())
    }
}
