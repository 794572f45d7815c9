use super::ProxyHandler;
use crate::Result;
use crate::http::{ResponseDescriptor, read_request};
use crate::routing::RoutingDescriptor;
use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tracing::debug;

/// Answers a single HTTP request with `200 OK` carrying the request body
///
/// The response is HTTP/1.0 with no headers besides `Content-Length`. A
/// request without a body gets a response without a body, while an empty
/// body is echoed with `Content-Length: 0`. Malformed requests fail with
/// [`FixtureError::Parse`](crate::FixtureError::Parse) and nothing is written.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpEcho;

#[async_trait]
impl ProxyHandler for HttpEcho {
    async fn proxy(
        &self,
        sink: &mut (dyn AsyncWrite + Send + Unpin),
        source: &mut (dyn AsyncRead + Send + Unpin),
        descriptor: &RoutingDescriptor,
    ) -> Result<()> {
        let request = read_request(source).await?;
        debug!(
            %descriptor,
            method = %request.head.method,
            path = %request.head.path,
            body = ?request.body.as_ref().map(|b| b.len()),
            "Echoing HTTP request"
        );

        let response = match request.body {
            Some(body) => ResponseDescriptor::ok().body(body),
            None => ResponseDescriptor::ok(),
        };

        sink.write_all(&response.serialize()?).await?;
        sink.flush().await?;
        Ok(())
    }
}
