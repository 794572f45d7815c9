use super::{Dispatcher, HttpEcho, ProxyHandler, RawEcho};
use crate::routing::{Protocol, RoutingDescriptor};
use crate::{FixtureError, Result};
use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

/// Writes a fixed marker so tests can tell which handler ran
struct Marker(&'static [u8]);

#[async_trait]
impl ProxyHandler for Marker {
    async fn proxy(
        &self,
        sink: &mut (dyn AsyncWrite + Send + Unpin),
        _source: &mut (dyn AsyncRead + Send + Unpin),
        _descriptor: &RoutingDescriptor,
    ) -> Result<()> {
        sink.write_all(self.0).await?;
        Ok(())
    }
}

async fn run(handler: &dyn ProxyHandler, input: &[u8], descriptor: RoutingDescriptor) -> Result<Vec<u8>> {
    let mut source = input;
    let mut sink = Vec::new();
    handler.proxy(&mut sink, &mut source, &descriptor).await?;
    Ok(sink)
}

#[tokio::test]
async fn test_raw_echo_copies_bytes() {
    let input: Vec<u8> = (0..=255u8).cycle().take(10_000).collect();
    let output = run(&RawEcho, &input, RoutingDescriptor::raw()).await.unwrap();
    assert_eq!(output, input);
}

#[tokio::test]
async fn test_raw_echo_ignores_url_path() {
    let output = run(&RawEcho, b"payload", RoutingDescriptor::new(Protocol::Raw, "/ignored"))
        .await
        .unwrap();
    assert_eq!(output, b"payload");
}

#[tokio::test]
async fn test_http_echo_mirrors_body() {
    let request = b"POST /echo HTTP/1.1\r\nHost: localhost\r\nContent-Length: 11\r\n\r\nhello world";
    let output = run(&HttpEcho, request, RoutingDescriptor::http("/echo")).await.unwrap();

    assert_eq!(
        output,
        b"HTTP/1.0 200 OK\r\nContent-Length: 11\r\n\r\nhello world"
    );
}

#[tokio::test]
async fn test_http_echo_without_body() {
    let request = b"GET /echo HTTP/1.1\r\nHost: localhost\r\n\r\n";
    let output = run(&HttpEcho, request, RoutingDescriptor::http("/echo")).await.unwrap();

    assert_eq!(output, b"HTTP/1.0 200 OK\r\n\r\n");
}

#[tokio::test]
async fn test_http_echo_with_empty_body() {
    let request = b"POST /echo HTTP/1.1\r\nContent-Length: 0\r\n\r\n";
    let output = run(&HttpEcho, request, RoutingDescriptor::http("/echo")).await.unwrap();

    assert_eq!(output, b"HTTP/1.0 200 OK\r\nContent-Length: 0\r\n\r\n");
}

#[tokio::test]
async fn test_http_echo_chunked_body() {
    let request = b"POST / HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n3\r\nabc\r\n0\r\n\r\n";
    let output = run(&HttpEcho, request, RoutingDescriptor::http("/")).await.unwrap();

    assert_eq!(output, b"HTTP/1.0 200 OK\r\nContent-Length: 3\r\n\r\nabc");
}

#[tokio::test]
async fn test_http_echo_malformed_request_is_error() {
    let result = run(&HttpEcho, b"\x00\x01garbage\r\n\r\n", RoutingDescriptor::http("/")).await;
    assert!(matches!(result, Err(FixtureError::Parse(_))));
}

#[tokio::test]
async fn test_http_echo_truncated_request_writes_nothing() {
    let mut source: &[u8] = b"POST / HTTP/1.1\r\nContent-Length: 5\r\n\r\nab";
    let mut sink = Vec::new();
    let result = HttpEcho
        .proxy(&mut sink, &mut source, &RoutingDescriptor::http("/"))
        .await;

    assert!(matches!(result, Err(FixtureError::IncompleteRequest)));
    assert!(sink.is_empty());
}

#[tokio::test]
async fn test_http_echo_huge_content_length_is_error() {
    for length in ["18446744073709551615", "1000000000000"] {
        let request = format!("POST / HTTP/1.1\r\nContent-Length: {length}\r\n\r\nab");
        let result = run(&HttpEcho, request.as_bytes(), RoutingDescriptor::http("/")).await;
        assert!(
            matches!(result, Err(FixtureError::Parse(_) | FixtureError::IncompleteRequest)),
            "unexpected result for Content-Length {length}: {result:?}"
        );
    }
}

#[tokio::test]
async fn test_dispatcher_routes_http() {
    let request = b"POST / HTTP/1.1\r\nContent-Length: 2\r\n\r\nhi";
    let output = run(&Dispatcher::echo(), request, RoutingDescriptor::http("/"))
        .await
        .unwrap();

    assert_eq!(output, b"HTTP/1.0 200 OK\r\nContent-Length: 2\r\n\r\nhi");
}

#[tokio::test]
async fn test_dispatcher_falls_back_to_raw() {
    let request = b"POST / HTTP/1.1\r\nContent-Length: 2\r\n\r\nhi";

    for protocol in [Protocol::Raw, Protocol::from("ws"), Protocol::Other(String::new())] {
        let output = run(&Dispatcher::echo(), request, RoutingDescriptor::new(protocol, "/"))
            .await
            .unwrap();
        assert_eq!(output, request);
    }
}

#[tokio::test]
async fn test_dispatcher_custom_registration() {
    let dispatcher = Dispatcher::new(Marker(b"fallback"))
        .register(Protocol::Http, Marker(b"http"))
        .register(Protocol::from("gopher"), Marker(b"gopher"));

    assert_eq!(run(&dispatcher, b"", RoutingDescriptor::http("/")).await.unwrap(), b"http");
    assert_eq!(
        run(&dispatcher, b"", RoutingDescriptor::new("gopher", "")).await.unwrap(),
        b"gopher"
    );
    assert_eq!(run(&dispatcher, b"", RoutingDescriptor::raw()).await.unwrap(), b"fallback");
}

#[tokio::test]
async fn test_dispatcher_register_replaces_handler() {
    let dispatcher = Dispatcher::echo().register(Protocol::Http, Marker(b"replaced"));
    let output = run(&dispatcher, b"GET / HTTP/1.1\r\n\r\n", RoutingDescriptor::http("/"))
        .await
        .unwrap();
    assert_eq!(output, b"replaced");
}

#[tokio::test]
async fn test_dispatcher_does_not_close_sink() {
    let (mut client, mut server) = tokio::io::duplex(64);
    let mut source: &[u8] = b"ping";

    Dispatcher::echo()
        .proxy(&mut server, &mut source, &RoutingDescriptor::raw())
        .await
        .unwrap();

    // Still writable after the handler returned
    server.write_all(b"!").await.unwrap();
    drop(server);

    let mut received = Vec::new();
    tokio::io::AsyncReadExt::read_to_end(&mut client, &mut received)
        .await
        .unwrap();
    assert_eq!(received, b"ping!");
}
