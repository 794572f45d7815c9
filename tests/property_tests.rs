use proptest::prelude::*;
use tunfixture::{Dispatcher, Protocol, ProxyHandler, RawEcho, RoutingDescriptor};

/// Runs `handler` over an in-memory source and returns what it wrote
fn run(handler: &dyn ProxyHandler, input: &[u8], descriptor: &RoutingDescriptor) -> tunfixture::Result<Vec<u8>> {
    tokio_test::block_on(async {
        let mut sink = Vec::new();
        let mut source = input;
        handler.proxy(&mut sink, &mut source, descriptor).await?;
        Ok(sink)
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property: raw echo returns exactly the bytes it read, whatever the descriptor says
    #[test]
    fn raw_echo_preserves_bytes(
        data in prop::collection::vec(any::<u8>(), 0..4096),
        url_path in "(/[a-z0-9._-]{0,12}){0,4}",
    ) {
        let descriptor = RoutingDescriptor::new(Protocol::Raw, url_path);
        let output = run(&RawEcho, &data, &descriptor)
            .map_err(|e| TestCaseError::fail(format!("raw echo failed: {e}")))?;
        prop_assert_eq!(output, data);
    }

    /// Property: the HTTP echo body equals the request body
    #[test]
    fn http_echo_returns_request_body(
        body in prop::collection::vec(any::<u8>(), 0..2048),
        path in "/[a-z0-9/]{0,16}",
    ) {
        let mut request = format!("POST {path} HTTP/1.1\r\nContent-Length: {}\r\n\r\n", body.len()).into_bytes();
        request.extend_from_slice(&body);

        let descriptor = RoutingDescriptor::http(path);
        let output = run(&Dispatcher::echo(), &request, &descriptor)
            .map_err(|e| TestCaseError::fail(format!("http echo failed: {e}")))?;

        let mut expected = format!("HTTP/1.0 200 OK\r\nContent-Length: {}\r\n\r\n", body.len()).into_bytes();
        expected.extend_from_slice(&body);
        prop_assert_eq!(output, expected);
    }

    /// Property: unregistered protocols fall back to byte copy
    #[test]
    fn unknown_protocols_fall_back_to_raw(
        name in "[a-z]{1,8}",
        data in prop::collection::vec(any::<u8>(), 0..512),
    ) {
        prop_assume!(name != "http" && name != "raw" && name != "tcp");

        let descriptor = RoutingDescriptor::new(name.as_str(), "/");
        let output = run(&Dispatcher::echo(), &data, &descriptor)
            .map_err(|e| TestCaseError::fail(format!("dispatch failed: {e}")))?;
        prop_assert_eq!(output, data);
    }
}
