use super::{HttpEcho, ProxyHandler, RawEcho};
use crate::Result;
use crate::routing::{Protocol, RoutingDescriptor};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::trace;

/// Routes each stream to the handler registered for its protocol tag
///
/// Tags without a registered handler go to the fallback handler; an unknown
/// protocol is never an error.
///
/// # Examples
///
/// ```
/// use tunfixture::{Dispatcher, Protocol, ProxyHandler, RoutingDescriptor};
///
/// # tokio_test::block_on(async {
/// let dispatcher = Dispatcher::echo();
/// assert!(dispatcher.is_registered(&Protocol::Http));
///
/// let mut source: &[u8] = b"opaque bytes";
/// let mut sink = Vec::new();
/// dispatcher
///     .proxy(&mut sink, &mut source, &RoutingDescriptor::new("smtp", ""))
///     .await
///     .unwrap();
/// assert_eq!(sink, b"opaque bytes");
/// # });
/// ```
#[derive(Clone)]
pub struct Dispatcher {
    handlers: HashMap<Protocol, Arc<dyn ProxyHandler>>,
    fallback: Arc<dyn ProxyHandler>,
}

impl Dispatcher {
    /// Creates a dispatcher with no registered protocols
    pub fn new(fallback: impl ProxyHandler + 'static) -> Self {
        Self {
            handlers: HashMap::new(),
            fallback: Arc::new(fallback),
        }
    }

    /// The echo dispatcher: HTTP requests are answered by [`HttpEcho`],
    /// everything else is copied back by [`RawEcho`]
    pub fn echo() -> Self {
        Self::new(RawEcho).register(Protocol::Http, HttpEcho)
    }

    /// Registers `handler` for `protocol`, replacing any previous handler
    pub fn register(mut self, protocol: Protocol, handler: impl ProxyHandler + 'static) -> Self {
        self.handlers.insert(protocol, Arc::new(handler));
        self
    }

    pub fn is_registered(&self, protocol: &Protocol) -> bool {
        self.handlers.contains_key(protocol)
    }

    /// The handler a stream tagged with `protocol` is routed to
    pub fn handler_for(&self, protocol: &Protocol) -> &Arc<dyn ProxyHandler> {
        self.handlers.get(protocol).unwrap_or(&self.fallback)
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::echo()
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("protocols", &self.handlers.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ProxyHandler for Dispatcher {
    async fn proxy(
        &self,
        sink: &mut (dyn AsyncWrite + Send + Unpin),
        source: &mut (dyn AsyncRead + Send + Unpin),
        descriptor: &RoutingDescriptor,
    ) -> Result<()> {
        let registered = self.is_registered(&descriptor.protocol);
        trace!(%descriptor, registered, "Dispatching stream");
        self.handler_for(&descriptor.protocol)
            .proxy(sink, source, descriptor)
            .await
    }
}
