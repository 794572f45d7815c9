use super::ServerConfig;
use crate::http::read_request_target;
use crate::proxy::ProxyHandler;
use crate::routing::{Protocol, RoutingDescriptor};
use crate::{FixtureError, Result};
use bytes::Bytes;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio::{signal, time::timeout};
use tracing::{Instrument, error, info, warn};

/// TCP server handing each connection to a [`ProxyHandler`]
///
/// # Examples
///
/// ```no_run
/// use tunfixture::{Dispatcher, HarnessServer, ServerConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = ServerConfig {
///         bind_addr: "127.0.0.1:8080".parse()?,
///         ..Default::default()
///     };
///
///     let server = HarnessServer::new(config, Dispatcher::echo());
///     server.run().await?;
///     Ok(())
/// }
/// ```
pub struct HarnessServer {
    config: ServerConfig,
    handler: Arc<dyn ProxyHandler>,
    shutdown_signal: Arc<broadcast::Sender<()>>,
}

impl HarnessServer {
    pub fn new(config: ServerConfig, handler: impl ProxyHandler + 'static) -> Self {
        let (shutdown_signal, _) = broadcast::channel(1);
        Self {
            config,
            handler: Arc::new(handler),
            shutdown_signal: Arc::new(shutdown_signal),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Returns a shutdown signal sender that can be used to gracefully shutdown the server
    pub fn shutdown_signal(&self) -> broadcast::Sender<()> {
        self.shutdown_signal.as_ref().clone()
    }

    /// Binds the configured address without accepting connections yet
    pub async fn bind(&self) -> Result<TcpListener> {
        TcpListener::bind(self.config.bind_addr)
            .await
            .map_err(|e| FixtureError::Config(format!("Failed to bind {}: {e}", self.config.bind_addr)))
    }

    /// Binds the configured address and serves until shutdown
    pub async fn run(&self) -> Result<()> {
        let listener = self.bind().await?;
        self.serve(listener).await
    }

    /// Accepts connections from `listener` until shutdown
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        let local_addr = listener.local_addr()?;
        info!(address = %local_addr, protocol = %self.config.protocol, "Harness server listening");

        let connection_count = Arc::new(AtomicUsize::new(0));
        let mut shutdown_rx = self.shutdown_signal.subscribe();

        loop {
            tokio::select! {
                accept_result = listener.accept() => {
                    match accept_result {
                        Ok((stream, addr)) => {
                            let current_count = connection_count.load(Ordering::SeqCst);
                            if current_count >= self.config.max_connections {
                                warn!(%addr, current = current_count, limit = self.config.max_connections, "Connection rejected: limit reached");
                                continue;
                            }

                            let new_count = connection_count.fetch_add(1, Ordering::SeqCst) + 1;
                            info!(%addr, current = new_count, "Accepted connection");

                            let config = self.config.clone();
                            let handler = Arc::clone(&self.handler);
                            let connection_count = Arc::clone(&connection_count);
                            let span = tracing::info_span!("connection", %addr);
                            tokio::spawn(async move {
                                if let Err(e) = Self::handle_connection(stream, &config, handler.as_ref()).instrument(span).await {
                                    error!(%addr, error = %e, "Error handling connection");
                                }
                                let final_count = connection_count.fetch_sub(1, Ordering::SeqCst) - 1;
                                info!(%addr, current = final_count, "Connection closed");
                            });
                        }
                        Err(e) => {
                            error!(error = %e, "Failed to accept connection");
                        }
                    }
                }
                _ = signal::ctrl_c() => {
                    info!("Received shutdown signal, stopping server");
                    break;
                }
                _ = shutdown_rx.recv() => {
                    info!("Received internal shutdown signal, stopping server");
                    break;
                }
            }
        }

        info!("Harness server stopped");
        Ok(())
    }

    /// Builds the routing descriptor for one connection and runs the handler
    async fn handle_connection(
        stream: TcpStream,
        config: &ServerConfig,
        handler: &dyn ProxyHandler,
    ) -> Result<()> {
        let (mut read_half, mut write_half) = stream.into_split();

        let (descriptor, replay) = match &config.protocol {
            Protocol::Http => {
                let (target, head) = timeout(config.read_timeout, read_request_target(&mut read_half))
                    .await
                    .map_err(|_| FixtureError::Timeout("Timed out reading request head".to_string()))??;
                (RoutingDescriptor::http(request_path(&target)), head)
            }
            protocol => (RoutingDescriptor::new(protocol.clone(), ""), Bytes::new()),
        };

        let mut source = (&replay[..]).chain(read_half);
        timeout(
            config.handler_timeout,
            handler.proxy(&mut write_half, &mut source, &descriptor),
        )
        .await
        .map_err(|_| FixtureError::Timeout(format!("Handler timed out for {descriptor}")))??;

        write_half.shutdown().await?;
        Ok(())
    }
}

/// Path component of a request target, without query or fragment
fn request_path(target: &str) -> &str {
    target.split(['?', '#']).next().unwrap_or(target)
}
