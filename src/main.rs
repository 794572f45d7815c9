use color_eyre::eyre::{Result, WrapErr};
use std::net::SocketAddr;
use tunfixture::{Dispatcher, HarnessServer, LogConfig, Protocol, ResponseLibrary, ServerConfig};

use tracing::info;

const DEFAULT_PORT: u16 = 8080;

fn bind_addr(port: Option<&String>) -> SocketAddr {
    let port = port
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(DEFAULT_PORT);
    SocketAddr::from(([127, 0, 0, 1], port))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    LogConfig::from_env()
        .init()
        .wrap_err("Failed to initialize logging")?;

    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(|s| s.to_lowercase()).unwrap_or_else(|| "echo".to_string());

    match command.as_str() {
        "echo" => {
            let protocol: Protocol = args
                .get(3)
                .map(|p| Protocol::from(p.as_str()))
                .unwrap_or(Protocol::Http);
            let config = ServerConfig {
                bind_addr: bind_addr(args.get(2)),
                protocol,
                ..Default::default()
            };

            info!(address = %config.bind_addr, protocol = %config.protocol, "Starting echo server");

            let server = HarnessServer::new(config, Dispatcher::echo());
            server.run().await.wrap_err("Failed to run echo server")?;
        }
        "serve" => {
            let Some(dir) = args.get(2).cloned() else {
                usage(&args[0]);
            };
            let config = ServerConfig {
                bind_addr: bind_addr(args.get(3)),
                protocol: Protocol::Http,
                ..Default::default()
            };

            let library = tokio::task::spawn_blocking({
                let dir = dir.clone();
                move || ResponseLibrary::build(dir)
            })
            .await?
            .wrap_err_with(|| format!("Failed to load directory {dir}"))?;

            info!(address = %config.bind_addr, root = %library.root().display(), resources = library.len(), "Starting file server");

            let server = HarnessServer::new(config, library.into_handler());
            server.run().await.wrap_err("Failed to run file server")?;
        }
        _ => usage(&args[0]),
    }

    Ok(())
}

fn usage(program: &str) -> ! {
    eprintln!("Usage: {program} echo [port] [http|raw]");
    eprintln!("       {program} serve <dir> [port]");
    eprintln!("  echo:  Echo HTTP request bodies, or raw bytes (default: http)");
    eprintln!("  serve: Serve every file under <dir> from memory");
    eprintln!("  port:  Port to bind to on 127.0.0.1 (default: {DEFAULT_PORT})");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  {program} echo 8080 raw         # Copy bytes back on port 8080");
    eprintln!("  {program} serve ./data 9000     # /data/foo/bar.zip serves ./data/foo/bar.zip");
    eprintln!();
    eprintln!("Set TUNFIXTURE_DEBUG=1 for debug logging.");
    std::process::exit(1);
}
