//! roomrelay server binary.
//!
//! # Usage
//!
//! ```bash
//! # Listen on every interface, port 7777
//! roomrelay 7777 my-connection-key
//!
//! # Loopback only, verbose
//! roomrelay 7777 my-connection-key --host 127.0.0.1 --log-level debug
//! ```

use clap::Parser;
use roomrelay::RelayServer;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Host/guest session relay server
#[derive(Parser)]
#[command(name = "roomrelay")]
#[command(about = "Relays packets between a room's host and its guests")]
#[command(version)]
struct Args {
    /// Port to listen on
    port: u16,

    /// Key clients must present to be admitted
    connection_key: String,

    /// Address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    let bind = format!("{}:{}", args.host, args.port);
    tracing::info!(%bind, "roomrelay starting");

    let server = RelayServer::builder()
        .bind(&bind)
        .connection_key(args.connection_key)
        .build()
        .await?;

    tracing::info!(addr = %server.local_addr(), "listening");

    server
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "cannot listen for ctrl-c, running until killed");
                std::future::pending::<()>().await;
            }
        })
        .await?;

    Ok(())
}
