//! `unireg serve` - run the HTTP API

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use unireg_server::{run_server, ConnectionManager, PgConnector, ServerConfig};

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Postgres connection string
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,

    /// Interface to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,

    #[arg(long, short = 'p', env = "PORT", default_value_t = 4000)]
    pub port: u16,

    /// Only origin allowed by CORS; any origin when unset
    #[arg(long, env = "FRONTEND_URL")]
    pub frontend_url: Option<String>,

    /// Try the database once at startup instead of on the first request
    #[arg(long)]
    pub eager_connect: bool,
}

/// Run the HTTP server
pub async fn run_serve(args: ServeArgs) -> Result<()> {
    let config = ServerConfig {
        bind_addr: SocketAddr::new(args.host, args.port),
        database_url: args.database_url,
        frontend_url: args.frontend_url.filter(|url| !url.trim().is_empty()),
        ..ServerConfig::from_env()
    };

    let connector = PgConnector::new(config.database_url.clone())
        .max_connections(config.max_connections)
        .acquire_timeout(config.retry.connect_timeout);
    let connections = Arc::new(
        ConnectionManager::new(connector, config.retry).with_caller_wait(config.connect_wait()),
    );

    if args.eager_connect {
        // Startup never fails on the database; reads fall back until it is up
        let state = connections.ensure_connected().await;
        tracing::info!(%state, "Eager database connect finished");
    }

    tracing::info!("Starting unireg server on {}", config.bind_addr);

    run_server(connections, config)
        .await
        .context("Server error")?;

    Ok(())
}
