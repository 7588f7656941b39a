//! HTTP server command
//!
//! Flags override environment configuration, which overrides defaults.

use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;

use registrar_server::db::{create_pool_with_options, migrations};
use registrar_server::{run_server, DatabaseConfig, ServerConfig};

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind to (default: 127.0.0.1:3030)
    #[arg(long, short = 'b')]
    pub bind: Option<SocketAddr>,

    /// Allow permissive CORS (all origins) - use with caution
    #[arg(long)]
    pub cors_permissive: bool,

    /// Database URL (default: sqlite://registrar.db)
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Maximum pooled database connections
    #[arg(long)]
    pub max_connections: Option<u32>,
}

impl ServeArgs {
    fn resolve(self) -> Result<(ServerConfig, DatabaseConfig)> {
        let mut server = ServerConfig::from_env().context("Invalid server configuration")?;
        let mut database = DatabaseConfig::from_env().context("Invalid database configuration")?;

        if let Some(bind) = self.bind {
            server.bind_addr = bind;
        }
        server.cors_permissive |= self.cors_permissive;
        if let Some(url) = self.database_url {
            database.url = url;
        }
        if let Some(max) = self.max_connections {
            database.max_connections = max;
        }

        Ok((server, database))
    }
}

/// Run the HTTP server
pub async fn run_serve(args: ServeArgs) -> Result<()> {
    let (config, database) = args.resolve()?;

    tracing::info!("Starting registrar server on {}", config.bind_addr);

    let pool = create_pool_with_options(&database.url, database.max_connections)
        .await
        .with_context(|| format!("Failed to open database {}", database.url))?;

    migrations::run(&pool)
        .await
        .context("Failed to apply database schema")?;
    tracing::debug!(url = %database.url, "Schema ready");

    // Blocks until shutdown
    run_server(pool, config).await.context("Server error")?;

    Ok(())
}
