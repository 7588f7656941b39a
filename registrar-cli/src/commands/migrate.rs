//! Schema migration command

use anyhow::{Context, Result};
use clap::Parser;

use registrar_server::db::{create_pool, migrations};
use registrar_server::DatabaseConfig;

/// Arguments for the migrate command
#[derive(Parser, Debug)]
pub struct MigrateArgs {
    /// Database URL (default: sqlite://registrar.db)
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,
}

/// Apply the schema to the configured database and exit
pub async fn run_migrate(args: MigrateArgs) -> Result<()> {
    let url = match args.database_url {
        Some(url) => url,
        None => DatabaseConfig::from_env().context("Invalid database configuration")?.url,
    };

    let pool = create_pool(&url)
        .await
        .with_context(|| format!("Failed to open database {url}"))?;
    migrations::run(&pool)
        .await
        .context("Failed to apply database schema")?;
    pool.close().await;

    tracing::info!(url = %url, "Schema applied");
    Ok(())
}
