//! `unireg seed` - load the sample catalog

use anyhow::{Context, Result};
use clap::Parser;

use unireg_server::catalog::sample_universities;
use unireg_server::{Connector, PgConnector};

#[derive(Parser, Debug)]
pub struct SeedArgs {
    /// Postgres connection string
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,
}

/// Replace all universities with the sample catalog and print the new ids.
pub async fn run_seed(args: SeedArgs) -> Result<()> {
    let store = PgConnector::new(args.database_url)
        .connect()
        .await
        .context("Failed to connect to database")?;

    let profiles = sample_universities();
    let inserted = store
        .replace_universities(&profiles)
        .await
        .context("Failed to seed universities")?;

    tracing::info!(count = inserted.len(), "Seeded universities");
    for university in &inserted {
        println!("{}: {}", university.profile.short_name, university.id);
    }

    store.close().await;
    Ok(())
}
