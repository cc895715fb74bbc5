//! Seeds the products table from the legacy JSON export.
//!
//! ```bash
//! seed --file clustered-population.json
//! seed --file clustered-population.json --dry-run
//! ```

use std::path::PathBuf;

use clap::Parser;
use storefront_backend::{
    database::{
        pool::{create_pool, run_migrations},
        PgProductStore,
    },
    services::seed,
};

#[derive(Parser)]
#[command(name = "seed")]
#[command(author, version, about = "Import legacy products into the storefront database")]
struct Cli {
    /// Path to the legacy product export
    #[arg(short, long, default_value = "clustered-population.json")]
    file: PathBuf,

    /// Postgres URL; falls back to DATABASE_URL
    #[arg(long)]
    database_url: Option<String>,

    /// Validate and convert the file without writing anything
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();
    dotenvy::dotenv().ok();

    if let Err(e) = run(Cli::parse()).await {
        tracing::error!("Seeding failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let raw = tokio::fs::read_to_string(&cli.file).await?;

    if cli.dry_run {
        let entries: Vec<seed::LegacyProduct> = serde_json::from_str(&raw)?;
        let products = seed::convert(entries, chrono::Utc::now())?;
        tracing::info!(count = products.len(), "Dry run: every entry converts cleanly");
        return Ok(());
    }

    let database_url = match cli.database_url {
        Some(url) => url,
        None => std::env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL is not set and --database-url was not given"))?,
    };
    let pool = create_pool(&database_url).await?;
    run_migrations(&pool).await?;

    let store = PgProductStore::new(pool);
    let inserted = seed::seed(&store, &raw).await?;
    tracing::info!(inserted, file = %cli.file.display(), "Seed complete");
    Ok(())
}
