mod brands;
mod ingest;
mod report;

use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use revdoc_store::{FileStore, TabularStore};
use tracing_subscriber::EnvFilter;

use crate::brands::BrandsCommands;

#[derive(Debug, Parser)]
#[command(name = "revdoc-cli")]
#[command(about = "Review ingestion, enrichment, and weekly brand reports")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Ingest inbound reviews from a JSON file (one object or an array)
    Ingest {
        /// Path to the JSON file
        #[arg(long)]
        file: PathBuf,
    },
    /// Run one enrichment batch over pending reviews
    Enrich,
    /// Build weekly brand reports
    Report {
        /// Only report on this brand
        #[arg(long)]
        brand: Option<String>,
        /// Any date inside the target week (YYYY-MM-DD); defaults to the last completed week
        #[arg(long)]
        week: Option<NaiveDate>,
    },
    /// Inspect and seed the brand registry
    Brands {
        #[command(subcommand)]
        command: BrandsCommands,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = revdoc_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let store = Arc::new(FileStore::open(&config.data_dir).await?);
    let tabular: Arc<dyn TabularStore> = store.clone();

    match cli.command {
        Commands::Ingest { file } => ingest::run_ingest(&config, tabular, &file).await?,
        Commands::Enrich => ingest::run_enrich(&config, tabular).await?,
        Commands::Report { brand, week } => {
            report::run_report(&config, tabular, store, brand, week).await?;
        }
        Commands::Brands { command } => match command {
            BrandsCommands::List => brands::run_brands_list(&config, tabular.as_ref()).await?,
            BrandsCommands::Seed { file } => {
                brands::run_brands_seed(&config, tabular, file.as_deref()).await?;
            }
        },
    }

    Ok(())
}
