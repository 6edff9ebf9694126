//! Brand registry command handlers.

use std::path::Path;
use std::sync::Arc;

use clap::Subcommand;
use revdoc_core::{load_brand_seeds, AppConfig, BrandSeedFile};
use revdoc_ingest::{BrandCache, BrandIdentityResolver};
use revdoc_store::registry::{load_registry, RegistryRecord};
use revdoc_store::TabularStore;

/// Sub-commands available under `brands`.
#[derive(Debug, Subcommand)]
pub enum BrandsCommands {
    /// List canonical brands and their aliases
    List,
    /// Register manual alias mappings for brands whose prefixes differ
    Seed {
        /// YAML seed file; defaults to REVDOC_BRAND_SEEDS_PATH, then the built-in set
        #[arg(long)]
        file: Option<std::path::PathBuf>,
    },
}

pub(crate) fn format_registry(records: &[RegistryRecord]) -> Vec<String> {
    let mut lines = vec![format!(
        "{:<24}{:<24}{:<12}ALIASES",
        "KEY", "STANDARD NAME", "FIRST SEEN"
    )];
    for record in records {
        lines.push(format!(
            "{:<24}{:<24}{:<12}{}",
            record.normalized_key,
            record.standard_name,
            record.first_seen,
            record.aliases.join(", ")
        ));
    }
    lines
}

/// Print the brand registry.
///
/// # Errors
///
/// Returns an error if the registry cannot be read.
pub(crate) async fn run_brands_list(config: &AppConfig, store: &dyn TabularStore) -> anyhow::Result<()> {
    let records = load_registry(store, &config.registry_table).await?;
    if records.is_empty() {
        println!("no brands registered; run `brands seed` or `ingest` first");
        return Ok(());
    }
    for line in format_registry(&records) {
        println!("{line}");
    }
    println!("{} brands", records.len());
    Ok(())
}

/// Register seed mappings that are not yet in the registry.
///
/// # Errors
///
/// Returns an error if the seed file is invalid or the registry cannot be written.
pub(crate) async fn run_brands_seed(
    config: &AppConfig,
    store: Arc<dyn TabularStore>,
    file: Option<&Path>,
) -> anyhow::Result<()> {
    let seeds = match file.or(config.brand_seeds_path.as_deref()) {
        Some(path) => load_brand_seeds(path)?,
        None => BrandSeedFile::builtin(),
    };

    let resolver = BrandIdentityResolver::new(
        store,
        config.registry_table.clone(),
        Arc::new(BrandCache::new()),
    );
    let added = resolver.seed(&seeds.brands).await?;
    println!(
        "registered {added} of {} seed mappings",
        seeds.brands.len()
    );
    Ok(())
}
