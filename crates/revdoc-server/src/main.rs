mod scheduler;

use std::sync::Arc;

use revdoc_core::{load_brand_seeds, AppConfig, BrandSeedFile};
use revdoc_ingest::{
    BrandCache, BrandIdentityResolver, EnrichmentBatch, EnrichmentSettings, LexiconEnricher,
};
use revdoc_store::notifications::ensure_notification_section;
use revdoc_store::{FileStore, ReportSink, TabularStore};
use revdoc_weekly::{LogNotifier, WeeklyReportService, WeeklySettings};
use tracing_subscriber::EnvFilter;

use crate::scheduler::ScheduleCoordinator;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = revdoc_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::info!(env = %config.env, data_dir = %config.data_dir.display(), "revdoc-server starting");

    let store = Arc::new(FileStore::open(&config.data_dir).await?);
    let tabular: Arc<dyn TabularStore> = store.clone();
    let sink: Arc<dyn ReportSink> = store;

    ensure_notification_section(tabular.as_ref(), &config.registry_table).await?;
    let resolver = warm_brand_registry(&config, Arc::clone(&tabular)).await?;

    let batch = Arc::new(EnrichmentBatch::new(
        Arc::clone(&tabular),
        Arc::new(LexiconEnricher),
        EnrichmentSettings {
            raw_table_prefix: config.raw_table_prefix.clone(),
            batch_size: config.enrich_batch_size,
            max_attempts: config.enrich_max_attempts,
        },
    ));
    let coordinator = Arc::new(ScheduleCoordinator::new(WeeklyReportService::new(
        tabular,
        sink,
        Arc::new(LogNotifier),
        WeeklySettings {
            raw_table_prefix: config.raw_table_prefix.clone(),
            registry_table: config.registry_table.clone(),
            report_folder: config.report_folder.clone(),
            store_max_retries: config.store_max_retries,
            store_retry_backoff_ms: config.store_retry_backoff_ms,
        },
    )));

    let mut scheduler =
        scheduler::build_scheduler(&config, Arc::clone(&coordinator), batch).await?;

    shutdown_signal().await;

    coordinator.shutdown();
    scheduler.shutdown().await?;
    resolver.flush_alias_writes().await;
    tracing::info!("revdoc-server stopped");
    Ok(())
}

/// Load the brand registry into memory and register manual alias seeds.
async fn warm_brand_registry(
    config: &AppConfig,
    store: Arc<dyn TabularStore>,
) -> anyhow::Result<BrandIdentityResolver> {
    let seeds = match &config.brand_seeds_path {
        Some(path) => load_brand_seeds(path)?,
        None => BrandSeedFile::builtin(),
    };

    let resolver = BrandIdentityResolver::new(
        store,
        config.registry_table.clone(),
        Arc::new(BrandCache::new()),
    );
    let cached = resolver.load_cache(true).await;
    match resolver.seed(&seeds.brands).await {
        Ok(added) => tracing::info!(cached, added, "brand registry ready"),
        Err(e) => tracing::warn!(cached, error = %e, "brand seed registration failed"),
    }
    Ok(resolver)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
