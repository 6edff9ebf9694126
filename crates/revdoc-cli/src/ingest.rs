//! `ingest` and `enrich` command handlers.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use revdoc_core::{AppConfig, InboundReview};
use revdoc_ingest::{
    BrandCache, BrandIdentityResolver, EnrichmentBatch, EnrichmentSettings, LexiconEnricher,
    PipelineSettings, RecentIdCache, ReviewIngestionPipeline,
};
use revdoc_store::TabularStore;
use serde_json::Value;

/// Parse a JSON document holding one inbound review or an array of them.
pub(crate) fn parse_inbound(json: &str) -> anyhow::Result<Vec<InboundReview>> {
    match serde_json::from_str::<Value>(json)? {
        Value::Array(items) => items
            .into_iter()
            .map(|item| serde_json::from_value(item).map_err(anyhow::Error::from))
            .collect(),
        Value::Object(map) => Ok(vec![serde_json::from_value(Value::Object(map))?]),
        other => anyhow::bail!("expected a review object or an array of reviews, got {other}"),
    }
}

/// Run every review in `file` through the ingestion pipeline and print the
/// outcomes as JSON, one entry per input review.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed. Per-review
/// failures are reported in the printed outcomes instead.
pub(crate) async fn run_ingest(
    config: &AppConfig,
    store: Arc<dyn TabularStore>,
    file: &Path,
) -> anyhow::Result<()> {
    let raw = tokio::fs::read_to_string(file)
        .await
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", file.display()))?;
    let reviews = parse_inbound(&raw)?;

    let resolver = Arc::new(BrandIdentityResolver::new(
        Arc::clone(&store),
        config.registry_table.clone(),
        Arc::new(BrandCache::new()),
    ));
    resolver.load_cache(false).await;

    let pipeline = ReviewIngestionPipeline::new(
        store,
        Arc::new(RecentIdCache::new(
            config.dedup_cache_capacity,
            Duration::from_secs(config.dedup_cache_ttl_secs),
        )),
        Arc::clone(&resolver),
        PipelineSettings {
            raw_table_prefix: config.raw_table_prefix.clone(),
            lookback_rows: config.dup_check_lookback_rows,
        },
    );

    let mut outcomes = Vec::with_capacity(reviews.len());
    for review in &reviews {
        outcomes.push(pipeline.ingest(review).await);
    }
    resolver.flush_alias_writes().await;

    let duplicates = outcomes.iter().filter(|o| o.duplicate).count();
    let rejected = outcomes.iter().filter(|o| !o.accepted).count();
    tracing::info!(
        total = outcomes.len(),
        persisted = outcomes.len() - duplicates - rejected,
        duplicates,
        rejected,
        "ingest complete"
    );

    println!("{}", serde_json::to_string_pretty(&outcomes)?);
    Ok(())
}

/// Enrich one batch of pending reviews with the local lexicon enricher.
///
/// # Errors
///
/// Returns an error if pending rows cannot be listed.
pub(crate) async fn run_enrich(config: &AppConfig, store: Arc<dyn TabularStore>) -> anyhow::Result<()> {
    let batch = EnrichmentBatch::new(
        store,
        Arc::new(LexiconEnricher),
        EnrichmentSettings {
            raw_table_prefix: config.raw_table_prefix.clone(),
            batch_size: config.enrich_batch_size,
            max_attempts: config.enrich_max_attempts,
        },
    );
    let summary = batch.process_pending().await?;

    println!(
        "selected {}, enriched {}, errored {}, failed {}, write errors {}",
        summary.selected, summary.enriched, summary.errored, summary.failed, summary.write_errors
    );
    Ok(())
}
