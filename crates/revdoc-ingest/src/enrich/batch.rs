use std::sync::Arc;

use chrono::{DateTime, Datelike, FixedOffset, Months};
use revdoc_core::{kst, now_kst, EnrichmentContext, ReviewStatus};
use revdoc_store::naming::raw_table_name;
use revdoc_store::reviews::{self, StoredReview};
use revdoc_store::TabularStore;
use serde::Serialize;

use super::{sanitize_enrichment, Enricher};
use crate::IngestError;

#[derive(Debug, Clone)]
pub struct EnrichmentSettings {
    pub raw_table_prefix: String,
    pub batch_size: usize,
    pub max_attempts: u32,
}

impl Default for EnrichmentSettings {
    fn default() -> Self {
        Self {
            raw_table_prefix: "ReviewDoctor_Raw_".to_string(),
            batch_size: 50,
            max_attempts: 3,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EnrichmentSummary {
    pub selected: usize,
    pub enriched: usize,
    /// Marked `ERROR`; picked up again by a later batch.
    pub errored: usize,
    /// Marked `FAILED` after exhausting the attempt budget.
    pub failed: usize,
    /// Rows whose result could not be written back.
    pub write_errors: usize,
}

/// Enriches rows in `NEW`/`ERROR` state, writing each result exactly once.
pub struct EnrichmentBatch {
    store: Arc<dyn TabularStore>,
    enricher: Arc<dyn Enricher>,
    settings: EnrichmentSettings,
}

impl std::fmt::Debug for EnrichmentBatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnrichmentBatch")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

/// Previous and current KST month tables, oldest first.
fn pending_tables(prefix: &str, now: &DateTime<FixedOffset>) -> Vec<String> {
    let local = now.with_timezone(&kst()).date_naive();
    let current = raw_table_name(prefix, local.year(), local.month());
    match local
        .with_day(1)
        .and_then(|first| first.checked_sub_months(Months::new(1)))
    {
        Some(prev) => vec![raw_table_name(prefix, prev.year(), prev.month()), current],
        None => vec![current],
    }
}

impl EnrichmentBatch {
    #[must_use]
    pub fn new(
        store: Arc<dyn TabularStore>,
        enricher: Arc<dyn Enricher>,
        settings: EnrichmentSettings,
    ) -> Self {
        Self {
            store,
            enricher,
            settings,
        }
    }

    /// Process up to `batch_size` pending rows from the previous and current
    /// month tables.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Store`] if pending rows cannot be listed.
    /// Per-row failures are recorded in the summary instead.
    pub async fn process_pending(&self) -> Result<EnrichmentSummary, IngestError> {
        let mut summary = EnrichmentSummary::default();
        for table in pending_tables(&self.settings.raw_table_prefix, &now_kst()) {
            let remaining = self.settings.batch_size.saturating_sub(summary.selected);
            if remaining == 0 {
                break;
            }
            self.process_table(&table, remaining, &mut summary).await?;
        }

        if summary.selected > 0 {
            tracing::info!(
                selected = summary.selected,
                enriched = summary.enriched,
                errored = summary.errored,
                failed = summary.failed,
                "enrich: batch completed"
            );
        } else {
            tracing::debug!("enrich: no pending reviews");
        }
        Ok(summary)
    }

    /// Process up to `limit` pending rows of one table.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Store`] if pending rows cannot be listed.
    pub async fn process_table(
        &self,
        table: &str,
        limit: usize,
        summary: &mut EnrichmentSummary,
    ) -> Result<(), IngestError> {
        let pending = reviews::list_pending(self.store.as_ref(), table, limit).await?;
        summary.selected += pending.len();

        for stored in pending {
            self.process_one(table, &stored, summary).await;
        }
        Ok(())
    }

    async fn process_one(&self, table: &str, stored: &StoredReview, summary: &mut EnrichmentSummary) {
        let record = &stored.record;
        let context = EnrichmentContext {
            brand_name: record.brand_name.clone(),
            store_name: record.store_name.clone(),
            platform: record.platform.clone(),
            rating: record.rating,
        };

        match self.enricher.enrich(&record.review_text, &context).await {
            Ok(raw) => {
                let enrichment = sanitize_enrichment(raw);
                let result = reviews::write_enrichment(
                    self.store.as_ref(),
                    table,
                    stored.row,
                    &enrichment,
                    &now_kst(),
                )
                .await;
                match result {
                    Ok(()) => {
                        summary.enriched += 1;
                        tracing::debug!(
                            review_id = %record.review_id,
                            sentiment = %enrichment.sentiment,
                            "enrich: review processed"
                        );
                    }
                    Err(e) => {
                        summary.write_errors += 1;
                        tracing::error!(review_id = %record.review_id, error = %e, "enrich: failed to write result");
                    }
                }
            }
            Err(err) => {
                let attempts = record.attempts.saturating_add(1);
                let status = if attempts >= self.settings.max_attempts {
                    ReviewStatus::Failed
                } else {
                    ReviewStatus::Error
                };
                tracing::warn!(
                    review_id = %record.review_id,
                    attempts,
                    status = %status,
                    error = %err,
                    "enrich: review failed"
                );
                match reviews::write_failure(self.store.as_ref(), table, stored.row, status, attempts)
                    .await
                {
                    Ok(()) if status == ReviewStatus::Failed => summary.failed += 1,
                    Ok(()) => summary.errored += 1,
                    Err(e) => {
                        summary.write_errors += 1;
                        tracing::error!(review_id = %record.review_id, error = %e, "enrich: failed to record failure");
                    }
                }
            }
        }
    }
}
