//! Single-review ingestion: fingerprint, duplicate checks, brand resolution, persist.

use std::sync::Arc;

use revdoc_core::{
    format_rating, now_kst, parse_rating, review_fingerprint, InboundReview, ReviewIdentity,
    ReviewRecord, ReviewStatus,
};
use revdoc_store::naming::raw_table_for;
use revdoc_store::reviews;
use revdoc_store::TabularStore;
use serde::Serialize;

use crate::brand::{extract_pure_brand_name, BrandIdentityResolver};
use crate::dedup::RecentIdCache;
use crate::IngestError;

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub raw_table_prefix: String,
    pub lookback_rows: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            raw_table_prefix: "ReviewDoctor_Raw_".to_string(),
            lookback_rows: 2_000,
        }
    }
}

/// Where a duplicate was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateSource {
    Cache,
    Store,
}

/// Terminal state of one successful ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestDecision {
    Duplicate {
        review_id: String,
        source: DuplicateSource,
    },
    Persisted {
        review_id: String,
        brand: String,
        table: String,
    },
}

/// Structured result returned to ingestion callers; never a raw error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestOutcome {
    pub accepted: bool,
    pub review_id: String,
    pub duplicate: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<IngestDecision> for IngestOutcome {
    fn from(decision: IngestDecision) -> Self {
        match decision {
            IngestDecision::Duplicate { review_id, .. } => Self {
                accepted: true,
                review_id,
                duplicate: true,
                brand: None,
                table: None,
                error: None,
            },
            IngestDecision::Persisted {
                review_id,
                brand,
                table,
            } => Self {
                accepted: true,
                review_id,
                duplicate: false,
                brand: Some(brand),
                table: Some(table),
                error: None,
            },
        }
    }
}

pub struct ReviewIngestionPipeline {
    store: Arc<dyn TabularStore>,
    recent_ids: Arc<RecentIdCache>,
    resolver: Arc<BrandIdentityResolver>,
    settings: PipelineSettings,
}

impl std::fmt::Debug for ReviewIngestionPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReviewIngestionPipeline")
            .field("settings", &self.settings)
            .field("recent_ids", &self.recent_ids)
            .finish_non_exhaustive()
    }
}

/// A blank value is rejected, but a present one is returned untrimmed so
/// fingerprints match rows written by the legacy ingester.
fn required<'a>(value: Option<&'a String>, field: &'static str) -> Result<&'a str, IngestError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.as_str()),
        _ => Err(IngestError::Validation { field }),
    }
}

impl ReviewIngestionPipeline {
    #[must_use]
    pub fn new(
        store: Arc<dyn TabularStore>,
        recent_ids: Arc<RecentIdCache>,
        resolver: Arc<BrandIdentityResolver>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            store,
            recent_ids,
            resolver,
            settings,
        }
    }

    /// Ingest one review and report the outcome.
    pub async fn ingest(&self, review: &InboundReview) -> IngestOutcome {
        match self.process(review).await {
            Ok(decision) => decision.into(),
            Err(e) => {
                match &e {
                    IngestError::Validation { field } => {
                        tracing::warn!(field, "ingest: rejected review");
                    }
                    IngestError::Store(err) => {
                        tracing::error!(error = %err, "ingest: failed to persist review");
                    }
                }
                IngestOutcome {
                    accepted: false,
                    review_id: String::new(),
                    duplicate: false,
                    brand: None,
                    table: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    /// Run the ingestion state machine.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Validation`] before any I/O when a required
    /// field is blank, and [`IngestError::Store`] when the duplicate check or
    /// the append fails.
    pub async fn process(&self, review: &InboundReview) -> Result<IngestDecision, IngestError> {
        let brand_raw = required(review.brand_name.as_ref(), "brand_name")?;
        let store_name = required(review.store_name.as_ref(), "store_name")?;
        let platform = required(review.platform.as_ref(), "platform")?;
        let rating = format_rating(review.rating.as_ref());
        let text = review.review_text.as_deref().unwrap_or_default();
        let created_at = review.created_at.as_deref().unwrap_or_default();

        let review_id = review_fingerprint(&ReviewIdentity {
            brand: brand_raw,
            store: store_name,
            platform,
            rating: &rating,
            text,
            created_at,
        });

        if self.recent_ids.contains(&review_id) {
            tracing::debug!(review_id = %review_id, "ingest: duplicate in recent cache");
            return Ok(IngestDecision::Duplicate {
                review_id,
                source: DuplicateSource::Cache,
            });
        }

        let received_at = now_kst();
        let table = raw_table_for(&self.settings.raw_table_prefix, &received_at);

        let recent =
            reviews::recent_review_ids(self.store.as_ref(), &table, self.settings.lookback_rows)
                .await?;
        if recent.contains(&review_id) {
            self.recent_ids.add(&review_id);
            tracing::debug!(review_id = %review_id, table = %table, "ingest: duplicate in store");
            return Ok(IngestDecision::Duplicate {
                review_id,
                source: DuplicateSource::Store,
            });
        }

        let brand = self
            .resolver
            .resolve(&extract_pure_brand_name(brand_raw))
            .await;

        let record = ReviewRecord {
            received_at: Some(received_at),
            review_created_at: created_at.to_string(),
            brand_name: brand.clone(),
            store_name: store_name.to_string(),
            platform: platform.to_string(),
            rating: parse_rating(&rating),
            review_id: review_id.clone(),
            review_text: text.to_string(),
            status: ReviewStatus::New,
            sentiment: None,
            summary: String::new(),
            keywords: Vec::new(),
            processed_at: None,
            attempts: 0,
            review_url: review.review_url.clone().unwrap_or_default(),
            image_url: review.image_url.clone().unwrap_or_default(),
        };

        reviews::append_review(self.store.as_ref(), &table, &record).await?;
        self.recent_ids.add(&review_id);

        tracing::info!(review_id = %review_id, brand = %brand, table = %table, "ingest: review stored");

        Ok(IngestDecision::Persisted {
            review_id,
            brand,
            table,
        })
    }
}
