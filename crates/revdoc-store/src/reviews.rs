//! Row codec and operations for the `Reviews` section of monthly raw tables.

use std::collections::HashSet;

use chrono::{DateTime, FixedOffset};
use revdoc_core::{
    format_timestamp, parse_rating, parse_timestamp, Enrichment, ReviewRecord, ReviewStatus,
    Sentiment, WeekRange,
};

use crate::naming::{raw_tables_for_week, REVIEWS_SECTION};
use crate::{Row, RowRange, StoreError, TabularStore};

pub const REVIEW_HEADERS: [&str; 16] = [
    "received_at",
    "review_created_at",
    "brand_name",
    "store_name",
    "platform",
    "rating",
    "review_id",
    "review_text",
    "status",
    "sentiment",
    "summary",
    "keywords",
    "processed_at",
    "attempts",
    "review_url",
    "image_url",
];

const COL_REVIEW_ID: usize = 6;
const COL_STATUS: usize = 8;
const COL_ATTEMPTS: usize = 13;

const KEYWORD_SEPARATOR: &str = ", ";

// ---------------------------------------------------------------------------
// Codec
// ---------------------------------------------------------------------------

/// A decoded review together with its data-row index.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredReview {
    pub row: usize,
    pub record: ReviewRecord,
}

#[must_use]
pub fn encode_review(record: &ReviewRecord) -> Row {
    vec![
        record
            .received_at
            .as_ref()
            .map(format_timestamp)
            .unwrap_or_default(),
        record.review_created_at.clone(),
        record.brand_name.clone(),
        record.store_name.clone(),
        record.platform.clone(),
        record.rating.to_string(),
        record.review_id.clone(),
        record.review_text.clone(),
        record.status.as_str().to_string(),
        record
            .sentiment
            .map(|s| s.korean_label().to_string())
            .unwrap_or_default(),
        record.summary.clone(),
        record.keywords.join(KEYWORD_SEPARATOR),
        record
            .processed_at
            .as_ref()
            .map(format_timestamp)
            .unwrap_or_default(),
        record.attempts.to_string(),
        record.review_url.clone(),
        record.image_url.clone(),
    ]
}

/// Decode a raw row. Short rows are padded; malformed cells fall back to defaults.
#[must_use]
pub fn decode_review(row: &[String]) -> ReviewRecord {
    let cell = |i: usize| row.get(i).map_or("", |s| s.as_str());

    ReviewRecord {
        received_at: parse_timestamp(cell(0)),
        review_created_at: cell(1).to_string(),
        brand_name: cell(2).to_string(),
        store_name: cell(3).to_string(),
        platform: cell(4).to_string(),
        rating: parse_rating(cell(5)),
        review_id: cell(6).to_string(),
        review_text: cell(7).to_string(),
        status: ReviewStatus::parse(cell(8)),
        sentiment: Sentiment::parse(cell(9)),
        summary: cell(10).to_string(),
        keywords: split_keywords(cell(11)),
        processed_at: parse_timestamp(cell(12)),
        attempts: cell(13).trim().parse().unwrap_or(0),
        review_url: cell(14).to_string(),
        image_url: cell(15).to_string(),
    }
}

fn split_keywords(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Create the table and its `Reviews` section if needed.
///
/// # Errors
///
/// Propagates any [`StoreError`] from the store.
pub async fn ensure_reviews_section(
    store: &dyn TabularStore,
    table: &str,
) -> Result<(), StoreError> {
    store.ensure_table(table).await?;
    store
        .ensure_section(table, REVIEWS_SECTION, &REVIEW_HEADERS)
        .await
}

/// Append a review, creating the section on demand.
///
/// # Errors
///
/// Propagates any [`StoreError`] from the store.
pub async fn append_review(
    store: &dyn TabularStore,
    table: &str,
    record: &ReviewRecord,
) -> Result<usize, StoreError> {
    ensure_reviews_section(store, table).await?;
    store
        .append_row(table, REVIEWS_SECTION, encode_review(record))
        .await
}

/// Review ids among the last `lookback` rows of `table`.
///
/// A table or section that does not exist yet yields an empty set.
///
/// # Errors
///
/// Returns any [`StoreError`] other than a missing table/section.
pub async fn recent_review_ids(
    store: &dyn TabularStore,
    table: &str,
    lookback: usize,
) -> Result<HashSet<String>, StoreError> {
    let rows = match store
        .get_recent_rows(table, REVIEWS_SECTION, lookback)
        .await
    {
        Ok(rows) => rows,
        Err(e) if e.is_missing() => return Ok(HashSet::new()),
        Err(e) => return Err(e),
    };
    Ok(rows
        .into_iter()
        .filter_map(|row| row.into_iter().nth(COL_REVIEW_ID))
        .filter(|id| !id.is_empty())
        .collect())
}

/// Every review in `table`, with row indexes. Missing tables read as empty.
///
/// # Errors
///
/// Returns any [`StoreError`] other than a missing table/section.
pub async fn list_reviews(
    store: &dyn TabularStore,
    table: &str,
) -> Result<Vec<StoredReview>, StoreError> {
    let rows = match store.get_rows(table, REVIEWS_SECTION).await {
        Ok(rows) => rows,
        Err(e) if e.is_missing() => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };
    Ok(rows
        .iter()
        .enumerate()
        .map(|(row, cells)| StoredReview {
            row,
            record: decode_review(cells),
        })
        .collect())
}

/// Up to `limit` rows awaiting enrichment (`NEW` or `ERROR`), in row order.
///
/// # Errors
///
/// Returns any [`StoreError`] other than a missing table/section.
pub async fn list_pending(
    store: &dyn TabularStore,
    table: &str,
    limit: usize,
) -> Result<Vec<StoredReview>, StoreError> {
    Ok(list_reviews(store, table)
        .await?
        .into_iter()
        .filter(|r| matches!(r.record.status, ReviewStatus::New | ReviewStatus::Error))
        .take(limit)
        .collect())
}

/// Mark a row `DONE` and write its enrichment fields.
///
/// # Errors
///
/// Propagates any [`StoreError`] from the store.
pub async fn write_enrichment(
    store: &dyn TabularStore,
    table: &str,
    row: usize,
    enrichment: &Enrichment,
    processed_at: &DateTime<FixedOffset>,
) -> Result<(), StoreError> {
    let values = vec![
        ReviewStatus::Done.as_str().to_string(),
        enrichment.sentiment.korean_label().to_string(),
        enrichment.summary.clone(),
        enrichment.keywords.join(KEYWORD_SEPARATOR),
        format_timestamp(processed_at),
    ];
    store
        .update_rows(
            table,
            REVIEWS_SECTION,
            RowRange {
                row,
                col: COL_STATUS,
            },
            values,
        )
        .await
}

/// Record a failed enrichment attempt.
///
/// # Errors
///
/// Propagates any [`StoreError`] from the store.
pub async fn write_failure(
    store: &dyn TabularStore,
    table: &str,
    row: usize,
    status: ReviewStatus,
    attempts: u32,
) -> Result<(), StoreError> {
    store
        .update_rows(
            table,
            REVIEWS_SECTION,
            RowRange {
                row,
                col: COL_STATUS,
            },
            vec![status.as_str().to_string()],
        )
        .await?;
    store
        .update_rows(
            table,
            REVIEWS_SECTION,
            RowRange {
                row,
                col: COL_ATTEMPTS,
            },
            vec![attempts.to_string()],
        )
        .await
}

/// Enriched (`DONE`) reviews received within `week`, across every month table it spans.
///
/// # Errors
///
/// Returns any [`StoreError`] other than a missing table/section.
pub async fn list_done_in_week(
    store: &dyn TabularStore,
    table_prefix: &str,
    week: &WeekRange,
) -> Result<Vec<ReviewRecord>, StoreError> {
    let mut out = Vec::new();
    for table in raw_tables_for_week(table_prefix, week) {
        for stored in list_reviews(store, &table).await? {
            let record = stored.record;
            if record.status != ReviewStatus::Done {
                continue;
            }
            if record.received_at.as_ref().is_some_and(|ts| week.contains(ts)) {
                out.push(record);
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
#[path = "reviews_test.rs"]
mod tests;
