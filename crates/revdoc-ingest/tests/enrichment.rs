use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use revdoc_core::{now_kst, Enrichment, EnrichmentContext, ReviewRecord, ReviewStatus, Sentiment};
use revdoc_ingest::{EnrichError, Enricher, EnrichmentBatch, EnrichmentSettings, LexiconEnricher};
use revdoc_store::naming::raw_table_for;
use revdoc_store::reviews::{append_review, list_reviews};
use revdoc_store::MemoryStore;

/// Fails for any text in `failing`, otherwise returns a fixed positive result.
struct ScriptedEnricher {
    failing: HashSet<String>,
    seen: Mutex<Vec<String>>,
}

impl ScriptedEnricher {
    fn failing_on(texts: &[&str]) -> Self {
        Self {
            failing: texts.iter().map(|t| (*t).to_string()).collect(),
            seen: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Enricher for ScriptedEnricher {
    async fn enrich(
        &self,
        text: &str,
        _context: &EnrichmentContext,
    ) -> Result<Enrichment, EnrichError> {
        self.seen.lock().push(text.to_string());
        if self.failing.contains(text) {
            return Err(EnrichError::Failed("model timeout".into()));
        }
        Ok(Enrichment {
            sentiment: Sentiment::Positive,
            summary: format!(" {text} "),
            keywords: vec![" 맛 ".into(), "맛".into(), "양".into()],
        })
    }
}

fn record(id: &str, text: &str, status: ReviewStatus, attempts: u32) -> ReviewRecord {
    ReviewRecord {
        received_at: Some(now_kst()),
        review_created_at: String::new(),
        brand_name: "Foo".into(),
        store_name: "Foo점".into(),
        platform: "PlatformX".into(),
        rating: 4.0,
        review_id: id.into(),
        review_text: text.into(),
        status,
        sentiment: None,
        summary: String::new(),
        keywords: Vec::new(),
        processed_at: None,
        attempts,
        review_url: String::new(),
        image_url: String::new(),
    }
}

fn settings(batch_size: usize) -> EnrichmentSettings {
    EnrichmentSettings {
        raw_table_prefix: "R_".into(),
        batch_size,
        max_attempts: 3,
    }
}

async fn seeded_store(rows: &[ReviewRecord]) -> (Arc<MemoryStore>, String) {
    let store = Arc::new(MemoryStore::new());
    let table = raw_table_for("R_", &now_kst());
    for r in rows {
        append_review(store.as_ref(), &table, r).await.unwrap();
    }
    (store, table)
}

#[tokio::test]
async fn success_writes_done_with_sanitized_fields() {
    let (store, table) = seeded_store(&[record("a", "맛있어요", ReviewStatus::New, 0)]).await;
    let batch = EnrichmentBatch::new(
        store.clone(),
        Arc::new(ScriptedEnricher::failing_on(&[])),
        settings(50),
    );

    let summary = batch.process_pending().await.unwrap();
    assert_eq!(summary.selected, 1);
    assert_eq!(summary.enriched, 1);

    let rows = list_reviews(store.as_ref(), &table).await.unwrap();
    let r = &rows[0].record;
    assert_eq!(r.status, ReviewStatus::Done);
    assert_eq!(r.sentiment, Some(Sentiment::Positive));
    assert_eq!(r.summary, "맛있어요");
    assert_eq!(r.keywords, vec!["맛", "양"]);
    assert!(r.processed_at.is_some());
}

#[tokio::test]
async fn done_rows_are_never_reprocessed() {
    let (store, _) = seeded_store(&[record("a", "x", ReviewStatus::New, 0)]).await;
    let enricher = Arc::new(ScriptedEnricher::failing_on(&[]));
    let batch = EnrichmentBatch::new(store.clone(), enricher.clone(), settings(50));

    batch.process_pending().await.unwrap();
    let second = batch.process_pending().await.unwrap();
    assert_eq!(second.selected, 0);
    assert_eq!(enricher.seen.lock().len(), 1);
}

#[tokio::test]
async fn failures_escalate_from_error_to_failed() {
    let (store, table) = seeded_store(&[record("a", "boom", ReviewStatus::New, 0)]).await;
    let batch = EnrichmentBatch::new(
        store.clone(),
        Arc::new(ScriptedEnricher::failing_on(&["boom"])),
        settings(50),
    );

    for expected_attempts in 1..=2 {
        let summary = batch.process_pending().await.unwrap();
        assert_eq!(summary.errored, 1);
        let r = &list_reviews(store.as_ref(), &table).await.unwrap()[0].record;
        assert_eq!(r.status, ReviewStatus::Error);
        assert_eq!(r.attempts, expected_attempts);
    }

    let summary = batch.process_pending().await.unwrap();
    assert_eq!(summary.failed, 1);
    let r = &list_reviews(store.as_ref(), &table).await.unwrap()[0].record;
    assert_eq!(r.status, ReviewStatus::Failed);
    assert_eq!(r.attempts, 3);

    let after = batch.process_pending().await.unwrap();
    assert_eq!(after.selected, 0, "FAILED rows are terminal");
}

#[tokio::test]
async fn batch_size_limits_selection() {
    let rows: Vec<_> = (0..5)
        .map(|i| record(&format!("r{i}"), &format!("text {i}"), ReviewStatus::New, 0))
        .collect();
    let (store, _) = seeded_store(&rows).await;
    let batch = EnrichmentBatch::new(store, Arc::new(LexiconEnricher), settings(2));

    let summary = batch.process_pending().await.unwrap();
    assert_eq!(summary.selected, 2);
    assert_eq!(summary.enriched, 2);
}

#[tokio::test]
async fn one_failure_does_not_block_others() {
    let (store, table) = seeded_store(&[
        record("a", "boom", ReviewStatus::New, 0),
        record("b", "좋아요", ReviewStatus::Error, 1),
    ])
    .await;
    let batch = EnrichmentBatch::new(
        store.clone(),
        Arc::new(ScriptedEnricher::failing_on(&["boom"])),
        settings(50),
    );

    let summary = batch.process_pending().await.unwrap();
    assert_eq!(summary.errored, 1);
    assert_eq!(summary.enriched, 1);

    let rows = list_reviews(store.as_ref(), &table).await.unwrap();
    assert_eq!(rows[1].record.status, ReviewStatus::Done);
}
