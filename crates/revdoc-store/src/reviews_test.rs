use chrono::NaiveDate;

use super::*;
use crate::MemoryStore;

fn record(id: &str, received_at: &str, status: ReviewStatus) -> ReviewRecord {
    ReviewRecord {
        received_at: parse_timestamp(received_at),
        review_created_at: "2025-01-06T10:00:00Z".to_string(),
        brand_name: "Foo".to_string(),
        store_name: "Foo점".to_string(),
        platform: "PlatformX".to_string(),
        rating: 5.0,
        review_id: id.to_string(),
        review_text: "great".to_string(),
        status,
        sentiment: None,
        summary: String::new(),
        keywords: Vec::new(),
        processed_at: None,
        attempts: 0,
        review_url: String::new(),
        image_url: String::new(),
    }
}

#[test]
fn decode_pads_short_rows() {
    let row = vec!["".to_string(), "".to_string(), "Foo".to_string()];
    let decoded = decode_review(&row);
    assert_eq!(decoded.brand_name, "Foo");
    assert!(decoded.rating.abs() < f64::EPSILON);
    assert_eq!(decoded.status, ReviewStatus::New);
    assert!(decoded.sentiment.is_none());
    assert!(decoded.keywords.is_empty());
}

#[test]
fn decode_reads_legacy_korean_timestamp() {
    let mut row = encode_review(&record("a", "2025-01-07T14:23:45+09:00", ReviewStatus::Done));
    row[0] = "2025. 1. 7. 오후 2:23:45".to_string();
    let decoded = decode_review(&row);
    assert_eq!(
        decoded.received_at.unwrap().to_rfc3339(),
        "2025-01-07T14:23:45+09:00"
    );
}

#[test]
fn encode_writes_korean_sentiment_and_joined_keywords() {
    let mut r = record("a", "2025-01-07T10:00:00+09:00", ReviewStatus::Done);
    r.sentiment = Some(Sentiment::Negative);
    r.keywords = vec!["짜다".to_string(), "늦음".to_string()];
    let row = encode_review(&r);
    assert_eq!(row.len(), REVIEW_HEADERS.len());
    assert_eq!(row[9], "부정");
    assert_eq!(row[11], "짜다, 늦음");
    assert_eq!(decode_review(&row), r);
}

#[test]
fn fractional_rating_cell_is_kept_verbatim() {
    let mut r = record("a", "2025-01-07T10:00:00+09:00", ReviewStatus::New);
    r.rating = 1.4;
    let row = encode_review(&r);
    assert_eq!(row[5], "1.4");
    assert_eq!(decode_review(&row).rating.to_string(), "1.4");

    r.rating = 5.0;
    assert_eq!(encode_review(&r)[5], "5");
}

#[tokio::test]
async fn recent_ids_on_missing_table_is_empty() {
    let store = MemoryStore::new();
    let ids = recent_review_ids(&store, "R_2025_01", 10).await.unwrap();
    assert!(ids.is_empty());
}

#[tokio::test]
async fn recent_ids_only_cover_lookback_tail() {
    let store = MemoryStore::new();
    for id in ["old", "mid", "new"] {
        append_review(
            &store,
            "R_2025_01",
            &record(id, "2025-01-07T10:00:00+09:00", ReviewStatus::New),
        )
        .await
        .unwrap();
    }
    let ids = recent_review_ids(&store, "R_2025_01", 2).await.unwrap();
    assert!(!ids.contains("old"));
    assert!(ids.contains("mid"));
    assert!(ids.contains("new"));
}

#[tokio::test]
async fn enrichment_and_failure_updates() {
    let store = MemoryStore::new();
    let table = "R_2025_01";
    append_review(&store, table, &record("a", "2025-01-07T10:00:00+09:00", ReviewStatus::New))
        .await
        .unwrap();
    append_review(&store, table, &record("b", "2025-01-07T10:00:00+09:00", ReviewStatus::New))
        .await
        .unwrap();

    let processed_at = parse_timestamp("2025-01-07T11:00:00+09:00").unwrap();
    let enrichment = Enrichment {
        sentiment: Sentiment::Positive,
        summary: "맛있다".to_string(),
        keywords: vec!["맛".to_string()],
    };
    write_enrichment(&store, table, 0, &enrichment, &processed_at)
        .await
        .unwrap();
    write_failure(&store, table, 1, ReviewStatus::Error, 1)
        .await
        .unwrap();

    let reviews = list_reviews(&store, table).await.unwrap();
    assert_eq!(reviews[0].record.status, ReviewStatus::Done);
    assert_eq!(reviews[0].record.sentiment, Some(Sentiment::Positive));
    assert_eq!(reviews[0].record.processed_at, Some(processed_at));
    assert_eq!(reviews[1].record.status, ReviewStatus::Error);
    assert_eq!(reviews[1].record.attempts, 1);

    let pending = list_pending(&store, table, 10).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].row, 1);
}

#[tokio::test]
async fn done_in_week_spans_month_tables_and_filters() {
    let store = MemoryStore::new();
    // Week of 2024-12-30 .. 2025-01-05 spans two month tables.
    append_review(
        &store,
        "R_2024_12",
        &record("dec", "2024-12-31T09:00:00+09:00", ReviewStatus::Done),
    )
    .await
    .unwrap();
    append_review(
        &store,
        "R_2025_01",
        &record("jan", "2025-01-05T23:59:59+09:00", ReviewStatus::Done),
    )
    .await
    .unwrap();
    append_review(
        &store,
        "R_2025_01",
        &record("pending", "2025-01-02T10:00:00+09:00", ReviewStatus::New),
    )
    .await
    .unwrap();
    append_review(
        &store,
        "R_2025_01",
        &record("next-week", "2025-01-06T00:00:00+09:00", ReviewStatus::Done),
    )
    .await
    .unwrap();

    let week = WeekRange::containing(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
    let found = list_done_in_week(&store, "R_", &week).await.unwrap();
    let ids: Vec<_> = found.iter().map(|r| r.review_id.as_str()).collect();
    assert_eq!(ids, vec!["dec", "jan"]);
}
