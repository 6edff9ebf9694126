use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::Mutex;
use revdoc_core::{parse_timestamp, ReviewRecord, ReviewStatus, Sentiment};
use revdoc_store::naming::{raw_table_for, NOTIFICATION_SECTION};
use revdoc_store::notifications::ensure_notification_section;
use revdoc_store::reviews::append_review;
use revdoc_store::{
    ArtifactRef, MemoryStore, NotificationConfig, ReportSection, ReportSink, StoreError,
    TabularStore,
};
use revdoc_weekly::{
    CancelFlag, Notifier, NotifyError, ReportRequest, WeeklyReportService, WeeklySettings,
    WeeklySummary,
};

const PREFIX: &str = "ReviewDoctor_Raw_";
const REGISTRY: &str = "ReviewDoctor_Registry";

fn settings() -> WeeklySettings {
    WeeklySettings {
        raw_table_prefix: PREFIX.to_string(),
        registry_table: REGISTRY.to_string(),
        report_folder: "WeeklyReports".to_string(),
        store_max_retries: 0,
        store_retry_backoff_ms: 1,
    }
}

fn request(brand: Option<&str>) -> ReportRequest {
    ReportRequest {
        brand: brand.map(str::to_string),
        week: NaiveDate::from_ymd_opt(2025, 1, 8),
    }
}

async fn seed(
    store: &MemoryStore,
    id: &str,
    brand: &str,
    received_at: &str,
    rating: u8,
    sentiment: Sentiment,
) {
    let ts = parse_timestamp(received_at).expect("valid timestamp");
    let record = ReviewRecord {
        received_at: Some(ts),
        review_created_at: String::new(),
        brand_name: brand.into(),
        store_name: "원주점".into(),
        platform: "배달의민족".into(),
        rating: f64::from(rating),
        review_id: id.into(),
        review_text: format!("{id} text"),
        status: ReviewStatus::Done,
        sentiment: Some(sentiment),
        summary: String::new(),
        keywords: vec!["바삭".into()],
        processed_at: None,
        attempts: 0,
        review_url: String::new(),
        image_url: String::new(),
    };
    append_review(store, &raw_table_for(PREFIX, &ts), &record)
        .await
        .expect("append");
}

async fn two_brand_week(store: &MemoryStore) {
    seed(store, "a1", "화락바베큐치킨", "2025-01-07T12:00:00+09:00", 5, Sentiment::Positive).await;
    seed(store, "b1", "교촌치킨", "2025-01-08T12:00:00+09:00", 2, Sentiment::Negative).await;
    seed(store, "a2", "화락바베큐치킨 원주점", "2025-01-09T12:00:00+09:00", 4, Sentiment::Positive).await;
}

fn service(
    store: &Arc<MemoryStore>,
    sink: Arc<dyn ReportSink>,
    notifier: Arc<dyn Notifier>,
) -> WeeklyReportService {
    let tabular: Arc<dyn TabularStore> = store.clone();
    WeeklyReportService::new(tabular, sink, notifier, settings())
}

// ---------------------------------------------------------------------------
// Doubles
// ---------------------------------------------------------------------------

#[derive(Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<(String, WeeklySummary)>>,
    cancel_after_first: Option<CancelFlag>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(
        &self,
        config: &NotificationConfig,
        summary: &WeeklySummary,
        _artifact: &ArtifactRef,
    ) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .push((config.webhook_url.clone(), summary.clone()));
        if let Some(flag) = &self.cancel_after_first {
            flag.cancel();
        }
        Ok(())
    }
}

/// Delegates to a [`MemoryStore`] but refuses artifacts whose name starts with `broken`.
struct SelectiveSink {
    inner: Arc<MemoryStore>,
    broken: String,
}

#[async_trait]
impl ReportSink for SelectiveSink {
    async fn create_artifact(&self, folder: &[String], name: &str) -> Result<ArtifactRef, StoreError> {
        if name.starts_with(&self.broken) {
            return Err(StoreError::Unavailable("drive quota exceeded".into()));
        }
        self.inner.create_artifact(folder, name).await
    }

    async fn write_section(
        &self,
        artifact: &ArtifactRef,
        index: usize,
        section: &ReportSection,
    ) -> Result<(), StoreError> {
        self.inner.write_section(artifact, index, section).await
    }
}

async fn subscribe(store: &MemoryStore, brand: &str, webhook: &str, enabled: bool) {
    ensure_notification_section(store, REGISTRY).await.expect("section");
    store
        .append_row(
            REGISTRY,
            NOTIFICATION_SECTION,
            vec![brand.into(), webhook.into(), enabled.to_string(), "summary".into()],
        )
        .await
        .expect("append");
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn builds_one_report_per_brand_group() {
    let store = Arc::new(MemoryStore::new());
    two_brand_week(&store).await;
    let svc = service(&store, store.clone(), Arc::new(RecordingNotifier::default()));

    let outcomes = svc.run(&request(None), &CancelFlag::new()).await.unwrap();

    assert_eq!(outcomes.len(), 2);
    assert!(outcomes.iter().all(|o| o.success));
    assert_eq!(outcomes[0].brand_name, "화락바베큐치킨");
    assert_eq!(outcomes[0].total_reviews, 2, "branch suffix joins the brand group");
    assert_eq!(outcomes[1].brand_name, "교촌치킨");
    assert_eq!(outcomes[0].week_label, "2025-01-06_2025-01-12");

    let artifact = outcomes[0].artifact.as_ref().unwrap();
    assert_eq!(artifact.name, "화락바베큐치킨_Weekly_2025-01-06_2025-01-12");
    let stored = store.artifact(&artifact.id).unwrap();
    assert_eq!(stored.sections.len(), 6);
    assert_eq!(
        stored.folder,
        vec!["WeeklyReports", "화락바베큐치킨", "2025", "01월"]
    );
}

#[tokio::test]
async fn brand_filter_without_data_reports_no_data() {
    let store = Arc::new(MemoryStore::new());
    two_brand_week(&store).await;
    let svc = service(&store, store.clone(), Arc::new(RecordingNotifier::default()));

    let outcomes = svc
        .run(&request(Some("BHC치킨")), &CancelFlag::new())
        .await
        .unwrap();

    assert_eq!(outcomes.len(), 1);
    assert!(!outcomes[0].success);
    assert_eq!(outcomes[0].error.as_deref(), Some("NO_DATA"));
    assert!(store.artifacts().is_empty());
}

#[tokio::test]
async fn empty_week_without_filter_is_empty_list() {
    let store = Arc::new(MemoryStore::new());
    let svc = service(&store, store.clone(), Arc::new(RecordingNotifier::default()));

    let outcomes = svc.run(&request(None), &CancelFlag::new()).await.unwrap();
    assert!(outcomes.is_empty());
}

#[tokio::test]
async fn brand_filter_selects_only_that_group() {
    let store = Arc::new(MemoryStore::new());
    two_brand_week(&store).await;
    let svc = service(&store, store.clone(), Arc::new(RecordingNotifier::default()));

    let outcomes = svc
        .run(&request(Some("교촌치킨")), &CancelFlag::new())
        .await
        .unwrap();

    assert_eq!(outcomes.len(), 1);
    assert!(outcomes[0].success);
    assert_eq!(outcomes[0].total_reviews, 1);
}

#[tokio::test]
async fn one_brand_failing_does_not_stop_the_rest() {
    let store = Arc::new(MemoryStore::new());
    two_brand_week(&store).await;
    let sink = Arc::new(SelectiveSink {
        inner: store.clone(),
        broken: "화락바베큐치킨".into(),
    });
    let svc = service(&store, sink, Arc::new(RecordingNotifier::default()));

    let outcomes = svc.run(&request(None), &CancelFlag::new()).await.unwrap();

    assert_eq!(outcomes.len(), 2);
    assert!(!outcomes[0].success);
    assert!(outcomes[0].error.as_deref().unwrap().contains("drive quota exceeded"));
    assert!(outcomes[0].artifact.is_none());
    assert!(outcomes[1].success);
    assert_eq!(store.artifacts().len(), 1);
}

#[tokio::test]
async fn subscribed_brands_are_notified() {
    let store = Arc::new(MemoryStore::new());
    two_brand_week(&store).await;
    subscribe(&store, "화락바베큐치킨", "https://hooks.example/a", true).await;
    subscribe(&store, "교촌치킨", "https://hooks.example/b", false).await;
    let notifier = Arc::new(RecordingNotifier::default());
    let svc = service(&store, store.clone(), notifier.clone());

    svc.run(&request(None), &CancelFlag::new()).await.unwrap();

    let sent = notifier.sent.lock();
    assert_eq!(sent.len(), 1, "disabled config is skipped");
    assert_eq!(sent[0].0, "https://hooks.example/a");
    assert_eq!(sent[0].1.brand_name, "화락바베큐치킨");
    assert_eq!(sent[0].1.total_reviews, 2);
}

#[tokio::test]
async fn cancellation_stops_between_brands() {
    let store = Arc::new(MemoryStore::new());
    two_brand_week(&store).await;
    subscribe(&store, "화락바베큐치킨", "https://hooks.example/a", true).await;
    let cancel = CancelFlag::new();
    let notifier = Arc::new(RecordingNotifier {
        sent: Mutex::default(),
        cancel_after_first: Some(cancel.clone()),
    });
    let svc = service(&store, store.clone(), notifier);

    let outcomes = svc.run(&request(None), &cancel).await.unwrap();

    assert_eq!(outcomes.len(), 1, "second brand never starts");
    assert!(outcomes[0].success);
}

#[tokio::test]
async fn already_cancelled_run_produces_nothing() {
    let store = Arc::new(MemoryStore::new());
    two_brand_week(&store).await;
    let cancel = CancelFlag::new();
    cancel.cancel();
    let svc = service(&store, store.clone(), Arc::new(RecordingNotifier::default()));

    let outcomes = svc.run(&request(None), &cancel).await.unwrap();
    assert!(outcomes.is_empty());
    assert!(store.artifacts().is_empty());
}

#[tokio::test]
async fn prior_week_across_month_boundary_feeds_comparison() {
    let store = Arc::new(MemoryStore::new());
    two_brand_week(&store).await;
    seed(&store, "p1", "화락바베큐치킨", "2024-12-31T20:00:00+09:00", 3, Sentiment::Neutral).await;
    let svc = service(&store, store.clone(), Arc::new(RecordingNotifier::default()));

    let outcomes = svc
        .run(&request(Some("화락바베큐치킨")), &CancelFlag::new())
        .await
        .unwrap();

    let artifact = outcomes[0].artifact.as_ref().unwrap();
    let overview = &store.artifact(&artifact.id).unwrap().sections[&0];
    let delta_row = overview
        .rows
        .iter()
        .find(|row| row.first().map(String::as_str) == Some("총 리뷰 수"))
        .unwrap();
    assert_eq!(delta_row[4], "+1건 (100%)");
}
