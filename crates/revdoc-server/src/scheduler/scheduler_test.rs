use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use revdoc_core::{parse_timestamp, Environment, ReviewRecord, ReviewStatus, Sentiment};
use revdoc_store::naming::raw_table_for;
use revdoc_store::reviews::append_review;
use revdoc_store::{MemoryStore, ReportSink, TabularStore};
use revdoc_weekly::{LogNotifier, WeeklySettings};

use super::*;

fn coordinator() -> ScheduleCoordinator {
    coordinator_with(Arc::new(MemoryStore::new()))
}

fn coordinator_with(store: Arc<MemoryStore>) -> ScheduleCoordinator {
    let tabular: Arc<dyn TabularStore> = store.clone();
    let sink: Arc<dyn ReportSink> = store;
    let settings = WeeklySettings {
        store_max_retries: 0,
        ..WeeklySettings::default()
    };
    ScheduleCoordinator::new(WeeklyReportService::new(
        tabular,
        sink,
        Arc::new(LogNotifier),
        settings,
    ))
}

fn config(weekly_report_enabled: bool, weekly_report_cron: &str) -> AppConfig {
    AppConfig {
        env: Environment::Test,
        log_level: "info".into(),
        data_dir: PathBuf::from("data"),
        raw_table_prefix: "ReviewDoctor_Raw_".into(),
        registry_table: "ReviewDoctor_Registry".into(),
        report_folder: "WeeklyReports".into(),
        brand_seeds_path: None,
        dedup_cache_capacity: 100,
        dedup_cache_ttl_secs: 60,
        dup_check_lookback_rows: 2_000,
        enrich_batch_size: 10,
        enrich_max_attempts: 3,
        enrich_cron: "*/5 * * * *".into(),
        weekly_report_enabled,
        weekly_report_cron: weekly_report_cron.into(),
        store_max_retries: 0,
        store_retry_backoff_ms: 0,
    }
}

#[test]
fn five_field_cron_gets_seconds() {
    assert_eq!(normalize_cron("0 9 * * Mon"), "0 0 9 * * Mon");
    assert_eq!(normalize_cron(" 0 */5 * * * * "), "0 */5 * * * *");
}

#[test]
fn six_field_cron_is_unchanged() {
    assert_eq!(normalize_cron("0 0 9 * * Mon"), "0 0 9 * * Mon");
}

#[tokio::test]
async fn valid_cron_builds_job() {
    let job = weekly_job(&normalize_cron("0 9 * * Mon"), Arc::new(coordinator()));
    assert!(job.is_ok());
}

#[tokio::test]
async fn invalid_cron_is_rejected_before_activation() {
    let job = weekly_job("every monday please", Arc::new(coordinator()));
    assert!(job.is_err());
}

#[tokio::test]
async fn overlapping_scheduled_run_is_skipped() {
    let coordinator = coordinator();
    let guard = coordinator.running.lock().await;
    assert!(coordinator.run_scheduled().await.is_none());
    drop(guard);

    let outcomes = coordinator
        .run_scheduled()
        .await
        .expect("lock is free")
        .expect("empty store loads");
    assert!(outcomes.is_empty());
}

#[tokio::test]
async fn trigger_reports_missing_brand() {
    let coordinator = coordinator();
    let request = ReportRequest {
        brand: Some("교촌치킨".into()),
        week: NaiveDate::from_ymd_opt(2025, 1, 8),
    };
    let outcomes = coordinator.trigger(&request).await.unwrap();
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].error.as_deref(), Some("NO_DATA"));
}

#[tokio::test]
async fn disabled_weekly_schedule_registers_nothing() {
    let scheduler = JobScheduler::new().await.unwrap();
    let registered = register_weekly_job(
        &scheduler,
        &config(false, "0 9 * * Mon"),
        Arc::new(coordinator()),
    )
    .await
    .unwrap();
    assert!(!registered);
}

#[tokio::test]
async fn invalid_weekly_cron_is_skipped_without_error() {
    let scheduler = JobScheduler::new().await.unwrap();
    let registered = register_weekly_job(
        &scheduler,
        &config(true, "every monday please"),
        Arc::new(coordinator()),
    )
    .await
    .unwrap();
    assert!(!registered);
}

#[tokio::test]
async fn enabled_weekly_schedule_is_registered() {
    let scheduler = JobScheduler::new().await.unwrap();
    let registered = register_weekly_job(
        &scheduler,
        &config(true, "0 9 * * Mon"),
        Arc::new(coordinator()),
    )
    .await
    .unwrap();
    assert!(registered);
}

async fn seed_done_review(store: &MemoryStore) {
    let ts = parse_timestamp("2025-01-07T12:00:00+09:00").expect("valid timestamp");
    let record = ReviewRecord {
        received_at: Some(ts),
        review_created_at: String::new(),
        brand_name: "교촌치킨".into(),
        store_name: "원주점".into(),
        platform: "배달의민족".into(),
        rating: 5.0,
        review_id: "k1".into(),
        review_text: "바삭해요".into(),
        status: ReviewStatus::Done,
        sentiment: Some(Sentiment::Positive),
        summary: String::new(),
        keywords: vec!["바삭".into()],
        processed_at: None,
        attempts: 0,
        review_url: String::new(),
        image_url: String::new(),
    };
    let prefix = WeeklySettings::default().raw_table_prefix;
    append_review(store, &raw_table_for(&prefix, &ts), &record)
        .await
        .expect("append");
}

#[tokio::test]
async fn cancel_only_affects_the_run_in_progress() {
    let store = Arc::new(MemoryStore::new());
    seed_done_review(&store).await;
    let coordinator = coordinator_with(store);
    let request = ReportRequest {
        brand: None,
        week: NaiveDate::from_ymd_opt(2025, 1, 8),
    };

    coordinator.cancel();
    let outcomes = coordinator.trigger(&request).await.unwrap();
    assert_eq!(outcomes.len(), 1, "a fresh run ignores an earlier cancel");
    assert_eq!(outcomes[0].brand_name, "교촌치킨");

    coordinator.shutdown();
    let outcomes = coordinator.trigger(&request).await.unwrap();
    assert!(outcomes.is_empty(), "runs after shutdown stop before the first brand");
}
