//! The weekly run: load, group, aggregate, assemble, notify; one brand at a time.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::{NaiveDate, Utc};
use revdoc_core::{ReviewRecord, WeekRange};
use revdoc_store::notifications::{find_for_brand, load_notification_configs};
use revdoc_store::reviews::list_done_in_week;
use revdoc_store::{retry_with_backoff, NotificationConfig, ReportSink, StoreError, TabularStore};

use crate::aggregate::aggregate_brand;
use crate::grouping::{group_by_brand, select_for_brand, BrandGroup};
use crate::notify::{Notifier, WeeklySummary};
use crate::report::ReportAssembler;
use crate::types::BrandReportOutcome;
use crate::WeeklyError;

pub const NO_DATA: &str = "NO_DATA";

#[derive(Debug, Clone)]
pub struct WeeklySettings {
    pub raw_table_prefix: String,
    pub registry_table: String,
    pub report_folder: String,
    pub store_max_retries: u32,
    pub store_retry_backoff_ms: u64,
}

impl Default for WeeklySettings {
    fn default() -> Self {
        Self {
            raw_table_prefix: "ReviewDoctor_Raw_".to_string(),
            registry_table: "ReviewDoctor_Registry".to_string(),
            report_folder: "WeeklyReports".to_string(),
            store_max_retries: 3,
            store_retry_backoff_ms: 500,
        }
    }
}

/// Which reports to build. `week` may be any date inside the target week;
/// `None` means the last completed week.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportRequest {
    pub brand: Option<String>,
    pub week: Option<NaiveDate>,
}

impl ReportRequest {
    #[must_use]
    pub fn week_range(&self) -> WeekRange {
        self.week
            .map_or_else(|| WeekRange::last_completed(Utc::now()), WeekRange::containing)
    }
}

/// Cooperative cancellation, checked between brands.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct WeeklyReportService {
    store: Arc<dyn TabularStore>,
    assembler: ReportAssembler,
    notifier: Arc<dyn Notifier>,
    settings: WeeklySettings,
}

impl std::fmt::Debug for WeeklyReportService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeeklyReportService")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl WeeklyReportService {
    #[must_use]
    pub fn new(
        store: Arc<dyn TabularStore>,
        sink: Arc<dyn ReportSink>,
        notifier: Arc<dyn Notifier>,
        settings: WeeklySettings,
    ) -> Self {
        Self {
            assembler: ReportAssembler::new(sink, settings.report_folder.clone()),
            store,
            notifier,
            settings,
        }
    }

    /// Build weekly reports for every brand with data, or only for
    /// `request.brand`.
    ///
    /// Brands are processed sequentially and each failure is isolated in its
    /// outcome. A brand filter with no data yields one `NO_DATA` outcome; no
    /// data at all without a filter yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns [`WeeklyError::Store`] if the target week's reviews cannot be
    /// loaded after retries.
    pub async fn run(
        &self,
        request: &ReportRequest,
        cancel: &CancelFlag,
    ) -> Result<Vec<BrandReportOutcome>, WeeklyError> {
        let started = Instant::now();
        let week = request.week_range();
        let label = week.label();

        tracing::info!(week = %label, brand = ?request.brand, "weekly: run started");

        let current = self.load_week(&week).await?;
        let groups = match request.brand.as_deref().map(str::trim) {
            Some(brand) => {
                let reviews = select_for_brand(&current, brand);
                if reviews.is_empty() {
                    tracing::warn!(brand, week = %label, "weekly: no reviews for brand");
                    return Ok(vec![BrandReportOutcome::failed(brand, &label, NO_DATA)]);
                }
                vec![BrandGroup {
                    brand: brand.to_string(),
                    reviews,
                }]
            }
            None => {
                if current.is_empty() {
                    tracing::warn!(week = %label, "weekly: no reviews for week");
                    return Ok(Vec::new());
                }
                group_by_brand(current)
            }
        };

        let prior = match self.load_week(&week.previous()).await {
            Ok(reviews) => reviews,
            Err(e) => {
                tracing::warn!(error = %e, "weekly: prior week unavailable, skipping comparison");
                Vec::new()
            }
        };
        let configs = self.load_notification_configs().await;

        tracing::info!(brands = groups.len(), "weekly: brands found");

        let mut outcomes = Vec::with_capacity(groups.len());
        for group in &groups {
            if cancel.is_cancelled() {
                tracing::warn!(
                    completed = outcomes.len(),
                    remaining = groups.len() - outcomes.len(),
                    "weekly: run cancelled"
                );
                break;
            }
            outcomes.push(self.report_brand(group, &prior, &week, &configs).await);
        }

        let succeeded = outcomes.iter().filter(|o| o.success).count();
        tracing::info!(
            week = %label,
            brands = outcomes.len(),
            succeeded,
            failed = outcomes.len() - succeeded,
            elapsed_ms = started.elapsed().as_millis(),
            "weekly: run completed"
        );
        Ok(outcomes)
    }

    async fn report_brand(
        &self,
        group: &BrandGroup,
        prior_all: &[ReviewRecord],
        week: &WeekRange,
        configs: &[NotificationConfig],
    ) -> BrandReportOutcome {
        let label = week.label();
        let prior = select_for_brand(prior_all, &group.brand);
        let agg = aggregate_brand(&group.brand, &label, &group.reviews, Some(prior.as_slice()));

        let artifact = match self.assembler.assemble(&agg, week).await {
            Ok(artifact) => artifact,
            Err(e) => {
                tracing::error!(brand = %group.brand, error = %e, "weekly: report failed");
                return BrandReportOutcome::failed(&group.brand, &label, e.to_string());
            }
        };

        if let Some(config) = find_for_brand(configs, &group.brand) {
            let summary = WeeklySummary::from(&agg);
            if let Err(e) = self.notifier.notify(config, &summary, &artifact).await {
                tracing::warn!(brand = %group.brand, error = %e, "weekly: notification failed");
            }
        }

        BrandReportOutcome {
            brand_name: group.brand.clone(),
            success: true,
            total_reviews: agg.total_reviews,
            week_label: label,
            artifact: Some(artifact),
            error: None,
        }
    }

    async fn load_week(&self, week: &WeekRange) -> Result<Vec<ReviewRecord>, StoreError> {
        let store = self.store.as_ref();
        let prefix = self.settings.raw_table_prefix.as_str();
        retry_with_backoff(
            self.settings.store_max_retries,
            self.settings.store_retry_backoff_ms,
            move || list_done_in_week(store, prefix, week),
        )
        .await
    }

    async fn load_notification_configs(&self) -> Vec<NotificationConfig> {
        let store = self.store.as_ref();
        let table = self.settings.registry_table.as_str();
        let loaded = retry_with_backoff(
            self.settings.store_max_retries,
            self.settings.store_retry_backoff_ms,
            move || load_notification_configs(store, table),
        )
        .await;
        match loaded {
            Ok(configs) => configs,
            Err(e) => {
                tracing::warn!(error = %e, "weekly: notification configs unavailable");
                Vec::new()
            }
        }
    }
}
