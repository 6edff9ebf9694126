//! `report` command handler.

use std::sync::Arc;

use chrono::NaiveDate;
use revdoc_core::AppConfig;
use revdoc_store::{ReportSink, TabularStore};
use revdoc_weekly::{
    BrandReportOutcome, CancelFlag, LogNotifier, ReportRequest, WeeklyReportService,
    WeeklySettings,
};

pub(crate) fn format_outcome(outcome: &BrandReportOutcome) -> String {
    let detail = match (&outcome.artifact, &outcome.error) {
        (Some(artifact), _) => artifact.location.clone(),
        (None, Some(error)) => format!("error: {error}"),
        (None, None) => String::new(),
    };
    format!(
        "{:<24}{:<6}{:>8}  {detail}",
        outcome.brand_name,
        if outcome.success { "ok" } else { "FAIL" },
        outcome.total_reviews
    )
}

/// Build weekly reports and print one line per brand.
///
/// Ctrl-C stops the run after the brand in progress.
///
/// # Errors
///
/// Returns an error if the week's reviews cannot be loaded.
pub(crate) async fn run_report(
    config: &AppConfig,
    store: Arc<dyn TabularStore>,
    sink: Arc<dyn ReportSink>,
    brand: Option<String>,
    week: Option<NaiveDate>,
) -> anyhow::Result<()> {
    let service = WeeklyReportService::new(
        store,
        sink,
        Arc::new(LogNotifier),
        WeeklySettings {
            raw_table_prefix: config.raw_table_prefix.clone(),
            registry_table: config.registry_table.clone(),
            report_folder: config.report_folder.clone(),
            store_max_retries: config.store_max_retries,
            store_retry_backoff_ms: config.store_retry_backoff_ms,
        },
    );
    let request = ReportRequest { brand, week };

    let cancel = CancelFlag::new();
    let on_interrupt = cancel.clone();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted; stopping after the current brand");
            on_interrupt.cancel();
        }
    });

    let outcomes = service.run(&request, &cancel).await;
    interrupt.abort();
    let outcomes = outcomes?;

    let label = request.week_range().label();
    if outcomes.is_empty() {
        println!("no enriched reviews for week {label}");
        return Ok(());
    }

    println!("week {label}");
    println!("{:<24}{:<6}{:>8}  ARTIFACT", "BRAND", "STATUS", "REVIEWS");
    for outcome in &outcomes {
        println!("{}", format_outcome(outcome));
    }
    let failed = outcomes.iter().filter(|o| !o.success).count();
    println!("{} brands, {failed} failed", outcomes.len());
    Ok(())
}
