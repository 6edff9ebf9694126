//! Background job scheduler.
//!
//! Registers the weekly report job and the enrichment batch job on a
//! [`JobScheduler`]. Cron expressions are evaluated in KST.

mod enrich;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use revdoc_core::{kst, AppConfig};
use revdoc_ingest::EnrichmentBatch;
use revdoc_weekly::{
    BrandReportOutcome, CancelFlag, ReportRequest, WeeklyError, WeeklyReportService,
};
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive for
/// the lifetime of the process. Dropping it shuts down all scheduled jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised or
/// started. An invalid cron expression only skips its job.
pub async fn build_scheduler(
    config: &AppConfig,
    coordinator: Arc<ScheduleCoordinator>,
    batch: Arc<EnrichmentBatch>,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    register_weekly_job(&scheduler, config, coordinator).await?;
    enrich::register_enrich_job(&scheduler, &config.enrich_cron, batch).await?;

    scheduler.start().await?;
    Ok(scheduler)
}

/// Accept 5-field cron by prepending a seconds field.
#[must_use]
pub fn normalize_cron(expr: &str) -> String {
    let expr = expr.trim();
    if expr.split_whitespace().count() == 5 {
        format!("0 {expr}")
    } else {
        expr.to_string()
    }
}

// ---------------------------------------------------------------------------
// Weekly reports
// ---------------------------------------------------------------------------

/// Runs weekly reports on schedule or on demand, one run at a time.
///
/// Each run gets its own [`CancelFlag`], so cancelling one run does not
/// affect the next. After [`shutdown`](Self::shutdown) every new run starts
/// cancelled.
#[derive(Debug)]
pub struct ScheduleCoordinator {
    service: WeeklyReportService,
    running: Mutex<()>,
    current: parking_lot::Mutex<CancelFlag>,
    shutting_down: AtomicBool,
}

impl ScheduleCoordinator {
    #[must_use]
    pub fn new(service: WeeklyReportService) -> Self {
        Self {
            service,
            running: Mutex::new(()),
            current: parking_lot::Mutex::new(CancelFlag::new()),
            shutting_down: AtomicBool::new(false),
        }
    }

    /// Scheduled run for every brand over the last completed week.
    ///
    /// Returns `None` without doing anything when a previous run still holds
    /// the lock.
    pub async fn run_scheduled(&self) -> Option<Result<Vec<BrandReportOutcome>, WeeklyError>> {
        let Ok(_guard) = self.running.try_lock() else {
            tracing::warn!("scheduler: weekly report still running; skipping this tick");
            return None;
        };
        let cancel = self.begin_run();
        Some(self.service.run(&ReportRequest::default(), &cancel).await)
    }

    /// On-demand run for a brand and/or a historical week. Waits for any
    /// run in progress.
    ///
    /// # Errors
    ///
    /// Returns [`WeeklyError`] if the week's reviews cannot be loaded.
    pub async fn trigger(
        &self,
        request: &ReportRequest,
    ) -> Result<Vec<BrandReportOutcome>, WeeklyError> {
        let _guard = self.running.lock().await;
        let cancel = self.begin_run();
        self.service.run(request, &cancel).await
    }

    /// Stop the run in progress at the next brand boundary.
    pub fn cancel(&self) {
        self.current.lock().cancel();
    }

    /// Stop the run in progress and make every later run stop immediately.
    pub fn shutdown(&self) {
        self.shutting_down.store(true, Ordering::SeqCst);
        self.cancel();
    }

    /// Install a fresh flag for the run about to start. Caller holds `running`.
    fn begin_run(&self) -> CancelFlag {
        let flag = CancelFlag::new();
        if self.shutting_down.load(Ordering::SeqCst) {
            flag.cancel();
        }
        *self.current.lock() = flag.clone();
        flag
    }
}

/// Build the weekly report job. Fails when `cron` does not parse.
fn weekly_job(cron: &str, coordinator: Arc<ScheduleCoordinator>) -> Result<Job, JobSchedulerError> {
    Job::new_async_tz(cron, kst(), move |_uuid, _lock| {
        let coordinator = Arc::clone(&coordinator);
        Box::pin(async move {
            tracing::info!("scheduler: starting weekly report run");
            match coordinator.run_scheduled().await {
                Some(Ok(outcomes)) => {
                    let failed = outcomes.iter().filter(|o| !o.success).count();
                    tracing::info!(
                        brands = outcomes.len(),
                        failed,
                        "scheduler: weekly report run complete"
                    );
                }
                Some(Err(e)) => {
                    tracing::error!(error = %e, "scheduler: weekly report run failed");
                }
                None => {}
            }
        })
    })
}

/// Register the weekly report job if enabled.
///
/// Returns whether the job was registered. A disabled schedule or an
/// invalid cron expression is logged and leaves the scheduler untouched.
async fn register_weekly_job(
    scheduler: &JobScheduler,
    config: &AppConfig,
    coordinator: Arc<ScheduleCoordinator>,
) -> Result<bool, JobSchedulerError> {
    if !config.weekly_report_enabled {
        tracing::info!("scheduler: weekly report disabled; skipping");
        return Ok(false);
    }

    let cron = normalize_cron(&config.weekly_report_cron);
    let job = match weekly_job(&cron, coordinator) {
        Ok(job) => job,
        Err(e) => {
            tracing::error!(cron = %cron, error = %e, "scheduler: invalid weekly report cron; job not registered");
            return Ok(false);
        }
    };

    scheduler.add(job).await?;
    tracing::info!(cron = %cron, "scheduler: registered weekly report job");
    Ok(true)
}

#[cfg(test)]
#[path = "scheduler_test.rs"]
mod tests;
