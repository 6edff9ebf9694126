//! Recurring enrichment of `NEW` and `ERROR` review rows.

use std::sync::Arc;

use revdoc_core::kst;
use revdoc_ingest::EnrichmentBatch;
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use super::normalize_cron;

/// Register the enrichment batch job on `cron` (default every 5 minutes).
///
/// A tick that arrives while the previous batch is still running is skipped.
/// An invalid expression is logged and the job is not registered.
pub(super) async fn register_enrich_job(
    scheduler: &JobScheduler,
    cron: &str,
    batch: Arc<EnrichmentBatch>,
) -> Result<(), JobSchedulerError> {
    let cron = normalize_cron(cron);
    let running = Arc::new(Mutex::new(()));

    let job = Job::new_async_tz(cron.as_str(), kst(), move |_uuid, _lock| {
        let batch = Arc::clone(&batch);
        let running = Arc::clone(&running);

        Box::pin(async move {
            let Ok(_guard) = running.try_lock() else {
                tracing::debug!("scheduler: enrichment batch still running; skipping");
                return;
            };
            match batch.process_pending().await {
                Ok(summary) if summary.selected == 0 => {
                    tracing::debug!("scheduler: no pending reviews");
                }
                Ok(summary) => {
                    tracing::info!(
                        selected = summary.selected,
                        enriched = summary.enriched,
                        errored = summary.errored,
                        failed = summary.failed,
                        "scheduler: enrichment batch complete"
                    );
                }
                Err(e) => {
                    tracing::error!(error = %e, "scheduler: enrichment batch failed");
                }
            }
        })
    });

    let job = match job {
        Ok(job) => job,
        Err(e) => {
            tracing::error!(cron = %cron, error = %e, "scheduler: invalid enrichment cron; job not registered");
            return Ok(());
        }
    };

    scheduler.add(job).await?;
    tracing::info!(cron = %cron, "scheduler: registered enrichment job");
    Ok(())
}
