//! Scheduled background tasks using tokio-cron-scheduler.
//!
//! Periodic housekeeping that runs for the lifetime of the process:
//! - Hourly sweep of the background job registry (entries older than the
//!   retention window are dropped regardless of status)
//! - Hourly prune of the expired keyword cache entries

use anyhow::Result;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::domains::seo::DashboardState;
use crate::kernel::jobs::JobRegistry;

/// How long finished (or abandoned) job entries stay queryable.
const JOB_RETENTION_HOURS: i64 = 1;

/// Start all scheduled tasks
pub async fn start_scheduler(
    jobs: JobRegistry,
    dashboard: std::sync::Arc<DashboardState>,
) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    // Housekeeping task - runs every hour
    let sweep_job = Job::new_async("0 0 * * * *", move |_uuid, _lock| {
        let jobs = jobs.clone();
        let dashboard = dashboard.clone();
        Box::pin(async move {
            let removed = jobs.sweep(chrono::Duration::hours(JOB_RETENTION_HOURS));
            if removed > 0 {
                tracing::info!(removed, "Swept expired background jobs");
            }

            let pruned = dashboard.prune_cache();
            if pruned > 0 {
                tracing::info!(pruned, "Pruned expired keyword cache entries");
            }
        })
    })?;

    scheduler.add(sweep_job).await?;
    scheduler.start().await?;

    tracing::info!("Scheduled tasks started (job sweep + cache prune every hour)");
    Ok(scheduler)
}
