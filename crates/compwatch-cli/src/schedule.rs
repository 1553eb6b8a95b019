//! Recurring pipeline runs.
//!
//! Registers one cron job that runs the full pipeline and keeps the process
//! alive until Ctrl-C. A failed run is logged and the next tick runs again.

use std::sync::Arc;

use compwatch_core::AppConfig;
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use crate::pipeline::{run_pipeline, StageName};
use crate::stages::LiveStages;

/// Builds the scheduler with the pipeline job registered and started.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if `cron` is not a valid six-field
/// expression or the scheduler cannot start.
pub(crate) async fn build_scheduler(
    config: Arc<AppConfig>,
    cron: &str,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;
    // Ticks that fire while a run is still going are skipped.
    let in_flight = Arc::new(Mutex::new(()));

    let job = Job::new_async(cron, move |_uuid, _lock| {
        let config = Arc::clone(&config);
        let in_flight = Arc::clone(&in_flight);

        Box::pin(async move {
            let Ok(_running) = in_flight.try_lock() else {
                tracing::warn!("scheduler: previous run still in progress; skipping tick");
                return;
            };
            tracing::info!("scheduler: starting pipeline run");
            let stages = LiveStages::new(&config);
            let result = run_pipeline(&stages, &StageName::ALL, &[]).await;
            tracing::info!(
                run_id = %result.run_id,
                state = %result.state,
                "scheduler: pipeline run finished"
            );
        })
    })?;

    scheduler.add(job).await?;
    scheduler.start().await?;
    Ok(scheduler)
}

/// Runs the pipeline on `cron` until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the scheduler cannot be built or shut down, or if the
/// Ctrl-C handler cannot be installed.
pub(crate) async fn run_scheduled(config: AppConfig, cron: &str) -> anyhow::Result<()> {
    let mut scheduler = build_scheduler(Arc::new(config), cron).await?;
    tracing::info!(cron, "scheduler started; press Ctrl-C to stop");

    tokio::signal::ctrl_c().await?;
    tracing::info!("received shutdown signal, stopping scheduler");
    scheduler.shutdown().await?;
    Ok(())
}
