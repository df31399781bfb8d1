//! Background job scheduler.
//!
//! Registers the nightly price reconciliation and the scheduled-article
//! publisher on the cron expressions from [`pressroom_core::AppConfig`].

mod publishing;

use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use crate::api::AppState;
use crate::jobs;

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive for
/// the lifetime of the process. Dropping it shuts down all scheduled jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// a cron expression is invalid, or the scheduler fails to start.
pub async fn build_scheduler(state: AppState) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    if state.config.shopify().is_some() {
        register_reconcile_job(&scheduler, state.clone()).await?;
    } else {
        tracing::info!("scheduler: Shopify not configured; price reconciliation disabled");
    }
    publishing::register_scheduled_publish_job(&scheduler, state).await?;

    scheduler.start().await?;
    Ok(scheduler)
}

/// Reconciles stored prices against the storefront feed and applies the
/// feed's prices.
async fn register_reconcile_job(
    scheduler: &JobScheduler,
    state: AppState,
) -> Result<(), JobSchedulerError> {
    let cron = state.config.reconcile_cron.clone();

    let job = Job::new_async(cron.as_str(), move |_uuid, _lock| {
        let state = state.clone();

        Box::pin(async move {
            tracing::info!("scheduler: starting price reconciliation");
            match jobs::reconcile(
                &state.pool,
                &state.storefront,
                &state.config,
                "scheduler",
                true,
            )
            .await
            {
                Ok(outcome) => tracing::info!(
                    checked = outcome.report.checked,
                    mismatches = outcome.report.mismatches.len(),
                    applied = outcome.applied,
                    "scheduler: price reconciliation complete"
                ),
                Err(e) => tracing::error!(error = %e, "scheduler: price reconciliation failed"),
            }
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(cron = %cron, "scheduler: registered price reconciliation");
    Ok(())
}
