use chrono::Utc;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use crate::api::AppState;
use crate::jobs;

/// Articles handled per tick. Anything left over is picked up next tick.
const DUE_BATCH_SIZE: i64 = 20;

/// Publishes `scheduled` articles whose `scheduled_for` has passed.
pub(super) async fn register_scheduled_publish_job(
    scheduler: &JobScheduler,
    state: AppState,
) -> Result<(), JobSchedulerError> {
    let cron = state.config.scheduled_publish_cron.clone();

    let job = Job::new_async(cron.as_str(), move |_uuid, _lock| {
        let state = state.clone();

        Box::pin(async move {
            publish_due_articles(&state).await;
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(cron = %cron, "scheduler: registered scheduled publishing");
    Ok(())
}

async fn publish_due_articles(state: &AppState) {
    let now = Utc::now();
    let due = match pressroom_db::list_due_scheduled_articles(&state.pool, now, DUE_BATCH_SIZE).await
    {
        Ok(rows) => rows,
        Err(e) => {
            tracing::error!(error = %e, "scheduler: failed to load due articles");
            return;
        }
    };
    if due.is_empty() {
        return;
    }

    let platforms = state.publisher.configured_platforms();
    if platforms.is_empty() {
        tracing::warn!(
            due = due.len(),
            "scheduler: articles are due but no platforms are configured; skipping"
        );
        return;
    }

    for article in &due {
        // A failure everywhere leaves the article scheduled for the next tick.
        let result =
            jobs::publish_article(&state.pool, &state.publisher, article, &platforms, false).await;
        match result {
            Ok(results) => {
                let succeeded = results.iter().filter(|r| r.succeeded()).count();
                tracing::info!(
                    article = %article.public_id,
                    succeeded,
                    failed = results.len() - succeeded,
                    "scheduler: published scheduled article"
                );
            }
            Err(e) => tracing::error!(
                article = %article.public_id,
                error = %e,
                "scheduler: failed to record scheduled publish"
            ),
        }
    }
}
