use std::time::Duration;

use chrono::Utc;
use tracing::{error, info};

use crate::config::ReminderConfig;
use crate::services::deadline::DeadlineService;
use crate::state::AppState;

/// Periodically remind students of deadlines inside the configured window.
///
/// Reminders are not de-duplicated, so every tick re-sends them.
pub async fn run_deadline_reminders(state: AppState, config: ReminderConfig) {
    info!(
        interval_secs = config.interval_secs,
        window_days = config.window_days,
        "Starting deadline reminder task"
    );

    let mut interval = tokio::time::interval(Duration::from_secs(config.interval_secs.max(1)));

    loop {
        interval.tick().await;

        if let Err(e) = remind_once(&state, config.window_days).await {
            error!(error = %e, "Deadline reminder pass failed");
        }
    }
}

async fn remind_once(state: &AppState, window_days: i64) -> anyhow::Result<()> {
    let sent = DeadlineService::new(state)
        .notify_approaching(Utc::now(), window_days)
        .await
        .map_err(|e| anyhow::anyhow!("{e:?}"))?;
    info!(sent, "Deadline reminder pass finished");
    Ok(())
}
