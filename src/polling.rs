//! Long-polling mode, used when no webhook URL is configured.

use crate::{handlers, utils, AppState};
use anyhow::Result;
use std::sync::Arc;
use tracing::{error, info};

const POLL_TIMEOUT_SECS: i32 = 30;
const RETRY_DELAY_MS: u64 = 5_000;

pub async fn run(state: Arc<AppState>) {
    info!("Bot started. Waiting for updates...");

    let mut offset: Option<i64> = None;
    loop {
        match poll_once(&state, offset, POLL_TIMEOUT_SECS).await {
            Ok(next) => offset = next,
            Err(err) => {
                error!("Error getting updates: {err:?}");
                utils::delay(RETRY_DELAY_MS).await;
            }
        }
    }
}

/// Fetches one batch, hands every update to its own task and returns the next offset.
pub async fn poll_once(state: &Arc<AppState>, offset: Option<i64>, timeout: i32) -> Result<Option<i64>> {
    let updates = state.telegram.get_updates(offset, timeout).await?;

    let mut next = offset;
    for update in updates {
        next = Some(update.update_id + 1);

        let state = state.clone();
        tokio::spawn(async move {
            let update_id = update.update_id;
            if let Err(err) = handlers::process_update(state, update).await {
                error!(update_id, "Failed to process update: {err:?}");
            }
        });
    }

    Ok(next)
}
