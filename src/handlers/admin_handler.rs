use crate::models::Message;
use crate::AppState;
use anyhow::Result;
use std::sync::Arc;
use tracing::warn;

/// Best-effort message to the admin chat. Failures are logged, never returned.
pub async fn notify_admin(state: &AppState, text: &str) {
    let Some(admin_chat_id) = state.admin_chat_id else {
        return;
    };

    if let Err(err) = state.telegram.send_message(admin_chat_id, None, text).await {
        warn!(admin_chat_id, "Failed to notify admin: {err:?}");
    }
}

pub async fn handle_stats(state: Arc<AppState>, message: &Message) -> Result<()> {
    let text = format!("<b>Active sessions:</b> {}", state.sessions.len());
    state
        .telegram
        .send_message(message.chat.id, Some(message.message_id), &text)
        .await?;

    Ok(())
}
