use crate::models::{Message, User};
use crate::session::Stage;
use crate::{utils, AppState};
use anyhow::Result;
use std::sync::Arc;
use tracing::info;

pub async fn handle_start(state: Arc<AppState>, message: &Message, from: &User) -> Result<()> {
    state.sessions.set_stage(from.id, Stage::AwaitingDocument);
    info!(user_id = from.id, chat_id = message.chat.id, "Session started");

    let greeting = format!(
        "Hi, {}! Send me a PDF document and I will extract its text.",
        utils::escape_html(&utils::display_name(from))
    );
    state
        .telegram
        .send_message(message.chat.id, Some(message.message_id), &greeting)
        .await?;

    Ok(())
}

pub async fn handle_cancel(state: Arc<AppState>, message: &Message, from: &User) -> Result<()> {
    let reply = if state.sessions.reset(from.id) {
        info!(user_id = from.id, "Session cancelled");
        "Session cleared. Send /start to begin again."
    } else {
        "Nothing to cancel."
    };

    state
        .telegram
        .send_message(message.chat.id, Some(message.message_id), reply)
        .await?;

    Ok(())
}

pub async fn handle_status(state: Arc<AppState>, message: &Message, from: &User) -> Result<()> {
    let reply = match state.sessions.get(from.id) {
        Some(session) => {
            let mut text = format!(
                "<b>Status:</b> {}\n<b>Documents processed:</b> {}",
                session.stage.describe(),
                session.documents_processed
            );
            if let Some(last) = &session.last_document {
                text.push_str(&format!("\n<b>Last document:</b> {}", utils::escape_html(last)));
            }
            text
        }
        None => "No active session. Send /start or just send a PDF.".to_string(),
    };

    state
        .telegram
        .send_message(message.chat.id, Some(message.message_id), &reply)
        .await?;

    Ok(())
}

pub async fn remind_to_send_pdf(state: Arc<AppState>, message: &Message) -> Result<()> {
    state
        .telegram
        .send_message(
            message.chat.id,
            Some(message.message_id),
            "I am waiting for a PDF document. Attach it as a file, or send /cancel.",
        )
        .await?;

    Ok(())
}
