use super::admin_handler::notify_admin;
use crate::models::{Document, Message, User};
use crate::pdf::{self, TextStats};
use crate::{utils, AppState};
use anyhow::{anyhow, Result};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Telegram rejects message texts longer than 4096 characters.
const MAX_MESSAGE_CHARS: usize = 4096;

pub async fn handle_document(
    state: Arc<AppState>,
    message: &Message,
    from: &User,
    document: &Document,
) -> Result<()> {
    let chat_id = message.chat.id;
    let file_name = document
        .file_name
        .clone()
        .unwrap_or_else(|| "document.pdf".to_string());

    if !document.looks_like_pdf() {
        state
            .telegram
            .send_message(
                chat_id,
                Some(message.message_id),
                "Sorry, only PDF documents are supported.",
            )
            .await?;
        return Ok(());
    }

    if let Some(size) = document.file_size {
        if size > state.max_pdf_size_bytes {
            let reply = format!(
                "This file is too large ({} MB). The limit is {} MB.",
                size.div_ceil(1024 * 1024),
                state.max_pdf_size_bytes / 1024 / 1024
            );
            state
                .telegram
                .send_message(chat_id, Some(message.message_id), &reply)
                .await?;
            return Ok(());
        }
    }

    if !state.sessions.try_begin_processing(from.id) {
        state
            .telegram
            .send_message(
                chat_id,
                Some(message.message_id),
                "I am still working on your previous document. Please wait.",
            )
            .await?;
        return Ok(());
    }

    info!(
        user_id = from.id,
        chat_id,
        file_name = file_name.as_str(),
        file_size = document.file_size,
        "Processing PDF"
    );

    let outcome = fetch_and_extract(&state, chat_id, document).await;
    state
        .sessions
        .finish_processing(from.id, Some(&file_name), outcome.is_ok());

    let who = utils::escape_html(&utils::display_name(from));
    let escaped_name = utils::escape_html(&file_name);

    match outcome {
        Ok(text) => {
            let stats = TextStats::of(&text);
            info!(
                user_id = from.id,
                chars = stats.chars,
                words = stats.words,
                "PDF text extracted"
            );

            let reply_result = send_text(&state, message, &escaped_name, &text, stats).await;

            notify_admin(
                &state,
                &format!(
                    "📄 {} (<code>{}</code>) sent <b>{}</b>\n✅ {}",
                    who,
                    from.id,
                    escaped_name,
                    stats.summary()
                ),
            )
            .await;

            reply_result
        }
        Err(err) => {
            error!(user_id = from.id, file_name = file_name.as_str(), "PDF processing failed: {err:?}");

            let reply_result = state
                .telegram
                .send_message(
                    chat_id,
                    Some(message.message_id),
                    &format!(
                        "Could not read this PDF: {}",
                        utils::escape_html(&err.to_string())
                    ),
                )
                .await
                .map(|_| ());

            notify_admin(
                &state,
                &format!(
                    "📄 {} (<code>{}</code>) sent <b>{}</b>\n❌ {}",
                    who,
                    from.id,
                    escaped_name,
                    utils::escape_html(&format!("{err:#}"))
                ),
            )
            .await;

            reply_result
        }
    }
}

async fn fetch_and_extract(state: &AppState, chat_id: i64, document: &Document) -> Result<String> {
    if let Err(err) = state.telegram.send_chat_action(chat_id, "typing").await {
        warn!(chat_id, "Failed to send chat action: {err:?}");
    }

    let file = state.telegram.get_file(&document.file_id).await?;
    let file_path = file
        .file_path
        .ok_or_else(|| anyhow!("Telegram did not provide a download path for this file"))?;

    let bytes = state.telegram.download_file(&file_path).await?;
    if bytes.len() as u64 > state.max_pdf_size_bytes {
        return Err(anyhow!("Downloaded file exceeds the size limit"));
    }

    pdf::extract_text(bytes).await
}

/// HTML-escaped reply chunks, each within Telegram's message limit after escaping.
fn reply_chunks(text: &str) -> Vec<String> {
    utils::split_message_by(text, MAX_MESSAGE_CHARS, utils::escaped_len)
        .iter()
        .map(|chunk| utils::escape_html(chunk))
        .collect()
}

async fn send_text(
    state: &AppState,
    message: &Message,
    escaped_name: &str,
    text: &str,
    stats: TextStats,
) -> Result<()> {
    let chat_id = message.chat.id;
    let header = format!("<b>{}</b>\n{}", escaped_name, stats.summary());
    state
        .telegram
        .send_message(chat_id, Some(message.message_id), &header)
        .await?;

    for chunk in reply_chunks(text) {
        utils::delay(state.reply_chunk_delay_ms).await;
        state.telegram.send_message(chat_id, None, &chunk).await?;
    }

    Ok(())
}
