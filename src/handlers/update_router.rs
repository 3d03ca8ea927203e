use super::{admin_handler, document_handler, help_handler, session_handler};
use crate::models::Update;
use crate::session::Stage;
use crate::AppState;
use anyhow::Result;
use std::sync::Arc;
use tracing::debug;

fn strip_bot_suffix<'a>(text: &'a str, bot_username: Option<&str>) -> &'a str {
    let trimmed = text.trim();
    if let (Some(at_pos), Some(bot_username)) = (trimmed.find('@'), bot_username) {
        let suffix = &trimmed[at_pos + 1..];
        if suffix.eq_ignore_ascii_case(bot_username) {
            return &trimmed[..at_pos];
        }
    }
    trimmed
}

/// Returns the lowercased command of a `/command@bot args` message.
fn parse_command(text: &str, bot_username: Option<&str>) -> Option<String> {
    let first = text.split_whitespace().next()?;
    if !first.starts_with('/') {
        return None;
    }
    Some(strip_bot_suffix(first, bot_username).to_ascii_lowercase())
}

pub async fn process_update(state: Arc<AppState>, update: Update) -> Result<()> {
    let Some(message) = update.message else {
        return Ok(());
    };
    let Some(from) = &message.from else {
        return Ok(());
    };

    if from.is_bot {
        return Ok(());
    }

    if let Some(document) = &message.document {
        document_handler::handle_document(state, &message, from, document).await?;
        return Ok(());
    }

    let Some(text) = &message.text else {
        return Ok(());
    };

    match parse_command(text, state.bot_username.as_deref()).as_deref() {
        Some("/start") => session_handler::handle_start(state, &message, from).await?,
        Some("/help") => help_handler::handle_help(state, &message).await?,
        Some("/cancel") => session_handler::handle_cancel(state, &message, from).await?,
        Some("/status") => session_handler::handle_status(state, &message, from).await?,
        Some("/stats") if state.admin_chat_id == Some(message.chat.id) => {
            admin_handler::handle_stats(state, &message).await?
        }
        _ => {
            let awaiting = state
                .sessions
                .get(from.id)
                .is_some_and(|session| session.stage == Stage::AwaitingDocument);
            if awaiting {
                session_handler::remind_to_send_pdf(state, &message).await?;
            } else {
                debug!(chat_id = message.chat.id, "Ignoring text message");
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_bot_suffix() {
        assert_eq!(strip_bot_suffix("/status@pdfbot", Some("pdfbot")), "/status");
        assert_eq!(strip_bot_suffix("/status@PDFBOT", Some("pdfbot")), "/status");
        assert_eq!(strip_bot_suffix("/status", Some("pdfbot")), "/status");
        assert_eq!(strip_bot_suffix("/status@otherbot", Some("pdfbot")), "/status@otherbot");
        assert_eq!(strip_bot_suffix("/status@pdfbot", None), "/status@pdfbot");
    }

    #[test]
    fn test_parse_command() {
        assert_eq!(parse_command("/start", None).as_deref(), Some("/start"));
        assert_eq!(parse_command("  /HELP@PdfBot  ", Some("pdfbot")).as_deref(), Some("/help"));
        assert_eq!(parse_command("/cancel now please", None).as_deref(), Some("/cancel"));
        assert_eq!(parse_command("/start@otherbot", Some("pdfbot")).as_deref(), Some("/start@otherbot"));
        assert_eq!(parse_command("hello /start", None), None);
        assert_eq!(parse_command("   ", None), None);
    }
}
