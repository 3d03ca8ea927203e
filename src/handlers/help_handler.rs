use anyhow::Result;
use std::sync::Arc;
use crate::models::Message;
use crate::AppState;

pub const HELP_TEXT: &str = r#"<b>PDF Text Bot</b>

Send me a PDF document and I will reply with the text it contains.

<b>/start</b>
Start a session and get ready to send a PDF.

<b>/status</b>
Show what I am doing for you and how many documents you have sent.

<b>/cancel</b>
Forget your session.

Scanned documents without a text layer are not supported.

Use /help to show this message."#;

pub async fn handle_help(
    state: Arc<AppState>,
    message: &Message,
) -> Result<()> {
    state
        .telegram
        .send_message(message.chat.id, Some(message.message_id), HELP_TEXT)
        .await?;

    Ok(())
}
