use crate::models::User;
use std::time::Duration;

/// Completes once `ms` milliseconds have elapsed.
pub async fn delay(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

pub fn display_name(user: &User) -> String {
    if let Some(username) = &user.username {
        format!("@{}", username)
    } else if let Some(first) = &user.first_name {
        first.clone()
    } else {
        format!("user{}", user.id)
    }
}

/// Length of `ch` once passed through `escape_html`.
pub fn escaped_len(ch: char) -> usize {
    match ch {
        '&' => 5,
        '<' | '>' => 4,
        _ => 1,
    }
}

/// Splits `text` into chunks of at most `limit` chars, preferring newline then space boundaries.
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    split_message_by(text, limit, |_| 1)
}

/// Like `split_message`, but a chunk's size is the sum of `cost` over its chars.
/// A single char costing more than `limit` still becomes its own chunk.
pub fn split_message_by<F>(text: &str, limit: usize, cost: F) -> Vec<String>
where
    F: Fn(char) -> usize,
{
    let limit = limit.max(1);
    let mut chunks = Vec::new();
    let mut rest = text;

    while !rest.is_empty() {
        let mut used = 0usize;
        let mut window_end = rest.len();
        for (idx, ch) in rest.char_indices() {
            used += cost(ch);
            if used > limit {
                window_end = if idx == 0 { ch.len_utf8() } else { idx };
                break;
            }
        }

        if window_end == rest.len() {
            chunks.push(rest.to_string());
            break;
        }

        let window = &rest[..window_end];
        let split_at = window
            .rfind('\n')
            .filter(|&idx| idx > 0)
            .or_else(|| window.rfind(' ').filter(|&idx| idx > 0))
            .unwrap_or(window_end);

        let (head, tail) = rest.split_at(split_at);
        chunks.push(head.to_string());
        rest = tail.strip_prefix(['\n', ' ']).unwrap_or(tail);
    }

    chunks
}
