use anyhow::{anyhow, Context, Result};
use std::env;
use std::time::Duration;

const DEFAULT_WEBHOOK_PORT: u16 = 8080;
const DEFAULT_WEBHOOK_PATH: &str = "/webhook";
const DEFAULT_MAX_PDF_SIZE_MB: u64 = 20;
const DEFAULT_REPLY_CHUNK_DELAY_MS: u64 = 300;
const DEFAULT_SESSION_TTL_SECS: u64 = 3600;

#[derive(Debug, Clone)]
pub struct WebhookSettings {
    pub url: String,
    pub port: u16,
    pub path: String,
    pub secret_token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bot_token: String,
    pub bot_username: Option<String>,
    pub admin_chat_id: Option<i64>,
    pub webhook: Option<WebhookSettings>,
    pub max_pdf_size_bytes: u64,
    pub reply_chunk_delay_ms: u64,
    pub session_ttl: Duration,
    pub log_dir: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bot_token = get("TELEGRAM_BOT_TOKEN")
            .ok_or_else(|| anyhow!("TELEGRAM_BOT_TOKEN environment variable is required"))?;

        let bot_username = get("TELEGRAM_BOT_USERNAME")
            .map(|name| name.trim_start_matches('@').to_string());

        let admin_chat_id = get("ADMIN_CHAT_ID")
            .map(|raw| {
                raw.parse::<i64>()
                    .with_context(|| format!("ADMIN_CHAT_ID must be an integer, got {:?}", raw))
            })
            .transpose()?;

        let webhook = get("WEBHOOK_URL").map(|url| WebhookSettings {
            url,
            port: parse_or(get("WEBHOOK_PORT"), DEFAULT_WEBHOOK_PORT),
            path: get("WEBHOOK_PATH").unwrap_or_else(|| DEFAULT_WEBHOOK_PATH.to_string()),
            secret_token: get("WEBHOOK_SECRET_TOKEN"),
        });

        let max_pdf_size_bytes = parse_or(get("MAX_PDF_SIZE_MB"), DEFAULT_MAX_PDF_SIZE_MB)
            .checked_mul(1024 * 1024)
            .unwrap_or(DEFAULT_MAX_PDF_SIZE_MB * 1024 * 1024);

        Ok(Self {
            bot_token,
            bot_username,
            admin_chat_id,
            webhook,
            max_pdf_size_bytes,
            reply_chunk_delay_ms: parse_or(get("REPLY_CHUNK_DELAY_MS"), DEFAULT_REPLY_CHUNK_DELAY_MS),
            session_ttl: Duration::from_secs(parse_or(
                get("SESSION_TTL_SECS"),
                DEFAULT_SESSION_TTL_SECS,
            )),
            log_dir: get("LOG_DIR").unwrap_or_else(|| "logs".to_string()),
        })
    }
}

fn parse_or<T: std::str::FromStr>(raw: Option<String>, default: T) -> T {
    raw.and_then(|s| s.parse::<T>().ok()).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_token_is_required() {
        let err = config_from(&[]).unwrap_err();
        assert!(err.to_string().contains("TELEGRAM_BOT_TOKEN"));
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[("TELEGRAM_BOT_TOKEN", "123:abc")]).unwrap();
        assert_eq!(config.bot_token, "123:abc");
        assert!(config.admin_chat_id.is_none());
        assert!(config.webhook.is_none());
        assert_eq!(config.max_pdf_size_bytes, 20 * 1024 * 1024);
        assert_eq!(config.reply_chunk_delay_ms, 300);
        assert_eq!(config.session_ttl, Duration::from_secs(3600));
        assert_eq!(config.log_dir, "logs");
    }

    #[test]
    fn test_admin_chat_id() {
        let config = config_from(&[
            ("TELEGRAM_BOT_TOKEN", "t"),
            ("ADMIN_CHAT_ID", "-1001234567890"),
        ])
        .unwrap();
        assert_eq!(config.admin_chat_id, Some(-1001234567890));

        let config = config_from(&[("TELEGRAM_BOT_TOKEN", "t"), ("ADMIN_CHAT_ID", "  ")]).unwrap();
        assert!(config.admin_chat_id.is_none());

        let err = config_from(&[("TELEGRAM_BOT_TOKEN", "t"), ("ADMIN_CHAT_ID", "admin")]).unwrap_err();
        assert!(err.to_string().contains("ADMIN_CHAT_ID"));
    }

    #[test]
    fn test_webhook_settings() {
        let config = config_from(&[
            ("TELEGRAM_BOT_TOKEN", "t"),
            ("WEBHOOK_URL", "https://example.com/hook"),
            ("WEBHOOK_PORT", "not-a-port"),
            ("WEBHOOK_SECRET_TOKEN", "s3cret"),
        ])
        .unwrap();
        let webhook = config.webhook.unwrap();
        assert_eq!(webhook.url, "https://example.com/hook");
        assert_eq!(webhook.port, 8080);
        assert_eq!(webhook.path, "/webhook");
        assert_eq!(webhook.secret_token.as_deref(), Some("s3cret"));
    }

    #[test]
    fn test_oversized_pdf_limit_falls_back_to_default() {
        let config = config_from(&[
            ("TELEGRAM_BOT_TOKEN", "t"),
            ("MAX_PDF_SIZE_MB", "18446744073709551615"),
        ])
        .unwrap();
        assert_eq!(config.max_pdf_size_bytes, 20 * 1024 * 1024);

        let config = config_from(&[
            ("TELEGRAM_BOT_TOKEN", "t"),
            ("MAX_PDF_SIZE_MB", "17592186044415"),
        ])
        .unwrap();
        assert_eq!(config.max_pdf_size_bytes, 17592186044415 * 1024 * 1024);
    }

    #[test]
    fn test_bot_username_strips_at() {
        let config = config_from(&[
            ("TELEGRAM_BOT_TOKEN", "t"),
            ("TELEGRAM_BOT_USERNAME", "@PdfBot"),
            ("MAX_PDF_SIZE_MB", "5"),
        ])
        .unwrap();
        assert_eq!(config.bot_username.as_deref(), Some("PdfBot"));
        assert_eq!(config.max_pdf_size_bytes, 5 * 1024 * 1024);
    }
}
