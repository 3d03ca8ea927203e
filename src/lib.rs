pub mod api;
pub mod config;
pub mod handlers;
pub mod models;
pub mod pdf;
pub mod polling;
pub mod server;
pub mod session;
pub mod utils;

use session::SessionStore;

#[derive(Clone)]
pub struct AppState {
    pub telegram: api::TelegramApi,
    pub bot_username: Option<String>,
    pub admin_chat_id: Option<i64>,
    pub sessions: SessionStore,
    pub max_pdf_size_bytes: u64,
    pub reply_chunk_delay_ms: u64,
}

impl AppState {
    pub fn from_config(config: &config::Config) -> Self {
        Self {
            telegram: api::TelegramApi::new(config.bot_token.clone()),
            bot_username: config.bot_username.clone(),
            admin_chat_id: config.admin_chat_id,
            sessions: SessionStore::new(),
            max_pdf_size_bytes: config.max_pdf_size_bytes,
            reply_chunk_delay_ms: config.reply_chunk_delay_ms,
        }
    }
}
