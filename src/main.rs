use anyhow::Result;
use pdfbot::{config::Config, polling, server, AppState};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::prelude::*;

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let config = Config::from_env()?;

    std::fs::create_dir_all(&config.log_dir)?;
    let file_appender = tracing_appender::rolling::daily(&config.log_dir, "pdfbot.log");
    let (non_blocking, _log_guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = tracing_subscriber::EnvFilter::from_default_env();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false),
        )
        .init();

    if config.admin_chat_id.is_none() {
        info!("ADMIN_CHAT_ID is not set, admin notifications are disabled");
    }

    let state = Arc::new(AppState::from_config(&config));
    spawn_session_sweeper(state.clone(), config.session_ttl);

    if let Some(webhook) = config.webhook {
        return server::start_webhook_server(state, webhook).await;
    }

    polling::run(state).await;
    Ok(())
}

fn spawn_session_sweeper(state: Arc<AppState>, ttl: Duration) {
    let ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::hours(1));
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            state.sessions.evict_idle(ttl);
        }
    });
}
