//! Webhook micro-server: Telegram POSTs updates here and each one is handled on its own task.

use crate::config::WebhookSettings;
use crate::models::Update;
use crate::{handlers, AppState};
use anyhow::{Context, Result};
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

const SECRET_TOKEN_HEADER: &str = "X-Telegram-Bot-Api-Secret-Token";

/// Registers the webhook with Telegram and serves until Ctrl-C or SIGTERM.
pub async fn start_webhook_server(state: Arc<AppState>, settings: WebhookSettings) -> Result<()> {
    state
        .telegram
        .set_webhook(&settings.url, settings.secret_token.as_deref())
        .await
        .context("Failed to set webhook")?;
    info!(webhook_url = %settings.url, "Webhook registered");

    let addr = SocketAddr::from(([0, 0, 0, 0], settings.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!(%addr, path = settings.path.as_str(), "Listening for updates");

    let app = create_router(state.clone(), &settings);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            wait_for_shutdown().await;
            unregister_webhook(&state).await;
        })
        .await
        .context("Webhook server failed")
}

/// Update route at `settings.path`, `/health`, secret-token check and request tracing.
pub fn create_router(state: Arc<AppState>, settings: &WebhookSettings) -> Router {
    let secret_token = Arc::new(settings.secret_token.clone());

    Router::new()
        .route(&settings.path, post(receive_update))
        .route("/health", get(health).post(health))
        .layer(middleware::from_fn_with_state(secret_token, check_secret_token))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn check_secret_token(
    State(expected): State<Arc<Option<String>>>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(expected) = expected.as_deref() else {
        return Ok(next.run(request).await);
    };

    let provided = request
        .headers()
        .get(SECRET_TOKEN_HEADER)
        .ok_or(StatusCode::UNAUTHORIZED)?
        .to_str()
        .map_err(|_| StatusCode::BAD_REQUEST)?;

    if provided != expected {
        warn!("Rejected update with a wrong secret token");
        return Err(StatusCode::UNAUTHORIZED);
    }

    Ok(next.run(request).await)
}

async fn receive_update(State(state): State<Arc<AppState>>, Json(update): Json<Update>) -> StatusCode {
    let update_id = update.update_id;
    tokio::spawn(async move {
        if let Err(err) = handlers::process_update(state, update).await {
            error!(update_id, "Failed to process update: {err:?}");
        }
    });

    StatusCode::OK
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn wait_for_shutdown() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {err:?}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                error!("Failed to install SIGTERM handler: {err:?}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}

async fn unregister_webhook(state: &AppState) {
    match state.telegram.delete_webhook().await {
        Ok(()) => info!("Webhook deleted"),
        Err(err) => warn!("Failed to delete webhook during shutdown: {err:?}"),
    }
}
