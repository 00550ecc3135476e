//! Route definitions and router construction.

use crate::bot::{handlers, AppState};
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

/// Build the webhook router with all endpoints and request tracing
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/webhook", post(handlers::whatsapp_webhook))
        .route("/reminder-response", post(handlers::reminder_response))
        .route("/health", get(handlers::health))
        .route("/briefing-trigger", post(handlers::briefing_trigger))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
