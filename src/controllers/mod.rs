pub mod admin;
pub mod events;
pub mod registrations;

use axum::{extract::State, http::StatusCode, Router};
use std::sync::Arc;

pub fn routes() -> Router<Arc<crate::AppState>> {
    Router::new()
        .merge(events::routes())
        .merge(registrations::routes())
        .merge(admin::routes())
}

// GET /health - отвечает ли хранилище
pub async fn health(State(state): State<Arc<crate::AppState>>) -> (StatusCode, &'static str) {
    match state.store.ping().await {
        Ok(()) => (StatusCode::OK, "OK"),
        Err(e) => {
            tracing::error!("{} storage health check failed: {:?}", state.store.backend(), e);
            (StatusCode::SERVICE_UNAVAILABLE, "UNAVAILABLE")
        }
    }
}
