use axum::{extract::State, response::IntoResponse, routing::post, Json, Router};
use serde::Deserialize;
use std::sync::Arc;

use crate::error::ApiError;
use crate::extract::JsonBody;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/admin/login", post(login))
}

// POST /api/admin/login
#[derive(Debug, Deserialize)]
struct LoginRequest {
    username: String,
    password: String,
}

async fn login(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let admin = &state.config.admin;
    let (Some(username), Some(password)) = (admin.username.as_deref(), admin.password.as_deref()) else {
        tracing::error!("ADMIN_USERNAME / ADMIN_PASSWORD are not configured");
        return Err(ApiError::internal("Admin credentials are not configured"));
    };

    if req.username == username && req.password == password {
        tracing::info!("Admin login for {}", req.username);
        Ok(Json(serde_json::json!({ "success": true, "message": "Login successful" })))
    } else {
        tracing::warn!("Failed admin login attempt for {}", req.username);
        Err(ApiError::unauthorized("Invalid credentials"))
    }
}
