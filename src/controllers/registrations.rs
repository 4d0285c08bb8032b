use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

use super::events::positive_id;
use crate::error::ApiError;
use crate::extract::{JsonBody, PathParam, QueryParams};
use crate::models::NewRegistration;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/registrations", get(list_registrations).post(create_registration))
        .route("/registrations/{id}", delete(delete_registration))
}

// GET /api/registrations?eventId=N
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegistrationsQuery {
    event_id: Option<i64>,
}

async fn list_registrations(
    State(state): State<Arc<AppState>>,
    QueryParams(params): QueryParams<RegistrationsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let registrations = match params.event_id {
        Some(id) => {
            let id = positive_id(id, "eventId")?;
            state.registrations.list_by_event(id).await?
        }
        None => state.registrations.list_all().await?,
    };
    Ok(Json(registrations))
}

// POST /api/registrations
async fn create_registration(
    State(state): State<Arc<AppState>>,
    JsonBody(new): JsonBody<NewRegistration>,
) -> Result<impl IntoResponse, ApiError> {
    let registration = state.workflow.register(new).await?;
    Ok((StatusCode::CREATED, Json(registration)))
}

// DELETE /api/registrations/{id}
async fn delete_registration(
    State(state): State<Arc<AppState>>,
    PathParam(id): PathParam<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let id = positive_id(id, "Registration id")?;
    state.workflow.cancel(id).await?;
    Ok(Json(serde_json::json!({ "message": "Registration deleted successfully" })))
}
