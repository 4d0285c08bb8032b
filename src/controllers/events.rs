use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;

use crate::error::ApiError;
use crate::extract::{JsonBody, PathParam, QueryParams};
use crate::models::{EventPatch, NewEvent};
use crate::services::EventView;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/events", get(list_events).post(create_event))
        .route(
            "/events/{id}",
            get(get_event).put(update_event).delete(delete_event),
        )
        .route("/events/{id}/capacity", get(event_capacity))
}

pub(crate) fn positive_id(id: i64, what: &str) -> Result<i64, ApiError> {
    if id <= 0 {
        return Err(ApiError::bad_request(format!("{what} must be > 0")));
    }
    Ok(id)
}

// GET /api/events?type=upcoming|past|active|inactive&limit=N
#[derive(Debug, Deserialize)]
struct EventsQuery {
    #[serde(rename = "type")]
    view: Option<String>,
    limit: Option<usize>,
}

async fn list_events(
    State(state): State<Arc<AppState>>,
    QueryParams(params): QueryParams<EventsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let view = match params.view.as_deref() {
        None | Some("") => EventView::All,
        Some(v) => v.parse()?,
    };
    let today = Utc::now().date_naive();
    let events = state.events.list(view, today, params.limit).await?;
    Ok(Json(events))
}

// POST /api/events
async fn create_event(
    State(state): State<Arc<AppState>>,
    JsonBody(new): JsonBody<NewEvent>,
) -> Result<impl IntoResponse, ApiError> {
    let event = state.events.create(new).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

// GET /api/events/{id}
async fn get_event(
    State(state): State<Arc<AppState>>,
    PathParam(id): PathParam<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let id = positive_id(id, "Event id")?;
    match state.events.get(id).await? {
        Some(event) => Ok(Json(event)),
        None => Err(ApiError::not_found("Event not found")),
    }
}

// PUT /api/events/{id}
async fn update_event(
    State(state): State<Arc<AppState>>,
    PathParam(id): PathParam<i64>,
    JsonBody(patch): JsonBody<EventPatch>,
) -> Result<impl IntoResponse, ApiError> {
    let id = positive_id(id, "Event id")?;
    match state.events.update(id, patch).await? {
        Some(event) => Ok(Json(event)),
        None => Err(ApiError::not_found("Event not found")),
    }
}

// DELETE /api/events/{id}
async fn delete_event(
    State(state): State<Arc<AppState>>,
    PathParam(id): PathParam<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let id = positive_id(id, "Event id")?;
    match state.workflow.delete_event(id).await? {
        Some(removed) => Ok(Json(serde_json::json!({
            "message": "Event deleted successfully",
            "registrationsDeleted": removed
        }))),
        None => Err(ApiError::not_found("Event not found")),
    }
}

// GET /api/events/{id}/capacity
async fn event_capacity(
    State(state): State<Arc<AppState>>,
    PathParam(id): PathParam<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let id = positive_id(id, "Event id")?;
    let view = state.workflow.capacity(id).await?;
    Ok(Json(view))
}
