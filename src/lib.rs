pub mod config;
pub mod controllers;
pub mod error;
pub mod extract;
pub mod models;
pub mod redis_client;
pub mod services;
pub mod storage;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use services::{EventRepository, RegistrationRepository, RegistrationWorkflow};
use storage::SharedStore;

// Shared state для всего приложения
#[derive(Clone)]
pub struct AppState {
    pub config: config::Config,
    pub store: SharedStore,
    pub events: EventRepository,
    pub registrations: RegistrationRepository,
    pub workflow: RegistrationWorkflow,
}

impl AppState {
    /// Connects the backend selected by `config`.
    pub async fn new(config: config::Config) -> Result<Arc<Self>, error::StoreError> {
        let store = storage::connect(&config).await?;
        Ok(Self::with_store(config, store))
    }

    pub fn with_store(config: config::Config, store: SharedStore) -> Arc<Self> {
        let events = EventRepository::new(store.clone());
        let registrations = RegistrationRepository::new(store.clone());
        let workflow = RegistrationWorkflow::new(events.clone(), registrations.clone());
        Arc::new(Self {
            config,
            store,
            events,
            registrations,
            workflow,
        })
    }
}

/// Full HTTP application: `/`, `/health` and everything under `/api`.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(|| async { "Club Events API v1.0" }))
        .route("/health", get(controllers::health))
        .nest("/api", controllers::routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
