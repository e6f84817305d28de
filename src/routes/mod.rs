use axum::{
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::{
    config::{Config, StoreBackend},
    db::{self, MemoryWatchStatusStore, PgWatchStatusStore, WatchStatusStore},
    middleware::{make_span_with_request_id, request_id_middleware},
    services::{AggregationService, CatalogAdapter},
};

pub mod catalog;
pub mod users;
pub mod watch_status;

/// Shared handles, built once at startup
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn WatchStatusStore>,
    pub catalog: Arc<CatalogAdapter>,
    pub aggregation: AggregationService,
}

impl AppState {
    pub fn new(store: Arc<dyn WatchStatusStore>, catalog: CatalogAdapter) -> Self {
        let catalog = Arc::new(catalog);
        let aggregation = AggregationService::new(store.clone(), catalog.clone());

        Self {
            store,
            catalog,
            aggregation,
        }
    }

    /// Connects the configured store (running migrations for Postgres) and the live catalogs
    pub async fn from_config(config: &Config) -> anyhow::Result<Self> {
        let store: Arc<dyn WatchStatusStore> = match config.store_backend {
            StoreBackend::Postgres => {
                let pool = db::create_pool(&config.database_url).await?;
                db::run_migrations(&pool).await?;
                Arc::new(PgWatchStatusStore::new(pool))
            }
            StoreBackend::Memory => Arc::new(MemoryWatchStatusStore::new()),
        };

        tracing::info!(store = store.name(), "Watch-status store ready");

        Ok(Self::new(store, CatalogAdapter::from_config(config)))
    }
}

/// Creates the application router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/health", get(health_check))
        .nest("/api", api_routes())
        .nest("/users", user_routes())
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id)),
        )
        .with_state(state)
}

/// Catalog and legacy watch-status routes under /api
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/search", get(catalog::search_shows))
        .route("/shows/:id", get(catalog::get_show))
        .route("/movies/search", get(catalog::search_movies))
        .route("/movies/:id", get(catalog::get_movie))
        .route("/anime/popular", get(catalog::popular_anime))
        .route("/anime/search", get(catalog::search_anime))
        .route("/anime/:id", get(catalog::get_anime))
        .route(
            "/watch-status",
            get(watch_status::get_status).post(watch_status::update_status),
        )
        .route("/watch-status/batch", get(watch_status::batch_status))
}

/// Per-user watch-status routes under /users
fn user_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/:user_id/watch-status/all", get(users::all_content))
        .route(
            "/:user_id/watch-status/batch",
            get(users::batch_status).options(users::preflight),
        )
        .route(
            "/:user_id/watch-status/:content_type",
            get(users::content_by_status),
        )
        .route(
            "/:user_id/watch-status/:content_type/:content_id",
            get(users::get_status)
                .put(users::update_status)
                .options(users::preflight),
        )
}

async fn home() -> Json<Value> {
    Json(json!({ "message": "Welcome to the API" }))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
