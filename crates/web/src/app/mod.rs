//! Reference service wiring (Axum router + state).
//!
//! - `store.rs`: SQLite user repository with audit auto-fill
//! - `routes/`: HTTP handlers (one file per area)
//! - `dto.rs`: request/response DTOs and their validation rules

use std::sync::Arc;

use axum::{Router, extract::DefaultBodyLimit, routing::get};
use sqlx::SqlitePool;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;

use aurora_core::{AuditFillHandler, FillHandler};

use crate::{config::WebConfig, errors, middleware};

pub mod dto;
pub mod routes;
pub mod store;

#[derive(Clone)]
pub struct AppState {
    pub users: store::UserStore,
}

impl AppState {
    pub fn new(pool: SqlitePool, fill: Arc<dyn FillHandler>) -> Self {
        Self {
            users: store::UserStore::new(pool, fill),
        }
    }
}

/// Connect to the configured database and build the full router.
pub async fn build_app(config: &WebConfig) -> Result<Router, sqlx::Error> {
    let pool = store::connect(&config.database_url).await?;
    store::migrate(&pool).await?;

    let state = AppState::new(pool, Arc::new(AuditFillHandler::new()));
    Ok(router(state, config))
}

/// Assemble the router around an existing state.
///
/// Layers run outermost first: caller context, panic capture, body limit.
/// Unmatched paths and methods still answer with a failure envelope.
pub fn router(state: AppState, config: &WebConfig) -> Router {
    let scoped = routes::router().layer(
        ServiceBuilder::new()
            .layer(axum::middleware::from_fn(middleware::user_context_middleware))
            .layer(CatchPanicLayer::custom(errors::panic_response))
            .layer(DefaultBodyLimit::max(config.max_upload_bytes)),
    );

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(scoped)
        .method_not_allowed_fallback(errors::method_not_allowed)
        .fallback(errors::route_not_found)
        .with_state(state)
}
