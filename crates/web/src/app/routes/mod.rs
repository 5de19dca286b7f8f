use axum::{
    Router,
    routing::{get, post},
};

use crate::app::AppState;
use crate::errors;

pub mod files;
pub mod system;
pub mod users;

/// Router for every endpoint that runs behind the caller-context middleware.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/whoami", get(system::whoami))
        .route("/files", post(files::upload))
        .route("/fail/internal", get(system::fail_internal))
        .route("/fail/panic", get(system::fail_panic))
        .nest("/users", users::router())
        .method_not_allowed_fallback(errors::method_not_allowed)
}
