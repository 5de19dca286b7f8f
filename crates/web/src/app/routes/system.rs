use axum::{Extension, http::StatusCode};
use serde_json::{Value, json};

use aurora_core::{CallerContext, context};

use crate::envelope::Envelope;
use crate::errors::{WebError, WebResult};

pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// Echo the caller's claims, read both from the request extension and from
/// the ambient context after yielding to the scheduler.
pub async fn whoami(Extension(caller): Extension<CallerContext>) -> Envelope<Value> {
    tokio::task::yield_now().await;
    Envelope::success(json!({
        "user_name": caller.username(),
        "claims": caller.claims(),
        "ambient_user_name": context::current_username(),
    }))
}

pub async fn fail_internal() -> WebResult<Envelope<Value>> {
    Err(WebError::internal(anyhow::anyhow!(
        "simulated failure: pool exhausted at 10.1.2.3:5432"
    )))
}

pub async fn fail_panic() -> Envelope<Value> {
    panic!("simulated handler panic")
}
