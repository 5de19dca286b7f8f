use axum::{
    Router,
    extract::{Path, Query, State, rejection::QueryRejection},
    routing::get,
};

use aurora_core::{AppError, ErrorType};

use crate::app::{
    AppState,
    dto::{CreateUserRequest, FindUserQuery, UpdateUserRequest},
    store::UserRecord,
};
use crate::envelope::Envelope;
use crate::errors::{ValidatedJson, WebResult};

/// Failures specific to the user endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserErrorType {
    NotFound,
}

impl ErrorType for UserErrorType {
    fn code(&self) -> &'static str {
        match self {
            Self::NotFound => "040404",
        }
    }

    fn msg(&self) -> &'static str {
        match self {
            Self::NotFound => "用户不存在",
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(find_user).post(create_user))
        .route("/:id", get(get_user).put(update_user))
}

pub async fn create_user(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<CreateUserRequest>,
) -> WebResult<Envelope<UserRecord>> {
    let record = state.users.insert(body.name, body.email).await?;
    Ok(Envelope::success(record))
}

pub async fn find_user(
    State(state): State<AppState>,
    query: Result<Query<FindUserQuery>, QueryRejection>,
) -> WebResult<Envelope<UserRecord>> {
    let Query(query) = query?;
    let record = state
        .users
        .find_by_name(&query.name)
        .await?
        .ok_or_else(|| AppError::with_detail(UserErrorType::NotFound, format!("name={}", query.name)))?;
    Ok(Envelope::success(record))
}

pub async fn get_user(State(state): State<AppState>, Path(id): Path<String>) -> WebResult<Envelope<UserRecord>> {
    let record = state
        .users
        .get(&id)
        .await?
        .ok_or_else(|| AppError::with_detail(UserErrorType::NotFound, format!("id={id}")))?;
    Ok(Envelope::success(record))
}

pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(body): ValidatedJson<UpdateUserRequest>,
) -> WebResult<Envelope<UserRecord>> {
    let record = state
        .users
        .update_email(&id, body.email)
        .await?
        .ok_or_else(|| AppError::with_detail(UserErrorType::NotFound, format!("id={id}")))?;
    Ok(Envelope::success(record))
}
