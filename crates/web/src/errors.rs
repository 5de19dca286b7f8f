//! Error-to-response translation.
//!
//! Handlers return [`WebError`]; its `IntoResponse` impl is the single place
//! where failures become envelopes. Variants are listed, and raw errors are
//! classified, in mapping priority order:
//!
//! | # | variant | code | status |
//! |---|---|---|---|
//! | 1 | `MissingParameter` | `020000` | 400 |
//! | 2 | `PayloadTooLarge` | `020010` | 413 |
//! | 3 | `MalformedBody` | `020000` | 400 |
//! | 4 | `Validation` | `020000` + first violation message | 400 |
//! | 5 | `DuplicateKey` | `030000` | 409 |
//! | 6 | `App` | the error's own entry | 400 |
//! | 7 | `Internal` | `-1` | 500 |
//!
//! Requests that never reach a handler are translated too: `RouteNotFound`
//! (`010404`, 404) and `MethodNotAllowed` (`020000`, 405).
//!
//! The underlying failure is logged in every branch; only the taxonomy code and
//! message (plus the first validation message) reach the client.

use std::any::Any;

use axum::{
    Json,
    extract::{
        FromRequest, Request,
        rejection::{BytesRejection, JsonRejection, QueryRejection},
    },
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use thiserror::Error;

use aurora_core::{AppError, ErrorEntry, ErrorType, SystemErrorType, Validate, ValidationErrors};

use crate::envelope::Envelope;

/// Result type for request handlers.
pub type WebResult<T> = Result<T, WebError>;

#[derive(Debug, Error)]
pub enum WebError {
    /// A required request parameter is missing or unparsable.
    #[error("missing request parameter: {0}")]
    MissingParameter(String),

    /// The request body exceeds the configured upload limit.
    #[error("request body too large: {0}")]
    PayloadTooLarge(String),

    /// The body could not be read or decoded into the expected type.
    #[error("malformed request body: {0}")]
    MalformedBody(String),

    /// The request failed declared field constraints.
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    /// A unique constraint was violated at the storage layer.
    #[error("duplicate key: {0}")]
    DuplicateKey(String),

    /// A known application failure carrying its own taxonomy entry.
    #[error(transparent)]
    App(#[from] AppError),

    /// Anything else.
    #[error("internal error: {0:#}")]
    Internal(anyhow::Error),

    /// No route matches the request path.
    #[error("no route for {method} {path}")]
    RouteNotFound { method: Method, path: String },

    /// The path exists but not for this method.
    #[error("method {method} not allowed for {path}")]
    MethodNotAllowed { method: Method, path: String },
}

impl WebError {
    pub fn internal(err: impl Into<anyhow::Error>) -> Self {
        Self::Internal(err.into())
    }

    pub fn error_type(&self) -> ErrorEntry {
        match self {
            Self::MissingParameter(_) => SystemErrorType::ArgumentNotValid.entry(),
            Self::PayloadTooLarge(_) => SystemErrorType::UploadFileSizeLimit.entry(),
            Self::MalformedBody(_) | Self::Validation(_) => SystemErrorType::ArgumentNotValid.entry(),
            Self::DuplicateKey(_) => SystemErrorType::DuplicatePrimaryKey.entry(),
            Self::App(e) => e.error_type(),
            Self::Internal(_) => SystemErrorType::SystemError.entry(),
            Self::RouteNotFound { .. } => SystemErrorType::GatewayNotFoundService.entry(),
            Self::MethodNotAllowed { .. } => SystemErrorType::ArgumentNotValid.entry(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingParameter(_) | Self::MalformedBody(_) | Self::Validation(_) | Self::App(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::DuplicateKey(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::RouteNotFound { .. } => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
        }
    }

    /// The client-facing envelope. Only validation failures carry a payload:
    /// the message of the first violation.
    pub fn to_envelope(&self) -> Envelope<String> {
        match self {
            Self::Validation(errors) => match errors.first() {
                Some(first) => Envelope::fail_with_data(self.error_type(), first.message.clone()),
                None => Envelope::fail_with(self.error_type()),
            },
            _ => Envelope::fail_with(self.error_type()),
        }
    }

    fn log(&self) {
        match self {
            Self::MissingParameter(detail) => {
                tracing::warn!(%detail, "missing request parameter");
            }
            Self::PayloadTooLarge(detail) => {
                tracing::warn!(%detail, "upload size limit exceeded");
            }
            Self::MalformedBody(detail) => {
                tracing::warn!(%detail, "malformed request body");
            }
            Self::Validation(errors) => {
                tracing::warn!(violations = ?errors.violations(), "request validation failed");
            }
            Self::DuplicateKey(detail) => {
                tracing::warn!(%detail, "unique key conflict");
            }
            Self::App(e) => {
                tracing::warn!(code = e.error_type().code(), detail = e.detail(), "application error");
            }
            Self::Internal(e) => {
                tracing::error!(error = ?e, "unhandled error");
            }
            Self::RouteNotFound { method, path } => {
                tracing::warn!(%method, %path, "no matching route");
            }
            Self::MethodNotAllowed { method, path } => {
                tracing::warn!(%method, %path, "method not allowed");
            }
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        self.log();
        let status = self.status();
        self.to_envelope().with_status(status).into_response()
    }
}

impl From<QueryRejection> for WebError {
    fn from(rejection: QueryRejection) -> Self {
        Self::MissingParameter(rejection.body_text())
    }
}

impl From<JsonRejection> for WebError {
    fn from(rejection: JsonRejection) -> Self {
        body_rejection(rejection.status(), rejection.body_text())
    }
}

impl From<BytesRejection> for WebError {
    fn from(rejection: BytesRejection) -> Self {
        body_rejection(rejection.status(), rejection.body_text())
    }
}

fn body_rejection(status: StatusCode, detail: String) -> WebError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        WebError::PayloadTooLarge(detail)
    } else {
        WebError::MalformedBody(detail)
    }
}

/// Router fallback for paths with no route.
pub async fn route_not_found(method: Method, uri: Uri) -> WebError {
    WebError::RouteNotFound {
        method,
        path: uri.path().to_owned(),
    }
}

/// Router fallback for known paths hit with an unsupported method.
pub async fn method_not_allowed(method: Method, uri: Uri) -> WebError {
    WebError::MethodNotAllowed {
        method,
        path: uri.path().to_owned(),
    }
}

impl From<sqlx::Error> for WebError {
    fn from(err: sqlx::Error) -> Self {
        if is_unique_violation(&err) {
            Self::DuplicateKey(err.to_string())
        } else {
            Self::Internal(err.into())
        }
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

/// Classify an opaque error by downcasting, in mapping priority order.
impl From<anyhow::Error> for WebError {
    fn from(err: anyhow::Error) -> Self {
        let err = match err.downcast::<WebError>() {
            Ok(web) => return web,
            Err(err) => err,
        };
        let err = match err.downcast::<QueryRejection>() {
            Ok(rejection) => return rejection.into(),
            Err(err) => err,
        };
        let err = match err.downcast::<JsonRejection>() {
            Ok(rejection) => return rejection.into(),
            Err(err) => err,
        };
        let err = match err.downcast::<BytesRejection>() {
            Ok(rejection) => return rejection.into(),
            Err(err) => err,
        };
        let err = match err.downcast::<ValidationErrors>() {
            Ok(errors) => return Self::Validation(errors),
            Err(err) => err,
        };
        if let Some(db_err) = err.downcast_ref::<sqlx::Error>() {
            if is_unique_violation(db_err) {
                return Self::DuplicateKey(db_err.to_string());
            }
        }
        match err.downcast::<AppError>() {
            Ok(app) => Self::App(app),
            Err(err) => Self::Internal(err),
        }
    }
}

/// JSON body extractor that also runs [`Validate`].
///
/// Malformed bodies, oversized bodies, and constraint failures all reject
/// with a [`WebError`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = WebError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(Self(value))
    }
}

/// Response for a panic caught by `tower_http::catch_panic`.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        *s
    } else {
        "non-string panic payload"
    };
    tracing::error!(%detail, "request handler panicked");

    Envelope::<String>::fail()
        .with_status(StatusCode::INTERNAL_SERVER_ERROR)
        .into_response()
}
