//! Uniform JSON response envelope.
//!
//! Every response body, success or failure, has the shape
//! `{"code": "...", "msg": "...", "time": "<RFC 3339>", "data": ...}` where
//! `data` is omitted when there is no payload or the payload serializes to
//! JSON `null`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use aurora_core::{AppError, ErrorType, SystemErrorType};

pub const SUCCESSFUL_CODE: &str = "000000";
pub const SUCCESSFUL_MSG: &str = "处理成功";

/// Response wrapper returned by every endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    code: String,
    msg: String,
    time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "is_absent")]
    data: Option<T>,
}

/// `None`, or a payload that would serialize as `null` (`Value::Null`, `None`
/// inside an `Option` payload, `()`).
fn is_absent<T: Serialize>(data: &Option<T>) -> bool {
    match data {
        None => true,
        Some(value) => matches!(serde_json::to_value(value), Ok(serde_json::Value::Null)),
    }
}

impl<T> Envelope<T> {
    fn build(code: &str, msg: &str, data: Option<T>) -> Self {
        Self {
            code: code.to_owned(),
            msg: msg.to_owned(),
            time: Utc::now(),
            data,
        }
    }

    pub fn success(data: T) -> Self {
        Self::build(SUCCESSFUL_CODE, SUCCESSFUL_MSG, Some(data))
    }

    pub fn success_empty() -> Self {
        Self::build(SUCCESSFUL_CODE, SUCCESSFUL_MSG, None)
    }

    /// Generic system error, no payload.
    pub fn fail() -> Self {
        Self::fail_with(SystemErrorType::SystemError)
    }

    /// Generic system error carrying a payload.
    pub fn fail_data(data: T) -> Self {
        Self::fail_with_data(SystemErrorType::SystemError, data)
    }

    pub fn fail_with(error_type: impl ErrorType) -> Self {
        Self::build(error_type.code(), error_type.msg(), None)
    }

    pub fn fail_with_data(error_type: impl ErrorType, data: T) -> Self {
        Self::build(error_type.code(), error_type.msg(), Some(data))
    }

    pub fn from_app_error(err: &AppError) -> Self {
        Self::fail_with(err.error_type())
    }

    pub fn from_app_error_with_data(err: &AppError, data: T) -> Self {
        Self::fail_with_data(err.error_type(), data)
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn msg(&self) -> &str {
        &self.msg
    }

    pub fn time(&self) -> DateTime<Utc> {
        self.time
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    pub fn into_data(self) -> Option<T> {
        self.data
    }

    pub fn is_success(&self) -> bool {
        self.code == SUCCESSFUL_CODE
    }

    pub fn is_fail(&self) -> bool {
        !self.is_success()
    }

    /// Pair the envelope with a non-default HTTP status.
    pub fn with_status(self, status: StatusCode) -> (StatusCode, Json<Self>) {
        (status, Json(self))
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}
