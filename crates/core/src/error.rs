//! Error taxonomy: the closed set of failure codes exposed to clients.
//!
//! Codes are grouped by prefix (`00` system, `01` gateway, `02` request
//! arguments, `03` storage). The grouping is documentation only; nothing
//! branches on it.

use core::fmt;

use thiserror::Error;

/// Result type for application-level failures.
pub type AppResult<T> = Result<T, AppError>;

/// A failure category with a stable wire code and a human-readable message.
pub trait ErrorType {
    /// Stable code, part of the external contract.
    fn code(&self) -> &'static str;

    /// Message shown to clients.
    fn msg(&self) -> &'static str;

    /// Snapshot this category as a plain [`ErrorEntry`].
    fn entry(&self) -> ErrorEntry {
        ErrorEntry::new(self.code(), self.msg())
    }
}

/// Built-in failure categories shared by every service.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum SystemErrorType {
    /// 系统异常
    SystemError,
    /// 系统繁忙,请稍候再试
    SystemBusy,
    /// 服务未找到
    GatewayNotFoundService,
    /// 网关异常
    GatewayError,
    /// 网关超时
    GatewayConnectTimeOut,
    /// 请求参数校验不通过
    ArgumentNotValid,
    /// 无效token
    InvalidToken,
    /// 上传文件大小超过限制
    UploadFileSizeLimit,
    /// 唯一键冲突
    DuplicatePrimaryKey,
}

impl SystemErrorType {
    /// Every member of the taxonomy.
    pub const ALL: [SystemErrorType; 9] = [
        SystemErrorType::SystemError,
        SystemErrorType::SystemBusy,
        SystemErrorType::GatewayNotFoundService,
        SystemErrorType::GatewayError,
        SystemErrorType::GatewayConnectTimeOut,
        SystemErrorType::ArgumentNotValid,
        SystemErrorType::InvalidToken,
        SystemErrorType::UploadFileSizeLimit,
        SystemErrorType::DuplicatePrimaryKey,
    ];

    /// Look up a member by its wire code.
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.code() == code)
    }
}

impl ErrorType for SystemErrorType {
    fn code(&self) -> &'static str {
        match self {
            Self::SystemError => "-1",
            Self::SystemBusy => "000001",
            Self::GatewayNotFoundService => "010404",
            Self::GatewayError => "010500",
            Self::GatewayConnectTimeOut => "010002",
            Self::ArgumentNotValid => "020000",
            Self::InvalidToken => "020001",
            Self::UploadFileSizeLimit => "020010",
            Self::DuplicatePrimaryKey => "030000",
        }
    }

    fn msg(&self) -> &'static str {
        match self {
            Self::SystemError => "系统异常",
            Self::SystemBusy => "系统繁忙,请稍候再试",
            Self::GatewayNotFoundService => "服务未找到",
            Self::GatewayError => "网关异常",
            Self::GatewayConnectTimeOut => "网关超时",
            Self::ArgumentNotValid => "请求参数校验不通过",
            Self::InvalidToken => "无效token",
            Self::UploadFileSizeLimit => "上传文件大小超过限制",
            Self::DuplicatePrimaryKey => "唯一键冲突",
        }
    }
}

impl fmt::Display for SystemErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code(), self.msg())
    }
}

/// Immutable `(code, msg)` pair taken from some [`ErrorType`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ErrorEntry {
    code: &'static str,
    msg: &'static str,
}

impl ErrorEntry {
    pub const fn new(code: &'static str, msg: &'static str) -> Self {
        Self { code, msg }
    }
}

impl ErrorType for ErrorEntry {
    fn code(&self) -> &'static str {
        self.code
    }

    fn msg(&self) -> &'static str {
        self.msg
    }

    fn entry(&self) -> ErrorEntry {
        *self
    }
}

impl fmt::Display for ErrorEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code, self.msg)
    }
}

impl From<SystemErrorType> for ErrorEntry {
    fn from(value: SystemErrorType) -> Self {
        value.entry()
    }
}

/// Known application failure that carries its own taxonomy entry.
///
/// `detail` is for server-side logs only and never reaches a response body.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{entry}{}", detail_suffix(.detail))]
pub struct AppError {
    entry: ErrorEntry,
    detail: Option<String>,
}

impl AppError {
    pub fn new(error_type: impl ErrorType) -> Self {
        Self {
            entry: error_type.entry(),
            detail: None,
        }
    }

    pub fn with_detail(error_type: impl ErrorType, detail: impl Into<String>) -> Self {
        Self {
            entry: error_type.entry(),
            detail: Some(detail.into()),
        }
    }

    pub fn error_type(&self) -> ErrorEntry {
        self.entry
    }

    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail.as_deref().map(|d| format!(": {d}")).unwrap_or_default()
}

impl From<SystemErrorType> for AppError {
    fn from(value: SystemErrorType) -> Self {
        Self::new(value)
    }
}
