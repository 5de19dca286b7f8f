//! `aurora-core`: transport-agnostic building blocks shared by every service.
//!
//! Nothing here depends on HTTP; the web layer lives in `aurora-web`.

pub mod audit;
pub mod context;
pub mod error;
pub mod validation;

pub use audit::{AuditFillHandler, AuditStamp, FieldAccessor, FillHandler, FillValue};
pub use context::CallerContext;
pub use error::{AppError, AppResult, ErrorEntry, ErrorType, SystemErrorType};
pub use validation::{FieldViolation, Validate, ValidationErrors};
