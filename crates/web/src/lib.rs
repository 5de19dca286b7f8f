//! HTTP layer: response envelope, error translation, caller-context
//! middleware, and the reference service that wires them together.

pub mod app;
pub mod config;
pub mod envelope;
pub mod errors;
pub mod middleware;

pub use envelope::{Envelope, SUCCESSFUL_CODE, SUCCESSFUL_MSG};
pub use errors::{ValidatedJson, WebError, WebResult};
