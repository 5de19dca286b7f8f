use axum::{body::Bytes, extract::rejection::BytesRejection};

use crate::app::dto::UploadReceipt;
use crate::envelope::Envelope;
use crate::errors::WebResult;

/// Accept a raw upload; bodies above the configured limit are rejected with `020010`.
pub async fn upload(body: Result<Bytes, BytesRejection>) -> WebResult<Envelope<UploadReceipt>> {
    let body = body?;
    tracing::info!(size = body.len(), "upload received");
    Ok(Envelope::success(UploadReceipt { size: body.len() }))
}
