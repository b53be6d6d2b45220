use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use visita_core::AdmissionError;

#[derive(Debug)]
pub enum AppError {
    Admission(AdmissionError),
    ValidationError(String),
    NotFoundError(String),
    Anyhow(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Admission(err) => return admission_response(err),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Anyhow(err) => {
                tracing::error!("Internal Server Error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Maps admission outcomes onto HTTP statuses. Capacity conflicts carry
/// the actual remaining count; lock timeouts are 503 so clients know to
/// retry rather than give up on the slot.
fn admission_response(err: AdmissionError) -> Response {
    let (status, message) = match &err {
        AdmissionError::InsufficientCapacity { available, requested } => (
            StatusCode::CONFLICT,
            format!("Insufficient capacity: requested {requested}, {available} remaining"),
        ),
        AdmissionError::SlotNotFound(id) => {
            (StatusCode::NOT_FOUND, format!("Slot {id} not found"))
        }
        AdmissionError::BookingNotFound(id) => {
            (StatusCode::NOT_FOUND, format!("Booking {id} not found"))
        }
        AdmissionError::SlotUnavailable(id) => {
            (StatusCode::CONFLICT, format!("Slot {id} is closed for booking"))
        }
        AdmissionError::InvalidTransition { from, to } => (
            StatusCode::CONFLICT,
            format!("Invalid status transition {from} -> {to}"),
        ),
        AdmissionError::InvalidQuantity(q) => (
            StatusCode::BAD_REQUEST,
            format!("Invalid visitor count: {q}"),
        ),
        AdmissionError::LockTimeout => (
            StatusCode::SERVICE_UNAVAILABLE,
            "Slot is busy, please retry".to_string(),
        ),
        AdmissionError::ConstraintViolation(msg) => {
            tracing::error!("Constraint violation: {}", msg);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
        }
        AdmissionError::Storage(msg) => {
            tracing::error!("Storage error: {}", msg);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
        }
    };

    let body = Json(json!({
        "error": message,
        "retryable": err.is_retryable(),
    }));
    (status, body).into_response()
}

impl From<AdmissionError> for AppError {
    fn from(err: AdmissionError) -> Self {
        Self::Admission(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Anyhow(err)
    }
}
