pub mod identity;
pub mod invoice;
pub mod repository;
pub mod ticket;

use uuid::Uuid;

/// Error taxonomy for the admission/capacity core.
///
/// Insufficient package balance and unresolved customers are deliberately
/// absent: both degrade silently to paid quantity instead of failing.
#[derive(Debug, thiserror::Error)]
pub enum AdmissionError {
    #[error("Insufficient capacity: requested {requested}, available {available}")]
    InsufficientCapacity { available: i32, requested: i32 },

    #[error("Slot not found: {0}")]
    SlotNotFound(Uuid),

    #[error("Slot is not open for booking: {0}")]
    SlotUnavailable(Uuid),

    #[error("Booking not found: {0}")]
    BookingNotFound(Uuid),

    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Invalid visitor count: {0}")]
    InvalidQuantity(i32),

    #[error("Timed out waiting for a row lock")]
    LockTimeout,

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl AdmissionError {
    /// Transient errors are safe to retry from scratch; everything else
    /// requires the caller to change the request.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AdmissionError::LockTimeout)
    }
}
