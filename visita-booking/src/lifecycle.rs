use visita_core::AdmissionError;
use visita_domain::BookingStatus;

/// Capacity side effect of a status transition.
///
/// Capacity is reserved exactly once, at admission, regardless of the
/// booking's initial status. The only transitions that touch the slot
/// ledger afterwards are the ones leaving the active states; in
/// particular, pending -> confirmed does NOT decrement again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacityEffect {
    /// Transition between two capacity-holding states; ledger untouched.
    None,
    /// Booking leaves the active states; release its visitor count.
    Release,
}

/// Validate a status transition and report its capacity effect.
///
/// Transition table:
/// - active -> active: allowed, no capacity effect (includes
///   confirmed -> pending, which stays capacity-holding)
/// - active -> {cancelled, completed}: allowed, releases capacity
/// - terminal -> anything, or no-op transitions: rejected
pub fn capacity_effect(
    from: BookingStatus,
    to: BookingStatus,
) -> Result<CapacityEffect, AdmissionError> {
    if from == to || from.is_terminal() {
        return Err(AdmissionError::InvalidTransition {
            from: from.as_str().to_string(),
            to: to.as_str().to_string(),
        });
    }

    if to.holds_capacity() {
        // from is active (not terminal, checked above), to is active
        return Ok(CapacityEffect::None);
    }

    Ok(CapacityEffect::Release)
}

#[cfg(test)]
mod tests {
    use super::*;
    use BookingStatus::*;

    #[test]
    fn test_active_to_active_keeps_capacity() {
        assert_eq!(capacity_effect(Pending, Confirmed).unwrap(), CapacityEffect::None);
        assert_eq!(capacity_effect(Confirmed, CheckedIn).unwrap(), CapacityEffect::None);
        // Reverting a confirmation keeps the reservation
        assert_eq!(capacity_effect(Confirmed, Pending).unwrap(), CapacityEffect::None);
    }

    #[test]
    fn test_leaving_active_releases() {
        assert_eq!(capacity_effect(Pending, Cancelled).unwrap(), CapacityEffect::Release);
        assert_eq!(capacity_effect(Confirmed, Cancelled).unwrap(), CapacityEffect::Release);
        assert_eq!(capacity_effect(Confirmed, Completed).unwrap(), CapacityEffect::Release);
        assert_eq!(capacity_effect(CheckedIn, Completed).unwrap(), CapacityEffect::Release);
    }

    #[test]
    fn test_terminal_states_are_final() {
        assert!(capacity_effect(Cancelled, Confirmed).is_err());
        assert!(capacity_effect(Completed, Cancelled).is_err());
        assert!(capacity_effect(Confirmed, Confirmed).is_err());
    }
}
