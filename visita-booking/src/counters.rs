use serde::{Deserialize, Serialize};

use visita_core::AdmissionError;

/// Capacity counter arithmetic for one slot.
///
/// Both storage backends route every counter mutation through this type
/// so the invariant lives in one place: `available + booked == original`
/// at quiescence, `0 <= available <= original`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SlotCounters {
    pub original: i32,
    pub available: i32,
    pub booked: i32,
}

impl SlotCounters {
    pub fn new(original: i32, available: i32, booked: i32) -> Self {
        Self {
            original,
            available,
            booked,
        }
    }

    /// Admit `quantity` units or fail without mutating. The error carries
    /// the actual remaining count for a precise user-facing message.
    pub fn try_reserve(&mut self, quantity: i32) -> Result<(), AdmissionError> {
        if quantity < 1 {
            return Err(AdmissionError::InvalidQuantity(quantity));
        }
        if self.available < quantity {
            return Err(AdmissionError::InsufficientCapacity {
                available: self.available,
                requested: quantity,
            });
        }
        self.available -= quantity;
        self.booked += quantity;
        Ok(())
    }

    /// Restore `quantity` units, clamped so `available` never exceeds
    /// `original` (double-release protection) and `booked` never goes
    /// negative. Returns the quantity actually restored.
    pub fn release(&mut self, quantity: i32) -> i32 {
        if quantity < 1 {
            return 0;
        }
        let restored = quantity.min(self.original - self.available);
        self.available += restored;
        self.booked = (self.booked - restored).max(0);
        restored
    }

    /// Conservation invariant; holds at every quiescent point.
    pub fn is_consistent(&self) -> bool {
        self.available >= 0
            && self.available <= self.original
            && self.available + self.booked == self.original
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserve_and_release_conserve_capacity() {
        let mut c = SlotCounters::new(10, 10, 0);
        c.try_reserve(4).unwrap();
        assert_eq!(c.available, 6);
        assert_eq!(c.booked, 4);
        assert!(c.is_consistent());

        c.release(4);
        assert_eq!(c.available, 10);
        assert_eq!(c.booked, 0);
        assert!(c.is_consistent());
    }

    #[test]
    fn test_reserve_fails_with_actual_available() {
        let mut c = SlotCounters::new(3, 2, 1);
        let err = c.try_reserve(5).unwrap_err();
        match err {
            AdmissionError::InsufficientCapacity {
                available,
                requested,
            } => {
                assert_eq!(available, 2);
                assert_eq!(requested, 5);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        // Failure performs no mutation
        assert_eq!(c.available, 2);
        assert_eq!(c.booked, 1);
    }

    #[test]
    fn test_release_clamps_at_original() {
        let mut c = SlotCounters::new(5, 4, 1);
        let restored = c.release(3);
        assert_eq!(restored, 1);
        assert_eq!(c.available, 5);
        assert_eq!(c.booked, 0);
        assert!(c.is_consistent());

        // Releasing a fully restored slot is a no-op
        assert_eq!(c.release(2), 0);
        assert_eq!(c.available, 5);
    }

    #[test]
    fn test_zero_or_negative_quantities_rejected() {
        let mut c = SlotCounters::new(5, 5, 0);
        assert!(matches!(
            c.try_reserve(0),
            Err(AdmissionError::InvalidQuantity(0))
        ));
        assert_eq!(c.release(-2), 0);
        assert!(c.is_consistent());
    }
}
