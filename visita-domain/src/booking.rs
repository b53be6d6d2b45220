use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use visita_shared::pii::Masked;

/// Booking lifecycle status. A booking holds slot capacity exactly while
/// it is in one of the active states (pending, confirmed, checked-in).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    CheckedIn,
    Completed,
    Cancelled,
}

impl BookingStatus {
    /// Active bookings count against their slot's capacity.
    pub fn holds_capacity(&self) -> bool {
        matches!(
            self,
            BookingStatus::Pending | BookingStatus::Confirmed | BookingStatus::CheckedIn
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "PENDING",
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::CheckedIn => "CHECKED_IN",
            BookingStatus::Completed => "COMPLETED",
            BookingStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(BookingStatus::Pending),
            "CONFIRMED" => Some(BookingStatus::Confirmed),
            "CHECKED_IN" => Some(BookingStatus::CheckedIn),
            "COMPLETED" => Some(BookingStatus::Completed),
            "CANCELLED" => Some(BookingStatus::Cancelled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    NotRequired,
    Unpaid,
    Paid,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::NotRequired => "NOT_REQUIRED",
            PaymentStatus::Unpaid => "UNPAID",
            PaymentStatus::Paid => "PAID",
            PaymentStatus::Refunded => "REFUNDED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "NOT_REQUIRED" => Some(PaymentStatus::NotRequired),
            "UNPAID" => Some(PaymentStatus::Unpaid),
            "PAID" => Some(PaymentStatus::Paid),
            "REFUNDED" => Some(PaymentStatus::Refunded),
            _ => None,
        }
    }
}

/// One customer's reservation against exactly one slot.
///
/// Invariants maintained by the admission path:
/// - `package_covered_quantity + paid_quantity == visitor_count`
/// - `package_subscription_id` is set iff `package_covered_quantity > 0`
/// - `total_price_cents == 0` whenever the booking is fully covered
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub service_id: Uuid,
    pub slot_id: Uuid,
    pub customer_id: Option<Uuid>,
    pub visitor_count: i32,
    pub package_covered_quantity: i32,
    pub paid_quantity: i32,
    pub package_subscription_id: Option<Uuid>,
    pub total_price_cents: i64,
    pub currency: String,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn is_fully_covered(&self) -> bool {
        self.package_covered_quantity == self.visitor_count
    }

    pub fn update_status(&mut self, new_status: BookingStatus) {
        self.status = new_status;
        self.updated_at = Utc::now();
    }
}

/// Incoming admission request as the booking route delivers it. The
/// customer reference is optional: guest bookings carry only contact
/// details and never receive package coverage.
#[derive(Debug, Clone, Deserialize)]
pub struct AdmitBookingRequest {
    pub tenant_id: Uuid,
    pub service_id: Uuid,
    pub slot_id: Uuid,
    pub customer_id: Option<Uuid>,
    pub visitor_count: i32,
    pub price_per_unit_cents: i64,
    pub guest_name: Option<String>,
    /// Masked so request logging never prints the raw number.
    pub guest_phone: Option<Masked<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_statuses_hold_capacity() {
        assert!(BookingStatus::Pending.holds_capacity());
        assert!(BookingStatus::Confirmed.holds_capacity());
        assert!(BookingStatus::CheckedIn.holds_capacity());
        assert!(!BookingStatus::Completed.holds_capacity());
        assert!(!BookingStatus::Cancelled.holds_capacity());
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            BookingStatus::Pending,
            BookingStatus::Confirmed,
            BookingStatus::CheckedIn,
            BookingStatus::Completed,
            BookingStatus::Cancelled,
        ] {
            assert_eq!(BookingStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(BookingStatus::parse("NO_SHOW"), None);
    }
}
