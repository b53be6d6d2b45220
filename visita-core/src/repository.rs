use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::AdmissionError;
use visita_domain::{Booking, BookingStatus, PackageSubscription, Slot};

/// Everything the orchestrator needs to admit one booking. Coverage is
/// resolved against `customer_id`; `None` means guest and always prices
/// the full visitor count.
#[derive(Debug, Clone, Deserialize)]
pub struct AdmissionCommand {
    pub tenant_id: Uuid,
    pub service_id: Uuid,
    pub slot_id: Uuid,
    pub customer_id: Option<Uuid>,
    pub visitor_count: i32,
    pub price_per_unit_cents: i64,
    pub currency: String,
    pub initial_status: BookingStatus,
}

/// Result of a committed admission. `exhausted` lists the
/// `(subscription_id, service_id)` pairs whose notice was newly recorded
/// by this call — already-notified pairs never reappear here.
#[derive(Debug, Clone, Serialize)]
pub struct AdmissionRecord {
    pub booking: Booking,
    pub slot_available_after: i32,
    pub exhausted: Vec<(Uuid, Uuid)>,
}

/// Result of a committed status transition.
#[derive(Debug, Clone, Serialize)]
pub struct TransitionRecord {
    pub booking: Booking,
    /// Quantity released back to the slot, if the transition left the
    /// capacity-holding states.
    pub released_quantity: Option<i32>,
    pub slot_available_after: i32,
}

/// Result of a committed reschedule.
#[derive(Debug, Clone, Serialize)]
pub struct RescheduleRecord {
    pub booking: Booking,
    pub old_slot_id: Uuid,
    pub new_slot_id: Uuid,
}

/// Transactional storage seam for the admission core.
///
/// Every method is one atomic unit: it either commits all of its effects
/// (counter updates, package decrements, booking writes) or none of them.
/// Implementations serialize concurrent calls touching the same slot or
/// subscription rows; callers never see partially applied state.
#[async_trait]
pub trait AdmissionStore: Send + Sync {
    /// Admit a booking: resolve package coverage, reserve slot capacity,
    /// compute the payable price and persist the booking, atomically.
    async fn admit(&self, cmd: AdmissionCommand) -> Result<AdmissionRecord, AdmissionError>;

    /// Apply a status transition, releasing slot capacity (and restoring
    /// package balance) when the booking leaves the active states.
    async fn transition(
        &self,
        booking_id: Uuid,
        new_status: BookingStatus,
    ) -> Result<TransitionRecord, AdmissionError>;

    /// Move a booking to a different slot. The new slot is reserved
    /// before the old reservation is released; on failure the original
    /// reservation is untouched.
    async fn change_slot(
        &self,
        booking_id: Uuid,
        new_slot_id: Uuid,
    ) -> Result<RescheduleRecord, AdmissionError>;

    async fn get_booking(&self, id: Uuid) -> Result<Option<Booking>, AdmissionError>;

    async fn get_slot(&self, id: Uuid) -> Result<Option<Slot>, AdmissionError>;

    async fn get_subscription(
        &self,
        id: Uuid,
    ) -> Result<Option<PackageSubscription>, AdmissionError>;
}
