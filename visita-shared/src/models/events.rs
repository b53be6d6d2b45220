use uuid::Uuid;

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct SlotCapacityChangedEvent {
    pub slot_id: Uuid,
    pub available_capacity: i32,
    pub booked_count: i32,
    pub timestamp: i64,
}

/// Queued for the notice delivery worker when a subscription's balance
/// for a service first hits zero.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct PackageExhaustedEvent {
    pub subscription_id: Uuid,
    pub service_id: Uuid,
    pub customer_id: Uuid,
    pub timestamp: i64,
}
