use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

/// Ticket issuance payload. Tickets are produced for every committed
/// booking, paid or package-covered alike.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketRequest {
    pub booking_id: Uuid,
    pub slot_id: Uuid,
    pub tenant_id: Uuid,
    pub visitor_count: i32,
}

#[async_trait]
pub trait TicketAdapter: Send + Sync {
    /// Issue (or re-issue) a ticket. Must be idempotent per
    /// `(booking_id, slot_id)`: a reschedule to a new slot produces a new
    /// ticket, a redelivery of the same pair must not duplicate.
    async fn issue_ticket(
        &self,
        request: &TicketRequest,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>>;

    /// Invalidate the ticket issued for a superseded `(booking, slot)`
    /// pair after a reschedule.
    async fn invalidate_ticket(
        &self,
        booking_id: Uuid,
        slot_id: Uuid,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// In-memory adapter keyed by `(booking_id, slot_id)`, demonstrating the
/// idempotence contract the real PDF/delivery subsystem must honor.
#[derive(Default)]
pub struct MockTicketAdapter {
    issued: Mutex<HashMap<(Uuid, Uuid), String>>,
    invalidated: Mutex<Vec<(Uuid, Uuid)>>,
}

impl MockTicketAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issued_count(&self) -> usize {
        self.issued.lock().unwrap().len()
    }

    pub fn ticket_for(&self, booking_id: Uuid, slot_id: Uuid) -> Option<String> {
        self.issued.lock().unwrap().get(&(booking_id, slot_id)).cloned()
    }

    pub fn invalidated_pairs(&self) -> Vec<(Uuid, Uuid)> {
        self.invalidated.lock().unwrap().clone()
    }
}

#[async_trait]
impl TicketAdapter for MockTicketAdapter {
    async fn issue_ticket(
        &self,
        request: &TicketRequest,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        let mut issued = self.issued.lock().unwrap();
        let key = (request.booking_id, request.slot_id);
        if let Some(existing) = issued.get(&key) {
            // Same pair: redelivery, not a new ticket
            return Ok(existing.clone());
        }
        let reference = format!(
            "VST-{}-{}",
            chrono::Utc::now().timestamp(),
            &request.booking_id.to_string()[..8].to_uppercase()
        );
        issued.insert(key, reference.clone());
        Ok(reference)
    }

    async fn invalidate_ticket(
        &self,
        booking_id: Uuid,
        slot_id: Uuid,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.issued.lock().unwrap().remove(&(booking_id, slot_id));
        self.invalidated.lock().unwrap().push((booking_id, slot_id));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ticket_idempotent_per_booking_slot_pair() {
        let adapter = MockTicketAdapter::new();
        let request = TicketRequest {
            booking_id: Uuid::new_v4(),
            slot_id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            visitor_count: 2,
        };

        let first = adapter.issue_ticket(&request).await.unwrap();
        let second = adapter.issue_ticket(&request).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(adapter.issued_count(), 1);

        // A different slot (reschedule) produces a fresh ticket
        let moved = TicketRequest {
            slot_id: Uuid::new_v4(),
            ..request.clone()
        };
        let third = adapter.issue_ticket(&moved).await.unwrap();
        assert_ne!(first, third);
        assert_eq!(adapter.issued_count(), 2);
    }
}
