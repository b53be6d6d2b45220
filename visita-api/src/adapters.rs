use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::info;
use uuid::Uuid;

use visita_core::invoice::{InvoiceAdapter, InvoiceRequest};
use visita_core::ticket::{TicketAdapter, TicketRequest};

/// Invoice adapter for deployments without an accounting integration:
/// assigns a local reference and logs the invoice line.
#[derive(Default)]
pub struct LoggingInvoiceAdapter;

#[async_trait]
impl InvoiceAdapter for LoggingInvoiceAdapter {
    async fn create_invoice(
        &self,
        request: &InvoiceRequest,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        let reference = format!("inv_{}", Uuid::new_v4().simple());
        info!(
            booking_id = %request.booking_id,
            invoice_id = %reference,
            paid_quantity = request.paid_quantity,
            total_price_cents = request.total_price_cents,
            currency = %request.currency,
            "Invoice recorded"
        );
        Ok(reference)
    }
}

/// In-process ticket issuer. Keeps the issued map so a redelivery of the
/// same `(booking, slot)` pair returns the existing reference instead of
/// minting a new one.
#[derive(Default)]
pub struct InProcessTicketAdapter {
    issued: Mutex<HashMap<(Uuid, Uuid), String>>,
}

#[async_trait]
impl TicketAdapter for InProcessTicketAdapter {
    async fn issue_ticket(
        &self,
        request: &TicketRequest,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        let mut issued = self
            .issued
            .lock()
            .map_err(|_| "ticket ledger lock poisoned")?;
        let key = (request.booking_id, request.slot_id);
        if let Some(existing) = issued.get(&key) {
            return Ok(existing.clone());
        }
        let reference = format!(
            "VST-{}-{}",
            chrono::Utc::now().timestamp(),
            &request.booking_id.to_string()[..8].to_uppercase()
        );
        issued.insert(key, reference.clone());
        info!(booking_id = %request.booking_id, ticket = %reference, "Ticket issued");
        Ok(reference)
    }

    async fn invalidate_ticket(
        &self,
        booking_id: Uuid,
        slot_id: Uuid,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut issued = self
            .issued
            .lock()
            .map_err(|_| "ticket ledger lock poisoned")?;
        if issued.remove(&(booking_id, slot_id)).is_some() {
            info!(booking_id = %booking_id, slot_id = %slot_id, "Ticket invalidated");
        }
        Ok(())
    }
}
