use std::sync::Arc;
use uuid::Uuid;

use visita_core::invoice::{InvoiceAdapter, InvoiceRequest};
use visita_core::repository::{
    AdmissionCommand, AdmissionRecord, AdmissionStore, RescheduleRecord, TransitionRecord,
};
use visita_core::ticket::{TicketAdapter, TicketRequest};
use visita_core::AdmissionError;
use visita_domain::BookingStatus;

/// Ties the transactional store to the external collaborators.
///
/// The store commits the booking; this service then fires the
/// post-commit side effects best-effort: a ticket for every booking, an
/// invoice only when there is something to bill. Side-effect failures
/// are logged and never surface to the caller or touch the committed
/// booking.
#[derive(Clone)]
pub struct AdmissionService {
    store: Arc<dyn AdmissionStore>,
    invoices: Arc<dyn InvoiceAdapter>,
    tickets: Arc<dyn TicketAdapter>,
}

impl AdmissionService {
    pub fn new(
        store: Arc<dyn AdmissionStore>,
        invoices: Arc<dyn InvoiceAdapter>,
        tickets: Arc<dyn TicketAdapter>,
    ) -> Self {
        Self {
            store,
            invoices,
            tickets,
        }
    }

    pub fn store(&self) -> &Arc<dyn AdmissionStore> {
        &self.store
    }

    /// Admit a single booking. The admission transaction commits (or
    /// fails) inside the store; side effects run after.
    pub async fn admit(&self, cmd: AdmissionCommand) -> Result<AdmissionRecord, AdmissionError> {
        if cmd.visitor_count < 1 {
            return Err(AdmissionError::InvalidQuantity(cmd.visitor_count));
        }

        let record = self.store.admit(cmd).await?;

        // A fully covered booking must carry a zero price. The store and
        // the database CHECK both enforce this; a violation reaching
        // this point is a logic bug upstream.
        if record.booking.is_fully_covered() && record.booking.total_price_cents != 0 {
            tracing::error!(
                booking_id = %record.booking.id,
                total_price_cents = record.booking.total_price_cents,
                "Fully covered booking committed with a non-zero price"
            );
            return Err(AdmissionError::ConstraintViolation(
                "fully covered booking with non-zero price".into(),
            ));
        }

        for (subscription_id, service_id) in &record.exhausted {
            tracing::info!(
                subscription_id = %subscription_id,
                service_id = %service_id,
                "Package balance exhausted"
            );
        }

        self.dispatch_admission_effects(&record).await;
        Ok(record)
    }

    /// Grouped booking path. Each command is admitted independently; the
    /// invoice suppression rule applies per booking exactly as in the
    /// single path.
    pub async fn admit_many(
        &self,
        cmds: Vec<AdmissionCommand>,
    ) -> Vec<Result<AdmissionRecord, AdmissionError>> {
        let mut results = Vec::with_capacity(cmds.len());
        for cmd in cmds {
            results.push(self.admit(cmd).await);
        }
        results
    }

    pub async fn transition(
        &self,
        booking_id: Uuid,
        new_status: BookingStatus,
    ) -> Result<TransitionRecord, AdmissionError> {
        let record = self.store.transition(booking_id, new_status).await?;
        if let Some(released) = record.released_quantity {
            tracing::info!(
                booking_id = %booking_id,
                released_quantity = released,
                available_after = record.slot_available_after,
                "Released slot capacity"
            );
        }
        Ok(record)
    }

    pub async fn cancel(&self, booking_id: Uuid) -> Result<TransitionRecord, AdmissionError> {
        self.transition(booking_id, BookingStatus::Cancelled).await
    }

    /// Move a booking to a new slot. The store reserves the new slot
    /// before releasing the old one; the old ticket is invalidated and a
    /// fresh one issued for the new `(booking, slot)` pair.
    pub async fn reschedule(
        &self,
        booking_id: Uuid,
        new_slot_id: Uuid,
    ) -> Result<RescheduleRecord, AdmissionError> {
        let record = self.store.change_slot(booking_id, new_slot_id).await?;

        if let Err(e) = self
            .tickets
            .invalidate_ticket(record.booking.id, record.old_slot_id)
            .await
        {
            tracing::error!(booking_id = %record.booking.id, error = %e, "Ticket invalidation failed");
        }
        let ticket = TicketRequest {
            booking_id: record.booking.id,
            slot_id: record.new_slot_id,
            tenant_id: record.booking.tenant_id,
            visitor_count: record.booking.visitor_count,
        };
        if let Err(e) = self.tickets.issue_ticket(&ticket).await {
            tracing::error!(booking_id = %record.booking.id, error = %e, "Ticket re-issue failed");
        }

        Ok(record)
    }

    async fn dispatch_admission_effects(&self, record: &AdmissionRecord) {
        let booking = &record.booking;

        // Tickets are always produced, covered or paid
        let ticket = TicketRequest {
            booking_id: booking.id,
            slot_id: booking.slot_id,
            tenant_id: booking.tenant_id,
            visitor_count: booking.visitor_count,
        };
        if let Err(e) = self.tickets.issue_ticket(&ticket).await {
            tracing::error!(booking_id = %booking.id, error = %e, "Ticket issuance failed");
        }

        // The accounting system is only ever called with a billable
        // amount. Bookings with paid_quantity == 0 or total price == 0
        // never reach it.
        if booking.paid_quantity > 0 && booking.total_price_cents > 0 {
            let invoice = InvoiceRequest {
                booking_id: booking.id,
                tenant_id: booking.tenant_id,
                customer_id: booking.customer_id,
                paid_quantity: booking.paid_quantity,
                total_price_cents: booking.total_price_cents,
                currency: booking.currency.clone(),
            };
            match self.invoices.create_invoice(&invoice).await {
                Ok(external_id) => {
                    tracing::info!(booking_id = %booking.id, invoice_id = %external_id, "Invoice created");
                }
                Err(e) => {
                    tracing::error!(booking_id = %booking.id, error = %e, "Invoice creation failed");
                }
            }
        }
    }
}
