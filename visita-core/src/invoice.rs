use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use uuid::Uuid;

/// Payload handed to the external accounting system.
///
/// Call-site contract (enforced by the orchestrator, not here): an
/// invoice is requested only when `paid_quantity > 0` and
/// `total_price_cents > 0`. A fully package-covered booking must never
/// reach any `InvoiceAdapter`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceRequest {
    pub booking_id: Uuid,
    pub tenant_id: Uuid,
    pub customer_id: Option<Uuid>,
    pub paid_quantity: i32,
    pub total_price_cents: i64,
    pub currency: String,
}

#[async_trait]
pub trait InvoiceAdapter: Send + Sync {
    /// Create an invoice with the provider, returning its external id.
    async fn create_invoice(
        &self,
        request: &InvoiceRequest,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>>;
}

/// In-memory adapter used in tests and local runs. Records every request
/// so tests can assert the suppression rule (zero invocations for
/// fully-covered bookings).
#[derive(Default)]
pub struct MockInvoiceAdapter {
    requests: Mutex<Vec<InvoiceRequest>>,
    fail_next: Mutex<bool>,
}

impl MockInvoiceAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn recorded_requests(&self) -> Vec<InvoiceRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn invocation_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Make the next create_invoice call fail, for testing the
    /// best-effort post-commit path.
    pub fn fail_next(&self) {
        *self.fail_next.lock().unwrap() = true;
    }
}

#[async_trait]
impl InvoiceAdapter for MockInvoiceAdapter {
    async fn create_invoice(
        &self,
        request: &InvoiceRequest,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        let mut fail = self.fail_next.lock().unwrap();
        if *fail {
            *fail = false;
            return Err("Simulated accounting API failure".into());
        }
        drop(fail);

        self.requests.lock().unwrap().push(request.clone());
        Ok(format!("mock_inv_{}", request.booking_id.simple()))
    }
}
