use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};

use visita_booking::AdmissionService;
use visita_core::identity::CustomerDirectory;
use visita_shared::models::events::{PackageExhaustedEvent, SlotCapacityChangedEvent};
use visita_store::BusinessRules;

#[derive(Clone)]
pub struct AppState {
    pub admissions: AdmissionService,
    pub directory: Arc<dyn CustomerDirectory>,
    /// Live availability fan-out for the reception console SSE streams.
    pub sse_tx: broadcast::Sender<SlotCapacityChangedEvent>,
    /// Queue feeding the exhaustion notice delivery worker.
    pub notice_tx: mpsc::Sender<PackageExhaustedEvent>,
    pub business_rules: BusinessRules,
}
