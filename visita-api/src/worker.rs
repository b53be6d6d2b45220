use tokio::sync::mpsc;
use tracing::{error, info};

use visita_shared::models::events::PackageExhaustedEvent;

/// Drains the exhaustion notice queue and delivers each notice to the
/// customer's contact channel. Recording is transactional and happened
/// at admission time; delivery here is best-effort and a failure never
/// re-queues (the notice fired exactly once by construction).
pub async fn start_notice_worker(mut rx: mpsc::Receiver<PackageExhaustedEvent>) {
    info!("Exhaustion notice worker started");

    while let Some(event) = rx.recv().await {
        if let Err(e) = deliver_notice(&event).await {
            error!(
                subscription_id = %event.subscription_id,
                error = %e,
                "Failed to deliver exhaustion notice"
            );
        }
    }

    info!("Notice queue closed, worker exiting");
}

async fn deliver_notice(
    event: &PackageExhaustedEvent,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Stand-in for the SMS/email provider call
    info!(
        subscription_id = %event.subscription_id,
        service_id = %event.service_id,
        customer_id = %event.customer_id,
        "Delivering package exhaustion notice"
    );
    Ok(())
}
