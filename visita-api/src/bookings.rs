use axum::{
    extract::{Json, Path, State},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;
use visita_core::identity::{CustomerResolution, CustomerResolver, CustomerSuggestion};
use visita_core::repository::{AdmissionCommand, AdmissionRecord};
use visita_domain::{AdmitBookingRequest, Booking, BookingStatus};
use visita_shared::models::events::{PackageExhaustedEvent, SlotCapacityChangedEvent};

#[derive(Debug, Serialize)]
struct AdmitResponse {
    booking: Booking,
    slot_available_after: i32,
    /// Phone-match suggestions for the operator; present only when the
    /// request carried no verified customer id.
    customer_suggestions: Vec<CustomerSuggestion>,
}

#[derive(Debug, Deserialize)]
struct BulkAdmitRequest {
    bookings: Vec<AdmitBookingRequest>,
}

#[derive(Debug, Serialize)]
struct BulkAdmitItem {
    booking: Option<Booking>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UpdateStatusRequest {
    status: String,
}

#[derive(Debug, Deserialize)]
struct RescheduleRequest {
    new_slot_id: Uuid,
}

#[derive(Debug, Serialize)]
struct TransitionResponse {
    booking: Booking,
    released_quantity: Option<i32>,
    slot_available_after: i32,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/bookings", post(admit_booking))
        .route("/v1/bookings/bulk", post(admit_bookings_bulk))
        .route("/v1/bookings/{id}", get(get_booking))
        .route("/v1/bookings/{id}/status", post(update_status))
        .route("/v1/bookings/{id}/cancel", post(cancel_booking))
        .route("/v1/bookings/{id}/reschedule", post(reschedule_booking))
}

/// Two-tier resolution: a verified id is coverage-eligible, a phone
/// match yields operator suggestions and the booking proceeds as guest.
async fn resolve_customer(
    state: &AppState,
    req: &AdmitBookingRequest,
) -> Result<(Option<Uuid>, Vec<CustomerSuggestion>), AppError> {
    let resolver = CustomerResolver::new(state.directory.clone());
    let resolution = resolver
        .resolve(
            req.tenant_id,
            req.customer_id,
            req.guest_phone.as_ref().map(|p| p.as_inner().as_str()),
        )
        .await
        .map_err(|e| AppError::Anyhow(anyhow::anyhow!(e)))?;

    Ok(match resolution {
        CustomerResolution::Verified(id) => (Some(id), Vec::new()),
        CustomerResolution::Suggestions(suggestions) => (None, suggestions),
        CustomerResolution::Guest => (None, Vec::new()),
    })
}

fn command_for(state: &AppState, req: &AdmitBookingRequest, customer_id: Option<Uuid>) -> AdmissionCommand {
    AdmissionCommand {
        tenant_id: req.tenant_id,
        service_id: req.service_id,
        slot_id: req.slot_id,
        customer_id,
        visitor_count: req.visitor_count,
        price_per_unit_cents: req.price_per_unit_cents,
        currency: state.business_rules.currency.clone(),
        initial_status: BookingStatus::Confirmed,
    }
}

/// Fan out the post-admission events: live availability to SSE
/// subscribers, exhaustion notices to the delivery worker.
async fn publish_admission(state: &AppState, record: &AdmissionRecord) {
    publish_capacity(state, record.booking.slot_id).await;

    if let Some(customer_id) = record.booking.customer_id {
        for (subscription_id, service_id) in &record.exhausted {
            let event = PackageExhaustedEvent {
                subscription_id: *subscription_id,
                service_id: *service_id,
                customer_id,
                timestamp: Utc::now().timestamp(),
            };
            if state.notice_tx.try_send(event).is_err() {
                tracing::warn!(
                    subscription_id = %subscription_id,
                    "Notice queue full, dropping exhaustion notice delivery"
                );
            }
        }
    }
}

async fn publish_capacity(state: &AppState, slot_id: Uuid) {
    match state.admissions.store().get_slot(slot_id).await {
        Ok(Some(slot)) => {
            let _ = state.sse_tx.send(SlotCapacityChangedEvent {
                slot_id,
                available_capacity: slot.available_capacity,
                booked_count: slot.booked_count,
                timestamp: Utc::now().timestamp(),
            });
        }
        Ok(None) => {}
        Err(e) => tracing::warn!(slot_id = %slot_id, error = %e, "Failed to read slot for SSE event"),
    }
}

async fn admit_booking(
    State(state): State<AppState>,
    Json(req): Json<AdmitBookingRequest>,
) -> Result<Json<AdmitResponse>, AppError> {
    let (customer_id, customer_suggestions) = resolve_customer(&state, &req).await?;
    let record = state
        .admissions
        .admit(command_for(&state, &req, customer_id))
        .await?;

    publish_admission(&state, &record).await;
    info!(
        booking_id = %record.booking.id,
        slot_id = %record.booking.slot_id,
        visitor_count = record.booking.visitor_count,
        "Booking admitted"
    );

    Ok(Json(AdmitResponse {
        slot_available_after: record.slot_available_after,
        booking: record.booking,
        customer_suggestions,
    }))
}

async fn admit_bookings_bulk(
    State(state): State<AppState>,
    Json(req): Json<BulkAdmitRequest>,
) -> Result<Json<Vec<BulkAdmitItem>>, AppError> {
    if req.bookings.is_empty() {
        return Err(AppError::ValidationError("Empty booking list".to_string()));
    }

    let mut commands = Vec::with_capacity(req.bookings.len());
    for item in &req.bookings {
        let (customer_id, _) = resolve_customer(&state, item).await?;
        commands.push(command_for(&state, item, customer_id));
    }

    let results = state.admissions.admit_many(commands).await;

    let mut items = Vec::with_capacity(results.len());
    for result in results {
        match result {
            Ok(record) => {
                publish_admission(&state, &record).await;
                items.push(BulkAdmitItem {
                    booking: Some(record.booking),
                    error: None,
                });
            }
            Err(e) => items.push(BulkAdmitItem {
                booking: None,
                error: Some(e.to_string()),
            }),
        }
    }

    Ok(Json(items))
}

async fn get_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>, AppError> {
    let booking = state
        .admissions
        .store()
        .get_booking(id)
        .await?
        .ok_or_else(|| AppError::NotFoundError(format!("Booking {id} not found")))?;
    Ok(Json(booking))
}

async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<TransitionResponse>, AppError> {
    let new_status = BookingStatus::parse(&req.status)
        .ok_or_else(|| AppError::ValidationError(format!("Unknown status '{}'", req.status)))?;

    let record = state.admissions.transition(id, new_status).await?;
    if record.released_quantity.is_some() {
        publish_capacity(&state, record.booking.slot_id).await;
    }

    Ok(Json(TransitionResponse {
        released_quantity: record.released_quantity,
        slot_available_after: record.slot_available_after,
        booking: record.booking,
    }))
}

async fn cancel_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TransitionResponse>, AppError> {
    let record = state.admissions.cancel(id).await?;
    publish_capacity(&state, record.booking.slot_id).await;
    info!(booking_id = %id, "Booking cancelled");

    Ok(Json(TransitionResponse {
        released_quantity: record.released_quantity,
        slot_available_after: record.slot_available_after,
        booking: record.booking,
    }))
}

async fn reschedule_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<RescheduleRequest>,
) -> Result<Json<Booking>, AppError> {
    let record = state.admissions.reschedule(id, req.new_slot_id).await?;

    // Both slots changed counters
    publish_capacity(&state, record.old_slot_id).await;
    publish_capacity(&state, record.new_slot_id).await;
    info!(
        booking_id = %id,
        old_slot_id = %record.old_slot_id,
        new_slot_id = %record.new_slot_id,
        "Booking rescheduled"
    );

    Ok(Json(record.booking))
}
