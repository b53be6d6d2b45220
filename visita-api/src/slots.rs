use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Json, Router,
};
use futures_util::{Stream, StreamExt};
use serde::Serialize;
use std::convert::Infallible;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
struct AvailabilityResponse {
    slot_id: Uuid,
    available_capacity: i32,
    booked_count: i32,
    original_capacity: i32,
    is_available: bool,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/slots/{id}/availability", get(slot_availability))
        .route("/v1/slots/{id}/stream", get(slot_stream))
}

async fn slot_availability(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AvailabilityResponse>, AppError> {
    let slot = state
        .admissions
        .store()
        .get_slot(id)
        .await?
        .ok_or_else(|| AppError::NotFoundError(format!("Slot {id} not found")))?;

    Ok(Json(AvailabilityResponse {
        slot_id: slot.id,
        available_capacity: slot.available_capacity,
        booked_count: slot.booked_count,
        original_capacity: slot.original_capacity,
        is_available: slot.is_available,
    }))
}

/// Live capacity updates for one slot, for the reception console's
/// availability board.
async fn slot_stream(
    State(state): State<AppState>,
    Path(slot_id): Path<Uuid>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.sse_tx.subscribe();

    let stream = tokio_stream::wrappers::BroadcastStream::new(rx).filter_map(move |result| {
        async move {
            match result {
                Ok(event) if event.slot_id == slot_id => {
                    let data = serde_json::to_string(&event).ok()?;
                    Some(Ok::<_, Infallible>(
                        Event::default().event("capacity_changed").data(data),
                    ))
                }
                // Other slots' events and lagged-receiver errors are skipped
                _ => None,
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
