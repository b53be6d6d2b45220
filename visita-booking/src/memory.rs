use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::counters::SlotCounters;
use crate::coverage::{plan_coverage, total_price_cents, CoverageDraw, CoveragePlan, SubscriptionBalance};
use crate::lifecycle::{capacity_effect, CapacityEffect};
use visita_core::repository::{
    AdmissionCommand, AdmissionRecord, AdmissionStore, RescheduleRecord, TransitionRecord,
};
use visita_core::AdmissionError;
use visita_domain::{
    Booking, BookingStatus, PackageSubscription, PaymentStatus, Slot, SubscriptionStatus,
};

#[derive(Default)]
struct MemoryState {
    slots: HashMap<Uuid, Slot>,
    bookings: HashMap<Uuid, Booking>,
    subscriptions: HashMap<Uuid, PackageSubscription>,
    /// Per-booking coverage draws, needed to restore balances on
    /// cancellation.
    draws: HashMap<Uuid, Vec<CoverageDraw>>,
    /// Capacity taken from overlapping same-resource slots at admission,
    /// restored exactly when the booking releases.
    holds: HashMap<Uuid, Vec<(Uuid, i32)>>,
    /// One-time exhaustion notices; never removed once recorded.
    exhaustion_notices: HashSet<(Uuid, Uuid)>,
}

/// In-memory admission store. Carries the exact semantics of the
/// Postgres store: the single mutex plays the role of the row locks,
/// serializing conflicting admissions, and every method applies all of
/// its effects or none. Used by unit/integration tests and local demos.
pub struct MemoryAdmissionStore {
    state: Mutex<MemoryState>,
    overlap_release: bool,
}

impl Default for MemoryAdmissionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryAdmissionStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MemoryState::default()),
            overlap_release: true,
        }
    }

    pub fn with_overlap_release(overlap_release: bool) -> Self {
        Self {
            state: Mutex::new(MemoryState::default()),
            overlap_release,
        }
    }

    pub async fn add_slot(&self, slot: Slot) {
        self.state.lock().await.slots.insert(slot.id, slot);
    }

    pub async fn add_subscription(&self, subscription: PackageSubscription) {
        self.state
            .lock()
            .await
            .subscriptions
            .insert(subscription.id, subscription);
    }

    pub async fn exhaustion_notice_count(&self) -> usize {
        self.state.lock().await.exhaustion_notices.len()
    }

    /// Conservation check over every slot; test helper.
    pub async fn all_slots_consistent(&self) -> bool {
        self.state.lock().await.slots.values().all(|s| {
            SlotCounters::new(s.original_capacity, s.available_capacity, s.booked_count)
                .is_consistent()
        })
    }
}

/// Snapshot the customer's usable balances for a service, oldest
/// subscription first. Mirrors the ORDER BY created_at, id of the
/// Postgres store so coverage precedence is identical.
fn balances_for(
    state: &MemoryState,
    customer_id: Uuid,
    service_id: Uuid,
) -> Vec<SubscriptionBalance> {
    let mut eligible: Vec<&PackageSubscription> = state
        .subscriptions
        .values()
        .filter(|s| s.customer_id == customer_id && s.status == SubscriptionStatus::Active)
        .filter(|s| s.entitlement_for(service_id).is_some())
        .collect();
    eligible.sort_by_key(|s| (s.created_at, s.id));

    eligible
        .into_iter()
        .map(|s| SubscriptionBalance {
            subscription_id: s.id,
            remaining_quantity: s
                .entitlement_for(service_id)
                .map(|e| e.remaining_quantity)
                .unwrap_or(0),
        })
        .collect()
}

fn apply_draws(
    state: &mut MemoryState,
    service_id: Uuid,
    plan: &CoveragePlan,
) -> Result<Vec<(Uuid, Uuid)>, AdmissionError> {
    let mut newly_exhausted = Vec::new();
    for draw in &plan.draws {
        let subscription = state
            .subscriptions
            .get_mut(&draw.subscription_id)
            .ok_or_else(|| AdmissionError::Storage("subscription vanished mid-plan".into()))?;
        let entitlement = subscription
            .entitlement_for_mut(service_id)
            .ok_or_else(|| AdmissionError::Storage("entitlement vanished mid-plan".into()))?;
        let drawn = entitlement.consume(draw.quantity);
        if drawn != draw.quantity {
            return Err(AdmissionError::Storage(
                "subscription balance changed under lock".into(),
            ));
        }
        subscription.updated_at = Utc::now();

        if draw.exhausts {
            let key = (draw.subscription_id, service_id);
            if state.exhaustion_notices.insert(key) {
                newly_exhausted.push(key);
            }
        }
    }
    Ok(newly_exhausted)
}

/// Take capacity from the other slots of the same resource/date whose
/// time ranges overlap the booked slot, clamped to what each sibling
/// has available, and record the per-slot amounts under the booking so
/// release can undo exactly what was taken.
fn hold_overlapping(state: &mut MemoryState, booking_id: Uuid, anchor: &Slot, quantity: i32) {
    let Some(resource_id) = anchor.resource_id else {
        return;
    };

    let mut taken = Vec::new();
    for other in state.slots.values_mut() {
        if other.id == anchor.id
            || other.resource_id != Some(resource_id)
            || !anchor.overlaps(other)
        {
            continue;
        }
        let take = quantity.min(other.available_capacity);
        if take == 0 {
            continue;
        }
        other.available_capacity -= take;
        other.booked_count += take;
        other.updated_at = Utc::now();
        taken.push((other.id, take));
    }
    if !taken.is_empty() {
        state.holds.insert(booking_id, taken);
    }
}

/// Release capacity on `slot_id` and hand back whatever the booking
/// held on overlapping siblings. Restoration is exact, never clamped:
/// only the recorded amounts go back, so a cancel can never inflate a
/// sibling's availability past its own bookings. Returns the released
/// slot's available count after the update.
fn release_slot(
    state: &mut MemoryState,
    booking_id: Uuid,
    slot_id: Uuid,
    quantity: i32,
) -> Result<i32, AdmissionError> {
    let available = {
        let slot = state
            .slots
            .get_mut(&slot_id)
            .ok_or(AdmissionError::SlotNotFound(slot_id))?;
        let mut counters =
            SlotCounters::new(slot.original_capacity, slot.available_capacity, slot.booked_count);
        counters.release(quantity);
        slot.available_capacity = counters.available;
        slot.booked_count = counters.booked;
        slot.updated_at = Utc::now();
        slot.available_capacity
    };

    if let Some(taken) = state.holds.remove(&booking_id) {
        for (held_slot_id, held) in taken {
            if let Some(other) = state.slots.get_mut(&held_slot_id) {
                other.available_capacity += held;
                other.booked_count -= held;
                other.updated_at = Utc::now();
            }
        }
    }

    Ok(available)
}

#[async_trait]
impl AdmissionStore for MemoryAdmissionStore {
    async fn admit(&self, cmd: AdmissionCommand) -> Result<AdmissionRecord, AdmissionError> {
        if cmd.visitor_count < 1 {
            return Err(AdmissionError::InvalidQuantity(cmd.visitor_count));
        }
        if !cmd.initial_status.holds_capacity() {
            return Err(AdmissionError::ConstraintViolation(
                "initial booking status must be an active status".into(),
            ));
        }

        let mut state = self.state.lock().await;

        // 1. Lock the slot (the mutex stands in for FOR UPDATE)
        let slot = state
            .slots
            .get(&cmd.slot_id)
            .ok_or(AdmissionError::SlotNotFound(cmd.slot_id))?;
        if !slot.is_available {
            return Err(AdmissionError::SlotUnavailable(cmd.slot_id));
        }
        let mut counters =
            SlotCounters::new(slot.original_capacity, slot.available_capacity, slot.booked_count);

        // 2. Resolve package coverage
        let plan = match cmd.customer_id {
            Some(customer_id) => {
                let balances = balances_for(&state, customer_id, cmd.service_id);
                plan_coverage(&balances, cmd.visitor_count)
            }
            None => CoveragePlan::uncovered(cmd.visitor_count),
        };

        // 3. Reserve capacity; failure aborts before any mutation
        counters.try_reserve(cmd.visitor_count)?;

        // 4. Price + fully-covered invariant (backstop for the DB CHECK)
        let total_price = total_price_cents(&plan, cmd.price_per_unit_cents);
        if plan.is_fully_covered() && total_price != 0 {
            return Err(AdmissionError::ConstraintViolation(format!(
                "fully covered booking priced at {} cents",
                total_price
            )));
        }

        // 5. Apply: counters, overlap holds, package draws, booking row
        let booking_id = Uuid::new_v4();
        let exhausted = apply_draws(&mut state, cmd.service_id, &plan)?;

        let slot = state
            .slots
            .get_mut(&cmd.slot_id)
            .ok_or(AdmissionError::SlotNotFound(cmd.slot_id))?;
        slot.available_capacity = counters.available;
        slot.booked_count = counters.booked;
        slot.updated_at = Utc::now();
        let slot_available_after = slot.available_capacity;
        let anchor = slot.clone();

        if self.overlap_release {
            hold_overlapping(&mut state, booking_id, &anchor, cmd.visitor_count);
        }

        let now = Utc::now();
        let booking = Booking {
            id: booking_id,
            tenant_id: cmd.tenant_id,
            service_id: cmd.service_id,
            slot_id: cmd.slot_id,
            customer_id: cmd.customer_id,
            visitor_count: cmd.visitor_count,
            package_covered_quantity: plan.covered_quantity,
            paid_quantity: plan.paid_quantity,
            package_subscription_id: plan.primary_subscription_id,
            total_price_cents: total_price,
            currency: cmd.currency.clone(),
            status: cmd.initial_status,
            payment_status: if plan.paid_quantity == 0 {
                PaymentStatus::NotRequired
            } else {
                PaymentStatus::Unpaid
            },
            created_at: now,
            updated_at: now,
        };
        state.bookings.insert(booking.id, booking.clone());
        if !plan.draws.is_empty() {
            state.draws.insert(booking.id, plan.draws.clone());
        }

        Ok(AdmissionRecord {
            booking,
            slot_available_after,
            exhausted,
        })
    }

    async fn transition(
        &self,
        booking_id: Uuid,
        new_status: BookingStatus,
    ) -> Result<TransitionRecord, AdmissionError> {
        let mut state = self.state.lock().await;

        let booking = state
            .bookings
            .get(&booking_id)
            .ok_or(AdmissionError::BookingNotFound(booking_id))?
            .clone();
        let effect = capacity_effect(booking.status, new_status)?;

        let (released_quantity, slot_available_after) = match effect {
            CapacityEffect::None => {
                let slot_available = state
                    .slots
                    .get(&booking.slot_id)
                    .map(|s| s.available_capacity)
                    .ok_or(AdmissionError::SlotNotFound(booking.slot_id))?;
                (None, slot_available)
            }
            CapacityEffect::Release => {
                let available =
                    release_slot(&mut state, booking_id, booking.slot_id, booking.visitor_count)?;

                // Cancellation restores the package balance; completion
                // consumes it for good.
                if new_status == BookingStatus::Cancelled {
                    if let Some(draws) = state.draws.remove(&booking_id) {
                        for draw in draws {
                            if let Some(sub) = state.subscriptions.get_mut(&draw.subscription_id) {
                                if let Some(ent) = sub.entitlement_for_mut(booking.service_id) {
                                    ent.restore(draw.quantity);
                                }
                                sub.updated_at = Utc::now();
                            }
                        }
                    }
                }

                (Some(booking.visitor_count), available)
            }
        };

        let stored = state
            .bookings
            .get_mut(&booking_id)
            .ok_or(AdmissionError::BookingNotFound(booking_id))?;
        stored.update_status(new_status);
        if new_status == BookingStatus::Cancelled && stored.payment_status == PaymentStatus::Paid {
            stored.payment_status = PaymentStatus::Refunded;
        }
        let booking = stored.clone();

        Ok(TransitionRecord {
            booking,
            released_quantity,
            slot_available_after,
        })
    }

    async fn change_slot(
        &self,
        booking_id: Uuid,
        new_slot_id: Uuid,
    ) -> Result<RescheduleRecord, AdmissionError> {
        let mut state = self.state.lock().await;

        let booking = state
            .bookings
            .get(&booking_id)
            .ok_or(AdmissionError::BookingNotFound(booking_id))?
            .clone();
        if !booking.status.holds_capacity() {
            return Err(AdmissionError::InvalidTransition {
                from: booking.status.as_str().to_string(),
                to: booking.status.as_str().to_string(),
            });
        }
        let old_slot_id = booking.slot_id;
        if old_slot_id == new_slot_id {
            return Err(AdmissionError::ConstraintViolation(
                "reschedule target is the current slot".into(),
            ));
        }

        // 1. Reserve the new slot first; on failure the old reservation
        //    is untouched
        {
            let new_slot = state
                .slots
                .get_mut(&new_slot_id)
                .ok_or(AdmissionError::SlotNotFound(new_slot_id))?;
            if !new_slot.is_available {
                return Err(AdmissionError::SlotUnavailable(new_slot_id));
            }
            if new_slot.service_id != booking.service_id {
                return Err(AdmissionError::ConstraintViolation(
                    "target slot serves a different service".into(),
                ));
            }
            let mut counters = SlotCounters::new(
                new_slot.original_capacity,
                new_slot.available_capacity,
                new_slot.booked_count,
            );
            counters.try_reserve(booking.visitor_count)?;
            new_slot.available_capacity = counters.available;
            new_slot.booked_count = counters.booked;
            new_slot.updated_at = Utc::now();
        }

        // 2. Release the old reservation, including its overlap holds,
        //    then take fresh holds around the new slot
        release_slot(&mut state, booking_id, old_slot_id, booking.visitor_count)?;
        if self.overlap_release {
            let anchor = state
                .slots
                .get(&new_slot_id)
                .cloned()
                .ok_or(AdmissionError::SlotNotFound(new_slot_id))?;
            hold_overlapping(&mut state, booking_id, &anchor, booking.visitor_count);
        }

        // 3. Repoint the booking
        let stored = state
            .bookings
            .get_mut(&booking_id)
            .ok_or(AdmissionError::BookingNotFound(booking_id))?;
        stored.slot_id = new_slot_id;
        stored.updated_at = Utc::now();
        let booking = stored.clone();

        Ok(RescheduleRecord {
            booking,
            old_slot_id,
            new_slot_id,
        })
    }

    async fn get_booking(&self, id: Uuid) -> Result<Option<Booking>, AdmissionError> {
        Ok(self.state.lock().await.bookings.get(&id).cloned())
    }

    async fn get_slot(&self, id: Uuid) -> Result<Option<Slot>, AdmissionError> {
        Ok(self.state.lock().await.slots.get(&id).cloned())
    }

    async fn get_subscription(
        &self,
        id: Uuid,
    ) -> Result<Option<PackageSubscription>, AdmissionError> {
        Ok(self.state.lock().await.subscriptions.get(&id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use visita_core::repository::AdmissionCommand;

    fn slot_on(
        service_id: Uuid,
        resource_id: Option<Uuid>,
        start: &str,
        end: &str,
        available: i32,
        booked: i32,
    ) -> Slot {
        let now = Utc::now();
        Slot {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            service_id,
            resource_id,
            date: NaiveDate::from_ymd_opt(2026, 6, 1).unwrap(),
            start_time: start.parse().unwrap(),
            end_time: end.parse().unwrap(),
            original_capacity: available + booked,
            available_capacity: available,
            booked_count: booked,
            is_available: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn cmd(slot: &Slot, count: i32) -> AdmissionCommand {
        AdmissionCommand {
            tenant_id: slot.tenant_id,
            service_id: slot.service_id,
            slot_id: slot.id,
            customer_id: None,
            visitor_count: count,
            price_per_unit_cents: 1000,
            currency: "PKR".to_string(),
            initial_status: BookingStatus::Confirmed,
        }
    }

    #[tokio::test]
    async fn test_overlap_hold_taken_at_admission_and_returned_on_release() {
        let store = MemoryAdmissionStore::new();
        let service_id = Uuid::new_v4();
        let resource_id = Some(Uuid::new_v4());

        let anchor = slot_on(service_id, resource_id, "10:00:00", "11:00:00", 3, 0);
        // Only one unit left: the hold clamps to it
        let sibling = slot_on(service_id, resource_id, "10:30:00", "11:30:00", 1, 2);
        // Plenty left: the hold takes the full visitor count
        let idle = slot_on(service_id, resource_id, "10:45:00", "11:15:00", 3, 0);
        // Adjacent, not overlapping: untouched
        let later = slot_on(service_id, resource_id, "11:00:00", "12:00:00", 1, 2);

        let sibling_id = sibling.id;
        let idle_id = idle.id;
        let later_id = later.id;
        store.add_slot(anchor.clone()).await;
        store.add_slot(sibling).await;
        store.add_slot(idle).await;
        store.add_slot(later).await;

        let record = store.admit(cmd(&anchor, 2)).await.unwrap();

        let sibling = store.get_slot(sibling_id).await.unwrap().unwrap();
        assert_eq!(sibling.available_capacity, 0);
        assert_eq!(sibling.booked_count, 3);
        let idle = store.get_slot(idle_id).await.unwrap().unwrap();
        assert_eq!(idle.available_capacity, 1);
        assert_eq!(idle.booked_count, 2);
        let later = store.get_slot(later_id).await.unwrap().unwrap();
        assert_eq!(later.available_capacity, 1);
        assert!(store.all_slots_consistent().await);

        store
            .transition(record.booking.id, BookingStatus::Cancelled)
            .await
            .unwrap();

        let anchor = store.get_slot(anchor.id).await.unwrap().unwrap();
        assert_eq!(anchor.available_capacity, 3);
        let sibling = store.get_slot(sibling_id).await.unwrap().unwrap();
        assert_eq!(sibling.available_capacity, 1);
        assert_eq!(sibling.booked_count, 2);
        let idle = store.get_slot(idle_id).await.unwrap().unwrap();
        assert_eq!(idle.available_capacity, 3);
        assert_eq!(idle.booked_count, 0);
        assert!(store.all_slots_consistent().await);
    }

    #[tokio::test]
    async fn test_cancel_cannot_inflate_sibling_capacity() {
        let store = MemoryAdmissionStore::new();
        let service_id = Uuid::new_v4();
        let resource_id = Some(Uuid::new_v4());

        let anchor = slot_on(service_id, resource_id, "10:00:00", "11:00:00", 3, 0);
        let sibling = slot_on(service_id, resource_id, "10:30:00", "11:30:00", 3, 0);
        store.add_slot(anchor.clone()).await;
        store.add_slot(sibling.clone()).await;

        // Two real visitors on the sibling leave one unit free
        store.admit(cmd(&sibling, 2)).await.unwrap();

        // A booking cycle on the overlapping anchor must hand back
        // exactly what it took: the sibling ends where it started
        let record = store.admit(cmd(&anchor, 1)).await.unwrap();
        let held = store.get_slot(sibling.id).await.unwrap().unwrap();
        assert_eq!(held.available_capacity, 0);
        store
            .transition(record.booking.id, BookingStatus::Cancelled)
            .await
            .unwrap();

        let after = store.get_slot(sibling.id).await.unwrap().unwrap();
        assert_eq!(after.available_capacity, 1);
        assert_eq!(after.booked_count, 2);

        // One more admit fills the sibling; the next cannot oversell
        store.admit(cmd(&sibling, 1)).await.unwrap();
        let err = store.admit(cmd(&sibling, 1)).await.unwrap_err();
        assert!(matches!(
            err,
            AdmissionError::InsufficientCapacity { available: 0, requested: 1 }
        ));
        assert!(store.all_slots_consistent().await);
    }

    #[tokio::test]
    async fn test_overlap_holds_disabled_touches_only_the_slot() {
        let store = MemoryAdmissionStore::with_overlap_release(false);
        let service_id = Uuid::new_v4();
        let resource_id = Some(Uuid::new_v4());

        let anchor = slot_on(service_id, resource_id, "10:00:00", "11:00:00", 3, 0);
        let sibling = slot_on(service_id, resource_id, "10:30:00", "11:30:00", 1, 2);
        let sibling_id = sibling.id;
        store.add_slot(anchor.clone()).await;
        store.add_slot(sibling).await;

        let record = store.admit(cmd(&anchor, 2)).await.unwrap();
        let sibling = store.get_slot(sibling_id).await.unwrap().unwrap();
        assert_eq!(sibling.available_capacity, 1);

        store
            .transition(record.booking.id, BookingStatus::Cancelled)
            .await
            .unwrap();
        let sibling = store.get_slot(sibling_id).await.unwrap().unwrap();
        assert_eq!(sibling.available_capacity, 1);
        assert_eq!(sibling.booked_count, 2);
    }

    #[tokio::test]
    async fn test_unscoped_slots_never_cascade() {
        let store = MemoryAdmissionStore::new();
        let service_id = Uuid::new_v4();

        // No resource: overlap holds do not apply
        let anchor = slot_on(service_id, None, "10:00:00", "11:00:00", 3, 0);
        let other = slot_on(service_id, None, "10:30:00", "11:30:00", 1, 2);
        let other_id = other.id;
        store.add_slot(anchor.clone()).await;
        store.add_slot(other).await;

        let record = store.admit(cmd(&anchor, 1)).await.unwrap();
        let other_held = store.get_slot(other_id).await.unwrap().unwrap();
        assert_eq!(other_held.available_capacity, 1);

        store
            .transition(record.booking.id, BookingStatus::Cancelled)
            .await
            .unwrap();

        let other = store.get_slot(other_id).await.unwrap().unwrap();
        assert_eq!(other.available_capacity, 1);
    }

    #[tokio::test]
    async fn test_reschedule_moves_overlap_holds_to_the_new_slot() {
        let store = MemoryAdmissionStore::new();
        let service_id = Uuid::new_v4();
        let resource_id = Some(Uuid::new_v4());

        let morning = slot_on(service_id, resource_id, "10:00:00", "11:00:00", 3, 0);
        let morning_twin = slot_on(service_id, resource_id, "10:30:00", "11:30:00", 2, 0);
        let evening = slot_on(service_id, resource_id, "17:00:00", "18:00:00", 2, 0);
        let evening_twin = slot_on(service_id, resource_id, "17:30:00", "18:30:00", 2, 0);
        store.add_slot(morning.clone()).await;
        store.add_slot(morning_twin.clone()).await;
        store.add_slot(evening.clone()).await;
        store.add_slot(evening_twin.clone()).await;

        let record = store.admit(cmd(&morning, 1)).await.unwrap();
        let held = store.get_slot(morning_twin.id).await.unwrap().unwrap();
        assert_eq!(held.available_capacity, 1);

        store.change_slot(record.booking.id, evening.id).await.unwrap();

        let freed = store.get_slot(morning_twin.id).await.unwrap().unwrap();
        assert_eq!(freed.available_capacity, 2);
        assert_eq!(freed.booked_count, 0);
        let now_held = store.get_slot(evening_twin.id).await.unwrap().unwrap();
        assert_eq!(now_held.available_capacity, 1);
        assert_eq!(now_held.booked_count, 1);
        assert!(store.all_slots_consistent().await);
    }
}
