use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

use crate::app_config::BusinessRules;
use visita_booking::counters::SlotCounters;
use visita_booking::coverage::{
    plan_coverage, total_price_cents, CoveragePlan, SubscriptionBalance,
};
use visita_booking::lifecycle::{capacity_effect, CapacityEffect};
use visita_core::repository::{
    AdmissionCommand, AdmissionRecord, AdmissionStore, RescheduleRecord, TransitionRecord,
};
use visita_core::AdmissionError;
use visita_domain::{
    Booking, BookingStatus, PackageSubscription, PaymentStatus, ServiceEntitlement, Slot,
    SubscriptionStatus,
};

/// Postgres-backed admission store.
///
/// Every write runs in a single transaction with the slot row locked
/// via `SELECT ... FOR UPDATE`; subscription usage rows are locked in
/// creation order so concurrent coverage draws cannot deadlock.
/// `SET LOCAL lock_timeout` bounds the wait; SQLSTATE 55P03 surfaces as
/// the retryable `LockTimeout` rather than a capacity failure.
pub struct PgAdmissionStore {
    pool: PgPool,
    rules: BusinessRules,
}

impl PgAdmissionStore {
    pub fn new(pool: PgPool, rules: BusinessRules) -> Self {
        Self { pool, rules }
    }

    async fn begin(&self) -> Result<Transaction<'static, Postgres>, AdmissionError> {
        let mut tx = self.pool.begin().await.map_err(map_db_err)?;
        // lock_timeout cannot be bound as a parameter
        let stmt = format!("SET LOCAL lock_timeout = '{}ms'", self.rules.lock_timeout_ms);
        sqlx::query(&stmt).execute(&mut *tx).await.map_err(map_db_err)?;
        Ok(tx)
    }
}

fn map_db_err(e: sqlx::Error) -> AdmissionError {
    if let sqlx::Error::Database(db) = &e {
        if db.code().as_deref() == Some("55P03") {
            return AdmissionError::LockTimeout;
        }
        if matches!(db.kind(), sqlx::error::ErrorKind::CheckViolation) {
            return AdmissionError::ConstraintViolation(db.message().to_string());
        }
    }
    AdmissionError::Storage(e.to_string())
}

#[derive(sqlx::FromRow)]
struct SlotRow {
    id: Uuid,
    tenant_id: Uuid,
    service_id: Uuid,
    resource_id: Option<Uuid>,
    date: chrono::NaiveDate,
    start_time: chrono::NaiveTime,
    end_time: chrono::NaiveTime,
    original_capacity: i32,
    available_capacity: i32,
    booked_count: i32,
    is_available: bool,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl SlotRow {
    fn into_slot(self) -> Slot {
        Slot {
            id: self.id,
            tenant_id: self.tenant_id,
            service_id: self.service_id,
            resource_id: self.resource_id,
            date: self.date,
            start_time: self.start_time,
            end_time: self.end_time,
            original_capacity: self.original_capacity,
            available_capacity: self.available_capacity,
            booked_count: self.booked_count,
            is_available: self.is_available,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    tenant_id: Uuid,
    service_id: Uuid,
    slot_id: Uuid,
    customer_id: Option<Uuid>,
    visitor_count: i32,
    package_covered_quantity: i32,
    paid_quantity: i32,
    package_subscription_id: Option<Uuid>,
    total_price_cents: i64,
    currency: String,
    status: String,
    payment_status: String,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl BookingRow {
    fn into_booking(self) -> Result<Booking, AdmissionError> {
        let status = BookingStatus::parse(&self.status).ok_or_else(|| {
            AdmissionError::Storage(format!("unknown booking status '{}'", self.status))
        })?;
        let payment_status = PaymentStatus::parse(&self.payment_status).ok_or_else(|| {
            AdmissionError::Storage(format!("unknown payment status '{}'", self.payment_status))
        })?;
        Ok(Booking {
            id: self.id,
            tenant_id: self.tenant_id,
            service_id: self.service_id,
            slot_id: self.slot_id,
            customer_id: self.customer_id,
            visitor_count: self.visitor_count,
            package_covered_quantity: self.package_covered_quantity,
            paid_quantity: self.paid_quantity,
            package_subscription_id: self.package_subscription_id,
            total_price_cents: self.total_price_cents,
            currency: self.currency,
            status,
            payment_status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const SLOT_COLUMNS: &str = "id, tenant_id, service_id, resource_id, date, start_time, end_time, \
     original_capacity, available_capacity, booked_count, is_available, created_at, updated_at";

const BOOKING_COLUMNS: &str = "id, tenant_id, service_id, slot_id, customer_id, visitor_count, \
     package_covered_quantity, paid_quantity, package_subscription_id, total_price_cents, \
     currency, status, payment_status, created_at, updated_at";

async fn lock_slot(
    tx: &mut Transaction<'_, Postgres>,
    slot_id: Uuid,
) -> Result<Slot, AdmissionError> {
    let sql = format!("SELECT {SLOT_COLUMNS} FROM slots WHERE id = $1 FOR UPDATE");
    let row = sqlx::query_as::<_, SlotRow>(&sql)
        .bind(slot_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(map_db_err)?
        .ok_or(AdmissionError::SlotNotFound(slot_id))?;
    Ok(row.into_slot())
}

/// Lock and snapshot the customer's usable balances for a service,
/// oldest subscription first. The fixed ordering keeps concurrent
/// multi-subscription draws deadlock-free and coverage deterministic.
async fn lock_balances(
    tx: &mut Transaction<'_, Postgres>,
    tenant_id: Uuid,
    customer_id: Uuid,
    service_id: Uuid,
) -> Result<Vec<SubscriptionBalance>, AdmissionError> {
    let rows = sqlx::query(
        r#"
        SELECT u.subscription_id, u.remaining_quantity
        FROM package_subscription_usage u
        JOIN package_subscriptions s ON s.id = u.subscription_id
        WHERE s.tenant_id = $1 AND s.customer_id = $2
          AND s.status = 'ACTIVE' AND u.service_id = $3
        ORDER BY s.created_at, s.id
        FOR UPDATE OF u
        "#,
    )
    .bind(tenant_id)
    .bind(customer_id)
    .bind(service_id)
    .fetch_all(&mut **tx)
    .await
    .map_err(map_db_err)?;

    Ok(rows
        .into_iter()
        .map(|row| SubscriptionBalance {
            subscription_id: row.get("subscription_id"),
            remaining_quantity: row.get("remaining_quantity"),
        })
        .collect())
}

async fn write_slot_counters(
    tx: &mut Transaction<'_, Postgres>,
    slot_id: Uuid,
    counters: SlotCounters,
) -> Result<(), AdmissionError> {
    sqlx::query(
        "UPDATE slots SET available_capacity = $1, booked_count = $2, updated_at = NOW() WHERE id = $3",
    )
    .bind(counters.available)
    .bind(counters.booked)
    .bind(slot_id)
    .execute(&mut **tx)
    .await
    .map_err(map_db_err)?;
    Ok(())
}

/// Apply the coverage plan: decrement usage ledgers, record per-booking
/// draws for later restoration, and record first-time exhaustion
/// notices. Returns the newly exhausted `(subscription, service)` pairs.
async fn apply_draws(
    tx: &mut Transaction<'_, Postgres>,
    booking_id: Uuid,
    service_id: Uuid,
    plan: &CoveragePlan,
) -> Result<Vec<(Uuid, Uuid)>, AdmissionError> {
    let mut newly_exhausted = Vec::new();

    for draw in &plan.draws {
        let result = sqlx::query(
            r#"
            UPDATE package_subscription_usage
            SET used_quantity = used_quantity + $1,
                remaining_quantity = remaining_quantity - $1,
                updated_at = NOW()
            WHERE subscription_id = $2 AND service_id = $3 AND remaining_quantity >= $1
            "#,
        )
        .bind(draw.quantity)
        .bind(draw.subscription_id)
        .bind(service_id)
        .execute(&mut **tx)
        .await
        .map_err(map_db_err)?;
        if result.rows_affected() != 1 {
            // Balance moved despite the row lock; abort the admission
            return Err(AdmissionError::Storage(
                "subscription balance changed under lock".into(),
            ));
        }

        sqlx::query(
            r#"
            INSERT INTO booking_package_draws (booking_id, subscription_id, service_id, quantity)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(booking_id)
        .bind(draw.subscription_id)
        .bind(service_id)
        .bind(draw.quantity)
        .execute(&mut **tx)
        .await
        .map_err(map_db_err)?;

        if draw.exhausts {
            let inserted = sqlx::query(
                r#"
                INSERT INTO package_exhaustion_notices (subscription_id, service_id)
                VALUES ($1, $2)
                ON CONFLICT (subscription_id, service_id) DO NOTHING
                "#,
            )
            .bind(draw.subscription_id)
            .bind(service_id)
            .execute(&mut **tx)
            .await
            .map_err(map_db_err)?;
            if inserted.rows_affected() == 1 {
                newly_exhausted.push((draw.subscription_id, service_id));
            }
        }
    }

    Ok(newly_exhausted)
}

/// Take capacity from time-overlapping slots of the same resource and
/// date, clamped to what each sibling has available, and record the
/// per-slot amounts under the booking. Release hands back exactly these
/// recorded amounts.
async fn hold_overlapping_capacity(
    tx: &mut Transaction<'_, Postgres>,
    booking_id: Uuid,
    slot: &Slot,
    quantity: i32,
) -> Result<(), AdmissionError> {
    let Some(resource_id) = slot.resource_id else {
        return Ok(());
    };

    sqlx::query(
        r#"
        WITH candidates AS (
            SELECT id, LEAST($1, available_capacity) AS quantity
            FROM slots
            WHERE resource_id = $2 AND date = $3 AND id <> $4
              AND start_time < $5 AND end_time > $6
              AND available_capacity > 0
            FOR UPDATE
        ), reduced AS (
            UPDATE slots s
            SET available_capacity = s.available_capacity - c.quantity,
                booked_count = s.booked_count + c.quantity,
                updated_at = NOW()
            FROM candidates c
            WHERE s.id = c.id
            RETURNING s.id, c.quantity
        )
        INSERT INTO booking_slot_holds (booking_id, slot_id, quantity)
        SELECT $7, id, quantity FROM reduced
        "#,
    )
    .bind(quantity)
    .bind(resource_id)
    .bind(slot.date)
    .bind(slot.id)
    .bind(slot.end_time)
    .bind(slot.start_time)
    .bind(booking_id)
    .execute(&mut **tx)
    .await
    .map_err(map_db_err)?;

    Ok(())
}

/// Give back whatever the booking held on overlapping siblings.
/// Restoration is exact, never clamped: only the recorded amounts go
/// back, so a cancel can never inflate a sibling's availability.
async fn restore_held_capacity(
    tx: &mut Transaction<'_, Postgres>,
    booking_id: Uuid,
) -> Result<(), AdmissionError> {
    sqlx::query(
        r#"
        WITH released AS (
            DELETE FROM booking_slot_holds WHERE booking_id = $1
            RETURNING slot_id, quantity
        )
        UPDATE slots s
        SET available_capacity = s.available_capacity + r.quantity,
            booked_count = s.booked_count - r.quantity,
            updated_at = NOW()
        FROM released r
        WHERE s.id = r.slot_id
        "#,
    )
    .bind(booking_id)
    .execute(&mut **tx)
    .await
    .map_err(map_db_err)?;

    Ok(())
}

/// Release capacity on a slot, clamped exactly like
/// `SlotCounters::release`: available never exceeds original, booked
/// never goes negative. Returns the released slot's available count.
async fn release_slot(
    tx: &mut Transaction<'_, Postgres>,
    slot: &Slot,
    quantity: i32,
) -> Result<i32, AdmissionError> {
    let mut counters = SlotCounters::new(
        slot.original_capacity,
        slot.available_capacity,
        slot.booked_count,
    );
    counters.release(quantity);
    write_slot_counters(tx, slot.id, counters).await?;
    Ok(counters.available)
}

/// Append to the booking audit trail, inside the mutating transaction.
async fn record_change(
    tx: &mut Transaction<'_, Postgres>,
    booking_id: Uuid,
    change_type: &str,
    old_value: &str,
    new_value: &str,
) -> Result<(), AdmissionError> {
    sqlx::query(
        "INSERT INTO booking_changes (id, booking_id, change_type, old_value, new_value) \
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(Uuid::new_v4())
    .bind(booking_id)
    .bind(change_type)
    .bind(old_value)
    .bind(new_value)
    .execute(&mut **tx)
    .await
    .map_err(map_db_err)?;
    Ok(())
}

async fn lock_booking(
    tx: &mut Transaction<'_, Postgres>,
    booking_id: Uuid,
) -> Result<Booking, AdmissionError> {
    let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1 FOR UPDATE");
    sqlx::query_as::<_, BookingRow>(&sql)
        .bind(booking_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(map_db_err)?
        .ok_or(AdmissionError::BookingNotFound(booking_id))?
        .into_booking()
}

#[async_trait]
impl AdmissionStore for PgAdmissionStore {
    async fn admit(&self, cmd: AdmissionCommand) -> Result<AdmissionRecord, AdmissionError> {
        if cmd.visitor_count < 1 {
            return Err(AdmissionError::InvalidQuantity(cmd.visitor_count));
        }
        if !cmd.initial_status.holds_capacity() {
            return Err(AdmissionError::ConstraintViolation(
                "initial booking status must be an active status".into(),
            ));
        }

        let mut tx = self.begin().await?;

        // 1. Lock the slot
        let slot = lock_slot(&mut tx, cmd.slot_id).await?;
        if !slot.is_available {
            return Err(AdmissionError::SlotUnavailable(cmd.slot_id));
        }
        let mut counters = SlotCounters::new(
            slot.original_capacity,
            slot.available_capacity,
            slot.booked_count,
        );

        // 2. Resolve package coverage under the usage row locks
        let plan = match cmd.customer_id {
            Some(customer_id) => {
                let balances =
                    lock_balances(&mut tx, cmd.tenant_id, customer_id, cmd.service_id).await?;
                plan_coverage(&balances, cmd.visitor_count)
            }
            None => CoveragePlan::uncovered(cmd.visitor_count),
        };

        // 3. Reserve capacity; failure aborts before any write
        counters.try_reserve(cmd.visitor_count)?;

        // 4. Price + fully-covered invariant (backstop for the DB CHECK)
        let total_price = total_price_cents(&plan, cmd.price_per_unit_cents);
        if plan.is_fully_covered() && total_price != 0 {
            return Err(AdmissionError::ConstraintViolation(format!(
                "fully covered booking priced at {} cents",
                total_price
            )));
        }

        // 5. Apply: counters, overlap holds, booking row, package draws
        write_slot_counters(&mut tx, cmd.slot_id, counters).await?;

        let booking_id = Uuid::new_v4();
        let payment_status = if plan.paid_quantity == 0 {
            PaymentStatus::NotRequired
        } else {
            PaymentStatus::Unpaid
        };
        let sql = format!(
            r#"
            INSERT INTO bookings
                (id, tenant_id, service_id, slot_id, customer_id, visitor_count,
                 package_covered_quantity, paid_quantity, package_subscription_id,
                 total_price_cents, currency, status, payment_status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING {BOOKING_COLUMNS}
            "#
        );
        let booking = sqlx::query_as::<_, BookingRow>(&sql)
            .bind(booking_id)
            .bind(cmd.tenant_id)
            .bind(cmd.service_id)
            .bind(cmd.slot_id)
            .bind(cmd.customer_id)
            .bind(cmd.visitor_count)
            .bind(plan.covered_quantity)
            .bind(plan.paid_quantity)
            .bind(plan.primary_subscription_id)
            .bind(total_price)
            .bind(&cmd.currency)
            .bind(cmd.initial_status.as_str())
            .bind(payment_status.as_str())
            .fetch_one(&mut *tx)
            .await
            .map_err(map_db_err)?
            .into_booking()?;

        // Holds and draws reference the booking row, so they go in last
        if self.rules.overlap_release {
            hold_overlapping_capacity(&mut tx, booking_id, &slot, cmd.visitor_count).await?;
        }
        let exhausted = apply_draws(&mut tx, booking_id, cmd.service_id, &plan).await?;

        tx.commit().await.map_err(map_db_err)?;

        Ok(AdmissionRecord {
            booking,
            slot_available_after: counters.available,
            exhausted,
        })
    }

    async fn transition(
        &self,
        booking_id: Uuid,
        new_status: BookingStatus,
    ) -> Result<TransitionRecord, AdmissionError> {
        let mut tx = self.begin().await?;

        let booking = lock_booking(&mut tx, booking_id).await?;
        let effect = capacity_effect(booking.status, new_status)?;

        let (released_quantity, slot_available_after) = match effect {
            CapacityEffect::None => {
                let slot = lock_slot(&mut tx, booking.slot_id).await?;
                (None, slot.available_capacity)
            }
            CapacityEffect::Release => {
                let slot = lock_slot(&mut tx, booking.slot_id).await?;
                let available = release_slot(&mut tx, &slot, booking.visitor_count).await?;
                restore_held_capacity(&mut tx, booking_id).await?;

                // Cancellation restores the package balance; completion
                // consumes it for good.
                if new_status == BookingStatus::Cancelled {
                    sqlx::query(
                        r#"
                        UPDATE package_subscription_usage u
                        SET used_quantity = u.used_quantity - LEAST(d.quantity, u.used_quantity),
                            remaining_quantity = u.remaining_quantity
                                + LEAST(d.quantity, u.used_quantity),
                            updated_at = NOW()
                        FROM booking_package_draws d
                        WHERE d.booking_id = $1
                          AND u.subscription_id = d.subscription_id
                          AND u.service_id = d.service_id
                        "#,
                    )
                    .bind(booking_id)
                    .execute(&mut *tx)
                    .await
                    .map_err(map_db_err)?;

                    sqlx::query("DELETE FROM booking_package_draws WHERE booking_id = $1")
                        .bind(booking_id)
                        .execute(&mut *tx)
                        .await
                        .map_err(map_db_err)?;
                }

                (Some(booking.visitor_count), available)
            }
        };

        let refund = new_status == BookingStatus::Cancelled
            && booking.payment_status == PaymentStatus::Paid;
        let sql = format!(
            r#"
            UPDATE bookings
            SET status = $1,
                payment_status = CASE WHEN $2 THEN 'REFUNDED' ELSE payment_status END,
                updated_at = NOW()
            WHERE id = $3
            RETURNING {BOOKING_COLUMNS}
            "#
        );
        let old_status = booking.status;
        let booking = sqlx::query_as::<_, BookingRow>(&sql)
            .bind(new_status.as_str())
            .bind(refund)
            .bind(booking_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_db_err)?
            .into_booking()?;

        record_change(
            &mut tx,
            booking_id,
            "STATUS",
            old_status.as_str(),
            new_status.as_str(),
        )
        .await?;

        tx.commit().await.map_err(map_db_err)?;

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
        let mut tx = self.begin().await?;

        let booking = lock_booking(&mut tx, booking_id).await?;
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

        // 1. Reserve the new slot first; on failure the transaction
        //    rolls back with the old reservation untouched
        let new_slot = lock_slot(&mut tx, new_slot_id).await?;
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
        write_slot_counters(&mut tx, new_slot_id, counters).await?;

        // 2. Release the old reservation, including its overlap holds,
        //    then take fresh holds around the new slot
        let old_slot = lock_slot(&mut tx, old_slot_id).await?;
        release_slot(&mut tx, &old_slot, booking.visitor_count).await?;
        restore_held_capacity(&mut tx, booking_id).await?;
        if self.rules.overlap_release {
            hold_overlapping_capacity(&mut tx, booking_id, &new_slot, booking.visitor_count)
                .await?;
        }

        // 3. Repoint the booking
        let sql = format!(
            "UPDATE bookings SET slot_id = $1, updated_at = NOW() WHERE id = $2 \
             RETURNING {BOOKING_COLUMNS}"
        );
        let booking = sqlx::query_as::<_, BookingRow>(&sql)
            .bind(new_slot_id)
            .bind(booking_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_db_err)?
            .into_booking()?;

        record_change(
            &mut tx,
            booking_id,
            "SLOT",
            &old_slot_id.to_string(),
            &new_slot_id.to_string(),
        )
        .await?;

        tx.commit().await.map_err(map_db_err)?;

        Ok(RescheduleRecord {
            booking,
            old_slot_id,
            new_slot_id,
        })
    }

    async fn get_booking(&self, id: Uuid) -> Result<Option<Booking>, AdmissionError> {
        let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1");
        sqlx::query_as::<_, BookingRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_err)?
            .map(BookingRow::into_booking)
            .transpose()
    }

    async fn get_slot(&self, id: Uuid) -> Result<Option<Slot>, AdmissionError> {
        let sql = format!("SELECT {SLOT_COLUMNS} FROM slots WHERE id = $1");
        Ok(sqlx::query_as::<_, SlotRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_err)?
            .map(SlotRow::into_slot))
    }

    async fn get_subscription(
        &self,
        id: Uuid,
    ) -> Result<Option<PackageSubscription>, AdmissionError> {
        let row = sqlx::query(
            "SELECT id, tenant_id, customer_id, status, created_at, updated_at \
             FROM package_subscriptions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_err)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let status_str: String = row.get("status");
        let status = SubscriptionStatus::parse(&status_str).ok_or_else(|| {
            AdmissionError::Storage(format!("unknown subscription status '{}'", status_str))
        })?;

        let usage_rows = sqlx::query(
            "SELECT subscription_id, service_id, original_quantity, used_quantity, \
             remaining_quantity FROM package_subscription_usage WHERE subscription_id = $1",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err)?;

        let entitlements = usage_rows
            .into_iter()
            .map(|u| ServiceEntitlement {
                subscription_id: u.get("subscription_id"),
                service_id: u.get("service_id"),
                original_quantity: u.get("original_quantity"),
                used_quantity: u.get("used_quantity"),
                remaining_quantity: u.get("remaining_quantity"),
            })
            .collect();

        Ok(Some(PackageSubscription {
            id: row.get("id"),
            tenant_id: row.get("tenant_id"),
            customer_id: row.get("customer_id"),
            status,
            entitlements,
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }))
    }
}
