use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Snapshot of one subscription's remaining balance for the requested
/// service, taken under the subscription row lock. Callers supply these
/// in precedence order (creation order, oldest first).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionBalance {
    pub subscription_id: Uuid,
    pub remaining_quantity: i32,
}

/// One decrement to apply against a subscription ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverageDraw {
    pub subscription_id: Uuid,
    pub quantity: i32,
    /// True when this draw empties the subscription's balance for the
    /// service, which triggers the one-time exhaustion notice.
    pub exhausts: bool,
}

/// Resolved split of a requested quantity into covered and paid units.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoveragePlan {
    pub covered_quantity: i32,
    pub paid_quantity: i32,
    pub draws: Vec<CoverageDraw>,
    /// The first subscription drawn from; recorded on the booking row.
    pub primary_subscription_id: Option<Uuid>,
}

impl CoveragePlan {
    /// The zero-coverage plan: guests and customers without entitlements.
    pub fn uncovered(requested: i32) -> Self {
        Self {
            covered_quantity: 0,
            paid_quantity: requested,
            draws: Vec::new(),
            primary_subscription_id: None,
        }
    }

    pub fn is_fully_covered(&self) -> bool {
        self.paid_quantity == 0
    }
}

/// Split `requested` units across the supplied balances, oldest
/// subscription first. Balances are drained greedily; the remainder is
/// the paid quantity. Deterministic for a given balance order.
pub fn plan_coverage(balances: &[SubscriptionBalance], requested: i32) -> CoveragePlan {
    let mut remaining = requested;
    let mut draws = Vec::new();

    for balance in balances {
        if remaining == 0 {
            break;
        }
        if balance.remaining_quantity <= 0 {
            continue;
        }
        let quantity = remaining.min(balance.remaining_quantity);
        draws.push(CoverageDraw {
            subscription_id: balance.subscription_id,
            quantity,
            exhausts: quantity == balance.remaining_quantity,
        });
        remaining -= quantity;
    }

    let covered = requested - remaining;
    CoveragePlan {
        covered_quantity: covered,
        paid_quantity: remaining,
        primary_subscription_id: draws.first().map(|d| d.subscription_id),
        draws,
    }
}

/// Payable total for the plan. Integer cents throughout; no floats in
/// the billing path.
pub fn total_price_cents(plan: &CoveragePlan, price_per_unit_cents: i64) -> i64 {
    plan.paid_quantity as i64 * price_per_unit_cents
}
