use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriptionStatus {
    Active,
    Cancelled,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "ACTIVE",
            SubscriptionStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ACTIVE" => Some(SubscriptionStatus::Active),
            "CANCELLED" => Some(SubscriptionStatus::Cancelled),
            _ => None,
        }
    }
}

/// Per-service entitlement ledger inside a subscription.
/// `remaining_quantity = original_quantity - used_quantity` at all times.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceEntitlement {
    pub subscription_id: Uuid,
    pub service_id: Uuid,
    pub original_quantity: i32,
    pub used_quantity: i32,
    pub remaining_quantity: i32,
}

impl ServiceEntitlement {
    pub fn new(subscription_id: Uuid, service_id: Uuid, original_quantity: i32) -> Self {
        Self {
            subscription_id,
            service_id,
            original_quantity,
            used_quantity: 0,
            remaining_quantity: original_quantity,
        }
    }

    /// Consume up to `quantity` units; returns the number actually drawn.
    pub fn consume(&mut self, quantity: i32) -> i32 {
        let drawn = quantity.min(self.remaining_quantity);
        self.used_quantity += drawn;
        self.remaining_quantity -= drawn;
        drawn
    }

    /// Restore units after a covering booking is cancelled. Never restores
    /// above the original quantity.
    pub fn restore(&mut self, quantity: i32) {
        let restored = quantity.min(self.used_quantity);
        self.used_quantity -= restored;
        self.remaining_quantity += restored;
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining_quantity == 0
    }
}

/// A customer's purchased bundle of service-unit entitlements.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageSubscription {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub customer_id: Uuid,
    pub status: SubscriptionStatus,
    pub entitlements: Vec<ServiceEntitlement>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PackageSubscription {
    pub fn entitlement_for(&self, service_id: Uuid) -> Option<&ServiceEntitlement> {
        self.entitlements.iter().find(|e| e.service_id == service_id)
    }

    pub fn entitlement_for_mut(&mut self, service_id: Uuid) -> Option<&mut ServiceEntitlement> {
        self.entitlements
            .iter_mut()
            .find(|e| e.service_id == service_id)
    }
}
