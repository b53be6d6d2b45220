use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One bookable time unit for a service, optionally scoped to a resource
/// (an employee, a room). Capacity counters are mutated only through the
/// slot ledger; `original_capacity` is set at creation and never changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Slot {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub service_id: Uuid,
    pub resource_id: Option<Uuid>,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub original_capacity: i32,
    pub available_capacity: i32,
    pub booked_count: i32,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Slot {
    /// True when the time range of `other` intersects this slot's range.
    /// Touching boundaries (one ends exactly when the other starts) do
    /// not count as overlap.
    pub fn overlaps(&self, other: &Slot) -> bool {
        self.date == other.date
            && self.start_time < other.end_time
            && other.start_time < self.end_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(start: &str, end: &str) -> Slot {
        let now = Utc::now();
        Slot {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            service_id: Uuid::new_v4(),
            resource_id: None,
            date: NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(),
            start_time: start.parse().unwrap(),
            end_time: end.parse().unwrap(),
            original_capacity: 5,
            available_capacity: 5,
            booked_count: 0,
            is_available: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_overlap_detection() {
        let a = slot("10:00:00", "11:00:00");
        let b = slot("10:30:00", "11:30:00");
        let c = slot("11:00:00", "12:00:00");

        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        // Adjacent slots do not overlap
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn test_overlap_requires_same_date() {
        let a = slot("10:00:00", "11:00:00");
        let mut b = slot("10:00:00", "11:00:00");
        b.date = NaiveDate::from_ymd_opt(2026, 3, 15).unwrap();
        assert!(!a.overlaps(&b));
    }
}
