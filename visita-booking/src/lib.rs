pub mod admission;
pub mod counters;
pub mod coverage;
pub mod lifecycle;
pub mod memory;

pub use admission::AdmissionService;
pub use counters::SlotCounters;
pub use coverage::{plan_coverage, CoverageDraw, CoveragePlan, SubscriptionBalance};
pub use lifecycle::{capacity_effect, CapacityEffect};
pub use memory::MemoryAdmissionStore;
