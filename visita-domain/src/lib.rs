pub mod booking;
pub mod package;
pub mod slot;

pub use booking::{AdmitBookingRequest, Booking, BookingStatus, PaymentStatus};
pub use package::{PackageSubscription, ServiceEntitlement, SubscriptionStatus};
pub use slot::Slot;
