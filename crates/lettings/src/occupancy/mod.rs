//! Occupancy core: interval conflict detection, availability decisions,
//! lease-end derivation, and the rental-request approval workflow.
//!
//! Persistence, authentication, payments, and messaging live behind the
//! collaborator traits in [`store`]; this module owns the decision logic
//! and nothing else.

pub mod availability;
pub mod coordinator;
pub mod domain;
pub mod lease;
pub mod requests;
pub mod router;
pub mod store;

#[cfg(test)]
mod tests;

pub use availability::AvailabilityEngine;
pub use coordinator::{
    AvailabilityReport, CreationOutcome, DeclineKind, NewDailyBooking, RentalCoordinator,
};
pub use domain::{
    BlockedPeriod, Booking, BookingId, BookingStatus, ConflictInfo, ConflictKind, DateRange,
    InvalidDateRange, PropertyId, RentalMode, RentalRequest, RequestId, RequestStatus,
    RequestStatusView, Tenant, TenantId, TenantStatus, UserId,
};
pub use lease::{is_valid_lease_duration, LeaseCalculator, LeaseExpiry, MIN_LEASE_DAYS};
pub use requests::{RentalRequestService, RequestError, SubmitRentalRequest};
pub use router::occupancy_router;
pub use store::{
    BlockedPeriodStore, BookingStore, PropertyLookup, RentalRequestStore, StoreError, TenantStore,
};
