use chrono::NaiveDate;

use super::domain::{
    BlockedPeriod, Booking, DateRange, PropertyId, RentalMode, RentalRequest, RequestId,
    RequestStatus, Tenant, TenantId, UserId,
};

/// Error enumeration shared by every collaborator boundary.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("write conflicts with an existing record or committed range")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Read side of the property catalog. Property CRUD lives elsewhere; the
/// occupancy core only ever needs the listing mode.
pub trait PropertyLookup: Send + Sync {
    fn rental_mode(&self, property_id: &PropertyId) -> Result<RentalMode, StoreError>;
}

/// Booking persistence boundary.
///
/// `find_overlapping` may over-fetch; callers re-filter through
/// [`DateRange::overlaps`] so the overlap semantics stay in one place.
/// Cancelled bookings must be excluded.
pub trait BookingStore: Send + Sync {
    fn find_overlapping(
        &self,
        property_id: &PropertyId,
        range: &DateRange,
    ) -> Result<Vec<Booking>, StoreError>;

    /// Check-then-write contract: an insert must be linearizable with other
    /// inserts for the same property, refusing with [`StoreError::Conflict`]
    /// when the booking's effective range overlaps an existing non-cancelled
    /// booking. Two racing creates must never both land.
    fn create(&self, booking: Booking) -> Result<Booking, StoreError>;
}

/// Active-lease (tenant) persistence boundary.
pub trait TenantStore: Send + Sync {
    fn get(&self, id: &TenantId) -> Result<Option<Tenant>, StoreError>;

    fn find_active_by_property(&self, property_id: &PropertyId)
        -> Result<Vec<Tenant>, StoreError>;

    fn find_active_by_user_and_property(
        &self,
        user_id: &UserId,
        property_id: &PropertyId,
    ) -> Result<Option<Tenant>, StoreError>;

    /// Every active tenant across all properties. Lease-expiry listings walk
    /// this set; batching is the implementation's concern.
    fn find_active(&self) -> Result<Vec<Tenant>, StoreError>;

    /// Must refuse with [`StoreError::Conflict`] when an active tenant
    /// already exists for the same user and property, so materialization
    /// stays idempotent under concurrent approvals.
    fn create(&self, tenant: Tenant) -> Result<Tenant, StoreError>;
}

/// Rental-request persistence boundary.
pub trait RentalRequestStore: Send + Sync {
    fn get(&self, id: &RequestId) -> Result<Option<RentalRequest>, StoreError>;

    fn find_approved_overlapping(
        &self,
        property_id: &PropertyId,
        range: &DateRange,
    ) -> Result<Vec<RentalRequest>, StoreError>;

    /// Most recent approved request for the user+property pair, ties broken
    /// by latest `request_date`. This is the source lease-end derivation
    /// reads from.
    fn find_latest_approved(
        &self,
        user_id: &UserId,
        property_id: &PropertyId,
    ) -> Result<Option<RentalRequest>, StoreError>;

    /// Check-then-write contract: the insert must be linearizable with other
    /// inserts for the same property, refusing with [`StoreError::Conflict`]
    /// when the proposed range overlaps an existing pending or approved
    /// request. A raced submission must lose here rather than produce a
    /// second pending row.
    fn create(&self, request: RentalRequest) -> Result<RentalRequest, StoreError>;

    fn update_status(
        &self,
        id: &RequestId,
        status: RequestStatus,
        landlord_response: Option<String>,
        response_date: Option<NaiveDate>,
    ) -> Result<RentalRequest, StoreError>;
}

/// Landlord block persistence boundary. Blocks are maintained outside the
/// core and only ever read here.
pub trait BlockedPeriodStore: Send + Sync {
    fn find_overlapping(
        &self,
        property_id: &PropertyId,
        range: &DateRange,
    ) -> Result<Vec<BlockedPeriod>, StoreError>;
}
