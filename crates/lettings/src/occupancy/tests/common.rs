use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{Months, NaiveDate};

use crate::occupancy::availability::AvailabilityEngine;
use crate::occupancy::coordinator::RentalCoordinator;
use crate::occupancy::domain::{
    BlockedPeriod, Booking, BookingId, BookingStatus, DateRange, PropertyId, RentalMode,
    RentalRequest, RequestId, RequestStatus, Tenant, TenantId, TenantStatus, UserId,
};
use crate::occupancy::lease::LeaseCalculator;
use crate::occupancy::requests::{RentalRequestService, SubmitRentalRequest};
use crate::occupancy::store::{
    BlockedPeriodStore, BookingStore, PropertyLookup, RentalRequestStore, StoreError, TenantStore,
};

pub(super) const DAILY_PROPERTY: &str = "prop-daily";
pub(super) const MONTHLY_PROPERTY: &str = "prop-monthly";

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn range(start: NaiveDate, end: NaiveDate) -> DateRange {
    DateRange::new(start, end).expect("valid range")
}

#[derive(Default)]
pub(super) struct MemoryProperties {
    modes: Mutex<HashMap<String, RentalMode>>,
}

impl MemoryProperties {
    pub(super) fn insert(&self, property_id: &str, mode: RentalMode) {
        self.modes
            .lock()
            .expect("property mutex poisoned")
            .insert(property_id.to_string(), mode);
    }
}

impl PropertyLookup for MemoryProperties {
    fn rental_mode(&self, property_id: &PropertyId) -> Result<RentalMode, StoreError> {
        self.modes
            .lock()
            .expect("property mutex poisoned")
            .get(&property_id.0)
            .copied()
            .ok_or(StoreError::NotFound)
    }
}

#[derive(Default)]
pub(super) struct MemoryBookings {
    bookings: Mutex<Vec<Booking>>,
}

impl MemoryBookings {
    /// Unchecked insert for scenario seeding.
    pub(super) fn seed(&self, booking: Booking) {
        self.bookings
            .lock()
            .expect("booking mutex poisoned")
            .push(booking);
    }

    pub(super) fn all(&self) -> Vec<Booking> {
        self.bookings.lock().expect("booking mutex poisoned").clone()
    }
}

impl BookingStore for MemoryBookings {
    fn find_overlapping(
        &self,
        property_id: &PropertyId,
        range: &DateRange,
    ) -> Result<Vec<Booking>, StoreError> {
        let guard = self.bookings.lock().expect("booking mutex poisoned");
        Ok(guard
            .iter()
            .filter(|booking| {
                booking.property_id == *property_id
                    && !booking.is_cancelled()
                    && booking.effective_range().overlaps(range)
            })
            .cloned()
            .collect())
    }

    fn create(&self, booking: Booking) -> Result<Booking, StoreError> {
        let mut guard = self.bookings.lock().expect("booking mutex poisoned");
        let candidate = booking.effective_range();
        let collision = guard.iter().any(|existing| {
            existing.property_id == booking.property_id
                && !existing.is_cancelled()
                && existing.effective_range().overlaps(&candidate)
        });
        if collision {
            return Err(StoreError::Conflict);
        }
        guard.push(booking.clone());
        Ok(booking)
    }
}

#[derive(Default)]
pub(super) struct MemoryTenants {
    tenants: Mutex<HashMap<String, Tenant>>,
}

impl MemoryTenants {
    pub(super) fn seed(&self, tenant: Tenant) {
        self.tenants
            .lock()
            .expect("tenant mutex poisoned")
            .insert(tenant.id.0.clone(), tenant);
    }

    pub(super) fn active_count(&self) -> usize {
        self.tenants
            .lock()
            .expect("tenant mutex poisoned")
            .values()
            .filter(|tenant| tenant.is_active())
            .count()
    }
}

impl TenantStore for MemoryTenants {
    fn get(&self, id: &TenantId) -> Result<Option<Tenant>, StoreError> {
        let guard = self.tenants.lock().expect("tenant mutex poisoned");
        Ok(guard.get(&id.0).cloned())
    }

    fn find_active_by_property(
        &self,
        property_id: &PropertyId,
    ) -> Result<Vec<Tenant>, StoreError> {
        let guard = self.tenants.lock().expect("tenant mutex poisoned");
        Ok(guard
            .values()
            .filter(|tenant| tenant.is_active() && tenant.property_id == *property_id)
            .cloned()
            .collect())
    }

    fn find_active_by_user_and_property(
        &self,
        user_id: &UserId,
        property_id: &PropertyId,
    ) -> Result<Option<Tenant>, StoreError> {
        let guard = self.tenants.lock().expect("tenant mutex poisoned");
        Ok(guard
            .values()
            .find(|tenant| {
                tenant.is_active()
                    && tenant.user_id == *user_id
                    && tenant.property_id == *property_id
            })
            .cloned())
    }

    fn find_active(&self) -> Result<Vec<Tenant>, StoreError> {
        let guard = self.tenants.lock().expect("tenant mutex poisoned");
        let mut active: Vec<Tenant> = guard
            .values()
            .filter(|tenant| tenant.is_active())
            .cloned()
            .collect();
        active.sort_by(|a, b| a.id.0.cmp(&b.id.0));
        Ok(active)
    }

    fn create(&self, tenant: Tenant) -> Result<Tenant, StoreError> {
        let mut guard = self.tenants.lock().expect("tenant mutex poisoned");
        let duplicate = guard.values().any(|existing| {
            existing.is_active()
                && existing.user_id == tenant.user_id
                && existing.property_id == tenant.property_id
        });
        if duplicate {
            return Err(StoreError::Conflict);
        }
        guard.insert(tenant.id.0.clone(), tenant.clone());
        Ok(tenant)
    }
}

#[derive(Default)]
pub(super) struct MemoryRequests {
    requests: Mutex<HashMap<String, RentalRequest>>,
}

impl MemoryRequests {
    pub(super) fn seed(&self, request: RentalRequest) {
        self.requests
            .lock()
            .expect("request mutex poisoned")
            .insert(request.id.0.clone(), request);
    }

    pub(super) fn pending_count(&self, property_id: &PropertyId) -> usize {
        self.requests
            .lock()
            .expect("request mutex poisoned")
            .values()
            .filter(|request| {
                request.property_id == *property_id && request.status == RequestStatus::Pending
            })
            .count()
    }
}

impl RentalRequestStore for MemoryRequests {
    fn get(&self, id: &RequestId) -> Result<Option<RentalRequest>, StoreError> {
        let guard = self.requests.lock().expect("request mutex poisoned");
        Ok(guard.get(&id.0).cloned())
    }

    fn find_approved_overlapping(
        &self,
        property_id: &PropertyId,
        range: &DateRange,
    ) -> Result<Vec<RentalRequest>, StoreError> {
        let guard = self.requests.lock().expect("request mutex poisoned");
        Ok(guard
            .values()
            .filter(|request| {
                request.property_id == *property_id
                    && request.status == RequestStatus::Approved
                    && request.proposed_range().overlaps(range)
            })
            .cloned()
            .collect())
    }

    fn find_latest_approved(
        &self,
        user_id: &UserId,
        property_id: &PropertyId,
    ) -> Result<Option<RentalRequest>, StoreError> {
        let guard = self.requests.lock().expect("request mutex poisoned");
        Ok(guard
            .values()
            .filter(|request| {
                request.user_id == *user_id
                    && request.property_id == *property_id
                    && request.status == RequestStatus::Approved
            })
            .max_by_key(|request| (request.request_date, request.id.0.clone()))
            .cloned())
    }

    fn create(&self, request: RentalRequest) -> Result<RentalRequest, StoreError> {
        let mut guard = self.requests.lock().expect("request mutex poisoned");
        let proposed = request.proposed_range();
        let collision = guard.values().any(|existing| {
            existing.property_id == request.property_id
                && matches!(
                    existing.status,
                    RequestStatus::Pending | RequestStatus::Approved
                )
                && existing.proposed_range().overlaps(&proposed)
        });
        if collision {
            return Err(StoreError::Conflict);
        }
        guard.insert(request.id.0.clone(), request.clone());
        Ok(request)
    }

    fn update_status(
        &self,
        id: &RequestId,
        status: RequestStatus,
        landlord_response: Option<String>,
        response_date: Option<NaiveDate>,
    ) -> Result<RentalRequest, StoreError> {
        let mut guard = self.requests.lock().expect("request mutex poisoned");
        let request = guard.get_mut(&id.0).ok_or(StoreError::NotFound)?;
        request.status = status;
        request.landlord_response = landlord_response;
        request.response_date = response_date;
        Ok(request.clone())
    }
}

#[derive(Default)]
pub(super) struct MemoryBlocks {
    blocks: Mutex<Vec<BlockedPeriod>>,
}

impl MemoryBlocks {
    pub(super) fn seed(&self, block: BlockedPeriod) {
        self.blocks.lock().expect("block mutex poisoned").push(block);
    }
}

impl BlockedPeriodStore for MemoryBlocks {
    fn find_overlapping(
        &self,
        property_id: &PropertyId,
        range: &DateRange,
    ) -> Result<Vec<BlockedPeriod>, StoreError> {
        let guard = self.blocks.lock().expect("block mutex poisoned");
        Ok(guard
            .iter()
            .filter(|block| block.property_id == *property_id && block.range().overlaps(range))
            .cloned()
            .collect())
    }
}

/// Booking store that is always down, for fail-safe coverage.
pub(super) struct UnavailableBookings;

impl BookingStore for UnavailableBookings {
    fn find_overlapping(
        &self,
        _property_id: &PropertyId,
        _range: &DateRange,
    ) -> Result<Vec<Booking>, StoreError> {
        Err(StoreError::Unavailable("booking store offline".to_string()))
    }

    fn create(&self, _booking: Booking) -> Result<Booking, StoreError> {
        Err(StoreError::Unavailable("booking store offline".to_string()))
    }
}

/// Tenant store that reads fine but refuses writes, for compensation
/// coverage in the approval path.
#[derive(Default)]
pub(super) struct ReadOnlyTenants {
    inner: MemoryTenants,
}

impl TenantStore for ReadOnlyTenants {
    fn get(&self, id: &TenantId) -> Result<Option<Tenant>, StoreError> {
        self.inner.get(id)
    }

    fn find_active_by_property(
        &self,
        property_id: &PropertyId,
    ) -> Result<Vec<Tenant>, StoreError> {
        self.inner.find_active_by_property(property_id)
    }

    fn find_active_by_user_and_property(
        &self,
        user_id: &UserId,
        property_id: &PropertyId,
    ) -> Result<Option<Tenant>, StoreError> {
        self.inner.find_active_by_user_and_property(user_id, property_id)
    }

    fn find_active(&self) -> Result<Vec<Tenant>, StoreError> {
        self.inner.find_active()
    }

    fn create(&self, _tenant: Tenant) -> Result<Tenant, StoreError> {
        Err(StoreError::Unavailable("tenant store read only".to_string()))
    }
}

pub(super) struct Harness {
    pub(super) properties: Arc<MemoryProperties>,
    pub(super) bookings: Arc<MemoryBookings>,
    pub(super) tenants: Arc<MemoryTenants>,
    pub(super) requests: Arc<MemoryRequests>,
    pub(super) blocks: Arc<MemoryBlocks>,
    pub(super) lease: Arc<LeaseCalculator>,
    pub(super) engine: Arc<AvailabilityEngine>,
    pub(super) service: Arc<RentalRequestService>,
    pub(super) coordinator: Arc<RentalCoordinator>,
}

/// Full stack over memory stores with one daily and one monthly property.
pub(super) fn harness() -> Harness {
    let properties = Arc::new(MemoryProperties::default());
    properties.insert(DAILY_PROPERTY, RentalMode::Daily);
    properties.insert(MONTHLY_PROPERTY, RentalMode::Monthly);

    let bookings = Arc::new(MemoryBookings::default());
    let tenants = Arc::new(MemoryTenants::default());
    let requests = Arc::new(MemoryRequests::default());
    let blocks = Arc::new(MemoryBlocks::default());

    let lease = Arc::new(LeaseCalculator::new(tenants.clone(), requests.clone()));
    let engine = Arc::new(AvailabilityEngine::new(
        properties.clone(),
        bookings.clone(),
        tenants.clone(),
        requests.clone(),
        blocks.clone(),
        lease.clone(),
    ));
    let service = Arc::new(RentalRequestService::new(
        properties.clone(),
        tenants.clone(),
        requests.clone(),
        engine.clone(),
    ));
    let coordinator = Arc::new(RentalCoordinator::new(
        properties.clone(),
        bookings.clone(),
        engine.clone(),
        service.clone(),
    ));

    Harness {
        properties,
        bookings,
        tenants,
        requests,
        blocks,
        lease,
        engine,
        service,
        coordinator,
    }
}

pub(super) fn property(id: &str) -> PropertyId {
    PropertyId(id.to_string())
}

pub(super) fn user(id: &str) -> UserId {
    UserId(id.to_string())
}

pub(super) fn confirmed_booking(
    id: &str,
    property_id: &str,
    start: NaiveDate,
    end: Option<NaiveDate>,
) -> Booking {
    Booking {
        id: BookingId(id.to_string()),
        property_id: property(property_id),
        guest_id: user("guest-1"),
        start,
        end,
        status: BookingStatus::Confirmed,
    }
}

pub(super) fn active_tenant(
    id: &str,
    user_id: &str,
    property_id: &str,
    lease_start: NaiveDate,
) -> Tenant {
    Tenant {
        id: TenantId(id.to_string()),
        user_id: user(user_id),
        property_id: property(property_id),
        lease_start,
        status: TenantStatus::Active,
    }
}

pub(super) fn approved_request(
    id: &str,
    user_id: &str,
    property_id: &str,
    start: NaiveDate,
    months: u32,
    request_date: NaiveDate,
) -> RentalRequest {
    let end = start
        .checked_add_months(Months::new(months))
        .expect("lease end in range");
    RentalRequest {
        id: RequestId(id.to_string()),
        property_id: property(property_id),
        user_id: user(user_id),
        proposed_start: start,
        proposed_end: end,
        lease_duration_months: months,
        status: RequestStatus::Approved,
        request_date,
        landlord_response: Some("approved".to_string()),
        response_date: Some(request_date),
    }
}

/// Seed an approved request plus its materialized tenant so lease-end
/// derivation has something to read.
pub(super) fn seed_lease(
    harness: &Harness,
    tenant_id: &str,
    user_id: &str,
    property_id: &str,
    lease_start: NaiveDate,
    months: u32,
) {
    harness.requests.seed(approved_request(
        &format!("req-for-{tenant_id}"),
        user_id,
        property_id,
        lease_start,
        months,
        lease_start,
    ));
    harness
        .tenants
        .seed(active_tenant(tenant_id, user_id, property_id, lease_start));
}

pub(super) fn submission(
    property_id: &str,
    user_id: &str,
    start: NaiveDate,
    end: NaiveDate,
    months: u32,
) -> SubmitRentalRequest {
    SubmitRentalRequest {
        property_id: property(property_id),
        user_id: user(user_id),
        proposed_start: start,
        proposed_end: end,
        lease_duration_months: months,
    }
}
