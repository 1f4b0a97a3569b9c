use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use lettings::occupancy::{
    AvailabilityEngine, BlockedPeriod, BlockedPeriodStore, Booking, BookingStore, DateRange,
    LeaseCalculator, PropertyId, PropertyLookup, RentalCoordinator, RentalMode, RentalRequest,
    RentalRequestService, RentalRequestStore, RequestId, RequestStatus, StoreError, Tenant,
    TenantId, TenantStore, UserId,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// In-memory property directory. Real deployments put a property service
/// behind this trait; the demo and tests seed it directly.
#[derive(Default)]
pub(crate) struct InMemoryPropertyDirectory {
    modes: Mutex<HashMap<String, RentalMode>>,
}

impl InMemoryPropertyDirectory {
    pub(crate) fn insert(&self, property_id: &str, mode: RentalMode) {
        self.modes
            .lock()
            .expect("property mutex poisoned")
            .insert(property_id.to_string(), mode);
    }
}

impl PropertyLookup for InMemoryPropertyDirectory {
    fn rental_mode(&self, property_id: &PropertyId) -> Result<RentalMode, StoreError> {
        self.modes
            .lock()
            .expect("property mutex poisoned")
            .get(&property_id.0)
            .copied()
            .ok_or(StoreError::NotFound)
    }
}

/// In-memory booking store. The create path re-checks overlap under the
/// store mutex so check-then-write stays linearizable per property.
#[derive(Default)]
pub(crate) struct InMemoryBookingStore {
    bookings: Mutex<Vec<Booking>>,
}

impl InMemoryBookingStore {
    pub(crate) fn seed(&self, booking: Booking) {
        self.bookings
            .lock()
            .expect("booking mutex poisoned")
            .push(booking);
    }
}

impl BookingStore for InMemoryBookingStore {
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
pub(crate) struct InMemoryTenantStore {
    tenants: Mutex<HashMap<String, Tenant>>,
}

impl InMemoryTenantStore {
    pub(crate) fn seed(&self, tenant: Tenant) {
        self.tenants
            .lock()
            .expect("tenant mutex poisoned")
            .insert(tenant.id.0.clone(), tenant);
    }
}

impl TenantStore for InMemoryTenantStore {
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

/// In-memory rental-request store. Create refuses an insert overlapping a
/// pending or approved request for the property, under the same mutex, so a
/// raced submission cannot leave a duplicate pending row.
#[derive(Default)]
pub(crate) struct InMemoryRentalRequestStore {
    requests: Mutex<HashMap<String, RentalRequest>>,
}

impl InMemoryRentalRequestStore {
    pub(crate) fn seed(&self, request: RentalRequest) {
        self.requests
            .lock()
            .expect("request mutex poisoned")
            .insert(request.id.0.clone(), request);
    }
}

impl RentalRequestStore for InMemoryRentalRequestStore {
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
pub(crate) struct InMemoryBlockedPeriodStore {
    blocks: Mutex<Vec<BlockedPeriod>>,
}

impl InMemoryBlockedPeriodStore {
    pub(crate) fn seed(&self, block: BlockedPeriod) {
        self.blocks
            .lock()
            .expect("block mutex poisoned")
            .push(block);
    }
}

impl BlockedPeriodStore for InMemoryBlockedPeriodStore {
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

/// Wired occupancy stack over the in-memory stores.
pub(crate) struct OccupancyStack {
    pub(crate) properties: Arc<InMemoryPropertyDirectory>,
    pub(crate) bookings: Arc<InMemoryBookingStore>,
    pub(crate) tenants: Arc<InMemoryTenantStore>,
    pub(crate) requests: Arc<InMemoryRentalRequestStore>,
    pub(crate) blocks: Arc<InMemoryBlockedPeriodStore>,
    pub(crate) lease: Arc<LeaseCalculator>,
    pub(crate) coordinator: Arc<RentalCoordinator>,
}

pub(crate) fn build_occupancy_stack() -> OccupancyStack {
    let properties = Arc::new(InMemoryPropertyDirectory::default());
    let bookings = Arc::new(InMemoryBookingStore::default());
    let tenants = Arc::new(InMemoryTenantStore::default());
    let requests = Arc::new(InMemoryRentalRequestStore::default());
    let blocks = Arc::new(InMemoryBlockedPeriodStore::default());

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
        engine,
        service,
    ));

    OccupancyStack {
        properties,
        bookings,
        tenants,
        requests,
        blocks,
        lease,
        coordinator,
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn deserialize_optional_date<'de, D>(
    deserializer: D,
) -> Result<Option<NaiveDate>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    opt.map(|value| parse_date(&value).map_err(serde::de::Error::custom))
        .transpose()
}
