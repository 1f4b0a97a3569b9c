use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{error, warn};

use super::availability::AvailabilityEngine;
use super::domain::{
    DateRange, InvalidDateRange, PropertyId, RentalMode, RentalRequest, RequestId, RequestStatus,
    Tenant, TenantId, TenantStatus, UserId,
};
use super::lease::{is_valid_lease_duration, MIN_LEASE_DAYS};
use super::store::{PropertyLookup, RentalRequestStore, StoreError, TenantStore};

/// Error raised by the rental-request lifecycle.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error(transparent)]
    InvalidRange(#[from] InvalidDateRange),
    #[error("proposed lease spans {actual} days, below the {minimum}-day minimum")]
    DurationBelowMinimum { minimum: i64, actual: i64 },
    #[error("property {0} is not listed for annual leases")]
    NotAnnualProperty(String),
    #[error("property has conflicting commitments for the proposed range")]
    Unavailable,
    #[error("rental request not found")]
    NotFound,
    #[error("request is no longer pending (status: {})", .0.label())]
    AlreadyResolved(RequestStatus),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Inbound payload for a prospective tenant's lease application.
#[derive(Debug, Clone)]
pub struct SubmitRentalRequest {
    pub property_id: PropertyId,
    pub user_id: UserId,
    pub proposed_start: NaiveDate,
    pub proposed_end: NaiveDate,
    pub lease_duration_months: u32,
}

static REQUEST_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static TENANT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_request_id() -> RequestId {
    let id = REQUEST_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    RequestId(format!("req-{id:06}"))
}

fn next_tenant_id() -> TenantId {
    let id = TENANT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    TenantId(format!("tenant-{id:06}"))
}

/// State machine for the rental-request lifecycle: `Pending` on intake, one
/// transition to `Approved`, `Rejected`, or `Withdrawn`, and nothing leaves
/// a terminal state. Approval materializes the tenant record as a side
/// effect.
pub struct RentalRequestService {
    properties: Arc<dyn PropertyLookup>,
    tenants: Arc<dyn TenantStore>,
    requests: Arc<dyn RentalRequestStore>,
    availability: Arc<AvailabilityEngine>,
}

impl RentalRequestService {
    pub fn new(
        properties: Arc<dyn PropertyLookup>,
        tenants: Arc<dyn TenantStore>,
        requests: Arc<dyn RentalRequestStore>,
        availability: Arc<AvailabilityEngine>,
    ) -> Self {
        Self {
            properties,
            tenants,
            requests,
            availability,
        }
    }

    /// Validate and insert a new request at `Pending`. Nothing is inserted
    /// when any gate fails. The store's linearizable create is the last
    /// line of defense against a raced overlapping submission; its conflict
    /// surfaces as [`RequestError::Unavailable`], not a duplicate row.
    pub fn submit(
        &self,
        submission: SubmitRentalRequest,
        today: NaiveDate,
    ) -> Result<RentalRequest, RequestError> {
        let range = DateRange::new(submission.proposed_start, submission.proposed_end)?;

        if !is_valid_lease_duration(submission.proposed_start, submission.proposed_end) {
            return Err(RequestError::DurationBelowMinimum {
                minimum: MIN_LEASE_DAYS,
                actual: range.num_days(),
            });
        }

        if self.properties.rental_mode(&submission.property_id)? == RentalMode::Daily {
            return Err(RequestError::NotAnnualProperty(
                submission.property_id.0.clone(),
            ));
        }

        if !self
            .availability
            .is_available_for_annual(&submission.property_id, &range)
        {
            return Err(RequestError::Unavailable);
        }

        let request = RentalRequest {
            id: next_request_id(),
            property_id: submission.property_id,
            user_id: submission.user_id,
            proposed_start: submission.proposed_start,
            proposed_end: submission.proposed_end,
            lease_duration_months: submission.lease_duration_months,
            status: RequestStatus::Pending,
            request_date: today,
            landlord_response: None,
            response_date: None,
        };

        match self.requests.create(request) {
            Ok(stored) => Ok(stored),
            Err(StoreError::Conflict) => Err(RequestError::Unavailable),
            Err(err) => Err(err.into()),
        }
    }

    /// Approve a pending request and materialize the tenant record.
    ///
    /// Approval and materialization move together: when materialization
    /// fails, the status change is compensated back to `Pending` so the
    /// approval is never left half-applied. Re-approving an already approved
    /// request is a successful no-op that still guarantees the tenant record
    /// exists.
    pub fn approve(
        &self,
        request_id: &RequestId,
        note: Option<String>,
        today: NaiveDate,
    ) -> Result<RentalRequest, RequestError> {
        let request = self.requests.get(request_id)?.ok_or(RequestError::NotFound)?;

        match request.status {
            RequestStatus::Pending => {}
            RequestStatus::Approved => {
                self.materialize(&request)?;
                return Ok(request);
            }
            other => return Err(RequestError::AlreadyResolved(other)),
        }

        let approved =
            self.requests
                .update_status(request_id, RequestStatus::Approved, note, Some(today))?;

        if let Err(err) = self.materialize(&approved) {
            warn!(request = %request_id.0, error = %err, "tenant materialization failed, reverting approval");
            if let Err(revert) =
                self.requests
                    .update_status(request_id, RequestStatus::Pending, None, None)
            {
                error!(request = %request_id.0, error = %revert, "could not revert approval after failed materialization");
            }
            return Err(err);
        }

        Ok(approved)
    }

    /// Decline a pending request with the landlord's note.
    pub fn reject(
        &self,
        request_id: &RequestId,
        note: Option<String>,
        today: NaiveDate,
    ) -> Result<RentalRequest, RequestError> {
        let request = self.requests.get(request_id)?.ok_or(RequestError::NotFound)?;
        if request.status.is_terminal() {
            return Err(RequestError::AlreadyResolved(request.status));
        }
        Ok(self
            .requests
            .update_status(request_id, RequestStatus::Rejected, note, Some(today))?)
    }

    /// Tenant-initiated retraction of a pending request. Ownership of the
    /// request is enforced by the caller before this point.
    pub fn withdraw(
        &self,
        request_id: &RequestId,
        today: NaiveDate,
    ) -> Result<RentalRequest, RequestError> {
        let request = self.requests.get(request_id)?.ok_or(RequestError::NotFound)?;
        if request.status.is_terminal() {
            return Err(RequestError::AlreadyResolved(request.status));
        }
        Ok(self
            .requests
            .update_status(request_id, RequestStatus::Withdrawn, None, Some(today))?)
    }

    /// Create the active tenant record for an approved request. Idempotent:
    /// an existing active tenant for the user+property pair, or a concurrent
    /// create losing to one, both count as success.
    fn materialize(&self, request: &RentalRequest) -> Result<(), RequestError> {
        if self
            .tenants
            .find_active_by_user_and_property(&request.user_id, &request.property_id)?
            .is_some()
        {
            return Ok(());
        }

        let tenant = Tenant {
            id: next_tenant_id(),
            user_id: request.user_id.clone(),
            property_id: request.property_id.clone(),
            lease_start: request.proposed_start,
            status: TenantStatus::Active,
        };

        match self.tenants.create(tenant) {
            Ok(_) | Err(StoreError::Conflict) => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
