use std::sync::Arc;

use chrono::{Days, Months, NaiveDate};
use serde::Serialize;
use tracing::warn;

use super::domain::{DateRange, Tenant, TenantId};
use super::store::{RentalRequestStore, StoreError, TenantStore};

/// Minimum span an annual lease must cover before a request may enter the
/// pending queue.
pub const MIN_LEASE_DAYS: i64 = 180;

/// Sole gate on minimum lease length.
pub fn is_valid_lease_duration(start: NaiveDate, end: NaiveDate) -> bool {
    end.signed_duration_since(start).num_days() >= MIN_LEASE_DAYS
}

/// Snapshot of one active lease and its derived horizon, produced by the
/// expiry listings.
#[derive(Debug, Clone, Serialize)]
pub struct LeaseExpiry {
    pub tenant: Tenant,
    pub lease_end: NaiveDate,
    pub remaining_days: i64,
}

/// Derives lease end dates from approved rental requests. The derivation is
/// the single source of truth for lease expiry; nothing persists a lease end
/// date, so there is no cached value to go stale.
pub struct LeaseCalculator {
    tenants: Arc<dyn TenantStore>,
    requests: Arc<dyn RentalRequestStore>,
}

impl LeaseCalculator {
    pub fn new(tenants: Arc<dyn TenantStore>, requests: Arc<dyn RentalRequestStore>) -> Self {
        Self { tenants, requests }
    }

    /// Lease end for a tenant: `lease_start` plus the duration of the
    /// tenant's most recent approved request for the same property.
    ///
    /// `None` means "end unknown" — the caller must treat it as underivable,
    /// never as "the lease never ends".
    pub fn derive_lease_end(&self, tenant: &Tenant) -> Result<Option<NaiveDate>, StoreError> {
        let latest = self
            .requests
            .find_latest_approved(&tenant.user_id, &tenant.property_id)?;
        Ok(latest.and_then(|request| {
            tenant
                .lease_start
                .checked_add_months(Months::new(request.lease_duration_months))
        }))
    }

    /// The interval the lease occupies, or `None` when the end is unknown.
    pub fn derived_range(&self, tenant: &Tenant) -> Result<Option<DateRange>, StoreError> {
        let end = self.derive_lease_end(tenant)?;
        Ok(end.and_then(|end| DateRange::new(tenant.lease_start, end).ok()))
    }

    /// Whether the tenant's derived lease end has passed. Underivable ends
    /// and store failures degrade to the neutral `false`; this accessor never
    /// fails.
    pub fn is_expired(&self, tenant_id: &TenantId, today: NaiveDate) -> bool {
        match self.lease_end_of(tenant_id) {
            Ok(Some(end)) => end < today,
            Ok(None) => false,
            Err(err) => {
                warn!(tenant = %tenant_id.0, error = %err, "lease expiry lookup failed");
                false
            }
        }
    }

    /// Signed days between `today` and the derived lease end (negative once
    /// the lease has lapsed). `None` when the end cannot be derived.
    pub fn remaining_days(&self, tenant_id: &TenantId, today: NaiveDate) -> Option<i64> {
        match self.lease_end_of(tenant_id) {
            Ok(Some(end)) => Some(end.signed_duration_since(today).num_days()),
            Ok(None) => None,
            Err(err) => {
                warn!(tenant = %tenant_id.0, error = %err, "lease horizon lookup failed");
                None
            }
        }
    }

    /// Active leases whose derived end falls inside `[today, today + days_ahead]`.
    pub fn list_expiring(
        &self,
        days_ahead: u32,
        today: NaiveDate,
    ) -> Result<Vec<LeaseExpiry>, StoreError> {
        let horizon = today
            .checked_add_days(Days::new(u64::from(days_ahead)))
            .unwrap_or(NaiveDate::MAX);
        self.collect_expiries(today, |end| end >= today && end <= horizon)
    }

    /// Active leases whose derived end has already passed.
    pub fn list_expired(&self, today: NaiveDate) -> Result<Vec<LeaseExpiry>, StoreError> {
        self.collect_expiries(today, |end| end < today)
    }

    fn lease_end_of(&self, tenant_id: &TenantId) -> Result<Option<NaiveDate>, StoreError> {
        let Some(tenant) = self.tenants.get(tenant_id)? else {
            return Ok(None);
        };
        self.derive_lease_end(&tenant)
    }

    fn collect_expiries(
        &self,
        today: NaiveDate,
        keep: impl Fn(NaiveDate) -> bool,
    ) -> Result<Vec<LeaseExpiry>, StoreError> {
        let mut expiries = Vec::new();
        for tenant in self.tenants.find_active()? {
            // One derivation lookup per tenant; tenants with an underivable
            // end cannot be classified and are skipped.
            match self.derive_lease_end(&tenant)? {
                Some(end) if keep(end) => expiries.push(LeaseExpiry {
                    remaining_days: end.signed_duration_since(today).num_days(),
                    lease_end: end,
                    tenant,
                }),
                Some(_) => {}
                None => {
                    warn!(tenant = %tenant.id.0, "active lease without a derivable end date");
                }
            }
        }
        expiries.sort_by_key(|expiry| expiry.lease_end);
        Ok(expiries)
    }
}
