use std::sync::Arc;

use tracing::warn;

use super::domain::{
    ConflictInfo, ConflictKind, DateRange, PropertyId, RentalMode, RentalRequest, Tenant,
};
use super::lease::LeaseCalculator;
use super::store::{
    BlockedPeriodStore, BookingStore, PropertyLookup, RentalRequestStore, StoreError, TenantStore,
};

/// Decision engine answering "is this property free for this range?".
///
/// All date comparisons delegate to [`DateRange::overlaps`]. Availability is
/// a safety property: any collaborator failure degrades to "unavailable"
/// rather than surfacing as an error, so an infrastructure fault can never
/// grant access to a committed range.
pub struct AvailabilityEngine {
    properties: Arc<dyn PropertyLookup>,
    bookings: Arc<dyn BookingStore>,
    tenants: Arc<dyn TenantStore>,
    requests: Arc<dyn RentalRequestStore>,
    blocks: Arc<dyn BlockedPeriodStore>,
    lease: Arc<LeaseCalculator>,
}

impl AvailabilityEngine {
    pub fn new(
        properties: Arc<dyn PropertyLookup>,
        bookings: Arc<dyn BookingStore>,
        tenants: Arc<dyn TenantStore>,
        requests: Arc<dyn RentalRequestStore>,
        blocks: Arc<dyn BlockedPeriodStore>,
        lease: Arc<LeaseCalculator>,
    ) -> Self {
        Self {
            properties,
            bookings,
            tenants,
            requests,
            blocks,
            lease,
        }
    }

    /// Whether a daily-mode property is free for the range. Always `false`
    /// for monthly-mode properties and whenever a collaborator fails.
    pub fn is_available_for_daily(&self, property_id: &PropertyId, range: &DateRange) -> bool {
        match self.daily_check(property_id, range) {
            Ok(free) => free,
            Err(err) => {
                warn!(property = %property_id.0, error = %err, "daily availability check failed closed");
                false
            }
        }
    }

    /// Whether a monthly-mode property can take a new annual lease over the
    /// range. A property hosts at most one concurrent tenant, so any active
    /// lease refuses the request regardless of date overlap. Always `false`
    /// for daily-mode properties and whenever a collaborator fails.
    pub fn is_available_for_annual(&self, property_id: &PropertyId, range: &DateRange) -> bool {
        match self.annual_check(property_id, range) {
            Ok(free) => free,
            Err(err) => {
                warn!(property = %property_id.0, error = %err, "annual availability check failed closed");
                false
            }
        }
    }

    fn daily_check(&self, property_id: &PropertyId, range: &DateRange) -> Result<bool, StoreError> {
        if self.properties.rental_mode(property_id)? != RentalMode::Daily {
            return Ok(false);
        }

        for tenant in self.tenants.find_active_by_property(property_id)? {
            if self.lease_conflicts_with(&tenant, range)? {
                return Ok(false);
            }
        }

        if !self
            .requests
            .find_approved_overlapping(property_id, range)?
            .is_empty()
        {
            return Ok(false);
        }

        Ok(!self.booking_or_block_conflict(property_id, range)?)
    }

    fn annual_check(
        &self,
        property_id: &PropertyId,
        range: &DateRange,
    ) -> Result<bool, StoreError> {
        if self.properties.rental_mode(property_id)? != RentalMode::Monthly {
            return Ok(false);
        }

        if !self.tenants.find_active_by_property(property_id)?.is_empty() {
            return Ok(false);
        }

        // An approved request that has not materialized yet is already a
        // commitment; a second lease must not slip in underneath it.
        if !self
            .requests
            .find_approved_overlapping(property_id, range)?
            .is_empty()
        {
            return Ok(false);
        }

        Ok(!self.booking_or_block_conflict(property_id, range)?)
    }

    /// Shared tail of both boolean checks: non-cancelled bookings and
    /// landlord blocks.
    fn booking_or_block_conflict(
        &self,
        property_id: &PropertyId,
        range: &DateRange,
    ) -> Result<bool, StoreError> {
        let booked = self
            .bookings
            .find_overlapping(property_id, range)?
            .iter()
            .any(|booking| !booking.is_cancelled() && booking.effective_range().overlaps(range));
        if booked {
            return Ok(true);
        }

        let blocked = self
            .blocks
            .find_overlapping(property_id, range)?
            .iter()
            .any(|block| block.range().overlaps(range));
        Ok(blocked)
    }

    /// Whether the tenant's lease stands in the way of the range. An
    /// underivable lease end is treated as extending indefinitely forward,
    /// so it conflicts with any range the lease start precedes.
    fn lease_conflicts_with(&self, tenant: &Tenant, range: &DateRange) -> Result<bool, StoreError> {
        match self.lease.derived_range(tenant)? {
            Some(lease_range) => Ok(lease_range.overlaps(range)),
            None => Ok(tenant.lease_start < range.end),
        }
    }

    /// Diagnostic counterpart of the boolean checks: every conflicting
    /// booking, lease, and blocked period for the range, sorted by start.
    ///
    /// Emptiness agrees with the boolean check that applies to the
    /// property's mode: for monthly-mode properties an active tenant is
    /// reported even when its lease window lies outside the range, and an
    /// approved request awaiting materialization is reported as a lease
    /// commitment.
    pub fn conflicts(
        &self,
        property_id: &PropertyId,
        range: &DateRange,
    ) -> Result<Vec<ConflictInfo>, StoreError> {
        let mode = self.properties.rental_mode(property_id)?;
        let mut conflicts = Vec::new();

        for booking in self.bookings.find_overlapping(property_id, range)? {
            if booking.is_cancelled() {
                continue;
            }
            let booked = booking.effective_range();
            if !booked.overlaps(range) {
                continue;
            }
            conflicts.push(ConflictInfo {
                kind: ConflictKind::Booking,
                start: booked.start,
                end: booked.end,
                description: format!("confirmed booking for guest {}", booking.guest_id.0),
                source_id: booking.id.0.clone(),
            });
        }

        for tenant in self.tenants.find_active_by_property(property_id)? {
            self.push_lease_conflict(&tenant, range, mode, &mut conflicts)?;
        }

        for request in self.requests.find_approved_overlapping(property_id, range)? {
            // Skip requests whose tenant already materialized; the lease
            // entry above covers them.
            if self
                .tenants
                .find_active_by_user_and_property(&request.user_id, &request.property_id)?
                .is_some()
            {
                continue;
            }
            let proposed = request.proposed_range();
            if !proposed.overlaps(range) {
                continue;
            }
            conflicts.push(approved_request_conflict(&request, &proposed));
        }

        for block in self.blocks.find_overlapping(property_id, range)? {
            let blocked = block.range();
            if !blocked.overlaps(range) {
                continue;
            }
            conflicts.push(ConflictInfo {
                kind: ConflictKind::Blocked,
                start: blocked.start,
                end: blocked.end,
                description: format!("blocked by landlord: {}", block.reason),
                source_id: block.property_id.0.clone(),
            });
        }

        conflicts.sort_by_key(|conflict| conflict.start);
        Ok(conflicts)
    }

    fn push_lease_conflict(
        &self,
        tenant: &Tenant,
        range: &DateRange,
        mode: RentalMode,
        conflicts: &mut Vec<ConflictInfo>,
    ) -> Result<(), StoreError> {
        match self.lease.derived_range(tenant)? {
            Some(lease_range) => {
                if lease_range.overlaps(range) || mode == RentalMode::Monthly {
                    conflicts.push(ConflictInfo {
                        kind: ConflictKind::Lease,
                        start: lease_range.start,
                        end: lease_range.end,
                        description: format!("active lease held by {}", tenant.user_id.0),
                        source_id: tenant.id.0.clone(),
                    });
                }
            }
            None => {
                if tenant.lease_start < range.end || mode == RentalMode::Monthly {
                    conflicts.push(ConflictInfo {
                        kind: ConflictKind::Lease,
                        start: tenant.lease_start,
                        end: range.end.max(tenant.lease_start),
                        description: format!(
                            "active lease held by {} with undetermined end date",
                            tenant.user_id.0
                        ),
                        source_id: tenant.id.0.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

fn approved_request_conflict(request: &RentalRequest, proposed: &DateRange) -> ConflictInfo {
    ConflictInfo {
        kind: ConflictKind::Lease,
        start: proposed.start,
        end: proposed.end,
        description: format!("approved lease request from {}", request.user_id.0),
        source_id: request.id.0.clone(),
    }
}
