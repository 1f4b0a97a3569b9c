use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Identifier wrapper for properties under management.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PropertyId(pub String);

/// Identifier wrapper for guests and prospective tenants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

/// Identifier wrapper for daily bookings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookingId(pub String);

/// Identifier wrapper for rental requests.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub String);

/// Identifier wrapper for active lease (tenant) records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TenantId(pub String);

/// Half-open calendar interval `[start, end)`. The end date itself is never
/// occupied, so back-to-back ranges coexist.
///
/// Invariant: `start < end`, enforced by [`DateRange::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, InvalidDateRange> {
        if start < end {
            Ok(Self { start, end })
        } else {
            Err(InvalidDateRange { start, end })
        }
    }

    /// The one overlap predicate. Every conflict check in the crate routes
    /// through here; call sites must not re-derive their own date comparisons.
    pub fn overlaps(&self, other: &DateRange) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn num_days(&self) -> i64 {
        self.end.signed_duration_since(self.start).num_days()
    }
}

/// Raised when a caller supplies an empty or inverted interval.
#[derive(Debug, Clone, thiserror::Error)]
#[error("range start {start} must fall strictly before end {end}")]
pub struct InvalidDateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Occupancy mode a property is listed under. The two modes are mutually
/// exclusive for the lifetime of any active commitment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RentalMode {
    Daily,
    Monthly,
}

impl RentalMode {
    pub const fn label(self) -> &'static str {
        match self {
            RentalMode::Daily => "daily",
            RentalMode::Monthly => "monthly",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
}

/// Short-term stay on a daily-mode property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub property_id: PropertyId,
    pub guest_id: UserId,
    pub start: NaiveDate,
    pub end: Option<NaiveDate>,
    pub status: BookingStatus,
}

impl Booking {
    /// The interval this booking occupies for conflict purposes. An open-ended
    /// booking (no recorded end) occupies a single night; that policy is
    /// applied here and nowhere else.
    pub fn effective_range(&self) -> DateRange {
        let end = match self.end {
            Some(end) if end > self.start => end,
            _ => self.start.succ_opt().unwrap_or(NaiveDate::MAX),
        };
        DateRange {
            start: self.start,
            end,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == BookingStatus::Cancelled
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TenantStatus {
    Active,
    Inactive,
}

/// Active lease record for a monthly-mode property. The lease end date is
/// never stored here; it is derived on every read from the tenant's latest
/// approved rental request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: TenantId,
    pub user_id: UserId,
    pub property_id: PropertyId,
    pub lease_start: NaiveDate,
    pub status: TenantStatus,
}

impl Tenant {
    pub fn is_active(&self) -> bool {
        self.status == TenantStatus::Active
    }
}

/// Lifecycle states for a rental request. `Pending` is the only non-terminal
/// state; nothing re-enters it once resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
    Withdrawn,
}

impl RequestStatus {
    pub const fn label(self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
            RequestStatus::Withdrawn => "withdrawn",
        }
    }

    pub const fn is_terminal(self) -> bool {
        !matches!(self, RequestStatus::Pending)
    }
}

/// A prospective tenant's application for an annual lease.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RentalRequest {
    pub id: RequestId,
    pub property_id: PropertyId,
    pub user_id: UserId,
    pub proposed_start: NaiveDate,
    pub proposed_end: NaiveDate,
    pub lease_duration_months: u32,
    pub status: RequestStatus,
    pub request_date: NaiveDate,
    pub landlord_response: Option<String>,
    pub response_date: Option<NaiveDate>,
}

impl RentalRequest {
    /// Interval the request would commit if approved. Requests are validated
    /// on intake, so an inverted range here degrades to a single day rather
    /// than panicking.
    pub fn proposed_range(&self) -> DateRange {
        let end = if self.proposed_end > self.proposed_start {
            self.proposed_end
        } else {
            self.proposed_start.succ_opt().unwrap_or(NaiveDate::MAX)
        };
        DateRange {
            start: self.proposed_start,
            end,
        }
    }

    pub fn status_view(&self) -> RequestStatusView {
        RequestStatusView {
            request_id: self.id.clone(),
            status: self.status.label(),
            request_date: self.request_date,
            landlord_response: self.landlord_response.clone(),
            response_date: self.response_date,
        }
    }
}

/// Sanitized representation of a request's externally visible state.
#[derive(Debug, Clone, Serialize)]
pub struct RequestStatusView {
    pub request_id: RequestId,
    pub status: &'static str,
    pub request_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub landlord_response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_date: Option<NaiveDate>,
}

/// Landlord-imposed unavailability window, independent of bookings and
/// leases. Always a conflict source regardless of rental mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockedPeriod {
    pub property_id: PropertyId,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub reason: String,
}

impl BlockedPeriod {
    pub fn range(&self) -> DateRange {
        let end = if self.end > self.start {
            self.end
        } else {
            self.start.succ_opt().unwrap_or(NaiveDate::MAX)
        };
        DateRange {
            start: self.start,
            end,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    Booking,
    Lease,
    Blocked,
}

impl ConflictKind {
    pub const fn label(self) -> &'static str {
        match self {
            ConflictKind::Booking => "booking",
            ConflictKind::Lease => "lease",
            ConflictKind::Blocked => "blocked",
        }
    }
}

/// Uniform record for one conflicting commitment, the output shape of
/// conflict aggregation. Aggregated lists are always sorted by `start`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConflictInfo {
    pub kind: ConflictKind,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub description: String,
    pub source_id: String,
}
