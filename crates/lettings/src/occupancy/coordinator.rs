use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::warn;

use super::availability::AvailabilityEngine;
use super::domain::{
    Booking, BookingId, BookingStatus, ConflictInfo, DateRange, PropertyId, RentalMode,
    RentalRequest, RequestId, UserId,
};
use super::lease::{is_valid_lease_duration, MIN_LEASE_DAYS};
use super::requests::{RentalRequestService, RequestError, SubmitRentalRequest};
use super::store::{BookingStore, PropertyLookup, StoreError};

/// How a creation path was refused. Routers map this onto status codes;
/// nothing else hangs off it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclineKind {
    /// The caller's payload failed a business rule.
    Validation,
    /// An existing commitment stands in the way.
    Conflict,
    /// A collaborator failed; the outcome fails safe to "not created".
    Infrastructure,
}

/// Result of a creation path. Expected business failures decline with a
/// reason; they are values, not errors.
#[derive(Debug)]
pub enum CreationOutcome<T> {
    Created(T),
    Declined { kind: DeclineKind, reason: String },
}

impl<T> CreationOutcome<T> {
    pub fn is_created(&self) -> bool {
        matches!(self, CreationOutcome::Created(_))
    }

    fn declined(kind: DeclineKind, reason: impl Into<String>) -> Self {
        CreationOutcome::Declined {
            kind,
            reason: reason.into(),
        }
    }
}

/// Inbound payload for a short-term stay.
#[derive(Debug, Clone)]
pub struct NewDailyBooking {
    pub property_id: PropertyId,
    pub guest_id: UserId,
    pub start: NaiveDate,
    pub end: Option<NaiveDate>,
}

/// Availability answer for a property, range, and requested mode.
#[derive(Debug, Serialize)]
pub struct AvailabilityReport {
    pub available: bool,
    pub conflicts: Vec<ConflictInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

static BOOKING_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_booking_id() -> BookingId {
    let id = BOOKING_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    BookingId(format!("bkg-{id:06}"))
}

/// Stateless orchestration over the engine, the lease rules, and the request
/// state machine. The coordinator sequences checks; it owns no business rule
/// of its own and never raises for an expected refusal.
pub struct RentalCoordinator {
    properties: Arc<dyn PropertyLookup>,
    bookings: Arc<dyn BookingStore>,
    availability: Arc<AvailabilityEngine>,
    requests: Arc<RentalRequestService>,
}

impl RentalCoordinator {
    pub fn new(
        properties: Arc<dyn PropertyLookup>,
        bookings: Arc<dyn BookingStore>,
        availability: Arc<AvailabilityEngine>,
        requests: Arc<RentalRequestService>,
    ) -> Self {
        Self {
            properties,
            bookings,
            availability,
            requests,
        }
    }

    /// Daily path: mode gate, availability gate, then delegate creation to
    /// the booking store. The store's linearizable create decides a race.
    pub fn create_daily_booking(&self, booking: NewDailyBooking) -> CreationOutcome<Booking> {
        if let Some(end) = booking.end {
            if end <= booking.start {
                return CreationOutcome::declined(
                    DeclineKind::Validation,
                    format!("booking end {end} must fall after start {}", booking.start),
                );
            }
        }

        match self.properties.rental_mode(&booking.property_id) {
            Ok(RentalMode::Daily) => {}
            Ok(RentalMode::Monthly) => {
                return CreationOutcome::declined(
                    DeclineKind::Validation,
                    "property is listed for monthly leases, not daily bookings",
                );
            }
            Err(err) => {
                warn!(property = %booking.property_id.0, error = %err, "rental mode lookup failed");
                return CreationOutcome::declined(
                    DeclineKind::Infrastructure,
                    "availability could not be verified",
                );
            }
        }

        let candidate = Booking {
            id: next_booking_id(),
            property_id: booking.property_id,
            guest_id: booking.guest_id,
            start: booking.start,
            end: booking.end,
            status: BookingStatus::Confirmed,
        };
        let range = candidate.effective_range();

        if !self
            .availability
            .is_available_for_daily(&candidate.property_id, &range)
        {
            return CreationOutcome::declined(
                DeclineKind::Conflict,
                "property is unavailable for the requested dates",
            );
        }

        match self.bookings.create(candidate) {
            Ok(created) => CreationOutcome::Created(created),
            Err(StoreError::Conflict) => CreationOutcome::declined(
                DeclineKind::Conflict,
                "property was booked while the request was in flight",
            ),
            Err(err) => {
                warn!(error = %err, "booking creation failed");
                CreationOutcome::declined(DeclineKind::Infrastructure, "booking was not created")
            }
        }
    }

    /// Annual path: mode gate, availability gate, duration gate, then
    /// delegate to the request state machine, which re-validates atomically.
    pub fn create_annual_request(
        &self,
        submission: SubmitRentalRequest,
        today: NaiveDate,
    ) -> CreationOutcome<RentalRequest> {
        match self.properties.rental_mode(&submission.property_id) {
            Ok(RentalMode::Daily) => {
                return CreationOutcome::declined(
                    DeclineKind::Validation,
                    "property is listed for daily bookings, not annual leases",
                );
            }
            Ok(RentalMode::Monthly) => {}
            Err(err) => {
                warn!(property = %submission.property_id.0, error = %err, "rental mode lookup failed");
                return CreationOutcome::declined(
                    DeclineKind::Infrastructure,
                    "availability could not be verified",
                );
            }
        }

        let range = match DateRange::new(submission.proposed_start, submission.proposed_end) {
            Ok(range) => range,
            Err(err) => {
                return CreationOutcome::declined(DeclineKind::Validation, err.to_string());
            }
        };

        if !self
            .availability
            .is_available_for_annual(&submission.property_id, &range)
        {
            return CreationOutcome::declined(
                DeclineKind::Conflict,
                "property has conflicting commitments for the proposed range",
            );
        }

        if !is_valid_lease_duration(submission.proposed_start, submission.proposed_end) {
            return CreationOutcome::declined(
                DeclineKind::Validation,
                format!(
                    "proposed lease spans {} days, below the {MIN_LEASE_DAYS}-day minimum",
                    range.num_days()
                ),
            );
        }

        match self.requests.submit(submission, today) {
            Ok(request) => CreationOutcome::Created(request),
            Err(RequestError::Store(err)) => {
                warn!(error = %err, "rental request creation failed");
                CreationOutcome::declined(
                    DeclineKind::Infrastructure,
                    "rental request was not created",
                )
            }
            Err(err @ RequestError::Unavailable) => {
                CreationOutcome::declined(DeclineKind::Conflict, err.to_string())
            }
            Err(err) => CreationOutcome::declined(DeclineKind::Validation, err.to_string()),
        }
    }

    /// Landlord response to a pending request: approve (materializing the
    /// tenant) or reject with the note.
    pub fn respond_to_request(
        &self,
        request_id: &RequestId,
        approved: bool,
        note: Option<String>,
        today: NaiveDate,
    ) -> Result<RentalRequest, RequestError> {
        if approved {
            self.requests.approve(request_id, note, today)
        } else {
            self.requests.reject(request_id, note, today)
        }
    }

    /// Diagnostic availability answer for the requested mode. A mode
    /// mismatch is unavailable with a reason and no conflict scan; a
    /// collaborator failure is unavailable with a generic reason.
    pub fn check_availability(
        &self,
        property_id: &PropertyId,
        range: &DateRange,
        mode: RentalMode,
    ) -> AvailabilityReport {
        let listed_mode = match self.properties.rental_mode(property_id) {
            Ok(listed_mode) => listed_mode,
            Err(err) => {
                warn!(property = %property_id.0, error = %err, "rental mode lookup failed");
                return AvailabilityReport {
                    available: false,
                    conflicts: Vec::new(),
                    reason: Some("availability could not be verified".to_string()),
                };
            }
        };

        if listed_mode != mode {
            return AvailabilityReport {
                available: false,
                conflicts: Vec::new(),
                reason: Some(format!(
                    "property is listed for {} rentals",
                    listed_mode.label()
                )),
            };
        }

        let available = match mode {
            RentalMode::Daily => self.availability.is_available_for_daily(property_id, range),
            RentalMode::Monthly => self.availability.is_available_for_annual(property_id, range),
        };

        let conflicts = match self.availability.conflicts(property_id, range) {
            Ok(conflicts) => conflicts,
            Err(err) => {
                warn!(property = %property_id.0, error = %err, "conflict aggregation failed");
                return AvailabilityReport {
                    available: false,
                    conflicts: Vec::new(),
                    reason: Some("availability could not be verified".to_string()),
                };
            }
        };

        let reason = if available {
            None
        } else {
            Some(format!(
                "{} conflicting commitment(s) found",
                conflicts.len()
            ))
        };

        AvailabilityReport {
            available,
            conflicts,
            reason,
        }
    }
}
