use std::sync::Arc;

use super::common::*;
use crate::occupancy::availability::AvailabilityEngine;
use crate::occupancy::domain::{RequestStatus, TenantStatus};
use crate::occupancy::lease::LeaseCalculator;
use crate::occupancy::requests::{RentalRequestService, RequestError};
use crate::occupancy::store::{RentalRequestStore, TenantStore};

fn today() -> chrono::NaiveDate {
    date(2024, 2, 1)
}

#[test]
fn submit_inserts_a_pending_request() {
    let h = harness();
    let request = h
        .service
        .submit(
            submission(MONTHLY_PROPERTY, "alice", date(2024, 3, 1), date(2025, 3, 1), 12),
            today(),
        )
        .expect("valid submission is accepted");

    assert_eq!(request.status, RequestStatus::Pending);
    assert_eq!(request.request_date, today());
    assert_eq!(h.requests.pending_count(&property(MONTHLY_PROPERTY)), 1);
}

#[test]
fn submit_rejects_inverted_ranges_without_inserting() {
    let h = harness();
    let result = h.service.submit(
        submission(MONTHLY_PROPERTY, "alice", date(2025, 3, 1), date(2024, 3, 1), 12),
        today(),
    );
    assert!(matches!(result, Err(RequestError::InvalidRange(_))));
    assert_eq!(h.requests.pending_count(&property(MONTHLY_PROPERTY)), 0);
}

#[test]
fn submit_enforces_the_minimum_duration() {
    let h = harness();
    let result = h.service.submit(
        submission(MONTHLY_PROPERTY, "alice", date(2024, 3, 1), date(2024, 6, 1), 3),
        today(),
    );
    match result {
        Err(RequestError::DurationBelowMinimum { minimum, actual }) => {
            assert_eq!(minimum, 180);
            assert!(actual < minimum);
        }
        other => panic!("expected duration rejection, got {other:?}"),
    }
    assert_eq!(h.requests.pending_count(&property(MONTHLY_PROPERTY)), 0);
}

#[test]
fn submit_rejects_daily_properties() {
    let h = harness();
    let result = h.service.submit(
        submission(DAILY_PROPERTY, "alice", date(2024, 3, 1), date(2025, 3, 1), 12),
        today(),
    );
    assert!(matches!(result, Err(RequestError::NotAnnualProperty(_))));
}

#[test]
fn submit_rejects_when_property_is_committed() {
    let h = harness();
    seed_lease(&h, "tenant-1", "bob", MONTHLY_PROPERTY, date(2024, 1, 1), 12);

    let result = h.service.submit(
        submission(MONTHLY_PROPERTY, "alice", date(2026, 3, 1), date(2027, 3, 1), 12),
        today(),
    );
    assert!(matches!(result, Err(RequestError::Unavailable)));
    assert_eq!(h.requests.pending_count(&property(MONTHLY_PROPERTY)), 0);
}

#[test]
fn raced_overlapping_submission_loses_at_the_store() {
    let h = harness();
    // Simulate the race: a pending request landed after the availability
    // check and before the insert.
    let first = h
        .service
        .submit(
            submission(MONTHLY_PROPERTY, "bob", date(2024, 3, 1), date(2025, 3, 1), 12),
            today(),
        )
        .expect("first submission is accepted");
    assert_eq!(first.status, RequestStatus::Pending);

    let result = h.service.submit(
        submission(MONTHLY_PROPERTY, "alice", date(2024, 6, 1), date(2025, 6, 1), 12),
        today(),
    );
    assert!(matches!(result, Err(RequestError::Unavailable)));
    assert_eq!(h.requests.pending_count(&property(MONTHLY_PROPERTY)), 1);
}

#[test]
fn approve_materializes_exactly_one_tenant() {
    let h = harness();
    let request = h
        .service
        .submit(
            submission(MONTHLY_PROPERTY, "alice", date(2024, 3, 1), date(2025, 3, 1), 12),
            today(),
        )
        .expect("submission is accepted");

    let approved = h
        .service
        .approve(&request.id, Some("welcome".to_string()), today())
        .expect("pending request approves");

    assert_eq!(approved.status, RequestStatus::Approved);
    assert_eq!(approved.landlord_response.as_deref(), Some("welcome"));
    assert_eq!(approved.response_date, Some(today()));
    assert_eq!(h.tenants.active_count(), 1);

    let tenant = h
        .tenants
        .find_active_by_user_and_property(&user("alice"), &property(MONTHLY_PROPERTY))
        .expect("lookup succeeds")
        .expect("tenant materialized");
    assert_eq!(tenant.lease_start, date(2024, 3, 1));
    assert_eq!(tenant.status, TenantStatus::Active);
}

#[test]
fn double_approval_is_a_noop_with_a_single_tenant() {
    let h = harness();
    let request = h
        .service
        .submit(
            submission(MONTHLY_PROPERTY, "alice", date(2024, 3, 1), date(2025, 3, 1), 12),
            today(),
        )
        .expect("submission is accepted");

    h.service
        .approve(&request.id, None, today())
        .expect("first approval");
    let second = h
        .service
        .approve(&request.id, None, today())
        .expect("re-approval is a no-op");

    assert_eq!(second.status, RequestStatus::Approved);
    assert_eq!(h.tenants.active_count(), 1);
}

#[test]
fn approval_with_existing_tenant_does_not_duplicate() {
    let h = harness();
    let request = h
        .service
        .submit(
            submission(MONTHLY_PROPERTY, "alice", date(2024, 3, 1), date(2025, 3, 1), 12),
            today(),
        )
        .expect("submission is accepted");
    h.tenants
        .seed(active_tenant("tenant-existing", "alice", MONTHLY_PROPERTY, date(2024, 3, 1)));

    h.service
        .approve(&request.id, None, today())
        .expect("approval succeeds");
    assert_eq!(h.tenants.active_count(), 1);
}

#[test]
fn approve_refuses_terminal_requests() {
    let h = harness();
    let request = h
        .service
        .submit(
            submission(MONTHLY_PROPERTY, "alice", date(2024, 3, 1), date(2025, 3, 1), 12),
            today(),
        )
        .expect("submission is accepted");
    h.service
        .reject(&request.id, Some("no pets".to_string()), today())
        .expect("rejection succeeds");

    match h.service.approve(&request.id, None, today()) {
        Err(RequestError::AlreadyResolved(RequestStatus::Rejected)) => {}
        other => panic!("expected terminal-state refusal, got {other:?}"),
    }
    assert_eq!(h.tenants.active_count(), 0);
}

#[test]
fn approve_unknown_request_is_not_found() {
    let h = harness();
    let missing = crate::occupancy::domain::RequestId("req-ghost".to_string());
    assert!(matches!(
        h.service.approve(&missing, None, today()),
        Err(RequestError::NotFound)
    ));
}

#[test]
fn reject_and_withdraw_only_leave_pending() {
    let h = harness();
    let request = h
        .service
        .submit(
            submission(MONTHLY_PROPERTY, "alice", date(2024, 3, 1), date(2025, 3, 1), 12),
            today(),
        )
        .expect("submission is accepted");

    let withdrawn = h
        .service
        .withdraw(&request.id, today())
        .expect("pending request withdraws");
    assert_eq!(withdrawn.status, RequestStatus::Withdrawn);

    assert!(matches!(
        h.service.reject(&request.id, None, today()),
        Err(RequestError::AlreadyResolved(RequestStatus::Withdrawn))
    ));
    assert!(matches!(
        h.service.withdraw(&request.id, today()),
        Err(RequestError::AlreadyResolved(RequestStatus::Withdrawn))
    ));
}

#[test]
fn failed_materialization_reverts_the_approval() {
    let h = harness();
    let tenants = Arc::new(ReadOnlyTenants::default());
    let lease = Arc::new(LeaseCalculator::new(tenants.clone(), h.requests.clone()));
    let engine = Arc::new(AvailabilityEngine::new(
        h.properties.clone(),
        h.bookings.clone(),
        tenants.clone(),
        h.requests.clone(),
        h.blocks.clone(),
        lease,
    ));
    let service = RentalRequestService::new(
        h.properties.clone(),
        tenants,
        h.requests.clone(),
        engine,
    );

    let request = service
        .submit(
            submission(MONTHLY_PROPERTY, "alice", date(2024, 3, 1), date(2025, 3, 1), 12),
            today(),
        )
        .expect("submission is accepted");

    let result = service.approve(&request.id, Some("welcome".to_string()), today());
    assert!(matches!(result, Err(RequestError::Store(_))));

    let stored = h
        .requests
        .get(&request.id)
        .expect("lookup succeeds")
        .expect("request still present");
    assert_eq!(
        stored.status,
        RequestStatus::Pending,
        "approval must not be left half-applied"
    );
}
