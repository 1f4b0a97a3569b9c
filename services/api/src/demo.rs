use crate::cli::LeaseReportArgs;
use crate::infra::{build_occupancy_stack, parse_date, OccupancyStack};
use chrono::{Days, Local, Months, NaiveDate};
use clap::Args;
use lettings::error::AppError;
use lettings::occupancy::{
    BlockedPeriod, Booking, BookingId, BookingStatus, CreationOutcome, DateRange, NewDailyBooking,
    PropertyId, RentalMode, RentalRequest, RequestId, RequestStatus, SubmitRentalRequest, Tenant,
    TenantId, TenantStatus, UserId,
};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Override the reference date for the walkthrough (defaults to today).
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Skip the annual lease portion of the demo.
    #[arg(long)]
    pub(crate) skip_annual: bool,
}

const DAILY_PROPERTY: &str = "shore-cottage";
const MONTHLY_PROPERTY: &str = "elm-house";

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());
    let stack = build_occupancy_stack();
    seed_demo_portfolio(&stack, today);

    println!("Lettings occupancy walkthrough (reference date {today})");
    run_daily_path(&stack, today);
    if !args.skip_annual {
        run_annual_path(&stack, today);
    }
    Ok(())
}

fn run_daily_path(stack: &OccupancyStack, today: NaiveDate) {
    println!("\n== Daily bookings on '{DAILY_PROPERTY}' ==");

    let busy_start = today + Days::new(10);
    let busy_end = today + Days::new(14);
    println!("  Seeded booking occupies [{busy_start}, {busy_end})");

    let report = stack.coordinator.check_availability(
        &PropertyId(DAILY_PROPERTY.to_string()),
        &demo_range(today + Days::new(12), today + Days::new(16)),
        RentalMode::Daily,
    );
    println!(
        "  Availability for [{}, {}): {}",
        today + Days::new(12),
        today + Days::new(16),
        if report.available { "free" } else { "conflicted" }
    );
    for conflict in &report.conflicts {
        println!(
            "    - {} [{}, {}): {}",
            conflict.kind.label(),
            conflict.start,
            conflict.end,
            conflict.description
        );
    }

    // Back-to-back with the seeded checkout day: the half-open interval
    // means the checkout day itself is free.
    let outcome = stack.coordinator.create_daily_booking(NewDailyBooking {
        property_id: PropertyId(DAILY_PROPERTY.to_string()),
        guest_id: UserId("demo-guest".to_string()),
        start: busy_end,
        end: Some(busy_end + Days::new(3)),
    });
    describe_booking_outcome("Back-to-back booking", &outcome);

    let clash = stack.coordinator.create_daily_booking(NewDailyBooking {
        property_id: PropertyId(DAILY_PROPERTY.to_string()),
        guest_id: UserId("demo-guest-2".to_string()),
        start: busy_start + Days::new(1),
        end: Some(busy_start + Days::new(2)),
    });
    describe_booking_outcome("Overlapping booking", &clash);
}

fn run_annual_path(stack: &OccupancyStack, today: NaiveDate) {
    println!("\n== Annual leases on '{MONTHLY_PROPERTY}' ==");

    let lease_start = today + Days::new(30);
    let lease_end = lease_start
        .checked_add_months(Months::new(12))
        .unwrap_or(lease_start);

    let outcome = stack.coordinator.create_annual_request(
        SubmitRentalRequest {
            property_id: PropertyId(MONTHLY_PROPERTY.to_string()),
            user_id: UserId("demo-applicant".to_string()),
            proposed_start: lease_start,
            proposed_end: lease_end,
            lease_duration_months: 12,
        },
        today,
    );
    let request = match outcome {
        CreationOutcome::Created(request) => {
            println!(
                "  Request {} submitted for [{lease_start}, {lease_end}): {}",
                request.id.0,
                request.status.label()
            );
            request
        }
        CreationOutcome::Declined { reason, .. } => {
            println!("  Request declined: {reason}");
            return;
        }
    };

    match stack
        .coordinator
        .respond_to_request(&request.id, true, Some("welcome aboard".to_string()), today)
    {
        Ok(approved) => println!("  Landlord response recorded: {}", approved.status.label()),
        Err(err) => {
            println!("  Approval failed: {err}");
            return;
        }
    }

    let second = stack.coordinator.create_annual_request(
        SubmitRentalRequest {
            property_id: PropertyId(MONTHLY_PROPERTY.to_string()),
            user_id: UserId("demo-applicant-2".to_string()),
            proposed_start: lease_end + Days::new(400),
            proposed_end: lease_end + Days::new(765),
            lease_duration_months: 12,
        },
        today,
    );
    match second {
        CreationOutcome::Created(request) => {
            println!("  Unexpected second commitment accepted: {}", request.id.0)
        }
        CreationOutcome::Declined { reason, .. } => {
            println!("  Second lease attempt declined while tenant is active: {reason}")
        }
    }

    let report = stack.coordinator.check_availability(
        &PropertyId(MONTHLY_PROPERTY.to_string()),
        &demo_range(lease_start + Days::new(60), lease_start + Days::new(90)),
        RentalMode::Monthly,
    );
    println!(
        "  Mid-lease availability: {}",
        if report.available { "free" } else { "conflicted" }
    );
    for conflict in &report.conflicts {
        println!(
            "    - {} [{}, {}): {}",
            conflict.kind.label(),
            conflict.start,
            conflict.end,
            conflict.description
        );
    }
}

pub(crate) fn run_lease_report(args: LeaseReportArgs) -> Result<(), AppError> {
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());
    let stack = build_occupancy_stack();
    seed_demo_portfolio(&stack, today);
    seed_demo_leases(&stack, today);

    let expiring = stack.lease.list_expiring(args.days_ahead, today)?;
    let expired = stack.lease.list_expired(today)?;

    println!("Lease horizon report for {today} (demo portfolio)");
    if expiring.is_empty() {
        println!("  Expiring within {} days: none", args.days_ahead);
    } else {
        println!("  Expiring within {} days:", args.days_ahead);
        for entry in &expiring {
            println!(
                "    - {} at {} ends {} ({} days left)",
                entry.tenant.user_id.0,
                entry.tenant.property_id.0,
                entry.lease_end,
                entry.remaining_days
            );
        }
    }
    if expired.is_empty() {
        println!("  Already lapsed: none");
    } else {
        println!("  Already lapsed:");
        for entry in &expired {
            println!(
                "    - {} at {} ended {}",
                entry.tenant.user_id.0, entry.tenant.property_id.0, entry.lease_end
            );
        }
    }
    Ok(())
}

fn seed_demo_portfolio(stack: &OccupancyStack, today: NaiveDate) {
    stack.properties.insert(DAILY_PROPERTY, RentalMode::Daily);
    stack.properties.insert(MONTHLY_PROPERTY, RentalMode::Monthly);

    stack.bookings.seed(Booking {
        id: BookingId("bkg-demo".to_string()),
        property_id: PropertyId(DAILY_PROPERTY.to_string()),
        guest_id: UserId("returning-guest".to_string()),
        start: today + Days::new(10),
        end: Some(today + Days::new(14)),
        status: BookingStatus::Confirmed,
    });

    stack.blocks.seed(BlockedPeriod {
        property_id: PropertyId(DAILY_PROPERTY.to_string()),
        start: today + Days::new(60),
        end: today + Days::new(67),
        reason: "annual maintenance".to_string(),
    });
}

/// Two finished-or-finishing tenancies so the horizon report has content.
fn seed_demo_leases(stack: &OccupancyStack, today: NaiveDate) {
    let soon_start = today
        .checked_sub_months(Months::new(11))
        .unwrap_or(today);
    seed_lease_pair(stack, "mill-flat", "long-term-tenant", soon_start, 12);

    let lapsed_start = today
        .checked_sub_months(Months::new(24))
        .unwrap_or(today);
    seed_lease_pair(stack, "oak-terrace", "former-tenant", lapsed_start, 12);
}

fn seed_lease_pair(
    stack: &OccupancyStack,
    property_id: &str,
    user_id: &str,
    lease_start: NaiveDate,
    months: u32,
) {
    stack.properties.insert(property_id, RentalMode::Monthly);
    let proposed_end = lease_start
        .checked_add_months(Months::new(months))
        .unwrap_or(lease_start);
    stack.requests.seed(RentalRequest {
        id: RequestId(format!("req-{property_id}")),
        property_id: PropertyId(property_id.to_string()),
        user_id: UserId(user_id.to_string()),
        proposed_start: lease_start,
        proposed_end,
        lease_duration_months: months,
        status: RequestStatus::Approved,
        request_date: lease_start,
        landlord_response: Some("approved".to_string()),
        response_date: Some(lease_start),
    });
    stack.tenants.seed(Tenant {
        id: TenantId(format!("tenant-{property_id}")),
        user_id: UserId(user_id.to_string()),
        property_id: PropertyId(property_id.to_string()),
        lease_start,
        status: TenantStatus::Active,
    });
}

fn demo_range(start: NaiveDate, end: NaiveDate) -> DateRange {
    DateRange::new(start, end).unwrap_or(DateRange {
        start,
        end: start + Days::new(1),
    })
}

fn describe_booking_outcome(label: &str, outcome: &CreationOutcome<Booking>) {
    match outcome {
        CreationOutcome::Created(booking) => {
            let occupied = booking.effective_range();
            println!(
                "  {label}: created {} for [{}, {})",
                booking.id.0, occupied.start, occupied.end
            );
        }
        CreationOutcome::Declined { reason, .. } => println!("  {label}: declined ({reason})"),
    }
}
