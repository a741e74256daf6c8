use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::ReservationError;
use crate::models::guest::GuestIdentity;
use crate::models::room::RoomStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "reservation_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    CheckedIn,
    CheckedOut,
    Cancelled,
}

impl ReservationStatus {
    pub const ALL: [ReservationStatus; 5] = [
        ReservationStatus::Pending,
        ReservationStatus::Confirmed,
        ReservationStatus::CheckedIn,
        ReservationStatus::CheckedOut,
        ReservationStatus::Cancelled,
    ];

    /// Statuses that hold a room for their date range.
    pub const ACTIVE: [ReservationStatus; 3] = [
        ReservationStatus::Pending,
        ReservationStatus::Confirmed,
        ReservationStatus::CheckedIn,
    ];

    pub fn is_active(self) -> bool {
        Self::ACTIVE.contains(&self)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, ReservationStatus::CheckedOut | ReservationStatus::Cancelled)
    }

    /// Whether the guest-facing cancel operation may act on this status.
    pub fn is_cancellable(self) -> bool {
        matches!(self, ReservationStatus::Pending | ReservationStatus::Confirmed)
    }

    /// Forward edges of the lifecycle. Staying in place is not an edge.
    pub fn can_transition_to(self, to: ReservationStatus) -> bool {
        use ReservationStatus::*;
        matches!(
            (self, to),
            (Pending, Confirmed)
                | (Pending, Cancelled)
                | (Confirmed, CheckedIn)
                | (Confirmed, Cancelled)
                | (CheckedIn, CheckedOut)
        )
    }

    /// Coarse room status implied by a reservation entering this status.
    pub fn implied_room_status(self) -> RoomStatus {
        match self {
            ReservationStatus::Pending | ReservationStatus::Confirmed => RoomStatus::Reserved,
            ReservationStatus::CheckedIn => RoomStatus::Occupied,
            ReservationStatus::CheckedOut | ReservationStatus::Cancelled => RoomStatus::Available,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ReservationStatus::Pending => "pending",
            ReservationStatus::Confirmed => "confirmed",
            ReservationStatus::CheckedIn => "checked_in",
            ReservationStatus::CheckedOut => "checked_out",
            ReservationStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment progress, independent of [`ReservationStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Unpaid,
    Pending,
    Paid,
    Refunded,
}

/// A validated half-open stay `[check_in, check_out)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StayDates {
    check_in: NaiveDate,
    check_out: NaiveDate,
}

impl StayDates {
    pub fn new(check_in: NaiveDate, check_out: NaiveDate) -> Result<Self, ReservationError> {
        if check_out <= check_in {
            return Err(ReservationError::InvalidDateRange {
                check_in,
                check_out,
            });
        }
        Ok(Self {
            check_in,
            check_out,
        })
    }

    pub fn check_in(&self) -> NaiveDate {
        self.check_in
    }

    pub fn check_out(&self) -> NaiveDate {
        self.check_out
    }

    /// Whole nights in the stay. Dates carry no time component, so the
    /// day difference is already the ceiling.
    pub fn nights(&self) -> i64 {
        (self.check_out - self.check_in).num_days()
    }

    /// Strict comparison on both ends so a checkout day can be the next
    /// guest's check-in day.
    pub fn overlaps(&self, check_in: NaiveDate, check_out: NaiveDate) -> bool {
        check_in < self.check_out && check_out > self.check_in
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Reservation {
    pub id: Uuid,
    pub reference: String,
    pub guest_id: Uuid,
    pub room_id: Uuid,
    pub room_number: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub guest_count: i32,
    pub nightly_rate: Decimal,
    pub nights: i32,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total_price: Decimal,
    pub special_requests: Option<String>,
    pub arrival_time: Option<NaiveTime>,
    pub status: ReservationStatus,
    pub payment_status: PaymentStatus,
    pub cancellation_reason: Option<String>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Reservation {
    pub fn overlaps(&self, stay: &StayDates) -> bool {
        stay.overlaps(self.check_in, self.check_out)
    }

    pub fn blocks(&self, stay: &StayDates) -> bool {
        self.status.is_active() && self.overlaps(stay)
    }
}

/// Booking request as received at the boundary.
#[derive(Debug, Clone, Deserialize)]
pub struct BookingRequest {
    pub room_id: Uuid,
    pub guest: GuestIdentity,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub guest_count: i32,
    pub special_requests: Option<String>,
    pub arrival_time: Option<NaiveTime>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookingConfirmation {
    pub booking_reference: String,
    pub reservation: Reservation,
}

#[derive(Debug, Clone, Serialize)]
pub struct CancellationOutcome {
    pub reservation: Reservation,
    pub refund_amount: Decimal,
}

/// Administrative update; either axis may be omitted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReservationUpdate {
    pub status: Option<ReservationStatus>,
    pub payment_status: Option<PaymentStatus>,
}
