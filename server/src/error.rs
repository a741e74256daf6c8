use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::ReservationStatus;
use crate::store::StoreError;

/// Every named outcome of the reservation engine.
#[derive(Debug, Error)]
pub enum ReservationError {
    #[error("check-out {check_out} must be after check-in {check_in}")]
    InvalidDateRange {
        check_in: NaiveDate,
        check_out: NaiveDate,
    },

    #[error("check-in {check_in} is in the past (today is {today})")]
    CheckInInPast { check_in: NaiveDate, today: NaiveDate },

    #[error("{guest_count} guests exceed room capacity of {capacity}")]
    CapacityExceeded { guest_count: i32, capacity: i32 },

    #[error("{0}")]
    Validation(String),

    #[error("room {0} not found")]
    RoomNotFound(Uuid),

    #[error("reservation {0} not found")]
    ReservationNotFound(String),

    #[error("guest {0} not found")]
    GuestNotFound(Uuid),

    #[error("room {room_id} is no longer available for the requested dates")]
    RoomNoLongerAvailable { room_id: Uuid },

    #[error("reservation booked at {booked_at} can no longer be cancelled online; contact the front desk")]
    CancellationWindowExpired { booked_at: DateTime<Utc> },

    #[error("cannot move reservation from {from} to {to}")]
    InvalidStateTransition {
        from: ReservationStatus,
        to: ReservationStatus,
    },

    #[error("room {room_id} has {count} active reservation(s)")]
    RoomHasActiveReservations { room_id: Uuid, count: i64 },

    #[error("room number {0} already exists")]
    DuplicateRoomNumber(String),

    #[error("{0}")]
    Forbidden(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ReservationError {
    /// Recoverable conflicts: the caller should re-query and retry with
    /// different input.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            ReservationError::RoomNoLongerAvailable { .. }
                | ReservationError::CancellationWindowExpired { .. }
                | ReservationError::InvalidStateTransition { .. }
                | ReservationError::RoomHasActiveReservations { .. }
                | ReservationError::DuplicateRoomNumber(_)
        )
    }

    /// Stable machine-readable name of the outcome.
    pub fn code(&self) -> &'static str {
        match self {
            ReservationError::InvalidDateRange { .. } => "INVALID_DATE_RANGE",
            ReservationError::CheckInInPast { .. } => "CHECK_IN_IN_PAST",
            ReservationError::CapacityExceeded { .. } => "CAPACITY_EXCEEDED",
            ReservationError::Validation(_) => "VALIDATION_ERROR",
            ReservationError::RoomNotFound(_) => "ROOM_NOT_FOUND",
            ReservationError::ReservationNotFound(_) => "RESERVATION_NOT_FOUND",
            ReservationError::GuestNotFound(_) => "GUEST_NOT_FOUND",
            ReservationError::RoomNoLongerAvailable { .. } => "ROOM_NO_LONGER_AVAILABLE",
            ReservationError::CancellationWindowExpired { .. } => "CANCELLATION_WINDOW_EXPIRED",
            ReservationError::InvalidStateTransition { .. } => "INVALID_STATE_TRANSITION",
            ReservationError::RoomHasActiveReservations { .. } => "ROOM_HAS_ACTIVE_RESERVATIONS",
            ReservationError::DuplicateRoomNumber(_) => "DUPLICATE_ROOM_NUMBER",
            ReservationError::Forbidden(_) => "FORBIDDEN",
            ReservationError::Store(_) => "DATABASE_ERROR",
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ReservationError::InvalidDateRange { .. }
                | ReservationError::CheckInInPast { .. }
                | ReservationError::CapacityExceeded { .. }
                | ReservationError::Validation(_)
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ReservationError::RoomNotFound(_)
                | ReservationError::ReservationNotFound(_)
                | ReservationError::GuestNotFound(_)
        )
    }
}

pub type Result<T, E = ReservationError> = std::result::Result<T, E>;
