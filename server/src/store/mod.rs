//! Persistence seam for rooms and reservations.
//!
//! Reads that need no consistency with a later write go through
//! [`ReservationStore`] directly. Anything that checks-then-writes runs
//! inside a [`UnitOfWork`], which is one database transaction: dropping it
//! without [`UnitOfWork::commit`] rolls everything back.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Reservation, Room, RoomFilter, RoomStatus, StayDates};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

pub const ROOM_NUMBER_CONSTRAINT: &str = "rooms_room_number_key";
pub const RESERVATION_REFERENCE_CONSTRAINT: &str = "reservations_reference_key";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error")]
    Database(#[from] sqlx::Error),

    #[error("unique constraint {0} violated")]
    UniqueViolation(String),

    #[error("reservation overlaps an active reservation on the same room")]
    OverlapViolation,

    #[error("{0} does not exist")]
    Missing(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait ReservationStore: Send + Sync {
    async fn begin(&self) -> StoreResult<Box<dyn UnitOfWork>>;

    async fn room(&self, id: Uuid) -> StoreResult<Option<Room>>;

    /// Rooms matching the static filters, ordered by room number.
    async fn rooms(&self, filter: &RoomFilter) -> StoreResult<Vec<Room>>;

    /// Active reservations on any of `room_ids` whose stay overlaps `stay`.
    async fn overlapping_reservations(
        &self,
        room_ids: &[Uuid],
        stay: &StayDates,
    ) -> StoreResult<Vec<Reservation>>;

    async fn reservation(&self, id: Uuid) -> StoreResult<Option<Reservation>>;

    async fn reservation_by_reference(&self, reference: &str) -> StoreResult<Option<Reservation>>;

    /// Ordered by check-in date.
    async fn reservations_for_guest(&self, guest_id: Uuid) -> StoreResult<Vec<Reservation>>;

    /// Every reservation ever made for the room, ordered by check-in date.
    async fn reservations_for_room(&self, room_id: Uuid) -> StoreResult<Vec<Reservation>>;
}

#[async_trait]
pub trait UnitOfWork: Send {
    /// Loads the room and holds its lock until the unit ends. Every flow that
    /// writes reservations for a room takes this lock first, which is what
    /// serializes concurrent bookings of the same room.
    async fn room_for_update(&mut self, id: Uuid) -> StoreResult<Option<Room>>;

    async fn insert_room(&mut self, room: &Room) -> StoreResult<()>;

    async fn update_room(&mut self, room: &Room) -> StoreResult<()>;

    async fn delete_room(&mut self, id: Uuid) -> StoreResult<()>;

    async fn set_room_status(
        &mut self,
        id: Uuid,
        status: RoomStatus,
        at: DateTime<Utc>,
    ) -> StoreResult<()>;

    async fn active_reservations_overlapping(
        &mut self,
        room_id: Uuid,
        stay: &StayDates,
    ) -> StoreResult<Vec<Reservation>>;

    async fn count_active_reservations(&mut self, room_id: Uuid) -> StoreResult<i64>;

    async fn insert_reservation(&mut self, reservation: &Reservation) -> StoreResult<()>;

    async fn reservation_for_update(&mut self, id: Uuid) -> StoreResult<Option<Reservation>>;

    async fn update_reservation(&mut self, reservation: &Reservation) -> StoreResult<()>;

    async fn commit(self: Box<Self>) -> StoreResult<()>;
}
