use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use super::{
    ReservationStore, StoreError, StoreResult, UnitOfWork, RESERVATION_REFERENCE_CONSTRAINT,
    ROOM_NUMBER_CONSTRAINT,
};
use crate::models::{Reservation, Room, RoomFilter, RoomStatus, StayDates};

#[derive(Debug, Clone, Default)]
struct Tables {
    rooms: HashMap<Uuid, Room>,
    reservations: HashMap<Uuid, Reservation>,
}

impl Tables {
    fn check_room_number(&self, room: &Room) -> StoreResult<()> {
        let taken = self
            .rooms
            .values()
            .any(|r| r.id != room.id && r.room_number == room.room_number);
        if taken {
            return Err(StoreError::UniqueViolation(ROOM_NUMBER_CONSTRAINT.to_string()));
        }
        Ok(())
    }

    /// Same guarantee as the exclusion constraint on the PostgreSQL table.
    fn check_overlap(&self, candidate: &Reservation) -> StoreResult<()> {
        if !candidate.status.is_active() {
            return Ok(());
        }
        let clash = self.reservations.values().any(|r| {
            r.id != candidate.id
                && r.room_id == candidate.room_id
                && r.status.is_active()
                && r.check_in < candidate.check_out
                && r.check_out > candidate.check_in
        });
        if clash {
            return Err(StoreError::OverlapViolation);
        }
        Ok(())
    }

    fn sorted_by_check_in(&self, keep: impl Fn(&Reservation) -> bool) -> Vec<Reservation> {
        let mut found: Vec<Reservation> = self
            .reservations
            .values()
            .filter(|r| keep(*r))
            .cloned()
            .collect();
        found.sort_by(|a, b| (a.check_in, a.created_at).cmp(&(b.check_in, b.created_at)));
        found
    }

    fn overlapping<'a>(
        &'a self,
        room_ids: &'a [Uuid],
        stay: &'a StayDates,
    ) -> impl Iterator<Item = &'a Reservation> + 'a {
        self.reservations
            .values()
            .filter(move |r| room_ids.contains(&r.room_id) && r.blocks(stay))
    }
}

/// In-process store. A unit of work owns the whole table lock for its
/// lifetime, so units are fully serialized.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReservationStore for MemoryStore {
    async fn begin(&self) -> StoreResult<Box<dyn UnitOfWork>> {
        let guard = Arc::clone(&self.tables).lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryUnitOfWork { guard, working }))
    }

    async fn room(&self, id: Uuid) -> StoreResult<Option<Room>> {
        Ok(self.tables.lock().await.rooms.get(&id).cloned())
    }

    async fn rooms(&self, filter: &RoomFilter) -> StoreResult<Vec<Room>> {
        let tables = self.tables.lock().await;
        let mut rooms: Vec<Room> = tables
            .rooms
            .values()
            .filter(|room| filter.matches(room))
            .cloned()
            .collect();
        rooms.sort_by(|a, b| a.room_number.cmp(&b.room_number));
        Ok(rooms)
    }

    async fn overlapping_reservations(
        &self,
        room_ids: &[Uuid],
        stay: &StayDates,
    ) -> StoreResult<Vec<Reservation>> {
        let tables = self.tables.lock().await;
        Ok(tables.overlapping(room_ids, stay).cloned().collect())
    }

    async fn reservation(&self, id: Uuid) -> StoreResult<Option<Reservation>> {
        Ok(self.tables.lock().await.reservations.get(&id).cloned())
    }

    async fn reservation_by_reference(&self, reference: &str) -> StoreResult<Option<Reservation>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .reservations
            .values()
            .find(|r| r.reference == reference)
            .cloned())
    }

    async fn reservations_for_guest(&self, guest_id: Uuid) -> StoreResult<Vec<Reservation>> {
        let tables = self.tables.lock().await;
        Ok(tables.sorted_by_check_in(|r| r.guest_id == guest_id))
    }

    async fn reservations_for_room(&self, room_id: Uuid) -> StoreResult<Vec<Reservation>> {
        let tables = self.tables.lock().await;
        Ok(tables.sorted_by_check_in(|r| r.room_id == room_id))
    }
}

pub struct MemoryUnitOfWork {
    guard: OwnedMutexGuard<Tables>,
    working: Tables,
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn room_for_update(&mut self, id: Uuid) -> StoreResult<Option<Room>> {
        Ok(self.working.rooms.get(&id).cloned())
    }

    async fn insert_room(&mut self, room: &Room) -> StoreResult<()> {
        self.working.check_room_number(room)?;
        self.working.rooms.insert(room.id, room.clone());
        Ok(())
    }

    async fn update_room(&mut self, room: &Room) -> StoreResult<()> {
        self.working.check_room_number(room)?;
        let existing = self
            .working
            .rooms
            .get_mut(&room.id)
            .ok_or_else(|| StoreError::Missing(format!("room {}", room.id)))?;
        let status = existing.status;
        *existing = Room {
            status,
            ..room.clone()
        };
        Ok(())
    }

    async fn delete_room(&mut self, id: Uuid) -> StoreResult<()> {
        self.working
            .rooms
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::Missing(format!("room {id}")))
    }

    async fn set_room_status(
        &mut self,
        id: Uuid,
        status: RoomStatus,
        at: DateTime<Utc>,
    ) -> StoreResult<()> {
        let room = self
            .working
            .rooms
            .get_mut(&id)
            .ok_or_else(|| StoreError::Missing(format!("room {id}")))?;
        room.status = status;
        room.updated_at = at;
        Ok(())
    }

    async fn active_reservations_overlapping(
        &mut self,
        room_id: Uuid,
        stay: &StayDates,
    ) -> StoreResult<Vec<Reservation>> {
        Ok(self
            .working
            .overlapping(&[room_id], stay)
            .cloned()
            .collect())
    }

    async fn count_active_reservations(&mut self, room_id: Uuid) -> StoreResult<i64> {
        let count = self
            .working
            .reservations
            .values()
            .filter(|r| r.room_id == room_id && r.status.is_active())
            .count();
        Ok(count as i64)
    }

    async fn insert_reservation(&mut self, reservation: &Reservation) -> StoreResult<()> {
        if self
            .working
            .reservations
            .values()
            .any(|r| r.reference == reservation.reference)
        {
            return Err(StoreError::UniqueViolation(
                RESERVATION_REFERENCE_CONSTRAINT.to_string(),
            ));
        }
        self.working.check_overlap(reservation)?;
        self.working
            .reservations
            .insert(reservation.id, reservation.clone());
        Ok(())
    }

    async fn reservation_for_update(&mut self, id: Uuid) -> StoreResult<Option<Reservation>> {
        Ok(self.working.reservations.get(&id).cloned())
    }

    async fn update_reservation(&mut self, reservation: &Reservation) -> StoreResult<()> {
        self.working.check_overlap(reservation)?;
        let existing = self
            .working
            .reservations
            .get_mut(&reservation.id)
            .ok_or_else(|| StoreError::Missing(format!("reservation {}", reservation.id)))?;
        existing.status = reservation.status;
        existing.payment_status = reservation.payment_status;
        existing.cancellation_reason = reservation.cancellation_reason.clone();
        existing.cancelled_at = reservation.cancelled_at;
        existing.updated_at = reservation.updated_at;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let MemoryUnitOfWork { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }
}
