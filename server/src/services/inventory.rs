use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::collaborators::Clock;
use crate::error::{ReservationError, Result};
use crate::models::{NewRoom, Room, RoomChanges, RoomFilter, RoomStatus};
use crate::store::{ReservationStore, StoreError, UnitOfWork, ROOM_NUMBER_CONSTRAINT};

/// Administrator-facing room catalogue.
#[derive(Clone)]
pub struct RoomInventory {
    store: Arc<dyn ReservationStore>,
    clock: Arc<dyn Clock>,
}

fn validate_room(room_number: &str, capacity: i32, price_per_night: Decimal) -> Result<()> {
    if room_number.trim().is_empty() {
        return Err(ReservationError::Validation("room number is required".into()));
    }
    if capacity < 1 {
        return Err(ReservationError::Validation(format!(
            "capacity must be at least 1, got {capacity}"
        )));
    }
    if price_per_night.is_sign_negative() {
        return Err(ReservationError::Validation(format!(
            "nightly rate cannot be negative, got {price_per_night}"
        )));
    }
    Ok(())
}

fn duplicate_number(room_number: &str) -> impl FnOnce(StoreError) -> ReservationError + '_ {
    move |err| match err {
        StoreError::UniqueViolation(constraint) if constraint == ROOM_NUMBER_CONSTRAINT => {
            ReservationError::DuplicateRoomNumber(room_number.to_string())
        }
        other => other.into(),
    }
}

impl RoomInventory {
    pub fn new(store: Arc<dyn ReservationStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub async fn create_room(&self, draft: NewRoom) -> Result<Room> {
        let room_number = draft.room_number.trim().to_string();
        validate_room(&room_number, draft.capacity, draft.price_per_night)?;

        let now = self.clock.now();
        let room = Room {
            id: Uuid::new_v4(),
            room_number,
            room_type: draft.room_type,
            capacity: draft.capacity,
            price_per_night: draft.price_per_night,
            amenities: draft.amenities,
            images: draft.images,
            status: RoomStatus::Available,
            created_at: now,
            updated_at: now,
        };

        let mut uow = self.store.begin().await?;
        uow.insert_room(&room)
            .await
            .map_err(duplicate_number(&room.room_number))?;
        uow.commit().await?;

        tracing::info!(room_id = %room.id, room_number = %room.room_number, "Room created");
        Ok(room)
    }

    pub async fn get_room(&self, room_id: Uuid) -> Result<Room> {
        self.store
            .room(room_id)
            .await?
            .ok_or(ReservationError::RoomNotFound(room_id))
    }

    pub async fn list_rooms(&self, filter: &RoomFilter) -> Result<Vec<Room>> {
        Ok(self.store.rooms(filter).await?)
    }

    pub async fn update_room(&self, room_id: Uuid, changes: RoomChanges) -> Result<Room> {
        let mut uow = self.store.begin().await?;
        let mut room = uow
            .room_for_update(room_id)
            .await?
            .ok_or(ReservationError::RoomNotFound(room_id))?;

        if let Some(number) = changes.room_number {
            room.room_number = number.trim().to_string();
        }
        if let Some(room_type) = changes.room_type {
            room.room_type = room_type;
        }
        if let Some(capacity) = changes.capacity {
            room.capacity = capacity;
        }
        if let Some(price) = changes.price_per_night {
            room.price_per_night = price;
        }
        if let Some(amenities) = changes.amenities {
            room.amenities = amenities;
        }
        if let Some(images) = changes.images {
            room.images = images;
        }
        validate_room(&room.room_number, room.capacity, room.price_per_night)?;
        room.updated_at = self.clock.now();

        uow.update_room(&room)
            .await
            .map_err(duplicate_number(&room.room_number))?;
        uow.commit().await?;

        tracing::info!(room_id = %room.id, "Room updated");
        Ok(room)
    }

    /// Refused while any pending, confirmed or checked-in reservation still
    /// references the room.
    pub async fn delete_room(&self, room_id: Uuid) -> Result<()> {
        let mut uow = self.store.begin().await?;
        uow.room_for_update(room_id)
            .await?
            .ok_or(ReservationError::RoomNotFound(room_id))?;

        let count = uow.count_active_reservations(room_id).await?;
        if count > 0 {
            return Err(ReservationError::RoomHasActiveReservations { room_id, count });
        }

        uow.delete_room(room_id).await?;
        uow.commit().await?;

        tracing::info!(room_id = %room_id, "Room deleted");
        Ok(())
    }

    /// Takes the room out of service, or puts it back as available.
    /// Refused while the room still holds an active reservation.
    pub async fn set_maintenance(&self, room_id: Uuid, enabled: bool) -> Result<Room> {
        let mut uow = self.store.begin().await?;
        let mut room = uow
            .room_for_update(room_id)
            .await?
            .ok_or(ReservationError::RoomNotFound(room_id))?;

        let status = if enabled {
            let count = uow.count_active_reservations(room_id).await?;
            if count > 0 {
                return Err(ReservationError::RoomHasActiveReservations { room_id, count });
            }
            RoomStatus::Maintenance
        } else if room.status == RoomStatus::Maintenance {
            RoomStatus::Available
        } else {
            return Ok(room);
        };

        let now = self.clock.now();
        Self::update_status(uow.as_mut(), room_id, status, now).await?;
        uow.commit().await?;

        room.status = status;
        room.updated_at = now;
        tracing::info!(room_id = %room_id, status = ?status, "Room maintenance toggled");
        Ok(room)
    }

    /// Plain assignment of the coarse status inside the caller's unit of
    /// work.
    pub(crate) async fn update_status(
        uow: &mut dyn UnitOfWork,
        room_id: Uuid,
        status: RoomStatus,
        at: DateTime<Utc>,
    ) -> Result<()> {
        uow.set_room_status(room_id, status, at).await?;
        tracing::debug!(room_id = %room_id, status = ?status, "Room status set");
        Ok(())
    }
}
