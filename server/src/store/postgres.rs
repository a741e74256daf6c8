use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::{ReservationStore, StoreError, StoreResult, UnitOfWork};
use crate::models::{Reservation, Room, RoomFilter, RoomStatus, StayDates};

const ROOM_COLUMNS: &str = "id, room_number, room_type, capacity, price_per_night, amenities, \
     images, status, created_at, updated_at";

const RESERVATION_COLUMNS: &str = "id, reference, guest_id, room_id, room_number, check_in, \
     check_out, guest_count, nightly_rate, nights, subtotal, tax, total_price, special_requests, \
     arrival_time, status, payment_status, cancellation_reason, cancelled_at, created_at, updated_at";

const ACTIVE_STATUSES: &str = "('pending', 'confirmed', 'checked_in')";

/// SQLSTATE codes the engine turns into domain outcomes.
const UNIQUE_VIOLATION: &str = "23505";
const EXCLUSION_VIOLATION: &str = "23P01";

fn classify(err: sqlx::Error) -> StoreError {
    if let Some(db_err) = err.as_database_error() {
        match db_err.code().as_deref() {
            Some(UNIQUE_VIOLATION) => {
                return StoreError::UniqueViolation(
                    db_err.constraint().unwrap_or_default().to_string(),
                )
            }
            Some(EXCLUSION_VIOLATION) => return StoreError::OverlapViolation,
            _ => {}
        }
    }
    StoreError::Database(err)
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReservationStore for PgStore {
    async fn begin(&self) -> StoreResult<Box<dyn UnitOfWork>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgUnitOfWork { tx }))
    }

    async fn room(&self, id: Uuid) -> StoreResult<Option<Room>> {
        let sql = format!("SELECT {ROOM_COLUMNS} FROM rooms WHERE id = $1");
        Ok(sqlx::query_as::<_, Room>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn rooms(&self, filter: &RoomFilter) -> StoreResult<Vec<Room>> {
        let sql = format!(
            "SELECT {ROOM_COLUMNS} FROM rooms \
             WHERE ($1::room_type IS NULL OR room_type = $1) \
             AND ($2::int IS NULL OR capacity >= $2) \
             ORDER BY room_number"
        );
        Ok(sqlx::query_as::<_, Room>(&sql)
            .bind(filter.room_type)
            .bind(filter.min_capacity)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn overlapping_reservations(
        &self,
        room_ids: &[Uuid],
        stay: &StayDates,
    ) -> StoreResult<Vec<Reservation>> {
        let sql = format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations \
             WHERE room_id = ANY($1) AND status IN {ACTIVE_STATUSES} \
             AND check_in < $3 AND check_out > $2"
        );
        Ok(sqlx::query_as::<_, Reservation>(&sql)
            .bind(room_ids)
            .bind(stay.check_in())
            .bind(stay.check_out())
            .fetch_all(&self.pool)
            .await?)
    }

    async fn reservation(&self, id: Uuid) -> StoreResult<Option<Reservation>> {
        let sql = format!("SELECT {RESERVATION_COLUMNS} FROM reservations WHERE id = $1");
        Ok(sqlx::query_as::<_, Reservation>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn reservation_by_reference(&self, reference: &str) -> StoreResult<Option<Reservation>> {
        let sql = format!("SELECT {RESERVATION_COLUMNS} FROM reservations WHERE reference = $1");
        Ok(sqlx::query_as::<_, Reservation>(&sql)
            .bind(reference)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn reservations_for_guest(&self, guest_id: Uuid) -> StoreResult<Vec<Reservation>> {
        let sql = format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations WHERE guest_id = $1 \
             ORDER BY check_in, created_at"
        );
        Ok(sqlx::query_as::<_, Reservation>(&sql)
            .bind(guest_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn reservations_for_room(&self, room_id: Uuid) -> StoreResult<Vec<Reservation>> {
        let sql = format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations WHERE room_id = $1 \
             ORDER BY check_in, created_at"
        );
        Ok(sqlx::query_as::<_, Reservation>(&sql)
            .bind(room_id)
            .fetch_all(&self.pool)
            .await?)
    }
}

pub struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn room_for_update(&mut self, id: Uuid) -> StoreResult<Option<Room>> {
        let sql = format!("SELECT {ROOM_COLUMNS} FROM rooms WHERE id = $1 FOR UPDATE");
        Ok(sqlx::query_as::<_, Room>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?)
    }

    async fn insert_room(&mut self, room: &Room) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO rooms (id, room_number, room_type, capacity, price_per_night, amenities,
                               images, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(room.id)
        .bind(&room.room_number)
        .bind(room.room_type)
        .bind(room.capacity)
        .bind(room.price_per_night)
        .bind(&room.amenities)
        .bind(&room.images)
        .bind(room.status)
        .bind(room.created_at)
        .bind(room.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(classify)?;
        Ok(())
    }

    async fn update_room(&mut self, room: &Room) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE rooms
            SET room_number = $2, room_type = $3, capacity = $4, price_per_night = $5,
                amenities = $6, images = $7, updated_at = $8
            WHERE id = $1
            "#,
        )
        .bind(room.id)
        .bind(&room.room_number)
        .bind(room.room_type)
        .bind(room.capacity)
        .bind(room.price_per_night)
        .bind(&room.amenities)
        .bind(&room.images)
        .bind(room.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(classify)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Missing(format!("room {}", room.id)));
        }
        Ok(())
    }

    async fn delete_room(&mut self, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM rooms WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Missing(format!("room {id}")));
        }
        Ok(())
    }

    async fn set_room_status(
        &mut self,
        id: Uuid,
        status: RoomStatus,
        at: DateTime<Utc>,
    ) -> StoreResult<()> {
        let result = sqlx::query("UPDATE rooms SET status = $2, updated_at = $3 WHERE id = $1")
            .bind(id)
            .bind(status)
            .bind(at)
            .execute(&mut *self.tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Missing(format!("room {id}")));
        }
        Ok(())
    }

    async fn active_reservations_overlapping(
        &mut self,
        room_id: Uuid,
        stay: &StayDates,
    ) -> StoreResult<Vec<Reservation>> {
        let sql = format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations \
             WHERE room_id = $1 AND status IN {ACTIVE_STATUSES} \
             AND check_in < $3 AND check_out > $2"
        );
        Ok(sqlx::query_as::<_, Reservation>(&sql)
            .bind(room_id)
            .bind(stay.check_in())
            .bind(stay.check_out())
            .fetch_all(&mut *self.tx)
            .await?)
    }

    async fn count_active_reservations(&mut self, room_id: Uuid) -> StoreResult<i64> {
        let sql = format!(
            "SELECT COUNT(*) FROM reservations WHERE room_id = $1 AND status IN {ACTIVE_STATUSES}"
        );
        Ok(sqlx::query_scalar::<_, i64>(&sql)
            .bind(room_id)
            .fetch_one(&mut *self.tx)
            .await?)
    }

    async fn insert_reservation(&mut self, reservation: &Reservation) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO reservations (id, reference, guest_id, room_id, room_number, check_in,
                                      check_out, guest_count, nightly_rate, nights, subtotal, tax,
                                      total_price, special_requests, arrival_time, status,
                                      payment_status, cancellation_reason, cancelled_at,
                                      created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17,
                    $18, $19, $20, $21)
            "#,
        )
        .bind(reservation.id)
        .bind(&reservation.reference)
        .bind(reservation.guest_id)
        .bind(reservation.room_id)
        .bind(&reservation.room_number)
        .bind(reservation.check_in)
        .bind(reservation.check_out)
        .bind(reservation.guest_count)
        .bind(reservation.nightly_rate)
        .bind(reservation.nights)
        .bind(reservation.subtotal)
        .bind(reservation.tax)
        .bind(reservation.total_price)
        .bind(&reservation.special_requests)
        .bind(reservation.arrival_time)
        .bind(reservation.status)
        .bind(reservation.payment_status)
        .bind(&reservation.cancellation_reason)
        .bind(reservation.cancelled_at)
        .bind(reservation.created_at)
        .bind(reservation.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(classify)?;
        Ok(())
    }

    async fn reservation_for_update(&mut self, id: Uuid) -> StoreResult<Option<Reservation>> {
        let sql = format!("SELECT {RESERVATION_COLUMNS} FROM reservations WHERE id = $1 FOR UPDATE");
        Ok(sqlx::query_as::<_, Reservation>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?)
    }

    async fn update_reservation(&mut self, reservation: &Reservation) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE reservations
            SET status = $2, payment_status = $3, cancellation_reason = $4, cancelled_at = $5,
                updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(reservation.id)
        .bind(reservation.status)
        .bind(reservation.payment_status)
        .bind(&reservation.cancellation_reason)
        .bind(reservation.cancelled_at)
        .bind(reservation.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(classify)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Missing(format!("reservation {}", reservation.id)));
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
