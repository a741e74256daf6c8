//! Engine fixtures for unit tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::ReservationEngine;
use crate::collaborators::{ManualClock, MemoryGuestDirectory, Notifier, NotifyError};
use crate::error::Result;
use crate::models::{
    Actor, BookingConfirmation, BookingRequest, GuestIdentity, NewRoom, Reservation, Room,
    RoomFilter, RoomStatus, RoomType, StayDates,
};
use crate::store::{
    MemoryStore, ReservationStore, StoreError, StoreResult, UnitOfWork,
    RESERVATION_REFERENCE_CONSTRAINT,
};

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 5, 20, 12, 0, 0).unwrap()
}

pub fn new_room(number: &str, capacity: i32, rate: i64) -> NewRoom {
    NewRoom {
        room_number: number.to_string(),
        room_type: RoomType::Double,
        capacity,
        price_per_night: Decimal::from(rate),
        amenities: vec!["wifi".into()],
        images: Vec::new(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailAt {
    InsertReservation,
    SetRoomStatus,
    Commit,
    /// Reports the booking reference as taken on the next insert only.
    ReferenceTaken,
}

/// Wraps the memory store and fails one unit-of-work step once armed.
struct FaultyStore {
    inner: MemoryStore,
    fail_at: FailAt,
    armed: Arc<AtomicBool>,
}

struct FaultyUnit {
    inner: Box<dyn UnitOfWork>,
    fail_at: FailAt,
    armed: Arc<AtomicBool>,
}

impl FaultyUnit {
    fn trip(&self, step: FailAt) -> StoreResult<()> {
        if self.fail_at == step && self.armed.load(Ordering::SeqCst) {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait]
impl ReservationStore for FaultyStore {
    async fn begin(&self) -> StoreResult<Box<dyn UnitOfWork>> {
        Ok(Box::new(FaultyUnit {
            inner: self.inner.begin().await?,
            fail_at: self.fail_at,
            armed: Arc::clone(&self.armed),
        }))
    }

    async fn room(&self, id: Uuid) -> StoreResult<Option<Room>> {
        self.inner.room(id).await
    }

    async fn rooms(&self, filter: &RoomFilter) -> StoreResult<Vec<Room>> {
        self.inner.rooms(filter).await
    }

    async fn overlapping_reservations(
        &self,
        room_ids: &[Uuid],
        stay: &StayDates,
    ) -> StoreResult<Vec<Reservation>> {
        self.inner.overlapping_reservations(room_ids, stay).await
    }

    async fn reservation(&self, id: Uuid) -> StoreResult<Option<Reservation>> {
        self.inner.reservation(id).await
    }

    async fn reservation_by_reference(&self, reference: &str) -> StoreResult<Option<Reservation>> {
        self.inner.reservation_by_reference(reference).await
    }

    async fn reservations_for_guest(&self, guest_id: Uuid) -> StoreResult<Vec<Reservation>> {
        self.inner.reservations_for_guest(guest_id).await
    }

    async fn reservations_for_room(&self, room_id: Uuid) -> StoreResult<Vec<Reservation>> {
        self.inner.reservations_for_room(room_id).await
    }
}

#[async_trait]
impl UnitOfWork for FaultyUnit {
    async fn room_for_update(&mut self, id: Uuid) -> StoreResult<Option<Room>> {
        self.inner.room_for_update(id).await
    }

    async fn insert_room(&mut self, room: &Room) -> StoreResult<()> {
        self.inner.insert_room(room).await
    }

    async fn update_room(&mut self, room: &Room) -> StoreResult<()> {
        self.inner.update_room(room).await
    }

    async fn delete_room(&mut self, id: Uuid) -> StoreResult<()> {
        self.inner.delete_room(id).await
    }

    async fn set_room_status(
        &mut self,
        id: Uuid,
        status: RoomStatus,
        at: DateTime<Utc>,
    ) -> StoreResult<()> {
        self.trip(FailAt::SetRoomStatus)?;
        self.inner.set_room_status(id, status, at).await
    }

    async fn active_reservations_overlapping(
        &mut self,
        room_id: Uuid,
        stay: &StayDates,
    ) -> StoreResult<Vec<Reservation>> {
        self.inner.active_reservations_overlapping(room_id, stay).await
    }

    async fn count_active_reservations(&mut self, room_id: Uuid) -> StoreResult<i64> {
        self.inner.count_active_reservations(room_id).await
    }

    async fn insert_reservation(&mut self, reservation: &Reservation) -> StoreResult<()> {
        self.trip(FailAt::InsertReservation)?;
        if self.fail_at == FailAt::ReferenceTaken && self.armed.swap(false, Ordering::SeqCst) {
            return Err(StoreError::UniqueViolation(
                RESERVATION_REFERENCE_CONSTRAINT.to_string(),
            ));
        }
        self.inner.insert_reservation(reservation).await
    }

    async fn reservation_for_update(&mut self, id: Uuid) -> StoreResult<Option<Reservation>> {
        self.inner.reservation_for_update(id).await
    }

    async fn update_reservation(&mut self, reservation: &Reservation) -> StoreResult<()> {
        self.inner.update_reservation(reservation).await
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.trip(FailAt::Commit)?;
        self.inner.commit().await
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Confirmation(String),
    Cancellation(String),
}

/// Records every notification attempt by booking reference, optionally
/// failing each one after recording it.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Sent>>,
    fail: bool,
}

impl RecordingNotifier {
    fn record(&self, sent: Sent) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(sent);
        if self.fail {
            return Err(NotifyError("smtp unreachable".into()));
        }
        Ok(())
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_booking_confirmation(&self, reservation: &Reservation) -> Result<(), NotifyError> {
        self.record(Sent::Confirmation(reservation.reference.clone()))
    }

    async fn send_booking_cancellation(&self, reservation: &Reservation) -> Result<(), NotifyError> {
        self.record(Sent::Cancellation(reservation.reference.clone()))
    }
}

pub struct Harness {
    pub engine: ReservationEngine,
    pub guests: MemoryGuestDirectory,
    pub clock: Arc<ManualClock>,
    pub notifier: Arc<RecordingNotifier>,
    armed: Arc<AtomicBool>,
}

impl Harness {
    fn build(store: Arc<dyn ReservationStore>, notifier: Arc<RecordingNotifier>, armed: Arc<AtomicBool>) -> Self {
        let guests = MemoryGuestDirectory::new();
        let clock = Arc::new(ManualClock::new(start_time()));
        let engine = ReservationEngine::new(
            store,
            Arc::new(guests.clone()),
            notifier.clone(),
            clock.clone(),
        );
        Self {
            engine,
            guests,
            clock,
            notifier,
            armed,
        }
    }

    pub fn new() -> Self {
        Self::build(
            Arc::new(MemoryStore::new()),
            Arc::new(RecordingNotifier::default()),
            Arc::new(AtomicBool::new(false)),
        )
    }

    pub fn with_failing_notifier() -> Self {
        Self::build(
            Arc::new(MemoryStore::new()),
            Arc::new(RecordingNotifier {
                sent: Mutex::default(),
                fail: true,
            }),
            Arc::new(AtomicBool::new(false)),
        )
    }

    pub fn with_fault(fail_at: FailAt) -> Self {
        let armed = Arc::new(AtomicBool::new(false));
        let store = FaultyStore {
            inner: MemoryStore::new(),
            fail_at,
            armed: Arc::clone(&armed),
        };
        Self::build(Arc::new(store), Arc::new(RecordingNotifier::default()), armed)
    }

    pub fn arm_fault(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }

    pub fn request(
        &self,
        room_id: Uuid,
        check_in: NaiveDate,
        check_out: NaiveDate,
        guest_count: i32,
    ) -> BookingRequest {
        BookingRequest {
            room_id,
            guest: GuestIdentity::Contact {
                name: "Ada Guest".into(),
                email: "ada@example.com".into(),
                phone: None,
            },
            check_in,
            check_out,
            guest_count,
            special_requests: None,
            arrival_time: None,
        }
    }

    pub async fn book(
        &self,
        room_id: Uuid,
        check_in: &str,
        check_out: &str,
        guest_count: i32,
    ) -> Result<BookingConfirmation> {
        self.engine
            .booking
            .create_reservation(self.request(room_id, date(check_in), date(check_out), guest_count))
            .await
    }

    pub fn owner_of(&self, booked: &BookingConfirmation) -> Actor {
        Actor::Guest {
            guest_id: booked.reservation.guest_id,
        }
    }

    /// Notifications go out on spawned tasks; give them a chance to run.
    pub async fn settled_notices(&self) -> Vec<Sent> {
        for _ in 0..16 {
            tokio::task::yield_now().await;
        }
        self.notifier.sent()
    }

    pub async fn all_reservations(&self, room_id: Uuid) -> Vec<Reservation> {
        self.engine.ledger.for_room(room_id).await.unwrap()
    }
}
