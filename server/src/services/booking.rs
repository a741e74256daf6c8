use std::sync::Arc;

use uuid::Uuid;

use super::availability::ensure_not_past;
use super::inventory::RoomInventory;
use super::policy::BookingPolicy;
use crate::collaborators::notify::{dispatch, Notice};
use crate::collaborators::{Clock, GuestDirectory, Notifier};
use crate::error::{ReservationError, Result};
use crate::models::{
    BookingConfirmation, BookingRequest, PaymentStatus, Reservation, ReservationStatus, Room,
    RoomStatus, StayDates,
};
use crate::store::{ReservationStore, StoreError, RESERVATION_REFERENCE_CONSTRAINT};

/// Fresh references tried before a reference collision is reported.
const REFERENCE_ATTEMPTS: usize = 5;

/// Short code a guest can read out over the phone.
pub fn generate_reference() -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("RSV-{}", id[..8].to_uppercase())
}

fn ensure_capacity(room: &Room, guest_count: i32) -> Result<()> {
    if guest_count > room.capacity {
        return Err(ReservationError::CapacityExceeded {
            guest_count,
            capacity: room.capacity,
        });
    }
    Ok(())
}

/// The only writer of new reservations. Creates the reservation and marks
/// the room in one unit of work.
#[derive(Clone)]
pub struct BookingOrchestrator {
    store: Arc<dyn ReservationStore>,
    guests: Arc<dyn GuestDirectory>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    policy: BookingPolicy,
}

impl BookingOrchestrator {
    pub fn new(
        store: Arc<dyn ReservationStore>,
        guests: Arc<dyn GuestDirectory>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        policy: BookingPolicy,
    ) -> Self {
        Self {
            store,
            guests,
            notifier,
            clock,
            policy,
        }
    }

    pub async fn create_reservation(&self, request: BookingRequest) -> Result<BookingConfirmation> {
        let stay = StayDates::new(request.check_in, request.check_out)?;
        ensure_not_past(&stay, self.clock.now())?;
        if request.guest_count < 1 {
            return Err(ReservationError::Validation(format!(
                "guest count must be at least 1, got {}",
                request.guest_count
            )));
        }

        let room = self
            .store
            .room(request.room_id)
            .await?
            .ok_or(ReservationError::RoomNotFound(request.room_id))?;
        ensure_capacity(&room, request.guest_count)?;

        let guest = self.guests.find_or_create(&request.guest).await?;

        let mut attempt = 1;
        let reservation = loop {
            let reference = generate_reference();
            match self.commit_booking(&request, &stay, guest.id, &reference).await {
                Err(ReservationError::Store(StoreError::UniqueViolation(constraint)))
                    if constraint == RESERVATION_REFERENCE_CONSTRAINT
                        && attempt < REFERENCE_ATTEMPTS =>
                {
                    tracing::warn!(reference = %reference, attempt, "Booking reference taken, retrying");
                    attempt += 1;
                }
                result => break result?,
            }
        };

        tracing::info!(
            reservation_id = %reservation.id,
            reference = %reservation.reference,
            room_id = %reservation.room_id,
            guest_id = %reservation.guest_id,
            check_in = %reservation.check_in,
            check_out = %reservation.check_out,
            total = %reservation.total_price,
            "Reservation created"
        );

        dispatch(
            Arc::clone(&self.notifier),
            Notice::Confirmation,
            reservation.clone(),
        );

        Ok(BookingConfirmation {
            booking_reference: reservation.reference.clone(),
            reservation,
        })
    }

    /// Conflict re-check, insert and room status change under the room lock.
    /// Any early return drops the unit of work, which rolls it back.
    async fn commit_booking(
        &self,
        request: &BookingRequest,
        stay: &StayDates,
        guest_id: Uuid,
        reference: &str,
    ) -> Result<Reservation> {
        let room_id = request.room_id;
        let no_longer_available = |err: StoreError| match err {
            StoreError::OverlapViolation => ReservationError::RoomNoLongerAvailable { room_id },
            other => other.into(),
        };

        let mut uow = self.store.begin().await?;
        let room = uow
            .room_for_update(room_id)
            .await?
            .ok_or(ReservationError::RoomNotFound(room_id))?;
        ensure_capacity(&room, request.guest_count)?;

        let conflicts = uow.active_reservations_overlapping(room_id, stay).await?;
        if let Some(existing) = conflicts.first() {
            tracing::warn!(
                room_id = %room_id,
                conflicting = %existing.reference,
                check_in = %stay.check_in(),
                check_out = %stay.check_out(),
                "Booking lost race for room"
            );
            return Err(ReservationError::RoomNoLongerAvailable { room_id });
        }

        let now = self.clock.now();
        let quote = self.policy.quote(room.price_per_night, stay)?;
        let nights = i32::try_from(quote.nights).map_err(|_| {
            ReservationError::Validation(format!("stay of {} nights is too long", quote.nights))
        })?;
        let reservation = Reservation {
            id: Uuid::new_v4(),
            reference: reference.to_string(),
            guest_id,
            room_id,
            room_number: room.room_number.clone(),
            check_in: stay.check_in(),
            check_out: stay.check_out(),
            guest_count: request.guest_count,
            nightly_rate: quote.nightly_rate,
            nights,
            subtotal: quote.pricing.subtotal,
            tax: quote.pricing.tax,
            total_price: quote.pricing.total,
            special_requests: request
                .special_requests
                .as_ref()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            arrival_time: request.arrival_time,
            status: ReservationStatus::Pending,
            payment_status: PaymentStatus::Unpaid,
            cancellation_reason: None,
            cancelled_at: None,
            created_at: now,
            updated_at: now,
        };

        uow.insert_reservation(&reservation)
            .await
            .map_err(no_longer_available)?;
        RoomInventory::update_status(uow.as_mut(), room_id, RoomStatus::Reserved, now).await?;
        uow.commit().await.map_err(no_longer_available)?;

        Ok(reservation)
    }
}
