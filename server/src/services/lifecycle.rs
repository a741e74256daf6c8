use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::inventory::RoomInventory;
use super::policy::BookingPolicy;
use crate::collaborators::notify::{dispatch, Notice};
use crate::collaborators::{Clock, Notifier};
use crate::error::{ReservationError, Result};
use crate::models::{
    Actor, CancellationOutcome, PaymentStatus, Reservation, ReservationStatus, ReservationUpdate,
    RoomStatus,
};
use crate::store::{ReservationStore, UnitOfWork};

/// Moves `reservation` to `to`. Returns whether anything changed.
/// Re-asserting a non-terminal status is a no-op.
fn transition(reservation: &mut Reservation, to: ReservationStatus, now: DateTime<Utc>) -> Result<bool> {
    let from = reservation.status;
    if from == to && !from.is_terminal() {
        return Ok(false);
    }
    if !from.can_transition_to(to) {
        return Err(ReservationError::InvalidStateTransition { from, to });
    }
    reservation.status = to;
    if to == ReservationStatus::Cancelled {
        reservation.cancelled_at = Some(now);
    }
    Ok(true)
}

/// Every state change after creation.
#[derive(Clone)]
pub struct LifecycleManager {
    store: Arc<dyn ReservationStore>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    policy: BookingPolicy,
}

impl LifecycleManager {
    pub fn new(
        store: Arc<dyn ReservationStore>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        policy: BookingPolicy,
    ) -> Self {
        Self {
            store,
            notifier,
            clock,
            policy,
        }
    }

    /// Opens a unit of work holding the room lock and then the reservation
    /// lock, the same order the booking flow takes them in.
    async fn lock(&self, reservation_id: Uuid) -> Result<(Box<dyn UnitOfWork>, Reservation)> {
        let room_id = self
            .store
            .reservation(reservation_id)
            .await?
            .ok_or_else(|| ReservationError::ReservationNotFound(reservation_id.to_string()))?
            .room_id;

        let mut uow = self.store.begin().await?;
        uow.room_for_update(room_id).await?;
        let reservation = uow
            .reservation_for_update(reservation_id)
            .await?
            .ok_or_else(|| ReservationError::ReservationNotFound(reservation_id.to_string()))?;
        Ok((uow, reservation))
    }

    /// Guest self-service cancellation, allowed within the policy window
    /// after the booking was made. The full price is refunded.
    pub async fn cancel(
        &self,
        reservation_id: Uuid,
        actor: &Actor,
        reason: Option<String>,
    ) -> Result<CancellationOutcome> {
        let (mut uow, mut reservation) = self.lock(reservation_id).await?;

        if !actor.may_act_for(reservation.guest_id) {
            return Err(ReservationError::Forbidden(
                "only the booking guest or an administrator may cancel this reservation".into(),
            ));
        }
        if !reservation.status.is_cancellable() {
            return Err(ReservationError::InvalidStateTransition {
                from: reservation.status,
                to: ReservationStatus::Cancelled,
            });
        }

        let now = self.clock.now();
        if now - reservation.created_at > self.policy.self_service_cancellation {
            tracing::warn!(
                reservation_id = %reservation.id,
                booked_at = %reservation.created_at,
                "Self-service cancellation window expired"
            );
            return Err(ReservationError::CancellationWindowExpired {
                booked_at: reservation.created_at,
            });
        }

        transition(&mut reservation, ReservationStatus::Cancelled, now)?;
        reservation.cancellation_reason = reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());
        if reservation.payment_status == PaymentStatus::Paid {
            reservation.payment_status = PaymentStatus::Refunded;
        }
        reservation.updated_at = now;

        uow.update_reservation(&reservation).await?;
        RoomInventory::update_status(uow.as_mut(), reservation.room_id, RoomStatus::Available, now)
            .await?;
        uow.commit().await?;

        tracing::info!(
            reservation_id = %reservation.id,
            reference = %reservation.reference,
            room_id = %reservation.room_id,
            refund = %reservation.total_price,
            "Reservation cancelled"
        );
        dispatch(
            Arc::clone(&self.notifier),
            Notice::Cancellation,
            reservation.clone(),
        );

        Ok(CancellationOutcome {
            refund_amount: reservation.total_price,
            reservation,
        })
    }

    pub async fn update_status(&self, reservation_id: Uuid, status: ReservationStatus) -> Result<Reservation> {
        self.apply(
            reservation_id,
            ReservationUpdate {
                status: Some(status),
                payment_status: None,
            },
        )
        .await
    }

    pub async fn update_payment_status(
        &self,
        reservation_id: Uuid,
        payment_status: PaymentStatus,
    ) -> Result<Reservation> {
        self.apply(
            reservation_id,
            ReservationUpdate {
                status: None,
                payment_status: Some(payment_status),
            },
        )
        .await
    }

    /// Administrative update as requested by `actor`.
    pub async fn administer(
        &self,
        actor: &Actor,
        reservation_id: Uuid,
        update: ReservationUpdate,
    ) -> Result<Reservation> {
        if !actor.is_admin() {
            return Err(ReservationError::Forbidden(
                "reservation status changes are restricted to administrators".into(),
            ));
        }
        if update.status.is_none() && update.payment_status.is_none() {
            return Err(ReservationError::Validation(
                "nothing to update: give a status or a payment status".into(),
            ));
        }
        self.apply(reservation_id, update).await
    }

    /// Status changes follow the lifecycle edges and ignore the
    /// self-service window. Payment status may always be set.
    pub async fn apply(&self, reservation_id: Uuid, update: ReservationUpdate) -> Result<Reservation> {
        let (mut uow, mut reservation) = self.lock(reservation_id).await?;
        let now = self.clock.now();
        let previous = reservation.status;

        let status_changed = match update.status {
            Some(to) => transition(&mut reservation, to, now)?,
            None => false,
        };
        if let Some(payment_status) = update.payment_status {
            reservation.payment_status = payment_status;
        }
        reservation.updated_at = now;

        uow.update_reservation(&reservation).await?;
        if status_changed {
            RoomInventory::update_status(
                uow.as_mut(),
                reservation.room_id,
                reservation.status.implied_room_status(),
                now,
            )
            .await?;
        }
        uow.commit().await?;

        tracing::info!(
            reservation_id = %reservation.id,
            from = %previous,
            status = %reservation.status,
            payment_status = ?reservation.payment_status,
            "Reservation updated"
        );
        if status_changed && reservation.status == ReservationStatus::Cancelled {
            dispatch(
                Arc::clone(&self.notifier),
                Notice::Cancellation,
                reservation.clone(),
            );
        }
        Ok(reservation)
    }
}
