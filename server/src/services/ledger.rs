use std::sync::Arc;

use uuid::Uuid;

use crate::error::{ReservationError, Result};
use crate::models::{Actor, Reservation};
use crate::store::ReservationStore;

/// Read access to reservations. Writes belong to the booking and lifecycle
/// flows.
#[derive(Clone)]
pub struct ReservationLedger {
    store: Arc<dyn ReservationStore>,
}

impl ReservationLedger {
    pub fn new(store: Arc<dyn ReservationStore>) -> Self {
        Self { store }
    }

    pub async fn get(&self, id: Uuid) -> Result<Reservation> {
        self.store
            .reservation(id)
            .await?
            .ok_or_else(|| ReservationError::ReservationNotFound(id.to_string()))
    }

    pub async fn find_by_reference(&self, reference: &str) -> Result<Reservation> {
        let reference = reference.trim().to_uppercase();
        let found = self.store.reservation_by_reference(&reference).await?;
        found.ok_or(ReservationError::ReservationNotFound(reference))
    }

    pub async fn for_guest(&self, guest_id: Uuid) -> Result<Vec<Reservation>> {
        Ok(self.store.reservations_for_guest(guest_id).await?)
    }

    pub async fn for_room(&self, room_id: Uuid) -> Result<Vec<Reservation>> {
        Ok(self.store.reservations_for_room(room_id).await?)
    }

    /// Hides other guests' reservations behind `Forbidden`.
    pub fn visible_to(actor: &Actor, reservation: Reservation) -> Result<Reservation> {
        if actor.may_act_for(reservation.guest_id) {
            Ok(reservation)
        } else {
            Err(ReservationError::Forbidden(
                "this reservation belongs to another guest".into(),
            ))
        }
    }
}
