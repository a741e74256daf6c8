use axum::extract::{Path, State};
use axum::response::Response;
use axum::Json;
use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use uuid::Uuid;

use super::actor::{require_admin, MaybeActor};
use crate::error::ReservationError;
use crate::models::{Actor, BookingRequest, GuestIdentity, ReservationUpdate};
use crate::services::ReservationLedger;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::{created, success};

#[derive(Debug, Deserialize)]
pub struct ContactDetails {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateReservationBody {
    pub room_id: Uuid,
    /// Required unless the caller is an authenticated guest.
    pub guest: Option<ContactDetails>,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub guest_count: i32,
    pub special_requests: Option<String>,
    pub arrival_time: Option<NaiveTime>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CancelBody {
    pub reason: Option<String>,
}

fn guest_identity(actor: Option<Actor>, contact: Option<ContactDetails>) -> Result<GuestIdentity, AppError> {
    match (actor, contact) {
        (Some(Actor::Guest { guest_id }), _) => Ok(GuestIdentity::Authenticated { guest_id }),
        (_, Some(c)) => Ok(GuestIdentity::Contact {
            name: c.name,
            email: c.email,
            phone: c.phone,
        }),
        (_, None) => Err(AppError::ValidationError(
            "guest name and email are required for unauthenticated bookings".into(),
        )),
    }
}

pub async fn create_reservation(
    State(state): State<AppState>,
    MaybeActor(actor): MaybeActor,
    Json(body): Json<CreateReservationBody>,
) -> Result<Response, AppError> {
    let request = BookingRequest {
        room_id: body.room_id,
        guest: guest_identity(actor, body.guest)?,
        check_in: body.check_in,
        check_out: body.check_out,
        guest_count: body.guest_count,
        special_requests: body.special_requests,
        arrival_time: body.arrival_time,
    };
    let confirmation = state.engine.booking.create_reservation(request).await?;
    Ok(created(confirmation, "Reservation created"))
}

pub async fn get_reservation(
    State(state): State<AppState>,
    actor: Actor,
    Path(reservation_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let reservation = state.engine.ledger.get(reservation_id).await?;
    let reservation = ReservationLedger::visible_to(&actor, reservation)?;
    Ok(success(reservation, "Reservation retrieved"))
}

pub async fn get_by_reference(
    State(state): State<AppState>,
    actor: Actor,
    Path(reference): Path<String>,
) -> Result<Response, AppError> {
    let reservation = state.engine.ledger.find_by_reference(&reference).await?;
    let reservation = ReservationLedger::visible_to(&actor, reservation)?;
    Ok(success(reservation, "Reservation retrieved"))
}

pub async fn cancel_reservation(
    State(state): State<AppState>,
    actor: Actor,
    Path(reservation_id): Path<Uuid>,
    body: Option<Json<CancelBody>>,
) -> Result<Response, AppError> {
    let reason = body.and_then(|Json(b)| b.reason);
    let outcome = state
        .engine
        .lifecycle
        .cancel(reservation_id, &actor, reason)
        .await?;
    Ok(success(outcome, "Reservation cancelled"))
}

pub async fn update_reservation(
    State(state): State<AppState>,
    actor: Actor,
    Path(reservation_id): Path<Uuid>,
    Json(update): Json<ReservationUpdate>,
) -> Result<Response, AppError> {
    let reservation = state
        .engine
        .lifecycle
        .administer(&actor, reservation_id, update)
        .await?;
    Ok(success(reservation, "Reservation updated"))
}

pub async fn list_for_guest(
    State(state): State<AppState>,
    actor: Actor,
    Path(guest_id): Path<Uuid>,
) -> Result<Response, AppError> {
    if !actor.may_act_for(guest_id) {
        return Err(ReservationError::Forbidden(
            "guests may only list their own reservations".into(),
        )
        .into());
    }
    let reservations = state.engine.ledger.for_guest(guest_id).await?;
    Ok(success(reservations, "Reservations retrieved"))
}

pub async fn list_for_room(
    State(state): State<AppState>,
    actor: Actor,
    Path(room_id): Path<Uuid>,
) -> Result<Response, AppError> {
    require_admin(&actor)?;
    state.engine.inventory.get_room(room_id).await?;
    let reservations = state.engine.ledger.for_room(room_id).await?;
    Ok(success(reservations, "Reservations retrieved"))
}
