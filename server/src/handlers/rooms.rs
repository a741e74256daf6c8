use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use super::actor::require_admin;
use crate::models::{Actor, NewRoom, RoomChanges, RoomFilter};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::{created, empty_success, success};

pub async fn list_rooms(
    State(state): State<AppState>,
    Query(filter): Query<RoomFilter>,
) -> Result<Response, AppError> {
    let rooms = state.engine.inventory.list_rooms(&filter).await?;
    Ok(success(rooms, "Rooms retrieved"))
}

pub async fn get_room(
    State(state): State<AppState>,
    Path(room_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let room = state.engine.inventory.get_room(room_id).await?;
    Ok(success(room, "Room retrieved"))
}

pub async fn create_room(
    State(state): State<AppState>,
    actor: Actor,
    Json(draft): Json<NewRoom>,
) -> Result<Response, AppError> {
    require_admin(&actor)?;
    let room = state.engine.inventory.create_room(draft).await?;
    Ok(created(room, "Room created"))
}

pub async fn update_room(
    State(state): State<AppState>,
    actor: Actor,
    Path(room_id): Path<Uuid>,
    Json(changes): Json<RoomChanges>,
) -> Result<Response, AppError> {
    require_admin(&actor)?;
    let room = state.engine.inventory.update_room(room_id, changes).await?;
    Ok(success(room, "Room updated"))
}

pub async fn delete_room(
    State(state): State<AppState>,
    actor: Actor,
    Path(room_id): Path<Uuid>,
) -> Result<Response, AppError> {
    require_admin(&actor)?;
    state.engine.inventory.delete_room(room_id).await?;
    Ok(empty_success("Room deleted"))
}

#[derive(Debug, Deserialize)]
pub struct MaintenanceBody {
    pub enabled: bool,
}

pub async fn set_maintenance(
    State(state): State<AppState>,
    actor: Actor,
    Path(room_id): Path<Uuid>,
    Json(body): Json<MaintenanceBody>,
) -> Result<Response, AppError> {
    require_admin(&actor)?;
    let room = state
        .engine
        .inventory
        .set_maintenance(room_id, body.enabled)
        .await?;
    Ok(success(room, "Room maintenance updated"))
}
