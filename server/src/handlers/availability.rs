use axum::extract::{Query, State};
use axum::response::Response;

use crate::services::AvailabilityQuery;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::success;

pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Response, AppError> {
    let rooms = state.engine.availability.find_available_rooms(&query).await?;
    let message = format!("{} room(s) available", rooms.len());
    Ok(success(rooms, message))
}
