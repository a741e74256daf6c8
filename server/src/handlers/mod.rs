use axum::response::Response;
use serde::Serialize;

use crate::utils::response::success;

pub mod actor;
pub mod availability;
pub mod reservations;
pub mod rooms;

#[derive(Serialize)]
struct HealthPayload {
    status: &'static str,
    service: &'static str,
}

pub async fn health_check() -> Response {
    let payload = HealthPayload {
        status: "ok",
        service: "hotel-reservations",
    };

    success(payload, "Health check successful")
}
