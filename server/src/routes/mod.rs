use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::config::{apply_security_headers, create_cors_layer, Config};
use crate::handlers::{availability, health_check, reservations, rooms};
use crate::state::AppState;

pub fn create_routes(state: AppState, config: &Config) -> Router {
    let api = Router::new()
        .route("/health", get(health_check))
        .route("/rooms", get(rooms::list_rooms).post(rooms::create_room))
        .route(
            "/rooms/:id",
            get(rooms::get_room)
                .put(rooms::update_room)
                .delete(rooms::delete_room),
        )
        .route("/rooms/:id/maintenance", put(rooms::set_maintenance))
        .route("/rooms/:id/reservations", get(reservations::list_for_room))
        .route("/guests/:id/reservations", get(reservations::list_for_guest))
        .route("/availability", get(availability::search))
        .route("/reservations", post(reservations::create_reservation))
        .route(
            "/reservations/:id",
            get(reservations::get_reservation).patch(reservations::update_reservation),
        )
        .route(
            "/reservations/:id/cancel",
            post(reservations::cancel_reservation),
        )
        .route(
            "/reservations/reference/:code",
            get(reservations::get_by_reference),
        )
        .with_state(state);

    apply_security_headers(api, config.production)
        .layer(create_cors_layer(&config.cors_allowed_origins))
        .layer(TraceLayer::new_for_http())
}
