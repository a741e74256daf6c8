use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::{Duration, TimeZone, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;

use hotel_server::collaborators::{LogNotifier, ManualClock, MemoryGuestDirectory};
use hotel_server::config::Config;
use hotel_server::routes::create_routes;
use hotel_server::services::ReservationEngine;
use hotel_server::state::AppState;
use hotel_server::store::MemoryStore;

struct TestApp {
    router: Router,
    clock: Arc<ManualClock>,
}

fn test_config() -> Config {
    Config {
        database_url: String::new(),
        max_connections: 1,
        port: 0,
        cors_allowed_origins: "http://localhost:5173".into(),
        production: false,
    }
}

fn spawn_app() -> TestApp {
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2025, 5, 20, 9, 0, 0).unwrap(),
    ));
    let engine = ReservationEngine::new(
        Arc::new(MemoryStore::new()),
        Arc::new(MemoryGuestDirectory::new()),
        Arc::new(LogNotifier),
        clock.clone(),
    );
    TestApp {
        router: create_routes(AppState::new(engine), &test_config()),
        clock,
    }
}

enum As<'a> {
    Anonymous,
    Admin,
    Guest(&'a str),
}

impl TestApp {
    async fn call(&self, method: Method, uri: &str, who: As<'_>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        match who {
            As::Anonymous => {}
            As::Admin => builder = builder.header("x-actor-role", "admin"),
            As::Guest(id) => {
                builder = builder
                    .header("x-actor-role", "guest")
                    .header("x-actor-id", id)
            }
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn create_room(&self, number: &str, capacity: i32, rate: &str) -> String {
        let (status, body) = self
            .call(
                Method::POST,
                "/rooms",
                As::Admin,
                Some(json!({
                    "room_number": number,
                    "room_type": "double",
                    "capacity": capacity,
                    "price_per_night": rate,
                    "amenities": ["wifi", "minibar"]
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["data"]["id"].as_str().unwrap().to_string()
    }

    async fn book(&self, room_id: &str, check_in: &str, check_out: &str, guests: i32) -> (StatusCode, Value) {
        self.call(
            Method::POST,
            "/reservations",
            As::Anonymous,
            Some(json!({
                "room_id": room_id,
                "guest": {"name": "Ada Guest", "email": "ada@example.com", "phone": null},
                "check_in": check_in,
                "check_out": check_out,
                "guest_count": guests
            })),
        )
        .await
    }
}

fn decimal(value: &Value) -> f64 {
    value.as_str().unwrap().parse().unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let app = spawn_app();
    let (status, body) = app.call(Method::GET, "/health", As::Anonymous, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "ok");
}

#[tokio::test]
async fn test_booking_walkthrough() {
    let app = spawn_app();
    let room_id = app.create_room("101", 2, "100").await;

    // Scenario 1: two nights at 100.
    let (status, body) = app.book(&room_id, "2025-06-01", "2025-06-03", 2).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let reservation = &body["data"]["reservation"];
    assert_eq!(reservation["nights"], 2);
    assert_eq!(decimal(&reservation["subtotal"]), 200.0);
    assert_eq!(decimal(&reservation["tax"]), 20.0);
    assert_eq!(decimal(&reservation["total_price"]), 220.0);
    assert_eq!(reservation["status"], "pending");
    assert_eq!(reservation["payment_status"], "unpaid");
    let reference = body["data"]["booking_reference"].as_str().unwrap().to_string();
    let reservation_id = reservation["id"].as_str().unwrap().to_string();
    let guest_id = reservation["guest_id"].as_str().unwrap().to_string();

    let (_, room) = app
        .call(Method::GET, &format!("/rooms/{room_id}"), As::Anonymous, None)
        .await;
    assert_eq!(room["data"]["status"], "reserved");

    // Scenario 2: overlapping stay.
    let (status, body) = app.book(&room_id, "2025-06-02", "2025-06-04", 2).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "ROOM_NO_LONGER_AVAILABLE");

    // Scenario 3: back-to-back stay.
    let (status, _) = app.book(&room_id, "2025-06-03", "2025-06-05", 2).await;
    assert_eq!(status, StatusCode::CREATED);

    // Scenario 6: too many guests.
    let (status, body) = app.book(&room_id, "2025-07-01", "2025-07-03", 3).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "CAPACITY_EXCEEDED");

    let (status, body) = app
        .call(
            Method::GET,
            &format!("/reservations/reference/{reference}"),
            As::Guest(&guest_id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], reservation_id.as_str());

    // Scenario 4: cancel ten minutes later.
    app.clock.advance(Duration::minutes(10));
    let (status, body) = app
        .call(
            Method::POST,
            &format!("/reservations/{reservation_id}/cancel"),
            As::Guest(&guest_id),
            Some(json!({"reason": "flight cancelled"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(decimal(&body["data"]["refund_amount"]), 220.0);
    assert_eq!(body["data"]["reservation"]["status"], "cancelled");

    let (_, room) = app
        .call(Method::GET, &format!("/rooms/{room_id}"), As::Anonymous, None)
        .await;
    assert_eq!(room["data"]["status"], "available");
}

#[tokio::test]
async fn test_cancel_after_window_and_by_stranger() {
    let app = spawn_app();
    let room_id = app.create_room("101", 2, "100").await;
    let (_, body) = app.book(&room_id, "2025-06-01", "2025-06-03", 2).await;
    let reservation_id = body["data"]["reservation"]["id"].as_str().unwrap().to_string();
    let guest_id = body["data"]["reservation"]["guest_id"].as_str().unwrap().to_string();
    let uri = format!("/reservations/{reservation_id}/cancel");

    let stranger = uuid::Uuid::new_v4().to_string();
    let (status, body) = app.call(Method::POST, &uri, As::Guest(&stranger), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "FORBIDDEN");

    let (status, _) = app.call(Method::POST, &uri, As::Anonymous, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    app.clock.advance(Duration::hours(25));
    let (status, body) = app.call(Method::POST, &uri, As::Guest(&guest_id), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CANCELLATION_WINDOW_EXPIRED");
}

#[tokio::test]
async fn test_availability_endpoint() {
    let app = spawn_app();
    let booked = app.create_room("101", 2, "100").await;
    app.create_room("102", 4, "150.50").await;
    app.book(&booked, "2025-06-01", "2025-06-03", 2).await;

    let (status, body) = app
        .call(
            Method::GET,
            "/availability?check_in=2025-06-02&check_out=2025-06-04",
            As::Anonymous,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let rooms = body["data"].as_array().unwrap();
    assert_eq!(rooms.len(), 1);
    assert_eq!(rooms[0]["room"]["room_number"], "102");
    assert_eq!(rooms[0]["nights"], 2);
    assert_eq!(decimal(&rooms[0]["pricing"]["subtotal"]), 301.0);
    assert_eq!(decimal(&rooms[0]["pricing"]["tax"]), 30.1);
    assert_eq!(decimal(&rooms[0]["pricing"]["total"]), 331.1);

    let (status, body) = app
        .call(
            Method::GET,
            "/availability?check_in=2025-06-02&check_out=2025-06-04&min_capacity=5",
            As::Anonymous,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].as_array().unwrap().is_empty());

    let (status, body) = app
        .call(
            Method::GET,
            "/availability?check_in=2025-05-01&check_out=2025-05-02",
            As::Anonymous,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "CHECK_IN_IN_PAST");
}

#[tokio::test]
async fn test_admin_updates_and_terminal_states() {
    let app = spawn_app();
    let room_id = app.create_room("101", 2, "100").await;
    let (_, body) = app.book(&room_id, "2025-06-01", "2025-06-03", 1).await;
    let reservation_id = body["data"]["reservation"]["id"].as_str().unwrap().to_string();
    let guest_id = body["data"]["reservation"]["guest_id"].as_str().unwrap().to_string();
    let uri = format!("/reservations/{reservation_id}");

    let (status, _) = app
        .call(Method::PATCH, &uri, As::Guest(&guest_id), Some(json!({"status": "confirmed"})))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    for status_name in ["confirmed", "checked_in", "checked_out"] {
        let (status, body) = app
            .call(Method::PATCH, &uri, As::Admin, Some(json!({"status": status_name})))
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["data"]["status"], status_name);
    }

    let (status, body) = app
        .call(Method::PATCH, &uri, As::Admin, Some(json!({"status": "confirmed"})))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "INVALID_STATE_TRANSITION");

    let (status, body) = app
        .call(Method::PATCH, &uri, As::Admin, Some(json!({"payment_status": "paid"})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["payment_status"], "paid");
}

#[tokio::test]
async fn test_room_administration() {
    let app = spawn_app();
    let (status, _) = app
        .call(
            Method::POST,
            "/rooms",
            As::Anonymous,
            Some(json!({"room_number": "101", "room_type": "single", "capacity": 1, "price_per_night": "80"})),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let room_id = app.create_room("101", 2, "100").await;
    let (status, body) = app
        .call(
            Method::POST,
            "/rooms",
            As::Admin,
            Some(json!({"room_number": "101", "room_type": "suite", "capacity": 4, "price_per_night": "300"})),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "DUPLICATE_ROOM_NUMBER");

    let (status, body) = app
        .call(
            Method::PUT,
            &format!("/rooms/{room_id}"),
            As::Admin,
            Some(json!({"capacity": 3})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["capacity"], 3);

    app.book(&room_id, "2025-06-01", "2025-06-03", 2).await;
    let (status, body) = app
        .call(Method::DELETE, &format!("/rooms/{room_id}"), As::Admin, None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "ROOM_HAS_ACTIVE_RESERVATIONS");

    let (status, body) = app
        .call(Method::GET, "/rooms/00000000-0000-0000-0000-000000000000", As::Anonymous, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "ROOM_NOT_FOUND");
}

#[tokio::test]
async fn test_room_maintenance_toggle() {
    let app = spawn_app();
    let room_id = app.create_room("101", 2, "100").await;
    let uri = format!("/rooms/{room_id}/maintenance");

    let (status, _) = app
        .call(Method::PUT, &uri, As::Anonymous, Some(json!({"enabled": true})))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, booked) = app.book(&room_id, "2025-06-01", "2025-06-03", 2).await;
    let (status, body) = app
        .call(Method::PUT, &uri, As::Admin, Some(json!({"enabled": true})))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "ROOM_HAS_ACTIVE_RESERVATIONS");

    let reservation_id = booked["data"]["reservation"]["id"].as_str().unwrap();
    let (status, _) = app
        .call(
            Method::POST,
            &format!("/reservations/{reservation_id}/cancel"),
            As::Admin,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .call(Method::PUT, &uri, As::Admin, Some(json!({"enabled": true})))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["status"], "maintenance");

    let (status, body) = app
        .call(Method::PUT, &uri, As::Admin, Some(json!({"enabled": false})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "available");
}

#[tokio::test]
async fn test_unauthenticated_booking_needs_contact_details() {
    let app = spawn_app();
    let room_id = app.create_room("101", 2, "100").await;
    let (status, body) = app
        .call(
            Method::POST,
            "/reservations",
            As::Anonymous,
            Some(json!({
                "room_id": room_id,
                "check_in": "2025-06-01",
                "check_out": "2025-06-03",
                "guest_count": 1
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_malformed_actor_headers_are_not_anonymous() {
    let app = spawn_app();
    let room_id = app.create_room("101", 2, "100").await;
    let booking = json!({
        "room_id": room_id,
        "check_in": "2025-06-01",
        "check_out": "2025-06-03",
        "guest_count": 1,
        "guest": {"name": "Grace", "email": "grace@example.com"}
    });

    let (status, body) = app
        .call(Method::POST, "/reservations", As::Guest("not-a-uuid"), Some(booking.clone()))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "AUTH_ERROR");

    let (status, body) = app.call(Method::POST, "/reservations", As::Anonymous, Some(booking)).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
}

#[tokio::test]
async fn test_reservation_listings() {
    let app = spawn_app();
    let room_id = app.create_room("101", 2, "100").await;
    let (_, first) = app.book(&room_id, "2025-06-10", "2025-06-12", 1).await;
    app.book(&room_id, "2025-06-01", "2025-06-03", 1).await;
    let guest_id = first["data"]["reservation"]["guest_id"].as_str().unwrap().to_string();

    let (status, body) = app
        .call(
            Method::GET,
            &format!("/guests/{guest_id}/reservations"),
            As::Guest(&guest_id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let listed = body["data"].as_array().unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0]["check_in"], "2025-06-01");

    let (status, _) = app
        .call(
            Method::GET,
            &format!("/rooms/{room_id}/reservations"),
            As::Guest(&guest_id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .call(Method::GET, &format!("/rooms/{room_id}/reservations"), As::Admin, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}
