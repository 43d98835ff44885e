use std::sync::Arc;

use airport_api::middleware::{Claims, Role};
use airport_api::state::AuthConfig;
use airport_api::{app, AppState};
use airport_core::models::{NewAirplane, NewAirport, NewCrew, NewFlight, NewRoute};
use airport_core::repository::{CatalogRepository, FlightRepository};
use airport_core::BookingEngine;
use airport_store::app_config::RateLimitConfig;
use airport_store::MemoryStore;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;

const SECRET: &str = "test-secret";

struct TestApp {
    router: Router,
    flight_id: i64,
}

async fn setup() -> TestApp {
    let store = Arc::new(MemoryStore::new());

    let src = store
        .create_airport(&NewAirport {
            name: "Boryspil International".to_string(),
            closest_big_city: "Boryspol".to_string(),
        })
        .await
        .unwrap();
    let dst = store
        .create_airport(&NewAirport {
            name: "Lviv Danylo Halytskyi".to_string(),
            closest_big_city: "Lviv".to_string(),
        })
        .await
        .unwrap();
    let kind = store.create_airplane_type("Airbus").await.unwrap();
    let airplane = store
        .create_airplane(&NewAirplane {
            name: "A".to_string(),
            rows: 10,
            seats_in_row: 10,
            airplane_type_id: kind.id,
        })
        .await
        .unwrap();
    let route = store
        .create_route(&NewRoute {
            source_id: src.id,
            destination_id: dst.id,
            distance: 650,
        })
        .await
        .unwrap();
    let crew = store
        .create_crew(&NewCrew {
            first_name: "First".to_string(),
            last_name: "First".to_string(),
        })
        .await
        .unwrap();
    let departure = Utc::now() + Duration::days(1);
    let flight = store
        .create_flight(&NewFlight {
            route_id: route.id,
            airplane_id: airplane.id,
            departure_time: departure,
            arrival_time: departure + Duration::hours(1),
            crew: vec![crew.id],
        })
        .await
        .unwrap();

    let state = AppState {
        engine: BookingEngine::new(store.clone()),
        store,
        redis: None,
        rate_limit: RateLimitConfig::default(),
        auth: AuthConfig {
            secret: SECRET.to_string(),
        },
    };

    TestApp {
        router: app(state),
        flight_id: flight.id,
    }
}

fn token(sub: &str, role: Role) -> String {
    Claims::new(sub, role, Duration::minutes(10)).sign(SECRET).unwrap()
}

async fn send(router: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

fn order_body(tickets: &[(i32, i32, i64)]) -> Value {
    json!({
        "tickets": tickets
            .iter()
            .map(|(row, seat, flight)| json!({ "row": row, "seat": seat, "flight": flight }))
            .collect::<Vec<_>>()
    })
}

// ============================================================================
// Permission gate
// ============================================================================

#[tokio::test]
async fn test_health_is_public() {
    let app = setup().await;
    let (status, body) = send(&app.router, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_orders_require_token() {
    let app = setup().await;
    let body = order_body(&[(1, 2, app.flight_id)]);

    let (status, _) = send(&app.router, Method::POST, "/v1/orders", None, Some(body.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app.router, Method::POST, "/v1/orders", Some("not-a-jwt"), Some(body)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_signed_with_other_secret_is_rejected() {
    let app = setup().await;
    let forged = Claims::new("mallory", Role::Admin, Duration::minutes(10))
        .sign("some-other-secret")
        .unwrap();

    let (status, _) = send(&app.router, Method::GET, "/v1/orders", Some(&forged), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_routes_reject_users() {
    let app = setup().await;
    let uri = format!("/v1/admin/flights/{}", app.flight_id);

    let (status, _) = send(&app.router, Method::DELETE, &uri, None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let user = token("alice", Role::User);
    let (status, body) = send(&app.router, Method::DELETE, &uri, Some(&user), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["error"].is_string());

    let admin = token("root", Role::Admin);
    let (status, _) = send(&app.router, Method::DELETE, &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

// ============================================================================
// Orders
// ============================================================================

#[tokio::test]
async fn test_create_and_list_orders() {
    let app = setup().await;
    let alice = token("alice", Role::User);

    let (status, created) = send(
        &app.router,
        Method::POST,
        "/v1/orders",
        Some(&alice),
        Some(order_body(&[(1, 2, app.flight_id)])),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(created["created_at"].is_string());
    assert_eq!(created["tickets"][0]["row"], 1);
    assert_eq!(created["tickets"][0]["seat"], 2);
    assert_eq!(created["tickets"][0]["flight"], app.flight_id);

    let (status, orders) = send(&app.router, Method::GET, "/v1/orders", Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(orders.as_array().unwrap().len(), 1);
    assert_eq!(orders[0]["id"], created["id"]);

    let bob = token("bob", Role::User);
    let (_, orders) = send(&app.router, Method::GET, "/v1/orders", Some(&bob), None).await;
    assert!(orders.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_out_of_range_seat_is_400_with_detail() {
    let app = setup().await;
    let alice = token("alice", Role::User);

    let (status, body) = send(
        &app.router,
        Method::POST,
        "/v1/orders",
        Some(&alice),
        Some(order_body(&[(2, 25, app.flight_id)])),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["detail"]["reason"]["kind"],
        "seat_out_of_range"
    );
    assert_eq!(body["detail"]["valid_range"], json!([1, 10]));

    let (_, orders) = send(&app.router, Method::GET, "/v1/orders", Some(&alice), None).await;
    assert!(orders.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_empty_order_is_400() {
    let app = setup().await;
    let alice = token("alice", Role::User);

    let (status, body) = send(
        &app.router,
        Method::POST,
        "/v1/orders",
        Some(&alice),
        Some(json!({ "tickets": [] })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Order must contain at least one ticket");
}

#[tokio::test]
async fn test_unknown_flight_in_body_is_400() {
    let app = setup().await;
    let alice = token("alice", Role::User);

    let (status, body) = send(
        &app.router,
        Method::POST,
        "/v1/orders",
        Some(&alice),
        Some(order_body(&[(1, 1, 9999)])),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"]["flight"], 9999);
}

#[tokio::test]
async fn test_taken_seat_is_409() {
    let app = setup().await;
    let alice = token("alice", Role::User);
    let bob = token("bob", Role::User);
    let body = order_body(&[(3, 3, app.flight_id)]);

    let (status, _) = send(&app.router, Method::POST, "/v1/orders", Some(&alice), Some(body.clone())).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, conflict) = send(&app.router, Method::POST, "/v1/orders", Some(&bob), Some(body)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(conflict["detail"], json!({ "flight": app.flight_id, "row": 3, "seat": 3 }));
}

// ============================================================================
// Flights
// ============================================================================

#[tokio::test]
async fn test_flight_list_shows_availability() {
    let app = setup().await;
    let alice = token("alice", Role::User);
    send(
        &app.router,
        Method::POST,
        "/v1/orders",
        Some(&alice),
        Some(order_body(&[(1, 1, app.flight_id), (1, 2, app.flight_id), (1, 3, app.flight_id)])),
    )
    .await;

    let (status, flights) = send(&app.router, Method::GET, "/v1/flights", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(flights[0]["tickets_available"], 97);
    assert_eq!(flights[0]["route"], "Boryspol - Lviv: 650 km");
    assert_eq!(flights[0]["airplane"], "A Airbus");
    assert_eq!(flights[0]["crew"][0]["first_name"], "First");
}

#[tokio::test]
async fn test_flight_detail_and_missing_flight() {
    let app = setup().await;
    let alice = token("alice", Role::User);
    send(
        &app.router,
        Method::POST,
        "/v1/orders",
        Some(&alice),
        Some(order_body(&[(2, 1, app.flight_id)])),
    )
    .await;

    let (status, detail) = send(
        &app.router,
        Method::GET,
        &format!("/v1/flights/{}", app.flight_id),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["tickets_taken"], json!([{ "row": 2, "seat": 1 }]));
    assert_eq!(detail["crew"], json!(["First First"]));

    let (status, _) = send(&app.router, Method::GET, "/v1/flights/9999", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ============================================================================
// Admin ticket paths
// ============================================================================

#[tokio::test]
async fn test_admin_ticket_create_and_update() {
    let app = setup().await;
    let alice = token("alice", Role::User);
    let admin = token("root", Role::Admin);

    let (_, order) = send(
        &app.router,
        Method::POST,
        "/v1/orders",
        Some(&alice),
        Some(order_body(&[(1, 1, app.flight_id)])),
    )
    .await;

    let (status, ticket) = send(
        &app.router,
        Method::POST,
        "/v1/admin/tickets",
        Some(&admin),
        Some(json!({ "order": order["id"], "row": 5, "seat": 5, "flight": app.flight_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(ticket["order"], order["id"]);

    let uri = format!("/v1/admin/tickets/{}", ticket["id"]);
    let (status, _) = send(
        &app.router,
        Method::PUT,
        &uri,
        Some(&admin),
        Some(json!({ "row": 1, "seat": 1, "flight": app.flight_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &app.router,
        Method::PUT,
        &uri,
        Some(&admin),
        Some(json!({ "row": 11, "seat": 1, "flight": app.flight_id })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, moved) = send(
        &app.router,
        Method::PUT,
        &uri,
        Some(&admin),
        Some(json!({ "row": 6, "seat": 6, "flight": app.flight_id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(moved["row"], 6);
}

#[tokio::test]
async fn test_admin_delete_order() {
    let app = setup().await;
    let alice = token("alice", Role::User);
    let admin = token("root", Role::Admin);

    let (_, order) = send(
        &app.router,
        Method::POST,
        "/v1/orders",
        Some(&alice),
        Some(order_body(&[(1, 1, app.flight_id)])),
    )
    .await;
    let uri = format!("/v1/admin/orders/{}", order["id"]);

    let (status, _) = send(&app.router, Method::DELETE, &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app.router, Method::DELETE, &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, orders) = send(&app.router, Method::GET, "/v1/orders", Some(&alice), None).await;
    assert!(orders.as_array().unwrap().is_empty());
}

// ============================================================================
// Reference data
// ============================================================================

async fn admin_post(router: &Router, admin: &str, uri: &str, body: Value) -> Value {
    let (status, created) = send(router, Method::POST, uri, Some(admin), Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "POST {} -> {}", uri, created);
    created
}

#[tokio::test]
async fn test_admin_schedules_a_bookable_flight() {
    let app = setup().await;
    let admin = token("root", Role::Admin);

    let src = admin_post(
        &app.router,
        &admin,
        "/v1/admin/airports",
        json!({ "name": "Heathrow", "closest_big_city": "London" }),
    )
    .await;
    let dst = admin_post(
        &app.router,
        &admin,
        "/v1/admin/airports",
        json!({ "name": "Charles de Gaulle", "closest_big_city": "Paris" }),
    )
    .await;
    let kind = admin_post(&app.router, &admin, "/v1/admin/airplane-types", json!({ "name": "Boeing" })).await;
    let airplane = admin_post(
        &app.router,
        &admin,
        "/v1/admin/airplanes",
        json!({ "name": "737", "rows": 2, "seats_in_row": 3, "airplane_type_id": kind["id"] }),
    )
    .await;
    let route = admin_post(
        &app.router,
        &admin,
        "/v1/admin/routes",
        json!({ "source_id": src["id"], "destination_id": dst["id"], "distance": 344 }),
    )
    .await;
    let crew = admin_post(
        &app.router,
        &admin,
        "/v1/admin/crews",
        json!({ "first_name": "Ada", "last_name": "Pilot" }),
    )
    .await;
    let flight = admin_post(
        &app.router,
        &admin,
        "/v1/admin/flights",
        json!({
            "route_id": route["id"],
            "airplane_id": airplane["id"],
            "departure_time": "2030-01-01T10:00:00Z",
            "arrival_time": "2030-01-01T11:15:00Z",
            "crew": [crew["id"]],
        }),
    )
    .await;
    let flight_id = flight["id"].as_i64().unwrap();

    let alice = token("alice", Role::User);
    let (status, _) = send(
        &app.router,
        Method::POST,
        "/v1/orders",
        Some(&alice),
        Some(order_body(&[(2, 3, flight_id)])),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, detail) = send(&app.router, Method::GET, &format!("/v1/flights/{}", flight_id), None, None).await;
    assert_eq!(detail["route"], "London - Paris: 344 km");
    assert_eq!(detail["airplane"], "737 Boeing");
    assert_eq!(detail["crew"], json!(["Ada Pilot"]));
    assert_eq!(detail["tickets_taken"], json!([{ "row": 2, "seat": 3 }]));

    let (_, flights) = send(&app.router, Method::GET, "/v1/flights", None, None).await;
    let listed = flights
        .as_array()
        .unwrap()
        .iter()
        .find(|f| f["id"] == flight_id)
        .unwrap();
    assert_eq!(listed["tickets_available"], 5);
}

#[tokio::test]
async fn test_catalog_routes_are_admin_only() {
    let app = setup().await;
    let body = json!({ "name": "Heathrow", "closest_big_city": "London" });

    let (status, _) = send(&app.router, Method::POST, "/v1/admin/airports", None, Some(body.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let user = token("alice", Role::User);
    let (status, _) = send(&app.router, Method::POST, "/v1/admin/airports", Some(&user), Some(body)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_catalog_rejects_bad_values_and_references() {
    let app = setup().await;
    let admin = token("root", Role::Admin);
    let kind = admin_post(&app.router, &admin, "/v1/admin/airplane-types", json!({ "name": "Embraer" })).await;

    let (status, body) = send(
        &app.router,
        Method::POST,
        "/v1/admin/airplanes",
        Some(&admin),
        Some(json!({ "name": "E190", "rows": -5, "seats_in_row": 4, "airplane_type_id": kind["id"] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid rows: -5");

    let (status, _) = send(
        &app.router,
        Method::POST,
        "/v1/admin/airplanes",
        Some(&admin),
        Some(json!({ "name": "E190", "rows": 20, "seats_in_row": 4, "airplane_type_id": 9999 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app.router,
        Method::POST,
        "/v1/admin/flights",
        Some(&admin),
        Some(json!({
            "route_id": 9999,
            "airplane_id": 9999,
            "departure_time": "2030-01-01T10:00:00Z",
            "arrival_time": "2030-01-01T11:00:00Z",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_admin_resizes_airplane() {
    let app = setup().await;
    let admin = token("root", Role::Admin);
    let kind = admin_post(&app.router, &admin, "/v1/admin/airplane-types", json!({ "name": "Boeing" })).await;
    let airplane = admin_post(
        &app.router,
        &admin,
        "/v1/admin/airplanes",
        json!({ "name": "737", "rows": 2, "seats_in_row": 3, "airplane_type_id": kind["id"] }),
    )
    .await;
    let uri = format!("/v1/admin/airplanes/{}", airplane["id"]);

    let (status, updated) = send(
        &app.router,
        Method::PUT,
        &uri,
        Some(&admin),
        Some(json!({ "name": "737 MAX", "rows": 30, "seats_in_row": 6, "airplane_type_id": kind["id"] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["rows"], 30);

    let (status, fetched) = send(&app.router, Method::GET, &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["name"], "737 MAX");
    assert_eq!(fetched["seats_in_row"], 6);

    let (status, _) = send(&app.router, Method::GET, "/v1/admin/airplanes/9999", Some(&admin), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app.router,
        Method::PUT,
        "/v1/admin/airplanes/9999",
        Some(&admin),
        Some(json!({ "name": "Ghost", "rows": 1, "seats_in_row": 1, "airplane_type_id": kind["id"] })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
