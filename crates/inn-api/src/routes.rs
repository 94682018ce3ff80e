//! # Routes
//!
//! Axum router configuration for the booking API.

use crate::handlers;
use crate::state::AppState;
use crate::status_log;
use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the main application router
///
/// Routes:
/// - Public (`/api/v1`):
///   - GET  /rooms, /rooms/{id}, /rooms/availability, /bookings/availability
///   - POST /bookings, GET /bookings/{id}
///   - PUT  /bookings/cancel/{id}, POST /bookings/{id}/cancel
///   - POST /payments/initiate, GET|POST /payments/confirm
///
/// - Admin (`/api/v1`, bearer `ADMIN_TOKEN`):
///   - GET  /auth/me, /rooms/list
///   - POST /rooms/add, PUT /rooms/{id}
///   - POST /admin/physical-rooms, PUT|DELETE /admin/physical-rooms/{id}
///   - GET  /admin/bookings, GET|PUT|DELETE /admin/bookings/{id}
///   - POST /admin/bookings/{id}/confirm, /checkout, /send-email
///   - POST /admin/sweep, GET /admin/status
///
/// - Webhooks:
///   - POST /webhook/{provider} - signed gateway events
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let public_routes = Router::new()
        .route("/rooms", get(handlers::list_room_types))
        .route("/rooms/availability", get(handlers::check_availability))
        .route("/bookings/availability", get(handlers::check_availability))
        .route("/bookings", post(handlers::create_booking))
        .route("/bookings/{id}", get(handlers::get_booking))
        .route("/bookings/cancel/{id}", put(handlers::cancel_booking))
        .route("/bookings/{id}/cancel", post(handlers::cancel_booking))
        .route("/payments/initiate", post(handlers::initiate_payment))
        .route(
            "/payments/confirm",
            get(handlers::confirm_payment_query).post(handlers::confirm_payment),
        );

    // Every handler here takes an AdminGuard
    let admin_routes = Router::new()
        .route("/auth/me", get(handlers::me))
        .route("/rooms/list", get(handlers::list_rooms))
        .route("/rooms/add", post(handlers::create_room_type))
        .route("/admin/physical-rooms", post(handlers::create_room))
        .route(
            "/admin/physical-rooms/{id}",
            put(handlers::update_room).delete(handlers::delete_room),
        )
        .route("/admin/bookings", get(handlers::list_bookings))
        .route(
            "/admin/bookings/{id}",
            get(handlers::admin_get_booking)
                .put(handlers::update_booking)
                .delete(handlers::admin_cancel_booking),
        )
        .route("/admin/bookings/{id}/confirm", post(handlers::confirm_booking))
        .route("/admin/bookings/{id}/checkout", post(handlers::checkout_booking))
        .route("/admin/bookings/{id}/send-email", post(handlers::send_guest_message))
        .route("/admin/sweep", post(handlers::run_sweep))
        .route("/admin/status", get(handlers::status_log));

    // GET is public, PUT is admin-only
    let room_type_routes = Router::new().route(
        "/rooms/{id}",
        get(handlers::get_room_type).put(handlers::update_room_type),
    );

    let api_routes = Router::new()
        .merge(public_routes)
        .merge(admin_routes)
        .merge(room_type_routes);

    // Webhook routes (raw body, no CORS needed)
    let webhook_routes = Router::new().route("/{provider}", post(handlers::gateway_webhook));

    Router::new()
        .route("/health", get(handlers::health))
        .route("/", get(handlers::health))
        .nest("/api/v1", api_routes)
        .nest("/webhook", webhook_routes)
        .layer(middleware::from_fn_with_state(
            state.status_log.clone(),
            status_log::record_status,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use crate::testing::{self, admin_request, get, json_request, WEBHOOK_SIGNATURE};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use inn_core::GatewayStatus;
    use serde_json::{json, Value};

    fn booking_body(rooms: u32) -> Value {
        json!({
            "room_type_id": 1,
            "check_in_date": "2026-02-01",
            "check_out_date": "2026-02-03",
            "guest_name": "Chidi Okeke",
            "guest_email": "chidi@example.com",
            "guest_phone": "08030000000",
            "number_of_rooms": rooms
        })
    }

    fn webhook(signature: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/webhook/paystack")
            .header("content-type", "application/json")
            .header("x-paystack-signature", signature)
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn charge_success(reference: &str) -> Value {
        json!({ "event": "charge.success", "reference": reference, "status": "success" })
    }

    #[tokio::test]
    async fn test_health() {
        let harness = testing::harness().await;
        let (status, body) = harness.send(get("/health")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["store"], "memory");
        assert_eq!(body["gateway"], "paystack");
    }

    #[tokio::test]
    async fn test_create_booking_assigns_rooms() {
        let harness = testing::harness().await;
        let (status, body) = harness
            .send(json_request("POST", "/api/v1/bookings", booking_body(2)))
            .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["bookings"].as_array().unwrap().len(), 2);
        assert_eq!(body["bookings"][0]["status"], "pending");
        assert_eq!(body["nights"], 2);
        assert_eq!(body["assigned_rooms"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_create_booking_shortfall_reports_counts() {
        let harness = testing::harness().await;
        let (status, _) = harness
            .send(json_request("POST", "/api/v1/bookings", booking_body(2)))
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = harness
            .send(json_request("POST", "/api/v1/bookings", booking_body(2)))
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["kind"], "insufficient_inventory");
        assert_eq!(body["details"]["requested"], 2);
        assert_eq!(body["details"]["available"], 1);
    }

    #[tokio::test]
    async fn test_malformed_booking_is_validation_error() {
        let harness = testing::harness().await;
        let mut body = booking_body(1);
        body["check_out_date"] = json!("2026-02-01");

        let (status, body) = harness
            .send(json_request("POST", "/api/v1/bookings", body))
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["kind"], "validation_error");
    }

    #[tokio::test]
    async fn test_admin_routes_require_token() {
        let harness = testing::harness().await;

        let (status, body) = harness.send(get("/api/v1/admin/bookings")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["kind"], "unauthorized");

        let wrong = Request::builder()
            .uri("/api/v1/admin/bookings")
            .header("authorization", "Bearer nope")
            .body(Body::empty())
            .unwrap();
        let (status, _) = harness.send(wrong).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_admin_lists_and_confirms_bookings() {
        let harness = testing::harness().await;
        harness
            .send(json_request("POST", "/api/v1/bookings", booking_body(1)))
            .await;

        let (status, page) = harness
            .send(admin_request("GET", "/api/v1/admin/bookings?status=pending", None))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page["total"], 1);
        let id = page["data"][0]["id"].as_i64().unwrap();

        let uri = format!("/api/v1/admin/bookings/{}/confirm", id);
        let (status, body) = harness.send(admin_request("POST", &uri, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["booking"]["status"], "confirmed");

        // A second confirm hits the state machine guard
        let (status, body) = harness.send(admin_request("POST", &uri, None)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["kind"], "invalid_transition");
    }

    #[tokio::test]
    async fn test_room_type_update_is_admin_only() {
        let harness = testing::harness().await;
        let change = json!({ "base_price": 80000 });

        let (status, _) = harness
            .send(json_request("PUT", "/api/v1/rooms/1", change.clone()))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = harness
            .send(admin_request("PUT", "/api/v1/rooms/1", Some(change)))
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = harness.send(get("/api/v1/rooms/1")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Standard Room");
    }

    #[tokio::test]
    async fn test_webhook_confirms_once() {
        let harness = testing::harness().await;
        let (_, created) = harness
            .send(json_request("POST", "/api/v1/bookings", booking_body(1)))
            .await;
        let id = created["bookings"][0]["id"].as_i64().unwrap();
        let payment = harness.service.initiate_payment(id).await.unwrap();

        let (status, _) = harness
            .send(webhook("forged", charge_success(&payment.reference)))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, ack) = harness
            .send(webhook(WEBHOOK_SIGNATURE, charge_success(&payment.reference)))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ack["outcome"], "confirmed");
        assert_eq!(ack["booking_id"], id);

        let (status, ack) = harness
            .send(webhook(WEBHOOK_SIGNATURE, charge_success(&payment.reference)))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ack["outcome"], "already_confirmed");
    }

    #[tokio::test]
    async fn test_webhook_unknown_reference_is_acknowledged() {
        let harness = testing::harness().await;
        let (status, ack) = harness
            .send(webhook(WEBHOOK_SIGNATURE, charge_success("BK-missing")))
            .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(ack["received"], true);
        assert_eq!(ack["outcome"], "unknown_reference");
    }

    #[tokio::test]
    async fn test_webhook_for_other_provider_is_not_found() {
        let harness = testing::harness().await;
        let request = Request::builder()
            .method("POST")
            .uri("/webhook/stripe")
            .body(Body::from("{}"))
            .unwrap();
        let (status, _) = harness.send(request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_payment_confirm_polls_gateway() {
        let harness = testing::harness().await;
        let (_, created) = harness
            .send(json_request("POST", "/api/v1/bookings", booking_body(1)))
            .await;
        let id = created["bookings"][0]["id"].as_i64().unwrap();

        let (status, payment) = harness
            .send(json_request("POST", "/api/v1/payments/initiate", json!({ "booking_id": id })))
            .await;
        assert_eq!(status, StatusCode::OK);
        let reference = payment["reference"].as_str().unwrap().to_string();

        harness.gateway.set(&reference, GatewayStatus::Success);
        let uri = format!("/api/v1/payments/confirm?reference={}", reference);
        let (status, body) = harness.send(get(&uri)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["outcome"], "confirmed");
        assert_eq!(body["booking"]["status"], "confirmed");
    }

    #[tokio::test]
    async fn test_status_log_records_api_requests() {
        let harness = testing::harness().await;
        harness.send(get("/health")).await;
        harness.send(get("/api/v1/bookings/999")).await;

        let (status, body) = harness
            .send(admin_request("GET", "/api/v1/admin/status", None))
            .await;
        assert_eq!(status, StatusCode::OK);

        // Newest first: the status request itself is recorded after it responds
        let entries = body["entries"].as_array().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["endpoint"], "/api/v1/bookings/999");
        assert_eq!(entries[0]["status"], 404);
    }
}
