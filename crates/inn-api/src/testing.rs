//! Shared fixtures for the router and scheduler tests.

use crate::state::{AppConfig, AppState};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::NaiveDate;
use http_body_util::BodyExt;
use inn_core::{
    BookingError, BookingResult, BookingService, FixedClock, GatewayEvent, GatewayStatus,
    InitializeTransaction, MemoryStore, PaymentGateway, PaymentInit, RoomCatalog, Verification,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

pub const ADMIN_TOKEN: &str = "test-admin-token";
pub const WEBHOOK_SIGNATURE: &str = "valid-signature";

/// Gateway with scripted verification results
#[derive(Default)]
pub struct FakeGateway {
    verdicts: Mutex<HashMap<String, GatewayStatus>>,
}

impl FakeGateway {
    pub fn set(&self, reference: &str, status: GatewayStatus) {
        self.verdicts.lock().unwrap().insert(reference.to_string(), status);
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn initialize_transaction(
        &self,
        request: &InitializeTransaction,
    ) -> BookingResult<PaymentInit> {
        Ok(PaymentInit {
            reference: request.reference.clone(),
            authorization_url: format!("https://checkout.test/{}", request.reference),
            access_code: None,
        })
    }

    async fn verify_transaction(&self, reference: &str) -> BookingResult<Verification> {
        let status = self
            .verdicts
            .lock()
            .unwrap()
            .get(reference)
            .cloned()
            .unwrap_or(GatewayStatus::Pending);
        Ok(Verification {
            reference: reference.to_string(),
            status,
            gateway_response: None,
            amount_minor: None,
        })
    }

    async fn verify_webhook(&self, payload: &[u8], signature: &str) -> BookingResult<GatewayEvent> {
        if signature != WEBHOOK_SIGNATURE {
            return Err(BookingError::SignatureInvalid("Signature mismatch".into()));
        }
        serde_json::from_slice(payload).map_err(|e| BookingError::Validation(e.to_string()))
    }

    fn provider_name(&self) -> &'static str {
        "paystack"
    }
}

pub struct Harness {
    pub service: BookingService,
    pub gateway: Arc<FakeGateway>,
    pub state: AppState,
}

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, 15).unwrap()
}

fn catalog() -> RoomCatalog {
    RoomCatalog::from_toml(
        r#"
        [[room_types]]
        id = 1
        name = "Standard Room"
        base_price = 70000
        total_rooms = 3
        amenities = ["wifi", "tv"]

        [[rooms]]
        id = 1
        room_number = "101"
        room_type_id = 1

        [[rooms]]
        id = 2
        room_number = "102"
        room_type_id = 1

        [[rooms]]
        id = 3
        room_number = "103"
        room_type_id = 1
        "#,
    )
    .unwrap()
}

pub async fn harness() -> Harness {
    let store = Arc::new(MemoryStore::from_catalog(catalog()).unwrap());
    let gateway = Arc::new(FakeGateway::default());
    let service = BookingService::new(store, gateway.clone())
        .with_clock(Arc::new(FixedClock::on(today())));

    let config = AppConfig::from_lookup(|key| match key {
        "ADMIN_TOKEN" => Some(ADMIN_TOKEN.to_string()),
        _ => None,
    })
    .unwrap();

    Harness {
        state: AppState::new(service.clone(), config),
        service,
        gateway,
    }
}

impl Harness {
    pub fn router(&self) -> Router {
        crate::routes::create_router(self.state.clone())
    }

    /// A booking that stayed 2026-01-10..12 and was confirmed, i.e. due for checkout
    pub async fn overdue_confirmed_booking(&self) -> i64 {
        let request = serde_json::from_value(json!({
            "room_type_id": 1,
            "check_in_date": "2026-01-10",
            "check_out_date": "2026-01-12",
            "guest_name": "Ada Obi",
            "guest_email": "ada@example.com",
            "guest_phone": "08012345678"
        }))
        .unwrap();
        let allocation = self.service.create_booking(request).await.unwrap();
        let id = allocation.bookings[0].id;
        self.service.confirm_booking(id).await.unwrap();
        id
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }
}

pub fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn admin_request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {}", ADMIN_TOKEN));
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}
