//! # Request Handlers
//!
//! Axum request handlers for the booking API. Handlers only translate HTTP
//! to `BookingService` calls; every rule lives in `inn-core`.

use crate::auth::AdminGuard;
use crate::error::{ApiError, ApiJson, ApiPath, ApiQuery, ApiResult};
use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use inn_core::{
    AvailabilityQuery, BookingError, BookingFilter, ConfirmPaymentRequest, CreateBookingRequest,
    CreateRoomRequest, CreateRoomTypeRequest, GuestMessageRequest, UpdateBookingRequest,
    UpdateRoomRequest, UpdateRoomTypeRequest,
};
use inn_paystack::SIGNATURE_HEADER;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, instrument, warn};

// =============================================================================
// Request/Response Types
// =============================================================================

/// Payment initiation request
#[derive(Debug, Deserialize)]
pub struct InitiatePaymentRequest {
    pub booking_id: i64,
}

/// Optional room-type filter for the admin room list
#[derive(Debug, Default, Deserialize)]
pub struct RoomListQuery {
    #[serde(default)]
    pub room_type_id: Option<i64>,
}

/// Acknowledgement returned to the gateway
#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub received: bool,
    pub outcome: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking_id: Option<i64>,
}

// =============================================================================
// Public Handlers
// =============================================================================

/// Health check endpoint
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": "innkeep",
        "version": env!("CARGO_PKG_VERSION"),
        "store": state.service.store().backend_name(),
        "gateway": state.service.gateway().provider_name(),
    }))
}

/// Room types with their physical room counts
pub async fn list_room_types(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let room_types = state.service.room_types().await?;
    Ok(Json(json!({
        "count": room_types.len(),
        "room_types": room_types,
    })))
}

pub async fn get_room_type(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.service.room_type(id).await?))
}

/// Available count per room type for a stay window (tonight by default)
#[instrument(skip(state))]
pub async fn check_availability(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<AvailabilityQuery>,
) -> ApiResult<Json<Value>> {
    let availability = state.service.check_availability(query).await?;
    Ok(Json(json!({ "data": availability })))
}

/// Reserve one or more rooms of a type
#[instrument(
    skip(state, request),
    fields(room_type_id = request.room_type_id, rooms = request.number_of_rooms)
)]
pub async fn create_booking(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateBookingRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let allocation = state.service.create_booking(request).await?;
    let total_amount = allocation.total_amount();

    info!(
        bookings = allocation.bookings.len(),
        total = %total_amount,
        "booking request accepted"
    );

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Booking created successfully",
            "bookings": allocation.bookings,
            "assigned_rooms": allocation.assigned_rooms,
            "nights": allocation.quote.nights,
            "total_amount": total_amount,
        })),
    ))
}

pub async fn get_booking(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.service.get_booking(id).await?))
}

/// Guest self-cancel
#[instrument(skip(state))]
pub async fn cancel_booking(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<Value>> {
    let record = state.service.cancel_booking(id).await?;
    Ok(Json(json!({
        "message": "Booking cancelled",
        "booking": record.booking,
        "room": record.room,
    })))
}

/// Open a hosted payment page for a pending booking
#[instrument(skip(state, request), fields(booking_id = request.booking_id))]
pub async fn initiate_payment(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<InitiatePaymentRequest>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.service.initiate_payment(request.booking_id).await?))
}

/// Gateway callback (`?reference=...`) or guest polling
#[instrument(skip(state))]
pub async fn confirm_payment_query(
    State(state): State<AppState>,
    ApiQuery(request): ApiQuery<ConfirmPaymentRequest>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.service.confirm_payment(request).await?))
}

#[instrument(skip(state))]
pub async fn confirm_payment(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ConfirmPaymentRequest>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.service.confirm_payment(request).await?))
}

/// Signed gateway push
///
/// Events for references this system never issued are acknowledged so the
/// gateway stops redelivering them.
#[instrument(skip(state, headers, body), fields(bytes = body.len()))]
pub async fn gateway_webhook(
    State(state): State<AppState>,
    ApiPath(provider): ApiPath<String>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<WebhookAck>> {
    if provider != state.service.gateway().provider_name() {
        return Err(BookingError::not_found("webhook provider", provider).into());
    }

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            BookingError::SignatureInvalid(format!("Missing {} header", SIGNATURE_HEADER))
        })?;

    match state.service.handle_gateway_webhook(&body, signature).await {
        Ok(record) => Ok(Json(WebhookAck {
            received: true,
            outcome: record.outcome.as_str().to_string(),
            booking_id: Some(record.booking.id),
        })),
        Err(BookingError::NotFound { entity, id }) => {
            warn!(entity, id = %id, "webhook for unknown reference acknowledged");
            Ok(Json(WebhookAck {
                received: true,
                outcome: "unknown_reference".to_string(),
                booking_id: None,
            }))
        }
        Err(e) => Err(ApiError::from(e)),
    }
}

// =============================================================================
// Admin Handlers
// =============================================================================

pub async fn me(AdminGuard(principal): AdminGuard) -> impl IntoResponse {
    Json(principal)
}

pub async fn list_rooms(
    _admin: AdminGuard,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<RoomListQuery>,
) -> ApiResult<Json<Value>> {
    let rooms = state.service.rooms(query.room_type_id).await?;
    Ok(Json(json!({ "count": rooms.len(), "rooms": rooms })))
}

#[instrument(skip(state, request), fields(name = %request.name))]
pub async fn create_room_type(
    _admin: AdminGuard,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateRoomTypeRequest>,
) -> ApiResult<impl IntoResponse> {
    let room_type = state.service.create_room_type(request).await?;
    Ok((StatusCode::CREATED, Json(room_type)))
}

#[instrument(skip(state, request))]
pub async fn update_room_type(
    _admin: AdminGuard,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(request): ApiJson<UpdateRoomTypeRequest>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.service.update_room_type(id, request).await?))
}

#[instrument(skip(state, request), fields(room_number = %request.room_number))]
pub async fn create_room(
    _admin: AdminGuard,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateRoomRequest>,
) -> ApiResult<impl IntoResponse> {
    let room = state.service.create_room(request).await?;
    Ok((StatusCode::CREATED, Json(room)))
}

#[instrument(skip(state, request))]
pub async fn update_room(
    _admin: AdminGuard,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(request): ApiJson<UpdateRoomRequest>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.service.update_room(id, request).await?))
}

#[instrument(skip(state))]
pub async fn delete_room(
    _admin: AdminGuard,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<StatusCode> {
    state.service.delete_room(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn list_bookings(
    _admin: AdminGuard,
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<BookingFilter>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.service.list_bookings(filter).await?))
}

pub async fn admin_get_booking(
    _admin: AdminGuard,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.service.get_booking(id).await?))
}

#[instrument(skip(state, request))]
pub async fn update_booking(
    _admin: AdminGuard,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(request): ApiJson<UpdateBookingRequest>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.service.update_booking(id, request).await?))
}

#[instrument(skip(state))]
pub async fn confirm_booking(
    _admin: AdminGuard,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.service.confirm_booking(id).await?))
}

#[instrument(skip(state))]
pub async fn admin_cancel_booking(
    _admin: AdminGuard,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.service.cancel_booking(id).await?))
}

#[instrument(skip(state))]
pub async fn checkout_booking(
    _admin: AdminGuard,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.service.checkout_booking(id).await?))
}

#[instrument(skip(state, request))]
pub async fn send_guest_message(
    _admin: AdminGuard,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(request): ApiJson<GuestMessageRequest>,
) -> ApiResult<Json<Value>> {
    state.service.send_guest_message(id, request).await?;
    Ok(Json(json!({ "message": "Email sent" })))
}

/// Run the auto-checkout sweep now
#[instrument(skip(state))]
pub async fn run_sweep(
    _admin: AdminGuard,
    State(state): State<AppState>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.service.run_auto_checkout_sweep().await?))
}

/// Recent `/api/` responses
pub async fn status_log(_admin: AdminGuard, State(state): State<AppState>) -> impl IntoResponse {
    let entries = state.status_log.snapshot();
    Json(json!({ "count": entries.len(), "entries": entries }))
}
