//! # Request Types
//!
//! Typed, `validator`-checked inputs for every core operation. Each request
//! is validated before it is turned into a domain value, so a bad request
//! never reaches a transaction.

use crate::allocator::AllocationRequest;
use crate::booking::{BookingStatus, GuestInfo, StayDates};
use crate::catalog::{RoomChanges, RoomTypeChanges};
use crate::error::{BookingError, BookingResult};
use crate::lifecycle::BookingChanges;
use crate::room::{NewRoom, NewRoomType, RoomStatus};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use std::borrow::Cow;
use validator::{Validate, ValidationError};

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`)
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn invalid(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Borrowed(message))
}

fn check_order(
    check_in: Option<NaiveDate>,
    check_out: Option<NaiveDate>,
) -> Result<(), ValidationError> {
    match (check_in, check_out) {
        (Some(check_in), Some(check_out)) if check_out <= check_in => Err(invalid(
            "check_out_before_check_in",
            "check_out_date must be after check_in_date",
        )),
        _ => Ok(()),
    }
}

fn check_price(price: Option<Decimal>) -> Result<(), ValidationError> {
    match price {
        Some(price) if price.is_sign_negative() && !price.is_zero() => {
            Err(invalid("negative_price", "base_price must not be negative"))
        }
        _ => Ok(()),
    }
}

fn check_room_status(status: Option<RoomStatus>) -> Result<(), ValidationError> {
    match status {
        Some(status) if !status.is_admin_settable() => Err(invalid(
            "room_status",
            "status must be one of Available, Occupied, Under Maintenance, Dirty",
        )),
        _ => Ok(()),
    }
}

fn default_room_count() -> u32 {
    1
}

/// Guest request for one or more rooms of a type
#[derive(Debug, Clone, Deserialize, Validate)]
#[validate(schema(function = "validate_create_booking"))]
pub struct CreateBookingRequest {
    pub room_type_id: i64,
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
    #[validate(length(min = 1, max = 255))]
    pub guest_name: String,
    #[validate(email)]
    pub guest_email: String,
    #[validate(length(min = 1, max = 20))]
    pub guest_phone: String,
    #[serde(default = "default_room_count")]
    #[validate(range(min = 1, max = 10))]
    pub number_of_rooms: u32,
}

fn validate_create_booking(req: &CreateBookingRequest) -> Result<(), ValidationError> {
    check_order(Some(req.check_in_date), Some(req.check_out_date))
}

impl CreateBookingRequest {
    pub fn into_allocation(self) -> BookingResult<AllocationRequest> {
        self.validate()?;
        Ok(AllocationRequest {
            room_type_id: self.room_type_id,
            dates: StayDates::new(self.check_in_date, self.check_out_date)?,
            guest: GuestInfo::new(self.guest_name, self.guest_email, self.guest_phone),
            room_count: self.number_of_rooms,
        })
    }
}

/// Admin edit of a booking
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[validate(schema(function = "validate_update_booking"))]
pub struct UpdateBookingRequest {
    #[serde(default)]
    pub status: Option<BookingStatus>,
    #[serde(default)]
    #[validate(length(min = 1, max = 255))]
    pub guest_name: Option<String>,
    #[serde(default)]
    #[validate(email)]
    pub guest_email: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, max = 20))]
    pub guest_phone: Option<String>,
    #[serde(default)]
    pub check_in_date: Option<NaiveDate>,
    #[serde(default)]
    pub check_out_date: Option<NaiveDate>,
    /// `null` unassigns the room
    #[serde(default, deserialize_with = "double_option")]
    pub room_id: Option<Option<i64>>,
    #[serde(default)]
    pub room_type_id: Option<i64>,
}

fn validate_update_booking(req: &UpdateBookingRequest) -> Result<(), ValidationError> {
    check_order(req.check_in_date, req.check_out_date)
}

impl UpdateBookingRequest {
    pub fn into_changes(self) -> BookingResult<BookingChanges> {
        self.validate()?;
        Ok(BookingChanges {
            status: self.status,
            guest_name: self.guest_name,
            guest_email: self.guest_email,
            guest_phone: self.guest_phone,
            check_in: self.check_in_date,
            check_out: self.check_out_date,
            room_id: self.room_id,
            room_type_id: self.room_type_id,
        })
    }
}

/// Availability lookup; with no dates the window is tonight
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[validate(schema(function = "validate_availability"))]
pub struct AvailabilityQuery {
    #[serde(default)]
    pub room_type_id: Option<i64>,
    #[serde(default)]
    pub check_in_date: Option<NaiveDate>,
    #[serde(default)]
    pub check_out_date: Option<NaiveDate>,
}

fn validate_availability(query: &AvailabilityQuery) -> Result<(), ValidationError> {
    if query.check_in_date.is_some() != query.check_out_date.is_some() {
        return Err(invalid(
            "partial_window",
            "check_in_date and check_out_date must be given together",
        ));
    }
    check_order(query.check_in_date, query.check_out_date)
}

impl AvailabilityQuery {
    pub fn window(&self, today: NaiveDate) -> BookingResult<StayDates> {
        self.validate()?;
        match (self.check_in_date, self.check_out_date) {
            (Some(check_in), Some(check_out)) => StayDates::new(check_in, check_out),
            _ => Ok(StayDates::single_night(today)),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[validate(schema(function = "validate_create_room"))]
pub struct CreateRoomRequest {
    #[validate(length(min = 1, max = 10))]
    pub room_number: String,
    pub room_type_id: i64,
    #[serde(default)]
    pub status: Option<RoomStatus>,
}

fn validate_create_room(req: &CreateRoomRequest) -> Result<(), ValidationError> {
    check_room_status(req.status)
}

impl CreateRoomRequest {
    pub fn into_new_room(self) -> BookingResult<NewRoom> {
        self.validate()?;
        Ok(NewRoom {
            room_number: self.room_number,
            room_type_id: self.room_type_id,
            status: self.status.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[validate(schema(function = "validate_update_room"))]
pub struct UpdateRoomRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 10))]
    pub room_number: Option<String>,
    #[serde(default)]
    pub room_type_id: Option<i64>,
    #[serde(default)]
    pub status: Option<RoomStatus>,
}

fn validate_update_room(req: &UpdateRoomRequest) -> Result<(), ValidationError> {
    check_room_status(req.status)
}

impl UpdateRoomRequest {
    pub fn into_changes(self) -> BookingResult<RoomChanges> {
        self.validate()?;
        Ok(RoomChanges {
            room_number: self.room_number,
            room_type_id: self.room_type_id,
            status: self.status,
        })
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[validate(schema(function = "validate_create_room_type"))]
pub struct CreateRoomTypeRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub base_price: Decimal,
    pub total_rooms: u32,
    #[serde(default)]
    pub amenities: Vec<String>,
}

fn validate_create_room_type(req: &CreateRoomTypeRequest) -> Result<(), ValidationError> {
    check_price(Some(req.base_price))
}

impl CreateRoomTypeRequest {
    pub fn into_new_room_type(self) -> BookingResult<NewRoomType> {
        self.validate()?;
        Ok(NewRoomType {
            name: self.name,
            description: self.description,
            base_price: self.base_price,
            total_rooms: self.total_rooms,
            amenities: self.amenities,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[validate(schema(function = "validate_update_room_type"))]
pub struct UpdateRoomTypeRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub base_price: Option<Decimal>,
    #[serde(default)]
    pub total_rooms: Option<u32>,
    #[serde(default)]
    pub amenities: Option<Vec<String>>,
}

fn validate_update_room_type(req: &UpdateRoomTypeRequest) -> Result<(), ValidationError> {
    check_price(req.base_price)
}

impl UpdateRoomTypeRequest {
    pub fn into_changes(self) -> BookingResult<RoomTypeChanges> {
        self.validate()?;
        Ok(RoomTypeChanges {
            name: self.name,
            description: self.description,
            base_price: self.base_price,
            total_rooms: self.total_rooms,
            amenities: self.amenities,
        })
    }
}

/// Free-form message from staff to a booking's guest
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct GuestMessageRequest {
    #[validate(length(min = 1, max = 255))]
    pub subject: String,
    #[validate(length(min = 1))]
    pub message: String,
}

/// Payment confirmation, from the guest's browser or the gateway callback
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ConfirmPaymentRequest {
    #[serde(alias = "reference")]
    #[validate(length(min = 1, max = 100))]
    pub payment_reference: String,
    #[serde(default)]
    pub booking_id: Option<i64>,
}

impl ConfirmPaymentRequest {
    pub fn new(payment_reference: impl Into<String>) -> Self {
        Self {
            payment_reference: payment_reference.into(),
            booking_id: None,
        }
    }

    pub fn with_booking_id(mut self, booking_id: i64) -> Self {
        self.booking_id = Some(booking_id);
        self
    }
}

/// Reject a request that fails its field rules
pub fn ensure_valid<T: Validate>(request: &T) -> BookingResult<()> {
    request.validate().map_err(BookingError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn create(body: serde_json::Value) -> CreateBookingRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_create_booking_defaults_to_one_room() {
        let req = create(json!({
            "room_type_id": 2,
            "check_in_date": "2026-01-10",
            "check_out_date": "2026-01-12",
            "guest_name": "Ada Obi",
            "guest_email": "ada@example.com",
            "guest_phone": "08012345678"
        }));
        let allocation = req.into_allocation().unwrap();
        assert_eq!(allocation.room_count, 1);
        assert_eq!(allocation.dates.nights(), 2);
    }

    #[test]
    fn test_create_booking_rejects_bad_fields() {
        let req = create(json!({
            "room_type_id": 2,
            "check_in_date": "2026-01-12",
            "check_out_date": "2026-01-12",
            "guest_name": "",
            "guest_email": "not-an-email",
            "guest_phone": "0801",
            "number_of_rooms": 11
        }));
        let err = req.into_allocation().unwrap_err();
        let message = err.to_string();
        assert!(matches!(err, BookingError::Validation(_)));
        assert!(message.contains("guest_name"));
        assert!(message.contains("guest_email"));
        assert!(message.contains("number_of_rooms"));
    }

    #[test]
    fn test_create_booking_rejects_same_day_checkout() {
        let req = create(json!({
            "room_type_id": 2,
            "check_in_date": "2026-01-12",
            "check_out_date": "2026-01-12",
            "guest_name": "Ada Obi",
            "guest_email": "ada@example.com",
            "guest_phone": "0801"
        }));
        let message = req.into_allocation().unwrap_err().to_string();
        assert!(message.contains("check_out_date must be after check_in_date"));
    }

    #[test]
    fn test_update_distinguishes_null_room() {
        let unassign: UpdateBookingRequest =
            serde_json::from_value(json!({ "room_id": null })).unwrap();
        assert_eq!(unassign.into_changes().unwrap().room_id, Some(None));

        let untouched: UpdateBookingRequest =
            serde_json::from_value(json!({ "guest_name": "B" })).unwrap();
        assert_eq!(untouched.into_changes().unwrap().room_id, None);

        let status: UpdateBookingRequest =
            serde_json::from_value(json!({ "status": "checked-out" })).unwrap();
        assert_eq!(status.status, Some(BookingStatus::CheckedOut));
    }

    #[test]
    fn test_availability_window() {
        let today = NaiveDate::from_ymd_opt(2026, 5, 1).unwrap();
        let window = AvailabilityQuery::default().window(today).unwrap();
        assert_eq!(window.check_in, today);
        assert_eq!(window.nights(), 1);

        let partial = AvailabilityQuery {
            check_in_date: Some(today),
            ..Default::default()
        };
        assert!(partial.window(today).is_err());
    }

    #[test]
    fn test_room_requests() {
        let req: CreateRoomRequest =
            serde_json::from_value(json!({ "room_number": "101", "room_type_id": 1 })).unwrap();
        assert_eq!(req.into_new_room().unwrap().status, RoomStatus::Available);

        let req: CreateRoomRequest = serde_json::from_value(
            json!({ "room_number": "101", "room_type_id": 1, "status": "Reserved" }),
        )
        .unwrap();
        assert!(req.into_new_room().is_err());

        let req: CreateRoomRequest =
            serde_json::from_value(json!({ "room_number": "12345678901", "room_type_id": 1 }))
                .unwrap();
        assert!(req.into_new_room().is_err());
    }

    #[test]
    fn test_room_type_price_not_negative() {
        let req: CreateRoomTypeRequest = serde_json::from_value(
            json!({ "name": "Suite", "base_price": "-1", "total_rooms": 2 }),
        )
        .unwrap();
        assert!(req.into_new_room_type().is_err());
    }

    #[test]
    fn test_confirm_accepts_gateway_alias() {
        let req: ConfirmPaymentRequest =
            serde_json::from_value(json!({ "reference": "PAY-ABC" })).unwrap();
        assert_eq!(req.payment_reference, "PAY-ABC");
        assert!(ensure_valid(&req).is_ok());
    }
}
