//! # Booking Types
//!
//! A booking is one guest's reservation of one room for a date range.
//! Multi-room requests produce several bookings sharing guest identity and dates.

use crate::error::{BookingError, BookingResult};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Lifecycle status of a booking
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BookingStatus {
    /// Created, room provisionally reserved, awaiting payment
    #[default]
    Pending,
    /// Paid or confirmed by staff, room occupied
    Confirmed,
    /// Terminal: room released
    Cancelled,
    /// Terminal: guest left, room released
    CheckedOut,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::CheckedOut => "checked-out",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(BookingStatus::Pending),
            "confirmed" => Some(BookingStatus::Confirmed),
            "cancelled" => Some(BookingStatus::Cancelled),
            "checked-out" => Some(BookingStatus::CheckedOut),
            _ => None,
        }
    }

    /// Pending and confirmed bookings count against capacity
    pub fn is_active(&self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Confirmed)
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_active()
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Half-open stay interval `[check_in, check_out)` at day granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StayDates {
    #[serde(rename = "check_in_date")]
    pub check_in: NaiveDate,
    #[serde(rename = "check_out_date")]
    pub check_out: NaiveDate,
}

impl StayDates {
    /// Build a stay; check-out must fall strictly after check-in.
    pub fn new(check_in: NaiveDate, check_out: NaiveDate) -> BookingResult<Self> {
        if check_out <= check_in {
            return Err(BookingError::Validation(format!(
                "check_out_date ({}) must be after check_in_date ({})",
                check_out, check_in
            )));
        }
        Ok(Self {
            check_in,
            check_out,
        })
    }

    /// The one-night window starting on `day`
    pub fn single_night(day: NaiveDate) -> Self {
        Self {
            check_in: day,
            check_out: day.succ_opt().unwrap_or(NaiveDate::MAX),
        }
    }

    /// Whole nights in the stay (always >= 1)
    pub fn nights(&self) -> u32 {
        (self.check_out - self.check_in).num_days().max(0) as u32
    }

    /// Half-open overlap: `a.in < b.out && a.out > b.in`
    pub fn overlaps(&self, other: &StayDates) -> bool {
        self.check_in < other.check_out && self.check_out > other.check_in
    }
}

/// Guest identity shared by every booking of a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestInfo {
    #[serde(rename = "guest_name")]
    pub name: String,
    #[serde(rename = "guest_email")]
    pub email: String,
    #[serde(rename = "guest_phone")]
    pub phone: String,
}

impl GuestInfo {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        phone: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            phone: phone.into(),
        }
    }
}

/// A guest's reservation of one room
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: i64,

    /// Assigned physical room, if any
    pub room_id: Option<i64>,

    pub room_type_id: i64,

    #[serde(flatten)]
    pub guest: GuestInfo,

    #[serde(flatten)]
    pub dates: StayDates,

    pub status: BookingStatus,

    /// Idempotency key of the latest payment attempt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_reference: Option<String>,

    /// Price of this one room for the whole stay
    pub amount: Decimal,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn nights(&self) -> u32 {
        self.dates.nights()
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

/// A booking row that has not been persisted yet
#[derive(Debug, Clone, PartialEq)]
pub struct NewBooking {
    pub room_id: Option<i64>,
    pub room_type_id: i64,
    pub guest: GuestInfo,
    pub dates: StayDates,
    pub amount: Decimal,
}

impl NewBooking {
    /// Materialize with a store-assigned id. New bookings always start `pending`.
    pub fn into_booking(self, id: i64, now: DateTime<Utc>) -> Booking {
        Booking {
            id,
            room_id: self.room_id,
            room_type_id: self.room_type_id,
            guest: self.guest,
            dates: self.dates,
            status: BookingStatus::Pending,
            payment_reference: None,
            amount: self.amount,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Search filter for the admin booking list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingFilter {
    /// Case-insensitive substring of the guest name
    #[serde(default)]
    pub name: Option<String>,
    /// Substring of the guest phone
    #[serde(default)]
    pub phone: Option<String>,
    /// Booking id, optionally carrying an alphabetic prefix (e.g. "NLA123")
    #[serde(default)]
    pub booking_id: Option<String>,
    /// Substring of the assigned room number
    #[serde(default)]
    pub room_number: Option<String>,
    /// Case-insensitive substring of the room type name
    #[serde(default)]
    pub room_type: Option<String>,
    #[serde(default)]
    pub status: Option<BookingStatus>,
    #[serde(default)]
    pub check_in_date: Option<NaiveDate>,
    #[serde(default)]
    pub check_out_date: Option<NaiveDate>,
    /// Only bookings ending after this day
    #[serde(default)]
    pub check_in_from: Option<NaiveDate>,
    /// Only bookings starting before this day
    #[serde(default)]
    pub check_out_to: Option<NaiveDate>,
    /// 1-based page number
    #[serde(default)]
    pub page: Option<u32>,
}

impl BookingFilter {
    pub const PAGE_SIZE: u32 = 20;

    /// Numeric id from `booking_id`, with any leading letters stripped.
    /// `Some(None)` means a filter was given but cannot match anything.
    pub fn numeric_booking_id(&self) -> Option<Option<i64>> {
        self.booking_id.as_ref().map(|raw| {
            raw.trim()
                .trim_start_matches(|c: char| c.is_ascii_alphabetic())
                .parse()
                .ok()
        })
    }

    pub fn offset(&self) -> u32 {
        self.page.unwrap_or(1).max(1).saturating_sub(1) * Self::PAGE_SIZE
    }

    /// Date-only predicates; name/room joins are applied by the store
    pub fn matches_dates(&self, dates: &StayDates) -> bool {
        self.check_in_date.map_or(true, |d| dates.check_in == d)
            && self.check_out_date.map_or(true, |d| dates.check_out == d)
            && self.check_in_from.map_or(true, |d| dates.check_out > d)
            && self.check_out_to.map_or(true, |d| dates.check_in < d)
    }
}

/// One page of bookings
#[derive(Debug, Clone, Serialize)]
pub struct BookingPage {
    pub data: Vec<Booking>,
    pub page: u32,
    pub per_page: u32,
    pub total: u64,
}
