//! # Row Mapping
//!
//! `sqlx::FromRow` shapes of the three tables and their conversion into
//! core types. Statuses are stored as their wire names.

use chrono::{DateTime, NaiveDate, Utc};
use inn_core::{
    Booking, BookingError, BookingResult, BookingStatus, GuestInfo, Room, RoomStatus, RoomType,
    RoomTypeSummary, StayDates,
};
use rust_decimal::Decimal;
use sqlx::FromRow;

pub(crate) const ROOM_TYPE_COLUMNS: &str =
    "id, name, description, base_price, total_rooms, amenities";

pub(crate) const ROOM_COLUMNS: &str = "id, room_number, room_type_id, status";

pub(crate) const BOOKING_COLUMNS: &str = "id, room_id, room_type_id, guest_name, guest_email, \
     guest_phone, check_in_date, check_out_date, status, payment_reference, amount, \
     created_at, updated_at";

#[derive(Debug, Clone, FromRow)]
pub(crate) struct RoomTypeRow {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub base_price: Decimal,
    pub total_rooms: i32,
    pub amenities: Vec<String>,
}

impl From<RoomTypeRow> for RoomType {
    fn from(row: RoomTypeRow) -> Self {
        RoomType {
            id: row.id,
            name: row.name,
            description: row.description,
            base_price: row.base_price,
            total_rooms: row.total_rooms.max(0) as u32,
            amenities: row.amenities,
        }
    }
}

/// Room type plus the count of its physical rooms
#[derive(Debug, Clone, FromRow)]
pub(crate) struct RoomTypeSummaryRow {
    #[sqlx(flatten)]
    pub room_type: RoomTypeRow,
    pub rooms_count: i64,
}

impl From<RoomTypeSummaryRow> for RoomTypeSummary {
    fn from(row: RoomTypeSummaryRow) -> Self {
        RoomTypeSummary {
            room_type: row.room_type.into(),
            rooms_count: row.rooms_count.max(0) as u32,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct RoomRow {
    pub id: i64,
    pub room_number: String,
    pub room_type_id: i64,
    pub status: String,
}

impl TryFrom<RoomRow> for Room {
    type Error = BookingError;

    fn try_from(row: RoomRow) -> BookingResult<Self> {
        let status = RoomStatus::parse(&row.status).ok_or_else(|| {
            BookingError::Storage(format!("room {} has unknown status {:?}", row.id, row.status))
        })?;
        Ok(Room::new(row.id, row.room_number, row.room_type_id).with_status(status))
    }
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct BookingRow {
    pub id: i64,
    pub room_id: Option<i64>,
    pub room_type_id: i64,
    pub guest_name: String,
    pub guest_email: String,
    pub guest_phone: String,
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
    pub status: String,
    pub payment_reference: Option<String>,
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = BookingError;

    fn try_from(row: BookingRow) -> BookingResult<Self> {
        let status = BookingStatus::parse(&row.status).ok_or_else(|| {
            BookingError::Storage(format!("booking {} has unknown status {:?}", row.id, row.status))
        })?;
        // The table's CHECK constraint keeps check_out after check_in
        let dates = StayDates::new(row.check_in_date, row.check_out_date)
            .map_err(|e| BookingError::Storage(format!("booking {}: {}", row.id, e)))?;

        Ok(Booking {
            id: row.id,
            room_id: row.room_id,
            room_type_id: row.room_type_id,
            guest: GuestInfo::new(row.guest_name, row.guest_email, row.guest_phone),
            dates,
            status,
            payment_reference: row.payment_reference,
            amount: row.amount,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

pub(crate) fn rooms(rows: Vec<RoomRow>) -> BookingResult<Vec<Room>> {
    rows.into_iter().map(Room::try_from).collect()
}

pub(crate) fn bookings(rows: Vec<BookingRow>) -> BookingResult<Vec<Booking>> {
    rows.into_iter().map(Booking::try_from).collect()
}

/// `u32` counts and limits travel as Postgres `INTEGER`
pub(crate) fn to_db_int(value: u32, what: &str) -> BookingResult<i32> {
    i32::try_from(value)
        .map_err(|_| BookingError::Validation(format!("{} is too large: {}", what, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn booking_row(status: &str) -> BookingRow {
        BookingRow {
            id: 9,
            room_id: Some(3),
            room_type_id: 2,
            guest_name: "Ada".into(),
            guest_email: "ada@example.com".into(),
            guest_phone: "0800".into(),
            check_in_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            check_out_date: NaiveDate::from_ymd_opt(2026, 3, 3).unwrap(),
            status: status.into(),
            payment_reference: None,
            amount: dec!(140000.00),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_booking_row_maps_status_and_dates() {
        let booking = Booking::try_from(booking_row("checked-out")).unwrap();
        assert_eq!(booking.status, BookingStatus::CheckedOut);
        assert_eq!(booking.nights(), 2);
        assert_eq!(booking.guest.email, "ada@example.com");
    }

    #[test]
    fn test_unknown_status_is_storage_error() {
        let err = Booking::try_from(booking_row("archived")).unwrap_err();
        assert!(matches!(err, BookingError::Storage(_)));

        let room = RoomRow {
            id: 1,
            room_number: "101".into(),
            room_type_id: 1,
            status: "Vacant".into(),
        };
        assert!(Room::try_from(room).is_err());
    }

    #[test]
    fn test_room_status_with_space() {
        let room = Room::try_from(RoomRow {
            id: 1,
            room_number: "101".into(),
            room_type_id: 1,
            status: "Under Maintenance".into(),
        })
        .unwrap();
        assert_eq!(room.status, RoomStatus::UnderMaintenance);
    }

    #[test]
    fn test_summary_row_and_int_bounds() {
        let summary = RoomTypeSummary::from(RoomTypeSummaryRow {
            room_type: RoomTypeRow {
                id: 1,
                name: "Standard Room".into(),
                description: None,
                base_price: dec!(70000),
                total_rooms: 3,
                amenities: vec!["wifi".into()],
            },
            rooms_count: 2,
        });
        assert_eq!(summary.rooms_count, 2);
        assert_eq!(summary.room_type.total_rooms, 3);
        assert!(to_db_int(u32::MAX, "limit").is_err());
    }
}
