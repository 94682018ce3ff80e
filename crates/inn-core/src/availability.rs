//! # Availability Calculator
//!
//! `available = max(0, rooms_in_Available_status − overlapping_active_bookings)`
//!
//! The first term is a live snapshot of room flags and ignores dates; the
//! second counts pending/confirmed bookings whose stay overlaps the query
//! window. Mixing the two is an approximation: a room held by a booking that
//! does not overlap the window still lowers the figure. It is kept as is
//! because the published capacity numbers depend on it.

use crate::booking::StayDates;
use crate::error::{BookingError, BookingResult};
use crate::room::{RoomStatus, RoomType};
use crate::store::BookingStore;
use rust_decimal::Decimal;
use serde::Serialize;

/// Remaining capacity for one room type over one window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoomTypeAvailability {
    pub room_type_id: i64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub base_price: Decimal,
    pub amenities: Vec<String>,
    pub available_count: u32,
    pub period: StayDates,
}

/// Clamp the raw difference at zero
pub fn remaining(physically_available: u32, overlapping_active: u32) -> u32 {
    physically_available.saturating_sub(overlapping_active)
}

async fn for_room_type(
    store: &dyn BookingStore,
    room_type: RoomType,
    dates: &StayDates,
) -> BookingResult<RoomTypeAvailability> {
    let physical = store
        .count_rooms_with_status(room_type.id, RoomStatus::Available)
        .await?;
    let overlapping = store.count_active_overlapping(room_type.id, dates).await?;

    Ok(RoomTypeAvailability {
        room_type_id: room_type.id,
        name: room_type.name,
        description: room_type.description,
        base_price: room_type.base_price,
        amenities: room_type.amenities,
        available_count: remaining(physical, overlapping),
        period: *dates,
    })
}

/// Availability for a single room type; the entry is returned even when zero
pub async fn room_type_availability(
    store: &dyn BookingStore,
    room_type_id: i64,
    dates: &StayDates,
) -> BookingResult<RoomTypeAvailability> {
    let room_type = store
        .room_type(room_type_id)
        .await?
        .ok_or_else(|| BookingError::not_found("room type", room_type_id))?;
    for_room_type(store, room_type, dates).await
}

/// Catalog-wide listing; room types with nothing left are omitted
pub async fn catalog_availability(
    store: &dyn BookingStore,
    dates: &StayDates,
) -> BookingResult<Vec<RoomTypeAvailability>> {
    let mut listing = Vec::new();
    for summary in store.room_types().await? {
        let entry = for_room_type(store, summary.room_type, dates).await?;
        if entry.available_count > 0 {
            listing.push(entry);
        }
    }
    Ok(listing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::booking::{GuestInfo, NewBooking};
    use crate::memory::MemoryStore;
    use crate::room::{Room, RoomCatalog};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    async fn seed_booking(store: &MemoryStore, from: u32, to: u32) {
        let mut tx = store.begin().await.unwrap();
        tx.insert_booking(NewBooking {
            room_id: None,
            room_type_id: 1,
            guest: GuestInfo::new("G", "g@example.com", "1"),
            dates: StayDates::new(day(from), day(to)).unwrap(),
            amount: dec!(100),
        })
        .await
        .unwrap();
        tx.commit().await.unwrap();
    }

    fn store() -> MemoryStore {
        MemoryStore::from_catalog(
            RoomCatalog::new()
                .with_room_type(RoomType::new(1, "Deluxe", dec!(100), 2))
                .with_room_type(RoomType::new(2, "Suite", dec!(300), 1))
                .with_room(Room::new(1, "301", 1))
                .with_room(Room::new(2, "302", 1))
                .with_room(Room::new(3, "401", 2).with_status(RoomStatus::UnderMaintenance)),
        )
        .unwrap()
    }

    #[test]
    fn test_remaining_clamps_at_zero() {
        assert_eq!(remaining(2, 5), 0);
        assert_eq!(remaining(3, 1), 2);
    }

    #[tokio::test]
    async fn test_overlap_is_half_open() {
        let store = store();
        seed_booking(&store, 10, 12).await;
        let window = StayDates::new(day(12), day(14)).unwrap();

        let entry = room_type_availability(&store, 1, &window).await.unwrap();
        assert_eq!(entry.available_count, 2);

        let window = StayDates::new(day(11), day(13)).unwrap();
        let entry = room_type_availability(&store, 1, &window).await.unwrap();
        assert_eq!(entry.available_count, 1);
    }

    #[tokio::test]
    async fn test_overbooked_window_reports_zero() {
        let store = store();
        for _ in 0..4 {
            seed_booking(&store, 10, 12).await;
        }
        let window = StayDates::new(day(10), day(11)).unwrap();
        let entry = room_type_availability(&store, 1, &window).await.unwrap();
        assert_eq!(entry.available_count, 0);
        assert_eq!(entry.period, window);
    }

    #[tokio::test]
    async fn test_catalog_listing_skips_sold_out_types() {
        let store = store();
        let window = StayDates::single_night(day(20));
        let listing = catalog_availability(&store, &window).await.unwrap();
        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0].name, "Deluxe");

        assert!(matches!(
            room_type_availability(&store, 99, &window).await,
            Err(BookingError::NotFound { .. })
        ));
    }
}
