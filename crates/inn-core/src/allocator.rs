//! # Inventory Allocator
//!
//! Turns "N rooms of type T for these dates" into N reserved physical rooms
//! and N pending bookings, or nothing at all.
//!
//! Rooms are claimed by their current status flag (`Available`), not by
//! date overlap; date-level capacity is the Availability Calculator's job.
//! Everything runs in the caller's transaction: the rooms are locked by
//! `lock_available_rooms`, so two concurrent allocations cannot both claim
//! one room, and an early return leaves the store untouched once the
//! transaction is dropped.

use crate::booking::{Booking, GuestInfo, NewBooking, StayDates};
use crate::error::{BookingError, BookingResult};
use crate::pricing::{self, Quote};
use crate::room::{AssignedRoom, RoomStatus, RoomType};
use crate::store::{RoomSelection, StoreTx};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info};

/// Most rooms a single request may reserve
pub const MAX_ROOMS_PER_REQUEST: u32 = 10;

/// A validated request for rooms of one type
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationRequest {
    pub room_type_id: i64,
    pub dates: StayDates,
    pub guest: GuestInfo,
    pub room_count: u32,
}

/// Bookings and rooms produced by a successful allocation
#[derive(Debug, Clone, Serialize)]
pub struct Allocation {
    pub bookings: Vec<Booking>,
    pub assigned_rooms: Vec<AssignedRoom>,
    pub quote: Quote,
    #[serde(skip)]
    pub room_type: RoomType,
}

impl Allocation {
    pub fn total_amount(&self) -> Decimal {
        self.quote.total
    }
}

/// Reserve `request.room_count` rooms inside `tx`
pub async fn allocate(
    tx: &mut dyn StoreTx,
    request: AllocationRequest,
    selection: RoomSelection,
) -> BookingResult<Allocation> {
    let requested = request.room_count;
    if !(1..=MAX_ROOMS_PER_REQUEST).contains(&requested) {
        return Err(BookingError::Validation(format!(
            "number_of_rooms must be between 1 and {}",
            MAX_ROOMS_PER_REQUEST
        )));
    }

    let room_type = tx
        .room_type(request.room_type_id)
        .await?
        .ok_or_else(|| BookingError::not_found("room type", request.room_type_id))?;

    let rooms = tx
        .lock_available_rooms(room_type.id, requested, selection)
        .await?;
    debug!(
        room_type_id = room_type.id,
        requested,
        found = rooms.len(),
        "available rooms locked"
    );

    if (rooms.len() as u32) < requested {
        return Err(BookingError::InsufficientInventory {
            requested,
            available: rooms.len() as u32,
        });
    }

    let quote = pricing::quote(room_type.base_price, &request.dates, requested);

    let mut bookings = Vec::with_capacity(rooms.len());
    let mut assigned_rooms = Vec::with_capacity(rooms.len());
    for room in rooms {
        let booking = tx
            .insert_booking(NewBooking {
                room_id: Some(room.id),
                room_type_id: room_type.id,
                guest: request.guest.clone(),
                dates: request.dates,
                amount: quote.per_room,
            })
            .await?;
        let room = tx.set_room_status(room.id, RoomStatus::Reserved).await?;

        info!(
            booking_id = booking.id,
            room_id = room.id,
            room_number = %room.room_number,
            "room reserved"
        );
        assigned_rooms.push(AssignedRoom::from(&room));
        bookings.push(booking);
    }

    info!(
        room_type = %room_type.name,
        rooms = requested,
        nights = quote.nights,
        total = %quote.total,
        "allocation complete"
    );

    Ok(Allocation {
        bookings,
        assigned_rooms,
        quote,
        room_type,
    })
}
