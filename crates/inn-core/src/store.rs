//! # Storage Traits
//!
//! The booking core talks to persistence through two seams:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                  BookingStore (trait)                        │
//! │  ├── begin() ──────────▶ StoreTx (one atomic transaction)    │
//! │  ├── counts for the Availability Calculator                  │
//! │  └── read-only booking / catalog queries                     │
//! └──────────────────────────────────────────────────────────────┘
//!                            ▲
//!              ┌─────────────┴─────────────┐
//!      ┌───────┴───────┐           ┌───────┴───────┐
//!      │  MemoryStore  │           │   PgStore     │
//!      │ (this crate)  │           │ (inn-postgres)│
//!      └───────────────┘           └───────────────┘
//! ```
//!
//! `lock_*` methods must exclude concurrent transactions from the returned
//! rows until commit or drop (`SELECT ... FOR UPDATE` or equivalent).
//! Dropping a `StoreTx` without calling `commit` rolls it back.

use crate::booking::{Booking, BookingFilter, BookingPage, NewBooking, StayDates};
use crate::error::BookingResult;
use crate::room::{NewRoom, NewRoomType, Room, RoomStatus, RoomType, RoomTypeSummary};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Order in which the allocator claims free rooms of a type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomSelection {
    /// Deterministic: lowest room id first
    #[default]
    LowestId,
    /// Uniformly random among free rooms
    Random,
}

impl RoomSelection {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "lowest_id" | "lowest-id" => Some(RoomSelection::LowestId),
            "random" => Some(RoomSelection::Random),
            _ => None,
        }
    }
}

/// One open transaction against the booking store
#[async_trait]
pub trait StoreTx: Send {
    async fn room_type(&mut self, id: i64) -> BookingResult<Option<RoomType>>;

    /// Lock up to `limit` rooms of the type that are currently `Available`
    async fn lock_available_rooms(
        &mut self,
        room_type_id: i64,
        limit: u32,
        selection: RoomSelection,
    ) -> BookingResult<Vec<Room>>;

    async fn lock_room(&mut self, id: i64) -> BookingResult<Option<Room>>;

    async fn set_room_status(&mut self, id: i64, status: RoomStatus) -> BookingResult<Room>;

    async fn lock_booking(&mut self, id: i64) -> BookingResult<Option<Booking>>;

    async fn lock_booking_by_reference(
        &mut self,
        reference: &str,
    ) -> BookingResult<Option<Booking>>;

    async fn insert_booking(&mut self, booking: NewBooking) -> BookingResult<Booking>;

    /// Persist every mutable field of `booking` and bump `updated_at`
    async fn save_booking(&mut self, booking: &Booking) -> BookingResult<Booking>;

    async fn count_rooms_of_type(&mut self, room_type_id: i64) -> BookingResult<u32>;

    async fn room_number_taken(
        &mut self,
        room_number: &str,
        except: Option<i64>,
    ) -> BookingResult<bool>;

    async fn insert_room(&mut self, room: NewRoom) -> BookingResult<Room>;

    async fn save_room(&mut self, room: &Room) -> BookingResult<Room>;

    /// Delete a room; bookings that referenced it lose their room link
    async fn delete_room(&mut self, id: i64) -> BookingResult<()>;

    async fn insert_room_type(&mut self, room_type: NewRoomType) -> BookingResult<RoomType>;

    async fn save_room_type(&mut self, room_type: &RoomType) -> BookingResult<RoomType>;

    async fn commit(self: Box<Self>) -> BookingResult<()>;
}

/// Shared relational store holding rooms, room types and bookings
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Open a transaction
    async fn begin(&self) -> BookingResult<Box<dyn StoreTx>>;

    async fn room_types(&self) -> BookingResult<Vec<RoomTypeSummary>>;

    async fn room_type(&self, id: i64) -> BookingResult<Option<RoomType>>;

    async fn rooms(&self, room_type_id: Option<i64>) -> BookingResult<Vec<Room>>;

    /// Snapshot count of rooms of a type in `status` (not date-aware)
    async fn count_rooms_with_status(
        &self,
        room_type_id: i64,
        status: RoomStatus,
    ) -> BookingResult<u32>;

    /// Pending or confirmed bookings of a type whose stay overlaps `dates`
    async fn count_active_overlapping(
        &self,
        room_type_id: i64,
        dates: &StayDates,
    ) -> BookingResult<u32>;

    async fn booking(&self, id: i64) -> BookingResult<Option<Booking>>;

    async fn booking_by_reference(&self, reference: &str) -> BookingResult<Option<Booking>>;

    async fn list_bookings(&self, filter: &BookingFilter) -> BookingResult<BookingPage>;

    /// Ids of confirmed bookings whose check-out date is strictly before `today`
    async fn overdue_confirmed(&self, today: NaiveDate) -> BookingResult<Vec<i64>>;

    /// Backend name (for logging)
    fn backend_name(&self) -> &'static str;
}

/// Type alias for a shared store (dynamic dispatch)
pub type SharedStore = Arc<dyn BookingStore>;
