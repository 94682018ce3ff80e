//! # In-Memory Store
//!
//! A `BookingStore` held entirely in process memory, used when no database
//! is configured and by the test suite.
//!
//! Transactions take an owned lock on the whole table set and work on a
//! private copy; `commit` swaps the copy in, dropping the transaction
//! throws it away. Only one transaction runs at a time, so two allocations
//! can never claim the same room.

use crate::booking::{Booking, BookingFilter, BookingPage, BookingStatus, NewBooking, StayDates};
use crate::error::{BookingError, BookingResult};
use crate::room::{NewRoom, NewRoomType, Room, RoomCatalog, RoomStatus, RoomType, RoomTypeSummary};
use crate::store::{BookingStore, RoomSelection, StoreTx};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rand::seq::SliceRandom;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Debug, Clone, Default)]
struct Tables {
    room_types: BTreeMap<i64, RoomType>,
    rooms: BTreeMap<i64, Room>,
    bookings: BTreeMap<i64, Booking>,
    last_room_type_id: i64,
    last_room_id: i64,
    last_booking_id: i64,
}

impl Tables {
    fn rooms_of_type(&self, room_type_id: i64) -> impl Iterator<Item = &Room> {
        self.rooms.values().filter(move |r| r.room_type_id == room_type_id)
    }

    fn summary(&self, room_type: &RoomType) -> RoomTypeSummary {
        RoomTypeSummary {
            room_type: room_type.clone(),
            rooms_count: self.rooms_of_type(room_type.id).count() as u32,
        }
    }

    fn matches(&self, booking: &Booking, filter: &BookingFilter) -> bool {
        if let Some(wanted) = filter.numeric_booking_id() {
            if wanted != Some(booking.id) {
                return false;
            }
        }
        if let Some(name) = &filter.name {
            if !contains_ignore_case(&booking.guest.name, name) {
                return false;
            }
        }
        if let Some(phone) = &filter.phone {
            if !booking.guest.phone.contains(phone.as_str()) {
                return false;
            }
        }
        if let Some(number) = &filter.room_number {
            let room = booking.room_id.and_then(|id| self.rooms.get(&id));
            if !room.map_or(false, |r| r.room_number.contains(number.as_str())) {
                return false;
            }
        }
        if let Some(type_name) = &filter.room_type {
            let room_type = self.room_types.get(&booking.room_type_id);
            if !room_type.map_or(false, |t| contains_ignore_case(&t.name, type_name)) {
                return false;
            }
        }
        if filter.status.map_or(false, |s| s != booking.status) {
            return false;
        }
        filter.matches_dates(&booking.dates)
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Pick up to `limit` rooms from `candidates` (already sorted by id)
fn select_rooms(mut candidates: Vec<Room>, limit: usize, selection: RoomSelection) -> Vec<Room> {
    if selection == RoomSelection::Random {
        candidates.shuffle(&mut rand::thread_rng());
    }
    candidates.truncate(limit);
    candidates
}

/// Process-local booking store
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store from a room catalog, checking its invariants
    pub fn from_catalog(catalog: RoomCatalog) -> BookingResult<Self> {
        let mut tables = Tables::default();

        for room_type in catalog.room_types {
            if tables.room_types.contains_key(&room_type.id) {
                return Err(BookingError::Configuration(format!(
                    "duplicate room type id {}",
                    room_type.id
                )));
            }
            tables.last_room_type_id = tables.last_room_type_id.max(room_type.id);
            tables.room_types.insert(room_type.id, room_type);
        }

        let mut numbers = HashSet::new();
        for room in catalog.rooms {
            if !tables.room_types.contains_key(&room.room_type_id) {
                return Err(BookingError::Configuration(format!(
                    "room {} references unknown room type {}",
                    room.room_number, room.room_type_id
                )));
            }
            if !numbers.insert(room.room_number.clone()) || tables.rooms.contains_key(&room.id) {
                return Err(BookingError::Configuration(format!(
                    "duplicate room {} (id {})",
                    room.room_number, room.id
                )));
            }
            tables.last_room_id = tables.last_room_id.max(room.id);
            tables.rooms.insert(room.id, room);
        }

        for room_type in tables.room_types.values() {
            let linked = tables.rooms_of_type(room_type.id).count() as u32;
            if linked > room_type.total_rooms {
                return Err(BookingError::Configuration(format!(
                    "room type {} lists {} rooms but total_rooms is {}",
                    room_type.name, linked, room_type.total_rooms
                )));
            }
        }

        Ok(Self {
            tables: Arc::new(Mutex::new(tables)),
        })
    }

    /// Load and seed from a TOML catalog file
    pub fn from_catalog_file(path: impl AsRef<std::path::Path>) -> BookingResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            BookingError::Configuration(format!("Cannot read {}: {}", path.display(), e))
        })?;
        Self::from_catalog(RoomCatalog::from_toml(&content)?)
    }
}

/// An open in-memory transaction
pub struct MemoryTx {
    guard: OwnedMutexGuard<Tables>,
    work: Tables,
}

impl MemoryTx {
    fn room_mut(&mut self, id: i64) -> BookingResult<&mut Room> {
        self.work
            .rooms
            .get_mut(&id)
            .ok_or_else(|| BookingError::not_found("room", id))
    }
}

#[async_trait]
impl StoreTx for MemoryTx {
    async fn room_type(&mut self, id: i64) -> BookingResult<Option<RoomType>> {
        Ok(self.work.room_types.get(&id).cloned())
    }

    async fn lock_available_rooms(
        &mut self,
        room_type_id: i64,
        limit: u32,
        selection: RoomSelection,
    ) -> BookingResult<Vec<Room>> {
        let candidates: Vec<Room> = self
            .work
            .rooms_of_type(room_type_id)
            .filter(|r| r.is_available())
            .cloned()
            .collect();
        Ok(select_rooms(candidates, limit as usize, selection))
    }

    async fn lock_room(&mut self, id: i64) -> BookingResult<Option<Room>> {
        Ok(self.work.rooms.get(&id).cloned())
    }

    async fn set_room_status(&mut self, id: i64, status: RoomStatus) -> BookingResult<Room> {
        let room = self.room_mut(id)?;
        room.status = status;
        Ok(room.clone())
    }

    async fn lock_booking(&mut self, id: i64) -> BookingResult<Option<Booking>> {
        Ok(self.work.bookings.get(&id).cloned())
    }

    async fn lock_booking_by_reference(
        &mut self,
        reference: &str,
    ) -> BookingResult<Option<Booking>> {
        Ok(self
            .work
            .bookings
            .values()
            .find(|b| b.payment_reference.as_deref() == Some(reference))
            .cloned())
    }

    async fn insert_booking(&mut self, booking: NewBooking) -> BookingResult<Booking> {
        self.work.last_booking_id += 1;
        let booking = booking.into_booking(self.work.last_booking_id, Utc::now());
        self.work.bookings.insert(booking.id, booking.clone());
        Ok(booking)
    }

    async fn save_booking(&mut self, booking: &Booking) -> BookingResult<Booking> {
        if let Some(reference) = &booking.payment_reference {
            let clash = self.work.bookings.values().any(|b| {
                b.id != booking.id && b.payment_reference.as_deref() == Some(reference.as_str())
            });
            if clash {
                return Err(BookingError::Storage(format!(
                    "payment reference {} is already in use",
                    reference
                )));
            }
        }
        let stored = self
            .work
            .bookings
            .get_mut(&booking.id)
            .ok_or_else(|| BookingError::not_found("booking", booking.id))?;
        *stored = booking.clone();
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }

    async fn count_rooms_of_type(&mut self, room_type_id: i64) -> BookingResult<u32> {
        Ok(self.work.rooms_of_type(room_type_id).count() as u32)
    }

    async fn room_number_taken(
        &mut self,
        room_number: &str,
        except: Option<i64>,
    ) -> BookingResult<bool> {
        Ok(self
            .work
            .rooms
            .values()
            .any(|r| r.room_number == room_number && Some(r.id) != except))
    }

    async fn insert_room(&mut self, room: NewRoom) -> BookingResult<Room> {
        self.work.last_room_id += 1;
        let room = Room::new(self.work.last_room_id, room.room_number, room.room_type_id)
            .with_status(room.status);
        self.work.rooms.insert(room.id, room.clone());
        Ok(room)
    }

    async fn save_room(&mut self, room: &Room) -> BookingResult<Room> {
        let stored = self.room_mut(room.id)?;
        *stored = room.clone();
        Ok(stored.clone())
    }

    async fn delete_room(&mut self, id: i64) -> BookingResult<()> {
        self.work
            .rooms
            .remove(&id)
            .ok_or_else(|| BookingError::not_found("room", id))?;
        for booking in self.work.bookings.values_mut() {
            if booking.room_id == Some(id) {
                booking.room_id = None;
            }
        }
        Ok(())
    }

    async fn insert_room_type(&mut self, room_type: NewRoomType) -> BookingResult<RoomType> {
        self.work.last_room_type_id += 1;
        let room_type = RoomType {
            id: self.work.last_room_type_id,
            name: room_type.name,
            description: room_type.description,
            base_price: room_type.base_price,
            total_rooms: room_type.total_rooms,
            amenities: room_type.amenities,
        };
        self.work.room_types.insert(room_type.id, room_type.clone());
        Ok(room_type)
    }

    async fn save_room_type(&mut self, room_type: &RoomType) -> BookingResult<RoomType> {
        let stored = self
            .work
            .room_types
            .get_mut(&room_type.id)
            .ok_or_else(|| BookingError::not_found("room type", room_type.id))?;
        *stored = room_type.clone();
        Ok(stored.clone())
    }

    async fn commit(self: Box<Self>) -> BookingResult<()> {
        let MemoryTx { mut guard, work } = *self;
        *guard = work;
        Ok(())
    }
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn begin(&self) -> BookingResult<Box<dyn StoreTx>> {
        let guard = self.tables.clone().lock_owned().await;
        let work = guard.clone();
        Ok(Box::new(MemoryTx { guard, work }))
    }

    async fn room_types(&self) -> BookingResult<Vec<RoomTypeSummary>> {
        let tables = self.tables.lock().await;
        Ok(tables.room_types.values().map(|t| tables.summary(t)).collect())
    }

    async fn room_type(&self, id: i64) -> BookingResult<Option<RoomType>> {
        Ok(self.tables.lock().await.room_types.get(&id).cloned())
    }

    async fn rooms(&self, room_type_id: Option<i64>) -> BookingResult<Vec<Room>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .rooms
            .values()
            .filter(|r| room_type_id.map_or(true, |id| r.room_type_id == id))
            .cloned()
            .collect())
    }

    async fn count_rooms_with_status(
        &self,
        room_type_id: i64,
        status: RoomStatus,
    ) -> BookingResult<u32> {
        let tables = self.tables.lock().await;
        Ok(tables
            .rooms_of_type(room_type_id)
            .filter(|r| r.status == status)
            .count() as u32)
    }

    async fn count_active_overlapping(
        &self,
        room_type_id: i64,
        dates: &StayDates,
    ) -> BookingResult<u32> {
        let tables = self.tables.lock().await;
        Ok(tables
            .bookings
            .values()
            .filter(|b| b.room_type_id == room_type_id && b.is_active() && b.dates.overlaps(dates))
            .count() as u32)
    }

    async fn booking(&self, id: i64) -> BookingResult<Option<Booking>> {
        Ok(self.tables.lock().await.bookings.get(&id).cloned())
    }

    async fn booking_by_reference(&self, reference: &str) -> BookingResult<Option<Booking>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .bookings
            .values()
            .find(|b| b.payment_reference.as_deref() == Some(reference))
            .cloned())
    }

    async fn list_bookings(&self, filter: &BookingFilter) -> BookingResult<BookingPage> {
        let tables = self.tables.lock().await;
        let matching: Vec<&Booking> = tables
            .bookings
            .values()
            .rev()
            .filter(|b| tables.matches(b, filter))
            .collect();

        let data = matching
            .iter()
            .skip(filter.offset() as usize)
            .take(BookingFilter::PAGE_SIZE as usize)
            .map(|b| (*b).clone())
            .collect();

        Ok(BookingPage {
            data,
            page: filter.page.unwrap_or(1).max(1),
            per_page: BookingFilter::PAGE_SIZE,
            total: matching.len() as u64,
        })
    }

    async fn overdue_confirmed(&self, today: NaiveDate) -> BookingResult<Vec<i64>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .bookings
            .values()
            .filter(|b| b.status == BookingStatus::Confirmed && b.dates.check_out < today)
            .map(|b| b.id)
            .collect())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::booking::GuestInfo;
    use rust_decimal_macros::dec;

    fn catalog() -> RoomCatalog {
        RoomCatalog::new()
            .with_room_type(RoomType::new(1, "Standard Room", dec!(70000), 3))
            .with_room(Room::new(1, "101", 1))
            .with_room(Room::new(2, "102", 1))
            .with_room(Room::new(3, "103", 1).with_status(RoomStatus::Dirty))
    }

    fn new_booking(room_id: i64) -> NewBooking {
        NewBooking {
            room_id: Some(room_id),
            room_type_id: 1,
            guest: GuestInfo::new("Ada", "ada@example.com", "0800"),
            dates: StayDates::new(
                NaiveDate::from_ymd_opt(2026, 1, 10).unwrap(),
                NaiveDate::from_ymd_opt(2026, 1, 12).unwrap(),
            )
            .unwrap(),
            amount: dec!(140000),
        }
    }

    #[test]
    fn test_catalog_rejects_overfull_room_type() {
        let catalog = RoomCatalog::new()
            .with_room_type(RoomType::new(1, "Suite", dec!(1), 1))
            .with_room(Room::new(1, "901", 1))
            .with_room(Room::new(2, "902", 1));
        assert!(matches!(
            MemoryStore::from_catalog(catalog),
            Err(BookingError::Configuration(_))
        ));
    }

    #[test]
    fn test_catalog_rejects_duplicate_room_number() {
        let catalog = RoomCatalog::new()
            .with_room_type(RoomType::new(1, "Suite", dec!(1), 2))
            .with_room(Room::new(1, "901", 1))
            .with_room(Room::new(2, "901", 1));
        assert!(MemoryStore::from_catalog(catalog).is_err());
    }

    #[tokio::test]
    async fn test_dropped_transaction_rolls_back() {
        let store = MemoryStore::from_catalog(catalog()).unwrap();

        let mut tx = store.begin().await.unwrap();
        tx.set_room_status(1, RoomStatus::Reserved).await.unwrap();
        tx.insert_booking(new_booking(1)).await.unwrap();
        drop(tx);

        assert_eq!(store.count_rooms_with_status(1, RoomStatus::Available).await.unwrap(), 2);
        assert!(store.booking(1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_commit_publishes_changes() {
        let store = MemoryStore::from_catalog(catalog()).unwrap();

        let mut tx = store.begin().await.unwrap();
        let rooms = tx
            .lock_available_rooms(1, 5, RoomSelection::LowestId)
            .await
            .unwrap();
        assert_eq!(rooms.iter().map(|r| r.id).collect::<Vec<_>>(), vec![1, 2]);
        tx.set_room_status(1, RoomStatus::Reserved).await.unwrap();
        let booking = tx.insert_booking(new_booking(1)).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(store.booking(booking.id).await.unwrap().unwrap().amount, dec!(140000));
        assert_eq!(store.count_rooms_with_status(1, RoomStatus::Reserved).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_random_selection_only_returns_available_rooms() {
        let store = MemoryStore::from_catalog(catalog()).unwrap();
        let mut tx = store.begin().await.unwrap();
        for _ in 0..10 {
            let rooms = tx.lock_available_rooms(1, 1, RoomSelection::Random).await.unwrap();
            assert_eq!(rooms.len(), 1);
            assert!(rooms[0].id == 1 || rooms[0].id == 2);
        }
    }

    #[tokio::test]
    async fn test_delete_room_unlinks_bookings() {
        let store = MemoryStore::from_catalog(catalog()).unwrap();
        let mut tx = store.begin().await.unwrap();
        let booking = tx.insert_booking(new_booking(3)).await.unwrap();
        tx.delete_room(3).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(store.booking(booking.id).await.unwrap().unwrap().room_id, None);
        assert_eq!(store.room_types().await.unwrap()[0].rooms_count, 2);
    }

    #[tokio::test]
    async fn test_list_bookings_newest_first_with_prefix_id() {
        let store = MemoryStore::from_catalog(catalog()).unwrap();
        let mut tx = store.begin().await.unwrap();
        tx.insert_booking(new_booking(1)).await.unwrap();
        tx.insert_booking(new_booking(2)).await.unwrap();
        tx.commit().await.unwrap();

        let page = store.list_bookings(&BookingFilter::default()).await.unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.data[0].id, 2);

        let filter = BookingFilter {
            booking_id: Some("CLH1".into()),
            room_type: Some("standard".into()),
            ..Default::default()
        };
        let page = store.list_bookings(&filter).await.unwrap();
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.data[0].id, 1);

        let filter = BookingFilter {
            room_number: Some("102".into()),
            ..Default::default()
        };
        assert_eq!(store.list_bookings(&filter).await.unwrap().data[0].room_id, Some(2));
    }
}
