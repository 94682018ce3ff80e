//! # Room Catalog Administration
//!
//! Creating and editing room types and physical rooms. The rules kept here:
//! room numbers are unique, a room type never has more physical rooms than
//! its `total_rooms`, and a room held by a booking is neither deleted nor
//! moved to another type.

use crate::error::{BookingError, BookingResult};
use crate::room::{NewRoom, NewRoomType, Room, RoomStatus, RoomType};
use crate::store::StoreTx;
use rust_decimal::Decimal;
use tracing::info;

/// Partial update of a room type
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoomTypeChanges {
    pub name: Option<String>,
    /// `Some(None)` clears the description
    pub description: Option<Option<String>>,
    pub base_price: Option<Decimal>,
    pub total_rooms: Option<u32>,
    pub amenities: Option<Vec<String>>,
}

/// Partial update of a physical room
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoomChanges {
    pub room_number: Option<String>,
    pub room_type_id: Option<i64>,
    pub status: Option<RoomStatus>,
}

fn check_admin_status(status: RoomStatus) -> BookingResult<()> {
    if status.is_admin_settable() {
        Ok(())
    } else {
        Err(BookingError::Validation(format!(
            "room status {} is set by bookings only",
            status
        )))
    }
}

async fn check_room_number(
    tx: &mut dyn StoreTx,
    room_number: &str,
    except: Option<i64>,
) -> BookingResult<()> {
    if tx.room_number_taken(room_number, except).await? {
        return Err(BookingError::Validation(format!(
            "room_number: {} has already been taken",
            room_number
        )));
    }
    Ok(())
}

/// Error unless the type has room for one more physical room
async fn check_capacity(tx: &mut dyn StoreTx, room_type_id: i64) -> BookingResult<RoomType> {
    let room_type = tx
        .room_type(room_type_id)
        .await?
        .ok_or_else(|| BookingError::not_found("room type", room_type_id))?;
    let linked = tx.count_rooms_of_type(room_type_id).await?;
    if linked >= room_type.total_rooms {
        return Err(BookingError::Validation(format!(
            "room type {} already has its {} rooms",
            room_type.name, room_type.total_rooms
        )));
    }
    Ok(room_type)
}

pub async fn create_room_type(
    tx: &mut dyn StoreTx,
    room_type: NewRoomType,
) -> BookingResult<RoomType> {
    let created = tx.insert_room_type(room_type).await?;
    info!(room_type_id = created.id, name = %created.name, "room type created");
    Ok(created)
}

pub async fn update_room_type(
    tx: &mut dyn StoreTx,
    id: i64,
    changes: RoomTypeChanges,
) -> BookingResult<RoomType> {
    let mut room_type = tx
        .room_type(id)
        .await?
        .ok_or_else(|| BookingError::not_found("room type", id))?;

    if let Some(total_rooms) = changes.total_rooms {
        let linked = tx.count_rooms_of_type(id).await?;
        if total_rooms < linked {
            return Err(BookingError::Validation(format!(
                "total_rooms ({}) cannot be less than the {} rooms already linked to {}",
                total_rooms, linked, room_type.name
            )));
        }
        room_type.total_rooms = total_rooms;
    }
    if let Some(name) = changes.name {
        room_type.name = name;
    }
    if let Some(description) = changes.description {
        room_type.description = description;
    }
    if let Some(base_price) = changes.base_price {
        room_type.base_price = base_price;
    }
    if let Some(amenities) = changes.amenities {
        room_type.amenities = amenities;
    }

    tx.save_room_type(&room_type).await
}

pub async fn create_room(tx: &mut dyn StoreTx, room: NewRoom) -> BookingResult<Room> {
    check_admin_status(room.status)?;
    check_room_number(tx, &room.room_number, None).await?;
    check_capacity(tx, room.room_type_id).await?;

    let created = tx.insert_room(room).await?;
    info!(room_id = created.id, room_number = %created.room_number, "room created");
    Ok(created)
}

pub async fn update_room(
    tx: &mut dyn StoreTx,
    id: i64,
    changes: RoomChanges,
) -> BookingResult<Room> {
    let mut room = tx
        .lock_room(id)
        .await?
        .ok_or_else(|| BookingError::not_found("room", id))?;

    if let Some(number) = changes.room_number {
        if number != room.room_number {
            check_room_number(tx, &number, Some(id)).await?;
            room.room_number = number;
        }
    }
    if let Some(room_type_id) = changes.room_type_id {
        if room_type_id != room.room_type_id {
            if room.status.is_held() {
                return Err(BookingError::RoomUnavailable { room_id: id });
            }
            check_capacity(tx, room_type_id).await?;
            room.room_type_id = room_type_id;
        }
    }
    if let Some(status) = changes.status {
        if status != room.status {
            check_admin_status(status)?;
            room.status = status;
        }
    }

    tx.save_room(&room).await
}

pub async fn delete_room(tx: &mut dyn StoreTx, id: i64) -> BookingResult<()> {
    let room = tx
        .lock_room(id)
        .await?
        .ok_or_else(|| BookingError::not_found("room", id))?;
    if room.status.is_held() {
        return Err(BookingError::RoomUnavailable { room_id: id });
    }
    tx.delete_room(id).await?;
    info!(room_id = id, room_number = %room.room_number, "room deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::room::RoomCatalog;
    use crate::store::BookingStore;
    use rust_decimal_macros::dec;

    fn store() -> MemoryStore {
        MemoryStore::from_catalog(
            RoomCatalog::new()
                .with_room_type(RoomType::new(1, "Standard", dec!(70000), 2))
                .with_room_type(RoomType::new(2, "Executive", dec!(120000), 1))
                .with_room(Room::new(1, "101", 1))
                .with_room(Room::new(2, "102", 1).with_status(RoomStatus::Reserved)),
        )
        .unwrap()
    }

    fn new_room(number: &str, room_type_id: i64) -> NewRoom {
        NewRoom {
            room_number: number.into(),
            room_type_id,
            status: RoomStatus::Available,
        }
    }

    #[tokio::test]
    async fn test_create_room_respects_total_rooms() {
        let store = store();
        let mut tx = store.begin().await.unwrap();
        assert!(matches!(
            create_room(tx.as_mut(), new_room("103", 1)).await,
            Err(BookingError::Validation(_))
        ));
        let room = create_room(tx.as_mut(), new_room("201", 2)).await.unwrap();
        assert_eq!(room.id, 3);
        assert!(create_room(tx.as_mut(), new_room("202", 2)).await.is_err());
    }

    #[tokio::test]
    async fn test_room_number_is_unique() {
        let store = store();
        let mut tx = store.begin().await.unwrap();
        assert!(matches!(
            create_room(tx.as_mut(), new_room("101", 2)).await,
            Err(BookingError::Validation(_))
        ));
        let changes = RoomChanges {
            room_number: Some("102".into()),
            ..Default::default()
        };
        assert!(update_room(tx.as_mut(), 1, changes).await.is_err());
    }

    #[tokio::test]
    async fn test_admin_cannot_reserve_or_drop_held_rooms() {
        let store = store();
        let mut tx = store.begin().await.unwrap();
        let changes = RoomChanges {
            status: Some(RoomStatus::Reserved),
            ..Default::default()
        };
        assert!(matches!(
            update_room(tx.as_mut(), 1, changes).await,
            Err(BookingError::Validation(_))
        ));
        assert!(matches!(
            delete_room(tx.as_mut(), 2).await,
            Err(BookingError::RoomUnavailable { room_id: 2 })
        ));
        delete_room(tx.as_mut(), 1).await.unwrap();
    }

    #[tokio::test]
    async fn test_total_rooms_cannot_drop_below_linked_rooms() {
        let store = store();
        let mut tx = store.begin().await.unwrap();
        let changes = RoomTypeChanges {
            total_rooms: Some(1),
            ..Default::default()
        };
        assert!(update_room_type(tx.as_mut(), 1, changes).await.is_err());

        let changes = RoomTypeChanges {
            total_rooms: Some(4),
            base_price: Some(dec!(75000)),
            ..Default::default()
        };
        let updated = update_room_type(tx.as_mut(), 1, changes).await.unwrap();
        assert_eq!(updated.total_rooms, 4);
        assert_eq!(updated.base_price, dec!(75000));
    }
}
