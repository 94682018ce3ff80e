//! # Room Types
//!
//! Room categories and the physical rooms that belong to them.
//! A room's `status` is owned by the room catalog but mutated by the booking lifecycle.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Status of a physical room
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoomStatus {
    /// Free to be claimed by an allocation
    #[default]
    Available,
    /// Held for a confirmed (paid) booking
    Occupied,
    /// Held for a pending (unpaid) booking
    Reserved,
    /// Out of service
    #[serde(rename = "Under Maintenance")]
    UnderMaintenance,
    /// Awaiting housekeeping
    Dirty,
}

impl RoomStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomStatus::Available => "Available",
            RoomStatus::Occupied => "Occupied",
            RoomStatus::Reserved => "Reserved",
            RoomStatus::UnderMaintenance => "Under Maintenance",
            RoomStatus::Dirty => "Dirty",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Available" => Some(RoomStatus::Available),
            "Occupied" => Some(RoomStatus::Occupied),
            "Reserved" => Some(RoomStatus::Reserved),
            "Under Maintenance" => Some(RoomStatus::UnderMaintenance),
            "Dirty" => Some(RoomStatus::Dirty),
            _ => None,
        }
    }

    /// True when the room is held by an active booking
    pub fn is_held(&self) -> bool {
        matches!(self, RoomStatus::Reserved | RoomStatus::Occupied)
    }

    /// Statuses an administrator may set directly. `Reserved` is only ever
    /// set by the allocator.
    pub fn is_admin_settable(&self) -> bool {
        !matches!(self, RoomStatus::Reserved)
    }
}

impl std::fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A category of room with a shared price and amenity set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomType {
    pub id: i64,

    /// Display name (e.g., "Standard Room")
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Nightly rate
    pub base_price: Decimal,

    /// Upper bound on the number of physical rooms of this type
    pub total_rooms: u32,

    #[serde(default)]
    pub amenities: Vec<String>,
}

impl RoomType {
    pub fn new(id: i64, name: impl Into<String>, base_price: Decimal, total_rooms: u32) -> Self {
        Self {
            id,
            name: name.into(),
            description: None,
            base_price,
            total_rooms,
            amenities: Vec::new(),
        }
    }

    /// Builder: set description
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// Builder: add an amenity
    pub fn with_amenity(mut self, amenity: impl Into<String>) -> Self {
        self.amenities.push(amenity.into());
        self
    }
}

/// A specific physical unit belonging to a RoomType
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: i64,

    /// Unique, human-facing number (e.g., "101")
    pub room_number: String,

    pub room_type_id: i64,

    #[serde(default)]
    pub status: RoomStatus,
}

impl Room {
    pub fn new(id: i64, room_number: impl Into<String>, room_type_id: i64) -> Self {
        Self {
            id,
            room_number: room_number.into(),
            room_type_id,
            status: RoomStatus::Available,
        }
    }

    pub fn with_status(mut self, status: RoomStatus) -> Self {
        self.status = status;
        self
    }

    pub fn is_available(&self) -> bool {
        self.status == RoomStatus::Available
    }
}

/// A physical room that has not been persisted yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRoom {
    pub room_number: String,
    pub room_type_id: i64,
    pub status: RoomStatus,
}

/// A room type that has not been persisted yet
#[derive(Debug, Clone, PartialEq)]
pub struct NewRoomType {
    pub name: String,
    pub description: Option<String>,
    pub base_price: Decimal,
    pub total_rooms: u32,
    pub amenities: Vec<String>,
}

/// Compact view of a room handed back to guests and notifications
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignedRoom {
    pub id: i64,
    pub room_number: String,
    pub status: RoomStatus,
}

impl From<&Room> for AssignedRoom {
    fn from(room: &Room) -> Self {
        Self {
            id: room.id,
            room_number: room.room_number.clone(),
            status: room.status,
        }
    }
}

/// A room type together with how many physical rooms it currently has
#[derive(Debug, Clone, Serialize)]
pub struct RoomTypeSummary {
    #[serde(flatten)]
    pub room_type: RoomType,
    pub rooms_count: u32,
}

/// Seed data for bootstrapping a store, loaded from `config/rooms.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoomCatalog {
    #[serde(default)]
    pub room_types: Vec<RoomType>,
    #[serde(default)]
    pub rooms: Vec<Room>,
}

impl RoomCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a catalog from TOML text
    pub fn from_toml(content: &str) -> crate::BookingResult<Self> {
        toml::from_str(content)
            .map_err(|e| crate::BookingError::Configuration(format!("Invalid room catalog: {}", e)))
    }

    pub fn with_room_type(mut self, room_type: RoomType) -> Self {
        self.room_types.push(room_type);
        self
    }

    pub fn with_room(mut self, room: Room) -> Self {
        self.rooms.push(room);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_room_status_wire_names() {
        let json = serde_json::to_string(&RoomStatus::UnderMaintenance).unwrap();
        assert_eq!(json, "\"Under Maintenance\"");
        assert_eq!(RoomStatus::parse("Under Maintenance"), Some(RoomStatus::UnderMaintenance));
        assert_eq!(RoomStatus::parse("Vacant"), None);
    }

    #[test]
    fn test_held_statuses() {
        assert!(RoomStatus::Reserved.is_held());
        assert!(RoomStatus::Occupied.is_held());
        assert!(!RoomStatus::Dirty.is_held());
        assert!(!RoomStatus::Reserved.is_admin_settable());
    }

    #[test]
    fn test_catalog_from_toml() {
        let catalog = RoomCatalog::from_toml(
            r#"
            [[room_types]]
            id = 2
            name = "Standard Room"
            base_price = 70000
            total_rooms = 3
            amenities = ["wifi"]

            [[rooms]]
            id = 1
            room_number = "201"
            room_type_id = 2

            [[rooms]]
            id = 2
            room_number = "202"
            room_type_id = 2
            status = "Dirty"
            "#,
        )
        .unwrap();

        assert_eq!(catalog.room_types[0].base_price, dec!(70000));
        assert_eq!(catalog.rooms.len(), 2);
        assert_eq!(catalog.rooms[0].status, RoomStatus::Available);
        assert_eq!(catalog.rooms[1].status, RoomStatus::Dirty);
    }
}
