use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "room_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RoomType {
    Single,
    Double,
    Twin,
    Suite,
    Family,
}

/// Coarse summary of a room for listings.
///
/// Never authoritative for date-level availability: that is always
/// recomputed from the reservation ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "room_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RoomStatus {
    Available,
    Reserved,
    Occupied,
    Maintenance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Room {
    pub id: Uuid,
    pub room_number: String,
    pub room_type: RoomType,
    pub capacity: i32,
    pub price_per_night: Decimal,
    pub amenities: Vec<String>,
    pub images: Vec<String>,
    pub status: RoomStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Administrator input for a new room.
#[derive(Debug, Clone, Deserialize)]
pub struct NewRoom {
    pub room_number: String,
    pub room_type: RoomType,
    pub capacity: i32,
    pub price_per_night: Decimal,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
}

/// Administrator edit of the static room facts. Status is not editable here.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoomChanges {
    pub room_number: Option<String>,
    pub room_type: Option<RoomType>,
    pub capacity: Option<i32>,
    pub price_per_night: Option<Decimal>,
    pub amenities: Option<Vec<String>>,
    pub images: Option<Vec<String>>,
}

/// Static filters applied before the reservation ledger is consulted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoomFilter {
    pub room_type: Option<RoomType>,
    pub min_capacity: Option<i32>,
}

impl RoomFilter {
    pub fn matches(&self, room: &Room) -> bool {
        self.room_type.map_or(true, |t| room.room_type == t)
            && self.min_capacity.map_or(true, |c| room.capacity >= c)
    }
}
