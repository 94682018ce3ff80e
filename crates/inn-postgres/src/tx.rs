//! # Postgres Transactions
//!
//! `StoreTx` over one `sqlx` transaction. Row locks taken by the `lock_*`
//! methods are held until `commit`; dropping a `PgTx` rolls it back.

use crate::db_error;
use crate::rows::{
    self, BookingRow, RoomRow, RoomTypeRow, BOOKING_COLUMNS, ROOM_COLUMNS, ROOM_TYPE_COLUMNS,
};
use async_trait::async_trait;
use inn_core::{
    Booking, BookingError, BookingResult, NewBooking, NewRoom, NewRoomType, Room, RoomSelection,
    RoomStatus, RoomType, StoreTx,
};
use sqlx::{Postgres, Transaction};
use tracing::debug;

pub struct PgTx {
    tx: Transaction<'static, Postgres>,
}

impl PgTx {
    pub(crate) fn new(tx: Transaction<'static, Postgres>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl StoreTx for PgTx {
    async fn room_type(&mut self, id: i64) -> BookingResult<Option<RoomType>> {
        let sql = format!("SELECT {} FROM room_types WHERE id = $1", ROOM_TYPE_COLUMNS);
        let row: Option<RoomTypeRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(db_error)?;
        Ok(row.map(RoomType::from))
    }

    async fn lock_available_rooms(
        &mut self,
        room_type_id: i64,
        limit: u32,
        selection: RoomSelection,
    ) -> BookingResult<Vec<Room>> {
        // Rooms another allocation is claiming are skipped, never waited on
        let order = match selection {
            RoomSelection::LowestId => "id",
            RoomSelection::Random => "random()",
        };
        let sql = format!(
            "SELECT {} FROM rooms WHERE room_type_id = $1 AND status = $2 \
             ORDER BY {} LIMIT $3 FOR UPDATE SKIP LOCKED",
            ROOM_COLUMNS, order
        );
        let found: Vec<RoomRow> = sqlx::query_as(&sql)
            .bind(room_type_id)
            .bind(RoomStatus::Available.as_str())
            .bind(i64::from(limit))
            .fetch_all(&mut *self.tx)
            .await
            .map_err(db_error)?;

        debug!(room_type_id, limit, locked = found.len(), "locked available rooms");
        rows::rooms(found)
    }

    async fn lock_room(&mut self, id: i64) -> BookingResult<Option<Room>> {
        let sql = format!("SELECT {} FROM rooms WHERE id = $1 FOR UPDATE", ROOM_COLUMNS);
        let row: Option<RoomRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(db_error)?;
        row.map(Room::try_from).transpose()
    }

    async fn set_room_status(&mut self, id: i64, status: RoomStatus) -> BookingResult<Room> {
        let sql = format!("UPDATE rooms SET status = $2 WHERE id = $1 RETURNING {}", ROOM_COLUMNS);
        let row: Option<RoomRow> = sqlx::query_as(&sql)
            .bind(id)
            .bind(status.as_str())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(db_error)?;
        row.ok_or_else(|| BookingError::not_found("room", id))?
            .try_into()
    }

    async fn lock_booking(&mut self, id: i64) -> BookingResult<Option<Booking>> {
        let sql = format!("SELECT {} FROM bookings WHERE id = $1 FOR UPDATE", BOOKING_COLUMNS);
        let row: Option<BookingRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(db_error)?;
        row.map(Booking::try_from).transpose()
    }

    async fn lock_booking_by_reference(
        &mut self,
        reference: &str,
    ) -> BookingResult<Option<Booking>> {
        let sql = format!(
            "SELECT {} FROM bookings WHERE payment_reference = $1 FOR UPDATE",
            BOOKING_COLUMNS
        );
        let row: Option<BookingRow> = sqlx::query_as(&sql)
            .bind(reference)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(db_error)?;
        row.map(Booking::try_from).transpose()
    }

    async fn insert_booking(&mut self, booking: NewBooking) -> BookingResult<Booking> {
        let sql = format!(
            "INSERT INTO bookings (room_id, room_type_id, guest_name, guest_email, guest_phone, \
             check_in_date, check_out_date, amount) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {}",
            BOOKING_COLUMNS
        );
        let row: BookingRow = sqlx::query_as(&sql)
            .bind(booking.room_id)
            .bind(booking.room_type_id)
            .bind(&booking.guest.name)
            .bind(&booking.guest.email)
            .bind(&booking.guest.phone)
            .bind(booking.dates.check_in)
            .bind(booking.dates.check_out)
            .bind(booking.amount)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(db_error)?;
        row.try_into()
    }

    async fn save_booking(&mut self, booking: &Booking) -> BookingResult<Booking> {
        let sql = format!(
            "UPDATE bookings SET room_id = $2, room_type_id = $3, guest_name = $4, \
             guest_email = $5, guest_phone = $6, check_in_date = $7, check_out_date = $8, \
             status = $9, payment_reference = $10, amount = $11, updated_at = now() \
             WHERE id = $1 RETURNING {}",
            BOOKING_COLUMNS
        );
        let row: Option<BookingRow> = sqlx::query_as(&sql)
            .bind(booking.id)
            .bind(booking.room_id)
            .bind(booking.room_type_id)
            .bind(&booking.guest.name)
            .bind(&booking.guest.email)
            .bind(&booking.guest.phone)
            .bind(booking.dates.check_in)
            .bind(booking.dates.check_out)
            .bind(booking.status.as_str())
            .bind(booking.payment_reference.as_deref())
            .bind(booking.amount)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(db_error)?;
        row.ok_or_else(|| BookingError::not_found("booking", booking.id))?
            .try_into()
    }

    async fn count_rooms_of_type(&mut self, room_type_id: i64) -> BookingResult<u32> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM rooms WHERE room_type_id = $1")
            .bind(room_type_id)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(db_error)?;
        Ok(count.max(0) as u32)
    }

    async fn room_number_taken(
        &mut self,
        room_number: &str,
        except: Option<i64>,
    ) -> BookingResult<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM rooms WHERE room_number = $1 \
             AND ($2::BIGINT IS NULL OR id <> $2))",
        )
        .bind(room_number)
        .bind(except)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(db_error)
    }

    async fn insert_room(&mut self, room: NewRoom) -> BookingResult<Room> {
        let sql = format!(
            "INSERT INTO rooms (room_number, room_type_id, status) VALUES ($1, $2, $3) RETURNING {}",
            ROOM_COLUMNS
        );
        let row: RoomRow = sqlx::query_as(&sql)
            .bind(&room.room_number)
            .bind(room.room_type_id)
            .bind(room.status.as_str())
            .fetch_one(&mut *self.tx)
            .await
            .map_err(db_error)?;
        row.try_into()
    }

    async fn save_room(&mut self, room: &Room) -> BookingResult<Room> {
        let sql = format!(
            "UPDATE rooms SET room_number = $2, room_type_id = $3, status = $4 \
             WHERE id = $1 RETURNING {}",
            ROOM_COLUMNS
        );
        let row: Option<RoomRow> = sqlx::query_as(&sql)
            .bind(room.id)
            .bind(&room.room_number)
            .bind(room.room_type_id)
            .bind(room.status.as_str())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(db_error)?;
        row.ok_or_else(|| BookingError::not_found("room", room.id))?
            .try_into()
    }

    async fn delete_room(&mut self, id: i64) -> BookingResult<()> {
        // bookings.room_id is ON DELETE SET NULL
        let result = sqlx::query("DELETE FROM rooms WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .map_err(db_error)?;
        if result.rows_affected() == 0 {
            return Err(BookingError::not_found("room", id));
        }
        Ok(())
    }

    async fn insert_room_type(&mut self, room_type: NewRoomType) -> BookingResult<RoomType> {
        let sql = format!(
            "INSERT INTO room_types (name, description, base_price, total_rooms, amenities) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            ROOM_TYPE_COLUMNS
        );
        let row: RoomTypeRow = sqlx::query_as(&sql)
            .bind(&room_type.name)
            .bind(room_type.description.as_deref())
            .bind(room_type.base_price)
            .bind(rows::to_db_int(room_type.total_rooms, "total_rooms")?)
            .bind(&room_type.amenities)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(db_error)?;
        Ok(row.into())
    }

    async fn save_room_type(&mut self, room_type: &RoomType) -> BookingResult<RoomType> {
        let sql = format!(
            "UPDATE room_types SET name = $2, description = $3, base_price = $4, \
             total_rooms = $5, amenities = $6 WHERE id = $1 RETURNING {}",
            ROOM_TYPE_COLUMNS
        );
        let row: Option<RoomTypeRow> = sqlx::query_as(&sql)
            .bind(room_type.id)
            .bind(&room_type.name)
            .bind(room_type.description.as_deref())
            .bind(room_type.base_price)
            .bind(rows::to_db_int(room_type.total_rooms, "total_rooms")?)
            .bind(&room_type.amenities)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(db_error)?;
        row.map(RoomType::from)
            .ok_or_else(|| BookingError::not_found("room type", room_type.id))
    }

    async fn commit(self: Box<Self>) -> BookingResult<()> {
        self.tx.commit().await.map_err(db_error)
    }
}
