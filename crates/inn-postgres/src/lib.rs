//! # inn-postgres
//!
//! PostgreSQL `BookingStore` for innkeep-rs.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  PgStore (PgPool)                                            │
//! │  ├── begin() ──▶ PgTx (sqlx::Transaction)                    │
//! │  │     ├── lock_available_rooms: FOR UPDATE SKIP LOCKED      │
//! │  │     └── lock_booking*:        FOR UPDATE                  │
//! │  └── read-only queries straight on the pool                  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Schema lives in `migrations/` and is embedded with `sqlx::migrate!`.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use inn_postgres::PgStore;
//!
//! let store = PgStore::connect(&database_url, 10).await?;
//! store.migrate().await?;
//! let service = BookingService::new(Arc::new(store), gateway);
//! ```

mod filter;
mod rows;
mod tx;

pub use tx::PgTx;

use async_trait::async_trait;
use chrono::NaiveDate;
use inn_core::{
    Booking, BookingError, BookingFilter, BookingPage, BookingResult, BookingStatus, BookingStore,
    Room, RoomCatalog, RoomStatus, RoomType, RoomTypeSummary, StayDates, StoreTx,
};
use rows::{
    BookingRow, RoomRow, RoomTypeRow, RoomTypeSummaryRow, BOOKING_COLUMNS, ROOM_COLUMNS,
    ROOM_TYPE_COLUMNS,
};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, QueryBuilder};
use std::time::Duration;
use tracing::{error, info, instrument};

/// Log a database failure and surface it as a storage error
pub(crate) fn db_error(err: sqlx::Error) -> BookingError {
    error!(error = %err, "database error");
    BookingError::Storage(err.to_string())
}

/// Booking store backed by a Postgres connection pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wrap an existing pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect to `database_url`
    pub async fn connect(database_url: &str, max_connections: u32) -> BookingResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(5))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(db_error)?;

        info!(max_connections, "Connected to PostgreSQL");
        Ok(Self::new(pool))
    }

    /// Apply the embedded migrations (idempotent)
    pub async fn migrate(&self) -> BookingResult<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| BookingError::Storage(format!("migration failed: {}", e)))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Load a room catalog into an empty database.
    ///
    /// Returns `false` without touching anything when room types already exist.
    #[instrument(
        skip(self, catalog),
        fields(room_types = catalog.room_types.len(), rooms = catalog.rooms.len())
    )]
    pub async fn seed_catalog(&self, catalog: &RoomCatalog) -> BookingResult<bool> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM room_types")
            .fetch_one(&mut *tx)
            .await
            .map_err(db_error)?;
        if existing > 0 {
            info!(existing, "room catalog already present, skipping seed");
            return Ok(false);
        }

        for room_type in &catalog.room_types {
            sqlx::query(
                "INSERT INTO room_types (id, name, description, base_price, total_rooms, amenities) \
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(room_type.id)
            .bind(&room_type.name)
            .bind(room_type.description.as_deref())
            .bind(room_type.base_price)
            .bind(rows::to_db_int(room_type.total_rooms, "total_rooms")?)
            .bind(&room_type.amenities)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;
        }

        for room in &catalog.rooms {
            sqlx::query("INSERT INTO rooms (id, room_number, room_type_id, status) VALUES ($1, $2, $3, $4)")
                .bind(room.id)
                .bind(&room.room_number)
                .bind(room.room_type_id)
                .bind(room.status.as_str())
                .execute(&mut *tx)
                .await
                .map_err(db_error)?;
        }

        // Explicit ids bypass the sequences; move them past the seeded rows
        for table in ["room_types", "rooms"] {
            let sql = format!(
                "SELECT setval(pg_get_serial_sequence('{0}', 'id'), COALESCE(MAX(id), 0) + 1, false) FROM {0}",
                table
            );
            sqlx::query(&sql).execute(&mut *tx).await.map_err(db_error)?;
        }

        tx.commit().await.map_err(db_error)?;
        info!("room catalog seeded");
        Ok(true)
    }
}

#[async_trait]
impl BookingStore for PgStore {
    async fn begin(&self) -> BookingResult<Box<dyn StoreTx>> {
        let tx = self.pool.begin().await.map_err(db_error)?;
        Ok(Box::new(PgTx::new(tx)))
    }

    async fn room_types(&self) -> BookingResult<Vec<RoomTypeSummary>> {
        let sql = format!(
            "SELECT {}, (SELECT COUNT(*) FROM rooms r WHERE r.room_type_id = t.id) AS rooms_count \
             FROM room_types t ORDER BY id",
            ROOM_TYPE_COLUMNS
        );
        let found: Vec<RoomTypeSummaryRow> = sqlx::query_as(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(found.into_iter().map(RoomTypeSummary::from).collect())
    }

    async fn room_type(&self, id: i64) -> BookingResult<Option<RoomType>> {
        let sql = format!("SELECT {} FROM room_types WHERE id = $1", ROOM_TYPE_COLUMNS);
        let row: Option<RoomTypeRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(row.map(RoomType::from))
    }

    async fn rooms(&self, room_type_id: Option<i64>) -> BookingResult<Vec<Room>> {
        let sql = format!(
            "SELECT {} FROM rooms WHERE ($1::BIGINT IS NULL OR room_type_id = $1) ORDER BY id",
            ROOM_COLUMNS
        );
        let found: Vec<RoomRow> = sqlx::query_as(&sql)
            .bind(room_type_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;
        rows::rooms(found)
    }

    async fn count_rooms_with_status(
        &self,
        room_type_id: i64,
        status: RoomStatus,
    ) -> BookingResult<u32> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM rooms WHERE room_type_id = $1 AND status = $2")
                .bind(room_type_id)
                .bind(status.as_str())
                .fetch_one(&self.pool)
                .await
                .map_err(db_error)?;
        Ok(count.max(0) as u32)
    }

    async fn count_active_overlapping(
        &self,
        room_type_id: i64,
        dates: &StayDates,
    ) -> BookingResult<u32> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM bookings WHERE room_type_id = $1 \
             AND status IN ($2, $3) AND check_in_date < $5 AND check_out_date > $4",
        )
        .bind(room_type_id)
        .bind(BookingStatus::Pending.as_str())
        .bind(BookingStatus::Confirmed.as_str())
        .bind(dates.check_in)
        .bind(dates.check_out)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(count.max(0) as u32)
    }

    async fn booking(&self, id: i64) -> BookingResult<Option<Booking>> {
        let sql = format!("SELECT {} FROM bookings WHERE id = $1", BOOKING_COLUMNS);
        let row: Option<BookingRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;
        row.map(Booking::try_from).transpose()
    }

    async fn booking_by_reference(&self, reference: &str) -> BookingResult<Option<Booking>> {
        let sql = format!("SELECT {} FROM bookings WHERE payment_reference = $1", BOOKING_COLUMNS);
        let row: Option<BookingRow> = sqlx::query_as(&sql)
            .bind(reference)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;
        row.map(Booking::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn list_bookings(&self, filter: &BookingFilter) -> BookingResult<BookingPage> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*)");
        count.push(filter::LIST_FROM);
        filter::push_predicates(&mut count, filter);
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)?;

        let mut page = QueryBuilder::<Postgres>::new("SELECT b.*");
        page.push(filter::LIST_FROM);
        filter::push_predicates(&mut page, filter);
        page.push(" ORDER BY b.id DESC LIMIT ")
            .push_bind(i64::from(BookingFilter::PAGE_SIZE))
            .push(" OFFSET ")
            .push_bind(i64::from(filter.offset()));
        let found: Vec<BookingRow> = page
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;

        Ok(BookingPage {
            data: rows::bookings(found)?,
            page: filter.page.unwrap_or(1).max(1),
            per_page: BookingFilter::PAGE_SIZE,
            total: total.max(0) as u64,
        })
    }

    async fn overdue_confirmed(&self, today: NaiveDate) -> BookingResult<Vec<i64>> {
        sqlx::query_scalar::<_, i64>(
            "SELECT id FROM bookings WHERE status = $1 AND check_out_date < $2 ORDER BY id",
        )
        .bind(BookingStatus::Confirmed.as_str())
        .bind(today)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
