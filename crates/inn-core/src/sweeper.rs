//! # Auto-Checkout Sweeper
//!
//! Checks out every confirmed booking whose check-out date is before today
//! and frees its room. Each booking gets its own transaction; a failure on
//! one is logged and recorded, and the sweep moves on. Running the sweep
//! twice is harmless since checked-out bookings no longer match.

use crate::error::BookingResult;
use crate::lifecycle::{self, BookingAction};
use crate::room::RoomStatus;
use crate::store::BookingStore;
use chrono::NaiveDate;
use serde::Serialize;
use tracing::{error, info};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SweepFailure {
    pub booking_id: i64,
    pub error: String,
}

/// Counts from one sweep run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub checked_out: u32,
    pub rooms_freed: u32,
    pub failures: Vec<SweepFailure>,
}

async fn check_out_one(store: &dyn BookingStore, booking_id: i64) -> BookingResult<bool> {
    let mut tx = store.begin().await?;
    let record = lifecycle::transition(tx.as_mut(), booking_id, BookingAction::CheckOut).await?;
    tx.commit().await?;
    Ok(record
        .room
        .map_or(false, |room| room.status == RoomStatus::Available))
}

/// Run one sweep with `today` as the cut-off
pub async fn run_sweep(store: &dyn BookingStore, today: NaiveDate) -> BookingResult<SweepReport> {
    let due = store.overdue_confirmed(today).await?;
    let mut report = SweepReport::default();

    for booking_id in due {
        match check_out_one(store, booking_id).await {
            Ok(freed) => {
                report.checked_out += 1;
                if freed {
                    report.rooms_freed += 1;
                }
            }
            Err(e) => {
                error!(booking_id, error = %e, "auto-checkout failed");
                report.failures.push(SweepFailure {
                    booking_id,
                    error: e.to_string(),
                });
            }
        }
    }

    info!(
        %today,
        checked_out = report.checked_out,
        rooms_freed = report.rooms_freed,
        failed = report.failures.len(),
        "auto-checkout sweep finished"
    );
    Ok(report)
}
