//! # Payment Reconciliation
//!
//! Maps a gateway verdict for a payment reference onto booking and room state.
//!
//! | Booking     | success           | failed / unknown | abandoned / timeout / pending |
//! |-------------|-------------------|------------------|-------------------------------|
//! | pending     | confirm           | cancel           | held (room stays Reserved)    |
//! | confirmed   | already confirmed | ignored          | ignored                       |
//! | cancelled   | ignored           | ignored          | ignored                       |
//! | checked-out | ignored           | ignored          | ignored                       |
//!
//! The decision is taken on the locked booking row, so a webhook and a
//! polling confirmation racing on one reference serialize, and the loser
//! sees `AlreadyConfirmed`.

use crate::booking::{Booking, BookingStatus};
use crate::error::{BookingError, BookingResult};
use crate::gateway::GatewayStatus;
use crate::lifecycle::{self, BookingAction};
use crate::room::Room;
use crate::store::StoreTx;
use serde::Serialize;
use tracing::{info, warn};

/// What reconciliation did with a verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileOutcome {
    /// pending → confirmed, room → Occupied
    Confirmed,
    /// Duplicate success delivery; nothing changed
    AlreadyConfirmed,
    /// Non-fatal status; booking stays pending with its room held
    Held,
    /// pending → cancelled, room → Available
    Cancelled,
    /// Verdict does not apply to the booking's current state
    Ignored,
}

impl ReconcileOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReconcileOutcome::Confirmed => "confirmed",
            ReconcileOutcome::AlreadyConfirmed => "already_confirmed",
            ReconcileOutcome::Held => "held",
            ReconcileOutcome::Cancelled => "cancelled",
            ReconcileOutcome::Ignored => "ignored",
        }
    }

    /// Outcomes after which the guest and admin are told about the payment
    pub fn should_notify(&self) -> bool {
        matches!(self, ReconcileOutcome::Confirmed)
    }
}

/// Pure decision table
pub fn decide(current: BookingStatus, status: &GatewayStatus) -> ReconcileOutcome {
    match (current, status) {
        (BookingStatus::Pending, GatewayStatus::Success) => ReconcileOutcome::Confirmed,
        (BookingStatus::Pending, s) if s.is_non_fatal() => ReconcileOutcome::Held,
        (BookingStatus::Pending, _) => ReconcileOutcome::Cancelled,
        (BookingStatus::Confirmed, GatewayStatus::Success) => ReconcileOutcome::AlreadyConfirmed,
        _ => ReconcileOutcome::Ignored,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconcileRecord {
    pub booking: Booking,
    pub outcome: ReconcileOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room: Option<Room>,
}

/// Apply `status` to the booking holding `reference`
pub async fn reconcile(
    tx: &mut dyn StoreTx,
    reference: &str,
    status: &GatewayStatus,
) -> BookingResult<ReconcileRecord> {
    let booking = tx
        .lock_booking_by_reference(reference)
        .await?
        .ok_or_else(|| BookingError::not_found("payment reference", reference))?;
    reconcile_booking(tx, booking, status).await
}

/// Apply `status` to an already locked booking
pub async fn reconcile_booking(
    tx: &mut dyn StoreTx,
    booking: Booking,
    status: &GatewayStatus,
) -> BookingResult<ReconcileRecord> {
    let outcome = decide(booking.status, status);

    let action = match outcome {
        ReconcileOutcome::Confirmed => BookingAction::Confirm,
        ReconcileOutcome::Cancelled => BookingAction::Cancel,
        ReconcileOutcome::Held | ReconcileOutcome::AlreadyConfirmed => {
            info!(
                booking_id = booking.id,
                %status,
                ?outcome,
                "payment verdict leaves booking unchanged"
            );
            return Ok(ReconcileRecord {
                booking,
                outcome,
                room: None,
            });
        }
        ReconcileOutcome::Ignored => {
            warn!(
                booking_id = booking.id,
                booking_status = %booking.status,
                %status,
                "payment verdict ignored for booking state"
            );
            return Ok(ReconcileRecord {
                booking,
                outcome,
                room: None,
            });
        }
    };

    let record = lifecycle::apply(tx, booking, action).await?;
    info!(booking_id = record.booking.id, %status, ?outcome, "payment reconciled");
    Ok(ReconcileRecord {
        booking: record.booking,
        outcome,
        room: record.room,
    })
}
