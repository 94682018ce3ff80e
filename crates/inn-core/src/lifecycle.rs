//! # Booking State Machine
//!
//! ```text
//!            confirm              check out
//!  pending ───────────▶ confirmed ───────────▶ checked-out
//!     │                    │
//!     │ cancel             │ cancel
//!     ▼                    ▼
//!  cancelled ◀─────────────┘
//! ```
//!
//! Every transition also moves the linked room: confirm → Occupied,
//! cancel / check out → Available. Both writes happen inside the caller's
//! transaction, so a failure part-way leaves nothing behind.

use crate::booking::{Booking, BookingStatus, StayDates};
use crate::error::{BookingError, BookingResult};
use crate::pricing;
use crate::room::{Room, RoomStatus};
use crate::store::StoreTx;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// A requested lifecycle step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingAction {
    Confirm,
    Cancel,
    CheckOut,
}

impl BookingAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingAction::Confirm => "confirm",
            BookingAction::Cancel => "cancel",
            BookingAction::CheckOut => "check out",
        }
    }

    /// Room status the linked room takes once this action succeeds
    pub fn room_status(&self) -> RoomStatus {
        match self {
            BookingAction::Confirm => RoomStatus::Occupied,
            BookingAction::Cancel | BookingAction::CheckOut => RoomStatus::Available,
        }
    }
}

impl std::fmt::Display for BookingAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated move between two booking states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: BookingStatus,
    pub to: BookingStatus,
    pub room_status: RoomStatus,
}

/// Check the guard table for `action` taken from `from`.
///
/// Re-confirming an already confirmed booking is rejected like any other
/// guard violation; it is not an idempotent success.
pub fn plan(
    booking_id: i64,
    from: BookingStatus,
    action: BookingAction,
) -> BookingResult<Transition> {
    let to = match (from, action) {
        (BookingStatus::Pending, BookingAction::Confirm) => BookingStatus::Confirmed,
        (BookingStatus::Pending | BookingStatus::Confirmed, BookingAction::Cancel) => {
            BookingStatus::Cancelled
        }
        (BookingStatus::Confirmed, BookingAction::CheckOut) => BookingStatus::CheckedOut,
        _ => {
            return Err(BookingError::InvalidTransition {
                booking_id,
                from,
                action,
            })
        }
    };

    Ok(Transition {
        from,
        to,
        room_status: action.room_status(),
    })
}

/// Room status a booking in `status` keeps its room in, if it holds one at all
pub fn held_room_status(status: BookingStatus) -> Option<RoomStatus> {
    match status {
        BookingStatus::Pending => Some(RoomStatus::Reserved),
        BookingStatus::Confirmed => Some(RoomStatus::Occupied),
        BookingStatus::Cancelled | BookingStatus::CheckedOut => None,
    }
}

/// Action that moves a booking to `target`. Nothing moves a booking back to pending.
pub fn action_towards(
    booking_id: i64,
    from: BookingStatus,
    target: BookingStatus,
) -> BookingResult<BookingAction> {
    match target {
        BookingStatus::Confirmed => Ok(BookingAction::Confirm),
        BookingStatus::Cancelled => Ok(BookingAction::Cancel),
        BookingStatus::CheckedOut => Ok(BookingAction::CheckOut),
        BookingStatus::Pending => Err(BookingError::Validation(format!(
            "booking {} is {} and cannot be returned to pending",
            booking_id, from
        ))),
    }
}

/// Result of a committed lifecycle change
#[derive(Debug, Clone, Serialize)]
pub struct TransitionRecord {
    pub booking: Booking,
    pub previous_status: BookingStatus,
    /// The linked room after the change, if the booking has one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room: Option<Room>,
}

/// Apply `action` to an already locked booking
pub async fn apply(
    tx: &mut dyn StoreTx,
    mut booking: Booking,
    action: BookingAction,
) -> BookingResult<TransitionRecord> {
    let transition = plan(booking.id, booking.status, action)?;

    booking.status = transition.to;
    let booking = tx.save_booking(&booking).await?;

    let room = match booking.room_id {
        Some(room_id) => match tx.lock_room(room_id).await? {
            Some(_) => Some(tx.set_room_status(room_id, transition.room_status).await?),
            None => {
                warn!(booking_id = booking.id, room_id, "linked room no longer exists");
                None
            }
        },
        None => None,
    };

    info!(
        booking_id = booking.id,
        from = %transition.from,
        to = %transition.to,
        room = ?room.as_ref().map(|r| r.room_number.as_str()),
        "booking transition"
    );

    Ok(TransitionRecord {
        booking,
        previous_status: transition.from,
        room,
    })
}

/// Lock a booking by id and apply `action`
pub async fn transition(
    tx: &mut dyn StoreTx,
    booking_id: i64,
    action: BookingAction,
) -> BookingResult<TransitionRecord> {
    let booking = tx
        .lock_booking(booking_id)
        .await?
        .ok_or_else(|| BookingError::not_found("booking", booking_id))?;
    apply(tx, booking, action).await
}

/// Field edits an administrator may make to a booking
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookingChanges {
    pub status: Option<BookingStatus>,
    pub guest_name: Option<String>,
    pub guest_email: Option<String>,
    pub guest_phone: Option<String>,
    pub check_in: Option<NaiveDate>,
    pub check_out: Option<NaiveDate>,
    /// `Some(None)` unassigns the room
    pub room_id: Option<Option<i64>>,
    pub room_type_id: Option<i64>,
}

/// Edit a booking, reassigning its room and changing its status if asked.
///
/// Terminal bookings accept guest-detail edits only, so their recorded
/// price and stale room link are never touched. The room swap runs first, using the booking's status at that point to
/// decide between Reserved and Occupied; the status change then acts on the
/// newly assigned room.
pub async fn update(
    tx: &mut dyn StoreTx,
    booking_id: i64,
    changes: BookingChanges,
) -> BookingResult<TransitionRecord> {
    let mut booking = tx
        .lock_booking(booking_id)
        .await?
        .ok_or_else(|| BookingError::not_found("booking", booking_id))?;
    let previous_status = booking.status;

    // A cancelled or checked-out booking keeps its old room_id, but that room
    // may already be held by someone else; only guest details stay editable.
    if booking.status.is_terminal() {
        let moves_stay = changes.room_id.is_some_and(|id| id != booking.room_id)
            || changes.room_type_id.is_some_and(|id| id != booking.room_type_id)
            || changes.check_in.is_some_and(|d| d != booking.dates.check_in)
            || changes.check_out.is_some_and(|d| d != booking.dates.check_out);
        if moves_stay {
            return Err(BookingError::Validation(format!(
                "booking {} is {}; only guest details can be edited",
                booking_id, booking.status
            )));
        }
    }

    let dates = StayDates::new(
        changes.check_in.unwrap_or(booking.dates.check_in),
        changes.check_out.unwrap_or(booking.dates.check_out),
    )?;
    let room_type_id = changes.room_type_id.unwrap_or(booking.room_type_id);
    let room_type = tx
        .room_type(room_type_id)
        .await?
        .ok_or_else(|| BookingError::not_found("room type", room_type_id))?;

    let mut room = None;
    match changes.room_id {
        Some(new_room_id) if new_room_id != booking.room_id => {
            if let Some(old_room_id) = booking.room_id {
                if tx.lock_room(old_room_id).await?.is_some() {
                    tx.set_room_status(old_room_id, RoomStatus::Available).await?;
                    info!(booking_id, room_id = old_room_id, "released room on reassignment");
                }
            }

            if let Some(new_room_id) = new_room_id {
                let hold = held_room_status(booking.status).ok_or_else(|| {
                    BookingError::Validation(format!(
                        "cannot assign a room to a {} booking",
                        booking.status
                    ))
                })?;
                let candidate = tx
                    .lock_room(new_room_id)
                    .await?
                    .ok_or_else(|| BookingError::not_found("room", new_room_id))?;
                if candidate.room_type_id != room_type_id {
                    return Err(BookingError::Validation(format!(
                        "room {} does not belong to room type {}",
                        candidate.room_number, room_type.name
                    )));
                }
                if !candidate.is_available() {
                    return Err(BookingError::RoomUnavailable {
                        room_id: new_room_id,
                    });
                }
                room = Some(tx.set_room_status(new_room_id, hold).await?);
                info!(booking_id, room_id = new_room_id, status = %hold, "assigned room");
            }
            booking.room_id = new_room_id;
        }
        _ if booking.status.is_terminal() => {}
        _ => {
            if let Some(current_id) = booking.room_id {
                room = tx.lock_room(current_id).await?;
                if let Some(current) = &room {
                    if current.room_type_id != room_type_id {
                        return Err(BookingError::Validation(format!(
                            "assigned room {} does not belong to room type {}",
                            current.room_number, room_type.name
                        )));
                    }
                }
            }
        }
    }

    if let Some(name) = changes.guest_name {
        booking.guest.name = name;
    }
    if let Some(email) = changes.guest_email {
        booking.guest.email = email;
    }
    if let Some(phone) = changes.guest_phone {
        booking.guest.phone = phone;
    }
    if dates != booking.dates || room_type_id != booking.room_type_id {
        booking.amount = pricing::per_room_amount(room_type.base_price, &dates);
    }
    booking.dates = dates;
    booking.room_type_id = room_type_id;

    let booking = tx.save_booking(&booking).await?;

    match changes.status {
        Some(target) if target != booking.status => {
            let action = action_towards(booking.id, booking.status, target)?;
            let mut record = apply(tx, booking, action).await?;
            record.previous_status = previous_status;
            Ok(record)
        }
        _ => Ok(TransitionRecord {
            booking,
            previous_status,
            room,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_table() {
        use BookingAction::*;
        use BookingStatus::*;

        let allowed = [
            (Pending, Confirm, Confirmed, RoomStatus::Occupied),
            (Pending, Cancel, Cancelled, RoomStatus::Available),
            (Confirmed, Cancel, Cancelled, RoomStatus::Available),
            (Confirmed, CheckOut, CheckedOut, RoomStatus::Available),
        ];
        for (from, action, to, room) in allowed {
            let t = plan(1, from, action).unwrap();
            assert_eq!(t.to, to);
            assert_eq!(t.room_status, room);
        }

        let rejected = [
            (Confirmed, Confirm),
            (Pending, CheckOut),
            (Cancelled, Confirm),
            (Cancelled, Cancel),
            (CheckedOut, Cancel),
            (CheckedOut, CheckOut),
        ];
        for (from, action) in rejected {
            assert!(matches!(
                plan(9, from, action),
                Err(BookingError::InvalidTransition { booking_id: 9, .. })
            ));
        }
    }

    #[test]
    fn test_held_room_status() {
        assert_eq!(held_room_status(BookingStatus::Pending), Some(RoomStatus::Reserved));
        assert_eq!(held_room_status(BookingStatus::Confirmed), Some(RoomStatus::Occupied));
        assert_eq!(held_room_status(BookingStatus::Cancelled), None);
    }

    #[test]
    fn test_no_way_back_to_pending() {
        assert!(matches!(
            action_towards(3, BookingStatus::Confirmed, BookingStatus::Pending),
            Err(BookingError::Validation(_))
        ));
        assert_eq!(
            action_towards(3, BookingStatus::Confirmed, BookingStatus::CheckedOut).unwrap(),
            BookingAction::CheckOut
        );
    }
}
