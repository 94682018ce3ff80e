//! # Notifications
//!
//! Outbound guest and admin messages. Lifecycle notices are fire-and-forget:
//! they are sent after the transaction commits, and a failure is logged,
//! never returned to the caller.

use crate::booking::Booking;
use crate::error::BookingResult;
use crate::room::AssignedRoom;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Why a notice is being sent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    /// Rooms reserved, payment outstanding
    Reserved,
    /// Payment received, booking confirmed
    PaymentConfirmed,
}

impl NoticeKind {
    pub fn subject(&self) -> &'static str {
        match self {
            NoticeKind::Reserved => "Your reservation details",
            NoticeKind::PaymentConfirmed => "Your booking is confirmed",
        }
    }
}

/// Everything a template needs to describe one booking request
#[derive(Debug, Clone, Serialize)]
pub struct BookingNotice {
    pub kind: NoticeKind,
    pub bookings: Vec<Booking>,
    pub assigned_rooms: Vec<AssignedRoom>,
    pub total_amount: Decimal,
    pub room_type_name: String,
}

impl BookingNotice {
    /// The booking whose guest details head the message
    pub fn primary(&self) -> Option<&Booking> {
        self.bookings.first()
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_guest_confirmation(&self, notice: &BookingNotice) -> BookingResult<()>;

    async fn send_admin_notification(&self, notice: &BookingNotice) -> BookingResult<()>;

    async fn send_custom_message(
        &self,
        recipient: &str,
        subject: &str,
        body: &str,
    ) -> BookingResult<()>;
}

pub type SharedNotifier = Arc<dyn Notifier>;

/// Send the guest and admin copies of `notice`, logging failures
pub async fn deliver(notifier: &dyn Notifier, notice: &BookingNotice) {
    let booking_id = notice.primary().map(|b| b.id);

    if let Err(e) = notifier.send_guest_confirmation(notice).await {
        warn!(?booking_id, kind = ?notice.kind, error = %e, "guest notification failed");
    }
    if let Err(e) = notifier.send_admin_notification(notice).await {
        warn!(?booking_id, kind = ?notice.kind, error = %e, "admin notification failed");
    }
}

/// Notifier that only writes to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingNotifier;

#[async_trait]
impl Notifier for LoggingNotifier {
    async fn send_guest_confirmation(&self, notice: &BookingNotice) -> BookingResult<()> {
        if let Some(primary) = notice.primary() {
            info!(
                to = %primary.guest.email,
                subject = notice.kind.subject(),
                rooms = notice.assigned_rooms.len(),
                total = %notice.total_amount,
                "guest notification"
            );
        }
        Ok(())
    }

    async fn send_admin_notification(&self, notice: &BookingNotice) -> BookingResult<()> {
        info!(
            kind = ?notice.kind,
            bookings = ?notice.bookings.iter().map(|b| b.id).collect::<Vec<_>>(),
            room_type = %notice.room_type_name,
            "admin notification"
        );
        Ok(())
    }

    async fn send_custom_message(
        &self,
        recipient: &str,
        subject: &str,
        _body: &str,
    ) -> BookingResult<()> {
        info!(to = %recipient, subject, "guest message");
        Ok(())
    }
}
