//! # HTTP Notification Relay
//!
//! `Notifier` that hands messages to an email relay over HTTP
//! (`NOTIFY_RELAY_URL`). The relay renders and sends them; this side only
//! posts JSON:
//!
//! ```json
//! { "to": "guest@example.com", "subject": "...", "template": "reserved", "data": { ... } }
//! ```

use async_trait::async_trait;
use inn_core::{BookingError, BookingNotice, BookingResult, NoticeKind, Notifier};
use reqwest::Client;
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, error, info, instrument};

const PROVIDER: &str = "notify-relay";

#[derive(Debug, Serialize)]
struct RelayMessage<'a> {
    to: &'a str,
    subject: &'a str,
    template: &'a str,
    data: Value,
}

pub struct RelayNotifier {
    relay_url: String,
    admin_email: Option<String>,
    client: Client,
}

impl RelayNotifier {
    pub fn new(relay_url: impl Into<String>, admin_email: Option<String>) -> BookingResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| {
                BookingError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            relay_url: relay_url.into(),
            admin_email,
            client,
        })
    }

    fn template(kind: NoticeKind, audience: &str) -> String {
        let kind = match kind {
            NoticeKind::Reserved => "reserved",
            NoticeKind::PaymentConfirmed => "payment_confirmed",
        };
        format!("{}_{}", audience, kind)
    }

    async fn post(&self, message: &RelayMessage<'_>) -> BookingResult<()> {
        let response = self
            .client
            .post(&self.relay_url)
            .json(message)
            .send()
            .await
            .map_err(|e| BookingError::upstream(PROVIDER, e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            debug!(to = %message.to, template = %message.template, "relay accepted message");
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            error!(%status, body = %body, "relay rejected message");
            Err(BookingError::upstream(PROVIDER, format!("HTTP {}: {}", status, body)))
        }
    }
}

#[async_trait]
impl Notifier for RelayNotifier {
    #[instrument(skip(self, notice), fields(kind = ?notice.kind))]
    async fn send_guest_confirmation(&self, notice: &BookingNotice) -> BookingResult<()> {
        let Some(primary) = notice.primary() else {
            return Ok(());
        };
        let data = serde_json::to_value(notice).map_err(|e| BookingError::Internal(e.to_string()))?;
        self.post(&RelayMessage {
            to: &primary.guest.email,
            subject: notice.kind.subject(),
            template: &Self::template(notice.kind, "guest"),
            data,
        })
        .await
    }

    #[instrument(skip(self, notice), fields(kind = ?notice.kind))]
    async fn send_admin_notification(&self, notice: &BookingNotice) -> BookingResult<()> {
        let Some(admin_email) = self.admin_email.as_deref() else {
            debug!("ADMIN_EMAIL not set, skipping admin notification");
            return Ok(());
        };
        let data = serde_json::to_value(notice).map_err(|e| BookingError::Internal(e.to_string()))?;
        let subject = match notice.primary() {
            Some(primary) => format!("New booking #{} ({})", primary.id, notice.room_type_name),
            None => "New booking".to_string(),
        };
        self.post(&RelayMessage {
            to: admin_email,
            subject: &subject,
            template: &Self::template(notice.kind, "admin"),
            data,
        })
        .await
    }

    #[instrument(skip(self, body))]
    async fn send_custom_message(
        &self,
        recipient: &str,
        subject: &str,
        body: &str,
    ) -> BookingResult<()> {
        self.post(&RelayMessage {
            to: recipient,
            subject,
            template: "guest_message",
            data: json!({ "body": body }),
        })
        .await?;
        info!(to = %recipient, "guest message relayed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use inn_core::{AssignedRoom, Booking, BookingStatus, GuestInfo, RoomStatus, StayDates};
    use rust_decimal_macros::dec;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn notice() -> BookingNotice {
        let dates = StayDates::new(
            NaiveDate::from_ymd_opt(2026, 1, 10).unwrap(),
            NaiveDate::from_ymd_opt(2026, 1, 12).unwrap(),
        )
        .unwrap();
        BookingNotice {
            kind: NoticeKind::Reserved,
            bookings: vec![Booking {
                id: 1,
                room_id: Some(1),
                room_type_id: 1,
                guest: GuestInfo::new("Ada", "ada@example.com", "0800"),
                dates,
                status: BookingStatus::Pending,
                payment_reference: None,
                amount: dec!(140000),
                created_at: Utc::now(),
                updated_at: Utc::now(),
            }],
            assigned_rooms: vec![AssignedRoom {
                id: 1,
                room_number: "101".into(),
                status: RoomStatus::Reserved,
            }],
            total_amount: dec!(140000),
            room_type_name: "Standard Room".into(),
        }
    }

    #[tokio::test]
    async fn test_guest_confirmation_posts_to_relay() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/send"))
            .and(body_partial_json(serde_json::json!({
                "to": "ada@example.com",
                "template": "guest_reserved"
            })))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = RelayNotifier::new(format!("{}/send", server.uri()), None).unwrap();
        notifier.send_guest_confirmation(&notice()).await.unwrap();
        // No admin address configured: nothing is sent
        notifier.send_admin_notification(&notice()).await.unwrap();
    }

    #[tokio::test]
    async fn test_relay_failure_is_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let notifier =
            RelayNotifier::new(server.uri(), Some("desk@hotel.example".into())).unwrap();
        let err = notifier
            .send_custom_message("ada@example.com", "Hello", "Welcome")
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::UpstreamGateway { .. }));
        assert!(notifier.send_admin_notification(&notice()).await.is_err());
    }
}
