//! # Payment Gateway Trait
//!
//! The seam between the booking core and a hosted payment provider.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   PaymentGateway (trait)                    │
//! │  ├── initialize_transaction()  → authorization URL          │
//! │  ├── verify_transaction()      → GatewayStatus              │
//! │  ├── verify_webhook()          → GatewayEvent               │
//! │  └── provider_name()                                        │
//! └─────────────────────────────────────────────────────────────┘
//!                            ▲
//!                    ┌───────┴───────┐
//!                    │PaystackGateway│
//!                    │ (inn-paystack)│
//!                    └───────────────┘
//! ```

use crate::error::BookingResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Transaction status as reported by the gateway.
///
/// Serialized as the plain status string; deserializing goes through
/// [`GatewayStatus::parse`], so unrecognised strings land in `Unknown`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum GatewayStatus {
    Success,
    Failed,
    Abandoned,
    Timeout,
    Pending,
    /// Anything the gateway sends that is not recognised
    Unknown(String),
}

impl GatewayStatus {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "success" => GatewayStatus::Success,
            "failed" => GatewayStatus::Failed,
            "abandoned" => GatewayStatus::Abandoned,
            "timeout" => GatewayStatus::Timeout,
            "pending" | "ongoing" | "processing" | "queued" => GatewayStatus::Pending,
            other => GatewayStatus::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            GatewayStatus::Success => "success",
            GatewayStatus::Failed => "failed",
            GatewayStatus::Abandoned => "abandoned",
            GatewayStatus::Timeout => "timeout",
            GatewayStatus::Pending => "pending",
            GatewayStatus::Unknown(raw) => raw,
        }
    }

    /// The guest may still complete payment; the room stays held
    pub fn is_non_fatal(&self) -> bool {
        matches!(
            self,
            GatewayStatus::Abandoned | GatewayStatus::Timeout | GatewayStatus::Pending
        )
    }
}

impl From<String> for GatewayStatus {
    fn from(value: String) -> Self {
        GatewayStatus::parse(&value)
    }
}

impl From<GatewayStatus> for String {
    fn from(status: GatewayStatus) -> Self {
        status.as_str().to_string()
    }
}

impl std::fmt::Display for GatewayStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request to open a hosted payment page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InitializeTransaction {
    pub reference: String,
    /// Amount in the currency's minor unit (kobo, cents)
    pub amount_minor: i64,
    pub email: String,
    pub callback_url: String,
    /// Carried as gateway metadata
    pub booking_id: i64,
}

/// Hosted payment page handed back to the guest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentInit {
    pub reference: String,
    pub authorization_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_code: Option<String>,
}

/// Outcome of a verification call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verification {
    pub reference: String,
    pub status: GatewayStatus,
    /// Free-text message from the gateway ("Approved", "Declined", ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway_response: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_minor: Option<i64>,
}

/// An authenticated event pushed by the gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayEvent {
    /// Event name (e.g., "charge.success")
    pub event: String,
    pub reference: String,
    pub status: GatewayStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway_response: Option<String>,
}

impl GatewayEvent {
    pub const CHARGE_SUCCESS: &'static str = "charge.success";

    /// Status to reconcile with; a `charge.success` event wins over the payload status
    pub fn effective_status(&self) -> GatewayStatus {
        if self.event == Self::CHARGE_SUCCESS {
            GatewayStatus::Success
        } else {
            self.status.clone()
        }
    }
}

/// Core trait for payment provider implementations.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Open a hosted payment page for `request.reference`.
    ///
    /// Must not be called inside a store transaction.
    async fn initialize_transaction(
        &self,
        request: &InitializeTransaction,
    ) -> BookingResult<PaymentInit>;

    /// Ask the gateway for the current state of `reference`
    async fn verify_transaction(&self, reference: &str) -> BookingResult<Verification>;

    /// Verify a webhook signature over the raw body and parse the event.
    ///
    /// # Arguments
    /// * `payload` - Raw webhook body bytes
    /// * `signature` - Signature header from the request
    async fn verify_webhook(&self, payload: &[u8], signature: &str) -> BookingResult<GatewayEvent>;

    /// Get the provider name (for logging and routing).
    fn provider_name(&self) -> &'static str;

    /// Default: `/webhook/{provider_name}`
    fn webhook_path(&self) -> String {
        format!("/webhook/{}", self.provider_name())
    }
}

/// Type alias for a shared payment gateway (dynamic dispatch)
pub type BoxedPaymentGateway = Arc<dyn PaymentGateway>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse() {
        assert_eq!(GatewayStatus::parse("SUCCESS"), GatewayStatus::Success);
        assert_eq!(GatewayStatus::parse("abandoned"), GatewayStatus::Abandoned);
        assert_eq!(
            GatewayStatus::parse("reversed"),
            GatewayStatus::Unknown("reversed".into())
        );
        assert!(GatewayStatus::Timeout.is_non_fatal());
        assert!(!GatewayStatus::Failed.is_non_fatal());
        assert!(!GatewayStatus::Unknown("reversed".into()).is_non_fatal());
    }

    #[test]
    fn test_status_wire_format_is_a_plain_string() {
        let status: GatewayStatus = serde_json::from_str("\"reversed\"").unwrap();
        assert_eq!(status, GatewayStatus::Unknown("reversed".into()));
        assert_eq!(serde_json::to_string(&status).unwrap(), "\"reversed\"");

        let event: GatewayEvent = serde_json::from_value(serde_json::json!({
            "event": "charge.failed",
            "reference": "PAY-X",
            "status": "Ongoing"
        }))
        .unwrap();
        assert_eq!(event.status, GatewayStatus::Pending);
        assert_eq!(serde_json::to_value(GatewayStatus::Success).unwrap(), "success");
    }

    #[test]
    fn test_charge_success_event_overrides_status() {
        let event = GatewayEvent {
            event: "charge.success".into(),
            reference: "PAY-X".into(),
            status: GatewayStatus::Pending,
            gateway_response: None,
        };
        assert_eq!(event.effective_status(), GatewayStatus::Success);
    }
}
