//! # Paystack Webhook Handling
//!
//! Paystack signs every event with `X-Paystack-Signature`: the hex HMAC-SHA512
//! of the raw request body, keyed by the account's secret key.

use inn_core::{BookingError, BookingResult, GatewayEvent, GatewayStatus};
use serde::Deserialize;

/// Header carrying the signature
pub const SIGNATURE_HEADER: &str = "x-paystack-signature";

/// Compute the expected signature for `payload`
pub fn compute_signature(secret: &str, payload: &[u8]) -> String {
    use hmac::{Hmac, Mac};
    use sha2::Sha512;

    type HmacSha512 = Hmac<Sha512>;

    // HMAC accepts keys of any length, so this never takes the error branch
    let mut mac = match HmacSha512::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return String::new(),
    };
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0, |acc, (x, y)| acc | (x ^ y))
        == 0
}

/// Check `signature` against the payload
pub fn verify_signature(secret: &str, payload: &[u8], signature: &str) -> BookingResult<()> {
    let signature = signature.trim();
    if signature.is_empty() {
        return Err(BookingError::SignatureInvalid("Missing signature".to_string()));
    }
    let expected = compute_signature(secret, payload);
    if expected.is_empty() || !constant_time_compare(&signature.to_ascii_lowercase(), &expected) {
        return Err(BookingError::SignatureInvalid("Signature mismatch".to_string()));
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
struct PaystackEvent {
    event: String,
    data: PaystackEventData,
}

#[derive(Debug, Deserialize)]
struct PaystackEventData {
    reference: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    gateway_response: Option<String>,
}

/// Parse an already authenticated event body
pub fn parse_event(payload: &[u8]) -> BookingResult<GatewayEvent> {
    let event: PaystackEvent = serde_json::from_slice(payload)
        .map_err(|e| BookingError::Validation(format!("Failed to parse webhook: {}", e)))?;

    Ok(GatewayEvent {
        status: event
            .data
            .status
            .as_deref()
            .map(GatewayStatus::parse)
            .unwrap_or_else(|| GatewayStatus::Unknown(event.event.clone())),
        event: event.event,
        reference: event.data.reference,
        gateway_response: event.data.gateway_response,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "sk_test_webhook";

    #[test]
    fn test_signature_is_hex_sha512() {
        let sig = compute_signature(SECRET, b"{}");
        assert_eq!(sig.len(), 128);
        assert!(verify_signature(SECRET, b"{}", &sig).is_ok());
        assert!(verify_signature(SECRET, b"{}", &sig.to_uppercase()).is_ok());
    }

    #[test]
    fn test_rejects_tampered_payload() {
        let sig = compute_signature(SECRET, br#"{"amount":100}"#);
        assert!(matches!(
            verify_signature(SECRET, br#"{"amount":900}"#, &sig),
            Err(BookingError::SignatureInvalid(_))
        ));
        assert!(verify_signature(SECRET, b"{}", "").is_err());
        let signature = compute_signature(SECRET, b"{}");
        assert!(verify_signature("sk_test_other", b"{}", &signature).is_err());
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("abc123", "abc123"));
        assert!(!constant_time_compare("abc123", "abc124"));
        assert!(!constant_time_compare("abc", "abcd"));
    }

    #[test]
    fn test_parse_charge_success() {
        let payload = br#"{
            "event": "charge.success",
            "data": {
                "id": 302961,
                "reference": "PAY-3K9Q1ZP0X2LM",
                "status": "success",
                "gateway_response": "Approved",
                "amount": 14000000
            }
        }"#;
        let event = parse_event(payload).unwrap();
        assert_eq!(event.reference, "PAY-3K9Q1ZP0X2LM");
        assert_eq!(event.status, GatewayStatus::Success);
        assert_eq!(event.effective_status(), GatewayStatus::Success);
        assert_eq!(event.gateway_response.as_deref(), Some("Approved"));
    }

    #[test]
    fn test_parse_rejects_missing_reference() {
        assert!(parse_event(br#"{"event":"charge.success","data":{}}"#).is_err());
    }
}
