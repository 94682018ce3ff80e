//! # Paystack Transactions
//!
//! `PaymentGateway` implementation over the Paystack Transactions API:
//! `POST /transaction/initialize` and `GET /transaction/verify/:reference`.

use crate::config::PaystackConfig;
use crate::webhook;
use async_trait::async_trait;
use inn_core::{
    BookingError, BookingResult, GatewayEvent, GatewayStatus, InitializeTransaction,
    PaymentGateway, PaymentInit, Verification,
};
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument};

const PROVIDER: &str = "paystack";

/// Paystack gateway
///
/// Guests pay on Paystack's hosted page; the booking is reconciled either
/// from the callback (verify) or from the signed webhook.
pub struct PaystackGateway {
    config: PaystackConfig,
    client: Client,
}

impl PaystackGateway {
    /// Create a new Paystack gateway
    pub fn new(config: PaystackConfig) -> BookingResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                BookingError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { config, client })
    }

    /// Create from environment variables
    pub fn from_env() -> BookingResult<Self> {
        Self::new(PaystackConfig::from_env()?)
    }

    pub fn config(&self) -> &PaystackConfig {
        &self.config
    }

    /// API URL with each segment percent-encoded, so a reference cannot alter the path
    fn endpoint(&self, segments: &[&str]) -> BookingResult<Url> {
        let mut url = Url::parse(&self.config.api_base_url).map_err(|e| {
            BookingError::Configuration(format!(
                "Invalid Paystack API base URL {}: {}",
                self.config.api_base_url, e
            ))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                BookingError::Configuration(format!(
                    "Paystack API base URL cannot take a path: {}",
                    self.config.api_base_url
                ))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Read a Paystack envelope, turning transport and API failures into upstream errors
    async fn read_envelope<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> BookingResult<T> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| BookingError::upstream(PROVIDER, e.to_string()))?;

        let envelope: PaystackEnvelope<T> = match serde_json::from_str(&body) {
            Ok(envelope) => envelope,
            Err(e) => {
                error!(%status, body = %body, "unreadable Paystack response");
                return Err(BookingError::upstream(
                    PROVIDER,
                    format!("HTTP {}: unreadable response ({})", status, e),
                ));
            }
        };

        match (status.is_success() && envelope.status, envelope.data) {
            (true, Some(data)) => Ok(data),
            _ => {
                error!(%status, message = %envelope.message, "Paystack API error");
                Err(BookingError::upstream(
                    PROVIDER,
                    format!("HTTP {}: {}", status, envelope.message),
                ))
            }
        }
    }
}

#[async_trait]
impl PaymentGateway for PaystackGateway {
    #[instrument(
        skip(self, request),
        fields(reference = %request.reference, booking_id = request.booking_id)
    )]
    async fn initialize_transaction(
        &self,
        request: &InitializeTransaction,
    ) -> BookingResult<PaymentInit> {
        let body = InitializeBody {
            email: &request.email,
            amount: request.amount_minor,
            reference: &request.reference,
            currency: &self.config.currency,
            callback_url: &request.callback_url,
            metadata: InitializeMetadata {
                booking_id: request.booking_id,
            },
        };

        debug!(
            amount = request.amount_minor,
            currency = %self.config.currency,
            "initializing transaction"
        );

        let url = self.endpoint(&["transaction", "initialize"])?;
        let response = self
            .client
            .post(url)
            .header("Authorization", self.config.auth_header())
            .json(&body)
            .send()
            .await
            .map_err(|e| BookingError::upstream(PROVIDER, e.to_string()))?;

        let data: InitializeData = self.read_envelope(response).await?;
        info!(authorization_url = %data.authorization_url, "transaction initialized");

        Ok(PaymentInit {
            reference: data.reference.unwrap_or_else(|| request.reference.clone()),
            authorization_url: data.authorization_url,
            access_code: data.access_code,
        })
    }

    #[instrument(skip(self))]
    async fn verify_transaction(&self, reference: &str) -> BookingResult<Verification> {
        let url = self.endpoint(&["transaction", "verify", reference])?;
        let response = self
            .client
            .get(url)
            .header("Authorization", self.config.auth_header())
            .send()
            .await
            .map_err(|e| BookingError::upstream(PROVIDER, e.to_string()))?;

        let data: VerifyData = self.read_envelope(response).await?;
        let status = GatewayStatus::parse(&data.status);
        info!(%status, gateway_response = ?data.gateway_response, "transaction verified");

        Ok(Verification {
            reference: data.reference.unwrap_or_else(|| reference.to_string()),
            status,
            gateway_response: data.gateway_response,
            amount_minor: data.amount,
        })
    }

    #[instrument(skip(self, payload, signature))]
    async fn verify_webhook(&self, payload: &[u8], signature: &str) -> BookingResult<GatewayEvent> {
        webhook::verify_signature(&self.config.secret_key, payload, signature)?;
        let event = webhook::parse_event(payload)?;
        debug!(event = %event.event, reference = %event.reference, "verified Paystack webhook");
        Ok(event)
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}

// =============================================================================
// Paystack API Types
// =============================================================================

#[derive(Debug, Serialize)]
struct InitializeBody<'a> {
    email: &'a str,
    amount: i64,
    reference: &'a str,
    currency: &'a str,
    callback_url: &'a str,
    metadata: InitializeMetadata,
}

#[derive(Debug, Serialize)]
struct InitializeMetadata {
    booking_id: i64,
}

#[derive(Debug, Deserialize)]
struct PaystackEnvelope<T> {
    status: bool,
    #[serde(default)]
    message: String,
    #[serde(default = "Option::default")]
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct InitializeData {
    authorization_url: String,
    #[serde(default)]
    access_code: Option<String>,
    #[serde(default)]
    reference: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VerifyData {
    status: String,
    #[serde(default)]
    reference: Option<String>,
    #[serde(default)]
    amount: Option<i64>,
    #[serde(default)]
    gateway_response: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn gateway(server: &MockServer) -> PaystackGateway {
        let config = PaystackConfig::new("sk_test_abc123", "https://hotel.example/api/v1/payments/confirm")
            .with_api_base_url(server.uri());
        PaystackGateway::new(config).unwrap()
    }

    fn init_request() -> InitializeTransaction {
        InitializeTransaction {
            reference: "PAY-3K9Q1ZP0X2LM".into(),
            amount_minor: 14_000_000,
            email: "ada@example.com".into(),
            callback_url: "https://hotel.example/api/v1/payments/confirm".into(),
            booking_id: 7,
        }
    }

    #[tokio::test]
    async fn test_initialize_sends_minor_units_and_reference() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/transaction/initialize"))
            .and(header("Authorization", "Bearer sk_test_abc123"))
            .and(body_partial_json(json!({
                "amount": 14000000,
                "reference": "PAY-3K9Q1ZP0X2LM",
                "currency": "NGN",
                "metadata": { "booking_id": 7 }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": true,
                "message": "Authorization URL created",
                "data": {
                    "authorization_url": "https://checkout.paystack.com/0peioxfhpn",
                    "access_code": "0peioxfhpn",
                    "reference": "PAY-3K9Q1ZP0X2LM"
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let init = gateway(&server).initialize_transaction(&init_request()).await.unwrap();
        assert_eq!(init.authorization_url, "https://checkout.paystack.com/0peioxfhpn");
        assert_eq!(init.access_code.as_deref(), Some("0peioxfhpn"));
    }

    #[tokio::test]
    async fn test_initialize_failure_is_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/transaction/initialize"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "status": false,
                "message": "Duplicate Transaction Reference"
            })))
            .mount(&server)
            .await;

        let err = gateway(&server)
            .initialize_transaction(&init_request())
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::UpstreamGateway { .. }));
        assert!(err.to_string().contains("Duplicate Transaction Reference"));
    }

    #[tokio::test]
    async fn test_verify_maps_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/transaction/verify/PAY-X"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": true,
                "message": "Verification successful",
                "data": {
                    "status": "abandoned",
                    "reference": "PAY-X",
                    "amount": 14000000,
                    "gateway_response": "The transaction was not completed"
                }
            })))
            .mount(&server)
            .await;

        let verification = gateway(&server).verify_transaction("PAY-X").await.unwrap();
        assert_eq!(verification.status, GatewayStatus::Abandoned);
        assert!(verification.status.is_non_fatal());
        assert_eq!(verification.amount_minor, Some(14_000_000));
    }

    #[tokio::test]
    async fn test_verify_encodes_reference_as_one_segment() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/transaction/verify/PAY%2F..%2Finitialize%3Fx=1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": true,
                "message": "Verification successful",
                "data": { "status": "failed", "reference": "PAY/../initialize?x=1" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let verification = gateway(&server)
            .verify_transaction("PAY/../initialize?x=1")
            .await
            .unwrap();
        assert_eq!(verification.status, GatewayStatus::Failed);
    }

    #[test]
    fn test_endpoint_tolerates_trailing_slash() {
        let config = PaystackConfig::new("sk_test_abc123", "http://localhost/cb")
            .with_api_base_url("https://api.paystack.co/");
        let gateway = PaystackGateway::new(config).unwrap();
        let url = gateway.endpoint(&["transaction", "verify", "PAY-X"]).unwrap();
        assert_eq!(url.as_str(), "https://api.paystack.co/transaction/verify/PAY-X");
    }

    #[tokio::test]
    async fn test_verify_unreachable_gateway() {
        let config = PaystackConfig::new("sk_test_abc123", "http://localhost/cb")
            .with_api_base_url("http://127.0.0.1:9");
        let err = PaystackGateway::new(config)
            .unwrap()
            .verify_transaction("PAY-X")
            .await
            .unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_webhook_roundtrip() {
        let server = MockServer::start().await;
        let gateway = gateway(&server);
        let payload =
            br#"{"event":"charge.success","data":{"reference":"PAY-X","status":"success"}}"#;
        let signature = webhook::compute_signature("sk_test_abc123", payload);

        let event = gateway.verify_webhook(payload, &signature).await.unwrap();
        assert_eq!(event.reference, "PAY-X");

        assert!(matches!(
            gateway.verify_webhook(payload, "deadbeef").await,
            Err(BookingError::SignatureInvalid(_))
        ));
    }
}
