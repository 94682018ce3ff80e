//! # Paystack Configuration
//!
//! Configuration management for the Paystack integration.
//! All secrets are loaded from environment variables.

use inn_core::BookingError;
use std::env;

const DEFAULT_API_BASE_URL: &str = "https://api.paystack.co";

/// Paystack API configuration
#[derive(Debug, Clone)]
pub struct PaystackConfig {
    /// Secret API key (sk_test_... or sk_live_...), also the webhook signing key
    pub secret_key: String,

    /// Public key (pk_test_... or pk_live_...)
    pub public_key: Option<String>,

    /// ISO currency code charged in (e.g., "NGN")
    pub currency: String,

    /// Where Paystack redirects the guest after payment
    pub callback_url: String,

    /// API base URL (for testing/mocking)
    pub api_base_url: String,

    /// Per-request timeout
    pub timeout_secs: u64,
}

impl PaystackConfig {
    /// Load configuration from environment variables.
    ///
    /// Required env vars:
    /// - `PAYSTACK_SECRET_KEY`
    ///
    /// Optional: `PAYSTACK_PUBLIC_KEY`, `PAYSTACK_CURRENCY` (NGN),
    /// `PAYSTACK_CALLBACK_URL` (`{BASE_URL}/api/v1/payments/confirm`),
    /// `PAYSTACK_API_BASE_URL`, `PAYSTACK_TIMEOUT_SECS` (30)
    pub fn from_env() -> Result<Self, BookingError> {
        dotenvy::dotenv().ok(); // Load .env file if present
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, BookingError> {
        let secret_key = lookup("PAYSTACK_SECRET_KEY").ok_or_else(|| {
            BookingError::Configuration("PAYSTACK_SECRET_KEY not set".to_string())
        })?;

        // Validate key formats
        if !secret_key.starts_with("sk_test_") && !secret_key.starts_with("sk_live_") {
            return Err(BookingError::Configuration(
                "PAYSTACK_SECRET_KEY must start with sk_test_ or sk_live_".to_string(),
            ));
        }

        let public_key = lookup("PAYSTACK_PUBLIC_KEY");
        if let Some(key) = &public_key {
            if !key.starts_with("pk_test_") && !key.starts_with("pk_live_") {
                return Err(BookingError::Configuration(
                    "PAYSTACK_PUBLIC_KEY must start with pk_test_ or pk_live_".to_string(),
                ));
            }
        }

        let base_url = lookup("BASE_URL").unwrap_or_else(|| "http://localhost:8080".to_string());
        let callback_url = lookup("PAYSTACK_CALLBACK_URL")
            .unwrap_or_else(|| {
                format!("{}/api/v1/payments/confirm", base_url.trim_end_matches('/'))
            });

        let timeout_secs = match lookup("PAYSTACK_TIMEOUT_SECS") {
            Some(raw) => raw.parse().map_err(|_| {
                BookingError::Configuration(format!("PAYSTACK_TIMEOUT_SECS is not a number: {}", raw))
            })?,
            None => 30,
        };

        Ok(Self {
            secret_key,
            public_key,
            currency: lookup("PAYSTACK_CURRENCY").unwrap_or_else(|| "NGN".to_string()),
            callback_url,
            api_base_url: lookup("PAYSTACK_API_BASE_URL")
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
            timeout_secs,
        })
    }

    /// Create config with explicit values (for testing)
    pub fn new(secret_key: impl Into<String>, callback_url: impl Into<String>) -> Self {
        Self {
            secret_key: secret_key.into(),
            public_key: None,
            currency: "NGN".to_string(),
            callback_url: callback_url.into(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout_secs: 30,
        }
    }

    /// Check if using test keys
    pub fn is_test_mode(&self) -> bool {
        self.secret_key.starts_with("sk_test_")
    }

    /// Check if using live keys
    pub fn is_live_mode(&self) -> bool {
        self.secret_key.starts_with("sk_live_")
    }

    /// Get authorization header value
    pub fn auth_header(&self) -> String {
        format!("Bearer {}", self.secret_key)
    }

    /// Builder: set custom API base URL (for testing)
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// Builder: set currency
    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }
}
