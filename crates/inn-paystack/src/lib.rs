//! # inn-paystack
//!
//! Paystack payment gateway for innkeep-rs.
//!
//! Guests are sent to Paystack's hosted payment page; the outcome comes back
//! through two paths that may race:
//!
//! 1. **Callback / polling** - the guest's browser returns to
//!    `PAYSTACK_CALLBACK_URL`, and the API calls `verify_transaction`
//! 2. **Webhook** - Paystack pushes `charge.success` to `/webhook/paystack`,
//!    signed with `X-Paystack-Signature`
//!
//! Both end in the core's payment reconciliation, which handles duplicate
//! deliveries.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use inn_paystack::PaystackGateway;
//! use inn_core::{BookingService, PaymentGateway};
//!
//! // Create gateway from environment
//! let gateway = Arc::new(PaystackGateway::from_env()?);
//! let service = BookingService::new(store, gateway);
//!
//! // Open a payment page for a pending booking
//! let payment = service.initiate_payment(booking_id).await?;
//!
//! // Redirect the guest to payment.authorization_url
//! ```

pub mod config;
pub mod transaction;
pub mod webhook;

// Re-exports
pub use config::PaystackConfig;
pub use transaction::PaystackGateway;
pub use webhook::{compute_signature, verify_signature, SIGNATURE_HEADER};
