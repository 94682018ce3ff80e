//! # inn-api
//!
//! HTTP API layer for innkeep-rs.
//!
//! This crate provides:
//! - Axum-based HTTP server
//! - Public booking, availability and payment endpoints
//! - Admin endpoints behind a bearer-token gate
//! - The signed payment webhook
//! - An HTTP notification relay and the daily auto-checkout scheduler
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Health check |
//! | GET | `/api/v1/rooms/availability` | Available rooms per type |
//! | POST | `/api/v1/bookings` | Reserve rooms |
//! | POST | `/api/v1/payments/initiate` | Open a payment page |
//! | GET/POST | `/api/v1/payments/confirm` | Verify a payment |
//! | GET | `/api/v1/admin/bookings` | Search bookings (admin) |
//! | POST | `/webhook/paystack` | Paystack webhook |

pub mod auth;
pub mod error;
pub mod handlers;
pub mod notifier;
pub mod routes;
pub mod scheduler;
pub mod state;
pub mod status_log;

#[cfg(test)]
mod testing;

pub use error::{ApiError, ApiResult, ErrorResponse};
pub use notifier::RelayNotifier;
pub use routes::create_router;
pub use scheduler::spawn_sweeper;
pub use state::{AppConfig, AppState};
pub use status_log::StatusLog;
