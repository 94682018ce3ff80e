//! # Booking Error Types
//!
//! Typed error handling for the innkeep booking core.
//! All booking operations return `Result<T, BookingError>`.

use crate::booking::BookingStatus;
use crate::lifecycle::BookingAction;
use thiserror::Error;

/// Core error type for all booking operations
#[derive(Debug, Error)]
pub enum BookingError {
    /// Malformed or missing input, rejected before any side effect
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Fewer rooms of the requested type are available than were asked for
    #[error("Sorry, selected number of rooms are not available (requested {requested}, available {available})")]
    InsufficientInventory { requested: u32, available: u32 },

    /// State machine guard violation
    #[error("Cannot {action} booking {booking_id} while it is {from}")]
    InvalidTransition {
        booking_id: i64,
        from: BookingStatus,
        action: BookingAction,
    },

    /// Explicit room reassignment to a room that is not free
    #[error("Selected room {room_id} is not available")]
    RoomUnavailable { room_id: i64 },

    /// Unknown booking, room, room type or payment reference
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Payment gateway or notification relay unreachable, or it returned a failure
    #[error("Upstream error [{provider}]: {message}")]
    UpstreamGateway { provider: String, message: String },

    /// Webhook authenticity check failed
    #[error("Invalid signature: {0}")]
    SignatureInvalid(String),

    /// Persistence layer failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration errors (missing keys, invalid config)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal error (should not happen)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl BookingError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        BookingError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn upstream(provider: impl Into<String>, message: impl Into<String>) -> Self {
        BookingError::UpstreamGateway {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Stable, machine-checkable error kind
    pub fn kind(&self) -> &'static str {
        match self {
            BookingError::Validation(_) => "validation_error",
            BookingError::InsufficientInventory { .. } => "insufficient_inventory",
            BookingError::InvalidTransition { .. } => "invalid_transition",
            BookingError::RoomUnavailable { .. } => "room_unavailable",
            BookingError::NotFound { .. } => "not_found",
            BookingError::UpstreamGateway { .. } => "upstream_gateway_error",
            BookingError::SignatureInvalid(_) => "signature_invalid",
            BookingError::Storage(_)
            | BookingError::Configuration(_)
            | BookingError::Internal(_) => "internal_error",
        }
    }

    /// Returns true if the caller may retry the same request later
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            BookingError::UpstreamGateway { .. } | BookingError::Storage(_)
        )
    }

    /// True for failures whose message must not reach API clients
    pub fn is_internal(&self) -> bool {
        self.kind() == "internal_error"
    }

    /// Returns the HTTP status code appropriate for this error
    pub fn status_code(&self) -> u16 {
        match self {
            BookingError::Validation(_) => 422,
            BookingError::InsufficientInventory { .. } => 422,
            BookingError::InvalidTransition { .. } => 409,
            BookingError::RoomUnavailable { .. } => 422,
            BookingError::NotFound { .. } => 404,
            BookingError::UpstreamGateway { .. } => 502,
            BookingError::SignatureInvalid(_) => 401,
            BookingError::Storage(_) => 500,
            BookingError::Configuration(_) => 500,
            BookingError::Internal(_) => 500,
        }
    }
}

impl From<validator::ValidationErrors> for BookingError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<String> = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let reasons: Vec<String> = errs
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| e.code.to_string())
                    })
                    .collect();
                if field == "__all__" {
                    reasons.join(", ")
                } else {
                    format!("{}: {}", field, reasons.join(", "))
                }
            })
            .collect();
        fields.sort();
        BookingError::Validation(fields.join("; "))
    }
}

/// Result type alias for booking operations
pub type BookingResult<T> = Result<T, BookingError>;
