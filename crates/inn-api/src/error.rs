//! # API Errors
//!
//! Every failure leaves the API as
//! `{ "error": ..., "kind": ..., "code": ..., "details": ... }`.
//! Internal failures are logged and replaced by a generic message.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use inn_core::BookingError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::error;

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: String,
    pub code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, kind: impl Into<String>, code: u16) -> Self {
        Self {
            error: error.into(),
            kind: kind.into(),
            code,
            details: None,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Booking(#[from] BookingError),

    /// Missing or wrong admin credentials
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        let code = match self {
            ApiError::Booking(err) => err.status_code(),
            ApiError::Unauthorized(_) => 401,
        };
        StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn to_response(&self) -> ErrorResponse {
        let code = self.status_code().as_u16();
        match self {
            ApiError::Unauthorized(message) => {
                ErrorResponse::new(message.clone(), "unauthorized", code)
            }
            ApiError::Booking(err) if err.is_internal() => {
                error!(error = %err, "internal error");
                ErrorResponse::new("internal error", err.kind(), code)
            }
            ApiError::Booking(err) => {
                let response = ErrorResponse::new(err.to_string(), err.kind(), code);
                match err {
                    BookingError::InsufficientInventory {
                        requested,
                        available,
                    } => response.with_details(json!({
                        "requested": requested,
                        "available": available,
                    })),
                    BookingError::InvalidTransition {
                        booking_id,
                        from,
                        action,
                    } => response.with_details(json!({
                        "booking_id": booking_id,
                        "from": from,
                        "action": action,
                    })),
                    BookingError::UpstreamGateway { provider, .. } => {
                        response.with_details(json!({ "provider": provider, "retryable": true }))
                    }
                    _ => response,
                }
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.to_response())).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// `Json` whose rejections use the API error body
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(json_rejection(rejection)),
        }
    }
}

fn json_rejection(rejection: JsonRejection) -> ApiError {
    BookingError::Validation(rejection.body_text()).into()
}

/// `Query` whose rejections use the API error body
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match axum::extract::Query::<T>::from_request_parts(parts, state).await {
            Ok(axum::extract::Query(value)) => Ok(ApiQuery(value)),
            Err(rejection) => Err(query_rejection(rejection)),
        }
    }
}

fn query_rejection(rejection: QueryRejection) -> ApiError {
    BookingError::Validation(rejection.body_text()).into()
}

/// `Path` whose rejections use the API error body
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiPath<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match axum::extract::Path::<T>::from_request_parts(parts, state).await {
            Ok(axum::extract::Path(value)) => Ok(ApiPath(value)),
            Err(rejection) => Err(path_rejection(rejection)),
        }
    }
}

fn path_rejection(rejection: PathRejection) -> ApiError {
    BookingError::Validation(rejection.body_text()).into()
}
