//! # Admin Gate
//!
//! Admin routes take an `AdminGuard` extractor, which accepts
//! `Authorization: Bearer <ADMIN_TOKEN>`. Identity management is external;
//! the gate only yields a principal with an `is_admin` capability.

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use serde::Serialize;
use tracing::warn;

/// Authenticated caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub subject: String,
    pub is_admin: bool,
}

impl Principal {
    pub fn admin() -> Self {
        Self {
            subject: "admin".to_string(),
            is_admin: true,
        }
    }
}

/// Extractor that only succeeds for admin principals
#[derive(Debug, Clone)]
pub struct AdminGuard(pub Principal);

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    scheme.eq_ignore_ascii_case("bearer").then(|| token.trim())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Resolve the caller from the bearer token
pub fn authenticate(parts: &Parts, admin_token: Option<&str>) -> Result<Principal, ApiError> {
    let Some(expected) = admin_token else {
        warn!("admin request refused: ADMIN_TOKEN is not configured");
        return Err(ApiError::Unauthorized("admin access is not configured".to_string()));
    };
    let token = bearer_token(parts)
        .ok_or_else(|| ApiError::Unauthorized("missing bearer token".to_string()))?;
    if !constant_time_eq(token.as_bytes(), expected.as_bytes()) {
        warn!(path = %parts.uri.path(), "admin request with wrong token");
        return Err(ApiError::Unauthorized("invalid token".to_string()));
    }
    Ok(Principal::admin())
}

impl FromRequestParts<AppState> for AdminGuard {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let principal = authenticate(parts, state.config.admin_token.as_deref())?;
        if !principal.is_admin {
            return Err(ApiError::Unauthorized("admin role required".to_string()));
        }
        Ok(AdminGuard(principal))
    }
}
