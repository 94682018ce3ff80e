//! # Application State
//!
//! Shared state for the Axum application.
//! Contains the booking service, the request status log and configuration.

use crate::status_log::StatusLog;
use inn_core::{BookingService, RoomSelection};
use std::net::SocketAddr;
use std::sync::Arc;

const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 24 * 60 * 60;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Base URL for callbacks
    pub base_url: String,
    /// Environment (development, staging, production)
    pub environment: String,
    /// Bearer token accepted on admin routes
    pub admin_token: Option<String>,
    /// Postgres connection string; the in-memory store is used when absent
    pub database_url: Option<String>,
    /// Room catalog used to seed an empty store
    pub room_catalog_path: String,
    /// HTTP email relay for guest/admin notices
    pub notify_relay_url: Option<String>,
    /// Recipient of admin notices
    pub admin_email: Option<String>,
    /// Seconds between auto-checkout sweeps
    pub sweep_interval_secs: u64,
    pub room_selection: RoomSelection,
}

impl AppConfig {
    /// Load from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let port = match lookup("PORT") {
            Some(raw) => raw
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT is not a valid port: {}", raw))?,
            None => 8080,
        };

        let sweep_interval_secs = match lookup("SWEEP_INTERVAL_SECS") {
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => secs,
                _ => anyhow::bail!("SWEEP_INTERVAL_SECS must be a positive number: {}", raw),
            },
            None => DEFAULT_SWEEP_INTERVAL_SECS,
        };

        let room_selection = match lookup("ROOM_SELECTION") {
            Some(raw) => RoomSelection::parse(&raw)
                .ok_or_else(|| {
                    anyhow::anyhow!("ROOM_SELECTION must be lowest_id or random: {}", raw)
                })?,
            None => RoomSelection::default(),
        };

        let config = Self {
            host: lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port,
            base_url: lookup("BASE_URL").unwrap_or_else(|| "http://localhost:8080".to_string()),
            environment: lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
            admin_token: lookup("ADMIN_TOKEN").filter(|t| !t.trim().is_empty()),
            database_url: lookup("DATABASE_URL").filter(|u| !u.trim().is_empty()),
            room_catalog_path: lookup("ROOM_CATALOG_PATH")
                .unwrap_or_else(|| "config/rooms.toml".to_string()),
            notify_relay_url: lookup("NOTIFY_RELAY_URL").filter(|u| !u.trim().is_empty()),
            admin_email: lookup("ADMIN_EMAIL").filter(|e| !e.trim().is_empty()),
            sweep_interval_secs,
            room_selection,
        };

        if config.is_production() && config.admin_token.is_none() {
            anyhow::bail!("ADMIN_TOKEN must be set in production");
        }

        Ok(config)
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| {
                anyhow::anyhow!("Invalid socket address {}:{}: {}", self.host, self.port, e)
            })
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: BookingService,
    /// Recent `/api/` request outcomes for the admin status page
    pub status_log: StatusLog,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(service: BookingService, config: AppConfig) -> Self {
        Self {
            service,
            status_log: StatusLog::default(),
            config: Arc::new(config),
        }
    }

    /// Builder: set status log
    pub fn with_status_log(mut self, status_log: StatusLog) -> Self {
        self.status_log = status_log;
        self
    }
}
