//! Service configuration loaded from the environment.

use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::money::DEFAULT_TAX_RATE;

/// Configuration loading failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable is not set.
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    /// An environment variable is set but cannot be parsed.
    #[error("invalid value for {name}: {message}")]
    Invalid {
        name: &'static str,
        message: String,
    },
}

/// Base URLs and timeout for the outbound adapters.
#[derive(Debug, Clone)]
pub struct ServiceEndpoints {
    pub catalog_url: String,
    pub seating_url: String,
    pub payment_url: String,
    pub notification_url: String,
    /// Applied to every outbound request.
    pub request_timeout: Duration,
}

/// Full service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub services: ServiceEndpoints,
    /// How long the seating service holds a reservation ahead of payment.
    pub reservation_ttl_seconds: u32,
    pub tax_rate: Decimal,
    /// Pause between outbox drain passes.
    pub outbox_dispatch_interval: Duration,
    pub host: String,
    pub port: u16,
}

impl Config {
    /// Reads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when a required variable is missing or a value
    /// cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            database_url: required("DATABASE_URL")?,
            services: ServiceEndpoints {
                catalog_url: required("CATALOG_URL")?,
                seating_url: required("SEATING_URL")?,
                payment_url: required("PAYMENT_URL")?,
                notification_url: required("NOTIFICATION_URL")?,
                request_timeout: Duration::from_secs(parsed_or(
                    "CLIENT_TIMEOUT_SECONDS",
                    30u64,
                )?),
            },
            reservation_ttl_seconds: parsed_or("SEAT_RESERVATION_TTL_SECONDS", 900u32)?,
            tax_rate: parsed_or("TAX_RATE", DEFAULT_TAX_RATE)?,
            outbox_dispatch_interval: Duration::from_secs(parsed_or(
                "OUTBOX_DISPATCH_INTERVAL_SECONDS",
                60u64,
            )?),
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parsed_or("PORT", 8080u16)?,
        })
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::Missing(name))
}

fn parsed_or<T>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            message: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}
