//! Runtime configuration read from the environment.

use std::net::SocketAddr;

use bazaar_shipping::application::quote_handlers::QuoteSettings;
use bazaar_shipping::application::resolution::LineResolution;
use rust_decimal::Decimal;

use crate::error::AppError;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Postgres connection string.
    pub database_url: String,
    /// Pool size.
    pub database_max_connections: u32,
    /// Interface to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
    /// Marketplace currency code.
    pub currency: String,
    /// VAT rate used for the price split, in percent.
    pub vat_rate_percent: Decimal,
    /// What to do with cart lines whose product is gone.
    pub line_resolution: LineResolution,
    /// Base URL of the hosted payment page.
    pub payment_redirect_base_url: String,
    /// OTLP collector endpoint; export is off when unset.
    pub otel_exporter_otlp_endpoint: Option<String>,
    /// Service name reported to the collector.
    pub otel_service_name: String,
}

impl AppConfig {
    /// Reads the configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a required variable is missing or a
    /// value does not parse.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a required variable is missing or a
    /// value does not parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let var = |key: &str, default: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_owned())
        };

        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| {
                AppError::Config("DATABASE_URL environment variable must be set".to_owned())
            })?;
        let port = var("PORT", "3000")
            .parse()
            .map_err(|e| AppError::Config(format!("PORT must be a valid u16: {e}")))?;
        let database_max_connections = var("DATABASE_MAX_CONNECTIONS", "10")
            .parse()
            .map_err(|e| {
                AppError::Config(format!("DATABASE_MAX_CONNECTIONS must be a valid u32: {e}"))
            })?;
        let vat_rate_percent: Decimal = var("VAT_RATE_PERCENT", "19")
            .parse()
            .map_err(|e| AppError::Config(format!("VAT_RATE_PERCENT must be a decimal: {e}")))?;
        if vat_rate_percent.is_sign_negative() {
            return Err(AppError::Config(
                "VAT_RATE_PERCENT must not be negative".to_owned(),
            ));
        }
        let line_resolution = var("LINE_RESOLUTION", "best_effort")
            .parse()
            .map_err(AppError::Config)?;
        let currency = var("MARKETPLACE_CURRENCY", "RON").to_ascii_uppercase();

        Ok(Self {
            database_url,
            database_max_connections,
            host: var("HOST", "0.0.0.0"),
            port,
            currency,
            vat_rate_percent,
            line_resolution,
            payment_redirect_base_url: var("PAYMENT_REDIRECT_BASE_URL", "https://pay.example.test"),
            otel_exporter_otlp_endpoint: lookup("OTEL_EXPORTER_OTLP_ENDPOINT")
                .filter(|v| !v.trim().is_empty()),
            otel_service_name: var("OTEL_SERVICE_NAME", env!("CARGO_PKG_NAME")),
        })
    }

    /// Socket address to listen on.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `HOST:PORT` is not a socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr, AppError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))
    }

    /// Quote settings derived from the marketplace configuration.
    #[must_use]
    pub fn quote_settings(&self) -> QuoteSettings {
        QuoteSettings {
            currency: self.currency.clone(),
            line_resolution: self.line_resolution,
        }
    }
}
