//! Service configuration loaded from environment variables.
//!
//! - `PORT` - listen port (default: 8083)
//! - `DATABASE_URL` - `PostgreSQL` connection string; unset keeps products in memory
//! - `NATS_URL` - event bus; unset disables publishing
//! - `APP_URL` - public storefront URL for checkout redirects (default: http://localhost:3000)
//! - `CURRENCY` - ISO currency code for prices (default: USD)
//! - `LIVE_DISCOUNT_WINDOW` - re-check discount dates on every quote (default: false)

use std::net::SocketAddr;
use crate::domain::services::PricingPolicy;
use crate::{Result, StorefrontError};

const DEFAULT_PORT: u16 = 8083;
const DEFAULT_APP_URL: &str = "http://localhost:3000";
const DEFAULT_CURRENCY: &str = "USD";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    pub database_url: Option<String>,
    pub nats_url: Option<String>,
    pub app_url: String,
    pub currency: String,
    pub live_discount_window: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            database_url: None,
            nats_url: None,
            app_url: DEFAULT_APP_URL.to_string(),
            currency: DEFAULT_CURRENCY.to_string(),
            live_discount_window: false,
        }
    }
}

impl Config {
    /// Reads `.env` if present, then the process environment.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let port = match get("PORT") {
            Some(raw) => raw.parse().map_err(|_| StorefrontError::Config(format!("PORT must be a port number, got {raw:?}")))?,
            None => DEFAULT_PORT,
        };
        let currency = get("CURRENCY").unwrap_or_else(|| DEFAULT_CURRENCY.to_string()).to_uppercase();
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(StorefrontError::Config(format!("CURRENCY must be a 3-letter code, got {currency:?}")));
        }
        let live_discount_window = match get("LIVE_DISCOUNT_WINDOW").as_deref().map(str::to_ascii_lowercase).as_deref() {
            None | Some("0" | "false" | "no" | "off") => false,
            Some("1" | "true" | "yes" | "on") => true,
            Some(other) => return Err(StorefrontError::Config(format!("LIVE_DISCOUNT_WINDOW must be a boolean, got {other:?}"))),
        };

        Ok(Self {
            port,
            database_url: get("DATABASE_URL"),
            nats_url: get("NATS_URL"),
            app_url: get("APP_URL").unwrap_or_else(|| DEFAULT_APP_URL.to_string()).trim_end_matches('/').to_string(),
            currency,
            live_discount_window,
        })
    }

    pub fn bind_addr(&self) -> SocketAddr { SocketAddr::from(([0, 0, 0, 0], self.port)) }

    pub fn pricing_policy(&self) -> PricingPolicy { PricingPolicy { live_discount_window: self.live_discount_window } }
}
