//! Environment-driven configuration.
//!
//! Values come from the process environment, after `main` has loaded any
//! `.env` file with `dotenvy`.

use std::str::FromStr;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::pricing::ShippingPolicy;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub port: u16,
    /// In-memory store when unset.
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub nats_url: Option<String>,
    pub currency: String,
    pub shipping: ShippingPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8083,
            database_url: None,
            database_max_connections: 10,
            nats_url: None,
            currency: "USD".to_string(),
            shipping: ShippingPolicy::default(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        Ok(Self {
            port: parse(&get, "PORT")?.unwrap_or(defaults.port),
            database_url: get("DATABASE_URL"),
            database_max_connections: parse(&get, "DATABASE_MAX_CONNECTIONS")?.unwrap_or(defaults.database_max_connections),
            nats_url: get("NATS_URL"),
            currency: get("STORE_CURRENCY").map(|c| c.to_uppercase()).unwrap_or(defaults.currency),
            shipping: ShippingPolicy {
                fee: parse(&get, "SHIPPING_FEE")?.unwrap_or(Decimal::ZERO),
                free_threshold: parse(&get, "FREE_SHIPPING_THRESHOLD")?,
            },
        })
    }
}

fn parse<T: FromStr>(get: &impl Fn(&str) -> Option<String>, key: &'static str) -> Result<Option<T>, ConfigError> {
    get(key)
        .map(|value| value.parse().map_err(|_| ConfigError::Invalid { key, value }))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("PORT", "9000"),
            ("DATABASE_URL", "postgres://localhost/shop"),
            ("STORE_CURRENCY", "eur"),
            ("SHIPPING_FEE", "4.99"),
            ("FREE_SHIPPING_THRESHOLD", "50"),
            ("NATS_URL", " "),
        ]))
        .unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/shop"));
        assert_eq!(config.currency, "EUR");
        assert_eq!(config.shipping.fee, Decimal::new(499, 2));
        assert_eq!(config.shipping.free_threshold, Some(Decimal::new(50, 0)));
        assert_eq!(config.nats_url, None);
    }

    #[test]
    fn test_invalid_value() {
        let err = Config::from_lookup(lookup(&[("PORT", "eighty")])).unwrap_err();
        assert_eq!(err, ConfigError::Invalid { key: "PORT", value: "eighty".into() });
    }
}
