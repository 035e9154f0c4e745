//! CLI configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use std::env;

use discount_core::PricePolicy;
use serde::{Deserialize, Serialize};

/// CLI configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CliConfig {
    /// tracing filter directive, e.g. `info` or `discount_core=debug`
    pub log_filter: String,

    /// Handling of items without a usable price
    pub price_policy: PricePolicy,
}

impl Default for CliConfig {
    fn default() -> Self {
        CliConfig {
            log_filter: "info".to_string(),
            price_policy: PricePolicy::Strict,
        }
    }
}

impl CliConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = CliConfig::default();

        let log_filter = lookup("DISCOUNT_LOG")
            .filter(|value| !value.trim().is_empty())
            .unwrap_or(defaults.log_filter);

        let price_policy = match lookup("DISCOUNT_PRICE_POLICY") {
            Some(value) => value
                .parse()
                .map_err(|_| ConfigError::InvalidValue("DISCOUNT_PRICE_POLICY".to_string()))?,
            None => defaults.price_policy,
        };

        Ok(CliConfig {
            log_filter,
            price_policy,
        })
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<CliConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        CliConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        assert_eq!(load(&[]).unwrap(), CliConfig::default());
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("DISCOUNT_LOG", "discount_core=debug"),
            ("DISCOUNT_PRICE_POLICY", "coerce"),
        ])
        .unwrap();
        assert_eq!(config.log_filter, "discount_core=debug");
        assert_eq!(config.price_policy, PricePolicy::Coerce);
    }

    #[test]
    fn test_blank_log_filter_falls_back() {
        let config = load(&[("DISCOUNT_LOG", "  ")]).unwrap();
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn test_invalid_policy() {
        let err = load(&[("DISCOUNT_PRICE_POLICY", "loose")]).unwrap_err();
        assert_eq!(err.to_string(), "Invalid value for DISCOUNT_PRICE_POLICY");
    }
}
