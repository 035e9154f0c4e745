//! # Validation Module
//!
//! Resolves an item's listed price before the item rules see it.
//!
//! ## Price Policies
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  item.price            Strict (default)          Coerce                 │
//! │  ─────────────         ─────────────────         ──────────────         │
//! │  Some(12.5)            12.5                      12.5                   │
//! │  Some(-3.0)            -3.0                      -3.0                   │
//! │  None                  MalformedItem error       0.0 (warn! logged)     │
//! │  Some(NaN / ±inf)      MalformedItem error       0.0 (warn! logged)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Negative prices are not rejected by either policy.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{PricingError, ValidationError};
use crate::types::Item;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Price Policy
// =============================================================================

/// What to do with an item that has no usable price.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PricePolicy {
    /// Fail the calculation with [`PricingError::MalformedItem`].
    #[default]
    Strict,
    /// Treat the price as zero and keep going.
    Coerce,
}

impl PricePolicy {
    /// Resolves the listed price of the item at `index`.
    ///
    /// ## Example
    /// ```rust
    /// use discount_core::{Item, PricePolicy};
    ///
    /// let missing = Item { price: None, item_type: None };
    /// assert!(PricePolicy::Strict.listed_price(0, &missing).is_err());
    /// assert_eq!(PricePolicy::Coerce.listed_price(0, &missing).unwrap(), 0.0);
    /// ```
    pub fn listed_price(self, index: usize, item: &Item) -> Result<f64, PricingError> {
        match (self, validate_price(item.price)) {
            (_, Ok(price)) => Ok(price),
            (PricePolicy::Strict, Err(source)) => {
                Err(PricingError::MalformedItem { index, source })
            }
            (PricePolicy::Coerce, Err(reason)) => {
                warn!(index, %reason, "Unusable item price, treating as 0");
                Ok(0.0)
            }
        }
    }
}

impl fmt::Display for PricePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PricePolicy::Strict => f.write_str("strict"),
            PricePolicy::Coerce => f.write_str("coerce"),
        }
    }
}

impl FromStr for PricePolicy {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(PricePolicy::Strict),
            "coerce" => Ok(PricePolicy::Coerce),
            _ => Err(ValidationError::NotAllowed {
                field: "price policy".to_string(),
                allowed: vec!["strict".to_string(), "coerce".to_string()],
            }),
        }
    }
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates an item price.
///
/// ## Rules
/// - Must be present
/// - Must be finite
/// - Zero and negative values are allowed
pub fn validate_price(price: Option<f64>) -> ValidationResult<f64> {
    let price = price.ok_or_else(|| ValidationError::Required {
        field: "price".to_string(),
    })?;

    if !price.is_finite() {
        return Err(ValidationError::NotFinite {
            field: "price".to_string(),
        });
    }

    Ok(price)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_price() {
        assert_eq!(validate_price(Some(10.0)), Ok(10.0));
        assert_eq!(validate_price(Some(0.0)), Ok(0.0));
        assert_eq!(validate_price(Some(-5.0)), Ok(-5.0));

        assert!(matches!(
            validate_price(None),
            Err(ValidationError::Required { .. })
        ));
        assert!(matches!(
            validate_price(Some(f64::NAN)),
            Err(ValidationError::NotFinite { .. })
        ));
        assert!(matches!(
            validate_price(Some(f64::INFINITY)),
            Err(ValidationError::NotFinite { .. })
        ));
    }

    #[test]
    fn test_strict_policy_reports_index() {
        let item = Item {
            price: None,
            item_type: None,
        };
        let err = PricePolicy::Strict.listed_price(3, &item).unwrap_err();
        assert!(matches!(err, PricingError::MalformedItem { index: 3, .. }));
    }

    #[test]
    fn test_coerce_policy_uses_zero() {
        let item = Item {
            price: Some(f64::NEG_INFINITY),
            item_type: None,
        };
        assert_eq!(PricePolicy::Coerce.listed_price(0, &item).unwrap(), 0.0);
        assert_eq!(
            PricePolicy::Coerce.listed_price(0, &Item::new(7.5)).unwrap(),
            7.5
        );
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!("strict".parse::<PricePolicy>(), Ok(PricePolicy::Strict));
        assert_eq!(" Coerce ".parse::<PricePolicy>(), Ok(PricePolicy::Coerce));
        assert!("lenient".parse::<PricePolicy>().is_err());
        assert_eq!(PricePolicy::default(), PricePolicy::Strict);
        assert_eq!(PricePolicy::Coerce.to_string(), "coerce");
    }
}
