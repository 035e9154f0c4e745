//! # Error Types
//!
//! Domain-specific error types for discount-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  PricingError         - Returned by DiscountEngine::calculate           │
//! │  ├── MalformedItem    - wraps ValidationError (unusable price)          │
//! │  └── RuleEvaluation   - wraps RuleError (a rule failed)                 │
//! │                                                                         │
//! │  ValidationError      - Input validation failures                       │
//! │  RuleError            - What a rule implementation returns              │
//! │                                                                         │
//! │  Flow: RuleError → PricingError → caller (anyhow in discount-cli)       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (line index, rule name)
//! 3. A failed calculation never carries a partial total

use thiserror::Error;

// =============================================================================
// Pricing Error
// =============================================================================

/// Errors returned by a cart calculation.
#[derive(Debug, Error)]
pub enum PricingError {
    /// An item has no usable price.
    ///
    /// ## When This Occurs
    /// - `price` is missing or `null` in the input
    /// - `price` is a string with no leading number
    /// - `price` is NaN or infinite
    ///
    /// Only raised under [`PricePolicy::Strict`](crate::PricePolicy::Strict).
    #[error("Malformed item at position {index}: {source}")]
    MalformedItem {
        index: usize,
        #[source]
        source: ValidationError,
    },

    /// A registered rule failed.
    ///
    /// `index` is the cart line being priced for item rules and `None` for
    /// cart rules.
    #[error("Rule '{rule}' failed{}: {source}", line_suffix(.index))]
    RuleEvaluation {
        rule: String,
        index: Option<usize>,
        #[source]
        source: RuleError,
    },
}

fn line_suffix(index: &Option<usize>) -> String {
    match index {
        Some(index) => format!(" on item {index}"),
        None => String::new(),
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// A required field is missing or could not be read as a number.
    #[error("{field} is required")]
    Required { field: String },

    /// Numeric value is NaN or infinite.
    #[error("{field} must be a finite number")]
    NotFinite { field: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Rule Error
// =============================================================================

/// Error type returned by rule implementations.
#[derive(Debug, Error)]
pub enum RuleError {
    /// The rule refused to price its input.
    #[error("{0}")]
    Rejected(String),

    /// Any other failure inside the rule.
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl RuleError {
    /// Convenience constructor for [`RuleError::Rejected`].
    pub fn rejected(reason: impl Into<String>) -> Self {
        RuleError::Rejected(reason.into())
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with PricingError.
pub type PricingResult<T> = Result<T, PricingError>;

// =============================================================================
// Unit Tests
// =============================================================================
