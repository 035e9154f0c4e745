//! # discount-core: Rule-Chain Cart Pricing
//!
//! Prices a shopping cart by running every line through an ordered chain of
//! item rules, summing the results, and running the subtotal through an
//! ordered chain of cart rules.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Cart Discount Engine                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    discount-cli (binary)                        │   │
//! │  │      env config ──► JSON cart ──► total / breakdown             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ discount-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐   │   │
//! │  │   │   types   │  │  engine   │  │   rules   │  │ validation│   │   │
//! │  │   │   Item    │  │ ItemRule  │  │ VIP/book  │  │   price   │   │   │
//! │  │   │   User    │  │ CartRule  │  │  rebates  │  │  policy   │   │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘   │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO SHARED STATE • PURE FUNCTIONS                     │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Input items and user, rule decisions, breakdown output
//! - [`engine`] - Rule traits and the [`DiscountEngine`] chain evaluator
//! - [`rules`] - The default discount policy
//! - [`validation`] - Price resolution under a [`PricePolicy`]
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use discount_core::{default_engine, Item, User};
//!
//! let engine = default_engine();
//! let items = [Item::new(600.0).with_type("electronics")];
//!
//! // 600 × 0.90 = 540, then 540 > 500 so 25 off
//! let total = engine.calculate(&items, &User::vip()).unwrap();
//! assert!((total - 515.0).abs() < 1e-9);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod engine;
pub mod error;
pub mod rules;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use engine::{CartRule, CartRuleFn, DiscountEngine, ItemRule, ItemRuleFn};
pub use error::{PricingError, PricingResult, RuleError, ValidationError};
pub use rules::{calculate_discount, default_engine};
pub use types::*;
pub use validation::PricePolicy;
