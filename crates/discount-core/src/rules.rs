//! # Default Rule Set
//!
//! The store's standing discount policy, expressed as rule instances.
//!
//! ## Item Rules (first match wins)
//! ```text
//! ┌───────┬────────────────────────┬───────────┬─────────────┬──────────────┐
//! │ Order │ Guard                  │ Threshold │ Above       │ At/below     │
//! ├───────┼────────────────────────┼───────────┼─────────────┼──────────────┤
//! │   1   │ book, VIP              │ > 20      │ × 0.85      │ × 0.90       │
//! │   2   │ book, not VIP          │ > 50      │ × 0.95      │ unchanged    │
//! │   3   │ not book, VIP          │ > 100     │ × 0.90      │ unchanged    │
//! └───────┴────────────────────────┴───────────┴─────────────┴──────────────┘
//! ```
//! Non-book items for non-VIP users match nothing and keep their price.
//!
//! ## Cart Rules (all run, in order)
//! ```text
//! ┌───────┬──────────────────────────────┬──────────────┐
//! │ Order │ Condition                    │ Effect       │
//! ├───────┼──────────────────────────────┼──────────────┤
//! │   1   │ total > 500                  │ total − 25   │
//! │   2   │ total > 200 and not VIP      │ total − 10   │
//! └───────┴──────────────────────────────┴──────────────┘
//! ```
//! Rule 2 compares the total *after* rule 1. A non-VIP cart at 505 drops to
//! 480 and then to 470.

use crate::engine::{CartRule, DiscountEngine, ItemRule};
use crate::error::{PricingResult, RuleError};
use crate::types::{Item, ItemDecision, LineItem, User};

// =============================================================================
// Policy Constants
// =============================================================================

pub const BOOK_VIP_THRESHOLD: f64 = 20.0;
pub const BOOK_NONVIP_THRESHOLD: f64 = 50.0;
pub const NONBOOK_VIP_THRESHOLD: f64 = 100.0;

/// Price multipliers (0.85 = 15% off).
pub const BOOK_VIP_HIGH_RATE: f64 = 0.85;
pub const BOOK_VIP_LOW_RATE: f64 = 0.90;
pub const BOOK_NONVIP_RATE: f64 = 0.95;
pub const NONBOOK_VIP_RATE: f64 = 0.90;

pub const CART_HIGH_THRESHOLD: f64 = 500.0;
pub const CART_LOW_THRESHOLD: f64 = 200.0;

pub const CART_HIGH_REBATE: f64 = 25.0;
pub const CART_LOW_REBATE: f64 = 10.0;

// =============================================================================
// Item Rules
// =============================================================================

/// Books bought by VIPs: 15% off above the threshold, 10% off otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct VipBookDiscount;

impl ItemRule for VipBookDiscount {
    fn name(&self) -> &str {
        "vip_book_discount"
    }

    fn evaluate(&self, line: &LineItem<'_>, user: &User) -> Result<ItemDecision, RuleError> {
        if !line.is_book() || !user.vip {
            return Ok(ItemDecision::Defer);
        }
        let rate = if line.price > BOOK_VIP_THRESHOLD {
            BOOK_VIP_HIGH_RATE
        } else {
            BOOK_VIP_LOW_RATE
        };
        Ok(ItemDecision::Override(line.price * rate))
    }
}

/// Books bought by regular users: 5% off above the threshold.
///
/// At or below the threshold the rule still decides (at the listed price),
/// which stops later item rules from touching the book.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardBookDiscount;

impl ItemRule for StandardBookDiscount {
    fn name(&self) -> &str {
        "standard_book_discount"
    }

    fn evaluate(&self, line: &LineItem<'_>, user: &User) -> Result<ItemDecision, RuleError> {
        if !line.is_book() || user.vip {
            return Ok(ItemDecision::Defer);
        }
        Ok(ItemDecision::Override(if line.price > BOOK_NONVIP_THRESHOLD {
            line.price * BOOK_NONVIP_RATE
        } else {
            line.price
        }))
    }
}

/// Everything except books, bought by VIPs: 10% off above the threshold.
#[derive(Debug, Clone, Copy, Default)]
pub struct VipGeneralDiscount;

impl ItemRule for VipGeneralDiscount {
    fn name(&self) -> &str {
        "vip_general_discount"
    }

    fn evaluate(&self, line: &LineItem<'_>, user: &User) -> Result<ItemDecision, RuleError> {
        if line.is_book() || !user.vip {
            return Ok(ItemDecision::Defer);
        }
        Ok(ItemDecision::Override(if line.price > NONBOOK_VIP_THRESHOLD {
            line.price * NONBOOK_VIP_RATE
        } else {
            line.price
        }))
    }
}

// =============================================================================
// Cart Rules
// =============================================================================

/// Flat rebate for large carts, for everyone.
#[derive(Debug, Clone, Copy, Default)]
pub struct LargeCartRebate;

impl CartRule for LargeCartRebate {
    fn name(&self) -> &str {
        "large_cart_rebate"
    }

    fn apply(&self, total: f64, _user: &User) -> Result<f64, RuleError> {
        Ok(if total > CART_HIGH_THRESHOLD {
            total - CART_HIGH_REBATE
        } else {
            total
        })
    }
}

/// Flat rebate for regular users on mid-sized carts.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardCartRebate;

impl CartRule for StandardCartRebate {
    fn name(&self) -> &str {
        "standard_cart_rebate"
    }

    fn apply(&self, total: f64, user: &User) -> Result<f64, RuleError> {
        Ok(if total > CART_LOW_THRESHOLD && !user.vip {
            total - CART_LOW_REBATE
        } else {
            total
        })
    }
}

// =============================================================================
// Entry Points
// =============================================================================

/// Builds an engine loaded with the default rules, in policy order.
pub fn default_engine() -> DiscountEngine {
    DiscountEngine::new()
        .add_item_rule(VipBookDiscount)
        .add_item_rule(StandardBookDiscount)
        .add_item_rule(VipGeneralDiscount)
        .add_cart_rule(LargeCartRebate)
        .add_cart_rule(StandardCartRebate)
}

/// Prices a cart with the default rules.
///
/// ## Example
/// ```rust
/// use discount_core::{calculate_discount, Item, User};
///
/// let items = [Item::new(250.0).with_type("electronics")];
/// let total = calculate_discount(&items, &User::regular()).unwrap();
/// assert_eq!(total, 240.0); // 250 - 10 rebate
/// ```
pub fn calculate_discount(items: &[Item], user: &User) -> PricingResult<f64> {
    default_engine().calculate(items, user)
}

// =============================================================================
// Unit Tests
// =============================================================================
