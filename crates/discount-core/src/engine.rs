//! # Rule Chain Engine
//!
//! Holds the ordered item rules and cart rules and evaluates a cart through
//! them.
//!
//! ## Evaluation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         calculate(items, user)                          │
//! │                                                                         │
//! │  for each item (input order)                                            │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  PricePolicy::listed_price ──► Err ──► MalformedItem (abort)            │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  item rule 1 ──Defer──► item rule 2 ──Defer──► ... ──► listed price     │
//! │     │                      │                                            │
//! │  Override(p)            Override(p)     (first Override wins)           │
//! │     └──────────┬───────────┘                                            │
//! │                ▼                                                        │
//! │            subtotal += p                                                │
//! │                                                                         │
//! │  total = subtotal                                                       │
//! │  total = cart rule 1(total) ──► cart rule 2(total) ──► ... (all run)    │
//! │                                                                         │
//! │  Any rule Err ──► RuleEvaluation (abort, no partial total)              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Build, Then Share
//! Registration consumes the engine and hands it back, so once an engine is
//! wrapped in an `Arc` it can no longer change. Both rule traits are
//! `Send + Sync`, which makes a built engine safe to evaluate from many
//! threads at once.

use std::fmt;

use tracing::{debug, trace};

use crate::error::{PricingError, PricingResult, RuleError};
use crate::types::{
    CartAdjustment, Item, ItemDecision, LineItem, LineOutcome, PriceBreakdown, User,
};
use crate::validation::PricePolicy;

// =============================================================================
// Rule Traits
// =============================================================================

/// A per-item pricing override.
///
/// Returning [`ItemDecision::Override`] prices the item and skips every item
/// rule registered after this one. Implementations must not keep state
/// between calls.
pub trait ItemRule: Send + Sync {
    /// Name used in logs, errors and breakdowns.
    fn name(&self) -> &str;

    fn evaluate(&self, line: &LineItem<'_>, user: &User) -> Result<ItemDecision, RuleError>;
}

/// A whole-cart adjustment applied to the running total.
///
/// Every cart rule runs, in order, and receives the previous rule's output.
pub trait CartRule: Send + Sync {
    /// Name used in logs, errors and breakdowns.
    fn name(&self) -> &str;

    fn apply(&self, total: f64, user: &User) -> Result<f64, RuleError>;
}

// =============================================================================
// Closure Adapters
// =============================================================================

/// An [`ItemRule`] backed by a closure.
pub struct ItemRuleFn<F> {
    name: String,
    f: F,
}

impl<F> ItemRuleFn<F>
where
    F: Fn(&LineItem<'_>, &User) -> Result<ItemDecision, RuleError> + Send + Sync,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        ItemRuleFn {
            name: name.into(),
            f,
        }
    }
}

impl<F> ItemRule for ItemRuleFn<F>
where
    F: Fn(&LineItem<'_>, &User) -> Result<ItemDecision, RuleError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn evaluate(&self, line: &LineItem<'_>, user: &User) -> Result<ItemDecision, RuleError> {
        (self.f)(line, user)
    }
}

/// A [`CartRule`] backed by a closure.
pub struct CartRuleFn<F> {
    name: String,
    f: F,
}

impl<F> CartRuleFn<F>
where
    F: Fn(f64, &User) -> Result<f64, RuleError> + Send + Sync,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        CartRuleFn {
            name: name.into(),
            f,
        }
    }
}

impl<F> CartRule for CartRuleFn<F>
where
    F: Fn(f64, &User) -> Result<f64, RuleError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, total: f64, user: &User) -> Result<f64, RuleError> {
        (self.f)(total, user)
    }
}

// =============================================================================
// Discount Engine
// =============================================================================

/// Ordered item-rule and cart-rule chains.
///
/// ## Example
/// ```rust
/// use discount_core::{DiscountEngine, Item, ItemDecision, User};
///
/// let engine = DiscountEngine::new()
///     .add_item_rule_fn("half_price_books", |line, _user| {
///         Ok(if line.is_book() {
///             ItemDecision::Override(line.price / 2.0)
///         } else {
///             ItemDecision::Defer
///         })
///     })
///     .add_cart_rule_fn("flat_five_off", |total, _user| Ok(total - 5.0));
///
/// let items = [Item::book(40.0), Item::new(10.0)];
/// let total = engine.calculate(&items, &User::regular()).unwrap();
/// assert_eq!(total, 25.0); // 20 + 10 - 5
/// ```
#[derive(Default)]
pub struct DiscountEngine {
    item_rules: Vec<Box<dyn ItemRule>>,
    cart_rules: Vec<Box<dyn CartRule>>,
    price_policy: PricePolicy,
}

impl DiscountEngine {
    /// Creates an engine with no rules and the strict price policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an item rule to the end of the item-rule chain.
    pub fn add_item_rule(mut self, rule: impl ItemRule + 'static) -> Self {
        self.item_rules.push(Box::new(rule));
        self
    }

    /// Appends a cart rule to the end of the cart-rule chain.
    pub fn add_cart_rule(mut self, rule: impl CartRule + 'static) -> Self {
        self.cart_rules.push(Box::new(rule));
        self
    }

    /// Appends a closure as an item rule.
    pub fn add_item_rule_fn<F>(self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&LineItem<'_>, &User) -> Result<ItemDecision, RuleError> + Send + Sync + 'static,
    {
        self.add_item_rule(ItemRuleFn::new(name, f))
    }

    /// Appends a closure as a cart rule.
    pub fn add_cart_rule_fn<F>(self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(f64, &User) -> Result<f64, RuleError> + Send + Sync + 'static,
    {
        self.add_cart_rule(CartRuleFn::new(name, f))
    }

    /// Sets how items without a usable price are handled.
    pub fn with_price_policy(mut self, policy: PricePolicy) -> Self {
        self.price_policy = policy;
        self
    }

    pub fn price_policy(&self) -> PricePolicy {
        self.price_policy
    }

    pub fn item_rule_count(&self) -> usize {
        self.item_rules.len()
    }

    pub fn cart_rule_count(&self) -> usize {
        self.cart_rules.len()
    }

    /// Names of the registered rules, item rules first, each in chain order.
    pub fn rule_names(&self) -> (Vec<&str>, Vec<&str>) {
        (
            self.item_rules.iter().map(|r| r.name()).collect(),
            self.cart_rules.iter().map(|r| r.name()).collect(),
        )
    }

    /// Computes the final cart total.
    ///
    /// Same evaluation as [`calculate_breakdown`](Self::calculate_breakdown),
    /// keeping only the total.
    pub fn calculate(&self, items: &[Item], user: &User) -> PricingResult<f64> {
        self.calculate_breakdown(items, user).map(|breakdown| breakdown.total)
    }

    /// Computes the final cart total and records how every line and every
    /// cart rule contributed to it.
    pub fn calculate_breakdown(&self, items: &[Item], user: &User) -> PricingResult<PriceBreakdown> {
        let mut lines = Vec::with_capacity(items.len());
        let mut subtotal = 0.0;
        for (index, item) in items.iter().enumerate() {
            let line = self.price_item(index, item, user)?;
            subtotal += line.effective_price;
            lines.push(line);
        }

        let mut adjustments = Vec::with_capacity(self.cart_rules.len());
        let mut total = subtotal;
        for rule in &self.cart_rules {
            let before = total;
            total = self.apply_cart_rule(rule.as_ref(), total, user)?;
            adjustments.push(CartAdjustment {
                rule: rule.name().to_string(),
                before,
                after: total,
            });
        }

        debug!(items = items.len(), subtotal, total, "Cart priced");
        Ok(PriceBreakdown {
            lines,
            subtotal,
            adjustments,
            total,
        })
    }

    /// Resolves one item's listed price and runs it through the item rules.
    fn price_item(&self, index: usize, item: &Item, user: &User) -> PricingResult<LineOutcome> {
        let listed_price = self.price_policy.listed_price(index, item)?;
        let (effective_price, rule) =
            self.run_item_rules(&LineItem::new(index, listed_price, item), user)?;
        Ok(LineOutcome {
            index,
            listed_price,
            effective_price,
            rule: rule.map(str::to_string),
        })
    }

    fn run_item_rules(&self, line: &LineItem<'_>, user: &User) -> PricingResult<(f64, Option<&str>)> {
        for rule in &self.item_rules {
            let decision = rule
                .evaluate(line, user)
                .map_err(|source| PricingError::RuleEvaluation {
                    rule: rule.name().to_string(),
                    index: Some(line.index),
                    source,
                })?;

            if let ItemDecision::Override(price) = decision {
                debug!(
                    index = line.index,
                    rule = rule.name(),
                    listed = line.price,
                    price,
                    "Item rule applied"
                );
                return Ok((price, Some(rule.name())));
            }
            trace!(index = line.index, rule = rule.name(), "Item rule deferred");
        }

        Ok((line.price, None))
    }

    fn apply_cart_rule(&self, rule: &dyn CartRule, total: f64, user: &User) -> PricingResult<f64> {
        let adjusted = rule
            .apply(total, user)
            .map_err(|source| PricingError::RuleEvaluation {
                rule: rule.name().to_string(),
                index: None,
                source,
            })?;

        if adjusted != total {
            debug!(rule = rule.name(), before = total, after = adjusted, "Cart rule applied");
        }
        Ok(adjusted)
    }
}

impl fmt::Debug for DiscountEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (item_rules, cart_rules) = self.rule_names();
        f.debug_struct("DiscountEngine")
            .field("item_rules", &item_rules)
            .field("cart_rules", &cart_rules)
            .field("price_policy", &self.price_policy)
            .finish()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn fixed(name: &'static str, price: f64) -> impl ItemRule {
        ItemRuleFn::new(name, move |_, _| Ok(ItemDecision::Override(price)))
    }

    fn deferring(name: &'static str) -> impl ItemRule {
        ItemRuleFn::new(name, |_, _| Ok(ItemDecision::Defer))
    }

    #[test]
    fn test_empty_engine_sums_listed_prices() {
        let engine = DiscountEngine::new();
        let items = [Item::new(1.5), Item::book(2.5), Item::new(6.0)];
        assert_eq!(engine.calculate(&items, &User::vip()).unwrap(), 10.0);
        assert_eq!(engine.calculate(&[], &User::regular()).unwrap(), 0.0);
    }

    #[test]
    fn test_registration_order_and_counts() {
        let engine = DiscountEngine::new()
            .add_item_rule(deferring("a"))
            .add_item_rule(deferring("b"))
            .add_cart_rule_fn("c", |total, _| Ok(total));
        assert_eq!(engine.item_rule_count(), 2);
        assert_eq!(engine.cart_rule_count(), 1);
        assert_eq!(engine.rule_names(), (vec!["a", "b"], vec!["c"]));
    }

    #[test]
    fn test_first_override_wins() {
        let later_calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&later_calls);
        let engine = DiscountEngine::new()
            .add_item_rule(deferring("skip"))
            .add_item_rule(fixed("first", 3.0))
            .add_item_rule_fn("second", move |_, _| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(ItemDecision::Override(99.0))
            });

        let items = [Item::new(10.0), Item::new(20.0)];
        assert_eq!(engine.calculate(&items, &User::regular()).unwrap(), 6.0);
        assert_eq!(later_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_override_of_zero_is_a_decision() {
        let engine = DiscountEngine::new()
            .add_item_rule(fixed("free", 0.0))
            .add_item_rule(fixed("never", 50.0));
        assert_eq!(engine.calculate(&[Item::new(10.0)], &User::regular()).unwrap(), 0.0);
    }

    #[test]
    fn test_cart_rules_chain_every_rule_in_order() {
        let engine = DiscountEngine::new()
            .add_cart_rule_fn("double", |total, _| Ok(total * 2.0))
            .add_cart_rule_fn("minus_three", |total, _| Ok(total - 3.0))
            .add_cart_rule_fn("unchanged", |total, _| Ok(total));

        // (5 * 2) - 3, not (5 - 3) * 2
        assert_eq!(engine.calculate(&[Item::new(5.0)], &User::regular()).unwrap(), 7.0);
    }

    #[test]
    fn test_rules_see_user() {
        let engine = DiscountEngine::new()
            .add_item_rule_fn("vip_free", |line, user| {
                Ok(if user.vip {
                    ItemDecision::Override(0.0)
                } else {
                    ItemDecision::Override(line.price)
                })
            });
        let items = [Item::new(10.0)];
        assert_eq!(engine.calculate(&items, &User::vip()).unwrap(), 0.0);
        assert_eq!(engine.calculate(&items, &User::regular()).unwrap(), 10.0);
    }

    #[test]
    fn test_item_rule_error_aborts_with_context() {
        let engine = DiscountEngine::new()
            .add_item_rule_fn("picky", |line, _| {
                if line.index == 1 {
                    Err(RuleError::rejected("cannot price"))
                } else {
                    Ok(ItemDecision::Defer)
                }
            })
            .add_item_rule(fixed("fallback", 1.0));

        let err = engine
            .calculate(&[Item::new(1.0), Item::new(2.0)], &User::regular())
            .unwrap_err();
        match err {
            PricingError::RuleEvaluation { rule, index, .. } => {
                assert_eq!(rule, "picky");
                assert_eq!(index, Some(1));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_cart_rule_error_aborts() {
        let after = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&after);
        let engine = DiscountEngine::new()
            .add_cart_rule_fn("broken", |_, _| Err(RuleError::rejected("boom")))
            .add_cart_rule_fn("after", move |total, _| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(total)
            });

        let err = engine.calculate(&[Item::new(1.0)], &User::regular()).unwrap_err();
        assert!(matches!(
            err,
            PricingError::RuleEvaluation { index: None, .. }
        ));
        assert_eq!(after.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_strict_policy_rejects_missing_price() {
        let engine = DiscountEngine::new();
        let items = [
            Item::new(1.0),
            Item {
                price: None,
                item_type: None,
            },
        ];
        let err = engine.calculate(&items, &User::regular()).unwrap_err();
        assert!(matches!(err, PricingError::MalformedItem { index: 1, .. }));
    }

    #[test]
    fn test_coerce_policy_treats_missing_price_as_zero() {
        let engine = DiscountEngine::new().with_price_policy(PricePolicy::Coerce);
        let items = [
            Item::new(4.0),
            Item {
                price: None,
                item_type: Some("book".to_string()),
            },
        ];
        assert_eq!(engine.price_policy(), PricePolicy::Coerce);
        assert_eq!(engine.calculate(&items, &User::regular()).unwrap(), 4.0);
    }

    #[test]
    fn test_rules_see_resolved_price_and_raw_item() {
        // Unpriced lines cost a flat 2.5 instead of the coerced 0
        let engine = DiscountEngine::new()
            .with_price_policy(PricePolicy::Coerce)
            .add_item_rule_fn("unpriced_surcharge", |line, _| {
                Ok(match line.item().price {
                    None => ItemDecision::Override(line.price + 2.5),
                    Some(_) => ItemDecision::Defer,
                })
            });
        let items = [
            Item::new(4.0),
            Item {
                price: None,
                item_type: None,
            },
        ];

        let breakdown = engine.calculate_breakdown(&items, &User::regular()).unwrap();
        assert_eq!(breakdown.lines[1].listed_price, 0.0);
        assert_eq!(breakdown.lines[1].rule.as_deref(), Some("unpriced_surcharge"));
        assert_eq!(breakdown.total, 6.5);
    }

    #[test]
    fn test_breakdown_matches_calculate() {
        let engine = DiscountEngine::new()
            .add_item_rule_fn("books_at_one", |line, _| {
                Ok(if line.is_book() {
                    ItemDecision::Override(1.0)
                } else {
                    ItemDecision::Defer
                })
            })
            .add_cart_rule_fn("noop", |total, _| Ok(total))
            .add_cart_rule_fn("minus_one", |total, _| Ok(total - 1.0));
        let items = [Item::book(8.0), Item::new(5.0)];
        let user = User::regular();

        let breakdown = engine.calculate_breakdown(&items, &user).unwrap();
        assert_eq!(breakdown.total, engine.calculate(&items, &user).unwrap());
        assert_eq!(breakdown.subtotal, 6.0);
        assert_eq!(breakdown.total, 5.0);
        assert_eq!(breakdown.lines[0].rule.as_deref(), Some("books_at_one"));
        assert_eq!(breakdown.lines[1].rule, None);
        assert_eq!(breakdown.lines[1].effective_price, 5.0);
        assert_eq!(breakdown.adjustments.len(), 2);
        assert!(!breakdown.adjustments[0].changed());
        assert!(breakdown.adjustments[1].changed());
        assert_eq!(breakdown.discount(), 8.0);
    }

    #[test]
    fn test_engine_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<DiscountEngine>();
    }

    #[test]
    fn test_debug_lists_rule_names() {
        let engine = DiscountEngine::new().add_item_rule(deferring("only"));
        let rendered = format!("{engine:?}");
        assert!(rendered.contains("only"));
        assert!(rendered.contains("Strict"));
    }
}
