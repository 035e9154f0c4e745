//! # Domain Types
//!
//! Input and output types for a cart calculation.
//!
//! ## Type Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Input                         Rule view            Output              │
//! │  ┌─────────────────┐          ┌──────────────┐     ┌──────────────────┐ │
//! │  │  CartRequest    │          │  LineItem    │     │  PriceBreakdown  │ │
//! │  │  ├── items      │ resolve  │  index       │     │  lines           │ │
//! │  │  │   Vec<Item>  │ ───────► │  price (f64) │     │  subtotal        │ │
//! │  │  └── user       │          │  item_type   │     │  adjustments     │ │
//! │  │      User       │          └──────────────┘     │  total           │ │
//! │  └─────────────────┘                               └──────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Lenient Decoding
//! Carts often arrive as loosely-typed JSON. `Item::price` accepts numbers,
//! booleans and strings that start with a number (`"12abc"` reads as 12,
//! `"1,000"` as 1); `Item::item_type` keeps strings only, so any other tag
//! means "not a book"; `User::vip` accepts anything with a truthiness.
//! Anything unreadable becomes `None` / `false` and is dealt with by the
//! [`PricePolicy`](crate::PricePolicy) at calculation time.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Item type tag that unlocks the book discount tiers.
pub const BOOK_TYPE: &str = "book";

// =============================================================================
// Item
// =============================================================================

/// One cart line as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Listed price. `None` when the input had no usable price.
    #[serde(default, deserialize_with = "deserialize_price")]
    pub price: Option<f64>,

    /// Type tag, e.g. `"book"`. Absent means "not a book".
    #[serde(
        rename = "type",
        default,
        deserialize_with = "deserialize_type",
        skip_serializing_if = "Option::is_none"
    )]
    pub item_type: Option<String>,
}

impl Item {
    /// Creates an untyped item with the given price.
    pub fn new(price: f64) -> Self {
        Item {
            price: Some(price),
            item_type: None,
        }
    }

    /// Creates a book item with the given price.
    pub fn book(price: f64) -> Self {
        Item::new(price).with_type(BOOK_TYPE)
    }

    /// Sets the type tag.
    pub fn with_type(mut self, item_type: impl Into<String>) -> Self {
        self.item_type = Some(item_type.into());
        self
    }

    /// Checks if the item is tagged as a book.
    #[inline]
    pub fn is_book(&self) -> bool {
        self.item_type.as_deref() == Some(BOOK_TYPE)
    }
}

// =============================================================================
// User
// =============================================================================

/// The purchaser context for a calculation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unlocks the preferential discount tiers.
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub vip: bool,
}

impl User {
    /// A VIP user.
    pub const fn vip() -> Self {
        User { vip: true }
    }

    /// A regular (non-VIP) user.
    pub const fn regular() -> Self {
        User { vip: false }
    }
}

// =============================================================================
// Cart Request
// =============================================================================

/// A complete calculation input, as read from JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CartRequest {
    #[serde(default)]
    pub items: Vec<Item>,
    #[serde(default)]
    pub user: User,
}

// =============================================================================
// Line Item (what item rules see)
// =============================================================================

/// An item whose listed price has been resolved by the price policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineItem<'a> {
    /// Position of the item in the cart.
    pub index: usize,
    /// Resolved listed price.
    pub price: f64,
    item: &'a Item,
}

impl<'a> LineItem<'a> {
    pub(crate) fn new(index: usize, price: f64, item: &'a Item) -> Self {
        LineItem { index, price, item }
    }

    /// The item's type tag, if any.
    #[inline]
    pub fn item_type(&self) -> Option<&'a str> {
        self.item.item_type.as_deref()
    }

    #[inline]
    pub fn is_book(&self) -> bool {
        self.item.is_book()
    }

    /// The underlying input item.
    #[inline]
    pub fn item(&self) -> &'a Item {
        self.item
    }
}

// =============================================================================
// Item Decision
// =============================================================================

/// Outcome of one item rule for one item.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ItemDecision {
    /// The rule prices the item; remaining item rules are skipped.
    Override(f64),
    /// The rule does not apply; try the next one.
    Defer,
}

impl ItemDecision {
    /// Returns the override price, if the rule decided.
    #[inline]
    pub fn price(self) -> Option<f64> {
        match self {
            ItemDecision::Override(price) => Some(price),
            ItemDecision::Defer => None,
        }
    }
}

impl From<Option<f64>> for ItemDecision {
    fn from(price: Option<f64>) -> Self {
        price.map_or(ItemDecision::Defer, ItemDecision::Override)
    }
}

// =============================================================================
// Price Breakdown
// =============================================================================

/// How a single cart line was priced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineOutcome {
    pub index: usize,
    /// Price after the price policy, before item rules.
    pub listed_price: f64,
    /// Price that went into the subtotal.
    pub effective_price: f64,
    /// Name of the item rule that decided, `None` if every rule deferred.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule: Option<String>,
}

/// The effect of one cart rule on the running total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartAdjustment {
    pub rule: String,
    pub before: f64,
    pub after: f64,
}

impl CartAdjustment {
    /// Checks whether the rule changed the total.
    pub fn changed(&self) -> bool {
        self.before != self.after
    }
}

/// Full trace of a calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceBreakdown {
    pub lines: Vec<LineOutcome>,
    /// Sum of effective prices.
    pub subtotal: f64,
    /// One entry per cart rule, in evaluation order.
    pub adjustments: Vec<CartAdjustment>,
    pub total: f64,
}

impl PriceBreakdown {
    /// Sum of listed prices before any rule ran.
    pub fn listed_total(&self) -> f64 {
        self.lines.iter().map(|l| l.listed_price).sum()
    }

    /// Total amount saved across item and cart rules.
    pub fn discount(&self) -> f64 {
        self.listed_total() - self.total
    }
}

// =============================================================================
// Lenient Deserializers
// =============================================================================

fn deserialize_price<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(price_from_value))
}

fn deserialize_type<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(tag)) => Ok(Some(tag)),
        _ => Ok(None),
    }
}

fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().is_some_and(is_truthy))
}

/// Reads a numeric value out of loosely typed JSON.
pub(crate) fn price_from_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => leading_number(s),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Parses the longest numeric prefix of `s` after leading whitespace.
///
/// `None` when no digits are found, so `"abc"`, `"inf"` and `"."` stay
/// unreadable. An exponent only counts when digits follow it.
pub(crate) fn leading_number(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let digits_from = |mut i: usize| {
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        i
    };

    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    let int_end = digits_from(end);
    let mut has_digits = int_end > end;
    end = int_end;

    if bytes.get(end) == Some(&b'.') {
        let frac_end = digits_from(end + 1);
        if has_digits || frac_end > end + 1 {
            has_digits = true;
            end = frac_end;
        }
    }
    if !has_digits {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_end = digits_from(exp);
        if exp_end > exp {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().ok()
}

/// Truthiness of loosely typed JSON: empty, zero and `"0"` are false.
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !(s.is_empty() || s == "0"),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
