//! # Cart Aggregator
//!
//! Combines resolved per-item price maps into cart-level totals.
//!
//! ## The Partial-Sum Hazard
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Item 1 resolved: { USD: 500 }                                          │
//! │  Item 2 resolved: { USD: 300, EUR: 250 }                                │
//! │                                                                         │
//! │  Naive sum:       { USD: 800, EUR: 250 }   ❌ EUR total is a lie -      │
//! │                                               item 1 has no EUR price   │
//! │                                                                         │
//! │  This module:     totals     { USD: 800 }                               │
//! │                   incomplete { EUR }        ✅ excluded and flagged     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A currency contributes to `totals` only if EVERY item priced in it.
//! Anything less goes to `incomplete` so callers can surface "total not
//! available in EUR" instead of an understated number.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::money::Money;

/// A single item's resolved prices, keyed by currency code.
pub type PriceMap = BTreeMap<String, Money>;

/// Cart-level totals produced by [`aggregate`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartTotals {
    /// Sum per currency code, only for codes present on every item.
    pub totals: BTreeMap<String, Money>,

    /// Codes present on at least one item but missing from at least one
    /// other. Excluded from `totals` rather than partially summed.
    pub incomplete: BTreeSet<String>,
}

/// Reduces per-item price maps into cart totals.
///
/// Pure reduction over already-resolved inputs; performs no I/O and holds
/// no state. An empty cart yields empty `totals` and empty `incomplete`.
///
/// ## Example
/// ```rust
/// use bazaar_core::cart::{aggregate, PriceMap};
/// use bazaar_core::money::Money;
///
/// let item1: PriceMap = [("USD".to_string(), Money::from_minor(500))].into_iter().collect();
/// let item2: PriceMap = [
///     ("USD".to_string(), Money::from_minor(300)),
///     ("EUR".to_string(), Money::from_minor(250)),
/// ]
/// .into_iter()
/// .collect();
///
/// let totals = aggregate(&[item1, item2]);
/// assert_eq!(totals.totals["USD"].minor(), 800);
/// assert!(totals.incomplete.contains("EUR"));
/// ```
pub fn aggregate(item_prices: &[PriceMap]) -> CartTotals {
    let mut result = CartTotals::default();

    if item_prices.is_empty() {
        return result;
    }

    // Codes seen anywhere across the cart.
    let mut seen: BTreeSet<&str> = BTreeSet::new();
    for item in item_prices {
        seen.extend(item.keys().map(String::as_str));
    }

    for code in seen {
        let mut sum = Money::zero();
        let mut complete = true;

        for item in item_prices {
            match item.get(code) {
                Some(price) => sum = sum.saturating_add(*price),
                None => {
                    complete = false;
                    break;
                }
            }
        }

        if complete {
            result.totals.insert(code.to_string(), sum);
        } else {
            result.incomplete.insert(code.to_string());
        }
    }

    result
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn price_map(entries: &[(&str, i64)]) -> PriceMap {
        entries
            .iter()
            .map(|(c, m)| (c.to_string(), Money::from_minor(*m)))
            .collect()
    }

    #[test]
    fn test_aggregate_excludes_and_flags_missing_codes() {
        let items = vec![
            price_map(&[("USD", 500)]),
            price_map(&[("USD", 300), ("EUR", 250)]),
        ];

        let result = aggregate(&items);

        assert_eq!(result.totals.len(), 1);
        assert_eq!(result.totals["USD"], Money::from_minor(800));
        assert_eq!(result.incomplete.len(), 1);
        assert!(result.incomplete.contains("EUR"));
    }

    #[test]
    fn test_aggregate_empty_cart() {
        let result = aggregate(&[]);
        assert!(result.totals.is_empty());
        assert!(result.incomplete.is_empty());
    }

    #[test]
    fn test_aggregate_all_complete() {
        let items = vec![
            price_map(&[("USD", 500), ("EUR", 460)]),
            price_map(&[("USD", 500), ("EUR", 460)]),
        ];

        let result = aggregate(&items);

        assert_eq!(result.totals["USD"], Money::from_minor(1000));
        assert_eq!(result.totals["EUR"], Money::from_minor(920));
        assert!(result.incomplete.is_empty());
    }

    #[test]
    fn test_aggregate_single_item() {
        let items = vec![price_map(&[("USD", 500)])];
        let result = aggregate(&items);
        assert_eq!(result.totals["USD"], Money::from_minor(500));
        assert!(result.incomplete.is_empty());
    }

    #[test]
    fn test_aggregate_code_missing_from_first_item() {
        // Order of items must not matter for the exclusion rule
        let items = vec![
            price_map(&[("USD", 300), ("EUR", 250)]),
            price_map(&[("USD", 500)]),
        ];

        let result = aggregate(&items);
        assert_eq!(result.totals["USD"], Money::from_minor(800));
        assert!(result.incomplete.contains("EUR"));
    }

    #[test]
    fn test_aggregate_disjoint_items() {
        let items = vec![price_map(&[("USD", 100)]), price_map(&[("EUR", 100)])];
        let result = aggregate(&items);
        assert!(result.totals.is_empty());
        assert!(result.incomplete.contains("USD"));
        assert!(result.incomplete.contains("EUR"));
    }
}
