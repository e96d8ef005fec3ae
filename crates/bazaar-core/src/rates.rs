//! # Price Resolver
//!
//! Pure conversion of a base-currency amount into a per-currency price map
//! against an immutable rate snapshot.
//!
//! ## Where This Sits
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Price Resolution Flow                            │
//! │                                                                         │
//! │  Rate Synchronizer (background, bazaar-settle)                         │
//! │       │ writes                                                          │
//! │       ▼                                                                 │
//! │  Rate Store (currencies table, bazaar-db)                              │
//! │       │ read once per request                                           │
//! │       ▼                                                                 │
//! │  RateSnapshot ──► resolve(base_amount, requested, snapshot)            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Resolution { prices, unresolved } ──► handlers / Cart Aggregator      │
//! │                                                                         │
//! │  The snapshot is taken ONCE and used consistently within a single      │
//! │  resolution call, so concurrent synchronizer writes can never produce  │
//! │  a price map mixing old and new rates.                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Missing Rates Are Data
//! A currency that is tracked but has no usable rate (e.g. the first sync
//! has not completed yet) lands in [`Resolution::unresolved`]. It is never
//! an error, never a zero price, and never a division by zero.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Rate Snapshot
// =============================================================================

/// An immutable set of scaled exchange rates as known at one instant.
///
/// Keys are currency codes, values are rates scaled by
/// [`crate::RATE_SCALE`]. Built from the Rate Store at request time and
/// then passed around by reference; the resolver never reaches back into
/// shared mutable state.
///
/// `BTreeMap` keeps iteration order deterministic, which in turn keeps
/// serialized price maps byte-stable for identical inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateSnapshot {
    rates: BTreeMap<String, i64>,
}

impl RateSnapshot {
    /// Creates an empty snapshot.
    pub fn new() -> Self {
        RateSnapshot {
            rates: BTreeMap::new(),
        }
    }

    /// Sets the rate for a currency code.
    pub fn set(&mut self, code: impl Into<String>, rate: i64) {
        self.rates.insert(code.into(), rate);
    }

    /// Returns the rate for a code, if known.
    pub fn get(&self, code: &str) -> Option<i64> {
        self.rates.get(code).copied()
    }

    /// Returns true if no rates are known.
    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Number of known rates.
    pub fn len(&self) -> usize {
        self.rates.len()
    }

    /// Iterates over (code, rate) pairs in code order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.rates.iter().map(|(c, r)| (c.as_str(), *r))
    }
}

impl FromIterator<(String, i64)> for RateSnapshot {
    fn from_iter<T: IntoIterator<Item = (String, i64)>>(iter: T) -> Self {
        RateSnapshot {
            rates: iter.into_iter().collect(),
        }
    }
}

// =============================================================================
// Resolution Result
// =============================================================================

/// The outcome of resolving one base amount against a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    /// Converted amount per currency code, for every requested code with a
    /// known rate.
    pub prices: BTreeMap<String, Money>,

    /// Requested codes with no rate in the snapshot. Explicit absence:
    /// callers decide whether to hide, retry later, or fall back.
    pub unresolved: BTreeSet<String>,
}

// =============================================================================
// Resolver
// =============================================================================

/// Resolves a base-currency amount into per-currency prices.
///
/// For each code in `requested` with a rate in `snapshot`:
/// `prices[code] = base × rate / 100`, rounded half away from zero (the
/// rule documented at [`Money::convert_with_rate`]). Codes without a rate
/// go to `unresolved` and are omitted from `prices`.
///
/// Pure and deterministic: no I/O, no shared state, bit-for-bit identical
/// output for identical inputs. Safe to call from any number of request
/// workers concurrently.
///
/// ## Example
/// ```rust
/// use bazaar_core::money::Money;
/// use bazaar_core::rates::{resolve, RateSnapshot};
///
/// let snapshot: RateSnapshot =
///     [("USD".to_string(), 100), ("EUR".to_string(), 92)].into_iter().collect();
///
/// let r = resolve(
///     Money::from_minor(500),
///     &["USD".to_string(), "EUR".to_string(), "JPY".to_string()],
///     &snapshot,
/// );
/// assert_eq!(r.prices["USD"].minor(), 500);
/// assert_eq!(r.prices["EUR"].minor(), 460);
/// assert!(r.unresolved.contains("JPY"));
/// ```
pub fn resolve(base: Money, requested: &[String], snapshot: &RateSnapshot) -> Resolution {
    let mut resolution = Resolution::default();

    for code in requested {
        match snapshot.get(code) {
            Some(rate) => {
                resolution
                    .prices
                    .insert(code.clone(), base.convert_with_rate(rate));
            }
            None => {
                resolution.unresolved.insert(code.clone());
            }
        }
    }

    resolution
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn codes(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_resolve_known_rates() {
        let snapshot: RateSnapshot = [("USD".to_string(), 100), ("EUR".to_string(), 92)]
            .into_iter()
            .collect();

        let r = resolve(Money::from_minor(500), &codes(&["USD", "EUR"]), &snapshot);

        assert_eq!(r.prices["USD"], Money::from_minor(500));
        assert_eq!(r.prices["EUR"], Money::from_minor(460));
        assert!(r.unresolved.is_empty());
    }

    #[test]
    fn test_resolve_empty_snapshot_marks_all_unresolved() {
        // A missing rate is data, not a fault: nothing raises, every
        // requested code is reported back as unresolved.
        let snapshot = RateSnapshot::new();
        let r = resolve(
            Money::from_minor(500),
            &codes(&["USD", "EUR", "GBP"]),
            &snapshot,
        );

        assert!(r.prices.is_empty());
        assert_eq!(r.unresolved.len(), 3);
        assert!(r.unresolved.contains("USD"));
        assert!(r.unresolved.contains("EUR"));
        assert!(r.unresolved.contains("GBP"));
    }

    #[test]
    fn test_resolve_mixed() {
        let snapshot: RateSnapshot = [("USD".to_string(), 100)].into_iter().collect();
        let r = resolve(Money::from_minor(250), &codes(&["USD", "PLN"]), &snapshot);

        assert_eq!(r.prices.len(), 1);
        assert_eq!(r.prices["USD"], Money::from_minor(250));
        assert_eq!(r.unresolved.len(), 1);
        assert!(r.unresolved.contains("PLN"));
    }

    #[test]
    fn test_resolve_is_deterministic() {
        let snapshot: RateSnapshot = [
            ("USD".to_string(), 100),
            ("EUR".to_string(), 92),
            ("JPY".to_string(), 14930),
        ]
        .into_iter()
        .collect();
        let requested = codes(&["EUR", "JPY", "USD"]);

        let a = resolve(Money::from_minor(12345), &requested, &snapshot);
        let b = resolve(Money::from_minor(12345), &requested, &snapshot);
        assert_eq!(a, b);
    }

    #[test]
    fn test_resolve_exact_formula() {
        // prices[code] == p × r / 100 under the documented rounding
        let p = 777;
        let r = 133;
        let snapshot: RateSnapshot = [("XXX".to_string(), r)].into_iter().collect();
        let res = resolve(Money::from_minor(p), &codes(&["XXX"]), &snapshot);
        // 777 × 133 = 103341; /100 rounded half away from zero = 1033
        assert_eq!(res.prices["XXX"].minor(), 1033);
    }

    #[test]
    fn test_resolve_empty_request() {
        let snapshot: RateSnapshot = [("USD".to_string(), 100)].into_iter().collect();
        let r = resolve(Money::from_minor(100), &[], &snapshot);
        assert!(r.prices.is_empty());
        assert!(r.unresolved.is_empty());
    }
}
