//! Payout multiplier tables.
//!
//! Every platform publishes a fixed multiplier per entry type and pick
//! count. Flex entries also pay a reduced tier when exactly one pick
//! misses. Anything not in the table pays nothing.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use std::collections::HashMap;

use crate::types::{EntryType, Platform};
use crate::types::EntryType::{Flex, Power, Standard};
use crate::types::Platform::{PrizePicks, Underdog};

// ---------------------------------------------------------------------------
// Published rates
// ---------------------------------------------------------------------------

/// One row of a published payout chart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PayoutRule {
    pub platform: Platform,
    pub entry_type: EntryType,
    pub picks: u32,
    pub all_hit: Decimal,
    /// Flex only.
    pub one_miss: Option<Decimal>,
}

const fn rule(
    platform: Platform,
    entry_type: EntryType,
    picks: u32,
    all_hit: Decimal,
    one_miss: Option<Decimal>,
) -> PayoutRule {
    PayoutRule { platform, entry_type, picks, all_hit, one_miss }
}

const STANDARD_RULES: &[PayoutRule] = &[
    rule(PrizePicks, Power, 2, dec!(3.0), None),
    rule(PrizePicks, Power, 3, dec!(6.0), None),
    rule(PrizePicks, Power, 4, dec!(12.0), None),
    rule(PrizePicks, Power, 5, dec!(20.0), None),
    rule(PrizePicks, Power, 6, dec!(37.5), None),
    rule(PrizePicks, Flex, 3, dec!(3.0), Some(dec!(0.0))),
    rule(PrizePicks, Flex, 4, dec!(6.0), Some(dec!(0.4))),
    rule(PrizePicks, Flex, 5, dec!(10.0), Some(dec!(1.5))),
    rule(PrizePicks, Flex, 6, dec!(25.0), Some(dec!(2.0))),
    rule(Underdog, Standard, 2, dec!(3.0), None),
    rule(Underdog, Standard, 3, dec!(6.0), None),
    rule(Underdog, Standard, 4, dec!(10.0), None),
    rule(Underdog, Standard, 5, dec!(20.0), None),
    rule(Underdog, Flex, 3, dec!(6.0), Some(dec!(0.0))),
    rule(Underdog, Flex, 4, dec!(6.0), Some(dec!(1.5))),
    rule(Underdog, Flex, 5, dec!(20.0), Some(dec!(3.0))),
];

// ---------------------------------------------------------------------------
// Lookup
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PayoutKey {
    pub platform: Platform,
    pub entry_type: EntryType,
    pub pick_count: u32,
    pub hits: u32,
}

/// Composite-keyed multiplier table.
#[derive(Debug, Clone)]
pub struct PayoutTable {
    rules: Vec<PayoutRule>,
    rates: HashMap<PayoutKey, Decimal>,
}

impl PayoutTable {
    /// Build a table from published rows.
    ///
    /// The one-miss tier is only indexed for flex entry types; a non-flex
    /// row carrying one is ignored.
    pub fn from_rules(rules: &[PayoutRule]) -> Self {
        let mut rates = HashMap::with_capacity(rules.len() * 2);
        for r in rules {
            rates.insert(
                PayoutKey {
                    platform: r.platform,
                    entry_type: r.entry_type,
                    pick_count: r.picks,
                    hits: r.picks,
                },
                r.all_hit,
            );
            if let (Some(rate), true) = (r.one_miss, r.entry_type.is_flex()) {
                if r.picks > 0 {
                    rates.insert(
                        PayoutKey {
                            platform: r.platform,
                            entry_type: r.entry_type,
                            pick_count: r.picks,
                            hits: r.picks - 1,
                        },
                        rate,
                    );
                }
            }
        }
        Self { rules: rules.to_vec(), rates }
    }

    /// The current PrizePicks / Underdog charts.
    pub fn standard() -> Self {
        Self::from_rules(STANDARD_RULES)
    }

    /// Multiplier for a given outcome; zero when the table has no entry.
    pub fn multiplier(
        &self,
        platform: Platform,
        entry_type: EntryType,
        pick_count: u32,
        hits: u32,
    ) -> Decimal {
        let key = PayoutKey { platform, entry_type, pick_count, hits };
        self.rates.get(&key).copied().unwrap_or(Decimal::ZERO)
    }

    /// Published rows, in chart order.
    pub fn rows(&self) -> &[PayoutRule] {
        &self.rules
    }
}

impl Default for PayoutTable {
    fn default() -> Self {
        Self::standard()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
