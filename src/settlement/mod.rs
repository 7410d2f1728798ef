//! Settlement engine: payout, profit and status for a parlay.
//!
//! Everything here is a pure function of its inputs. Combinations missing
//! from the payout table settle to zero instead of failing, so legacy or
//! malformed entries still grade.

pub mod payouts;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::types::{EntryType, Parlay, ParlayStatus, Platform};
use payouts::PayoutTable;

// ---------------------------------------------------------------------------
// Payout
// ---------------------------------------------------------------------------

/// Payout for `hits` correct picks out of `pick_count`.
///
/// A positive `multiplier_override` replaces the table entirely (promos,
/// boosted lines); zero or negative overrides are treated as absent.
/// Results past `Decimal::MAX` saturate; creation rejects stakes that could
/// get there.
pub fn settle(
    stake: Decimal,
    multiplier_override: Option<Decimal>,
    pick_count: u32,
    platform: Platform,
    entry_type: EntryType,
    hits: u32,
    table: &PayoutTable,
) -> Decimal {
    if let Some(m) = multiplier_override.filter(|m| *m > Decimal::ZERO) {
        return stake.saturating_mul(m);
    }
    stake.saturating_mul(table.multiplier(platform, entry_type, pick_count, hits))
}

/// Status implied by a hit count and the payout it earned.
pub fn derive_status(hits: u32, pick_count: u32, payout: Decimal) -> ParlayStatus {
    if hits == pick_count {
        ParlayStatus::Won
    } else if hits == 0 {
        ParlayStatus::Lost
    } else if payout > Decimal::ZERO && hits < pick_count {
        ParlayStatus::Partial
    } else {
        ParlayStatus::Lost
    }
}

// ---------------------------------------------------------------------------
// Settlement
// ---------------------------------------------------------------------------

/// Derived settlement fields for a parlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Settlement {
    pub hits: u32,
    pub payout: Decimal,
    pub profit: Decimal,
    pub status: ParlayStatus,
}

impl Settlement {
    /// Recompute from the parlay's current pick results.
    pub fn compute(parlay: &Parlay, table: &PayoutTable) -> Self {
        let hits = parlay.count_hits();
        let payout = settle(
            parlay.stake,
            parlay.multiplier,
            parlay.pick_count,
            parlay.platform,
            parlay.entry_type,
            hits,
            table,
        );
        Self {
            hits,
            payout,
            profit: payout.saturating_sub(parlay.stake),
            status: derive_status(hits, parlay.pick_count, payout),
        }
    }

    /// Write the derived fields back onto the parlay.
    pub fn apply(&self, parlay: &mut Parlay) {
        parlay.hits = self.hits;
        parlay.payout = self.payout;
        parlay.profit = self.profit;
        parlay.status = self.status;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
