//! Portfolio statistics: win rate and ROI, overall and per group.
//!
//! Computed on demand from a snapshot of the ledger; nothing here is
//! maintained incrementally.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::types::{EntryType, Parlay, ParlayStatus, Platform};

/// Counts and money totals for a set of parlays.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Breakdown {
    pub total_bets: usize,
    pub won: usize,
    pub lost: usize,
    pub partial: usize,
    pub pending: usize,
    pub total_staked: Decimal,
    pub total_payout: Decimal,
    pub total_profit: Decimal,
    /// Percent of graded parlays that won outright.
    pub win_rate: Decimal,
    /// Total profit as a percent of total staked.
    pub roi: Decimal,
}

impl Breakdown {
    fn record(&mut self, parlay: &Parlay) {
        self.total_bets += 1;
        match parlay.status {
            ParlayStatus::Won => self.won += 1,
            ParlayStatus::Lost => self.lost += 1,
            ParlayStatus::Partial => self.partial += 1,
            ParlayStatus::Pending => self.pending += 1,
        }
        self.total_staked = self.total_staked.saturating_add(parlay.stake);
        self.total_payout = self.total_payout.saturating_add(parlay.payout);
        self.total_profit = self.total_profit.saturating_add(parlay.profit);
    }

    fn finish(&mut self) {
        self.win_rate = percent(Decimal::from(self.won), Decimal::from(self.graded()));
        self.roi = percent(self.total_profit, self.total_staked);
    }

    /// Parlays with a final (or corrected) result.
    pub fn graded(&self) -> usize {
        self.won + self.lost + self.partial
    }
}

/// Ledger-wide statistics with platform and entry-type groupings.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Statistics {
    #[serde(flatten)]
    pub totals: Breakdown,
    pub by_platform: BTreeMap<Platform, Breakdown>,
    pub by_entry_type: BTreeMap<EntryType, Breakdown>,
}

impl Statistics {
    pub fn compute<'a, I>(parlays: I) -> Self
    where
        I: IntoIterator<Item = &'a Parlay>,
    {
        let mut stats = Statistics::default();
        for parlay in parlays {
            stats.totals.record(parlay);
            stats.by_platform.entry(parlay.platform).or_default().record(parlay);
            stats.by_entry_type.entry(parlay.entry_type).or_default().record(parlay);
        }

        stats.totals.finish();
        stats.by_platform.values_mut().for_each(Breakdown::finish);
        stats.by_entry_type.values_mut().for_each(Breakdown::finish);
        stats
    }
}

/// `numerator / denominator × 100` to two places; zero on an empty denominator.
/// Saturates instead of overflowing.
fn percent(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator.is_zero() {
        return Decimal::ZERO;
    }
    numerator
        .checked_div(denominator)
        .and_then(|ratio| ratio.checked_mul(dec!(100)))
        .map(|p| p.round_dp(2))
        .unwrap_or(if numerator.is_sign_negative() != denominator.is_sign_negative() {
            Decimal::MIN
        } else {
            Decimal::MAX
        })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
