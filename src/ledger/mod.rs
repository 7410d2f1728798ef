//! The parlay ledger.
//!
//! The ledger owns validation and resettlement. Storage is injected as a
//! `LedgerStore`, so the same code runs against memory or SQLite.

pub mod stats;

use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{LedgerError, Result, ValidationError};
use crate::settlement::payouts::PayoutTable;
use crate::settlement::Settlement;
use crate::storage::LedgerStore;
use crate::types::{
    NewParlay, Parlay, ParlayFilter, ParlayStatus, Pick, PickResult, PickUpdate,
};
use stats::Statistics;

/// Minimum picks for any parlay, regardless of platform.
pub const MIN_PICKS: usize = 2;

pub struct Ledger {
    store: Arc<dyn LedgerStore>,
    payouts: PayoutTable,
}

impl Ledger {
    pub fn new(store: Arc<dyn LedgerStore>, payouts: PayoutTable) -> Self {
        Self { store, payouts }
    }

    /// Ledger over `store` using the standard payout charts.
    pub fn with_store(store: Arc<dyn LedgerStore>) -> Self {
        Self::new(store, PayoutTable::standard())
    }

    pub fn payouts(&self) -> &PayoutTable {
        &self.payouts
    }

    pub fn store_name(&self) -> &str {
        self.store.name()
    }

    /// Check a submission against platform limits before anything is stored.
    pub fn validate(&self, new: &NewParlay) -> std::result::Result<(), ValidationError> {
        let count = new.picks.len();

        if count < MIN_PICKS {
            return Err(ValidationError::TooFewPicks { count });
        }
        let max = new.platform.max_picks();
        if count > max {
            return Err(ValidationError::TooManyPicks {
                platform: new.platform,
                max,
                count,
            });
        }
        if !new.platform.offers(new.entry_type) {
            return Err(ValidationError::EntryTypeNotOffered {
                platform: new.platform,
                entry_type: new.entry_type,
            });
        }
        let min = new.entry_type.min_picks();
        if count < min {
            return Err(ValidationError::EntryTooSmall {
                entry_type: new.entry_type,
                min,
                count,
            });
        }
        if new.stake <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveStake(new.stake));
        }
        if let Some(m) = new.multiplier.filter(|m| *m <= Decimal::ZERO) {
            return Err(ValidationError::NonPositiveMultiplier(m));
        }
        // The all-hit tier is the largest payout the parlay can reach.
        let multiplier = new.multiplier.unwrap_or_else(|| {
            self.payouts
                .multiplier(new.platform, new.entry_type, count as u32, count as u32)
        });
        if new.stake.checked_mul(multiplier).is_none() {
            return Err(ValidationError::PayoutOverflow {
                stake: new.stake,
                multiplier,
            });
        }
        for (index, pick) in new.picks.iter().enumerate() {
            if pick.player_name.trim().is_empty() {
                return Err(ValidationError::MissingPickField { index, field: "player name" });
            }
            if pick.stat_category.trim().is_empty() {
                return Err(ValidationError::MissingPickField { index, field: "stat category" });
            }
        }
        Ok(())
    }

    /// Validate and store a new parlay. Returns its id.
    pub async fn create_parlay(&self, new: NewParlay) -> Result<Uuid> {
        if let Err(e) = self.validate(&new) {
            warn!(platform = %new.platform, entry_type = %new.entry_type, error = %e, "Parlay rejected");
            return Err(e.into());
        }

        let id = Uuid::new_v4();
        let picks: Vec<Pick> = new
            .picks
            .into_iter()
            .map(|p| Pick {
                id: Uuid::new_v4(),
                parlay_id: id,
                player_name: p.player_name.trim().to_string(),
                team_name: non_blank(p.team_name),
                stat_category: p.stat_category.trim().to_string(),
                line: p.line,
                direction: p.direction,
                result: PickResult::Pending,
                actual_value: None,
            })
            .collect();

        let parlay = Parlay {
            id,
            created_at: Utc::now(),
            platform: new.platform,
            entry_type: new.entry_type,
            pick_count: picks.len() as u32,
            stake: new.stake,
            multiplier: new.multiplier,
            status: ParlayStatus::Pending,
            hits: 0,
            payout: Decimal::ZERO,
            profit: Decimal::ZERO,
            note: non_blank(new.note),
            game_date: new.game_date,
            picks,
        };

        self.store.insert_parlay(&parlay).await?;

        info!(
            parlay_id = %id,
            platform = %parlay.platform,
            entry_type = %parlay.entry_type,
            picks = parlay.pick_count,
            stake = %parlay.stake,
            potential = %parlay.potential_payout(&self.payouts),
            "Parlay created"
        );
        Ok(id)
    }

    pub async fn get_parlay(&self, id: Uuid) -> Result<Parlay> {
        self.store
            .get_parlay(id)
            .await?
            .ok_or(LedgerError::ParlayNotFound(id))
    }

    /// Apply pick results and resettle the parlay.
    ///
    /// Updates naming a pick that belongs to a different parlay are skipped.
    /// An update naming a pick that doesn't exist at all rejects the whole
    /// batch before anything is written.
    pub async fn update_pick_results(
        &self,
        parlay_id: Uuid,
        updates: &[PickUpdate],
    ) -> Result<Settlement> {
        let mut parlay = self.get_parlay(parlay_id).await?;

        for update in updates {
            if parlay.pick(update.pick_id).is_some() {
                continue;
            }
            match self.store.pick_owner(update.pick_id).await? {
                Some(owner) => debug!(
                    parlay_id = %parlay_id,
                    pick_id = %update.pick_id,
                    owner = %owner,
                    "Ignoring result for pick on another parlay"
                ),
                None => return Err(LedgerError::PickNotFound(update.pick_id)),
            }
        }

        let mut applied = 0usize;
        for update in updates {
            let Some(pick) = parlay.pick_mut(update.pick_id) else {
                continue;
            };
            if let Some(actual) = update.actual_value {
                pick.actual_value = Some(actual);
            }
            match (update.result, update.actual_value) {
                (Some(result), _) => pick.result = result,
                (None, Some(actual)) => pick.result = pick.grade(actual),
                (None, None) => {}
            }
            applied += 1;
        }

        let previous = parlay.status;
        let settlement = Settlement::compute(&parlay, &self.payouts);
        settlement.apply(&mut parlay);
        self.store.save_parlay(&parlay).await?;

        info!(
            parlay_id = %parlay_id,
            applied,
            hits = settlement.hits,
            picks = parlay.pick_count,
            payout = %settlement.payout,
            profit = %settlement.profit,
            from = %previous,
            to = %settlement.status,
            "Parlay resettled"
        );
        Ok(settlement)
    }

    /// Remove a parlay and all of its picks.
    pub async fn delete_parlay(&self, id: Uuid) -> Result<()> {
        if !self.store.delete_parlay(id).await? {
            return Err(LedgerError::ParlayNotFound(id));
        }
        info!(parlay_id = %id, "Parlay deleted");
        Ok(())
    }

    /// Parlays matching `filter`, newest first.
    pub async fn list_parlays(&self, filter: &ParlayFilter) -> Result<Vec<Parlay>> {
        self.store.list_parlays(filter).await
    }

    /// Statistics over the parlays matching `filter`.
    pub async fn statistics(&self, filter: &ParlayFilter) -> Result<Statistics> {
        let parlays = self.store.list_parlays(filter).await?;
        Ok(Statistics::compute(&parlays))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
