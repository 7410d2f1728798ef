//! In-memory ledger store.
//!
//! Whole parlays are swapped in and out under a single write lock, so a
//! reader only ever sees complete records.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::LedgerStore;
use crate::error::{LedgerError, Result};
use crate::types::{Parlay, ParlayFilter};

#[derive(Default)]
struct Inner {
    /// Insertion sequence breaks ties between equal timestamps.
    next_seq: u64,
    parlays: HashMap<Uuid, (u64, Parlay)>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored parlays.
    pub async fn len(&self) -> usize {
        self.inner.read().await.parlays.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn insert_parlay(&self, parlay: &Parlay) -> Result<()> {
        let mut inner = self.inner.write().await;
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.parlays.insert(parlay.id, (seq, parlay.clone()));
        debug!(parlay_id = %parlay.id, picks = parlay.picks.len(), "Parlay stored in memory");
        Ok(())
    }

    async fn get_parlay(&self, id: Uuid) -> Result<Option<Parlay>> {
        let inner = self.inner.read().await;
        Ok(inner.parlays.get(&id).map(|(_, p)| p.clone()))
    }

    async fn save_parlay(&self, parlay: &Parlay) -> Result<()> {
        let mut inner = self.inner.write().await;
        match inner.parlays.get_mut(&parlay.id) {
            Some((_, stored)) => {
                *stored = parlay.clone();
                Ok(())
            }
            None => Err(LedgerError::ParlayNotFound(parlay.id)),
        }
    }

    async fn delete_parlay(&self, id: Uuid) -> Result<bool> {
        let mut inner = self.inner.write().await;
        Ok(inner.parlays.remove(&id).is_some())
    }

    async fn list_parlays(&self, filter: &ParlayFilter) -> Result<Vec<Parlay>> {
        let inner = self.inner.read().await;
        let mut matched: Vec<&(u64, Parlay)> = inner
            .parlays
            .values()
            .filter(|(_, p)| filter.matches(p))
            .collect();
        matched.sort_by(|(seq_a, a), (seq_b, b)| {
            b.created_at.cmp(&a.created_at).then(seq_b.cmp(seq_a))
        });
        Ok(matched.into_iter().map(|(_, p)| p.clone()).collect())
    }

    async fn pick_owner(&self, pick_id: Uuid) -> Result<Option<Uuid>> {
        let inner = self.inner.read().await;
        Ok(inner
            .parlays
            .values()
            .find(|(_, p)| p.pick(pick_id).is_some())
            .map(|(_, p)| p.id))
    }

    fn name(&self) -> &str {
        "memory"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Direction, EntryType, ParlayStatus, Pick, PickResult, Platform};
    use chrono::{Duration, Utc};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn sample_parlay(platform: Platform, age_mins: i64) -> Parlay {
        let id = Uuid::new_v4();
        let picks = (0..2)
            .map(|i| Pick {
                id: Uuid::new_v4(),
                parlay_id: id,
                player_name: format!("Player {i}"),
                team_name: None,
                stat_category: "Strikeouts".into(),
                line: dec!(4.5),
                direction: Direction::Lower,
                result: PickResult::Pending,
                actual_value: None,
            })
            .collect();
        Parlay {
            id,
            created_at: Utc::now() - Duration::minutes(age_mins),
            platform,
            entry_type: EntryType::Flex,
            pick_count: 2,
            stake: dec!(5),
            multiplier: None,
            status: ParlayStatus::Pending,
            hits: 0,
            payout: Decimal::ZERO,
            profit: Decimal::ZERO,
            note: None,
            game_date: None,
            picks,
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let store = MemoryStore::new();
        let parlay = sample_parlay(Platform::PrizePicks, 0);
        store.insert_parlay(&parlay).await.unwrap();

        let loaded = store.get_parlay(parlay.id).await.unwrap().unwrap();
        assert_eq!(loaded, parlay);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_save_missing_parlay_fails() {
        let store = MemoryStore::new();
        let parlay = sample_parlay(Platform::PrizePicks, 0);
        let err = store.save_parlay(&parlay).await.unwrap_err();
        assert!(matches!(err, LedgerError::ParlayNotFound(id) if id == parlay.id));
    }

    #[tokio::test]
    async fn test_delete_removes_picks() {
        let store = MemoryStore::new();
        let parlay = sample_parlay(Platform::Underdog, 0);
        let pick_id = parlay.picks[0].id;
        store.insert_parlay(&parlay).await.unwrap();

        assert!(store.delete_parlay(parlay.id).await.unwrap());
        assert!(!store.delete_parlay(parlay.id).await.unwrap());
        assert!(store.pick_owner(pick_id).await.unwrap().is_none());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_list_newest_first_and_filtered() {
        let store = MemoryStore::new();
        let old = sample_parlay(Platform::PrizePicks, 60);
        let mid = sample_parlay(Platform::Underdog, 30);
        let new = sample_parlay(Platform::PrizePicks, 0);
        for p in [&mid, &old, &new] {
            store.insert_parlay(p).await.unwrap();
        }

        let all = store.list_parlays(&ParlayFilter::default()).await.unwrap();
        let ids: Vec<Uuid> = all.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![new.id, mid.id, old.id]);

        let pp = store
            .list_parlays(&ParlayFilter {
                platform: Some(Platform::PrizePicks),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(pp.len(), 2);
        assert!(pp.iter().all(|p| p.platform == Platform::PrizePicks));
    }

    #[tokio::test]
    async fn test_pick_owner() {
        let store = MemoryStore::new();
        let parlay = sample_parlay(Platform::PrizePicks, 0);
        store.insert_parlay(&parlay).await.unwrap();

        let owner = store.pick_owner(parlay.picks[1].id).await.unwrap();
        assert_eq!(owner, Some(parlay.id));
        assert!(store.pick_owner(Uuid::new_v4()).await.unwrap().is_none());
    }
}
