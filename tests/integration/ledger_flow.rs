//! Ledger lifecycle against the SQLite backend.
//!
//! Creates, grades, corrects, and deletes parlays through `Ledger`, then
//! checks what a fresh connection reads back.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use uuid::Uuid;

use parlay_ledger::error::LedgerError;
use parlay_ledger::ledger::Ledger;
use parlay_ledger::storage::{LedgerStore, MemoryStore, SqliteStore};
use parlay_ledger::types::*;

fn pick(player: &str, stat: &str, line: Decimal, direction: Direction) -> NewPick {
    NewPick {
        player_name: player.into(),
        team_name: None,
        stat_category: stat.into(),
        line,
        direction,
    }
}

fn underdog_flex(stake: Decimal) -> NewParlay {
    NewParlay {
        platform: Platform::Underdog,
        entry_type: EntryType::Flex,
        stake,
        multiplier: None,
        note: Some("Sunday slate".into()),
        game_date: chrono::NaiveDate::from_ymd_opt(2024, 9, 8),
        picks: vec![
            pick("Josh Allen", "Passing Yards", dec!(245.5), Direction::Higher),
            pick("James Cook", "Rushing Yards", dec!(62.5), Direction::Higher),
            pick("Stefon Diggs", "Receptions", dec!(6.5), Direction::Lower),
            pick("Dalton Kincaid", "Receiving Yards", dec!(40.5), Direction::Higher),
        ],
    }
}

async fn sqlite_ledger() -> Ledger {
    let store = SqliteStore::connect("sqlite::memory:").await.unwrap();
    Ledger::with_store(Arc::new(store))
}

async fn pick_ids(ledger: &Ledger, id: Uuid) -> Vec<Uuid> {
    ledger
        .get_parlay(id)
        .await
        .unwrap()
        .picks
        .iter()
        .map(|p| p.id)
        .collect()
}

fn graded(pick_id: Uuid, actual: Decimal) -> PickUpdate {
    PickUpdate {
        pick_id,
        result: None,
        actual_value: Some(actual),
    }
}

#[tokio::test]
async fn test_flex_lifecycle_on_sqlite() {
    let ledger = sqlite_ledger().await;
    let id = ledger.create_parlay(underdog_flex(dec!(20))).await.unwrap();
    let picks = pick_ids(&ledger, id).await;
    assert_eq!(picks.len(), 4);

    // Three results in: no payout yet for 1 hit + 2 misses out of 4.
    let s = ledger
        .update_pick_results(
            id,
            &[
                graded(picks[0], dec!(301)),
                graded(picks[1], dec!(40)),
                graded(picks[2], dec!(8)),
            ],
        )
        .await
        .unwrap();
    assert_eq!(s.hits, 1);
    assert_eq!(s.payout, Decimal::ZERO);

    // Correct the rushing line and finish the last pick: 3 of 4 on flex.
    let s = ledger
        .update_pick_results(
            id,
            &[
                PickUpdate {
                    pick_id: picks[1],
                    result: Some(PickResult::Hit),
                    actual_value: None,
                },
                graded(picks[3], dec!(55)),
            ],
        )
        .await
        .unwrap();
    assert_eq!(s.hits, 3);
    assert_eq!(s.status, ParlayStatus::Partial);
    assert_eq!(s.payout, dec!(20) * dec!(1.5));
    assert_eq!(s.profit, s.payout - dec!(20));

    let stored = ledger.get_parlay(id).await.unwrap();
    assert_eq!(stored.status, ParlayStatus::Partial);
    assert_eq!(stored.note.as_deref(), Some("Sunday slate"));
    assert_eq!(stored.picks[0].actual_value, Some(dec!(301)));
    assert_eq!(stored.picks[2].result, PickResult::Miss);
    assert_eq!(stored.picks[1].actual_value, Some(dec!(40)));
    assert_eq!(stored.picks[1].result, PickResult::Hit);
}

#[tokio::test]
async fn test_delete_leaves_no_picks() {
    let store = Arc::new(SqliteStore::connect("sqlite::memory:").await.unwrap());
    let ledger = Ledger::with_store(store.clone());

    let id = ledger.create_parlay(underdog_flex(dec!(5))).await.unwrap();
    let picks = pick_ids(&ledger, id).await;

    ledger.delete_parlay(id).await.unwrap();
    for pick in picks {
        assert!(store.pick_owner(pick).await.unwrap().is_none());
    }
    let err = ledger.get_parlay(id).await.unwrap_err();
    assert!(matches!(err, LedgerError::ParlayNotFound(_)));
}

#[tokio::test]
async fn test_ledger_survives_reopen() {
    let path = std::env::temp_dir().join(format!("parlay-ledger-{}.db", Uuid::new_v4()));
    let url = format!("sqlite://{}", path.display());

    let id = {
        let store = SqliteStore::connect(&url).await.unwrap();
        let pool = store.pool().clone();
        let ledger = Ledger::with_store(Arc::new(store));
        let id = ledger.create_parlay(underdog_flex(dec!(10))).await.unwrap();
        let picks = pick_ids(&ledger, id).await;
        let updates: Vec<PickUpdate> = picks
            .iter()
            .map(|p| PickUpdate {
                pick_id: *p,
                result: Some(PickResult::Hit),
                actual_value: None,
            })
            .collect();
        ledger.update_pick_results(id, &updates).await.unwrap();
        pool.close().await;
        id
    };

    let ledger = Ledger::with_store(Arc::new(SqliteStore::connect(&url).await.unwrap()));
    let parlay = ledger.get_parlay(id).await.unwrap();
    assert_eq!(parlay.status, ParlayStatus::Won);
    assert_eq!(parlay.hits, 4);
    assert_eq!(parlay.payout, dec!(60));
    assert_eq!(parlay.game_date, chrono::NaiveDate::from_ymd_opt(2024, 9, 8));

    let stats = ledger.statistics(&ParlayFilter::default()).await.unwrap();
    assert_eq!(stats.totals.won, 1);
    assert_eq!(stats.totals.roi, dec!(500));

    let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn test_backends_agree() {
    let memory = Ledger::with_store(Arc::new(MemoryStore::new()));
    let sqlite = sqlite_ledger().await;

    let mut results = Vec::new();
    for ledger in [&memory, &sqlite] {
        let id = ledger.create_parlay(underdog_flex(dec!(8))).await.unwrap();
        let picks = pick_ids(ledger, id).await;
        let updates = vec![
            graded(picks[0], dec!(200)),
            graded(picks[1], dec!(70)),
            graded(picks[2], dec!(3)),
            graded(picks[3], dec!(12)),
        ];
        let s = ledger.update_pick_results(id, &updates).await.unwrap();
        let listed = ledger
            .list_parlays(&ParlayFilter {
                status: Some(s.status),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
        results.push(s);
    }
    assert_eq!(results[0], results[1]);
    assert_eq!(results[0].hits, 2);
    assert_eq!(results[0].status, ParlayStatus::Lost);
}
