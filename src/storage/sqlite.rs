//! SQLite ledger store.
//!
//! Parlays and picks live in two tables joined by `parlay_id` with
//! `ON DELETE CASCADE`. Money values are stored as TEXT so decimals
//! round-trip exactly. Every write, and every read of a parlay with its
//! picks, runs inside a transaction.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rust_decimal::Decimal;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite, SqliteConnection};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

use super::LedgerStore;
use crate::error::{LedgerError, Result};
use crate::types::{Parlay, ParlayFilter, Pick};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS parlays (
        id          TEXT PRIMARY KEY NOT NULL,
        created_at  TEXT NOT NULL,
        platform    TEXT NOT NULL,
        entry_type  TEXT NOT NULL,
        pick_count  INTEGER NOT NULL,
        stake       TEXT NOT NULL,
        multiplier  TEXT,
        status      TEXT NOT NULL,
        hits        INTEGER NOT NULL,
        payout      TEXT NOT NULL,
        profit      TEXT NOT NULL,
        note        TEXT,
        game_date   TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS picks (
        id             TEXT PRIMARY KEY NOT NULL,
        parlay_id      TEXT NOT NULL REFERENCES parlays(id) ON DELETE CASCADE,
        position       INTEGER NOT NULL,
        player_name    TEXT NOT NULL,
        team_name      TEXT,
        stat_category  TEXT NOT NULL,
        line           TEXT NOT NULL,
        direction      TEXT NOT NULL,
        result         TEXT NOT NULL,
        actual_value   TEXT
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_picks_parlay ON picks (parlay_id)",
    "CREATE INDEX IF NOT EXISTS idx_parlays_created ON parlays (created_at)",
];

const PARLAY_COLUMNS: &str = "id, created_at, platform, entry_type, pick_count, stake, \
     multiplier, status, hits, payout, profit, note, game_date";

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `url` and ensure the schema.
    ///
    /// In-memory databases get a single never-recycled connection, since
    /// each new connection would otherwise see its own empty database.
    pub async fn connect(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let in_memory = is_memory_url(url);
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = pool_options.connect_with(options).await?;
        let store = Self { pool };
        store.migrate().await?;

        info!(url, in_memory, "SQLite ledger store ready");
        Ok(store)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create tables and indexes if they don't exist yet.
    pub async fn migrate(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }
}

/// `sqlite::memory:` or a URI with `mode=memory`.
fn is_memory_url(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

// Reads take the parlay row and its picks on the same connection inside one
// transaction, so a concurrent save can't land between the two statements.

async fn load_picks(conn: &mut SqliteConnection, parlay_id: Uuid) -> Result<Vec<Pick>> {
    let rows = sqlx::query(
        r#"
        SELECT id, parlay_id, player_name, team_name, stat_category,
               line, direction, result, actual_value
        FROM picks
        WHERE parlay_id = ?
        ORDER BY position ASC
        "#,
    )
    .bind(parlay_id.to_string())
    .fetch_all(&mut *conn)
    .await?;

    rows.iter().map(pick_from_row).collect()
}

async fn hydrate(conn: &mut SqliteConnection, row: &SqliteRow) -> Result<Parlay> {
    let mut parlay = parlay_from_row(row)?;
    parlay.picks = load_picks(conn, parlay.id).await?;
    Ok(parlay)
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

async fn insert_picks(conn: &mut SqliteConnection, parlay: &Parlay) -> Result<()> {
    for (position, pick) in parlay.picks.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO picks (
                id, parlay_id, position, player_name, team_name, stat_category,
                line, direction, result, actual_value
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(pick.id.to_string())
        .bind(parlay.id.to_string())
        .bind(position as i64)
        .bind(&pick.player_name)
        .bind(&pick.team_name)
        .bind(&pick.stat_category)
        .bind(pick.line.to_string())
        .bind(pick.direction.as_str())
        .bind(pick.result.as_str())
        .bind(pick.actual_value.map(|v| v.to_string()))
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[async_trait]
impl LedgerStore for SqliteStore {
    async fn insert_parlay(&self, parlay: &Parlay) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO parlays (
                id, created_at, platform, entry_type, pick_count, stake,
                multiplier, status, hits, payout, profit, note, game_date
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(parlay.id.to_string())
        .bind(format_timestamp(&parlay.created_at))
        .bind(parlay.platform.to_string())
        .bind(parlay.entry_type.to_string())
        .bind(parlay.pick_count as i64)
        .bind(parlay.stake.to_string())
        .bind(parlay.multiplier.map(|m| m.to_string()))
        .bind(parlay.status.as_str())
        .bind(parlay.hits as i64)
        .bind(parlay.payout.to_string())
        .bind(parlay.profit.to_string())
        .bind(&parlay.note)
        .bind(parlay.game_date.map(|d| d.to_string()))
        .execute(&mut *tx)
        .await?;

        insert_picks(&mut tx, parlay).await?;
        tx.commit().await?;

        debug!(parlay_id = %parlay.id, picks = parlay.picks.len(), "Parlay inserted");
        Ok(())
    }

    async fn get_parlay(&self, id: Uuid) -> Result<Option<Parlay>> {
        let mut tx = self.pool.begin().await?;

        let sql = format!("SELECT {PARLAY_COLUMNS} FROM parlays WHERE id = ?");
        let row = sqlx::query(&sql)
            .bind(id.to_string())
            .fetch_optional(&mut *tx)
            .await?;

        let parlay = match row {
            Some(row) => Some(hydrate(&mut tx, &row).await?),
            None => None,
        };
        tx.commit().await?;
        Ok(parlay)
    }

    async fn save_parlay(&self, parlay: &Parlay) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE parlays
            SET platform = ?, entry_type = ?, pick_count = ?, stake = ?,
                multiplier = ?, status = ?, hits = ?, payout = ?, profit = ?,
                note = ?, game_date = ?
            WHERE id = ?
            "#,
        )
        .bind(parlay.platform.to_string())
        .bind(parlay.entry_type.to_string())
        .bind(parlay.pick_count as i64)
        .bind(parlay.stake.to_string())
        .bind(parlay.multiplier.map(|m| m.to_string()))
        .bind(parlay.status.as_str())
        .bind(parlay.hits as i64)
        .bind(parlay.payout.to_string())
        .bind(parlay.profit.to_string())
        .bind(&parlay.note)
        .bind(parlay.game_date.map(|d| d.to_string()))
        .bind(parlay.id.to_string())
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if updated == 0 {
            tx.rollback().await?;
            return Err(LedgerError::ParlayNotFound(parlay.id));
        }

        sqlx::query("DELETE FROM picks WHERE parlay_id = ?")
            .bind(parlay.id.to_string())
            .execute(&mut *tx)
            .await?;
        insert_picks(&mut tx, parlay).await?;
        tx.commit().await?;

        debug!(parlay_id = %parlay.id, status = %parlay.status, "Parlay saved");
        Ok(())
    }

    async fn delete_parlay(&self, id: Uuid) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        // Explicit child delete keeps this correct even on a connection
        // opened without foreign key enforcement.
        sqlx::query("DELETE FROM picks WHERE parlay_id = ?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await?;
        let deleted = sqlx::query("DELETE FROM parlays WHERE id = ?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;
        Ok(deleted > 0)
    }

    async fn list_parlays(&self, filter: &ParlayFilter) -> Result<Vec<Parlay>> {
        let mut qb = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {PARLAY_COLUMNS} FROM parlays WHERE 1=1"
        ));
        if let Some(status) = filter.status {
            qb.push(" AND status = ").push_bind(status.as_str());
        }
        if let Some(platform) = filter.platform {
            qb.push(" AND platform = ").push_bind(platform.to_string());
        }
        if let Some(entry_type) = filter.entry_type {
            qb.push(" AND entry_type = ").push_bind(entry_type.to_string());
        }
        qb.push(" ORDER BY created_at DESC, rowid DESC");

        let mut tx = self.pool.begin().await?;
        let rows = qb.build().fetch_all(&mut *tx).await?;

        let mut parlays = Vec::with_capacity(rows.len());
        for row in &rows {
            parlays.push(hydrate(&mut tx, row).await?);
        }
        tx.commit().await?;
        Ok(parlays)
    }

    async fn pick_owner(&self, pick_id: Uuid) -> Result<Option<Uuid>> {
        let owner: Option<String> = sqlx::query_scalar("SELECT parlay_id FROM picks WHERE id = ?")
            .bind(pick_id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        owner.map(|s| parse_uuid(&s, "picks.parlay_id")).transpose()
    }

    fn name(&self) -> &str {
        "sqlite"
    }
}

// ---------------------------------------------------------------------------
// Row decoding
// ---------------------------------------------------------------------------

fn corrupt(field: &str, value: &str, err: impl std::fmt::Display) -> LedgerError {
    LedgerError::Corrupt(format!("{field} = {value:?}: {err}"))
}

fn parse_uuid(value: &str, field: &str) -> Result<Uuid> {
    Uuid::parse_str(value).map_err(|e| corrupt(field, value, e))
}

fn parse_decimal(value: &str, field: &str) -> Result<Decimal> {
    Decimal::from_str(value).map_err(|e| corrupt(field, value, e))
}

fn parse_enum<T>(value: &str, field: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.parse::<T>().map_err(|e| corrupt(field, value, e))
}

fn parse_count(value: i64, field: &str) -> Result<u32> {
    u32::try_from(value).map_err(|e| corrupt(field, &value.to_string(), e))
}

fn parlay_from_row(row: &SqliteRow) -> Result<Parlay> {
    let id: String = row.try_get("id")?;
    let created_at: String = row.try_get("created_at")?;
    let platform: String = row.try_get("platform")?;
    let entry_type: String = row.try_get("entry_type")?;
    let pick_count: i64 = row.try_get("pick_count")?;
    let stake: String = row.try_get("stake")?;
    let multiplier: Option<String> = row.try_get("multiplier")?;
    let status: String = row.try_get("status")?;
    let hits: i64 = row.try_get("hits")?;
    let payout: String = row.try_get("payout")?;
    let profit: String = row.try_get("profit")?;
    let note: Option<String> = row.try_get("note")?;
    let game_date: Option<String> = row.try_get("game_date")?;

    Ok(Parlay {
        id: parse_uuid(&id, "parlays.id")?,
        created_at: DateTime::parse_from_rfc3339(&created_at)
            .map_err(|e| corrupt("parlays.created_at", &created_at, e))?
            .with_timezone(&Utc),
        platform: parse_enum(&platform, "parlays.platform")?,
        entry_type: parse_enum(&entry_type, "parlays.entry_type")?,
        pick_count: parse_count(pick_count, "parlays.pick_count")?,
        stake: parse_decimal(&stake, "parlays.stake")?,
        multiplier: multiplier
            .map(|m| parse_decimal(&m, "parlays.multiplier"))
            .transpose()?,
        status: parse_enum(&status, "parlays.status")?,
        hits: parse_count(hits, "parlays.hits")?,
        payout: parse_decimal(&payout, "parlays.payout")?,
        profit: parse_decimal(&profit, "parlays.profit")?,
        note,
        game_date: game_date
            .map(|d| {
                NaiveDate::parse_from_str(&d, "%Y-%m-%d")
                    .map_err(|e| corrupt("parlays.game_date", &d, e))
            })
            .transpose()?,
        picks: Vec::new(),
    })
}

fn pick_from_row(row: &SqliteRow) -> Result<Pick> {
    let id: String = row.try_get("id")?;
    let parlay_id: String = row.try_get("parlay_id")?;
    let line: String = row.try_get("line")?;
    let direction: String = row.try_get("direction")?;
    let result: String = row.try_get("result")?;
    let actual_value: Option<String> = row.try_get("actual_value")?;

    Ok(Pick {
        id: parse_uuid(&id, "picks.id")?,
        parlay_id: parse_uuid(&parlay_id, "picks.parlay_id")?,
        player_name: row.try_get("player_name")?,
        team_name: row.try_get("team_name")?,
        stat_category: row.try_get("stat_category")?,
        line: parse_decimal(&line, "picks.line")?,
        direction: parse_enum(&direction, "picks.direction")?,
        result: parse_enum(&result, "picks.result")?,
        actual_value: actual_value
            .map(|v| parse_decimal(&v, "picks.actual_value"))
            .transpose()?,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
