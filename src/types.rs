//! Shared types for the parlay ledger.
//!
//! Parlays, picks, and the enums that describe them. Settlement, storage,
//! and the HTTP layer all speak in these types.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::settlement::payouts::PayoutTable;

// ---------------------------------------------------------------------------
// Platform
// ---------------------------------------------------------------------------

/// Wagering product the parlay was placed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Platform {
    PrizePicks,
    Underdog,
}

impl Platform {
    /// Maximum number of picks a single entry may carry.
    pub fn max_picks(&self) -> usize {
        match self {
            Platform::PrizePicks => 6,
            Platform::Underdog => 5,
        }
    }

    /// Entry types this platform offers.
    pub fn entry_types(&self) -> &'static [EntryType] {
        match self {
            Platform::PrizePicks => &[EntryType::Power, EntryType::Flex],
            Platform::Underdog => &[EntryType::Standard, EntryType::Flex],
        }
    }

    pub fn offers(&self, entry_type: EntryType) -> bool {
        self.entry_types().contains(&entry_type)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::PrizePicks => write!(f, "PrizePicks"),
            Platform::Underdog => write!(f, "Underdog"),
        }
    }
}

impl std::str::FromStr for Platform {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "prizepicks" | "prize_picks" | "pp" => Ok(Platform::PrizePicks),
            "underdog" | "underdog_fantasy" | "ud" => Ok(Platform::Underdog),
            _ => Err(anyhow::anyhow!("Unknown platform: {s}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Entry type
// ---------------------------------------------------------------------------

/// Sub-mode within a platform.
///
/// `Power` and `Standard` pay only when every pick hits; `Flex` pays a
/// reduced multiplier with one miss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntryType {
    Power,
    Flex,
    Standard,
}

impl EntryType {
    /// Whether one miss still earns a payout tier.
    pub fn is_flex(&self) -> bool {
        matches!(self, EntryType::Flex)
    }

    /// Smallest pick count this entry type can be played with.
    pub fn min_picks(&self) -> usize {
        match self {
            EntryType::Flex => 3,
            EntryType::Power | EntryType::Standard => 2,
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryType::Power => write!(f, "Power"),
            EntryType::Flex => write!(f, "Flex"),
            EntryType::Standard => write!(f, "Standard"),
        }
    }
}

impl std::str::FromStr for EntryType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "power" | "power_play" => Ok(EntryType::Power),
            "flex" | "flex_play" => Ok(EntryType::Flex),
            "standard" => Ok(EntryType::Standard),
            _ => Err(anyhow::anyhow!("Unknown entry type: {s}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Status enums
// ---------------------------------------------------------------------------

/// Settlement status of a parlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParlayStatus {
    Pending,
    Won,
    Lost,
    Partial,
}

impl ParlayStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParlayStatus::Pending => "pending",
            ParlayStatus::Won => "won",
            ParlayStatus::Lost => "lost",
            ParlayStatus::Partial => "partial",
        }
    }
}

impl fmt::Display for ParlayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ParlayStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" | "open" => Ok(ParlayStatus::Pending),
            "won" | "win" => Ok(ParlayStatus::Won),
            "lost" | "loss" => Ok(ParlayStatus::Lost),
            "partial" => Ok(ParlayStatus::Partial),
            _ => Err(anyhow::anyhow!("Unknown parlay status: {s}")),
        }
    }
}

/// Which side of the line a pick takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Higher,
    Lower,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Higher => "higher",
            Direction::Lower => "lower",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Direction {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "higher" | "over" | "more" => Ok(Direction::Higher),
            "lower" | "under" | "less" => Ok(Direction::Lower),
            _ => Err(anyhow::anyhow!("Unknown pick direction: {s}")),
        }
    }
}

/// Outcome of a single pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PickResult {
    Pending,
    Hit,
    Miss,
}

impl PickResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            PickResult::Pending => "pending",
            PickResult::Hit => "hit",
            PickResult::Miss => "miss",
        }
    }
}

impl fmt::Display for PickResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PickResult {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(PickResult::Pending),
            "hit" | "win" | "won" => Ok(PickResult::Hit),
            "miss" | "loss" | "lost" => Ok(PickResult::Miss),
            _ => Err(anyhow::anyhow!("Unknown pick result: {s}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Pick
// ---------------------------------------------------------------------------

/// One player-stat proposition inside a parlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pick {
    pub id: Uuid,
    pub parlay_id: Uuid,
    pub player_name: String,
    pub team_name: Option<String>,
    /// Free-form label, e.g. "Hits" or "Strikeouts".
    pub stat_category: String,
    pub line: Decimal,
    pub direction: Direction,
    pub result: PickResult,
    pub actual_value: Option<Decimal>,
}

impl Pick {
    /// Grade an observed stat against the line.
    /// Landing exactly on the line is not a hit in either direction.
    pub fn grade(&self, actual: Decimal) -> PickResult {
        let hit = match self.direction {
            Direction::Higher => actual > self.line,
            Direction::Lower => actual < self.line,
        };
        if hit {
            PickResult::Hit
        } else {
            PickResult::Miss
        }
    }

    pub fn is_hit(&self) -> bool {
        self.result == PickResult::Hit
    }
}

impl fmt::Display for Pick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} [{}]",
            self.player_name, self.direction, self.line, self.stat_category, self.result,
        )
    }
}

// ---------------------------------------------------------------------------
// Parlay
// ---------------------------------------------------------------------------

/// A single wagered entry combining several picks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parlay {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub platform: Platform,
    pub entry_type: EntryType,
    pub pick_count: u32,
    pub stake: Decimal,
    /// User-supplied payout multiplier; bypasses the payout table when positive.
    pub multiplier: Option<Decimal>,
    pub status: ParlayStatus,
    pub hits: u32,
    pub payout: Decimal,
    pub profit: Decimal,
    pub note: Option<String>,
    pub game_date: Option<NaiveDate>,
    pub picks: Vec<Pick>,
}

impl Parlay {
    /// Number of picks currently graded as a hit.
    pub fn count_hits(&self) -> u32 {
        self.picks.iter().filter(|p| p.is_hit()).count() as u32
    }

    /// Payout if every pick hits.
    pub fn potential_payout(&self, table: &PayoutTable) -> Decimal {
        crate::settlement::settle(
            self.stake,
            self.multiplier,
            self.pick_count,
            self.platform,
            self.entry_type,
            self.pick_count,
            table,
        )
    }

    pub fn pick(&self, pick_id: Uuid) -> Option<&Pick> {
        self.picks.iter().find(|p| p.id == pick_id)
    }

    pub fn pick_mut(&mut self, pick_id: Uuid) -> Option<&mut Pick> {
        self.picks.iter_mut().find(|p| p.id == pick_id)
    }
}

impl fmt::Display for Parlay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{} {}] {}-pick ${:.2} {} ({}/{} hits, payout ${:.2}, profit ${:.2})",
            self.platform,
            self.entry_type,
            self.pick_count,
            self.stake,
            self.status,
            self.hits,
            self.pick_count,
            self.payout,
            self.profit,
        )
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// A pick as submitted with a new parlay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPick {
    pub player_name: String,
    #[serde(default)]
    pub team_name: Option<String>,
    pub stat_category: String,
    pub line: Decimal,
    pub direction: Direction,
}

/// A parlay as submitted for creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewParlay {
    pub platform: Platform,
    pub entry_type: EntryType,
    pub stake: Decimal,
    #[serde(default)]
    pub multiplier: Option<Decimal>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub game_date: Option<NaiveDate>,
    pub picks: Vec<NewPick>,
}

/// Result correction for one pick.
///
/// Supplying only `actual_value` grades the pick against its line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PickUpdate {
    pub pick_id: Uuid,
    #[serde(default)]
    pub result: Option<PickResult>,
    #[serde(default)]
    pub actual_value: Option<Decimal>,
}

/// Optional narrowing applied to listings and statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParlayFilter {
    pub status: Option<ParlayStatus>,
    pub platform: Option<Platform>,
    pub entry_type: Option<EntryType>,
}

impl ParlayFilter {
    pub fn matches(&self, parlay: &Parlay) -> bool {
        self.status.map_or(true, |s| parlay.status == s)
            && self.platform.map_or(true, |p| parlay.platform == p)
            && self.entry_type.map_or(true, |e| parlay.entry_type == e)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
