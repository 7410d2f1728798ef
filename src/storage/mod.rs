//! Persistence layer.
//!
//! The ledger talks to storage only through the `LedgerStore` trait. Two
//! backends ship with the crate: an in-memory map for tests and throwaway
//! runs, and SQLite for a ledger that survives restarts.

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::types::{Parlay, ParlayFilter};

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Row-level access to parlays and their picks.
///
/// Every write covers a parlay together with all of its picks; a reader
/// never sees a parlay with half of its picks written.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Store a new parlay and its picks.
    async fn insert_parlay(&self, parlay: &Parlay) -> Result<()>;

    /// Fetch a parlay with its picks in submission order.
    async fn get_parlay(&self, id: Uuid) -> Result<Option<Parlay>>;

    /// Replace a stored parlay and its picks.
    /// Fails with `ParlayNotFound` if the parlay was deleted meanwhile.
    async fn save_parlay(&self, parlay: &Parlay) -> Result<()>;

    /// Remove a parlay and its picks. Returns false if it didn't exist.
    async fn delete_parlay(&self, id: Uuid) -> Result<bool>;

    /// Parlays matching the filter, newest first.
    async fn list_parlays(&self, filter: &ParlayFilter) -> Result<Vec<Parlay>>;

    /// Id of the parlay owning a pick, if the pick exists anywhere.
    async fn pick_owner(&self, pick_id: Uuid) -> Result<Option<Uuid>>;

    /// Backend name for logging.
    fn name(&self) -> &str;
}
