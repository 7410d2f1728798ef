//! Parlay Ledger: track player-prop parlays and settle them against
//! platform payout charts.
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod error;
pub mod types;
pub mod settlement;
pub mod storage;
pub mod ledger;
pub mod api;
