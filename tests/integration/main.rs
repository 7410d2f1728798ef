//! End-to-end tests over the public crate API.

mod api;
mod ledger_flow;
