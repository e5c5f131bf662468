//! Simulated retail trading: a virtual cash ledger and holdings book per user,
//! orders settled against a replayed and randomly walked price feed.

pub mod api;
pub mod config;
pub mod error;
pub mod feed;
pub mod holdings;
pub mod ledger;
pub mod locks;
pub mod matching;
pub mod persistence;
pub mod trading;
pub mod types;
