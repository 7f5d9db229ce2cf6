//! Exchange core
//!
//! Owns all mutable market state: registered users and tokens, the
//! multi-contract order book and matching engine, the trade ledger, the
//! legacy sell-only board, and the batch executor. The [`exchange::Exchange`]
//! composition root ties the pieces together; the HTTP boundary holds one
//! instance behind a single async mutex so every dispatch is indivisible.

pub mod batch;
pub mod book;
pub mod exchange;
pub mod exposure;
pub mod identity;
pub mod ledger;
pub mod legacy;
pub mod sink;
