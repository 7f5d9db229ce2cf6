//! Trade ledger: append-only execution log and realized balances
//!
//! `record` is total: the matching engine only hands it trades it has
//! already deemed valid. Balances are carried alongside the log and
//! snapshotted directly rather than recomputed on restore.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use types::trade::{Trade, TradeDraft};

/// Append-only log of executed trades plus derived realized balances.
///
/// A seller's balance rises by `price * quantity`, the buyer's falls by
/// the same amount. Balances are widened to `i128` so extreme prices
/// cannot overflow the running sum.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TradeLedger {
    trades: Vec<Trade>,
    balances: HashMap<String, i128>,
}

/// Opaque ledger snapshot for the batch executor.
#[derive(Debug, Clone)]
pub struct LedgerSnapshot(TradeLedger);

impl TradeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a trade: assign a fresh id, normalize the timestamp so the
    /// log stays non-decreasing, apply balance deltas, and append.
    pub fn record(&mut self, draft: TradeDraft) -> Trade {
        let floor = self.trades.last().map(|t| t.timestamp).unwrap_or(i64::MIN);
        let trade = Trade {
            trade_id: types::ids::TradeId::new(),
            buyer: draft.buyer,
            seller: draft.seller,
            price: draft.price,
            quantity: draft.quantity,
            contract: draft.contract,
            timestamp: draft.timestamp.max(floor),
            is_v2: draft.is_v2,
        };

        let value = trade.value();
        *self.balances.entry(trade.seller.clone()).or_default() += value;
        *self.balances.entry(trade.buyer.clone()).or_default() -= value;

        self.trades.push(trade.clone());
        trade
    }

    /// All trades, newest first.
    pub fn all(&self) -> impl Iterator<Item = &Trade> {
        self.trades.iter().rev()
    }

    /// Realized cash balance; users with no trades sit at zero.
    pub fn balance(&self, user: &str) -> i128 {
        self.balances.get(user).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.trades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot(self.clone())
    }

    /// Replace both the log and the balance map from the snapshot.
    pub fn restore(&mut self, snapshot: LedgerSnapshot) {
        *self = snapshot.0;
    }
}
