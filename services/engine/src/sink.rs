//! Trade-sink abstraction
//!
//! The matching engine records trades through this interface and never
//! learns whether they go straight to stream consumers or sit in a batch
//! buffer awaiting commit.

use tokio::sync::broadcast;
use types::trade::{Trade, TradeDraft};

use crate::ledger::TradeLedger;

/// Destination for trades produced by the matching engine.
pub trait TradeSink {
    /// Record a matched trade and return the ledger's canonical record.
    fn record(&mut self, draft: TradeDraft) -> Trade;
}

/// Records through the ledger and pushes every v2 trade into the live
/// broadcast channel immediately.
pub struct LiveSink<'a> {
    pub ledger: &'a mut TradeLedger,
    pub feed: &'a broadcast::Sender<Trade>,
}

impl TradeSink for LiveSink<'_> {
    fn record(&mut self, draft: TradeDraft) -> Trade {
        let trade = self.ledger.record(draft);
        if trade.is_v2 {
            // No receivers is fine; consumers attach and detach freely.
            let _ = self.feed.send(trade.clone());
        }
        trade
    }
}

/// Records through the ledger but holds the broadcast back.
///
/// The batch executor flushes the pending list on commit and drops it on
/// rollback.
pub struct BufferedSink<'a> {
    pub ledger: &'a mut TradeLedger,
    pub pending: &'a mut Vec<Trade>,
}

impl TradeSink for BufferedSink<'_> {
    fn record(&mut self, draft: TradeDraft) -> Trade {
        let trade = self.ledger.record(draft);
        if trade.is_v2 {
            self.pending.push(trade.clone());
        }
        trade
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::contract::{ContractKey, DELIVERY_WINDOW_MS};

    fn draft(is_v2: bool) -> TradeDraft {
        TradeDraft {
            buyer: "bob".to_string(),
            seller: "alice".to_string(),
            price: 150,
            quantity: 10,
            contract: ContractKey::new(100 * DELIVERY_WINDOW_MS, 101 * DELIVERY_WINDOW_MS)
                .unwrap(),
            timestamp: 1,
            is_v2,
        }
    }

    #[test]
    fn test_live_sink_broadcasts_v2_trades() {
        let mut ledger = TradeLedger::new();
        let (feed, mut rx) = broadcast::channel(8);

        let mut sink = LiveSink {
            ledger: &mut ledger,
            feed: &feed,
        };
        let trade = sink.record(draft(true));

        assert_eq!(rx.try_recv().unwrap().trade_id, trade.trade_id);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_live_sink_skips_legacy_trades() {
        let mut ledger = TradeLedger::new();
        let (feed, mut rx) = broadcast::channel(8);

        let mut sink = LiveSink {
            ledger: &mut ledger,
            feed: &feed,
        };
        sink.record(draft(false));

        assert!(rx.try_recv().is_err());
        assert_eq!(ledger.len(), 1, "legacy trades still reach the ledger");
    }

    #[test]
    fn test_live_sink_survives_no_receivers() {
        let mut ledger = TradeLedger::new();
        let (feed, _) = broadcast::channel(8);

        let mut sink = LiveSink {
            ledger: &mut ledger,
            feed: &feed,
        };
        sink.record(draft(true));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_buffered_sink_accumulates_without_broadcasting() {
        let mut ledger = TradeLedger::new();
        let mut pending = Vec::new();

        let mut sink = BufferedSink {
            ledger: &mut ledger,
            pending: &mut pending,
        };
        sink.record(draft(true));
        sink.record(draft(true));

        assert_eq!(pending.len(), 2);
        assert_eq!(ledger.len(), 2);
    }
}
