//! Trade execution records

use crate::contract::ContractKey;
use crate::ids::TradeId;
use serde::{Deserialize, Serialize};

/// An executed trade between two participants.
///
/// The price is always the resting (maker) order's price at match time.
/// Timestamps are non-decreasing in ledger insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub trade_id: TradeId,
    pub buyer: String,
    pub seller: String,
    pub price: i64,
    pub quantity: i64,
    pub contract: ContractKey,
    pub timestamp: i64,
    pub is_v2: bool,
}

impl Trade {
    /// Cash value of the trade, widened so extreme prices cannot overflow.
    pub fn value(&self) -> i128 {
        self.price as i128 * self.quantity as i128
    }
}

/// Trade fields as produced by the matching engine, before the ledger
/// assigns an identifier and normalizes the timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeDraft {
    pub buyer: String,
    pub seller: String,
    pub price: i64,
    pub quantity: i64,
    pub contract: ContractKey,
    pub timestamp: i64,
    pub is_v2: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::DELIVERY_WINDOW_MS;

    fn test_contract() -> ContractKey {
        ContractKey::new(100 * DELIVERY_WINDOW_MS, 101 * DELIVERY_WINDOW_MS).unwrap()
    }

    #[test]
    fn test_trade_value() {
        let trade = Trade {
            trade_id: TradeId::new(),
            buyer: "bob".to_string(),
            seller: "alice".to_string(),
            price: 150,
            quantity: 1000,
            contract: test_contract(),
            timestamp: 42,
            is_v2: true,
        };
        assert_eq!(trade.value(), 150_000);
    }

    #[test]
    fn test_trade_value_negative_price() {
        let trade = Trade {
            trade_id: TradeId::new(),
            buyer: "bob".to_string(),
            seller: "alice".to_string(),
            price: -40,
            quantity: 10,
            contract: test_contract(),
            timestamp: 42,
            is_v2: true,
        };
        assert_eq!(trade.value(), -400);
    }

    #[test]
    fn test_trade_value_no_overflow_at_extremes() {
        let trade = Trade {
            trade_id: TradeId::new(),
            buyer: "bob".to_string(),
            seller: "alice".to_string(),
            price: i64::MAX,
            quantity: i64::MAX,
            contract: test_contract(),
            timestamp: 42,
            is_v2: true,
        };
        assert_eq!(trade.value(), i64::MAX as i128 * i64::MAX as i128);
    }
}
