//! Order lifecycle types

use crate::contract::ContractKey;
use crate::ids::OrderId;
use serde::{Deserialize, Serialize};

/// Order side (buyer or seller)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    /// Buy order (bid)
    BUY,
    /// Sell order (ask)
    SELL,
}

impl Side {
    /// Get the opposite side
    pub fn opposite(&self) -> Self {
        match self {
            Side::BUY => Side::SELL,
            Side::SELL => Side::BUY,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::BUY => "BUY",
            Side::SELL => "SELL",
        }
    }

    /// Parse from the wire representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "BUY" => Some(Side::BUY),
            "SELL" => Some(Side::SELL),
            _ => None,
        }
    }
}

/// Order status
///
/// `Filled` and `Cancelled` are terminal; terminal orders leave the book
/// and reject further modification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    Active,
    Filled,
    Cancelled,
}

impl OrderStatus {
    /// Check if status is terminal (no further transitions possible)
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Filled | OrderStatus::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Active => "ACTIVE",
            OrderStatus::Filled => "FILLED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }
}

/// A limit order in the matching engine.
///
/// Prices are signed (energy surpluses trade at negative prices);
/// quantities are strictly positive while the order is active.
/// `priority_timestamp` breaks ties within a price level and is reset on
/// price changes and quantity increases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: OrderId,
    pub owner: String,
    pub side: Side,
    pub price: i64,
    pub remaining_quantity: i64,
    pub original_quantity: i64,
    pub contract: ContractKey,
    pub status: OrderStatus,
    pub priority_timestamp: i64,
    pub is_v2: bool,
}

impl Order {
    /// Create a new active matching-engine order.
    pub fn new(
        owner: impl Into<String>,
        side: Side,
        price: i64,
        quantity: i64,
        contract: ContractKey,
        timestamp: i64,
    ) -> Self {
        Self {
            order_id: OrderId::new(),
            owner: owner.into(),
            side,
            price,
            remaining_quantity: quantity,
            original_quantity: quantity,
            contract,
            status: OrderStatus::Active,
            priority_timestamp: timestamp,
            is_v2: true,
        }
    }

    /// Check if the order has no remaining quantity.
    pub fn is_exhausted(&self) -> bool {
        self.remaining_quantity == 0
    }
}
