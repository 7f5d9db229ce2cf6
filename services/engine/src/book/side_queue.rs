//! Price-time priority queue for one side of a contract book
//!
//! Levels are a `BTreeMap` keyed by price for deterministic iteration;
//! each level is a FIFO deque whose order equals priority-timestamp
//! order. The best bid is the highest-priced earliest order, the best
//! ask the lowest-priced earliest.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use types::ids::OrderId;
use types::order::Side;

/// One side of a contract's book.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SideQueue {
    side: Side,
    levels: BTreeMap<i64, VecDeque<OrderId>>,
}

impl SideQueue {
    pub fn new(side: Side) -> Self {
        Self {
            side,
            levels: BTreeMap::new(),
        }
    }

    /// Insert at the back of the price level (lowest time priority).
    pub fn insert(&mut self, price: i64, order_id: OrderId) {
        self.levels.entry(price).or_default().push_back(order_id);
    }

    /// Remove an order, pruning the level if it empties.
    pub fn remove(&mut self, price: i64, order_id: OrderId) -> bool {
        let Some(level) = self.levels.get_mut(&price) else {
            return false;
        };
        let Some(position) = level.iter().position(|id| *id == order_id) else {
            return false;
        };
        level.remove(position);
        if level.is_empty() {
            self.levels.remove(&price);
        }
        true
    }

    /// Send an order to the back of its level after a priority reset.
    pub fn move_to_back(&mut self, price: i64, order_id: OrderId) {
        if self.remove(price, order_id) {
            self.insert(price, order_id);
        }
    }

    /// All resting order ids in best-first order.
    pub fn ids_best_first(&self) -> Vec<OrderId> {
        let mut out = Vec::new();
        match self.side {
            Side::BUY => {
                for level in self.levels.values().rev() {
                    out.extend(level.iter().copied());
                }
            }
            Side::SELL => {
                for level in self.levels.values() {
                    out.extend(level.iter().copied());
                }
            }
        }
        out
    }

    /// Resting ids a taker at `taker_price` on the opposite side would
    /// cross, in consumption order.
    pub fn crossing(&self, taker_price: i64) -> Vec<OrderId> {
        let mut out = Vec::new();
        match self.side {
            // Resting sells cross when the incoming buy bids at least
            // their price; cheapest first.
            Side::SELL => {
                for level in self.levels.range(..=taker_price).map(|(_, l)| l) {
                    out.extend(level.iter().copied());
                }
            }
            // Resting buys cross when the incoming sell asks at most
            // their price; highest first.
            Side::BUY => {
                for level in self.levels.range(taker_price..).rev().map(|(_, l)| l) {
                    out.extend(level.iter().copied());
                }
            }
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }
}
