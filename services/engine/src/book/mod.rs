//! Multi-contract continuous limit order book and matching engine
//!
//! One book instance holds every delivery contract; matching never
//! crosses contract keys. An incoming order synchronously consumes
//! crossing liquidity at the resting order's price and either fills
//! completely or rests with its remainder. Trades flow out through the
//! injected [`TradeSink`], never directly.

pub mod side_queue;

pub use side_queue::SideQueue;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use types::contract::ContractKey;
use types::errors::ExchangeError;
use types::ids::OrderId;
use types::order::{Order, OrderStatus, Side};
use types::trade::TradeDraft;

use crate::exposure;
use crate::identity::CollateralLimit;
use crate::sink::TradeSink;

/// Observable result of a submission or modification.
///
/// `status` reports `FILLED` whenever any quantity matched in this call,
/// even if a remainder rests; it reports `ACTIVE` only when nothing
/// matched. Downstream clients depend on exactly this labeling.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub order_id: OrderId,
    pub status: OrderStatus,
    pub filled_quantity: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ContractSides {
    bids: SideQueue,
    asks: SideQueue,
}

impl ContractSides {
    fn new() -> Self {
        Self {
            bids: SideQueue::new(Side::BUY),
            asks: SideQueue::new(Side::SELL),
        }
    }

    fn queue_mut(&mut self, side: Side) -> &mut SideQueue {
        match side {
            Side::BUY => &mut self.bids,
            Side::SELL => &mut self.asks,
        }
    }
}

/// The order book. Exclusively owns every live order record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderBook {
    orders: HashMap<OrderId, Order>,
    contracts: BTreeMap<ContractKey, ContractSides>,
}

impl Default for ContractSides {
    fn default() -> Self {
        Self::new()
    }
}

/// Opaque book snapshot for the batch executor.
#[derive(Debug, Clone)]
pub struct BookSnapshot(OrderBook);

impl OrderBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit a new order: validate, check the trading window and the
    /// owner's collateral, probe for self-matches, then execute against
    /// the opposite side and rest any remainder.
    #[allow(clippy::too_many_arguments)]
    pub fn submit(
        &mut self,
        owner: &str,
        side: Side,
        price: i64,
        quantity: i64,
        contract: ContractKey,
        now: i64,
        realized: i128,
        limit: CollateralLimit,
        sink: &mut dyn TradeSink,
    ) -> Result<Submission, ExchangeError> {
        if quantity < 1 {
            return Err(ExchangeError::InvalidInput(
                "quantity must be at least 1".to_string(),
            ));
        }
        if now < contract.window_open() {
            return Err(ExchangeError::TooEarly);
        }
        if now > contract.window_close() {
            return Err(ExchangeError::TooLate);
        }

        // Admission treats the new order as if it were already resting
        // at its full quantity.
        let hypothetical = exposure::signed_exposure_of(side, price, quantity);
        let potential =
            exposure::potential_balance(realized, self.orders_of(owner)) + hypothetical;
        if !exposure::admissible(potential, limit) {
            return Err(ExchangeError::InsufficientCollateral);
        }

        let candidates = self.crossing_candidates(contract, side, price);
        self.probe_self_match(owner, quantity, &candidates)?;

        let mut order = Order::new(owner, side, price, quantity, contract, now);
        let filled = self.execute(&mut order, &candidates, now, sink);

        let order_id = order.order_id;
        if order.remaining_quantity > 0 {
            self.contracts
                .entry(contract)
                .or_default()
                .queue_mut(side)
                .insert(price, order_id);
            self.orders.insert(order_id, order);
        }

        Ok(Submission {
            order_id,
            status: reported_status(filled),
            filled_quantity: filled,
        })
    }

    /// Modify a resting order's price and quantity in place, then re-run
    /// matching against the post-modification book.
    #[allow(clippy::too_many_arguments)]
    pub fn modify(
        &mut self,
        owner: &str,
        order_id: OrderId,
        new_price: i64,
        new_quantity: i64,
        now: i64,
        realized: i128,
        limit: CollateralLimit,
        sink: &mut dyn TradeSink,
    ) -> Result<Submission, ExchangeError> {
        let order = self
            .orders
            .get(&order_id)
            .filter(|o| o.is_v2)
            .ok_or_else(|| ExchangeError::NotFound(format!("order {order_id}")))?;
        if order.owner != owner {
            return Err(ExchangeError::Forbidden);
        }
        if new_quantity < 1 {
            return Err(ExchangeError::InvalidInput(
                "quantity must be at least 1".to_string(),
            ));
        }

        let contract = order.contract;
        let side = order.side;
        let old_price = order.price;
        let old_remaining = order.remaining_quantity;

        let old_contribution = exposure::signed_exposure(order);
        let new_contribution = exposure::signed_exposure_of(side, new_price, new_quantity);
        let potential = exposure::potential_balance(realized, self.orders_of(owner))
            - old_contribution
            + new_contribution;
        if !exposure::admissible(potential, limit) {
            return Err(ExchangeError::InsufficientCollateral);
        }

        // The order rests on its own side, so the opposite-side
        // candidate walk can never see it.
        let candidates = self.crossing_candidates(contract, side, new_price);
        self.probe_self_match(owner, new_quantity, &candidates)?;

        let reset_priority = new_price != old_price || new_quantity > old_remaining;
        {
            let sides = self
                .contracts
                .get_mut(&contract)
                .expect("resting order implies contract entry");
            let queue = sides.queue_mut(side);
            if new_price != old_price {
                queue.remove(old_price, order_id);
                queue.insert(new_price, order_id);
            } else if reset_priority {
                queue.move_to_back(old_price, order_id);
            }
        }

        // Take the order out of the map so it can act as taker without
        // aliasing the resting entries it consumes.
        let mut order = self.orders.remove(&order_id).expect("looked up above");
        order.price = new_price;
        order.remaining_quantity = new_quantity;
        order.original_quantity = order.original_quantity.max(new_quantity);
        if reset_priority {
            order.priority_timestamp = now;
        }

        let filled = self.execute(&mut order, &candidates, now, sink);

        if order.remaining_quantity > 0 {
            self.orders.insert(order_id, order);
        } else {
            self.contracts
                .get_mut(&contract)
                .expect("resting order implies contract entry")
                .queue_mut(side)
                .remove(new_price, order_id);
        }

        Ok(Submission {
            order_id,
            status: reported_status(filled),
            filled_quantity: filled,
        })
    }

    /// Cancel a resting order.
    pub fn cancel(&mut self, owner: &str, order_id: OrderId) -> Result<(), ExchangeError> {
        let order = self
            .orders
            .get(&order_id)
            .filter(|o| o.is_v2)
            .ok_or_else(|| ExchangeError::NotFound(format!("order {order_id}")))?;
        if order.owner != owner {
            return Err(ExchangeError::Forbidden);
        }
        let (contract, side, price) = (order.contract, order.side, order.price);
        self.contracts
            .get_mut(&contract)
            .expect("resting order implies contract entry")
            .queue_mut(side)
            .remove(price, order_id);
        self.orders.remove(&order_id);
        Ok(())
    }

    /// Bids and asks for one contract, best first, FIFO within a level.
    ///
    /// Empty outside the contract's trading window.
    pub fn book(&self, contract: ContractKey, now: i64) -> (Vec<Order>, Vec<Order>) {
        if !contract.in_trading_window(now) {
            return (Vec::new(), Vec::new());
        }
        let Some(sides) = self.contracts.get(&contract) else {
            return (Vec::new(), Vec::new());
        };
        let resolve = |ids: Vec<OrderId>| {
            ids.into_iter()
                .map(|id| self.orders[&id].clone())
                .collect::<Vec<_>>()
        };
        (
            resolve(sides.bids.ids_best_first()),
            resolve(sides.asks.ids_best_first()),
        )
    }

    /// The owner's open orders across all contracts, newest first.
    pub fn my_active(&self, owner: &str) -> Vec<Order> {
        let mut orders: Vec<Order> = self
            .orders_of(owner)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.priority_timestamp.cmp(&a.priority_timestamp));
        orders
    }

    /// Open orders belonging to `owner`; everything in the map is active.
    pub fn orders_of<'a>(&'a self, owner: &'a str) -> impl Iterator<Item = &'a Order> {
        self.orders.values().filter(move |o| o.owner == owner)
    }

    pub fn order(&self, order_id: OrderId) -> Option<&Order> {
        self.orders.get(&order_id)
    }

    pub fn open_order_count(&self) -> usize {
        self.orders.len()
    }

    pub fn snapshot(&self) -> BookSnapshot {
        BookSnapshot(self.clone())
    }

    /// Rebuild the entire order set from the snapshot.
    pub fn restore(&mut self, snapshot: BookSnapshot) {
        *self = snapshot.0;
    }

    /// Resting order ids the taker would cross, in consumption order.
    fn crossing_candidates(
        &self,
        contract: ContractKey,
        taker_side: Side,
        taker_price: i64,
    ) -> Vec<OrderId> {
        let Some(sides) = self.contracts.get(&contract) else {
            return Vec::new();
        };
        match taker_side {
            Side::BUY => sides.asks.crossing(taker_price),
            Side::SELL => sides.bids.crossing(taker_price),
        }
    }

    /// Walk the candidates the way execution would and reject if any
    /// order the taker would actually consume belongs to the taker.
    /// Other users' orders consumed earlier shield later own orders.
    fn probe_self_match(
        &self,
        owner: &str,
        quantity: i64,
        candidates: &[OrderId],
    ) -> Result<(), ExchangeError> {
        let mut simulated = quantity;
        for id in candidates {
            if simulated == 0 {
                break;
            }
            let resting = &self.orders[id];
            if resting.owner == owner {
                return Err(ExchangeError::SelfMatch);
            }
            simulated -= simulated.min(resting.remaining_quantity);
        }
        Ok(())
    }

    /// Consume candidates until the taker is exhausted or crossing ends,
    /// recording one trade per matched pair at the maker's price.
    fn execute(
        &mut self,
        taker: &mut Order,
        candidates: &[OrderId],
        now: i64,
        sink: &mut dyn TradeSink,
    ) -> i64 {
        let mut filled = 0i64;
        for id in candidates {
            if taker.remaining_quantity == 0 {
                break;
            }
            let resting = self
                .orders
                .get_mut(id)
                .expect("candidate ids come from the live queues");
            let take = taker.remaining_quantity.min(resting.remaining_quantity);
            let (buyer, seller) = match taker.side {
                Side::BUY => (taker.owner.clone(), resting.owner.clone()),
                Side::SELL => (resting.owner.clone(), taker.owner.clone()),
            };
            let maker_price = resting.price;
            let maker_side = resting.side;

            resting.remaining_quantity -= take;
            let maker_exhausted = resting.remaining_quantity == 0;
            if maker_exhausted {
                resting.status = OrderStatus::Filled;
            }

            taker.remaining_quantity -= take;
            filled += take;

            if maker_exhausted {
                self.contracts
                    .get_mut(&taker.contract)
                    .expect("resting order implies contract entry")
                    .queue_mut(maker_side)
                    .remove(maker_price, *id);
                self.orders.remove(id);
            }

            sink.record(TradeDraft {
                buyer,
                seller,
                price: maker_price,
                quantity: take,
                contract: taker.contract,
                timestamp: now,
                is_v2: true,
            });
        }
        if taker.remaining_quantity == 0 {
            taker.status = OrderStatus::Filled;
        }
        filled
    }
}

fn reported_status(filled: i64) -> OrderStatus {
    if filled > 0 {
        OrderStatus::Filled
    } else {
        OrderStatus::Active
    }
}


#[cfg(test)]
impl OrderBook {
    /// Total remaining quantity across all open orders, test-only probe.
    fn order_remaining_total(&self) -> i64 {
        self.orders.values().map(|o| o.remaining_quantity).sum()
    }
}
