//! Composition root for the exchange core
//!
//! Owns the identity service, order book, trade ledger, legacy board,
//! and the live trade feed. Handlers call these methods under a single
//! async mutex, which makes every dispatch indivisible: either a request
//! is rejected whole or the full cascade of trades it produced took
//! effect before anything else runs.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use types::contract::ContractKey;
use types::errors::ExchangeError;
use types::ids::OrderId;
use types::order::Side;
use types::trade::Trade;

use crate::book::{OrderBook, Submission};
use crate::exposure;
use crate::identity::{CollateralLimit, Identity};
use crate::ledger::TradeLedger;
use crate::legacy::LegacyBoard;
use crate::sink::LiveSink;

/// Capacity of the live trade feed; slow consumers past this lag are
/// dropped by their own stream task.
const FEED_CAPACITY: usize = 256;

/// Balance view for one user.
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceReport {
    pub balance: i64,
    pub potential_balance: i64,
    pub collateral: CollateralLimit,
}

/// All mutable state of the exchange process.
pub struct Exchange {
    pub identity: Identity,
    pub book: OrderBook,
    pub ledger: TradeLedger,
    pub legacy: LegacyBoard,
    pub(crate) feed: broadcast::Sender<Trade>,
}

/// Serializable projection of the exchange state for the best-effort
/// persistence layer. The feed channel is process-local and excluded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedState {
    pub identity: Identity,
    pub book: OrderBook,
    pub ledger: TradeLedger,
    pub legacy: LegacyBoard,
}

impl Default for Exchange {
    fn default() -> Self {
        Self::new()
    }
}

impl Exchange {
    pub fn new() -> Self {
        let (feed, _) = broadcast::channel(FEED_CAPACITY);
        Self {
            identity: Identity::new(),
            book: OrderBook::new(),
            ledger: TradeLedger::new(),
            legacy: LegacyBoard::new(),
            feed,
        }
    }

    /// Attach a new live trade consumer.
    pub fn subscribe(&self) -> broadcast::Receiver<Trade> {
        self.feed.subscribe()
    }

    /// Submit a new matching-engine order on behalf of `owner`.
    pub fn place_order(
        &mut self,
        owner: &str,
        side: Side,
        price: i64,
        quantity: i64,
        contract: ContractKey,
        now: i64,
    ) -> Result<Submission, ExchangeError> {
        let realized = self.ledger.balance(owner);
        let limit = self.identity.collateral_limit(owner);
        let Exchange {
            book, ledger, feed, ..
        } = self;
        let mut sink = LiveSink { ledger, feed };
        book.submit(
            owner, side, price, quantity, contract, now, realized, limit, &mut sink,
        )
    }

    /// Modify one of `owner`'s resting orders.
    pub fn modify_order(
        &mut self,
        owner: &str,
        order_id: OrderId,
        price: i64,
        quantity: i64,
        now: i64,
    ) -> Result<Submission, ExchangeError> {
        let realized = self.ledger.balance(owner);
        let limit = self.identity.collateral_limit(owner);
        let Exchange {
            book, ledger, feed, ..
        } = self;
        let mut sink = LiveSink { ledger, feed };
        book.modify(
            owner, order_id, price, quantity, now, realized, limit, &mut sink,
        )
    }

    pub fn cancel_order(&mut self, owner: &str, order_id: OrderId) -> Result<(), ExchangeError> {
        self.book.cancel(owner, order_id)
    }

    /// Realized balance, potential balance, and collateral for a user.
    pub fn balance_report(&self, username: &str) -> BalanceReport {
        let realized = self.ledger.balance(username);
        let potential = exposure::potential_balance(realized, self.book.orders_of(username));
        BalanceReport {
            balance: clamp_to_i64(realized),
            potential_balance: clamp_to_i64(potential),
            collateral: self.identity.collateral_limit(username),
        }
    }

    /// Matching-engine trades newest first, optionally filtered to one
    /// delivery window.
    pub fn trades(&self, window: Option<ContractKey>) -> Vec<Trade> {
        self.ledger
            .all()
            .filter(|t| t.is_v2)
            .filter(|t| window.map_or(true, |w| t.contract == w))
            .cloned()
            .collect()
    }

    /// Matching-engine trades where the user is buyer or seller, newest
    /// first.
    pub fn my_trades(&self, username: &str, window: Option<ContractKey>) -> Vec<Trade> {
        self.trades(window)
            .into_iter()
            .filter(|t| t.buyer == username || t.seller == username)
            .collect()
    }

    /// List a sell offer on the legacy board.
    pub fn list_legacy_offer(
        &mut self,
        owner: &str,
        price: i64,
        quantity: i64,
        contract: ContractKey,
        now: i64,
    ) -> Result<OrderId, ExchangeError> {
        self.legacy.list_offer(owner, price, quantity, contract, now)
    }

    /// Take quantity from a legacy offer. The trade reaches the ledger
    /// but never the stream.
    pub fn take_legacy_offer(
        &mut self,
        buyer: &str,
        offer_id: OrderId,
        quantity: i64,
        now: i64,
    ) -> Result<Trade, ExchangeError> {
        let Exchange { legacy, ledger, .. } = self;
        legacy.take(buyer, offer_id, quantity, now, ledger)
    }

    pub fn to_persisted(&self) -> PersistedState {
        PersistedState {
            identity: self.identity.clone(),
            book: self.book.clone(),
            ledger: self.ledger.clone(),
            legacy: self.legacy.clone(),
        }
    }

    pub fn from_persisted(state: PersistedState) -> Self {
        let (feed, _) = broadcast::channel(FEED_CAPACITY);
        Self {
            identity: state.identity,
            book: state.book,
            ledger: state.ledger,
            legacy: state.legacy,
            feed,
        }
    }
}

/// Wire integers are 64-bit; saturate rather than wrap for balances
/// that outgrew the range.
pub fn clamp_to_i64(value: i128) -> i64 {
    value.clamp(i64::MIN as i128, i64::MAX as i128) as i64
}
