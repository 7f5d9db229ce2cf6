//! Legacy sell-only board with manual take
//!
//! Predates the matching engine and shares nothing with it: offers are a
//! flat list, takes are explicit, and the resulting trades are recorded
//! with `is_v2 = false` so they never reach the stream or the v2 trade
//! queries. Kept for clients that still speak the old surface.

use serde::{Deserialize, Serialize};
use types::contract::ContractKey;
use types::errors::ExchangeError;
use types::ids::OrderId;
use types::trade::{Trade, TradeDraft};

use crate::ledger::TradeLedger;

/// A sell offer on the legacy board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyOffer {
    pub offer_id: OrderId,
    pub owner: String,
    pub price: i64,
    pub quantity: i64,
    pub contract: ContractKey,
    pub listed_at: i64,
}

/// The legacy offer list, oldest first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LegacyBoard {
    offers: Vec<LegacyOffer>,
}

impl LegacyBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// List a new sell offer.
    pub fn list_offer(
        &mut self,
        owner: &str,
        price: i64,
        quantity: i64,
        contract: ContractKey,
        now: i64,
    ) -> Result<OrderId, ExchangeError> {
        if quantity < 1 {
            return Err(ExchangeError::InvalidInput(
                "quantity must be at least 1".to_string(),
            ));
        }
        let offer = LegacyOffer {
            offer_id: OrderId::new(),
            owner: owner.to_string(),
            price,
            quantity,
            contract,
            listed_at: now,
        };
        let offer_id = offer.offer_id;
        self.offers.push(offer);
        Ok(offer_id)
    }

    pub fn offers(&self) -> &[LegacyOffer] {
        &self.offers
    }

    /// Take quantity from an offer at its listed price.
    ///
    /// The trade is recorded directly through the ledger; fully consumed
    /// offers leave the board.
    pub fn take(
        &mut self,
        buyer: &str,
        offer_id: OrderId,
        quantity: i64,
        now: i64,
        ledger: &mut TradeLedger,
    ) -> Result<Trade, ExchangeError> {
        if quantity < 1 {
            return Err(ExchangeError::InvalidInput(
                "quantity must be at least 1".to_string(),
            ));
        }
        let position = self
            .offers
            .iter()
            .position(|o| o.offer_id == offer_id)
            .ok_or_else(|| ExchangeError::NotFound(format!("offer {offer_id}")))?;

        let offer = &mut self.offers[position];
        if offer.owner == buyer {
            return Err(ExchangeError::Forbidden);
        }
        if quantity > offer.quantity {
            return Err(ExchangeError::InvalidInput(
                "take exceeds offered quantity".to_string(),
            ));
        }

        let draft = TradeDraft {
            buyer: buyer.to_string(),
            seller: offer.owner.clone(),
            price: offer.price,
            quantity,
            contract: offer.contract,
            timestamp: now,
            is_v2: false,
        };

        offer.quantity -= quantity;
        if offer.quantity == 0 {
            self.offers.remove(position);
        }

        Ok(ledger.record(draft))
    }
}
