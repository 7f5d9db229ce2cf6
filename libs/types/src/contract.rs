//! Delivery contract keys and trading-window arithmetic
//!
//! A contract is a one-hour electricity delivery window identified by its
//! `(delivery_start, delivery_end)` pair in Unix milliseconds. Matching
//! never crosses contract keys.

use crate::errors::ExchangeError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Length of every delivery window: exactly one hour in milliseconds.
pub const DELIVERY_WINDOW_MS: i64 = 3_600_000;

/// One day in milliseconds.
pub const DAY_MS: i64 = 86_400_000;

/// Orders are accepted from this many days before the delivery day.
pub const BOOK_OPEN_LEAD_DAYS: i64 = 15;

/// Orders are rejected within this many milliseconds of delivery start.
pub const ORDER_CUTOFF_MS: i64 = 60_000;

/// Batch operations may not target contracts starting further out than
/// this many days.
pub const BATCH_MAX_LEAD_DAYS: i64 = 30;

/// Midnight UTC of the day containing `ms`.
pub fn midnight_utc(ms: i64) -> i64 {
    ms - ms.rem_euclid(DAY_MS)
}

/// Key identifying one hourly delivery contract.
///
/// Both endpoints are multiples of one hour and span exactly one hour.
/// Ordered so contract keys can serve as `BTreeMap` keys with
/// deterministic iteration.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ContractKey {
    pub delivery_start: i64,
    pub delivery_end: i64,
}

impl ContractKey {
    /// Validate and build a contract key from raw endpoints.
    pub fn new(delivery_start: i64, delivery_end: i64) -> Result<Self, ExchangeError> {
        if delivery_start % DELIVERY_WINDOW_MS != 0 || delivery_end % DELIVERY_WINDOW_MS != 0 {
            return Err(ExchangeError::InvalidInput(
                "delivery window endpoints must be hour-aligned".to_string(),
            ));
        }
        if delivery_end - delivery_start != DELIVERY_WINDOW_MS {
            return Err(ExchangeError::InvalidInput(
                "delivery window must span exactly one hour".to_string(),
            ));
        }
        Ok(Self {
            delivery_start,
            delivery_end,
        })
    }

    /// Earliest instant at which this contract accepts orders.
    pub fn window_open(&self) -> i64 {
        midnight_utc(self.delivery_start) - BOOK_OPEN_LEAD_DAYS * DAY_MS
    }

    /// Latest instant at which this contract accepts orders.
    pub fn window_close(&self) -> i64 {
        self.delivery_start - ORDER_CUTOFF_MS
    }

    /// Whether `now` falls inside the trading window.
    pub fn in_trading_window(&self, now: i64) -> bool {
        now >= self.window_open() && now <= self.window_close()
    }
}

impl fmt::Display for ContractKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}..{}]", self.delivery_start, self.delivery_end)
    }
}
