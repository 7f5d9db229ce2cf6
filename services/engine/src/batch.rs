//! Transactional batch executor
//!
//! A batch is a list of contract-scoped operation groups applied through
//! the ordinary order-book entry points. Both the book and the ledger are
//! snapshotted up front; the first failure restores both, so an observer
//! only ever sees the pre-batch state or the fully applied state. Trades
//! produced inside a batch are buffered and only broadcast on commit.

use tracing::debug;
use types::contract::{ContractKey, BATCH_MAX_LEAD_DAYS, DAY_MS};
use types::errors::ExchangeError;
use types::ids::OrderId;
use types::order::{OrderStatus, Side};
use types::trade::Trade;

use crate::exchange::Exchange;
use crate::sink::BufferedSink;

/// One contract's worth of operations, in submission order.
#[derive(Debug, Clone)]
pub struct BatchGroup {
    pub delivery_start: i64,
    pub delivery_end: i64,
    /// `None` when the request omitted the list entirely.
    pub operations: Option<Vec<BatchOperation>>,
}

/// A single batch operation as decoded off the wire.
///
/// Field presence is validated here, not at decode time, so that a
/// malformed operation deep in a batch still rolls back everything
/// applied before it.
#[derive(Debug, Clone)]
pub struct BatchOperation {
    pub kind: String,
    pub token: Option<String>,
    pub side: Option<String>,
    pub price: Option<i64>,
    pub quantity: Option<i64>,
    pub order_id: Option<String>,
}

/// Per-operation outcome, aligned with the input order.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchOutcome {
    Created {
        order_id: OrderId,
        status: OrderStatus,
    },
    Modified {
        order_id: OrderId,
    },
    Cancelled,
}

impl Exchange {
    /// Apply a batch atomically: every operation lands, or none do.
    pub fn execute_batch(
        &mut self,
        groups: Vec<BatchGroup>,
        now: i64,
    ) -> Result<Vec<BatchOutcome>, ExchangeError> {
        let book_snapshot = self.book.snapshot();
        let ledger_snapshot = self.ledger.snapshot();
        let mut pending: Vec<Trade> = Vec::new();

        match self.apply_groups(groups, now, &mut pending) {
            Ok(outcomes) => {
                // Commit: release the buffered trades in production order.
                for trade in pending {
                    let _ = self.feed.send(trade);
                }
                Ok(outcomes)
            }
            Err(err) => {
                debug!(error = %err, "batch failed, restoring snapshots");
                self.book.restore(book_snapshot);
                self.ledger.restore(ledger_snapshot);
                Err(err)
            }
        }
    }

    fn apply_groups(
        &mut self,
        groups: Vec<BatchGroup>,
        now: i64,
        pending: &mut Vec<Trade>,
    ) -> Result<Vec<BatchOutcome>, ExchangeError> {
        let mut outcomes = Vec::new();
        for group in groups {
            let contract = ContractKey::new(group.delivery_start, group.delivery_end)?;
            if contract.delivery_end <= now {
                return Err(ExchangeError::TooLate);
            }
            if contract.delivery_start > now + BATCH_MAX_LEAD_DAYS * DAY_MS {
                return Err(ExchangeError::TooEarly);
            }
            let operations = group.operations.ok_or_else(|| {
                ExchangeError::InvalidInput("operations list is required".to_string())
            })?;

            for operation in operations {
                outcomes.push(self.apply_operation(contract, operation, now, pending)?);
            }
        }
        Ok(outcomes)
    }

    fn apply_operation(
        &mut self,
        contract: ContractKey,
        operation: BatchOperation,
        now: i64,
        pending: &mut Vec<Trade>,
    ) -> Result<BatchOutcome, ExchangeError> {
        let token = operation
            .token
            .ok_or_else(|| ExchangeError::InvalidInput("token is required".to_string()))?;
        let owner = self
            .identity
            .resolve_token(&token)
            .ok_or_else(|| ExchangeError::Unauthorized("unknown token".to_string()))?
            .to_string();

        match operation.kind.as_str() {
            "create" => {
                let side = operation
                    .side
                    .as_deref()
                    .and_then(Side::parse)
                    .ok_or_else(|| {
                        ExchangeError::InvalidInput("side must be BUY or SELL".to_string())
                    })?;
                let price = require_int(operation.price, "price")?;
                let quantity = require_int(operation.quantity, "quantity")?;

                let realized = self.ledger.balance(&owner);
                let limit = self.identity.collateral_limit(&owner);
                let mut sink = BufferedSink {
                    ledger: &mut self.ledger,
                    pending,
                };
                let submission = self.book.submit(
                    &owner, side, price, quantity, contract, now, realized, limit, &mut sink,
                )?;
                Ok(BatchOutcome::Created {
                    order_id: submission.order_id,
                    status: submission.status,
                })
            }
            "modify" => {
                let order_id = require_order_id(operation.order_id.as_deref())?;
                let price = require_int(operation.price, "price")?;
                let quantity = require_int(operation.quantity, "quantity")?;

                let realized = self.ledger.balance(&owner);
                let limit = self.identity.collateral_limit(&owner);
                let mut sink = BufferedSink {
                    ledger: &mut self.ledger,
                    pending,
                };
                let submission = self.book.modify(
                    &owner, order_id, price, quantity, now, realized, limit, &mut sink,
                )?;
                Ok(BatchOutcome::Modified {
                    order_id: submission.order_id,
                })
            }
            "cancel" => {
                let order_id = require_order_id(operation.order_id.as_deref())?;
                self.book.cancel(&owner, order_id)?;
                Ok(BatchOutcome::Cancelled)
            }
            other => Err(ExchangeError::InvalidInput(format!(
                "unknown operation type {other}"
            ))),
        }
    }
}

fn require_int(value: Option<i64>, name: &str) -> Result<i64, ExchangeError> {
    value.ok_or_else(|| ExchangeError::InvalidInput(format!("{name} must be an integer")))
}

fn require_order_id(value: Option<&str>) -> Result<OrderId, ExchangeError> {
    value
        .and_then(OrderId::parse)
        .ok_or_else(|| ExchangeError::InvalidInput("order_id must be a valid id".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::contract::DELIVERY_WINDOW_MS;

    const HOUR: i64 = DELIVERY_WINDOW_MS;

    fn contract() -> ContractKey {
        ContractKey::new(500_000 * HOUR, 500_001 * HOUR).unwrap()
    }

    fn now() -> i64 {
        contract().delivery_start - 10 * HOUR
    }

    fn create_op(token: &str, side: &str, price: i64, quantity: i64) -> BatchOperation {
        BatchOperation {
            kind: "create".to_string(),
            token: Some(token.to_string()),
            side: Some(side.to_string()),
            price: Some(price),
            quantity: Some(quantity),
            order_id: None,
        }
    }

    fn group(operations: Vec<BatchOperation>) -> BatchGroup {
        BatchGroup {
            delivery_start: contract().delivery_start,
            delivery_end: contract().delivery_end,
            operations: Some(operations),
        }
    }

    fn exchange_with_users() -> (Exchange, String, String) {
        let mut ex = Exchange::new();
        ex.identity.register("alice", "pw").unwrap();
        ex.identity.register("bob", "pw").unwrap();
        let alice = ex.identity.login("alice", "pw").unwrap();
        let bob = ex.identity.login("bob", "pw").unwrap();
        (ex, alice, bob)
    }

    #[test]
    fn test_batch_creates_and_matches() {
        let (mut ex, alice, bob) = exchange_with_users();
        let mut rx = ex.subscribe();

        let outcomes = ex
            .execute_batch(
                vec![group(vec![
                    create_op(&alice, "SELL", 150, 1000),
                    create_op(&bob, "BUY", 150, 1000),
                ])],
                now(),
            )
            .unwrap();

        assert_eq!(outcomes.len(), 2);
        assert!(matches!(
            outcomes[0],
            BatchOutcome::Created {
                status: OrderStatus::Active,
                ..
            }
        ));
        assert!(matches!(
            outcomes[1],
            BatchOutcome::Created {
                status: OrderStatus::Filled,
                ..
            }
        ));

        // Buffered trade flushed on commit.
        let trade = rx.try_recv().unwrap();
        assert_eq!(trade.quantity, 1000);
        assert_eq!(ex.ledger.len(), 1);
    }

    #[test]
    fn test_batch_rollback_on_bad_token() {
        let (mut ex, alice, _) = exchange_with_users();
        let mut rx = ex.subscribe();
        let book_before = ex.book.open_order_count();
        let ledger_before = ex.ledger.len();

        let modify = BatchOperation {
            kind: "modify".to_string(),
            token: Some("bogus-token".to_string()),
            side: None,
            price: Some(150),
            quantity: Some(10),
            order_id: Some(OrderId::new().to_string()),
        };
        let err = ex
            .execute_batch(
                vec![group(vec![create_op(&alice, "SELL", 150, 1000), modify])],
                now(),
            )
            .unwrap_err();

        assert!(matches!(err, ExchangeError::Unauthorized(_)));
        assert_eq!(ex.book.open_order_count(), book_before);
        assert_eq!(ex.ledger.len(), ledger_before);
        assert!(rx.try_recv().is_err(), "no trades escape a rolled-back batch");
    }

    #[test]
    fn test_batch_rollback_discards_executed_trades() {
        let (mut ex, alice, bob) = exchange_with_users();
        let mut rx = ex.subscribe();

        let err = ex
            .execute_batch(
                vec![group(vec![
                    create_op(&alice, "SELL", 150, 500),
                    create_op(&bob, "BUY", 150, 500),
                    create_op(&bob, "HOLD", 150, 1),
                ])],
                now(),
            )
            .unwrap_err();

        assert!(matches!(err, ExchangeError::InvalidInput(_)));
        assert_eq!(ex.ledger.len(), 0, "matched trade rolled back");
        assert_eq!(ex.book.open_order_count(), 0);
        assert!(rx.try_recv().is_err());
        assert_eq!(ex.balance_report("alice").balance, 0);
    }

    #[test]
    fn test_batch_unknown_operation_type() {
        let (mut ex, alice, _) = exchange_with_users();
        let op = BatchOperation {
            kind: "teleport".to_string(),
            token: Some(alice.clone()),
            side: None,
            price: None,
            quantity: None,
            order_id: None,
        };
        let err = ex.execute_batch(vec![group(vec![op])], now()).unwrap_err();
        assert!(matches!(err, ExchangeError::InvalidInput(_)));
    }

    #[test]
    fn test_batch_missing_operations_list() {
        let (mut ex, _, _) = exchange_with_users();
        let group = BatchGroup {
            delivery_start: contract().delivery_start,
            delivery_end: contract().delivery_end,
            operations: None,
        };
        let err = ex.execute_batch(vec![group], now()).unwrap_err();
        assert!(matches!(err, ExchangeError::InvalidInput(_)));
    }

    #[test]
    fn test_batch_contract_validation() {
        let (mut ex, alice, _) = exchange_with_users();

        // Delivery already over.
        let past = BatchGroup {
            delivery_start: contract().delivery_start,
            delivery_end: contract().delivery_end,
            operations: Some(vec![create_op(&alice, "SELL", 150, 1)]),
        };
        let err = ex
            .execute_batch(vec![past], contract().delivery_end + 1)
            .unwrap_err();
        assert_eq!(err, ExchangeError::TooLate);

        // Delivery more than thirty days out.
        let err = ex
            .execute_batch(
                vec![group(vec![create_op(&alice, "SELL", 150, 1)])],
                contract().delivery_start - 31 * DAY_MS,
            )
            .unwrap_err();
        assert_eq!(err, ExchangeError::TooEarly);

        // Malformed window.
        let bad = BatchGroup {
            delivery_start: 7,
            delivery_end: 8,
            operations: Some(vec![]),
        };
        let err = ex.execute_batch(vec![bad], now()).unwrap_err();
        assert!(matches!(err, ExchangeError::InvalidInput(_)));
    }

    #[test]
    fn test_batch_modify_and_cancel_flow() {
        let (mut ex, alice, bob) = exchange_with_users();

        let outcomes = ex
            .execute_batch(
                vec![group(vec![
                    create_op(&alice, "SELL", 150, 1000),
                    create_op(&alice, "SELL", 160, 500),
                ])],
                now(),
            )
            .unwrap();
        let (first, second) = match (&outcomes[0], &outcomes[1]) {
            (
                BatchOutcome::Created { order_id: a, .. },
                BatchOutcome::Created { order_id: b, .. },
            ) => (*a, *b),
            other => panic!("unexpected outcomes: {other:?}"),
        };

        let modify = BatchOperation {
            kind: "modify".to_string(),
            token: Some(alice.clone()),
            side: None,
            price: Some(155),
            quantity: Some(800),
            order_id: Some(first.to_string()),
        };
        let cancel = BatchOperation {
            kind: "cancel".to_string(),
            token: Some(alice.clone()),
            side: None,
            price: None,
            quantity: None,
            order_id: Some(second.to_string()),
        };
        let buy = create_op(&bob, "BUY", 155, 300);

        let outcomes = ex
            .execute_batch(vec![group(vec![modify, cancel, buy])], now() + 1)
            .unwrap();

        assert_eq!(outcomes[0], BatchOutcome::Modified { order_id: first });
        assert_eq!(outcomes[1], BatchOutcome::Cancelled);
        assert!(matches!(
            outcomes[2],
            BatchOutcome::Created {
                status: OrderStatus::Filled,
                ..
            }
        ));

        assert_eq!(ex.ledger.len(), 1);
        assert_eq!(ex.book.order(first).unwrap().remaining_quantity, 500);
        assert!(ex.book.order(second).is_none());
    }

    #[test]
    fn test_batch_tokens_resolved_per_operation() {
        let (mut ex, alice, bob) = exchange_with_users();

        // Bob cannot cancel alice's order even inside a batch.
        let outcomes = ex
            .execute_batch(
                vec![group(vec![create_op(&alice, "SELL", 150, 100)])],
                now(),
            )
            .unwrap();
        let BatchOutcome::Created { order_id, .. } = outcomes[0] else {
            panic!("expected create outcome");
        };

        let cancel = BatchOperation {
            kind: "cancel".to_string(),
            token: Some(bob.clone()),
            side: None,
            price: None,
            quantity: None,
            order_id: Some(order_id.to_string()),
        };
        let err = ex
            .execute_batch(vec![group(vec![cancel])], now() + 1)
            .unwrap_err();
        assert_eq!(err, ExchangeError::Forbidden);
        assert!(ex.book.order(order_id).is_some(), "order survives rollback");
    }
}
