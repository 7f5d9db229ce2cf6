//! Bulk-operations endpoint
//!
//! The body's structural shape (a `contracts` list of objects) is
//! enforced here; everything inside an operation object is carried
//! through raw so that a malformed operation deep in the batch fails
//! during execution and rolls back the operations before it.

use axum::{body::Bytes, extract::State, response::Response};
use engine::batch::{BatchGroup, BatchOperation, BatchOutcome};
use wire::{lookup, Field, Message, Value};

use crate::codec::{parse_body, respond};
use crate::error::ApiError;
use crate::state::{now_ms, AppState};

pub async fn bulk_operations(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let message = parse_body(&body)?;
    let groups = parse_groups(&message)?;

    let mut exchange = state.exchange.lock().await;
    let outcomes = exchange.execute_batch(groups, now_ms())?;
    state.persist(&exchange);

    Ok(respond(&Message::v2().with(
        "results",
        Value::List(outcomes.iter().map(outcome_object).collect()),
    )))
}

fn parse_groups(message: &Message) -> Result<Vec<BatchGroup>, ApiError> {
    let contracts = message
        .get_list("contracts")
        .ok_or_else(|| ApiError::invalid_input("contracts must be a list"))?;

    contracts
        .iter()
        .map(|entry| {
            let fields = entry
                .as_object()
                .ok_or_else(|| ApiError::invalid_input("each contract must be an object"))?;
            Ok(BatchGroup {
                delivery_start: int_field(fields, "delivery_start")?,
                delivery_end: int_field(fields, "delivery_end")?,
                operations: lookup(fields, "operations")
                    .and_then(Value::as_list)
                    .map(parse_operations)
                    .transpose()?,
            })
        })
        .collect()
}

fn parse_operations(entries: &[Value]) -> Result<Vec<BatchOperation>, ApiError> {
    entries
        .iter()
        .map(|entry| {
            let fields = entry
                .as_object()
                .ok_or_else(|| ApiError::invalid_input("each operation must be an object"))?;
            Ok(BatchOperation {
                kind: lookup(fields, "type")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                token: str_field(fields, "token"),
                side: str_field(fields, "side"),
                price: lookup(fields, "price").and_then(Value::as_int),
                quantity: lookup(fields, "quantity").and_then(Value::as_int),
                order_id: str_field(fields, "order_id"),
            })
        })
        .collect()
}

fn outcome_object(outcome: &BatchOutcome) -> Value {
    match outcome {
        BatchOutcome::Created { order_id, status } => Value::Object(vec![
            Field::new("type", Value::Str("create".to_string())),
            Field::new("order_id", Value::Str(order_id.to_string())),
            Field::new("status", Value::Str(status.as_str().to_string())),
        ]),
        BatchOutcome::Modified { order_id } => Value::Object(vec![
            Field::new("type", Value::Str("modify".to_string())),
            Field::new("order_id", Value::Str(order_id.to_string())),
        ]),
        BatchOutcome::Cancelled => Value::Object(vec![Field::new(
            "type",
            Value::Str("cancel".to_string()),
        )]),
    }
}

fn int_field(fields: &[Field], name: &str) -> Result<i64, ApiError> {
    lookup(fields, name)
        .and_then(Value::as_int)
        .ok_or_else(|| ApiError::invalid_input(format!("{name} must be an integer")))
}

fn str_field(fields: &[Field], name: &str) -> Option<String> {
    lookup(fields, name)
        .and_then(Value::as_str)
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wire::WireVersion;

    fn operation(kind: &str) -> Value {
        Value::Object(vec![
            Field::new("type", Value::Str(kind.to_string())),
            Field::new("token", Value::Str("tok".to_string())),
            Field::new("side", Value::Str("SELL".to_string())),
            Field::new("price", Value::Int(150)),
            Field::new("quantity", Value::Int(10)),
        ])
    }

    #[test]
    fn test_parse_groups_happy_path() {
        let message = Message::new(WireVersion::V2).with(
            "contracts",
            Value::List(vec![Value::Object(vec![
                Field::new("delivery_start", Value::Int(3_600_000)),
                Field::new("delivery_end", Value::Int(7_200_000)),
                Field::new("operations", Value::List(vec![operation("create")])),
            ])]),
        );

        let groups = parse_groups(&message).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].delivery_start, 3_600_000);
        let operations = groups[0].operations.as_ref().unwrap();
        assert_eq!(operations.len(), 1);
        assert_eq!(operations[0].kind, "create");
        assert_eq!(operations[0].token.as_deref(), Some("tok"));
        assert_eq!(operations[0].price, Some(150));
    }

    #[test]
    fn test_parse_groups_missing_operations_is_none() {
        let message = Message::new(WireVersion::V2).with(
            "contracts",
            Value::List(vec![Value::Object(vec![
                Field::new("delivery_start", Value::Int(3_600_000)),
                Field::new("delivery_end", Value::Int(7_200_000)),
            ])]),
        );

        let groups = parse_groups(&message).unwrap();
        assert!(groups[0].operations.is_none(), "executor reports the failure");
    }

    #[test]
    fn test_parse_groups_rejects_non_list_contracts() {
        let message = Message::new(WireVersion::V2).with("contracts", Value::Int(1));
        assert!(parse_groups(&message).is_err());

        let message = Message::new(WireVersion::V2);
        assert!(parse_groups(&message).is_err());
    }

    #[test]
    fn test_unknown_operation_kind_is_carried_through() {
        let message = Message::new(WireVersion::V2).with(
            "contracts",
            Value::List(vec![Value::Object(vec![
                Field::new("delivery_start", Value::Int(3_600_000)),
                Field::new("delivery_end", Value::Int(7_200_000)),
                Field::new("operations", Value::List(vec![operation("teleport")])),
            ])]),
        );

        let groups = parse_groups(&message).unwrap();
        assert_eq!(
            groups[0].operations.as_ref().unwrap()[0].kind,
            "teleport",
            "validation happens in the executor, inside the snapshot scope"
        );
    }
}
