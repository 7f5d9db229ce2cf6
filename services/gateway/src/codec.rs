//! Domain to wire-format mapping
//!
//! All request and response bodies are framed messages; responses go out
//! as version 2, inbound frames may be either version. Field names here
//! are wire contracts.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use engine::book::Submission;
use types::contract::ContractKey;
use types::errors::ExchangeError;
use types::order::Order;
use types::trade::Trade;
use wire::{decode, encode, Field, Message, Value, WireError};

use crate::error::ApiError;

pub const CONTENT_TYPE: &str = "application/x-galacticbuf";

/// Decode a request body; protocol failures become 400 at the boundary.
pub fn parse_body(bytes: &[u8]) -> Result<Message, ApiError> {
    decode(bytes).map_err(|err| ApiError(ExchangeError::InvalidInput(err.to_string())))
}

/// Encode a framed 200 response.
pub fn respond(message: &Message) -> Response {
    match encode(message) {
        Ok(bytes) => ([(header::CONTENT_TYPE, CONTENT_TYPE)], bytes).into_response(),
        Err(err) => {
            tracing::error!(error = %err, "failed to encode response body");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub fn require_str<'a>(message: &'a Message, name: &str) -> Result<&'a str, ApiError> {
    message
        .get_str(name)
        .ok_or_else(|| ApiError::invalid_input(format!("{name} must be a string")))
}

pub fn require_int(message: &Message, name: &str) -> Result<i64, ApiError> {
    message
        .get_int(name)
        .ok_or_else(|| ApiError::invalid_input(format!("{name} must be an integer")))
}

/// Wire object for one open order.
pub fn order_object(order: &Order) -> Value {
    Value::Object(vec![
        Field::new("order_id", Value::Str(order.order_id.to_string())),
        Field::new("side", Value::Str(order.side.as_str().to_string())),
        Field::new("price", Value::Int(order.price)),
        Field::new("quantity", Value::Int(order.remaining_quantity)),
        Field::new("original_quantity", Value::Int(order.original_quantity)),
        Field::new("delivery_start", Value::Int(order.contract.delivery_start)),
        Field::new("delivery_end", Value::Int(order.contract.delivery_end)),
        Field::new("timestamp", Value::Int(order.priority_timestamp)),
    ])
}

fn trade_fields(trade: &Trade) -> Vec<Field> {
    vec![
        Field::new("trade_id", Value::Str(trade.trade_id.to_string())),
        Field::new("buyer", Value::Str(trade.buyer.clone())),
        Field::new("seller", Value::Str(trade.seller.clone())),
        Field::new("price", Value::Int(trade.price)),
        Field::new("quantity", Value::Int(trade.quantity)),
        Field::new("delivery_start", Value::Int(trade.contract.delivery_start)),
        Field::new("delivery_end", Value::Int(trade.contract.delivery_end)),
        Field::new("timestamp", Value::Int(trade.timestamp)),
    ]
}

/// Wire object for one executed trade.
pub fn trade_object(trade: &Trade) -> Value {
    Value::Object(trade_fields(trade))
}

/// One standalone framed message per trade, pushed as a single
/// WebSocket frame with no extra delimiter.
pub fn trade_frame(trade: &Trade) -> Result<Vec<u8>, WireError> {
    encode(&Message {
        version: wire::WireVersion::V2,
        fields: trade_fields(trade),
    })
}

/// `{order_id, status, filled_quantity}` submission response.
pub fn submission_message(submission: &Submission) -> Message {
    Message::v2()
        .with("order_id", Value::Str(submission.order_id.to_string()))
        .with(
            "status",
            Value::Str(submission.status.as_str().to_string()),
        )
        .with("filled_quantity", Value::Int(submission.filled_quantity))
}

/// Validate a delivery window taken from query or body fields.
pub fn contract_key(delivery_start: i64, delivery_end: i64) -> Result<ContractKey, ApiError> {
    ContractKey::new(delivery_start, delivery_end).map_err(ApiError)
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::contract::DELIVERY_WINDOW_MS;
    use types::ids::TradeId;
    use types::order::Side;

    fn contract() -> ContractKey {
        ContractKey::new(100 * DELIVERY_WINDOW_MS, 101 * DELIVERY_WINDOW_MS).unwrap()
    }

    #[test]
    fn test_order_object_fields() {
        let order = Order::new("alice", Side::SELL, 150, 500, contract(), 42);
        let object = order_object(&order);
        let fields = object.as_object().unwrap();

        assert_eq!(
            wire::lookup(fields, "side"),
            Some(&Value::Str("SELL".to_string()))
        );
        assert_eq!(wire::lookup(fields, "price"), Some(&Value::Int(150)));
        assert_eq!(wire::lookup(fields, "quantity"), Some(&Value::Int(500)));
        assert_eq!(
            wire::lookup(fields, "delivery_start"),
            Some(&Value::Int(contract().delivery_start))
        );
    }

    #[test]
    fn test_trade_frame_roundtrips() {
        let trade = Trade {
            trade_id: TradeId::new(),
            buyer: "bob".to_string(),
            seller: "alice".to_string(),
            price: -40,
            quantity: 10,
            contract: contract(),
            timestamp: 99,
            is_v2: true,
        };
        let frame = trade_frame(&trade).unwrap();
        let decoded = decode(&frame).unwrap();

        assert_eq!(decoded.get_str("buyer"), Some("bob"));
        assert_eq!(decoded.get_str("seller"), Some("alice"));
        assert_eq!(decoded.get_int("price"), Some(-40));
        assert_eq!(decoded.get_int("quantity"), Some(10));
        assert_eq!(decoded.get_int("timestamp"), Some(99));
        assert_eq!(
            decoded.get_str("trade_id"),
            Some(trade.trade_id.to_string().as_str())
        );
    }

    #[test]
    fn test_parse_body_rejects_garbage() {
        assert!(parse_body(&[0xde, 0xad, 0xbe, 0xef]).is_err());
        assert!(parse_body(&[]).is_err());
    }

    #[test]
    fn test_contract_key_validation() {
        assert!(contract_key(100 * DELIVERY_WINDOW_MS, 101 * DELIVERY_WINDOW_MS).is_ok());
        assert!(contract_key(1, 2).is_err());
    }
}
