//! Matching-engine order endpoints and trade queries.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Response,
};
use serde::Deserialize;
use types::contract::ContractKey;
use types::ids::OrderId;
use types::order::Side;
use wire::{Message, Value};

use crate::auth::Bearer;
use crate::codec::{
    contract_key, order_object, parse_body, require_int, require_str, respond, trade_object,
};
use crate::error::ApiError;
use crate::state::{now_ms, AppState};

/// Delivery window taken from query parameters.
#[derive(Debug, Deserialize)]
pub struct WindowQuery {
    delivery_start: Option<i64>,
    delivery_end: Option<i64>,
}

impl WindowQuery {
    /// Both endpoints present and valid.
    fn require(&self) -> Result<ContractKey, ApiError> {
        match (self.delivery_start, self.delivery_end) {
            (Some(start), Some(end)) => contract_key(start, end),
            _ => Err(ApiError::invalid_input(
                "delivery_start and delivery_end are required",
            )),
        }
    }

    /// Optional filter; a half-specified window is malformed.
    fn optional(&self) -> Result<Option<ContractKey>, ApiError> {
        match (self.delivery_start, self.delivery_end) {
            (None, None) => Ok(None),
            (Some(start), Some(end)) => contract_key(start, end).map(Some),
            _ => Err(ApiError::invalid_input(
                "delivery_start and delivery_end must be given together",
            )),
        }
    }
}

pub async fn get_book(
    State(state): State<AppState>,
    Query(window): Query<WindowQuery>,
) -> Result<Response, ApiError> {
    let contract = window.require()?;

    let exchange = state.exchange.lock().await;
    let (bids, asks) = exchange.book.book(contract, now_ms());

    Ok(respond(
        &Message::v2()
            .with(
                "bids",
                Value::List(bids.iter().map(order_object).collect()),
            )
            .with(
                "asks",
                Value::List(asks.iter().map(order_object).collect()),
            ),
    ))
}

pub async fn create_order(
    State(state): State<AppState>,
    bearer: Bearer,
    body: Bytes,
) -> Result<Response, ApiError> {
    let message = parse_body(&body)?;
    let side = Side::parse(require_str(&message, "side")?)
        .ok_or_else(|| ApiError::invalid_input("side must be BUY or SELL"))?;
    let price = require_int(&message, "price")?;
    let quantity = require_int(&message, "quantity")?;
    let contract = contract_key(
        require_int(&message, "delivery_start")?,
        require_int(&message, "delivery_end")?,
    )?;

    let mut exchange = state.exchange.lock().await;
    let owner = resolve(&exchange, &bearer)?;
    let submission = exchange.place_order(&owner, side, price, quantity, contract, now_ms())?;
    state.persist(&exchange);

    Ok(respond(&crate::codec::submission_message(&submission)))
}

pub async fn modify_order(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
    bearer: Bearer,
    body: Bytes,
) -> Result<Response, ApiError> {
    let order_id = parse_order_id(&order_id)?;
    let message = parse_body(&body)?;
    let price = require_int(&message, "price")?;
    let quantity = require_int(&message, "quantity")?;

    let mut exchange = state.exchange.lock().await;
    let owner = resolve(&exchange, &bearer)?;
    let submission = exchange.modify_order(&owner, order_id, price, quantity, now_ms())?;
    state.persist(&exchange);

    Ok(respond(&crate::codec::submission_message(&submission)))
}

pub async fn cancel_order(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
    bearer: Bearer,
) -> Result<StatusCode, ApiError> {
    let order_id = parse_order_id(&order_id)?;

    let mut exchange = state.exchange.lock().await;
    let owner = resolve(&exchange, &bearer)?;
    exchange.cancel_order(&owner, order_id)?;
    state.persist(&exchange);
    Ok(StatusCode::NO_CONTENT)
}

pub async fn my_orders(
    State(state): State<AppState>,
    bearer: Bearer,
) -> Result<Response, ApiError> {
    let exchange = state.exchange.lock().await;
    let owner = resolve(&exchange, &bearer)?;
    let orders = exchange.book.my_active(&owner);

    Ok(respond(&Message::v2().with(
        "orders",
        Value::List(orders.iter().map(order_object).collect()),
    )))
}

pub async fn trades(
    State(state): State<AppState>,
    Query(window): Query<WindowQuery>,
) -> Result<Response, ApiError> {
    let filter = window.optional()?;

    let exchange = state.exchange.lock().await;
    let trades = exchange.trades(filter);

    Ok(respond(&Message::v2().with(
        "trades",
        Value::List(trades.iter().map(trade_object).collect()),
    )))
}

pub async fn my_trades(
    State(state): State<AppState>,
    Query(window): Query<WindowQuery>,
    bearer: Bearer,
) -> Result<Response, ApiError> {
    let filter = window.optional()?;

    let exchange = state.exchange.lock().await;
    let owner = resolve(&exchange, &bearer)?;
    let trades = exchange.my_trades(&owner, filter);

    Ok(respond(&Message::v2().with(
        "trades",
        Value::List(trades.iter().map(trade_object).collect()),
    )))
}

fn resolve(exchange: &engine::exchange::Exchange, bearer: &Bearer) -> Result<String, ApiError> {
    exchange
        .identity
        .resolve_token(&bearer.0)
        .map(str::to_string)
        .ok_or_else(|| ApiError::unauthorized("unknown token"))
}

fn parse_order_id(raw: &str) -> Result<OrderId, ApiError> {
    OrderId::parse(raw).ok_or_else(|| ApiError::invalid_input("order id must be a valid id"))
}
