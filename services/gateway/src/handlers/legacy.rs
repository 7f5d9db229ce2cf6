//! Legacy sell-only order surface
//!
//! Flat offer list with manual take; none of this touches the matching
//! engine or the trade stream.

use axum::{
    body::Bytes,
    extract::{Path, State},
    response::Response,
};
use engine::legacy::LegacyOffer;
use types::ids::OrderId;
use wire::{Field, Message, Value};

use crate::auth::Bearer;
use crate::codec::{contract_key, parse_body, require_int, respond, trade_object};
use crate::error::ApiError;
use crate::state::{now_ms, AppState};

pub async fn list_offer(
    State(state): State<AppState>,
    bearer: Bearer,
    body: Bytes,
) -> Result<Response, ApiError> {
    let message = parse_body(&body)?;
    let price = require_int(&message, "price")?;
    let quantity = require_int(&message, "quantity")?;
    let contract = contract_key(
        require_int(&message, "delivery_start")?,
        require_int(&message, "delivery_end")?,
    )?;

    let mut exchange = state.exchange.lock().await;
    let owner = exchange
        .identity
        .resolve_token(&bearer.0)
        .ok_or_else(|| ApiError::unauthorized("unknown token"))?
        .to_string();
    let offer_id = exchange.list_legacy_offer(&owner, price, quantity, contract, now_ms())?;
    state.persist(&exchange);

    Ok(respond(
        &Message::v2().with("offer_id", Value::Str(offer_id.to_string())),
    ))
}

pub async fn offers(State(state): State<AppState>) -> Result<Response, ApiError> {
    let exchange = state.exchange.lock().await;
    let offers = exchange.legacy.offers();

    Ok(respond(&Message::v2().with(
        "offers",
        Value::List(offers.iter().map(offer_object).collect()),
    )))
}

pub async fn take_offer(
    State(state): State<AppState>,
    Path(offer_id): Path<String>,
    bearer: Bearer,
    body: Bytes,
) -> Result<Response, ApiError> {
    let offer_id = OrderId::parse(&offer_id)
        .ok_or_else(|| ApiError::invalid_input("offer id must be a valid id"))?;
    let message = parse_body(&body)?;
    let quantity = require_int(&message, "quantity")?;

    let mut exchange = state.exchange.lock().await;
    let buyer = exchange
        .identity
        .resolve_token(&bearer.0)
        .ok_or_else(|| ApiError::unauthorized("unknown token"))?
        .to_string();
    let trade = exchange.take_legacy_offer(&buyer, offer_id, quantity, now_ms())?;
    state.persist(&exchange);

    Ok(respond(&Message::v2().with("trade", trade_object(&trade))))
}

fn offer_object(offer: &LegacyOffer) -> Value {
    Value::Object(vec![
        Field::new("offer_id", Value::Str(offer.offer_id.to_string())),
        Field::new("seller", Value::Str(offer.owner.clone())),
        Field::new("price", Value::Int(offer.price)),
        Field::new("quantity", Value::Int(offer.quantity)),
        Field::new("delivery_start", Value::Int(offer.contract.delivery_start)),
        Field::new("delivery_end", Value::Int(offer.contract.delivery_end)),
        Field::new("timestamp", Value::Int(offer.listed_at)),
    ])
}
