//! Account endpoints: registration, login, password change, balance,
//! and the admin-gated collateral update.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::Response,
};
use engine::identity::CollateralLimit;

use crate::auth::Bearer;
use crate::codec::{parse_body, require_int, require_str, respond};
use crate::error::ApiError;
use crate::state::AppState;
use wire::{Message, Value};

pub async fn register(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let message = parse_body(&body)?;
    let username = require_str(&message, "username")?;
    let password = require_str(&message, "password")?;

    let mut exchange = state.exchange.lock().await;
    exchange.identity.register(username, password)?;
    state.persist(&exchange);
    Ok(StatusCode::NO_CONTENT)
}

pub async fn login(State(state): State<AppState>, body: Bytes) -> Result<Response, ApiError> {
    let message = parse_body(&body)?;
    let username = require_str(&message, "username")?;
    let password = require_str(&message, "password")?;

    let mut exchange = state.exchange.lock().await;
    let token = exchange.identity.login(username, password)?;
    state.persist(&exchange);

    Ok(respond(
        &Message::v2().with("token", Value::Str(token)),
    ))
}

pub async fn change_password(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let message = parse_body(&body)?;
    let username = require_str(&message, "username")?;
    let old_password = require_str(&message, "old_password")?;
    let new_password = require_str(&message, "new_password")?;

    let mut exchange = state.exchange.lock().await;
    exchange
        .identity
        .change_password(username, old_password, new_password)?;
    state.persist(&exchange);
    Ok(StatusCode::NO_CONTENT)
}

pub async fn set_collateral(
    State(state): State<AppState>,
    Path(username): Path<String>,
    bearer: Bearer,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    if bearer.0 != state.admin_token {
        return Err(ApiError::unauthorized("admin token required"));
    }

    let message = parse_body(&body)?;
    let raw = require_int(&message, "collateral")?;
    let limit = match raw {
        -1 => CollateralLimit::Unlimited,
        c if c >= 0 => CollateralLimit::Limit(c),
        _ => {
            return Err(ApiError::invalid_input(
                "collateral must be non-negative or -1 for unlimited",
            ))
        }
    };

    let mut exchange = state.exchange.lock().await;
    exchange.identity.set_collateral(&username, limit)?;
    state.persist(&exchange);
    Ok(StatusCode::NO_CONTENT)
}

pub async fn balance(
    State(state): State<AppState>,
    bearer: Bearer,
) -> Result<Response, ApiError> {
    let exchange = state.exchange.lock().await;
    let username = exchange
        .identity
        .resolve_token(&bearer.0)
        .ok_or_else(|| ApiError::unauthorized("unknown token"))?
        .to_string();

    let report = exchange.balance_report(&username);
    Ok(respond(
        &Message::v2()
            .with("balance", Value::Int(report.balance))
            .with("potential_balance", Value::Int(report.potential_balance))
            .with("collateral", Value::Int(report.collateral.wire_value())),
    ))
}
