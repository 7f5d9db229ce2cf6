//! Exposure and potential-balance calculations
//!
//! All products are widened to `i128` before summation; a pathological
//! `price * quantity` must never wrap silently.

use types::order::{Order, Side};

use crate::identity::CollateralLimit;

/// Signed exposure of one open order.
///
/// With `v = price * remaining_quantity`, a sell contributes `+v` and a
/// buy contributes `-v`; `v` itself may be negative.
pub fn signed_exposure(order: &Order) -> i128 {
    let v = order.price as i128 * order.remaining_quantity as i128;
    match order.side {
        Side::SELL => v,
        Side::BUY => -v,
    }
}

/// Signed exposure from raw terms, used when probing a hypothetical
/// order that does not exist yet.
pub fn signed_exposure_of(side: Side, price: i64, quantity: i64) -> i128 {
    let v = price as i128 * quantity as i128;
    match side {
        Side::SELL => v,
        Side::BUY => -v,
    }
}

/// Potential balance: realized cash plus signed exposure across the
/// user's open orders.
pub fn potential_balance<'a>(
    realized: i128,
    open_orders: impl Iterator<Item = &'a Order>,
) -> i128 {
    realized + open_orders.map(signed_exposure).sum::<i128>()
}

/// Admission rule: the potential balance must not drop below the
/// negated collateral limit. Unlimited collateral admits everything.
pub fn admissible(potential: i128, limit: CollateralLimit) -> bool {
    match limit {
        CollateralLimit::Unlimited => true,
        CollateralLimit::Limit(c) => potential >= -(c as i128),
    }
}
