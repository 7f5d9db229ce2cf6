use crate::handlers::{account, bulk, legacy, orders, stream};
use crate::state::AppState;
use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/register", post(account::register))
        .route("/login", post(account::login))
        .route("/user/password", put(account::change_password))
        .route("/collateral/{username}", put(account::set_collateral))
        .route("/balance", get(account::balance))
        .route("/orders", post(legacy::list_offer).get(legacy::offers))
        .route("/orders/{offer_id}/take", post(legacy::take_offer))
        .route(
            "/v2/orders",
            get(orders::get_book).post(orders::create_order),
        )
        .route(
            "/v2/orders/{order_id}",
            put(orders::modify_order).delete(orders::cancel_order),
        )
        .route("/v2/my-orders", get(orders::my_orders))
        .route("/v2/trades", get(orders::trades))
        .route("/v2/my-trades", get(orders::my_trades))
        .route("/v2/bulk-operations", post(bulk::bulk_operations))
        .route("/v2/stream/trades", get(stream::trade_stream))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}
