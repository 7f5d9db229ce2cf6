mod auth;
mod codec;
mod error;
mod handlers;
mod persist;
mod router;
mod state;

use engine::exchange::Exchange;
use persist::Persister;
use router::create_router;
use state::AppState;
use std::net::SocketAddr;
use tokio::net::TcpListener;

/// Admin bearer token used when the environment does not override it.
const DEFAULT_ADMIN_TOKEN: &str = "grid-operator-master-key";

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt::init();

    tracing::info!("Starting exchange gateway");

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);
    let admin_token =
        std::env::var("ADMIN_TOKEN").unwrap_or_else(|_| DEFAULT_ADMIN_TOKEN.to_string());
    let persister = std::env::var("PERSISTENT_DIR").ok().map(Persister::new);

    let exchange = match persister.as_ref().map(Persister::load) {
        Some(Ok(Some(persisted))) => {
            tracing::info!("Restored exchange state from persistent dir");
            Exchange::from_persisted(persisted)
        }
        Some(Err(err)) => {
            tracing::warn!(error = %err, "Ignoring unreadable state file, starting empty");
            Exchange::new()
        }
        _ => Exchange::new(),
    };

    let state = AppState::new(exchange, admin_token, persister);
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;

    tracing::info!("Listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
