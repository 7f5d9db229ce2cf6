use crate::persist::Persister;
use engine::exchange::Exchange;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;

/// Shared gateway state.
///
/// The whole exchange core sits behind one async mutex: a handler takes
/// the lock, performs its full dispatch, and only then yields, so no two
/// requests ever interleave their mutations.
#[derive(Clone)]
pub struct AppState {
    pub exchange: Arc<Mutex<Exchange>>,
    pub admin_token: String,
    persister: Option<Arc<Persister>>,
}

impl AppState {
    pub fn new(exchange: Exchange, admin_token: String, persister: Option<Persister>) -> Self {
        Self {
            exchange: Arc::new(Mutex::new(exchange)),
            admin_token,
            persister: persister.map(Arc::new),
        }
    }

    /// Best-effort state snapshot after a successful mutation. Failures
    /// are logged and never surface to the originating request.
    pub fn persist(&self, exchange: &Exchange) {
        if let Some(persister) = &self.persister {
            if let Err(err) = persister.write(&exchange.to_persisted()) {
                tracing::warn!(error = %err, "failed to persist exchange state");
            }
        }
    }
}

/// Current wall clock in Unix milliseconds.
pub fn now_ms() -> i64 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    i64::try_from(now.as_millis()).unwrap_or(i64::MAX)
}
