//! Live trade stream over WebSocket
//!
//! Unidirectional push: every matching-engine trade goes out as one
//! framed binary message per WebSocket frame. Consumers that error or
//! fall behind the broadcast channel are dropped; failures never touch
//! the request that produced the trade.

use axum::{
    extract::{
        ws::{Message as WsMessage, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{sink::SinkExt, stream::StreamExt};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::codec::trade_frame;
use crate::state::AppState;

pub async fn trade_stream(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    debug!("trade stream consumer attached");

    let mut feed = state.exchange.lock().await.subscribe();
    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            incoming = receiver.next() => {
                match incoming {
                    Some(Ok(WsMessage::Close(_))) | Some(Err(_)) | None => break,
                    // The stream is push-only; anything else is ignored.
                    Some(Ok(_)) => {}
                }
            }
            trade = feed.recv() => {
                match trade {
                    Ok(trade) => {
                        let frame = match trade_frame(&trade) {
                            Ok(frame) => frame,
                            Err(err) => {
                                warn!(error = %err, "failed to encode stream trade");
                                continue;
                            }
                        };
                        if sender.send(WsMessage::Binary(frame.into())).await.is_err() {
                            warn!("dropping unwritable trade stream consumer");
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "dropping lagged trade stream consumer");
                        break;
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }
    }

    debug!("trade stream consumer detached");
}
