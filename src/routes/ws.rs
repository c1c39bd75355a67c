// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Push-connection endpoint.
//!
//! Each upgraded socket gets a [`Session`]; a writer task drains the
//! session's outbox into the socket while the reader loop feeds client
//! frames back to the session.

use crate::models::PushMessage;
use crate::session::Session;
use crate::AppState;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
    routing::get,
    Router,
};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::Instrument;

/// WebSocket routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/ws", get(ws_upgrade))
}

/// GET /ws
async fn ws_upgrade(State(state): State<Arc<AppState>>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| run_connection(socket, state))
}

/// Drive one connection until the client leaves or the server shuts down.
pub async fn run_connection(socket: WebSocket, state: Arc<AppState>) {
    let id = state.registry.next_id();
    let span = tracing::info_span!("connection", connection_id = id);

    async move {
        let (ws_sender, mut ws_receiver) = socket.split();
        let (tx, rx) = mpsc::unbounded_channel::<PushMessage>();

        let session = Arc::new(Session::connect(id, state.session_deps.clone(), tx));
        state.registry.register(session.clone());

        let mut writer = tokio::spawn(writer_task(ws_sender, rx).in_current_span());

        loop {
            tokio::select! {
                incoming = ws_receiver.next() => match incoming {
                    Some(Ok(Message::Text(text))) => {
                        // Malformed frames are logged by the session and ignored.
                        let _ = session.on_message(text.as_str());
                    }
                    Some(Ok(Message::Close(frame))) => {
                        tracing::info!(reason = ?frame, "Client initiated close");
                        break;
                    }
                    // Pings are answered by the protocol layer.
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "WebSocket receive error");
                        break;
                    }
                    None => {
                        tracing::info!("WebSocket stream ended");
                        break;
                    }
                },
                _ = &mut writer => {
                    tracing::debug!("Writer stopped, closing connection");
                    break;
                }
                () = state.shutdown.cancelled() => {
                    tracing::debug!("Server shutting down, closing connection");
                    break;
                }
            }
        }

        // Close before stopping the writer so nothing is queued afterwards.
        state.registry.close(id);
        writer.abort();
    }
    .instrument(span)
    .await
}

/// Forward queued messages to the socket as JSON text frames.
async fn writer_task(
    mut ws_sender: SplitSink<WebSocket, Message>,
    mut rx: mpsc::UnboundedReceiver<PushMessage>,
) {
    while let Some(message) = rx.recv().await {
        let json = match message.to_json() {
            Ok(json) => json,
            Err(e) => {
                tracing::error!(error = %e, channel = message.channel(), "Failed to serialize message");
                continue;
            }
        };

        if let Err(e) = ws_sender.send(Message::Text(json.into())).await {
            tracing::debug!(error = %e, "WebSocket send failed");
            break;
        }
    }
}
