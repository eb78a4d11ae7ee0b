//! WebSocket push channel.
//!
//! Every connected client gets the current snapshot on connect and an
//! `update_scores` frame after each committed mutation. Judges and audience
//! members can also submit score batches over the socket, mirroring the
//! dashboard POST path with lower latency. Malformed payloads produce an
//! `error` frame and never tear down the loop.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::IntoResponse,
};
use futures::{sink::SinkExt, stream::StreamExt};
use serde::Deserialize;
use std::sync::Arc;

use crate::broadcast::broadcast_snapshot;
use crate::protocol::{ClientMessage, ServerMessage};
use crate::state::{AppState, ApplyError};
use crate::types::{IdeaId, Identity};

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    /// Session token; absent for anonymous result viewers.
    pub token: Option<String>,
}

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsQuery>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    // Resolve the identity once, before the upgrade; the socket loop then
    // carries it as an explicit value.
    let identity = match &params.token {
        Some(token) => state.identity_for_token(token).await,
        None => None,
    };

    tracing::info!(
        "WebSocket connection request: identity={:?}",
        identity.as_ref().map(|i| i.email.as_str())
    );

    ws.on_upgrade(move |socket| handle_socket(socket, identity, state))
}

/// Handle an individual WebSocket connection
async fn handle_socket(socket: WebSocket, identity: Option<Identity>, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    // Full-state fetch on connect: a viewer joining between mutations still
    // starts from the current snapshot.
    let welcome = ServerMessage::Welcome {
        role: identity.as_ref().map(|i| i.role),
        snapshot: state.snapshot().await,
        server_now: chrono::Utc::now().to_rfc3339(),
    };
    if let Ok(msg) = serde_json::to_string(&welcome) {
        if sender.send(Message::Text(msg.into())).await.is_err() {
            tracing::error!("Failed to send welcome message");
            return;
        }
    }

    let mut broadcast_rx = state.broadcast.subscribe();

    loop {
        tokio::select! {
            // Snapshot pushes to every client
            broadcast_msg = broadcast_rx.recv() => {
                if let Ok(msg) = broadcast_msg {
                    if let Ok(json) = serde_json::to_string(&msg) {
                        if sender.send(Message::Text(json.into())).await.is_err() {
                            break;
                        }
                    }
                }
            }

            // Client frames
            ws_msg = receiver.next() => {
                match ws_msg {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(client_msg) => {
                                if let Some(response) =
                                    handle_message(client_msg, identity.as_ref(), &state).await
                                {
                                    if let Ok(json) = serde_json::to_string(&response) {
                                        if sender.send(Message::Text(json.into())).await.is_err() {
                                            break;
                                        }
                                    }
                                }
                            }
                            Err(e) => {
                                tracing::error!("Failed to parse client message: {}", e);
                                let error = ServerMessage::Error {
                                    code: "PARSE_ERROR".to_string(),
                                    msg: format!("Invalid message format: {}", e),
                                };
                                if let Ok(json) = serde_json::to_string(&error) {
                                    let _ = sender.send(Message::Text(json.into())).await;
                                }
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        tracing::info!("WebSocket closed");
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::error!("WebSocket error: {}", e);
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    tracing::info!("WebSocket connection closed");
}

/// Handle client messages and return an optional direct response.
pub async fn handle_message(
    msg: ClientMessage,
    identity: Option<&Identity>,
    state: &Arc<AppState>,
) -> Option<ServerMessage> {
    match msg {
        ClientMessage::SubmitScores { scores } => {
            let Some(identity) = identity else {
                return Some(ServerMessage::Error {
                    code: "UNAUTHORIZED".to_string(),
                    msg: "Log in before submitting scores".to_string(),
                });
            };

            // JSON object keys arrive as strings; malformed ids are dropped
            // rather than failing the frame
            let deltas: std::collections::HashMap<IdeaId, u32> = scores
                .iter()
                .filter_map(|(key, delta)| Some((key.parse().ok()?, *delta)))
                .collect();

            match state.apply_scores(identity.role, &deltas).await {
                Ok(applied) => {
                    tracing::info!(
                        "{} applied {} score deltas via ws",
                        identity.email,
                        applied
                    );
                    broadcast_snapshot(state).await;
                    Some(ServerMessage::ScoresAck { applied })
                }
                Err(ApplyError::NonScoringRole(role)) => Some(ServerMessage::Error {
                    code: "UNAUTHORIZED".to_string(),
                    msg: format!("Role {} cannot submit scores", role.as_str()),
                }),
            }
        }
    }
}
