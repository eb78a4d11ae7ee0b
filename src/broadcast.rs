use crate::protocol::ServerMessage;
use crate::state::AppState;

/// Push the current snapshot to every connected viewer.
///
/// Called after each committed score mutation. Best-effort fan-out: no
/// acknowledgment, no replay buffer - a viewer connecting later gets the
/// full state in its welcome frame instead.
pub async fn broadcast_snapshot(state: &AppState) {
    let snapshot = state.snapshot().await;
    let receivers = state.broadcast.receiver_count();

    // Ignore send errors (no receivers connected is fine)
    let _ = state.broadcast.send(ServerMessage::UpdateScores { snapshot });

    tracing::debug!("Broadcast snapshot to {} receivers", receivers);
}
