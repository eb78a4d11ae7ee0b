use crate::types::{Role, Snapshot};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Mirror of the dashboard POST path for lower-latency submission.
    /// Deltas keyed by stringified idea id (JSON object keys); malformed
    /// keys are dropped and unknown ids skipped server-side.
    SubmitScores { scores: HashMap<String, u32> },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Sent once on connect: who you are plus the current state, so a
    /// late-joining viewer doesn't have to wait for the next mutation.
    /// `role` is absent for anonymous result viewers.
    Welcome {
        role: Option<Role>,
        snapshot: Snapshot,
        server_now: String,
    },
    /// Fanned out to every connected client after each committed mutation.
    UpdateScores { snapshot: Snapshot },
    /// Ack for a submit_scores frame; `applied` counts known idea ids.
    ScoresAck { applied: usize },
    Error { code: String, msg: String },
}
