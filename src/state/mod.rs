mod idea;
mod session;
mod user;

pub use idea::ApplyError;

use crate::config::AppConfig;
use crate::otp::OtpStore;
use crate::protocol::ServerMessage;
use crate::types::*;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

/// Shared application state
///
/// Ideas live in a `Vec` so the catalog keeps its insertion order - leader
/// tie-breaks depend on it.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub users: Arc<RwLock<HashMap<String, User>>>,
    pub ideas: Arc<RwLock<Vec<Idea>>>,
    pub sessions: Arc<RwLock<HashMap<SessionToken, Identity>>>,
    pub otp: Arc<OtpStore>,
    /// Broadcast channel for pushing snapshots to all connected viewers
    pub broadcast: broadcast::Sender<ServerMessage>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let (tx, _rx) = broadcast::channel(100);
        Self {
            config,
            users: Arc::new(RwLock::new(HashMap::new())),
            ideas: Arc::new(RwLock::new(Vec::new())),
            sessions: Arc::new(RwLock::new(HashMap::new())),
            otp: Arc::new(OtpStore::new()),
            broadcast: tx,
        }
    }

    /// Load pre-provisioned users and the idea catalog from config.
    pub async fn seed_from_config(&self) {
        let users = self.config.seed_users();
        let ideas = self.config.seed_ideas();
        tracing::info!(
            "Seeding {} users and {} ideas from config",
            users.len(),
            ideas.len()
        );

        let mut user_map = self.users.write().await;
        for user in users {
            user_map.insert(user.email.clone(), user);
        }

        *self.ideas.write().await = ideas;
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}
