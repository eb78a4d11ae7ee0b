use super::AppState;
use crate::types::{Identity, Role, SessionToken};

impl AppState {
    /// Bind a fresh session token to an authenticated (email, role) pair.
    pub async fn create_session(&self, email: &str, role: Role) -> SessionToken {
        let token = ulid::Ulid::new().to_string();
        let identity = Identity {
            email: email.to_string(),
            role,
        };
        self.sessions
            .write()
            .await
            .insert(token.clone(), identity);
        tracing::debug!("Session established for {} ({})", email, role.as_str());
        token
    }

    /// Resolve a session token to its identity, if the session is live.
    pub async fn identity_for_token(&self, token: &str) -> Option<Identity> {
        self.sessions.read().await.get(token).cloned()
    }

    /// Destroy a session (explicit logout). Unknown tokens are a no-op.
    pub async fn end_session(&self, token: &str) {
        if let Some(identity) = self.sessions.write().await.remove(token) {
            tracing::debug!("Session ended for {}", identity.email);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_session_lifecycle() {
        let state = AppState::default();

        let token = state.create_session("a@amdocs.com", Role::Judge).await;
        let identity = state.identity_for_token(&token).await.unwrap();
        assert_eq!(identity.email, "a@amdocs.com");
        assert_eq!(identity.role, Role::Judge);

        state.end_session(&token).await;
        assert!(state.identity_for_token(&token).await.is_none());
    }

    #[tokio::test]
    async fn test_unknown_token_resolves_to_none() {
        let state = AppState::default();
        assert!(state.identity_for_token("bogus").await.is_none());
        // Ending an unknown session is harmless
        state.end_session("bogus").await;
    }

    #[tokio::test]
    async fn test_sessions_are_independent() {
        let state = AppState::default();
        let t1 = state.create_session("a@amdocs.com", Role::Judge).await;
        let t2 = state.create_session("b@amdocs.com", Role::Audience).await;
        assert_ne!(t1, t2);

        state.end_session(&t1).await;
        assert!(state.identity_for_token(&t2).await.is_some());
    }
}
