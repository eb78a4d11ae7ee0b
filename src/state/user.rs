use super::AppState;
use crate::types::{Role, User};

impl AppState {
    /// Look up a user by email.
    pub async fn find_user(&self, email: &str) -> Option<User> {
        self.users.read().await.get(email).cloned()
    }

    /// Look up a user by the exact (email, role) pair. Backs the direct
    /// login fast path.
    pub async fn find_user_with_role(&self, email: &str, role: Role) -> Option<User> {
        self.users
            .read()
            .await
            .get(email)
            .filter(|u| u.role == role)
            .cloned()
    }

    /// Self-service registration for the least-privileged role: create an
    /// audience user if the email is unknown, otherwise return the existing
    /// record untouched (roles are immutable post-creation).
    pub async fn ensure_audience_user(&self, email: &str) -> User {
        let mut users = self.users.write().await;
        users
            .entry(email.to_string())
            .or_insert_with(|| {
                tracing::info!("Self-registering audience user {}", email);
                User {
                    email: email.to_string(),
                    role: Role::Audience,
                }
            })
            .clone()
    }
}
