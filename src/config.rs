//! Environment-driven configuration.
//!
//! The three deployment variants of this app differ only in port, database
//! backend, and secret handling, so everything deployment-specific is read
//! from the environment here. Judge/admin provisioning and the idea catalog
//! stay an operational concern: they are seeded from env vars at startup.

use crate::types::{Idea, Role, User};

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Port to listen on (PORT, default 5000)
    pub port: u16,
    /// Required email domain suffix for all logins (ALLOWED_EMAIL_DOMAIN)
    pub allowed_email_domain: String,
    /// Pre-provisioned judges (JUDGE_EMAILS, comma-separated)
    pub judge_emails: Vec<String>,
    /// Pre-provisioned admins (ADMIN_EMAILS, comma-separated)
    pub admin_emails: Vec<String>,
    /// Idea catalog (IDEAS, comma-separated names)
    pub idea_names: Vec<String>,
}

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_EMAIL_DOMAIN: &str = "@amdocs.com";

fn split_csv(var: &str) -> Vec<String> {
    std::env::var(var)
        .ok()
        .map(|s| {
            s.split(',')
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

impl AppConfig {
    /// Load config from environment variables
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let allowed_email_domain = std::env::var("ALLOWED_EMAIL_DOMAIN")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_EMAIL_DOMAIN.to_string());

        let judge_emails = split_csv("JUDGE_EMAILS");
        let admin_emails = split_csv("ADMIN_EMAILS");
        let idea_names = split_csv("IDEAS");

        if judge_emails.is_empty() {
            tracing::warn!("JUDGE_EMAILS not set - no judge can log in");
        }
        if admin_emails.is_empty() {
            tracing::warn!("ADMIN_EMAILS not set - no admin can log in");
        }
        if idea_names.is_empty() {
            tracing::warn!("IDEAS not set - nothing to score");
        }

        Self {
            port,
            allowed_email_domain,
            judge_emails,
            admin_emails,
            idea_names,
        }
    }

    /// Pre-provisioned users to seed into the store at startup.
    pub fn seed_users(&self) -> Vec<User> {
        let judges = self.judge_emails.iter().map(|e| User {
            email: e.clone(),
            role: Role::Judge,
        });
        let admins = self.admin_emails.iter().map(|e| User {
            email: e.clone(),
            role: Role::Admin,
        });
        judges.chain(admins).collect()
    }

    /// Idea catalog to seed, ids assigned in listed order starting at 1.
    pub fn seed_ideas(&self) -> Vec<Idea> {
        self.idea_names
            .iter()
            .enumerate()
            .map(|(i, name)| Idea::new(i as u32 + 1, name.clone()))
            .collect()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            allowed_email_domain: DEFAULT_EMAIL_DOMAIN.to_string(),
            judge_emails: Vec::new(),
            admin_emails: Vec::new(),
            idea_names: Vec::new(),
        }
    }
}
