//! One-time passcode issuance and validation.
//!
//! Codes are 6 random digits, valid for 15 minutes, keyed by email with at
//! most one live record per address. Issuing a new code overwrites any
//! unconsumed prior record for that email - this invalidation is
//! intentional, not incidental. Expiry is evaluated lazily on validation;
//! there is no background sweep (the store is keyed by email and stays
//! small).

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::types::{OTP_LENGTH, OTP_TTL_SECONDS};

/// A live passcode for one email address.
#[derive(Debug, Clone)]
struct OtpRecord {
    code: String,
    expires_at: DateTime<Utc>,
}

/// Outcome of a validation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OtpOutcome {
    /// Code matched; the record has been consumed (single use).
    Accepted,
    /// Record existed but was past expiry; it has been removed.
    Expired,
    /// Wrong code; the record stays live so the user can retry.
    Mismatch,
    /// No live record for this email.
    NotFound,
}

/// Generate a uniform random digit string (leading zeros permitted).
fn generate_code() -> String {
    let mut rng = rand::rng();
    (0..OTP_LENGTH)
        .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
        .collect()
}

/// Process-wide passcode store, safe under concurrent issue/validate from
/// different connections. Every state transition happens under one write
/// guard.
#[derive(Debug, Default)]
pub struct OtpStore {
    records: RwLock<HashMap<String, OtpRecord>>,
}

impl OtpStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a fresh code for `email`, overwriting any unconsumed prior
    /// record. The code reaches the user out-of-band; here that channel is
    /// the server log (real delivery is a deployment concern).
    pub async fn issue(&self, email: &str) -> String {
        let code = generate_code();
        let record = OtpRecord {
            code: code.clone(),
            expires_at: Utc::now() + Duration::seconds(OTP_TTL_SECONDS),
        };

        self.records
            .write()
            .await
            .insert(email.to_string(), record);

        tracing::info!("OTP for {}: your one-time code is {}", email, code);
        code
    }

    /// Validate a submitted code against the live record for `email`.
    pub async fn validate(&self, email: &str, submitted: &str) -> OtpOutcome {
        self.validate_at(email, submitted, Utc::now()).await
    }

    async fn validate_at(&self, email: &str, submitted: &str, now: DateTime<Utc>) -> OtpOutcome {
        let mut records = self.records.write().await;

        let Some(record) = records.get(email) else {
            return OtpOutcome::NotFound;
        };

        if now > record.expires_at {
            // Expired codes are never retryable, regardless of correctness
            records.remove(email);
            return OtpOutcome::Expired;
        }

        if record.code == submitted {
            // Consume on first success; resubmission yields NotFound
            records.remove(email);
            OtpOutcome::Accepted
        } else {
            OtpOutcome::Mismatch
        }
    }

    #[cfg(test)]
    async fn force_expiry(&self, email: &str, expires_at: DateTime<Utc>) {
        if let Some(record) = self.records.write().await.get_mut(email) {
            record.expires_at = expires_at;
        }
    }
}
