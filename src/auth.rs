//! Session/Identity gate: turns a validated OTP (or a direct email+role
//! match) into an authenticated identity, and resolves identities from the
//! session cookie on later requests.

use axum::http::HeaderMap;

use crate::otp::OtpOutcome;
use crate::state::AppState;
use crate::types::{Identity, Role};

pub const SESSION_COOKIE: &str = "session";

/// Every way a login attempt can fail, with user-facing text per variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthRejection {
    #[error("Unknown role.")]
    UnknownRole,
    #[error("Only company email addresses are allowed!")]
    DisallowedDomain,
    #[error("Email not registered!")]
    Unregistered,
    #[error("Role mismatch.")]
    RoleMismatch,
    #[error("Invalid email or role.")]
    InvalidCredentials,
    #[error("No OTP found. Please request a new one.")]
    OtpNotFound,
    #[error("OTP expired.")]
    OtpExpired,
    #[error("Invalid OTP.")]
    OtpMismatch,
}

impl AuthRejection {
    /// A mismatch is retryable at the code-entry view; every other
    /// rejection sends the user back to the login entry point.
    pub fn retryable_at_otp_entry(&self) -> bool {
        matches!(self, AuthRejection::OtpMismatch)
    }
}

/// Fast path for returning users presenting both email and role: succeeds
/// only on an exact pre-existing (email, role) pair, with no OTP involved.
pub async fn direct_login(
    state: &AppState,
    email: &str,
    role_str: &str,
) -> Result<Identity, AuthRejection> {
    let role = Role::parse(role_str).ok_or(AuthRejection::UnknownRole)?;

    let user = state
        .find_user_with_role(email, role)
        .await
        .ok_or(AuthRejection::InvalidCredentials)?;

    // Known weakness carried over from the original flow: this path skips
    // the one-time-passcode check entirely for returning users.
    tracing::warn!(
        "Direct login (OTP bypass) for {} as {}",
        user.email,
        role.as_str()
    );

    Ok(Identity {
        email: user.email,
        role: user.role,
    })
}

/// Enforce the issuance policy, then hand off to the OTP store.
///
/// Judges and admins must be pre-provisioned with a matching role; audience
/// members self-register on first request. Returns the issued code so the
/// caller can log it (delivery stays out-of-band).
pub async fn request_otp(
    state: &AppState,
    email: &str,
    role_str: &str,
) -> Result<String, AuthRejection> {
    let role = Role::parse(role_str).ok_or(AuthRejection::UnknownRole)?;

    if !email.ends_with(&state.config.allowed_email_domain) {
        return Err(AuthRejection::DisallowedDomain);
    }

    match role {
        Role::Judge | Role::Admin => {
            let user = state
                .find_user(email)
                .await
                .ok_or(AuthRejection::Unregistered)?;
            if user.role != role {
                return Err(AuthRejection::RoleMismatch);
            }
        }
        Role::Audience => {
            state.ensure_audience_user(email).await;
        }
    }

    Ok(state.otp.issue(email).await)
}

/// Exchange a submitted code for an identity bound to the user's role.
pub async fn complete_otp(
    state: &AppState,
    email: &str,
    submitted: &str,
) -> Result<Identity, AuthRejection> {
    match state.otp.validate(email, submitted).await {
        OtpOutcome::Accepted => {}
        OtpOutcome::Expired => return Err(AuthRejection::OtpExpired),
        OtpOutcome::Mismatch => return Err(AuthRejection::OtpMismatch),
        OtpOutcome::NotFound => return Err(AuthRejection::OtpNotFound),
    }

    // The user record is authoritative for the role; the form's role field
    // never reaches this point.
    let user = state
        .find_user(email)
        .await
        .ok_or(AuthRejection::Unregistered)?;

    Ok(Identity {
        email: user.email,
        role: user.role,
    })
}

/// Extract the session token from a `Cookie` header value.
fn session_token_from_cookies(cookies: &str) -> Option<&str> {
    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE).then_some(value)
    })
}

/// Resolve the caller's identity from request headers, if a live session
/// cookie is present.
pub async fn identity_from_headers(state: &AppState, headers: &HeaderMap) -> Option<Identity> {
    let cookies = headers.get(axum::http::header::COOKIE)?.to_str().ok()?;
    let token = session_token_from_cookies(cookies)?;
    state.identity_for_token(token).await
}

/// `Set-Cookie` value establishing a session.
pub fn session_cookie(token: &str) -> String {
    format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, token)
}

/// `Set-Cookie` value clearing the session on logout.
pub fn clear_session_cookie() -> String {
    format!("{}=; Path=/; HttpOnly; Max-Age=0", SESSION_COOKIE)
}
