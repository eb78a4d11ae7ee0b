//! HTTP route handlers.
//!
//! Page markup lives under `static/`; these handlers only gate access,
//! mutate state, and redirect. Rejections surface as an `?error=<code>`
//! query parameter on the redirect target, which the front-end maps to
//! user-facing text (the flash-message equivalent).

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
    Form, Json,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

use crate::auth::{self, AuthRejection};
use crate::broadcast::broadcast_snapshot;
use crate::state::AppState;
use crate::types::{IdeaId, Identity, Role};

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub role: String,
}

#[derive(Debug, Deserialize)]
pub struct OtpForm {
    pub otp: String,
}

#[derive(Debug, Deserialize)]
pub struct EmailQuery {
    pub email: String,
}

/// Short slug carried in the redirect query; the front-end owns the text.
fn rejection_code(rejection: &AuthRejection) -> &'static str {
    match rejection {
        AuthRejection::UnknownRole => "unknown_role",
        AuthRejection::DisallowedDomain => "bad_domain",
        AuthRejection::Unregistered => "unregistered",
        AuthRejection::RoleMismatch => "role_mismatch",
        AuthRejection::InvalidCredentials => "invalid_credentials",
        AuthRejection::OtpNotFound => "otp_not_found",
        AuthRejection::OtpExpired => "otp_expired",
        AuthRejection::OtpMismatch => "otp_invalid",
    }
}

/// Percent-encode a value for a redirect query string. Emails legally
/// contain `+`, `&` and other query metacharacters, so everything outside
/// the unreserved set is escaped. (Small enough to do by hand, as with the
/// other mini-codecs in this crate.)
fn encode_query_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

/// Fail-open-to-login policy: every rejection redirects to a safe prior
/// view instead of raising a hard error. An OTP mismatch goes back to the
/// code-entry view so the user can retry; everything else lands on login.
fn reject_redirect(rejection: &AuthRejection, email: &str) -> Redirect {
    tracing::info!("Login rejected for {}: {}", email, rejection);
    if rejection.retryable_at_otp_entry() {
        Redirect::to(&format!(
            "/otp_verification?email={}&error={}",
            encode_query_value(email),
            rejection_code(rejection)
        ))
    } else {
        Redirect::to(&format!("/?error={}", rejection_code(rejection)))
    }
}

/// Establish the session and land on the role's dashboard.
async fn login_response(state: &AppState, identity: &Identity) -> Response {
    let token = state.create_session(&identity.email, identity.role).await;
    (
        AppendHeaders([(header::SET_COOKIE, auth::session_cookie(&token))]),
        Redirect::to(identity.role.dashboard_path()),
    )
        .into_response()
}

/// Serve a page from the static directory (markup is not this crate's
/// concern).
async fn serve_page(name: &str) -> Response {
    match tokio::fs::read_to_string(format!("static/{}.html", name)).await {
        Ok(content) => (
            [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
            content,
        )
            .into_response(),
        Err(_) => (StatusCode::NOT_FOUND, "Page not found").into_response(),
    }
}

// ---- Login entry ----

pub async fn home_page() -> Response {
    serve_page("login").await
}

/// POST / - direct login fast path on an exact (email, role) match.
pub async fn home_login(
    State(state): State<Arc<AppState>>,
    Form(form): Form<LoginForm>,
) -> Response {
    match auth::direct_login(&state, &form.email, &form.role).await {
        Ok(identity) => login_response(&state, &identity).await,
        Err(rejection) => reject_redirect(&rejection, &form.email).into_response(),
    }
}

/// POST /send_otp - issue a code per the registration policy and move the
/// user to the code-entry view.
pub async fn send_otp(
    State(state): State<Arc<AppState>>,
    Form(form): Form<LoginForm>,
) -> Response {
    match auth::request_otp(&state, &form.email, &form.role).await {
        Ok(_code) => {
            // The code itself went to the out-of-band channel (the log)
            Redirect::to(&format!(
                "/otp_verification?email={}&info=otp_sent",
                encode_query_value(&form.email)
            ))
            .into_response()
        }
        Err(rejection) => reject_redirect(&rejection, &form.email).into_response(),
    }
}

pub async fn otp_verification_page() -> Response {
    serve_page("otp_verification").await
}

/// POST /otp_verification?email= - complete verification and establish the
/// session.
pub async fn verify_otp(
    State(state): State<Arc<AppState>>,
    Query(query): Query<EmailQuery>,
    Form(form): Form<OtpForm>,
) -> Response {
    match auth::complete_otp(&state, &query.email, &form.otp).await {
        Ok(identity) => login_response(&state, &identity).await,
        Err(rejection) => reject_redirect(&rejection, &query.email).into_response(),
    }
}

// ---- Role dashboards ----

/// Resolve the caller's identity and require a specific role; wrong or
/// missing identity redirects to the login entry point (never a 403).
async fn require_role(
    state: &AppState,
    headers: &HeaderMap,
    required: Role,
) -> Result<Identity, Redirect> {
    match auth::identity_from_headers(state, headers).await {
        Some(identity) if identity.role == required => Ok(identity),
        Some(identity) => {
            tracing::info!(
                "{} ({}) tried to access a {} view",
                identity.email,
                identity.role.as_str(),
                required.as_str()
            );
            Err(Redirect::to("/"))
        }
        None => Err(Redirect::to("/")),
    }
}

/// Pull `score_<id>` fields out of the submitted form. Empty or
/// non-numeric values and unrelated fields are skipped, mirroring how
/// unknown idea ids are treated downstream.
fn parse_score_form(form: &HashMap<String, String>) -> HashMap<IdeaId, u32> {
    form.iter()
        .filter_map(|(key, value)| {
            let id = key.strip_prefix("score_")?.parse().ok()?;
            let delta = value.trim().parse().ok()?;
            Some((id, delta))
        })
        .collect()
}

async fn dashboard_page(state: &AppState, headers: &HeaderMap, role: Role) -> Response {
    match require_role(state, headers, role).await {
        Ok(_) => Json(state.snapshot().await.ideas).into_response(),
        Err(redirect) => redirect.into_response(),
    }
}

async fn dashboard_submit(
    state: &AppState,
    headers: &HeaderMap,
    role: Role,
    form: HashMap<String, String>,
) -> Response {
    let identity = match require_role(state, headers, role).await {
        Ok(identity) => identity,
        Err(redirect) => return redirect.into_response(),
    };

    let deltas = parse_score_form(&form);
    match state.apply_scores(identity.role, &deltas).await {
        Ok(applied) => {
            tracing::info!("{} applied {} score deltas", identity.email, applied);
            broadcast_snapshot(state).await;
            Redirect::to("/thank_you").into_response()
        }
        // Unreachable with the role gate above, but fail safe to login
        Err(e) => {
            tracing::error!("Score submission refused: {}", e);
            Redirect::to("/").into_response()
        }
    }
}

pub async fn judge_dashboard(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    dashboard_page(&state, &headers, Role::Judge).await
}

pub async fn judge_submit(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    dashboard_submit(&state, &headers, Role::Judge, form).await
}

pub async fn audience_dashboard(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Response {
    dashboard_page(&state, &headers, Role::Audience).await
}

pub async fn audience_submit(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    dashboard_submit(&state, &headers, Role::Audience, form).await
}

/// GET /admin_dashboard - view-only aggregate plus leader.
pub async fn admin_dashboard(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    match require_role(&state, &headers, Role::Admin).await {
        Ok(_) => Json(state.snapshot().await).into_response(),
        Err(redirect) => redirect.into_response(),
    }
}

// ---- Public views ----

/// GET /result - public aggregate view.
pub async fn result(State(state): State<Arc<AppState>>) -> Response {
    Json(state.snapshot().await).into_response()
}

pub async fn thank_you() -> Response {
    serve_page("thank_you").await
}

/// GET /logout - destroy the session and return to login.
pub async fn logout(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    if let Some(cookies) = headers.get(header::COOKIE).and_then(|v| v.to_str().ok()) {
        if let Some(token) = cookies.split(';').find_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            (name == auth::SESSION_COOKIE).then_some(value)
        }) {
            state.end_session(token).await;
        }
    }

    (
        AppendHeaders([(header::SET_COOKIE, auth::clear_session_cookie())]),
        Redirect::to("/"),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Idea;

    #[test]
    fn test_encode_query_value_escapes_metacharacters() {
        // `+`, `&`, and spaces are all legal in the local part of an email
        // and must survive the redirect query round-trip
        assert_eq!(
            encode_query_value("a+b&c d@amdocs.com"),
            "a%2Bb%26c%20d%40amdocs.com"
        );
        assert_eq!(encode_query_value("plain-user_1.x~@y"), "plain-user_1.x~%40y");
    }

    #[test]
    fn test_parse_score_form() {
        let form = HashMap::from([
            ("score_1".to_string(), "5".to_string()),
            ("score_2".to_string(), "".to_string()),
            ("score_3".to_string(), "abc".to_string()),
            ("score_x".to_string(), "4".to_string()),
            ("comment".to_string(), "great".to_string()),
        ]);

        let deltas = parse_score_form(&form);
        assert_eq!(deltas, HashMap::from([(1, 5)]));
    }

    #[tokio::test]
    async fn test_require_role_rejects_wrong_role_without_mutation() {
        let state = AppState::default();
        *state.ideas.write().await = vec![Idea::new(1, "Alpha".to_string())];
        let token = state.create_session("aud@amdocs.com", Role::Audience).await;

        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            format!("session={}", token).parse().unwrap(),
        );

        // Audience identity invoking the judge-only path is redirected
        assert!(require_role(&state, &headers, Role::Judge).await.is_err());

        let form = HashMap::from([("score_1".to_string(), "5".to_string())]);
        let response = dashboard_submit(&state, &headers, Role::Judge, form).await;
        assert!(response.status().is_redirection());
        assert_eq!(state.snapshot().await.ideas[0].total, 0);
    }

    #[tokio::test]
    async fn test_require_role_accepts_matching_session() {
        let state = AppState::default();
        let token = state.create_session("j@amdocs.com", Role::Judge).await;

        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            format!("session={}", token).parse().unwrap(),
        );

        let identity = require_role(&state, &headers, Role::Judge).await.unwrap();
        assert_eq!(identity.email, "j@amdocs.com");
    }

    #[tokio::test]
    async fn test_require_role_without_session_redirects() {
        let state = AppState::default();
        let headers = HeaderMap::new();
        assert!(require_role(&state, &headers, Role::Admin).await.is_err());
    }
}
