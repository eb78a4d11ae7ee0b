use serde::{Deserialize, Serialize};

pub type IdeaId = u32;
pub type SessionToken = String;

/// OTP codes are valid for 15 minutes after issuance.
pub const OTP_TTL_SECONDS: i64 = 900;
/// OTP codes are 6-digit numeric strings (leading zeros allowed).
pub const OTP_LENGTH: usize = 6;

/// The three fixed participant roles. Unknown role strings are rejected at
/// the request boundary instead of being string-dispatched to a view name.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Judge,
    Audience,
    Admin,
}

impl Role {
    /// Parse a form-submitted role string. Returns `None` for anything
    /// outside the closed set.
    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "judge" => Some(Role::Judge),
            "audience" => Some(Role::Audience),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Judge => "judge",
            Role::Audience => "audience",
            Role::Admin => "admin",
        }
    }

    /// Path of the dashboard this role lands on after login.
    pub fn dashboard_path(&self) -> &'static str {
        match self {
            Role::Judge => "/judge_dashboard",
            Role::Audience => "/audience_dashboard",
            Role::Admin => "/admin_dashboard",
        }
    }
}

/// A registered participant. Email is unique; role is fixed at creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub email: String,
    pub role: Role,
}

/// A competition entry with running tallies.
///
/// Invariant: `total_score == score_judge + score_audience` at all times.
/// `total_score` is always re-derived inside the same write guard as the
/// component increment, never accumulated independently. All additions
/// saturate at `u32::MAX`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Idea {
    pub id: IdeaId,
    pub name: String,
    pub score_judge: u32,
    pub score_audience: u32,
    pub total_score: u32,
}

impl Idea {
    pub fn new(id: IdeaId, name: String) -> Self {
        Self {
            id,
            name,
            score_judge: 0,
            score_audience: 0,
            total_score: 0,
        }
    }
}

/// An authenticated (email, role) pair, resolved once at request entry from
/// the session token and threaded explicitly through handlers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Identity {
    pub email: String,
    pub role: Role,
}

/// Per-idea scores as exposed to clients.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IdeaScore {
    pub id: IdeaId,
    pub name: String,
    pub judge: u32,
    pub audience: u32,
    pub total: u32,
}

/// The current front-runner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Leader {
    pub name: String,
    pub total: u32,
}

/// Consistent point-in-time view of all tallies plus the leader.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    pub ideas: Vec<IdeaScore>,
    pub leader: Option<Leader>,
}
