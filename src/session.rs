//! Interview session data model.
//!
//! These are plain serde records. The store owns the canonical copies; every
//! value handed out (operation results, subscriber notifications) is a clone.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::language::Language;

/// Length of generated session ids.
pub const SESSION_ID_LEN: usize = 10;

/// URL-safe alphabet used for session ids.
const ID_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789_-";

/// One user attached to a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub id: String,
    pub name: String,
    pub is_online: bool,
    pub is_host: bool,
    pub joined_at_ms: u64,
}

/// Outcome of the most recent "run code" request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub success: bool,
    pub output: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub execution_time_ms: f64,
}

impl ExecutionResult {
    pub fn succeeded(output: impl Into<String>, execution_time_ms: f64) -> Self {
        Self {
            success: true,
            output: output.into(),
            error: None,
            execution_time_ms,
        }
    }

    pub fn failed(error: impl Into<String>, execution_time_ms: f64) -> Self {
        Self {
            success: false,
            output: String::new(),
            error: Some(error.into()),
            execution_time_ms,
        }
    }
}

/// A single interview room's shared state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub title: String,
    pub created_at_ms: u64,
    pub language: Language,
    pub code: String,
    pub participants: Vec<Participant>,
    pub output: Option<ExecutionResult>,
}

impl Session {
    /// The participant who created the session.
    pub fn host(&self) -> Option<&Participant> {
        self.participants.iter().find(|p| p.is_host)
    }

    pub fn participant(&self, participant_id: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == participant_id)
    }

    pub fn online_participants(&self) -> impl Iterator<Item = &Participant> {
        self.participants.iter().filter(|p| p.is_online)
    }

    pub fn online_count(&self) -> usize {
        self.online_participants().count()
    }
}

/// An edit request carried into the store. Never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeChange {
    pub session_id: String,
    pub participant_id: String,
    pub code: String,
    pub timestamp_ms: u64,
}

impl CodeChange {
    pub fn new(
        session_id: impl Into<String>,
        participant_id: impl Into<String>,
        code: impl Into<String>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            participant_id: participant_id.into(),
            code: code.into(),
            timestamp_ms: now_ms(),
        }
    }
}

/// Result of a successful join: the updated session and the new participant's id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinOutcome {
    pub session: Session,
    pub participant_id: String,
}

// ---------------------------------------------------------------------------
// Id and clock helpers
// ---------------------------------------------------------------------------

/// Generate a random URL-safe session id of [`SESSION_ID_LEN`] characters.
pub fn generate_session_id() -> String {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    (0..SESSION_ID_LEN)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect()
}

pub fn generate_participant_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Current Unix epoch in milliseconds.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
