//! Create/join dialog state and validation.

use crate::language::Language;

pub const DEFAULT_SESSION_TITLE: &str = "Coding Interview";

/// Fields of the "create session" dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateSessionForm {
    pub title: String,
    pub language: Language,
    pub host_name: String,
}

impl Default for CreateSessionForm {
    fn default() -> Self {
        Self {
            title: DEFAULT_SESSION_TITLE.to_string(),
            language: Language::default(),
            host_name: String::new(),
        }
    }
}

/// A create request with trimmed, non-empty fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidCreate {
    pub title: String,
    pub language: Language,
    pub host_name: String,
}

impl CreateSessionForm {
    /// Whether the submit action should be enabled.
    pub fn can_submit(&self) -> bool {
        !self.title.trim().is_empty() && !self.host_name.trim().is_empty()
    }

    pub fn validate(&self) -> Option<ValidCreate> {
        self.can_submit().then(|| ValidCreate {
            title: self.title.trim().to_string(),
            language: self.language,
            host_name: self.host_name.trim().to_string(),
        })
    }
}

/// Fields of the "join session" dialog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoinSessionForm {
    pub session_id: String,
    pub participant_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidJoin {
    pub session_id: String,
    pub participant_name: String,
}

impl JoinSessionForm {
    /// Pre-fill the session id, e.g. from a share link.
    pub fn for_session(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            participant_name: String::new(),
        }
    }

    pub fn can_submit(&self) -> bool {
        !self.session_id.trim().is_empty() && !self.participant_name.trim().is_empty()
    }

    pub fn validate(&self) -> Option<ValidJoin> {
        self.can_submit().then(|| ValidJoin {
            session_id: self.session_id.trim().to_string(),
            participant_name: self.participant_name.trim().to_string(),
        })
    }
}

/// Extract a session id from a share link (`.../interview/<id>?pid=...`) or
/// return the input unchanged when it is already a bare id.
pub fn session_id_from_link(input: &str) -> &str {
    let input = input.trim();
    let tail = match input.rfind("/interview/") {
        Some(idx) => &input[idx + "/interview/".len()..],
        None => input,
    };
    tail.split(['?', '#', '/']).next().unwrap_or(tail)
}
