//! Interview session store: session state, participant management, change fan-out.
//!
//! ## Design
//! - SessionStore owns `Arc<Mutex<HashMap<String, Session>>>`, shared by cloning
//!   the store handle. Construct one per process (or per test).
//! - The lock is never held across an `.await`: each operation sleeps for its
//!   simulated latency, then commits the whole mutation under the lock.
//! - After a mutation commits, a snapshot is handed to the [`SubscriberRegistry`]
//!   outside the lock, so listeners may call back into the store.
//!
//! ## Session lifecycle
//! 1. Host calls `create_session` → gets a session with one online host
//! 2. Candidates call `join_session` with the id → appended as online guests
//! 3. Anyone edits (`update_code`) or switches language → last writer wins
//! 4. `execute_code` evaluates the buffer and attaches the result
//! 5. `leave_session` marks a participant offline; sessions are never removed

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::config::{AppConfig, LatencyProfile};
use crate::error::{CollabError, Result};
use crate::executor::CodeExecutor;
use crate::language::Language;
use crate::session::{
    generate_participant_id, generate_session_id, now_ms, CodeChange, ExecutionResult,
    JoinOutcome, Participant, Session,
};
use crate::subscribers::{SubscriberRegistry, Subscription};

type SessionMap = HashMap<String, Session>;

/// In-memory session store with per-session change notification.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<Mutex<SessionMap>>,
    subscribers: SubscriberRegistry,
    executor: CodeExecutor,
    latency: LatencyProfile,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(LatencyProfile::default(), CodeExecutor::default())
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("sessions", &self.session_count())
            .field("latency", &self.latency)
            .finish()
    }
}

impl SessionStore {
    pub fn new(latency: LatencyProfile, executor: CodeExecutor) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            subscribers: SubscriberRegistry::new(),
            executor,
            latency,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.latency.clone(),
            CodeExecutor::new(config.executor.clone()),
        )
    }

    /// A store with no simulated latency and the default executor.
    pub fn instant() -> Self {
        Self::new(LatencyProfile::instant(), CodeExecutor::default())
    }

    fn sessions(&self) -> MutexGuard<'_, SessionMap> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply `mutate` to the session under the lock and return a snapshot.
    fn mutate<T>(
        &self,
        session_id: &str,
        mutate: impl FnOnce(&mut Session) -> T,
    ) -> Result<(Session, T)> {
        let mut guard = self.sessions();
        let session = guard
            .get_mut(session_id)
            .ok_or_else(|| CollabError::not_found(session_id))?;
        let out = mutate(session);
        Ok((session.clone(), out))
    }

    fn notify(&self, session: &Session) {
        let delivered = self.subscribers.notify(session);
        tracing::trace!(
            target: "collab::store",
            session_id = %session.id,
            listeners = delivered,
            "notified subscribers"
        );
    }

    // -----------------------------------------------------------------------
    // Session operations
    // -----------------------------------------------------------------------

    /// Create a session whose only participant is the online host.
    pub async fn create_session(
        &self,
        title: &str,
        language: Language,
        host_name: &str,
    ) -> Session {
        simulate_latency(self.latency.create_ms).await;

        let created_at_ms = now_ms();
        let host = Participant {
            id: generate_participant_id(),
            name: host_name.to_string(),
            is_online: true,
            is_host: true,
            joined_at_ms: created_at_ms,
        };

        let mut guard = self.sessions();
        let mut id = generate_session_id();
        while guard.contains_key(&id) {
            id = generate_session_id();
        }
        let session = Session {
            id: id.clone(),
            title: title.to_string(),
            created_at_ms,
            language,
            code: language.default_code().to_string(),
            participants: vec![host],
            output: None,
        };
        guard.insert(id, session.clone());
        drop(guard);

        tracing::info!(
            target: "collab::store",
            session_id = %session.id,
            language = %language,
            "session created"
        );
        session
    }

    /// Append a new online, non-host participant.
    pub async fn join_session(&self, session_id: &str, name: &str) -> Result<JoinOutcome> {
        simulate_latency(self.latency.join_ms).await;

        let participant_id = generate_participant_id();
        let participant = Participant {
            id: participant_id.clone(),
            name: name.to_string(),
            is_online: true,
            is_host: false,
            joined_at_ms: now_ms(),
        };
        let (session, ()) = self.mutate(session_id, |s| s.participants.push(participant))?;

        tracing::info!(
            target: "collab::store",
            session_id = %session_id,
            participant_id = %participant_id,
            participants = session.participants.len(),
            "participant joined"
        );
        self.notify(&session);
        Ok(JoinOutcome {
            session,
            participant_id,
        })
    }

    /// Fetch a snapshot; `None` when the id is unknown.
    pub async fn get_session(&self, session_id: &str) -> Option<Session> {
        simulate_latency(self.latency.get_ms).await;
        self.sessions().get(session_id).cloned()
    }

    /// Overwrite the session's code verbatim.
    pub async fn update_code(&self, change: CodeChange) -> Result<Session> {
        simulate_latency(self.latency.update_ms).await;

        let (session, ()) = self.mutate(&change.session_id, |s| s.code = change.code)?;
        tracing::debug!(
            target: "collab::store",
            session_id = %session.id,
            participant_id = %change.participant_id,
            bytes = session.code.len(),
            "code updated"
        );
        self.notify(&session);
        Ok(session)
    }

    /// Switch language and reset the buffer to that language's template.
    pub async fn change_language(&self, session_id: &str, language: Language) -> Result<Session> {
        simulate_latency(self.latency.change_language_ms).await;

        let (session, ()) = self.mutate(session_id, |s| {
            s.language = language;
            s.code = language.default_code().to_string();
        })?;
        tracing::debug!(
            target: "collab::store",
            session_id = %session_id,
            language = %language,
            "language changed"
        );
        self.notify(&session);
        Ok(session)
    }

    /// Evaluate the current buffer and attach the result to the session.
    ///
    /// A failing program is a successful call returning `success == false`.
    pub async fn execute_code(&self, session_id: &str) -> Result<ExecutionResult> {
        simulate_latency(self.latency.execute_ms).await;

        let (language, code) = {
            let guard = self.sessions();
            let session = guard
                .get(session_id)
                .ok_or_else(|| CollabError::not_found(session_id))?;
            (session.language, session.code.clone())
        };

        let result = self.executor.execute(language, &code).await;

        let (session, ()) = self.mutate(session_id, |s| s.output = Some(result.clone()))?;
        tracing::info!(
            target: "collab::store",
            session_id = %session_id,
            language = %language,
            success = result.success,
            "code executed"
        );
        self.notify(&session);
        Ok(result)
    }

    /// Mark a participant offline. Unknown session or participant is a no-op.
    pub async fn leave_session(&self, session_id: &str, participant_id: &str) {
        simulate_latency(self.latency.leave_ms).await;

        let Ok((session, found)) = self.mutate(session_id, |s| {
            match s.participants.iter_mut().find(|p| p.id == participant_id) {
                Some(p) => {
                    p.is_online = false;
                    true
                }
                None => false,
            }
        }) else {
            return;
        };

        if found {
            tracing::info!(
                target: "collab::store",
                session_id = %session_id,
                participant_id = %participant_id,
                "participant left"
            );
        }
        self.notify(&session);
    }

    /// Register `listener` for change notifications on `session_id`.
    pub fn subscribe<F>(&self, session_id: &str, listener: F) -> Subscription
    where
        F: Fn(Session) + Send + Sync + 'static,
    {
        self.subscribers.subscribe(session_id, listener)
    }

    // -----------------------------------------------------------------------
    // Diagnostics
    // -----------------------------------------------------------------------

    pub fn session_count(&self) -> usize {
        self.sessions().len()
    }

    pub fn subscriber_count(&self, session_id: &str) -> usize {
        self.subscribers.count(session_id)
    }
}

async fn simulate_latency(ms: u64) {
    if ms > 0 {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}
