//! Consumer-side adapter over [`SessionStore`].
//!
//! `InterviewClient` keeps the view state a front end renders (current
//! snapshot, loading / executing flags, last error) and owns the subscription
//! for the session it is attached to. Clones share the same state.
//!
//! Failure policy per action:
//! - `create_session` / `join_session`: error recorded *and* returned.
//! - `update_code` / `change_language` / `execute_code`: error recorded only.
//! - `leave_session`: logged only.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::Result;
use crate::language::Language;
use crate::session::{CodeChange, ExecutionResult, JoinOutcome, Session};
use crate::store::SessionStore;
use crate::subscribers::Subscription;

/// Snapshot of what a front end shows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InterviewState {
    pub session: Option<Session>,
    pub is_loading: bool,
    pub error: Option<String>,
    pub is_executing: bool,
}

#[derive(Default)]
struct ViewState {
    view: InterviewState,
    /// Bumped on every attach/detach; stale fetches compare against it.
    epoch: u64,
    /// A notification arrived since the last attach.
    notified: bool,
}

#[derive(Default)]
struct Binding {
    session_id: Option<String>,
    participant_id: Option<String>,
    subscription: Option<Subscription>,
}

#[derive(Clone)]
pub struct InterviewClient {
    store: SessionStore,
    state: Arc<Mutex<ViewState>>,
    binding: Arc<Mutex<Binding>>,
}

impl std::fmt::Debug for InterviewClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterviewClient")
            .field("session_id", &self.session_id())
            .field("participant_id", &self.participant_id())
            .finish()
    }
}

impl InterviewClient {
    /// An unbound client. Call [`attach`](Self::attach) to follow a session.
    pub fn new(store: SessionStore) -> Self {
        Self {
            store,
            state: Arc::new(Mutex::new(ViewState::default())),
            binding: Arc::new(Mutex::new(Binding::default())),
        }
    }

    fn view(&self) -> MutexGuard<'_, ViewState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn bound(&self) -> MutexGuard<'_, Binding> {
        self.binding.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> InterviewState {
        self.view().view.clone()
    }

    pub fn session_id(&self) -> Option<String> {
        self.bound().session_id.clone()
    }

    pub fn participant_id(&self) -> Option<String> {
        self.bound().participant_id.clone()
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    fn set_error(&self, message: String) {
        self.view().view.error = Some(message);
    }

    // -----------------------------------------------------------------------
    // Binding
    // -----------------------------------------------------------------------

    /// Follow `session_id`: subscribe to its changes and fetch it once.
    ///
    /// Any previous subscription is released first.
    pub async fn attach(&self, session_id: &str, participant_id: Option<&str>) {
        let epoch = {
            let mut view = self.view();
            view.epoch += 1;
            view.notified = false;
            view.view.is_loading = true;
            view.epoch
        };

        let state = Arc::clone(&self.state);
        let subscription = self.store.subscribe(session_id, move |session| {
            let mut view = state.lock().unwrap_or_else(PoisonError::into_inner);
            if view.epoch == epoch {
                view.view.session = Some(session);
                view.notified = true;
            }
        });

        {
            let mut binding = self.bound();
            // Replacing the handle drops (and so releases) the old subscription.
            binding.subscription = Some(subscription);
            binding.session_id = Some(session_id.to_string());
            binding.participant_id = participant_id.map(str::to_string);
        }
        tracing::debug!(target: "collab::client", session_id = %session_id, "attached");

        let fetched = self.store.get_session(session_id).await;

        let mut view = self.view();
        if view.epoch != epoch {
            return;
        }
        view.view.is_loading = false;
        match fetched {
            Some(session) => {
                if !view.notified {
                    view.view.session = Some(session);
                }
            }
            None => view.view.error = Some("Session not found".to_string()),
        }
    }

    /// Stop following the current session and forget the bound ids.
    pub fn detach(&self) {
        self.view().epoch += 1;
        let old = std::mem::take(&mut *self.bound());
        if let Some(id) = old.session_id {
            tracing::debug!(target: "collab::client", session_id = %id, "detached");
        }
    }

    // -----------------------------------------------------------------------
    // Actions
    // -----------------------------------------------------------------------

    pub async fn create_session(
        &self,
        title: &str,
        language: Language,
        host_name: &str,
    ) -> Result<Session> {
        {
            let mut view = self.view();
            view.view.is_loading = true;
            view.view.error = None;
        }
        let session = self.store.create_session(title, language, host_name).await;
        let mut view = self.view();
        view.view.session = Some(session.clone());
        view.view.is_loading = false;
        Ok(session)
    }

    pub async fn join_session(&self, session_id: &str, name: &str) -> Result<JoinOutcome> {
        {
            let mut view = self.view();
            view.view.is_loading = true;
            view.view.error = None;
        }
        let result = self.store.join_session(session_id, name).await;
        let mut view = self.view();
        view.view.is_loading = false;
        match &result {
            Ok(outcome) => view.view.session = Some(outcome.session.clone()),
            Err(e) => view.view.error = Some(e.to_string()),
        }
        result
    }

    /// Send an edit for the bound session. No-op unless a session and a
    /// participant are bound.
    pub async fn update_code(&self, code: &str) {
        let (Some(session_id), Some(participant_id)) = (self.session_id(), self.participant_id())
        else {
            return;
        };
        let change = CodeChange::new(session_id, participant_id, code);
        if let Err(e) = self.store.update_code(change).await {
            self.set_error(e.to_string());
        }
    }

    pub async fn change_language(&self, language: Language) {
        let Some(session_id) = self.session_id() else {
            return;
        };
        if let Err(e) = self.store.change_language(&session_id, language).await {
            self.set_error(e.to_string());
        }
    }

    pub async fn execute_code(&self) -> Option<ExecutionResult> {
        let session_id = self.session_id()?;
        self.view().view.is_executing = true;
        let result = self.store.execute_code(&session_id).await;
        let mut view = self.view();
        view.view.is_executing = false;
        match result {
            Ok(r) => Some(r),
            Err(e) => {
                view.view.error = Some(e.to_string());
                None
            }
        }
    }

    pub async fn leave_session(&self) {
        let (Some(session_id), Some(participant_id)) = (self.session_id(), self.participant_id())
        else {
            return;
        };
        self.store.leave_session(&session_id, &participant_id).await;
    }
}
