//! Collaborative coding-interview sessions.
//!
//! A [`SessionStore`] owns every live session and notifies subscribers after
//! each mutation. [`InterviewClient`] is the consumer-side adapter a front end
//! drives; the `repl` module is the terminal front end shipped with the binary.

pub mod cli;
pub mod client;
pub mod config;
pub mod debounce;
pub mod error;
pub mod executor;
pub mod forms;
pub mod language;
pub mod present;
pub mod repl;
pub mod session;
pub mod store;
pub mod subscribers;

pub use client::{InterviewClient, InterviewState};
pub use config::{AppConfig, LatencyProfile};
pub use error::{CollabError, Result};
pub use executor::CodeExecutor;
pub use language::Language;
pub use session::{CodeChange, ExecutionResult, JoinOutcome, Participant, Session};
pub use store::SessionStore;
pub use subscribers::{SubscriberRegistry, Subscription};
