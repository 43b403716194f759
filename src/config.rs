//! TOML configuration for the store, executor and editor.
//!
//! Every field has a default, so an empty file (or no file) is valid:
//!
//! ```toml
//! [latency]
//! create_ms = 300
//! execute_ms = 500
//!
//! [executor]
//! node_program = "node"
//! timeout_ms = 5000
//!
//! [editor]
//! debounce_ms = 300
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{CollabError, Result};

/// Simulated latency applied before each store operation completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LatencyProfile {
    pub create_ms: u64,
    pub join_ms: u64,
    pub get_ms: u64,
    pub update_ms: u64,
    pub change_language_ms: u64,
    pub execute_ms: u64,
    pub leave_ms: u64,
}

impl Default for LatencyProfile {
    fn default() -> Self {
        Self {
            create_ms: 300,
            join_ms: 200,
            get_ms: 100,
            update_ms: 50,
            change_language_ms: 100,
            execute_ms: 500,
            leave_ms: 100,
        }
    }
}

impl LatencyProfile {
    /// No simulated latency at all. Used by tests and the `run` command.
    pub fn instant() -> Self {
        Self {
            create_ms: 0,
            join_ms: 0,
            get_ms: 0,
            update_ms: 0,
            change_language_ms: 0,
            execute_ms: 0,
            leave_ms: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Program used to evaluate JavaScript.
    pub node_program: String,
    /// Wall-clock limit for one evaluation.
    pub timeout_ms: u64,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            node_program: "node".to_string(),
            timeout_ms: 5_000,
        }
    }
}

impl ExecutorConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Quiet period before a local edit is sent to the store.
    pub debounce_ms: u64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self { debounce_ms: 300 }
    }
}

impl EditorConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub latency: LatencyProfile,
    pub executor: ExecutorConfig,
    pub editor: EditorConfig,
}

impl AppConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| CollabError::Config(e.to_string()))
    }

    /// Load from `path`, or return defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .map_err(|e| CollabError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_simulated_latencies() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.latency.create_ms, 300);
        assert_eq!(cfg.latency.join_ms, 200);
        assert_eq!(cfg.latency.update_ms, 50);
        assert_eq!(cfg.latency.execute_ms, 500);
        assert_eq!(cfg.executor.node_program, "node");
        assert_eq!(cfg.editor.debounce(), Duration::from_millis(300));
    }

    #[test]
    fn test_empty_document_is_default() {
        assert_eq!(AppConfig::from_toml_str("").unwrap(), AppConfig::default());
    }

    #[test]
    fn test_partial_document_keeps_other_defaults() {
        let cfg = AppConfig::from_toml_str(
            "[latency]\nexecute_ms = 10\n\n[executor]\ntimeout_ms = 250\n",
        )
        .unwrap();
        assert_eq!(cfg.latency.execute_ms, 10);
        assert_eq!(cfg.latency.create_ms, 300);
        assert_eq!(cfg.executor.timeout(), Duration::from_millis(250));
        assert_eq!(cfg.executor.node_program, "node");
    }

    #[test]
    fn test_malformed_document_is_config_error() {
        let err = AppConfig::from_toml_str("[latency\ncreate_ms = ").unwrap_err();
        assert!(matches!(err, CollabError::Config(_)));
    }

    #[test]
    fn test_load_none_is_default() {
        assert_eq!(AppConfig::load(None).unwrap(), AppConfig::default());
    }

    #[test]
    fn test_load_missing_file_is_config_error() {
        let err = AppConfig::load(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(err.to_string().contains("here.toml"));
    }

    #[test]
    fn test_load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("collab.toml");
        std::fs::write(&path, "[editor]\ndebounce_ms = 75\n").unwrap();
        let cfg = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(cfg.editor.debounce_ms, 75);
    }

    #[test]
    fn test_instant_profile_is_all_zero() {
        let p = LatencyProfile::instant();
        assert_eq!(p.create_ms + p.join_ms + p.get_ms + p.update_ms, 0);
        assert_eq!(p.change_language_ms + p.execute_ms + p.leave_ms, 0);
    }
}
