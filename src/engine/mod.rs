//! Analysis engine interface and the KataGo subprocess client.
//!
//! KataGo's analysis engine reads one JSON query per line on stdin and
//! writes one JSON response per line on stdout, in whatever order the
//! searches finish. Responses are matched to queries by their `id`.
//!
//! # Implementing an engine
//!
//! Implement [`AnalysisEngine`]; [`KataGoClient`] drives a real process and
//! [`MockEngine`] returns canned results for tests.

mod client;
mod engine_config;
mod mock;
mod query;

pub use client::{engine_version, locate_executable, KataGoClient, KataGoSettings};
pub use engine_config::EngineConfigFile;
pub use mock::MockEngine;
pub use query::{build_query, parse_response, AllowMoves, EngineQuery};

use std::path::PathBuf;

use async_trait::async_trait;

use crate::models::{AnalysisRequest, AnalysisResult};

/// Something that can evaluate a Go position
#[async_trait]
pub trait AnalysisEngine: Send + Sync + std::fmt::Debug {
    /// Human-readable engine name
    fn name(&self) -> &str;

    /// Analyze the final position of the request's game
    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult, EngineError>;

    /// Release any resources (processes, pipes)
    async fn shutdown(&self) {}
}

/// Errors talking to the analysis engine
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("KataGo executable not found: {}", .0.display())]
    ExecutableNotFound(PathBuf),

    #[error("KataGo executable is not executable: {}", .0.display())]
    PermissionDenied(PathBuf),

    #[error("KataGo model not found: {}", .0.display())]
    ModelNotFound(PathBuf),

    #[error("KataGo config not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("Failed to start KataGo ({}): {source}", .path.display())]
    Spawn {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("KataGo process died immediately ({status}). Stderr:\n{stderr}")]
    ProcessExited { status: String, stderr: String },

    #[error("KataGo process exited before answering. Recent stderr:\n{stderr}")]
    ProcessDied { stderr: String },

    #[error("KataGo process died (broken pipe). Recent stderr:\n{stderr}")]
    BrokenPipe { stderr: String },

    #[error("Timed out after {seconds}s waiting for KataGo to answer request {id}. Recent stderr:\n{stderr}")]
    Timeout {
        id: String,
        seconds: u64,
        stderr: String,
    },

    #[error("KataGo rejected query {id}: {message}{}", .field.as_ref().map(|f| format!(" (field: {})", f)).unwrap_or_default())]
    Query {
        id: String,
        message: String,
        field: Option<String>,
    },

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// What the operator can do about it
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            EngineError::ExecutableNotFound(_) => Some(
                "Install KataGo or point KATAGO_PATH (katago.path in the config file) at the executable.",
            ),
            EngineError::PermissionDenied(_) => {
                Some("Make the KataGo binary executable, e.g. `chmod +x /path/to/katago`.")
            }
            EngineError::ModelNotFound(_) => Some(
                "Download a neural network from katagotraining.org and set KATAGO_MODEL (katago.model) to the .bin.gz file.",
            ),
            EngineError::ConfigNotFound(_) => Some(
                "Set KATAGO_CONFIG (katago.config) to an analysis config such as analysis_example.cfg, not a GTP config.",
            ),
            EngineError::Spawn { .. }
            | EngineError::ProcessExited { .. }
            | EngineError::ProcessDied { .. }
            | EngineError::BrokenPipe { .. } => Some(
                "Check the KataGo stderr above. GPU or driver errors and GTP-only configs show up there; \
                 try running `katago analysis -config analysis_example.cfg -model <model>` by hand.",
            ),
            EngineError::Timeout { .. } => Some(
                "Lower the visits (ANALYSIS_VISITS), use a smaller network, or check that the GPU is available.",
            ),
            EngineError::Query { .. } => {
                Some("The engine rejected a field of the query; the game record may be unusual.")
            }
            EngineError::Protocol(_) | EngineError::Io(_) => None,
        }
    }

    /// Error message followed by the remedy, if there is one
    pub fn with_hint(&self) -> String {
        match self.hint() {
            Some(hint) => format!("{}\n\nHint: {}", self, hint),
            None => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_setup_error_has_a_hint() {
        let path = PathBuf::from("/nowhere/katago");
        for err in [
            EngineError::ExecutableNotFound(path.clone()),
            EngineError::PermissionDenied(path.clone()),
            EngineError::ModelNotFound(path.clone()),
            EngineError::ConfigNotFound(path),
        ] {
            assert!(err.hint().is_some(), "no hint for {}", err);
        }
        assert!(EngineError::Protocol("x".into()).hint().is_none());
    }

    #[test]
    fn test_messages() {
        let err = EngineError::Query {
            id: "q1".into(),
            message: "Could not parse board size".into(),
            field: Some("boardXSize".into()),
        };
        assert_eq!(
            err.to_string(),
            "KataGo rejected query q1: Could not parse board size (field: boardXSize)"
        );

        let timeout = EngineError::Timeout {
            id: "q2".into(),
            seconds: 120,
            stderr: "(no stderr)".into(),
        };
        let text = timeout.with_hint();
        assert!(text.contains("120s"));
        assert!(text.contains("Hint: Lower the visits"));
    }
}
