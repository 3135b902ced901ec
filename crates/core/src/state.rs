//! Shared agent state for one run.
//!
//! Exactly one [`AgentState`] exists per run. Tool handlers mutate it
//! through the run-scoped [`SharedState`] lock; it is never shared across
//! concurrent runs.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// The mutable record threaded through one run: files the agent has
/// produced, and the completion summary once the agent emits one.
///
/// Invariants enforced here:
/// - `files` only grows or overwrites existing keys (no deletions);
/// - `summary` transitions None → Some at most once and is never cleared.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentState {
    files: BTreeMap<String, String>,
    summary: Option<String>,
}

impl AgentState {
    pub fn new() -> Self {
        Self::default()
    }

    /// The accumulated file map (path → content).
    pub fn files(&self) -> &BTreeMap<String, String> {
        &self.files
    }

    /// Merge a batch of files into the map. Last write wins per path.
    pub fn merge_files<I>(&mut self, batch: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.files.extend(batch);
    }

    /// The completion summary, if the run has produced one.
    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    /// Record the completion summary. Returns `false` if a summary was
    /// already set; the first one sticks.
    pub fn complete(&mut self, summary: impl Into<String>) -> bool {
        if self.summary.is_some() {
            return false;
        }
        self.summary = Some(summary.into());
        true
    }

    /// Whether a summary has been set (terminates the run loop).
    pub fn is_complete(&self) -> bool {
        self.summary.is_some()
    }
}

/// The run-scoped handle tool handlers receive.
///
/// Concurrent tool calls within one step serialize their mutations through
/// this lock.
pub type SharedState = Arc<Mutex<AgentState>>;

/// Create a fresh shared state for a new run.
pub fn shared() -> SharedState {
    Arc::new(Mutex::new(AgentState::new()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn files_overwrite_by_path() {
        let mut state = AgentState::new();
        state.merge_files([("a.txt".to_string(), "1".to_string())]);
        state.merge_files([
            ("a.txt".to_string(), "2".to_string()),
            ("b.txt".to_string(), "3".to_string()),
        ]);

        assert_eq!(state.files().len(), 2);
        assert_eq!(state.files()["a.txt"], "2");
        assert_eq!(state.files()["b.txt"], "3");
    }

    #[test]
    fn summary_sets_only_once() {
        let mut state = AgentState::new();
        assert!(!state.is_complete());

        assert!(state.complete("first"));
        assert!(state.is_complete());
        assert!(!state.complete("second"));
        assert_eq!(state.summary(), Some("first"));
    }

    #[tokio::test]
    async fn concurrent_merges_are_serialized() {
        let state = shared();

        let mut handles = Vec::new();
        for i in 0..8 {
            let state = state.clone();
            handles.push(tokio::spawn(async move {
                let mut guard = state.lock().await;
                guard.merge_files([(format!("file{i}.txt"), i.to_string())]);
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        assert_eq!(state.lock().await.files().len(), 8);
    }
}
