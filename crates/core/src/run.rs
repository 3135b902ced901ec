//! Run trigger and result types.
//!
//! A [`RunRequest`] starts one router run; a [`RunResult`] is its
//! finalized, immutable outcome.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The opening form of the completion marker. The run loop terminates when
/// a final agent message contains this literal substring.
pub const TASK_SUMMARY_OPEN: &str = "<task_summary>";

/// The closing form of the completion marker.
pub const TASK_SUMMARY_CLOSE: &str = "</task_summary>";

/// The outward-facing text of a failed run.
pub const RUN_FAILED_MESSAGE: &str = "Something went wrong. Please try again.";

/// Sentinel used when the sandbox's public address cannot be resolved.
pub const URL_UNAVAILABLE: &str = "URL unavailable";

/// The inbound trigger that starts one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRequest {
    /// Caller-assigned identifier for this run
    pub run_id: String,

    /// The user's prompt — what to build
    pub prompt: String,

    /// The project this run belongs to
    pub project_id: String,
}

/// Terminal classification of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Success,
    Error,
}

/// The finalized outcome of one full router execution.
///
/// Constructed once, at loop termination; immutable thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub status: RunStatus,

    /// The agent's completion summary (success only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    /// Files the run produced (path → content)
    pub files: BTreeMap<String, String>,

    /// The sandbox's externally reachable URL (success only; degrades to
    /// [`URL_UNAVAILABLE`] when resolution fails)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sandbox_url: Option<String>,

    /// The outward-facing text: the summary on success, a fixed failure
    /// message on error
    pub message: String,
}

impl RunResult {
    /// The fixed error result: no summary, no files, no URL.
    pub fn failure() -> Self {
        Self {
            status: RunStatus::Error,
            summary: None,
            files: BTreeMap::new(),
            sandbox_url: None,
            message: RUN_FAILED_MESSAGE.to_string(),
        }
    }

    pub fn success(
        summary: impl Into<String>,
        files: BTreeMap<String, String>,
        sandbox_url: impl Into<String>,
    ) -> Self {
        let summary = summary.into();
        Self {
            status: RunStatus::Success,
            message: summary.clone(),
            summary: Some(summary),
            files,
            sandbox_url: Some(sandbox_url.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_result_shape() {
        let result = RunResult::failure();
        assert_eq!(result.status, RunStatus::Error);
        assert!(result.summary.is_none());
        assert!(result.files.is_empty());
        assert!(result.sandbox_url.is_none());
        assert_eq!(result.message, RUN_FAILED_MESSAGE);
    }

    #[test]
    fn success_result_echoes_summary_as_message() {
        let mut files = BTreeMap::new();
        files.insert("app.ts".to_string(), "export {}".to_string());

        let result = RunResult::success("<task_summary>done</task_summary>", files, "https://x");
        assert_eq!(result.status, RunStatus::Success);
        assert_eq!(result.message, result.summary.as_deref().unwrap());
        assert_eq!(result.sandbox_url.as_deref(), Some("https://x"));
        assert_eq!(result.files.len(), 1);
    }

    #[test]
    fn result_serializes_with_sorted_files() {
        let mut files = BTreeMap::new();
        files.insert("b.txt".to_string(), "2".to_string());
        files.insert("a.txt".to_string(), "1".to_string());

        let result = RunResult::success("done", files, "https://x");
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.find("a.txt").unwrap() < json.find("b.txt").unwrap());
        assert!(json.contains(r#""status":"success""#));
    }
}
