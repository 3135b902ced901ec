//! Error types for the Codeforge domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all Codeforge operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Sandbox errors ---
    #[error("Sandbox error: {0}")]
    Sandbox(#[from] SandboxError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Error)]
pub enum SandboxError {
    #[error("Sandbox provisioning failed: {0}")]
    Provision(String),

    #[error("Could not connect to sandbox {sandbox_id}: {reason}")]
    Connect { sandbox_id: String, reason: String },

    #[error("Command exited with status {}", exit_code.map(|c| c.to_string()).unwrap_or_else(|| "unknown".into()))]
    CommandFailed { exit_code: Option<i32> },

    #[error("File operation on {path} failed: {reason}")]
    File { path: String, reason: String },

    #[error("Host resolution failed: {0}")]
    HostResolution(String),

    #[error("Transport error: {0}")]
    Transport(String),
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Tool already registered: {0}")]
    Duplicate(String),

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),

    #[error("Tool execution failed: {tool_name} — {reason}")]
    ExecutionFailed { tool_name: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_correctly() {
        let err = Error::Provider(ProviderError::ApiError {
            status_code: 429,
            message: "Too many requests".into(),
        });
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("Too many requests"));
    }

    #[test]
    fn sandbox_command_error_displays_exit_code() {
        let err = SandboxError::CommandFailed { exit_code: Some(2) };
        assert!(err.to_string().contains("status 2"));

        let err = SandboxError::CommandFailed { exit_code: None };
        assert!(err.to_string().contains("unknown"));
    }

    #[test]
    fn tool_error_displays_correctly() {
        let err = Error::Tool(ToolError::ExecutionFailed {
            tool_name: "terminal".into(),
            reason: "sandbox unreachable".into(),
        });
        assert!(err.to_string().contains("terminal"));
        assert!(err.to_string().contains("sandbox unreachable"));
    }
}
