//! # Codeforge Core
//!
//! Domain types, traits, and error definitions for the Codeforge code
//! generation runtime. This crate has **zero framework dependencies** — it
//! defines the domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator is defined as a trait here: the model
//! capability ([`Provider`]), the sandboxed execution environment
//! ([`SandboxClient`]/[`SandboxHandle`]), and the agent's actions
//! ([`Tool`]). Implementations live in their respective crates. This
//! enables:
//! - Swapping implementations via configuration
//! - Easy testing with mock/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod error;
pub mod event;
pub mod message;
pub mod provider;
pub mod run;
pub mod sandbox;
pub mod state;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{Error, ProviderError, Result, SandboxError, ToolError};
pub use event::{DomainEvent, EventBus};
pub use message::{Conversation, Message, MessageToolCall, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, ToolDefinition, Usage};
pub use run::{RunRequest, RunResult, RunStatus};
pub use sandbox::{
    CommandOutput, CommandSink, DirEntry, OutputBuffers, OutputStream, SandboxClient,
    SandboxHandle,
};
pub use state::{AgentState, SharedState};
pub use tool::{Tool, ToolCall, ToolContext, ToolRegistry, ToolResult};
