//! Sandbox client implementations for Codeforge.
//!
//! Two backends implement the core `SandboxClient`/`SandboxHandle` surface:
//! - [`HttpSandboxClient`] — a remote sandbox provisioning service, spoken
//!   to over JSON/HTTP with streamed command output;
//! - [`LocalSandboxClient`] — a process-local backend (scoped directory,
//!   `sh -c`) for development and tests.

pub mod http;
pub mod local;

pub use http::{HttpSandboxClient, HttpSandboxHandle};
pub use local::{LocalSandbox, LocalSandboxClient};
