//! The network router — the control loop of one run.

use chrono::Utc;
use codeforge_core::error::Error;
use codeforge_core::event::{DomainEvent, EventBus};
use codeforge_core::message::{Conversation, Message};
use codeforge_core::provider::{Provider, ProviderRequest};
use codeforge_core::run::{RunRequest, RunResult, TASK_SUMMARY_OPEN};
use codeforge_core::sandbox::SandboxHandle;
use codeforge_core::state::{self, AgentState};
use codeforge_core::tool::{ToolCall, ToolContext, ToolRegistry, ToolResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Default iteration cap per run.
pub const DEFAULT_MAX_ITERATIONS: u32 = 15;

/// Default port the finalizer resolves the sandbox URL for.
pub const DEFAULT_SANDBOX_PORT: u16 = 3000;

/// The built-in system prompt. Kept minimal; the completion marker wording
/// is load-bearing — termination detection looks for exactly that tag.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a coding agent working inside a sandboxed \
project. Use the available tools to build what the user asks for. When the task is fully \
complete, reply with a final message that wraps a short summary of what you built in \
<task_summary></task_summary> tags.";

/// The routing decision made before each iteration.
///
/// Single-agent today; the selection contract generalizes to multi-agent
/// routing without changing the surrounding loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextStep {
    CodeAgent,
}

/// Loop phase. The run is `Running` until a termination condition fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopState {
    Running,
    Done,
}

/// The control loop coordinating the model, the tool registry, and the
/// sandbox for one run at a time.
///
/// Owns no per-run state: every [`run`](Router::run) invocation gets a
/// fresh [`AgentState`] and conversation, so one router can serve
/// sequential runs.
pub struct Router {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    tools: Arc<ToolRegistry>,
    system_prompt: String,
    max_iterations: u32,
    sandbox_port: u16,
    event_bus: Arc<EventBus>,
    cancelled: Option<Arc<AtomicBool>>,
}

impl Router {
    /// Create a new router.
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        temperature: f32,
        tools: Arc<ToolRegistry>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature,
            max_tokens: None,
            tools,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            sandbox_port: DEFAULT_SANDBOX_PORT,
            event_bus,
            cancelled: None,
        }
    }

    /// Set the iteration cap.
    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max;
        self
    }

    /// Set the default max tokens per model response.
    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// Override the system prompt.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Set the port the sandbox URL is resolved for.
    pub fn with_sandbox_port(mut self, port: u16) -> Self {
        self.sandbox_port = port;
        self
    }

    /// Attach a run-level cancellation flag, observed cooperatively at the
    /// top of each iteration (never mid-tool-call).
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancelled = Some(flag);
        self
    }

    /// Pick the next step to run, or `None` to terminate the loop.
    fn select_next(&self, state: &AgentState, iteration: u32) -> Option<NextStep> {
        if state.is_complete() {
            return None;
        }
        if iteration >= self.max_iterations {
            return None;
        }
        Some(NextStep::CodeAgent)
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    /// Execute one run to completion and finalize its result.
    ///
    /// The only error this returns is a failed model step; everything else
    /// (tool failures, cap exhaustion, URL resolution) is absorbed into the
    /// [`RunResult`].
    pub async fn run(
        &self,
        request: &RunRequest,
        sandbox: Arc<dyn SandboxHandle>,
    ) -> Result<RunResult, Error> {
        info!(
            run_id = %request.run_id,
            project_id = %request.project_id,
            sandbox = %sandbox.id(),
            "Starting run"
        );

        self.event_bus.publish(DomainEvent::RunStarted {
            run_id: request.run_id.clone(),
            sandbox_id: sandbox.id().to_string(),
            timestamp: Utc::now(),
        });

        let shared = state::shared();
        let ctx = ToolContext {
            sandbox: sandbox.clone(),
            state: shared.clone(),
        };

        let mut conversation = Conversation::new();
        conversation.push(Message::system(&self.system_prompt));
        conversation.push(Message::user(&request.prompt));

        // The catalog is fixed for the duration of the run.
        let tool_definitions = self.tools.definitions();

        let mut iteration = 0u32;
        let mut phase = LoopState::Running;

        while phase == LoopState::Running {
            if self.is_cancelled() {
                warn!(run_id = %request.run_id, iteration, "Run cancelled");
                phase = LoopState::Done;
                continue;
            }

            let decision = {
                let guard = shared.lock().await;
                self.select_next(&guard, iteration)
            };

            let Some(NextStep::CodeAgent) = decision else {
                phase = LoopState::Done;
                continue;
            };

            debug!(run_id = %request.run_id, iteration, "Agent step");

            let response = self
                .provider
                .complete(ProviderRequest {
                    model: self.model.clone(),
                    messages: conversation.messages.clone(),
                    temperature: self.temperature,
                    max_tokens: self.max_tokens,
                    tools: tool_definitions.clone(),
                })
                .await?;

            let tool_calls = response.message.tool_calls.clone();
            let text = response.message.content.clone();
            conversation.push(response.message);

            if tool_calls.is_empty() {
                // Final text for this step — check for the completion marker.
                if text.contains(TASK_SUMMARY_OPEN) {
                    let mut guard = shared.lock().await;
                    if guard.complete(&text) {
                        info!(run_id = %request.run_id, iteration, "Task summary detected");
                    }
                }
            } else {
                // Dispatch every call of this step; all results must land in
                // the conversation before the model reasons again.
                let dispatches = tool_calls.iter().map(|tc| {
                    let ctx = &ctx;
                    async move {
                        let started = std::time::Instant::now();
                        let result = match parse_arguments(&tc.arguments) {
                            Ok(arguments) => {
                                let call = ToolCall {
                                    id: tc.id.clone(),
                                    name: tc.name.clone(),
                                    arguments,
                                };
                                self.tools.dispatch(&call, ctx).await
                            }
                            Err(reason) => {
                                ToolResult::err(format!("Invalid tool arguments: {reason}"))
                            }
                        };
                        (
                            tc.id.clone(),
                            tc.name.clone(),
                            result,
                            started.elapsed().as_millis() as u64,
                        )
                    }
                });

                let results = futures::future::join_all(dispatches).await;

                for (call_id, tool_name, result, duration_ms) in results {
                    self.event_bus.publish(DomainEvent::ToolExecuted {
                        tool_name,
                        success: !result.is_error(),
                        duration_ms,
                        timestamp: Utc::now(),
                    });
                    conversation.push(Message::tool_result(call_id, result.text()));
                }
            }

            iteration += 1;

            self.event_bus.publish(DomainEvent::StepCompleted {
                run_id: request.run_id.clone(),
                iteration,
                tool_calls: tool_calls.len(),
                timestamp: Utc::now(),
            });
        }

        let final_state = shared.lock().await.clone();
        let result =
            crate::finalizer::finalize(&final_state, sandbox.as_ref(), self.sandbox_port).await;

        info!(
            run_id = %request.run_id,
            iterations = iteration,
            status = ?result.status,
            "Run finished"
        );

        self.event_bus.publish(DomainEvent::RunFinished {
            run_id: request.run_id.clone(),
            success: result.status == codeforge_core::run::RunStatus::Success,
            iterations: iteration,
            timestamp: Utc::now(),
        });

        Ok(result)
    }
}

/// Parse the raw argument string a provider attached to a tool call.
/// An absent payload is normalized to `null` for parameterless tools.
fn parse_arguments(raw: &str) -> Result<serde_json::Value, String> {
    if raw.trim().is_empty() {
        return Ok(serde_json::Value::Null);
    }
    serde_json::from_str(raw).map_err(|e| e.to_string())
}
