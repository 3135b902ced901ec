//! The Codeforge run loop.
//!
//! One run is a bounded cycle:
//!
//! 1. **Select** the next step (or terminate: summary set, cap reached,
//!    or cancelled)
//! 2. **Step** the model with the conversation and tool catalog
//! 3. **If tool calls**: dispatch them against the sandbox, append every
//!    result to the conversation, loop back to 1
//! 4. **If final text**: check it for the completion marker, loop back to 1
//!
//! Termination is driven purely by the agent state's summary becoming set
//! or the iteration cap; the finalizer then classifies the run and
//! assembles the immutable [`RunResult`](codeforge_core::RunResult).

pub mod finalizer;
pub mod router;

pub use finalizer::finalize;
pub use router::{NextStep, Router, DEFAULT_MAX_ITERATIONS, DEFAULT_SYSTEM_PROMPT};
