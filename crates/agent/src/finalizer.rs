//! Result finalizer — classifies a terminated run and assembles its
//! immutable outcome.

use codeforge_core::run::{RunResult, URL_UNAVAILABLE};
use codeforge_core::sandbox::SandboxHandle;
use codeforge_core::state::AgentState;
use tracing::warn;

/// Build the [`RunResult`] for a terminated run.
///
/// A run is an error if no summary was set OR no files were produced —
/// deliberately conservative: a run that wrote nothing is treated as failed
/// even when a summary exists. URL resolution failure never fails the run;
/// it degrades to [`URL_UNAVAILABLE`].
pub async fn finalize(
    state: &AgentState,
    sandbox: &dyn SandboxHandle,
    port: u16,
) -> RunResult {
    let Some(summary) = state.summary() else {
        return RunResult::failure();
    };
    if state.files().is_empty() {
        return RunResult::failure();
    }

    let sandbox_url = match sandbox.public_host(port).await {
        Ok(host) => format!("https://{host}"),
        Err(e) => {
            warn!(sandbox = %sandbox.id(), error = %e, "Sandbox URL resolution failed");
            URL_UNAVAILABLE.to_string()
        }
    };

    RunResult::success(summary, state.files().clone(), sandbox_url)
}
