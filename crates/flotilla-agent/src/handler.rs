use crate::config::LlmConfig;
use async_trait::async_trait;
use flotilla_core::{FlotillaResult, Job};
use std::sync::Arc;

/// The seam between the orchestration core and whatever actually performs
/// a job (model invocation, tool calling, prompt construction).
///
/// A handler receives one job at a time; the owning agent is never asked
/// to run two jobs concurrently.
#[async_trait]
pub trait JobHandler: Send + Sync {
    /// Performs the job and returns its output, or an error that the
    /// caller records as that job's failure.
    async fn handle(&self, job: &Job) -> FlotillaResult<serde_json::Value>;
}

/// Builds a [`JobHandler`] for a newly constructed agent from its validated
/// model config. Injected into the orchestrator so tests and embedders can
/// supply deterministic handlers.
pub type HandlerFactory = Arc<dyn Fn(&LlmConfig) -> Arc<dyn JobHandler> + Send + Sync>;
