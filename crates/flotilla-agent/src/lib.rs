//! Agent capability contract and the production worker agent.
//!
//! The orchestrator depends on agents only through the [`Agent`] trait:
//! status, lifecycle, suitability evaluation, and job execution. Production
//! agents ([`WorkerAgent`]) and test mocks are interchangeable behind it.
//!
//! What an agent actually *does* with a job — model invocation, tool
//! calling, prompt construction — lives behind the [`JobHandler`] seam and
//! is supplied by the embedding application.
//!
//! # Main types
//!
//! - [`Agent`] — The capability trait the orchestrator consumes.
//! - [`AgentStatus`] — `Idle` / `Busy` / `Stopped`.
//! - [`WorkerAgent`] — Production implementation with suitability scoring
//!   and optional cross-job memory.
//! - [`JobHandler`] — External-collaborator seam for job execution.
//! - [`LlmConfig`] — Validated model configuration.

/// LLM provider and model configuration.
pub mod config;
/// The job execution seam.
pub mod handler;
/// Descriptive tool registration.
pub mod tool;
/// The production worker agent.
pub mod worker;

pub use config::{LlmConfig, LlmProvider};
pub use handler::{HandlerFactory, JobHandler};
pub use tool::ToolSpec;
pub use worker::{WorkerAgent, WorkerAgentBuilder};

use async_trait::async_trait;
use flotilla_core::{FlotillaResult, Job, JobResult};
use serde::{Deserialize, Serialize};

/// Observable state of an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    /// Started and ready to accept a job.
    Idle,
    /// Currently executing a job. An agent is `Busy` only while one of its
    /// assigned jobs is executing.
    Busy,
    /// Not started, or stopped.
    Stopped,
}

/// The capability contract between the orchestrator and a worker.
///
/// Implementations must be safe to share across tasks; the orchestrator
/// holds agents as `Arc<dyn Agent>` and guarantees it never runs two of an
/// agent's jobs concurrently.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Stable identity, unique within a pool for the process lifetime.
    fn id(&self) -> &str;

    /// Current status. Must not block on job execution.
    fn status(&self) -> AgentStatus;

    /// Transitions the agent to [`AgentStatus::Idle`]. Idempotent.
    async fn start(&self) -> FlotillaResult<()>;

    /// Transitions the agent to [`AgentStatus::Stopped`]. Idempotent; jobs
    /// already executing are allowed to finish naturally.
    async fn stop(&self) -> FlotillaResult<()>;

    /// How well this agent can handle the given job, in `[0, 1]`.
    ///
    /// Pure with respect to orchestrator state; may consult internal agent
    /// state. Stopped agents score `0.0`.
    async fn evaluate_suitability(&self, job: &Job) -> f64;

    /// Executes one job to completion.
    ///
    /// May fail with an arbitrary error; the orchestrator converts any
    /// failure into a failed [`JobResult`] rather than aborting the batch.
    async fn execute_job(&self, job: &Job) -> FlotillaResult<JobResult>;
}
