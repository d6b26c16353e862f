//! Core types and error definitions for the Flotilla framework.
//!
//! This crate provides the foundational types shared across all Flotilla
//! crates: error handling, the job data model, and orchestrator
//! configuration.
//!
//! # Main types
//!
//! - [`FlotillaError`] — Unified error enum for all Flotilla subsystems.
//! - [`FlotillaResult`] — Convenience alias for `Result<T, FlotillaError>`.
//! - [`Job`] — One unit of work submitted to the orchestrator.
//! - [`JobResult`] — The outcome record produced for exactly one job.
//! - [`OrchestratorConfig`] — Execution discipline and assignment settings.

/// Orchestrator configuration (process type, assignment strategy, caps).
pub mod config;
/// Job, priority, and result types.
pub mod job;

pub use config::{JobAssignmentType, OrchestratorConfig, ProcessType};
pub use job::{Job, JobPriority, JobResult};

// --- Error types ---

/// Top-level error type for the Flotilla framework.
///
/// Each variant corresponds to a failure class defined by the orchestration
/// contract. Anything scoped to a single job is recovered into that job's
/// [`JobResult`] by the orchestrator rather than surfaced through this enum.
#[derive(Debug, thiserror::Error)]
pub enum FlotillaError {
    /// Invalid setup (bad LLM config, missing handler factory). Fatal to
    /// the call that raised it.
    #[error("Config error: {0}")]
    Config(String),

    /// `execute` was called before `start`.
    #[error("orchestrator is not started")]
    NotStarted,

    /// An agent with the same id is already registered in the pool.
    #[error("duplicate agent id: {0}")]
    DuplicateAgent(String),

    /// No idle agent could take the job, or no candidate scored above the
    /// configured suitability threshold.
    #[error("no suitable agent: {0}")]
    NoSuitableAgent(String),

    /// An agent failed to start while the pool was starting up.
    #[error("startup error: {0}")]
    Startup(String),

    /// An error originating from an agent while executing a job.
    #[error("Agent error: {0}")]
    Agent(String),

    /// A JSON serialization or deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A convenience `Result` alias using [`FlotillaError`].
pub type FlotillaResult<T> = Result<T, FlotillaError>;
