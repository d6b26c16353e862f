//! Multi-agent job orchestration engine.
//!
//! Callers register agents into a pool, start the pool, and submit ordered
//! job batches. Each job is bound to the agent best able to run it
//! (suitability scoring, round-robin, or load-based), batches run either
//! strictly sequentially or concurrently under a global cap, and every
//! submitted job yields exactly one [`flotilla_core::JobResult`] in its
//! submission-order slot — one job's failure never aborts the rest.
//!
//! # Main types
//!
//! - [`Orchestrator`] — Top-level engine: lifecycle, batch execution, metrics.
//! - [`AgentPool`] — Registered agents with their pending-job queues.
//! - [`Assigner`] — Job-to-agent binding strategies.
//! - [`OrchestratorMetrics`] — Point-in-time health snapshot.

/// Job-to-agent assignment strategies.
pub mod assign;
/// The orchestration engine.
pub mod engine;
mod executor;
/// Health and per-agent snapshots.
pub mod metrics;
/// Agent registration and lifecycle.
pub mod pool;

pub use assign::Assigner;
pub use engine::Orchestrator;
pub use metrics::{AgentSnapshot, OrchestratorMetrics};
pub use pool::AgentPool;
