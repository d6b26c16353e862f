use serde::{Deserialize, Serialize};

/// Execution discipline for a job batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessType {
    /// Jobs run one at a time, in a total order. The default.
    #[default]
    Sequential,
    /// Jobs run concurrently under a global cap; each agent still runs its
    /// own jobs one at a time.
    Parallel,
}

/// Strategy used to bind each job to an agent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobAssignmentType {
    /// Ask every idle agent for a suitability score and pick the highest.
    /// The default.
    #[default]
    Suitability,
    /// Cycle idle agents in registration order, ignoring scores.
    RoundRobin,
    /// Pick the idle agent with the fewest queued jobs.
    LoadBased,
}

/// Orchestrator configuration.
///
/// Fixed at construction. Mutating a configuration while a batch is in
/// flight is a precondition violation; reconfigure only while stopped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Human-readable orchestrator name, used in logs.
    pub name: String,
    /// Execution discipline.
    #[serde(default)]
    pub process_type: ProcessType,
    /// Upper bound on simultaneously-executing jobs in parallel mode.
    /// `None` or `Some(0)` means no explicit cap: concurrency is bounded
    /// only by the number of ready jobs.
    #[serde(default)]
    pub max_concurrent_jobs: Option<usize>,
    /// Whether constructed agents keep cross-job context. Opaque to the
    /// orchestrator core; forwarded to agents.
    #[serde(default = "default_memory_enabled")]
    pub memory_enabled: bool,
    /// Assignment strategy.
    #[serde(default)]
    pub job_assignment_type: JobAssignmentType,
    /// Minimum suitability score an agent must exceed to receive a job
    /// under [`JobAssignmentType::Suitability`].
    #[serde(default)]
    pub min_suitability: f64,
}

fn default_memory_enabled() -> bool {
    true
}

impl OrchestratorConfig {
    /// Creates a configuration with the given name and all defaults:
    /// sequential, suitability assignment, memory enabled, no cap.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            process_type: ProcessType::default(),
            max_concurrent_jobs: None,
            memory_enabled: default_memory_enabled(),
            job_assignment_type: JobAssignmentType::default(),
            min_suitability: 0.0,
        }
    }

    /// Sets the execution discipline.
    pub fn with_process_type(mut self, process_type: ProcessType) -> Self {
        self.process_type = process_type;
        self
    }

    /// Sets the parallel-mode concurrency cap.
    pub fn with_max_concurrent_jobs(mut self, max: usize) -> Self {
        self.max_concurrent_jobs = Some(max);
        self
    }

    /// Sets the assignment strategy.
    pub fn with_assignment(mut self, assignment: JobAssignmentType) -> Self {
        self.job_assignment_type = assignment;
        self
    }

    /// Enables or disables agent memory.
    pub fn with_memory(mut self, enabled: bool) -> Self {
        self.memory_enabled = enabled;
        self
    }

    /// The effective concurrency cap for a batch of `batch_len` jobs.
    /// Unset and zero both mean "no explicit cap".
    pub fn effective_cap(&self, batch_len: usize) -> usize {
        match self.max_concurrent_jobs {
            Some(cap) if cap > 0 => cap.min(batch_len.max(1)),
            _ => batch_len.max(1),
        }
    }
}
