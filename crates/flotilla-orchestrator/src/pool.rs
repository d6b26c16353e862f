use crate::metrics::AgentSnapshot;
use flotilla_agent::{Agent, AgentStatus};
use flotilla_core::{FlotillaError, FlotillaResult, Job};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, warn};

/// A job bound to an agent, remembering the job's position in its batch.
///
/// Result placement always uses `index`, never completion order.
#[derive(Debug, Clone)]
pub struct Binding {
    /// Position of the job in the submitted batch.
    pub index: usize,
    /// The job itself.
    pub job: Job,
}

struct AgentEntry {
    agent: Arc<dyn Agent>,
    queue: VecDeque<Binding>,
}

/// The set of registered agents, in registration order, each paired with
/// its pending-job queue.
///
/// Queue mutation is serialized through the lock the owning orchestrator
/// wraps the pool in; the lock is never held across a job's execution.
pub struct AgentPool {
    entries: Vec<AgentEntry>,
    started: bool,
}

impl AgentPool {
    /// Creates an empty pool.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            started: false,
        }
    }

    /// Registers an agent. Registration order is preserved for the
    /// lifetime of the pool and drives assignment tie-breaks.
    pub fn register(&mut self, agent: Arc<dyn Agent>) -> FlotillaResult<()> {
        let id = agent.id();
        if self.entries.iter().any(|entry| entry.agent.id() == id) {
            return Err(FlotillaError::DuplicateAgent(id.to_string()));
        }
        debug!(agent = %id, "agent registered");
        self.entries.push(AgentEntry {
            agent,
            queue: VecDeque::new(),
        });
        Ok(())
    }

    /// Starts every registered agent, in registration order.
    ///
    /// Fails fast with [`FlotillaError::Startup`] on the first agent that
    /// refuses to start; agents started before the failure remain started
    /// (the caller stops the pool to clean up).
    pub async fn start_all(&mut self) -> FlotillaResult<()> {
        for entry in &self.entries {
            entry.agent.start().await.map_err(|e| {
                FlotillaError::Startup(format!("agent {}: {e}", entry.agent.id()))
            })?;
        }
        self.started = true;
        Ok(())
    }

    /// Signals every agent to stop, in registration order.
    ///
    /// Individual stop failures are logged and swallowed so one stuck
    /// agent cannot prevent the rest from stopping. Idempotent.
    pub async fn stop_all(&mut self) {
        for entry in &self.entries {
            if let Err(e) = entry.agent.stop().await {
                warn!(agent = %entry.agent.id(), error = %e, "agent failed to stop");
            }
        }
        self.started = false;
    }

    /// Whether the last lifecycle transition was a successful start.
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Number of registered agents.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the pool has no agents.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Count of agents whose status is not [`AgentStatus::Stopped`].
    pub fn active_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.agent.status() != AgentStatus::Stopped)
            .count()
    }

    /// Per-agent status/queue rows, in registration order.
    pub fn snapshots(&self) -> Vec<AgentSnapshot> {
        self.entries
            .iter()
            .map(|entry| AgentSnapshot {
                id: entry.agent.id().to_string(),
                status: entry.agent.status(),
                queued_jobs: entry.queue.len(),
            })
            .collect()
    }

    pub(crate) fn agent(&self, index: usize) -> Arc<dyn Agent> {
        Arc::clone(&self.entries[index].agent)
    }

    pub(crate) fn status(&self, index: usize) -> AgentStatus {
        self.entries[index].agent.status()
    }

    pub(crate) fn queue_len(&self, index: usize) -> usize {
        self.entries[index].queue.len()
    }

    pub(crate) fn bindings(&self, index: usize) -> Vec<Binding> {
        self.entries[index].queue.iter().cloned().collect()
    }

    pub(crate) fn push_binding(&mut self, index: usize, binding: Binding) {
        self.entries[index].queue.push_back(binding);
    }

    pub(crate) fn pop_binding(&mut self, index: usize) -> Option<Binding> {
        self.entries[index].queue.pop_front()
    }

    pub(crate) fn clear_queue(&mut self, index: usize) {
        self.entries[index].queue.clear();
    }
}

impl Default for AgentPool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use flotilla_core::JobResult;
    use parking_lot::RwLock;
    use std::time::Duration;

    struct StubAgent {
        id: String,
        status: RwLock<AgentStatus>,
        fail_start: bool,
        fail_stop: bool,
    }

    impl StubAgent {
        fn new(id: &str) -> Arc<Self> {
            Arc::new(Self {
                id: id.to_string(),
                status: RwLock::new(AgentStatus::Stopped),
                fail_start: false,
                fail_stop: false,
            })
        }

        fn failing_start(id: &str) -> Arc<Self> {
            Arc::new(Self {
                id: id.to_string(),
                status: RwLock::new(AgentStatus::Stopped),
                fail_start: true,
                fail_stop: false,
            })
        }

        fn failing_stop(id: &str) -> Arc<Self> {
            Arc::new(Self {
                id: id.to_string(),
                status: RwLock::new(AgentStatus::Stopped),
                fail_start: false,
                fail_stop: true,
            })
        }
    }

    #[async_trait]
    impl Agent for StubAgent {
        fn id(&self) -> &str {
            &self.id
        }

        fn status(&self) -> AgentStatus {
            *self.status.read()
        }

        async fn start(&self) -> FlotillaResult<()> {
            if self.fail_start {
                return Err(FlotillaError::Agent("refusing to start".into()));
            }
            *self.status.write() = AgentStatus::Idle;
            Ok(())
        }

        async fn stop(&self) -> FlotillaResult<()> {
            if self.fail_stop {
                return Err(FlotillaError::Agent("stuck".into()));
            }
            *self.status.write() = AgentStatus::Stopped;
            Ok(())
        }

        async fn evaluate_suitability(&self, _job: &Job) -> f64 {
            0.5
        }

        async fn execute_job(&self, _job: &Job) -> FlotillaResult<JobResult> {
            Ok(JobResult::success(serde_json::Value::Null, Duration::ZERO))
        }
    }

    #[test]
    fn test_register_rejects_duplicate_id() {
        let mut pool = AgentPool::new();
        pool.register(StubAgent::new("a")).unwrap();
        let err = pool.register(StubAgent::new("a")).unwrap_err();
        assert!(matches!(err, FlotillaError::DuplicateAgent(_)));
        assert_eq!(pool.len(), 1);
    }

    #[tokio::test]
    async fn test_start_all_starts_in_order() {
        let mut pool = AgentPool::new();
        let a = StubAgent::new("a");
        let b = StubAgent::new("b");
        pool.register(a.clone()).unwrap();
        pool.register(b.clone()).unwrap();

        pool.start_all().await.unwrap();
        assert!(pool.is_started());
        assert_eq!(a.status(), AgentStatus::Idle);
        assert_eq!(b.status(), AgentStatus::Idle);
        assert_eq!(pool.active_count(), 2);
    }

    #[tokio::test]
    async fn test_start_all_fails_fast_without_rollback() {
        let mut pool = AgentPool::new();
        let a = StubAgent::new("a");
        let bad = StubAgent::failing_start("bad");
        let c = StubAgent::new("c");
        pool.register(a.clone()).unwrap();
        pool.register(bad).unwrap();
        pool.register(c.clone()).unwrap();

        let err = pool.start_all().await.unwrap_err();
        assert!(matches!(err, FlotillaError::Startup(_)));
        assert!(!pool.is_started());
        // Agents before the failure stay started; later ones never started.
        assert_eq!(a.status(), AgentStatus::Idle);
        assert_eq!(c.status(), AgentStatus::Stopped);
    }

    #[tokio::test]
    async fn test_stop_all_tolerates_stuck_agent() {
        let mut pool = AgentPool::new();
        let stuck = StubAgent::failing_stop("stuck");
        let b = StubAgent::new("b");
        pool.register(stuck).unwrap();
        pool.register(b.clone()).unwrap();

        pool.start_all().await.unwrap();
        pool.stop_all().await;
        assert!(!pool.is_started());
        // The stuck agent did not prevent the second from stopping.
        assert_eq!(b.status(), AgentStatus::Stopped);
    }

    #[tokio::test]
    async fn test_stop_all_idempotent() {
        let mut pool = AgentPool::new();
        pool.register(StubAgent::new("a")).unwrap();
        pool.start_all().await.unwrap();
        pool.stop_all().await;
        pool.stop_all().await;
        assert!(!pool.is_started());
        assert_eq!(pool.active_count(), 0);
    }

    #[test]
    fn test_queue_operations() {
        let mut pool = AgentPool::new();
        pool.register(StubAgent::new("a")).unwrap();

        assert_eq!(pool.queue_len(0), 0);
        pool.push_binding(
            0,
            Binding {
                index: 3,
                job: Job::new("queued"),
            },
        );
        assert_eq!(pool.queue_len(0), 1);

        let binding = pool.pop_binding(0).unwrap();
        assert_eq!(binding.index, 3);
        assert_eq!(pool.queue_len(0), 0);
        assert!(pool.pop_binding(0).is_none());
    }

    #[test]
    fn test_snapshots() {
        let mut pool = AgentPool::new();
        pool.register(StubAgent::new("a")).unwrap();
        pool.register(StubAgent::new("b")).unwrap();
        pool.push_binding(
            1,
            Binding {
                index: 0,
                job: Job::new("pending"),
            },
        );

        let rows = pool.snapshots();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, "a");
        assert_eq!(rows[0].queued_jobs, 0);
        assert_eq!(rows[1].queued_jobs, 1);
        assert_eq!(rows[1].status, AgentStatus::Stopped);
    }
}
