use crate::assign::Assigner;
use crate::executor;
use crate::metrics::{AgentSnapshot, OrchestratorMetrics};
use crate::pool::{AgentPool, Binding};
use flotilla_agent::{Agent, HandlerFactory, LlmConfig, ToolSpec, WorkerAgent};
use flotilla_core::{
    FlotillaError, FlotillaResult, Job, JobResult, OrchestratorConfig, ProcessType,
};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

/// The orchestration engine.
///
/// Owns the agent pool, binds submitted jobs to agents, runs batches under
/// the configured discipline, and reports health metrics. Independently
/// constructible: multiple orchestrators may coexist in one process.
pub struct Orchestrator {
    config: OrchestratorConfig,
    pool: Arc<RwLock<AgentPool>>,
    assigner: Mutex<Assigner>,
    /// Serializes batches: one `execute` call owns the pool queues at a time.
    batch: Mutex<()>,
    running: Arc<AtomicBool>,
    total_jobs: AtomicU64,
    handler_factory: Option<HandlerFactory>,
}

impl Orchestrator {
    /// Creates an orchestrator with the given configuration and no agents.
    pub fn new(config: OrchestratorConfig) -> Self {
        let assigner = Assigner::new(config.job_assignment_type, config.min_suitability);
        Self {
            config,
            pool: Arc::new(RwLock::new(AgentPool::new())),
            assigner: Mutex::new(assigner),
            batch: Mutex::new(()),
            running: Arc::new(AtomicBool::new(false)),
            total_jobs: AtomicU64::new(0),
            handler_factory: None,
        }
    }

    /// Injects the factory [`add_agent`](Self::add_agent) uses to build job
    /// handlers for constructed agents.
    pub fn with_handler_factory(mut self, factory: HandlerFactory) -> Self {
        self.handler_factory = Some(factory);
        self
    }

    /// The configuration this orchestrator was built with.
    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Constructs a [`WorkerAgent`] and registers it into the pool.
    ///
    /// Fails with [`FlotillaError::Config`] on an invalid `llm_config` or
    /// when no handler factory was configured, and with
    /// [`FlotillaError::DuplicateAgent`] on an id collision.
    pub async fn add_agent(
        &self,
        role: impl Into<String>,
        goal: impl Into<String>,
        tools: Vec<ToolSpec>,
        llm_config: LlmConfig,
    ) -> FlotillaResult<Arc<WorkerAgent>> {
        let factory = self.handler_factory.as_ref().ok_or_else(|| {
            FlotillaError::Config("no job handler factory configured".into())
        })?;
        llm_config.validate()?;
        let handler = factory(&llm_config);

        let agent = Arc::new(
            WorkerAgent::builder(role)
                .goal(goal)
                .tools(tools)
                .llm_config(llm_config)
                .handler(handler)
                .memory(self.config.memory_enabled)
                .build()?,
        );
        self.register_agent(agent.clone() as Arc<dyn Agent>).await?;
        Ok(agent)
    }

    /// Registers an externally constructed agent.
    pub async fn register_agent(&self, agent: Arc<dyn Agent>) -> FlotillaResult<()> {
        self.pool.write().await.register(agent)
    }

    /// Starts every registered agent, in registration order. Idempotent.
    ///
    /// On failure the orchestrator stays stopped but agents started before
    /// the failing one remain started; call [`stop`](Self::stop) to clean
    /// up.
    pub async fn start(&self) -> FlotillaResult<()> {
        if self.running.load(Ordering::SeqCst) {
            return Ok(());
        }
        info!(orchestrator = %self.config.name, "starting agents");
        self.pool.write().await.start_all().await?;
        self.running.store(true, Ordering::SeqCst);
        Ok(())
    }

    /// Signals every agent to stop, tolerating individual failures.
    /// Idempotent; jobs already executing finish naturally, and a batch in
    /// flight still returns a fully populated result list.
    pub async fn stop(&self) {
        let was_running = self.running.swap(false, Ordering::SeqCst);
        self.pool.write().await.stop_all().await;
        if was_running {
            info!(orchestrator = %self.config.name, "stopped");
        }
    }

    /// Executes a batch of jobs and returns one result per job, in
    /// submission order, regardless of discipline or completion order.
    ///
    /// Fails only with [`FlotillaError::NotStarted`]; every per-job
    /// failure (assignment or execution) is reported in that job's slot.
    pub async fn execute(&self, jobs: Vec<Job>) -> FlotillaResult<Vec<JobResult>> {
        if !self.running.load(Ordering::SeqCst) {
            return Err(FlotillaError::NotStarted);
        }
        let _batch = self.batch.lock().await;

        let batch_len = jobs.len();
        self.total_jobs.fetch_add(batch_len as u64, Ordering::SeqCst);
        info!(
            orchestrator = %self.config.name,
            jobs = batch_len,
            mode = ?self.config.process_type,
            "executing batch"
        );
        if batch_len == 0 {
            return Ok(Vec::new());
        }

        let started = Instant::now();
        let mut results: Vec<Option<JobResult>> = vec![None; batch_len];

        // Bind the whole batch up front, recording each job's input index.
        // A job that cannot be assigned fails in place; the rest proceed.
        {
            let mut assigner = self.assigner.lock().await;
            let mut pool = self.pool.write().await;
            for (index, job) in jobs.into_iter().enumerate() {
                match assigner.assign(&job, &pool).await {
                    Ok(agent_index) => pool.push_binding(agent_index, Binding { index, job }),
                    Err(e) => {
                        warn!(job_index = index, error = %e, "assignment failed");
                        results[index] = Some(JobResult::failure(e.to_string(), Duration::ZERO));
                    }
                }
            }
        }

        let mut results = match self.config.process_type {
            ProcessType::Sequential => {
                executor::run_sequential(&self.pool, &self.running, &mut results).await;
                results
            }
            ProcessType::Parallel => {
                let cap = self.config.effective_cap(batch_len);
                executor::run_parallel(&self.pool, &self.running, cap, results).await
            }
        };

        let completed: Vec<JobResult> = results
            .iter_mut()
            .map(|slot| {
                slot.take().unwrap_or_else(|| {
                    JobResult::failure("job produced no result", Duration::ZERO)
                })
            })
            .collect();

        info!(
            orchestrator = %self.config.name,
            jobs = batch_len,
            failed = completed.iter().filter(|r| !r.success).count(),
            duration_ms = started.elapsed().as_millis() as u64,
            "batch complete"
        );
        Ok(completed)
    }

    /// Point-in-time health snapshot. Read-only; safe to call concurrently
    /// with in-flight batches and never blocked by job execution.
    pub async fn get_metrics(&self) -> OrchestratorMetrics {
        let active_agents = self.pool.read().await.active_count();
        OrchestratorMetrics {
            active_agents,
            total_jobs: self.total_jobs.load(Ordering::SeqCst),
            is_running: self.running.load(Ordering::SeqCst),
        }
    }

    /// Per-agent status and queue-depth rows, in registration order.
    pub async fn agent_snapshots(&self) -> Vec<AgentSnapshot> {
        self.pool.read().await.snapshots()
    }
}
