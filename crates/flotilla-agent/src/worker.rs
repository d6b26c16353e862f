use crate::config::LlmConfig;
use crate::handler::JobHandler;
use crate::tool::ToolSpec;
use crate::{Agent, AgentStatus};
use async_trait::async_trait;
use flotilla_core::{FlotillaError, FlotillaResult, Job, JobResult};
use parking_lot::{Mutex, RwLock};
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};
use uuid::Uuid;

/// How many completed jobs an agent remembers when memory is enabled.
const MEMORY_CAPACITY: usize = 64;

/// One remembered job outcome, used as cross-job context.
#[derive(Debug, Clone)]
pub struct MemoryRecord {
    /// The job that was executed.
    pub job_id: Uuid,
    /// Its description at execution time.
    pub description: String,
    /// Whether it succeeded.
    pub success: bool,
}

/// The production agent implementation.
///
/// Holds a descriptive profile (role, goal, description, tools), a
/// validated [`LlmConfig`], and the [`JobHandler`] that performs the actual
/// work. Suitability is scored from lexical overlap between a job and the
/// agent's profile, tool/payload-type matches, and remembered successes.
pub struct WorkerAgent {
    id: String,
    role: String,
    goal: String,
    description: String,
    tools: Vec<ToolSpec>,
    llm_config: LlmConfig,
    handler: Arc<dyn JobHandler>,
    status: RwLock<AgentStatus>,
    memory: Option<Mutex<VecDeque<MemoryRecord>>>,
    profile_tokens: HashSet<String>,
}

impl std::fmt::Debug for WorkerAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerAgent")
            .field("id", &self.id)
            .field("role", &self.role)
            .field("goal", &self.goal)
            .field("description", &self.description)
            .field("tools", &self.tools)
            .field("llm_config", &self.llm_config)
            .field("handler", &"<dyn JobHandler>")
            .field("status", &self.status)
            .field("memory", &self.memory)
            .field("profile_tokens", &self.profile_tokens)
            .finish()
    }
}

impl WorkerAgent {
    /// Starts building an agent for the given role.
    pub fn builder(role: impl Into<String>) -> WorkerAgentBuilder {
        WorkerAgentBuilder::new(role)
    }

    /// The agent's role title.
    pub fn role(&self) -> &str {
        &self.role
    }

    /// The agent's goal statement.
    pub fn goal(&self) -> &str {
        &self.goal
    }

    /// The agent's free-form description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The registered tools.
    pub fn tools(&self) -> &[ToolSpec] {
        &self.tools
    }

    /// The validated model config this agent was built with.
    pub fn llm_config(&self) -> &LlmConfig {
        &self.llm_config
    }

    /// Remembered job outcomes, newest last. Empty when memory is disabled.
    pub fn history(&self) -> Vec<MemoryRecord> {
        match &self.memory {
            Some(memory) => memory.lock().iter().cloned().collect(),
            None => Vec::new(),
        }
    }

    fn remember(&self, job: &Job, success: bool) {
        let Some(memory) = &self.memory else {
            return;
        };
        let mut memory = memory.lock();
        if memory.len() == MEMORY_CAPACITY {
            memory.pop_front();
        }
        memory.push_back(MemoryRecord {
            job_id: job.id,
            description: job.description.clone(),
            success,
        });
    }

    fn remembers_similar_success(&self, job_tokens: &HashSet<String>) -> bool {
        let Some(memory) = &self.memory else {
            return false;
        };
        memory.lock().iter().any(|record| {
            record.success && tokenize(&record.description).intersection(job_tokens).count() > 0
        })
    }
}

#[async_trait]
impl Agent for WorkerAgent {
    fn id(&self) -> &str {
        &self.id
    }

    fn status(&self) -> AgentStatus {
        *self.status.read()
    }

    async fn start(&self) -> FlotillaResult<()> {
        let mut status = self.status.write();
        if *status == AgentStatus::Stopped {
            *status = AgentStatus::Idle;
            debug!(agent = %self.id, "agent started");
        }
        Ok(())
    }

    async fn stop(&self) -> FlotillaResult<()> {
        *self.status.write() = AgentStatus::Stopped;
        debug!(agent = %self.id, "agent stopped");
        Ok(())
    }

    async fn evaluate_suitability(&self, job: &Job) -> f64 {
        if self.status() == AgentStatus::Stopped {
            return 0.0;
        }

        let job_tokens = tokenize(&job.description);
        let overlap = if job_tokens.is_empty() {
            0.0
        } else {
            let shared = job_tokens.intersection(&self.profile_tokens).count();
            shared as f64 / job_tokens.len() as f64
        };

        // Any idle agent qualifies at the default threshold; profile and
        // tool matches separate specialists from generalists.
        let mut score = 0.35 + 0.4 * overlap;

        if let Some(payload_type) = job.payload_type() {
            let type_tokens = tokenize(payload_type);
            let tool_match = self.tools.iter().any(|tool| {
                tokenize(&tool.name).intersection(&type_tokens).count() > 0
            });
            if tool_match {
                score += 0.2;
            }
        }

        if self.remembers_similar_success(&job_tokens) {
            score += 0.05;
        }

        score.clamp(0.0, 1.0)
    }

    async fn execute_job(&self, job: &Job) -> FlotillaResult<JobResult> {
        let started = Instant::now();
        {
            let mut status = self.status.write();
            if *status == AgentStatus::Stopped {
                return Err(FlotillaError::Agent(format!(
                    "agent {} is stopped",
                    self.id
                )));
            }
            *status = AgentStatus::Busy;
        }
        // Returns the agent to idle even if the handler panics.
        let _busy = BusyGuard {
            status: &self.status,
        };

        debug!(agent = %self.id, job = %job.id, "executing job");
        let outcome = self.handler.handle(job).await;
        let took = started.elapsed();

        let result = match outcome {
            Ok(output) => JobResult::success(output, took),
            Err(e) => {
                warn!(agent = %self.id, job = %job.id, error = %e, "job handler failed");
                JobResult::failure(e.to_string(), took)
            }
        };
        let result = result.with_metadata("agent_id", serde_json::Value::String(self.id.clone()));

        self.remember(job, result.success);
        Ok(result)
    }
}

struct BusyGuard<'a> {
    status: &'a RwLock<AgentStatus>,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        let mut status = self.status.write();
        // A stop() that landed mid-job wins over the idle reset.
        if *status == AgentStatus::Busy {
            *status = AgentStatus::Idle;
        }
    }
}

/// Builder for [`WorkerAgent`].
pub struct WorkerAgentBuilder {
    id: Option<String>,
    role: String,
    goal: String,
    description: String,
    tools: Vec<ToolSpec>,
    llm_config: Option<LlmConfig>,
    handler: Option<Arc<dyn JobHandler>>,
    memory_enabled: bool,
}

impl WorkerAgentBuilder {
    fn new(role: impl Into<String>) -> Self {
        Self {
            id: None,
            role: role.into(),
            goal: String::new(),
            description: String::new(),
            tools: Vec::new(),
            llm_config: None,
            handler: None,
            memory_enabled: true,
        }
    }

    /// Overrides the generated agent id.
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets the goal statement.
    pub fn goal(mut self, goal: impl Into<String>) -> Self {
        self.goal = goal.into();
        self
    }

    /// Sets the free-form description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Registers the agent's tools.
    pub fn tools(mut self, tools: Vec<ToolSpec>) -> Self {
        self.tools = tools;
        self
    }

    /// Sets the model config. Validated in [`build`](Self::build).
    pub fn llm_config(mut self, config: LlmConfig) -> Self {
        self.llm_config = Some(config);
        self
    }

    /// Sets the job handler.
    pub fn handler(mut self, handler: Arc<dyn JobHandler>) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Enables or disables cross-job memory.
    pub fn memory(mut self, enabled: bool) -> Self {
        self.memory_enabled = enabled;
        self
    }

    /// Validates the config and produces the agent, initially stopped.
    pub fn build(self) -> FlotillaResult<WorkerAgent> {
        let llm_config = self
            .llm_config
            .ok_or_else(|| FlotillaError::Config("agent requires an llm_config".into()))?;
        llm_config.validate()?;

        let handler = self
            .handler
            .ok_or_else(|| FlotillaError::Config("agent requires a job handler".into()))?;

        let id = self.id.unwrap_or_else(|| {
            let suffix = Uuid::new_v4().simple().to_string();
            format!("{}-{}", self.role, &suffix[..8])
        });

        let mut profile_tokens = tokenize(&self.role);
        profile_tokens.extend(tokenize(&self.goal));
        profile_tokens.extend(tokenize(&self.description));

        Ok(WorkerAgent {
            id,
            role: self.role,
            goal: self.goal,
            description: self.description,
            tools: self.tools,
            llm_config,
            handler,
            status: RwLock::new(AgentStatus::Stopped),
            memory: self.memory_enabled.then(|| Mutex::new(VecDeque::new())),
            profile_tokens,
        })
    }
}

fn tokenize(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| token.len() > 2)
        .map(str::to_string)
        .collect()
}
