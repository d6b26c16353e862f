use flotilla_agent::AgentStatus;
use serde::{Deserialize, Serialize};

/// Point-in-time health snapshot of an orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestratorMetrics {
    /// Count of registered agents whose status is not `stopped`.
    pub active_agents: usize,
    /// Cumulative count of jobs ever submitted to this orchestrator,
    /// including failed ones. Monotonic.
    pub total_jobs: u64,
    /// Whether the orchestrator is between a successful `start` and the
    /// next `stop`.
    pub is_running: bool,
}

impl OrchestratorMetrics {
    /// Serializes the snapshot for dashboards.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "active_agents": self.active_agents,
            "total_jobs": self.total_jobs,
            "is_running": self.is_running,
        })
    }
}

/// Per-agent row of a pool snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    /// Agent id.
    pub id: String,
    /// Current status.
    pub status: AgentStatus,
    /// Jobs currently queued on the agent.
    pub queued_jobs: usize,
}
