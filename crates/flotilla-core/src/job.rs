use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use uuid::Uuid;

/// Priority of a job, used as a hint to assignment (never a correctness
/// requirement).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum JobPriority {
    /// Background work.
    Low,
    /// The default.
    #[default]
    Normal,
    /// Time-sensitive work.
    High,
    /// Drop-everything work.
    Urgent,
}

/// One unit of work submitted to the orchestrator.
///
/// Jobs are immutable after submission: the orchestrator only ever reads
/// them, and exactly one [`JobResult`] is produced per submitted job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// Unique identifier for this job.
    pub id: Uuid,
    /// Human-readable description of the work.
    pub description: String,
    /// Assignment hint.
    #[serde(default)]
    pub priority: JobPriority,
    /// Opaque payload forwarded to the executing agent. A `"type"` key, if
    /// present, participates in suitability scoring.
    #[serde(default)]
    pub payload: serde_json::Value,
    /// UTC timestamp of when the job was created.
    pub created_at: DateTime<Utc>,
}

impl Job {
    /// Creates a new job with the given description, normal priority, and
    /// an empty payload.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            description: description.into(),
            priority: JobPriority::default(),
            payload: serde_json::Value::Null,
            created_at: Utc::now(),
        }
    }

    /// Sets the priority.
    pub fn with_priority(mut self, priority: JobPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Attaches an opaque payload.
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    /// The payload's `"type"` field, when the payload is an object carrying
    /// one.
    pub fn payload_type(&self) -> Option<&str> {
        self.payload.get("type").and_then(serde_json::Value::as_str)
    }
}

/// The outcome record produced for exactly one [`Job`].
///
/// Invariant: `success == true` iff `error.is_none()`, and output is only
/// present on success. The constructors make violating states
/// unrepresentable; orchestrator code never builds this struct literally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResult {
    /// Whether the job ran to completion.
    pub success: bool,
    /// Agent-produced output, present iff `success`.
    pub output: Option<serde_json::Value>,
    /// Failure message, present iff not `success`.
    pub error: Option<String>,
    /// Wall-clock time spent executing the job.
    pub execution_time: Duration,
    /// Auxiliary key-value data attached by the agent or the orchestrator.
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl JobResult {
    /// Creates a successful result.
    pub fn success(output: serde_json::Value, execution_time: Duration) -> Self {
        Self {
            success: true,
            output: Some(output),
            error: None,
            execution_time,
            metadata: HashMap::new(),
        }
    }

    /// Creates a failed result.
    pub fn failure(error: impl Into<String>, execution_time: Duration) -> Self {
        Self {
            success: false,
            output: None,
            error: Some(error.into()),
            execution_time,
            metadata: HashMap::new(),
        }
    }

    /// Attaches a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Re-establishes the success/error invariant on a result produced
    /// outside this crate (an agent implementation may have built it by
    /// hand). Also overwrites `execution_time` with the orchestrator's own
    /// measurement.
    pub fn normalized(mut self, execution_time: Duration) -> Self {
        self.execution_time = execution_time;
        if self.success {
            self.error = None;
        } else {
            if self.error.is_none() {
                self.error = Some("agent reported failure without a message".to_string());
            }
            self.output = None;
        }
        self
    }
}
