use crate::pool::AgentPool;
use flotilla_agent::AgentStatus;
use flotilla_core::{FlotillaError, FlotillaResult, Job, JobAssignmentType};
use tracing::debug;

/// Binds jobs to agents according to the configured strategy.
///
/// Selection is deterministic: suitability picks the strictly highest
/// score with ties broken by lowest queue length then registration order;
/// round-robin keeps a cursor across batches; load-based picks the
/// shortest queue with ties broken by registration order.
pub struct Assigner {
    strategy: JobAssignmentType,
    min_suitability: f64,
    cursor: usize,
}

impl Assigner {
    /// Creates an assigner for the given strategy and suitability floor.
    pub fn new(strategy: JobAssignmentType, min_suitability: f64) -> Self {
        Self {
            strategy,
            min_suitability,
            cursor: 0,
        }
    }

    /// Selects an agent (by pool index) for the job.
    ///
    /// The caller appends the binding to the chosen agent's queue; this
    /// method only selects.
    pub async fn assign(&mut self, job: &Job, pool: &AgentPool) -> FlotillaResult<usize> {
        let idle: Vec<usize> = (0..pool.len())
            .filter(|&i| pool.status(i) == AgentStatus::Idle)
            .collect();
        if idle.is_empty() {
            return Err(FlotillaError::NoSuitableAgent(format!(
                "no idle agents for job {}",
                job.id
            )));
        }

        match self.strategy {
            JobAssignmentType::Suitability => self.by_suitability(job, pool, &idle).await,
            JobAssignmentType::RoundRobin => Ok(self.by_round_robin(pool, &idle)),
            JobAssignmentType::LoadBased => Ok(Self::by_load(pool, &idle)),
        }
    }

    async fn by_suitability(
        &self,
        job: &Job,
        pool: &AgentPool,
        idle: &[usize],
    ) -> FlotillaResult<usize> {
        let mut best: Option<(usize, f64)> = None;
        for &index in idle {
            let agent = pool.agent(index);
            let score = agent.evaluate_suitability(job).await.clamp(0.0, 1.0);
            debug!(job = %job.id, agent = %agent.id(), score, "suitability evaluated");

            best = match best {
                None => Some((index, score)),
                Some((best_index, best_score)) => {
                    if score > best_score {
                        Some((index, score))
                    } else if score == best_score
                        && pool.queue_len(index) < pool.queue_len(best_index)
                    {
                        // Equal scores: fewer queued jobs wins; otherwise the
                        // earlier-registered agent keeps the slot.
                        Some((index, score))
                    } else {
                        Some((best_index, best_score))
                    }
                }
            };
        }

        match best {
            Some((index, score)) if score > self.min_suitability => Ok(index),
            Some((_, score)) => Err(FlotillaError::NoSuitableAgent(format!(
                "best score {score:.3} for job {} does not exceed threshold {:.3}",
                job.id, self.min_suitability
            ))),
            None => Err(FlotillaError::NoSuitableAgent(format!(
                "no candidates for job {}",
                job.id
            ))),
        }
    }

    fn by_round_robin(&mut self, pool: &AgentPool, idle: &[usize]) -> usize {
        let n = pool.len();
        // idle is non-empty, so the scan always lands on an idle agent.
        let mut chosen = idle[0];
        for offset in 0..n {
            let candidate = (self.cursor + offset) % n;
            if idle.contains(&candidate) {
                chosen = candidate;
                break;
            }
        }
        self.cursor = (chosen + 1) % n;
        chosen
    }

    fn by_load(pool: &AgentPool, idle: &[usize]) -> usize {
        let mut chosen = idle[0];
        for &candidate in idle {
            if pool.queue_len(candidate) < pool.queue_len(chosen) {
                chosen = candidate;
            }
        }
        chosen
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use flotilla_agent::Agent;
    use flotilla_core::JobResult;
    use std::sync::Arc;
    use std::time::Duration;

    struct ScoredAgent {
        id: String,
        score: f64,
        idle: bool,
    }

    impl ScoredAgent {
        fn new(id: &str, score: f64) -> Arc<Self> {
            Arc::new(Self {
                id: id.to_string(),
                score,
                idle: true,
            })
        }

        fn busy(id: &str, score: f64) -> Arc<Self> {
            Arc::new(Self {
                id: id.to_string(),
                score,
                idle: false,
            })
        }
    }

    #[async_trait]
    impl Agent for ScoredAgent {
        fn id(&self) -> &str {
            &self.id
        }

        fn status(&self) -> AgentStatus {
            if self.idle {
                AgentStatus::Idle
            } else {
                AgentStatus::Busy
            }
        }

        async fn start(&self) -> FlotillaResult<()> {
            Ok(())
        }

        async fn stop(&self) -> FlotillaResult<()> {
            Ok(())
        }

        async fn evaluate_suitability(&self, _job: &Job) -> f64 {
            self.score
        }

        async fn execute_job(&self, _job: &Job) -> FlotillaResult<JobResult> {
            Ok(JobResult::success(serde_json::Value::Null, Duration::ZERO))
        }
    }

    fn pool_of(agents: Vec<Arc<ScoredAgent>>) -> AgentPool {
        let mut pool = AgentPool::new();
        for agent in agents {
            pool.register(agent).unwrap();
        }
        pool
    }

    #[tokio::test]
    async fn test_suitability_picks_highest_score() {
        let pool = pool_of(vec![
            ScoredAgent::new("low", 0.3),
            ScoredAgent::new("high", 0.9),
            ScoredAgent::new("mid", 0.6),
        ]);
        let mut assigner = Assigner::new(JobAssignmentType::Suitability, 0.0);
        let index = assigner.assign(&Job::new("j"), &pool).await.unwrap();
        assert_eq!(index, 1);
    }

    #[tokio::test]
    async fn test_suitability_tie_breaks_by_queue_then_registration() {
        let mut pool = pool_of(vec![
            ScoredAgent::new("first", 0.8),
            ScoredAgent::new("second", 0.8),
        ]);
        let mut assigner = Assigner::new(JobAssignmentType::Suitability, 0.0);

        // Equal scores, equal queues: registration order wins.
        let index = assigner.assign(&Job::new("a"), &pool).await.unwrap();
        assert_eq!(index, 0);

        // Load the first agent; the emptier queue now wins the tie.
        pool.push_binding(
            0,
            crate::pool::Binding {
                index: 0,
                job: Job::new("held"),
            },
        );
        let index = assigner.assign(&Job::new("b"), &pool).await.unwrap();
        assert_eq!(index, 1);
    }

    #[tokio::test]
    async fn test_suitability_skips_busy_agents() {
        let pool = pool_of(vec![
            ScoredAgent::busy("busy", 1.0),
            ScoredAgent::new("idle", 0.2),
        ]);
        let mut assigner = Assigner::new(JobAssignmentType::Suitability, 0.0);
        let index = assigner.assign(&Job::new("j"), &pool).await.unwrap();
        assert_eq!(index, 1);
    }

    #[tokio::test]
    async fn test_suitability_threshold_rejects() {
        let pool = pool_of(vec![ScoredAgent::new("weak", 0.2)]);
        let mut assigner = Assigner::new(JobAssignmentType::Suitability, 0.5);
        let err = assigner.assign(&Job::new("j"), &pool).await.unwrap_err();
        assert!(matches!(err, FlotillaError::NoSuitableAgent(_)));
    }

    #[tokio::test]
    async fn test_zero_scores_rejected_at_default_threshold() {
        let pool = pool_of(vec![ScoredAgent::new("zero", 0.0)]);
        let mut assigner = Assigner::new(JobAssignmentType::Suitability, 0.0);
        assert!(assigner.assign(&Job::new("j"), &pool).await.is_err());
    }

    #[tokio::test]
    async fn test_no_idle_agents() {
        let pool = pool_of(vec![ScoredAgent::busy("busy", 0.9)]);
        let mut assigner = Assigner::new(JobAssignmentType::Suitability, 0.0);
        let err = assigner.assign(&Job::new("j"), &pool).await.unwrap_err();
        assert!(matches!(err, FlotillaError::NoSuitableAgent(_)));
    }

    #[tokio::test]
    async fn test_round_robin_cycles_registration_order() {
        let pool = pool_of(vec![
            ScoredAgent::new("a", 0.1),
            ScoredAgent::new("b", 0.9),
            ScoredAgent::new("c", 0.5),
        ]);
        let mut assigner = Assigner::new(JobAssignmentType::RoundRobin, 0.0);

        let mut picks = Vec::new();
        for i in 0..5 {
            picks.push(assigner.assign(&Job::new(format!("j{i}")), &pool).await.unwrap());
        }
        assert_eq!(picks, vec![0, 1, 2, 0, 1]);
    }

    #[tokio::test]
    async fn test_round_robin_skips_busy() {
        let pool = pool_of(vec![
            ScoredAgent::new("a", 0.5),
            ScoredAgent::busy("b", 0.5),
            ScoredAgent::new("c", 0.5),
        ]);
        let mut assigner = Assigner::new(JobAssignmentType::RoundRobin, 0.0);

        let first = assigner.assign(&Job::new("1"), &pool).await.unwrap();
        let second = assigner.assign(&Job::new("2"), &pool).await.unwrap();
        let third = assigner.assign(&Job::new("3"), &pool).await.unwrap();
        assert_eq!((first, second, third), (0, 2, 0));
    }

    #[tokio::test]
    async fn test_load_based_picks_shortest_queue() {
        let mut pool = pool_of(vec![
            ScoredAgent::new("a", 0.5),
            ScoredAgent::new("b", 0.5),
        ]);
        for i in 0..2 {
            pool.push_binding(
                0,
                crate::pool::Binding {
                    index: i,
                    job: Job::new("held"),
                },
            );
        }

        let mut assigner = Assigner::new(JobAssignmentType::LoadBased, 0.0);
        let index = assigner.assign(&Job::new("j"), &pool).await.unwrap();
        assert_eq!(index, 1);
    }

    #[tokio::test]
    async fn test_load_based_tie_breaks_by_registration() {
        let pool = pool_of(vec![
            ScoredAgent::new("a", 0.5),
            ScoredAgent::new("b", 0.5),
        ]);
        let mut assigner = Assigner::new(JobAssignmentType::LoadBased, 0.0);
        let index = assigner.assign(&Job::new("j"), &pool).await.unwrap();
        assert_eq!(index, 0);
    }
}
