//! Sequential and parallel batch schedulers.
//!
//! Both disciplines work over the bindings the engine queued on each pool
//! entry, place every result at the input index recorded in its binding,
//! and convert every per-job failure (agent error, panic, stop race) into
//! a failed [`JobResult`] instead of aborting the batch.

use crate::pool::AgentPool;
use flotilla_agent::Agent;
use flotilla_core::{Job, JobResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{RwLock, Semaphore};
use tracing::{debug, error};

const STOPPED_MSG: &str = "orchestrator stopped before the job could run";

/// Runs one job on one agent, collecting any failure into the result.
///
/// The job runs in its own task so a panicking agent takes down only this
/// job. The orchestrator's own wall-clock measurement overwrites whatever
/// execution time the agent reported.
async fn run_one(agent: Arc<dyn Agent>, job: Job) -> JobResult {
    let started = Instant::now();
    let job_id = job.id;
    let handle = tokio::spawn(async move { agent.execute_job(&job).await });
    match handle.await {
        Ok(Ok(result)) => result.normalized(started.elapsed()),
        Ok(Err(e)) => {
            debug!(job = %job_id, error = %e, "job failed");
            JobResult::failure(e.to_string(), started.elapsed())
        }
        Err(join_err) => {
            error!(job = %job_id, error = %join_err, "job execution panicked");
            JobResult::failure(
                format!("job execution panicked: {join_err}"),
                started.elapsed(),
            )
        }
    }
}

/// Sequential discipline: agents in registration order, each agent's
/// bindings in assignment order, one job at a time anywhere in the system.
pub(crate) async fn run_sequential(
    pool: &Arc<RwLock<AgentPool>>,
    running: &Arc<AtomicBool>,
    results: &mut [Option<JobResult>],
) {
    let agent_count = pool.read().await.len();
    for agent_index in 0..agent_count {
        loop {
            let (agent, binding) = {
                let pool = pool.read().await;
                match pool.bindings(agent_index).into_iter().next() {
                    Some(binding) => (pool.agent(agent_index), binding),
                    None => break,
                }
            };

            let result = if running.load(Ordering::SeqCst) {
                run_one(agent, binding.job).await
            } else {
                JobResult::failure(STOPPED_MSG, Duration::ZERO)
            };
            results[binding.index] = Some(result);
            pool.write().await.pop_binding(agent_index);
        }
    }
}

/// Parallel discipline: one task per agent drains that agent's bindings in
/// order (an agent never runs two jobs at once) while a global semaphore
/// caps how many jobs execute simultaneously across all agents.
pub(crate) async fn run_parallel(
    pool: &Arc<RwLock<AgentPool>>,
    running: &Arc<AtomicBool>,
    cap: usize,
    results: Vec<Option<JobResult>>,
) -> Vec<Option<JobResult>> {
    let results = Arc::new(parking_lot::Mutex::new(results));
    let semaphore = Arc::new(Semaphore::new(cap));

    let work: Vec<(usize, Arc<dyn Agent>, Vec<crate::pool::Binding>)> = {
        let pool = pool.read().await;
        (0..pool.len())
            .filter(|&i| pool.queue_len(i) > 0)
            .map(|i| (i, pool.agent(i), pool.bindings(i)))
            .collect()
    };

    let mut handles = Vec::with_capacity(work.len());
    for (agent_index, agent, bindings) in work {
        let indices: Vec<usize> = bindings.iter().map(|b| b.index).collect();
        let results = Arc::clone(&results);
        let semaphore = Arc::clone(&semaphore);
        let pool = Arc::clone(pool);
        let running = Arc::clone(running);

        let handle = tokio::spawn(async move {
            for binding in bindings {
                let result = if !running.load(Ordering::SeqCst) {
                    JobResult::failure(STOPPED_MSG, Duration::ZERO)
                } else {
                    match semaphore.acquire().await {
                        Ok(_permit) => run_one(Arc::clone(&agent), binding.job).await,
                        Err(_) => JobResult::failure("concurrency limiter closed", Duration::ZERO),
                    }
                };
                results.lock()[binding.index] = Some(result);
                pool.write().await.pop_binding(agent_index);
            }
        });
        handles.push((agent_index, indices, handle));
    }

    for (agent_index, indices, handle) in handles {
        if let Err(join_err) = handle.await {
            error!(error = %join_err, "agent drain task aborted");
            {
                let mut results = results.lock();
                for index in indices {
                    if results[index].is_none() {
                        results[index] = Some(JobResult::failure(
                            format!("agent drain task aborted: {join_err}"),
                            Duration::ZERO,
                        ));
                    }
                }
            }
            pool.write().await.clear_queue(agent_index);
        }
    }

    Arc::try_unwrap(results)
        .map(parking_lot::Mutex::into_inner)
        .unwrap_or_else(|shared| shared.lock().clone())
}
