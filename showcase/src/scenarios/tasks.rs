use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::{debug, warn};

use super::{Scenario, millis};
use crate::config::{ShowcaseConfig, TaskConfig};
use crate::tasks::{FixedPool, LightweightExecutor, PoolError, TaskTally, lock};
use crate::transcript::Transcript;

/// Fixed OS-thread pool versus one lightweight task per unit
pub struct LightweightTasks;

#[async_trait]
impl Scenario for LightweightTasks {
    fn name(&self) -> &'static str {
        "tasks"
    }

    fn title(&self) -> &'static str {
        "Lightweight tasks versus a fixed thread pool"
    }

    async fn run(&self, config: &ShowcaseConfig, out: &mut Transcript) -> anyhow::Result<()> {
        let tasks = config.tasks.clone();

        out.section(format!(
            "1. Fixed pool of {} OS threads, {} tasks of {} ms",
            tasks.pool_size,
            tasks.task_count,
            millis(tasks.task_delay)
        ));
        let cfg = tasks.clone();
        let run = tokio::task::spawn_blocking(move || run_fixed_pool(&cfg)).await??;
        out.line(format!("Elapsed (fixed pool): {} ms", millis(run.elapsed)));
        report_tally(out, &run);
        out.line("* Note: throughput is capped by the number of OS threads");

        out.section(format!(
            "2. Lightweight tasks on {} carrier threads",
            tasks.carrier_threads
        ));
        let cfg = tasks.clone();
        let run = tokio::task::spawn_blocking(move || run_lightweight(&cfg)).await??;
        out.line(format!("Elapsed (lightweight): {} ms", millis(run.elapsed)));
        report_tally(out, &run);
        out.line("* Note: a sleeping task frees its carrier, so every task sleeps at once");

        out.section(format!(
            "3. Spawning {} units of {} ms",
            tasks.spawn_count,
            millis(tasks.spawn_delay)
        ));
        let cfg = tasks.clone();
        let (os, light) = tokio::task::spawn_blocking(move || spawn_cost(&cfg)).await??;
        out.line(format!("OS threads:        {} ms", millis(os)));
        out.line(format!("Lightweight tasks: {} ms", millis(light)));
        out.line("* Note: lightweight tasks are cheap to create and scale further");
        Ok(())
    }
}

/// Outcome of one executor run
#[derive(Debug)]
pub struct ExecutorRun {
    pub elapsed: Duration,
    pub tally: TaskTally,
}

fn report_tally(out: &mut Transcript, run: &ExecutorRun) {
    out.line(format!(
        "Completed: {}, interrupted: {}",
        run.tally.completed, run.tally.interrupted
    ));
    if let (Some(p50), Some(p99)) = (run.tally.p50(), run.tally.p99()) {
        out.line(format!(
            "Submit-to-finish latency: p50 {} ms, p99 {} ms",
            millis(p50),
            millis(p99)
        ));
    }
}

fn thread_name() -> String {
    thread::current().name().unwrap_or("unnamed").to_string()
}

/// Run the workload on a fixed pool, interrupting whatever is left at the timeout
///
/// Blocks the calling thread.
pub fn run_fixed_pool(cfg: &TaskConfig) -> Result<ExecutorRun, PoolError> {
    let mut pool = FixedPool::new(cfg.pool_size)?;
    let samples = Arc::new(Mutex::new(Vec::with_capacity(cfg.task_count)));
    let start = Instant::now();

    for task_id in 0..cfg.task_count {
        let delay = cfg.task_delay;
        let samples = Arc::clone(&samples);
        let submitted = Instant::now();
        pool.submit(move |interrupt| {
            debug!("Task {} running on {}", task_id, thread_name());
            interrupt.sleep(delay)?;
            lock(&samples).push(submitted.elapsed());
            Ok(())
        })?;
    }

    pool.shutdown();
    let drained = pool.await_termination(cfg.await_timeout);
    let elapsed = start.elapsed();
    if !drained {
        warn!(
            "Fixed pool still busy after {:?}; interrupting remaining tasks",
            cfg.await_timeout
        );
        pool.shutdown_now();
        pool.await_drained(cfg.await_timeout)?;
    }
    let states = pool.states();
    drop(pool);

    let mut tally = TaskTally::from_states(&states);
    tally.samples = std::mem::take(&mut *lock(&samples));
    Ok(ExecutorRun { elapsed, tally })
}

/// Run the workload with one lightweight task per unit
///
/// Blocks the calling thread.
pub fn run_lightweight(cfg: &TaskConfig) -> Result<ExecutorRun, PoolError> {
    let mut executor = LightweightExecutor::new(cfg.carrier_threads)?;
    let samples = Arc::new(Mutex::new(Vec::with_capacity(cfg.task_count)));
    let start = Instant::now();

    for _ in 0..cfg.task_count {
        let delay = cfg.task_delay;
        let samples = Arc::clone(&samples);
        let submitted = Instant::now();
        executor.submit(move |task_id| async move {
            debug!("Task {} running on {}", task_id, thread_name());
            tokio::time::sleep(delay).await;
            lock(&samples).push(submitted.elapsed());
        });
    }

    let states = executor.close();
    let elapsed = start.elapsed();

    let mut tally = TaskTally::from_states(&states);
    tally.samples = std::mem::take(&mut *lock(&samples));
    Ok(ExecutorRun { elapsed, tally })
}

/// Time `spawn_count` OS threads, then as many lightweight tasks
///
/// Blocks the calling thread.
pub fn spawn_cost(cfg: &TaskConfig) -> Result<(Duration, Duration), PoolError> {
    let delay = cfg.spawn_delay;

    let start = Instant::now();
    let mut handles = Vec::with_capacity(cfg.spawn_count);
    for i in 0..cfg.spawn_count {
        let handle = thread::Builder::new()
            .name(format!("os-thread-{}", i))
            .spawn(move || thread::sleep(delay))?;
        handles.push(handle);
    }
    for handle in handles {
        if let Err(panic) = handle.join() {
            std::panic::resume_unwind(panic);
        }
    }
    let os_elapsed = start.elapsed();

    let mut executor = LightweightExecutor::new(cfg.carrier_threads)?;
    let start = Instant::now();
    for _ in 0..cfg.spawn_count {
        executor.submit(move |_| tokio::time::sleep(delay));
    }
    executor.close();
    let light_elapsed = start.elapsed();

    debug!(
        "Spawn cost: {:?} for OS threads, {:?} for lightweight tasks",
        os_elapsed, light_elapsed
    );
    Ok((os_elapsed, light_elapsed))
}
