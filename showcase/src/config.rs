//! Showcase configuration
//!
//! Configuration is loaded from environment variables. Every value has an
//! in-source default matching the reference workloads.

use std::env;
use std::time::Duration;

/// Main showcase configuration
#[derive(Debug, Clone)]
pub struct ShowcaseConfig {
    /// Task workload configuration
    pub tasks: TaskConfig,

    /// Simulated work delay used by the scoped-binding scenario
    pub work_delay: Duration,

    /// Delays of the two succeeding children in the structured-group scenario
    pub group_delays: (Duration, Duration),

    /// Restrict the run to these scenario names (declaration order is kept)
    pub only: Option<Vec<String>>,

    /// Print the JSON run summary after the last scenario
    pub json_summary: bool,

    /// Echo transcript lines to stdout as they are written
    pub echo: bool,
}

/// Task-related configuration
#[derive(Debug, Clone)]
pub struct TaskConfig {
    /// Number of workers in the fixed pool
    pub pool_size: usize,
    /// Number of tasks submitted to each executor
    pub task_count: usize,
    /// Simulated blocking delay of each task
    pub task_delay: Duration,
    /// How long the fixed pool is given to drain before it is interrupted
    pub await_timeout: Duration,
    /// Carrier threads backing the lightweight executor
    pub carrier_threads: usize,
    /// Number of threads / tasks in the spawn-cost comparison
    pub spawn_count: usize,
    /// Delay of each unit in the spawn-cost comparison
    pub spawn_delay: Duration,
}

impl Default for ShowcaseConfig {
    fn default() -> Self {
        Self {
            tasks: TaskConfig::default(),
            work_delay: Duration::from_millis(100),
            group_delays: (Duration::from_millis(500), Duration::from_millis(300)),
            only: None,
            json_summary: false,
            echo: true,
        }
    }
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            pool_size: 10,
            task_count: 100,
            task_delay: Duration::from_millis(500),
            await_timeout: Duration::from_secs(10),
            carrier_threads: 4,
            spawn_count: 1000,
            spawn_delay: Duration::from_millis(10),
        }
    }
}

fn parse_flag(val: &str) -> bool {
    val.to_lowercase() == "true" || val == "1"
}

impl ShowcaseConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        // Task config
        if let Ok(val) = env::var("SHOWCASE_POOL_SIZE")
            && let Ok(v) = val.parse::<usize>()
            && v > 0
        {
            config.tasks.pool_size = v;
        }
        if let Ok(val) = env::var("SHOWCASE_TASK_COUNT")
            && let Ok(v) = val.parse()
        {
            config.tasks.task_count = v;
        }
        if let Ok(val) = env::var("SHOWCASE_TASK_DELAY_MS")
            && let Ok(ms) = val.parse::<u64>()
        {
            config.tasks.task_delay = Duration::from_millis(ms);
        }
        if let Ok(val) = env::var("SHOWCASE_AWAIT_TIMEOUT_SECS")
            && let Ok(secs) = val.parse::<u64>()
        {
            config.tasks.await_timeout = Duration::from_secs(secs);
        }
        if let Ok(val) = env::var("SHOWCASE_CARRIER_THREADS")
            && let Ok(v) = val.parse::<usize>()
            && v > 0
        {
            config.tasks.carrier_threads = v;
        }
        if let Ok(val) = env::var("SHOWCASE_SPAWN_COUNT")
            && let Ok(v) = val.parse()
        {
            config.tasks.spawn_count = v;
        }
        if let Ok(val) = env::var("SHOWCASE_SPAWN_DELAY_MS")
            && let Ok(ms) = val.parse::<u64>()
        {
            config.tasks.spawn_delay = Duration::from_millis(ms);
        }

        if let Ok(val) = env::var("SHOWCASE_WORK_DELAY_MS")
            && let Ok(ms) = val.parse::<u64>()
        {
            config.work_delay = Duration::from_millis(ms);
        }

        // Runner config
        if let Ok(val) = env::var("SHOWCASE_ONLY")
            && !val.trim().is_empty()
        {
            config.only = Some(
                val.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            );
        }
        if let Ok(val) = env::var("SHOWCASE_JSON_SUMMARY") {
            config.json_summary = parse_flag(&val);
        }
        if let Ok(val) = env::var("SHOWCASE_ECHO") {
            config.echo = parse_flag(&val);
        }

        config
    }
}
