//! Common Test Utilities for Integration Tests
//!
//! Shared helpers used across integration test modules.

#![allow(dead_code)]

use feature_showcase::{ShowcaseConfig, TaskConfig};
use std::time::Duration;

/// Task workload small enough to keep the suite fast
pub fn fast_task_config() -> TaskConfig {
    TaskConfig {
        pool_size: 2,
        task_count: 6,
        task_delay: Duration::from_millis(30),
        await_timeout: Duration::from_secs(5),
        carrier_threads: 2,
        spawn_count: 20,
        spawn_delay: Duration::from_millis(5),
    }
}

/// Full configuration with shortened delays and no stdout echo
pub fn fast_config() -> ShowcaseConfig {
    ShowcaseConfig {
        tasks: fast_task_config(),
        work_delay: Duration::from_millis(5),
        group_delays: (Duration::from_millis(40), Duration::from_millis(20)),
        only: None,
        json_summary: false,
        echo: false,
    }
}

/// Fast configuration restricted to the named scenarios
pub fn fast_config_only(names: &[&str]) -> ShowcaseConfig {
    ShowcaseConfig {
        only: Some(names.iter().map(|n| n.to_string()).collect()),
        ..fast_config()
    }
}
