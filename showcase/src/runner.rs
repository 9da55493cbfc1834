//! Runs the registered scenarios in declaration order

use std::time::Instant;

use anyhow::Context;
use metrics::histogram;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::ShowcaseConfig;
use crate::scenarios::{self, Scenario};
use crate::transcript::Transcript;

/// Timing and output size of one scenario
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub name: &'static str,
    pub title: &'static str,
    pub elapsed_ms: u64,
    pub lines: usize,
}

/// Result of a complete run
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub scenarios: Vec<ScenarioReport>,
    pub total_elapsed_ms: u64,
}

impl RunSummary {
    pub fn names(&self) -> Vec<&'static str> {
        self.scenarios.iter().map(|s| s.name).collect()
    }
}

/// Executes scenarios one after another; the first unexpected failure ends the run
pub struct Runner {
    config: ShowcaseConfig,
    scenarios: Vec<Box<dyn Scenario>>,
}

impl Runner {
    /// Runner over every built-in scenario
    pub fn new(config: ShowcaseConfig) -> Self {
        Self::with_scenarios(config, scenarios::all())
    }

    pub fn with_scenarios(config: ShowcaseConfig, scenarios: Vec<Box<dyn Scenario>>) -> Self {
        Self { config, scenarios }
    }

    /// Scenarios selected by the configuration, in declaration order
    pub fn selected(&self) -> anyhow::Result<Vec<&dyn Scenario>> {
        let Some(only) = &self.config.only else {
            return Ok(self.scenarios.iter().map(|s| s.as_ref()).collect());
        };

        if let Some(unknown) = only
            .iter()
            .find(|name| !self.scenarios.iter().any(|s| s.name() == name.as_str()))
        {
            let known: Vec<&str> = self.scenarios.iter().map(|s| s.name()).collect();
            anyhow::bail!(
                "unknown scenario {:?}; expected one of {}",
                unknown,
                known.join(", ")
            );
        }

        Ok(self
            .scenarios
            .iter()
            .filter(|s| only.iter().any(|name| name == s.name()))
            .map(|s| s.as_ref())
            .collect())
    }

    /// Run each selected scenario exactly once
    pub async fn run(&self, out: &mut Transcript) -> anyhow::Result<RunSummary> {
        let selected = self.selected()?;
        let run_start = Instant::now();
        let mut summary = RunSummary::default();

        for (idx, scenario) in selected.into_iter().enumerate() {
            if idx > 0 {
                out.line("");
            }
            // Header counts toward the scenario's lines
            let lines_before = out.len();
            out.line(format!("=== {} ===", scenario.title()));

            info!("Starting scenario {}", scenario.name());
            let start = Instant::now();

            let result = scenario.run(&self.config, out).await;
            let elapsed = start.elapsed();
            histogram!("showcase_scenario_duration_seconds", "scenario" => scenario.name())
                .record(elapsed);

            if let Err(e) = &result {
                warn!("Scenario {} failed after {:?}: {:#}", scenario.name(), elapsed, e);
            }
            result.with_context(|| format!("scenario {} failed", scenario.name()))?;

            info!("Scenario {} finished in {:?}", scenario.name(), elapsed);
            summary.scenarios.push(ScenarioReport {
                name: scenario.name(),
                title: scenario.title(),
                elapsed_ms: elapsed.as_millis() as u64,
                lines: out.len() - lines_before,
            });
        }

        summary.total_elapsed_ms = run_start.elapsed().as_millis() as u64;
        Ok(summary)
    }
}
