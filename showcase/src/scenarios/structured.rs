use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use super::{Scenario, report_caught};
use crate::config::ShowcaseConfig;
use crate::tasks::structured::BoxError;
use crate::tasks::{GroupError, TaskGroup};
use crate::transcript::Transcript;

/// How long the failing child works before it fails
const FAILURE_DELAY: Duration = Duration::from_millis(50);

/// How long the sibling of the failing child would run if left alone
const LONG_RUNNING: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
#[error("{0}")]
struct SubtaskFailed(&'static str);

/// Fork/join as one unit of work, with shutdown on the first failure
pub struct StructuredGroups;

#[async_trait]
impl Scenario for StructuredGroups {
    fn name(&self) -> &'static str {
        "structured"
    }

    fn title(&self) -> &'static str {
        "Structured task groups"
    }

    async fn run(&self, config: &ShowcaseConfig, out: &mut Transcript) -> anyhow::Result<()> {
        out.section("1. Two children joined as one unit");
        all_succeed(config, out).await?;

        out.section("2. A failing child shuts the group down");
        first_failure(out).await
    }
}

/// Move the lines children sent into the transcript
fn drain_into(rx: &mut mpsc::UnboundedReceiver<String>, out: &mut Transcript) {
    while let Ok(line) = rx.try_recv() {
        out.line(line);
    }
}

async fn all_succeed(config: &ShowcaseConfig, out: &mut Transcript) -> anyhow::Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let (first, second) = config.group_delays;

    let outcome = TaskGroup::scope(|group| {
        Box::pin(async move {
            for (n, delay) in [(1, first), (2, second)] {
                let tx = tx.clone();
                group.fork(move |cancel| async move {
                    let _ = tx.send(format!("Subtask {} started", n));
                    cancel.sleep(delay).await?;
                    let _ = tx.send(format!("Subtask {} finished", n));
                    Ok::<_, BoxError>(())
                })?;
            }
            group.join().await?;
            group.throw_if_failed()
        })
    })
    .await;

    drain_into(&mut rx, out);
    outcome?;
    out.line("All subtasks completed");
    Ok(())
}

async fn first_failure(out: &mut Transcript) -> anyhow::Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();

    let (failing, long, result) = TaskGroup::scope(|group| {
        Box::pin(async move {
            let failing_tx = tx.clone();
            let failing = group.fork(move |_| async move {
                let _ = failing_tx.send("Failing subtask started".to_string());
                tokio::time::sleep(FAILURE_DELAY).await;
                Err::<(), BoxError>(Box::new(SubtaskFailed("error raised inside the subtask")))
            })?;

            let long = group.fork(move |cancel| async move {
                let _ = tx.send("Long-running subtask started".to_string());
                cancel.sleep(LONG_RUNNING).await?;
                let _ = tx.send("Long-running subtask finished".to_string());
                Ok::<_, BoxError>(())
            })?;

            group.join().await?;
            Ok::<_, GroupError>((failing.state(), long.state(), group.throw_if_failed()))
        })
    })
    .await?;

    drain_into(&mut rx, out);
    out.line(format!("Failing subtask state: {:?}", failing));
    out.line(format!("Long-running subtask state: {:?}", long));

    match result {
        Err(e) => {
            let cause = e.cause().map(|c| c.to_string()).unwrap_or_default();
            report_caught(out, "the group reported its first failure", e);
            out.line(format!("Failure cause: {}", cause));
            Ok(())
        }
        Ok(()) => anyhow::bail!("group with a failing child reported success"),
    }
}
