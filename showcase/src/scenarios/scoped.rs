use std::cell::RefCell;
use std::sync::{Arc, mpsc};
use std::thread;
use std::time::Duration;

use async_trait::async_trait;

use super::{Scenario, report_caught};
use crate::config::ShowcaseConfig;
use crate::scoped::{ScopeContext, ScopedSlot, ThreadSlot};
use crate::tasks::structured::BoxError;
use crate::tasks::{FixedPool, PoolError, TaskGroup};
use crate::transcript::Transcript;

thread_local! {
    static LEGACY_USER: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Mutable thread-locals versus immutable scoped bindings
pub struct ScopedBindings;

#[async_trait]
impl Scenario for ScopedBindings {
    fn name(&self) -> &'static str {
        "scoped"
    }

    fn title(&self) -> &'static str {
        "Scoped bindings versus thread-local slots"
    }

    async fn run(&self, config: &ShowcaseConfig, out: &mut Transcript) -> anyhow::Result<()> {
        out.section("1. Legacy thread-local slot on a pool of 2");
        let work = config.work_delay;
        let lines = tokio::task::spawn_blocking(move || thread_local_demo(work)).await??;
        for line in lines {
            out.line(line);
        }
        out.line("* Note: thread-locals are mutable and must be removed by hand");

        let user = Arc::new(ScopedSlot::<String>::new("USER"));
        let root = ScopeContext::empty();

        out.section("2. Scoped binding");
        nested_scopes(&user, &root, work, out).await?;
        out.line(format!(
            "* After the scope ends, USER is bound: {}",
            user.is_bound(&root)
        ));

        out.section("3. Scope safety");
        match user.get(&root) {
            Err(e) => report_caught(out, "cannot read USER outside its scope", e),
            Ok(value) => anyhow::bail!("USER leaked out of its scope: {}", value),
        }
        let value = root
            .bind(&user, "ImmutableUser".to_string())
            .run(|ctx| user.get(ctx))?;
        out.line(format!("USER in scope: {}", value));
        out.line("* No set operation exists; a new value needs a nested scope");
        Ok(())
    }
}

/// Each pool worker stores its own name, then a stale value leaks to the next task
///
/// Blocks the calling thread.
fn thread_local_demo(work: Duration) -> Result<Vec<String>, PoolError> {
    let (tx, rx) = mpsc::channel();

    let mut pool = FixedPool::new(2)?;
    for _ in 0..2 {
        let tx = tx.clone();
        pool.submit(move |interrupt| {
            let slot = ThreadSlot::new(&LEGACY_USER);
            slot.set(thread::current().name().unwrap_or("unnamed").to_string());
            let _ = tx.send(format!(
                "Thread-local USER: {}",
                slot.get().unwrap_or_default()
            ));
            interrupt.sleep(work)
        })?;
    }
    pool.shutdown();
    pool.await_drained(work * 10)?;
    drop(pool);

    // A single worker runs both tasks; the first never cleans up
    let mut pool = FixedPool::new(1)?;
    pool.submit(|_| {
        ThreadSlot::new(&LEGACY_USER).set("alice".to_string());
        Ok(())
    })?;
    let leak_tx = tx.clone();
    pool.submit(move |_| {
        let stale = ThreadSlot::new(&LEGACY_USER).get();
        let _ = leak_tx.send(format!("Next task on the same worker reads: {:?}", stale));
        Ok(())
    })?;
    pool.shutdown();
    pool.await_drained(work * 10)?;
    drop(pool);
    drop(tx);

    let mut lines: Vec<String> = rx.iter().collect();
    // Worker order is not deterministic; keep the leak line last
    let leak = lines.pop();
    lines.sort();
    lines.extend(leak);
    Ok(lines)
}

async fn nested_scopes(
    user: &Arc<ScopedSlot<String>>,
    root: &ScopeContext,
    work: Duration,
    out: &mut Transcript,
) -> anyhow::Result<()> {
    root.bind(user, "Alice".to_string())
        .run_async(|ctx| async move {
            out.line(format!("In scope: USER = {}", user.get(&ctx)?));
            tokio::time::sleep(work).await;

            let nested = ctx
                .bind(user, "Bob".to_string())
                .run(|inner| user.get(inner))?;
            out.line(format!("Nested scope: USER = {}", nested));
            tokio::time::sleep(work).await;

            // A forked child inherits the bindings of the block that forked it
            let mut group = TaskGroup::shutdown_on_failure();
            let child_ctx = ctx.clone();
            let slot = Arc::clone(user);
            let child = group.fork(move |_| async move {
                let seen = slot.get(&child_ctx)?;
                Ok::<_, BoxError>(seen)
            })?;
            group.join().await?;
            group.throw_if_failed()?;
            group.close().await;
            out.line(format!(
                "Forked child task: USER = {}",
                child.get().unwrap_or_default()
            ));

            out.line(format!("Back in outer scope: USER = {}", user.get(&ctx)?));
            tokio::time::sleep(work).await;
            Ok::<_, anyhow::Error>(())
        })
        .await
}
