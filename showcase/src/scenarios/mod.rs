//! Before/after demonstration scenarios
//!
//! Each scenario owns every resource it creates and reports through the
//! shared `Transcript`. Expected failures are caught and reported in place;
//! anything else is returned as an error and ends the run.

pub mod diagnostics;
pub mod immutable;
pub mod scoped;
pub mod sequenced;
pub mod structured;
pub mod tasks;

use async_trait::async_trait;

use crate::config::ShowcaseConfig;
use crate::error::ShowcaseError;
use crate::transcript::Transcript;

pub use diagnostics::NullReferenceDiagnostics;
pub use immutable::ImmutableCollections;
pub use scoped::ScopedBindings;
pub use sequenced::SequencedCollections;
pub use structured::StructuredGroups;
pub use tasks::LightweightTasks;

/// A named, self-contained demonstration
#[async_trait]
pub trait Scenario: Send + Sync {
    /// Short identifier used by `SHOWCASE_ONLY`
    fn name(&self) -> &'static str;

    /// Heading printed before the scenario runs
    fn title(&self) -> &'static str;

    async fn run(&self, config: &ShowcaseConfig, out: &mut Transcript) -> anyhow::Result<()>;
}

/// Every scenario, in run order
pub fn all() -> Vec<Box<dyn Scenario>> {
    vec![
        Box::new(ImmutableCollections),
        Box::new(NullReferenceDiagnostics),
        Box::new(LightweightTasks),
        Box::new(StructuredGroups),
        Box::new(ScopedBindings),
        Box::new(SequencedCollections),
    ]
}

/// Report an expected failure
pub(crate) fn report_caught(out: &mut Transcript, what: &str, err: impl Into<ShowcaseError>) {
    let err = err.into();
    out.line(format!("Caught {}: {} ({})", err.kind(), what, err));
}

/// Milliseconds for display
pub(crate) fn millis(duration: std::time::Duration) -> u128 {
    duration.as_millis()
}
