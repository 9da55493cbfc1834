//! Feature Showcase Library
//!
//! Before/after demonstrations of immutable collections, null-reference
//! diagnostics, lightweight tasks, structured task groups, scoped bindings
//! and sequenced collections. The primitives are exported for use in
//! integration tests.

pub mod collections;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod runner;
pub mod scenarios;
pub mod scoped;
pub mod tasks;
pub mod transcript;

// Re-export commonly used types
pub use config::{ShowcaseConfig, TaskConfig};
pub use error::{FailureKind, ShowcaseError};
pub use runner::{RunSummary, Runner, ScenarioReport};
pub use scenarios::Scenario;
pub use scoped::{ScopeContext, ScopeError, ScopedSlot, ThreadSlot};
pub use transcript::Transcript;
