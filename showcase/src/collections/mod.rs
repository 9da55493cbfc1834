//! Collection primitives used by the collection scenarios
//!
//! This module provides:
//! - Immutable list / set / map built from optional elements
//! - `Unmodifiable` wrapper around a mutable collection (the legacy path)
//! - Sequenced list / set / map with live reversed views

pub mod immutable;
pub mod sequenced;

pub use immutable::{CollectionMut, ImmutableList, ImmutableMap, ImmutableSet, MapMut, Unmodifiable};
pub use sequenced::{
    Reversed, ReversedMap, Sequenced, SequencedList, SequencedMap, SequencedMapOps, SequencedSet,
};

use thiserror::Error;

/// Errors raised by collection construction and mutation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollectionError {
    #[error("Unsupported operation: {0} on an immutable collection")]
    UnsupportedOperation(&'static str),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}
