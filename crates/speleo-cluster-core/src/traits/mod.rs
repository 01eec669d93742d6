//! Core trait definitions for the clustering engine's collaborators.

mod effort_provider;

pub use effort_provider::{EffortPages, EffortProvider};
