//! Test fixtures for speleo-cluster.
//!
//! - [`efforts`]: build `LocationEffort` records from taxonomic paths, and
//!   generate random ones
//! - [`scenarios`]: the worked seed-selection and two-group convergence
//!   fixtures, plus helpers to load them into an in-memory store

pub mod efforts;
pub mod scenarios;

pub use efforts::{generate_random_effort, generate_random_efforts, EffortBuilder};
pub use scenarios::{load, seed_scenario, two_groups, SCOPE};
