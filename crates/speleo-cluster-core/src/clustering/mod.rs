//! Taxonomic-effort clustering.
//!
//! Groups survey locations by the taxa recorded at them:
//!
//! - [`DissimilarityMetric`] scores one tally against another under a chosen
//!   [`Basis`], [`WeightScheme`], rank cutoff and [`Transform`]
//! - seed selection picks up to K mutually dissimilar locations, richest first
//! - cluster assignment repartitions every eligible location around the seeds
//!   until a pass moves nothing
//! - [`EffortCache`] memoizes decoded tallies per scope
//!
//! [`ClusteringEngine`] ties these together over an
//! [`EffortProvider`](crate::traits::EffortProvider).

mod assigner;
mod cache;
mod cluster;
mod engine;
mod error;
mod metric;
mod params;
mod seeds;

pub use cache::{CacheStats, EffortCache};
pub use cluster::{Cluster, ClusterReport, ClusteringOutcome};
pub use engine::ClusteringEngine;
pub use error::ClusterError;
pub use metric::{
    combiner, Basis, Combiner, DissimilarityMetric, MetricConfig, Overlap, RankWeights, Transform,
    WeightScheme,
};
pub use params::{ClusteringParams, DEFAULT_PAGE_SIZE};
pub use seeds::SeedComparison;
