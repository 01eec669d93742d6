//! Speleo Cluster Core Library
//!
//! Groups cave survey locations into clusters of similar species composition
//! so that taxa recorded across a cluster can be predicted for its
//! under-sampled members.
//!
//! # Architecture
//!
//! This crate defines:
//! - Taxonomic ranks, per-location effort records and decoded tallies (`taxonomy`)
//! - Dissimilarity metrics, farthest-first seeding and iterative assignment (`clustering`)
//! - The effort provider trait the engine reads from (`traits`)
//! - An in-memory provider for development and tests (`stubs`)
//! - Error types, configuration and logging setup
//!
//! # Example
//!
//! ```
//! use speleo_cluster_core::clustering::{Basis, DissimilarityMetric, MetricConfig, WeightScheme};
//! use speleo_cluster_core::taxonomy::{TaxonPath, TaxonTally};
//!
//! let mut cluster = TaxonTally::new();
//! cluster.merge_path(&TaxonPath::from_names(&["Animalia", "Arthropoda", "Insecta"]), 1);
//!
//! let mut cave = TaxonTally::new();
//! cave.merge_path(&TaxonPath::from_names(&["Animalia", "Arthropoda", "Arachnida"]), 1);
//!
//! let metric = DissimilarityMetric::new(
//!     MetricConfig::default()
//!         .with_basis(Basis::BothDiffsTaxa)
//!         .with_weight_scheme(WeightScheme::Linear),
//! );
//! // Insecta and Arachnida differ, each at weight 3.
//! assert_eq!(metric.score(&cluster, &cave), 6.0);
//! ```

pub mod clustering;
pub mod config;
pub mod error;
pub mod logging;
pub mod stubs;
pub mod taxonomy;
pub mod traits;

// Re-exports for convenience
pub use clustering::{
    ClusterError, ClusterReport, ClusteringEngine, ClusteringOutcome, ClusteringParams,
    DissimilarityMetric, EffortCache, MetricConfig,
};
pub use config::Config;
pub use error::{CoreError, CoreResult, StorageError};
pub use taxonomy::{LocationEffort, LocationId, Rank, TaxonPath, TaxonTally};
pub use traits::EffortProvider;
