//! ClusteringEngine: seed selection and assignment over one effort provider.
//!
//! The engine owns the validated parameters, the assembled metric, an
//! optional shared [`EffortCache`] and the random source used for
//! tie-breaking. Every public operation runs inside an `info_span!` tagged
//! with a fresh run id.
//!
//! # Usage
//!
//! ```
//! use std::sync::Arc;
//!
//! use speleo_cluster_core::clustering::{ClusteringEngine, ClusteringParams};
//! use speleo_cluster_core::stubs::InMemoryEffortStore;
//! use speleo_cluster_core::taxonomy::{TaxonPath, TaxonTally};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let store = Arc::new(InMemoryEffortStore::new());
//! for (id, phyla) in [(1, ["p1", "p2"]), (2, ["p7", "p8"])] {
//!     let mut tally = TaxonTally::new();
//!     for phylum in phyla {
//!         tally.merge_path(&TaxonPath::from_names(&["Animalia", phylum]), 1);
//!     }
//!     store.insert("caves", tally.to_effort(id, 1));
//! }
//!
//! let mut engine = ClusteringEngine::new(store, ClusteringParams::new("caves", 2)).unwrap();
//! let outcome = engine.run().await.unwrap();
//! assert_eq!(outcome.clusters.len(), 2);
//! assert!(outcome.converged);
//! # }
//! ```

use std::sync::Arc;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use super::assigner::{AssignmentRequest, ClusterAssigner};
use super::cache::{EffortCache, TallyLoader};
use super::cluster::ClusteringOutcome;
use super::error::ClusterError;
use super::metric::DissimilarityMetric;
use super::params::ClusteringParams;
use super::seeds::SeedSelector;
use crate::config::Config;
use crate::error::CoreResult;
use crate::taxonomy::LocationId;
use crate::traits::EffortProvider;

/// Clustering entry point bound to one provider and parameter set.
pub struct ClusteringEngine<P: ?Sized> {
    provider: Arc<P>,
    params: ClusteringParams,
    metric: DissimilarityMetric,
    cache: Option<Arc<EffortCache>>,
    rng: StdRng,
}

impl<P> ClusteringEngine<P>
where
    P: EffortProvider + ?Sized,
{
    /// Create an engine, validating parameters before any data is fetched.
    ///
    /// Tie-breaking draws from an entropy-seeded generator; see
    /// [`with_rng`](Self::with_rng) for reproducible runs.
    ///
    /// # Errors
    ///
    /// Returns `ClusterError::InvalidParameter` if `params` fail validation.
    pub fn new(provider: Arc<P>, params: ClusteringParams) -> Result<Self, ClusterError> {
        params.validate()?;
        let metric = DissimilarityMetric::new(params.metric);
        info!(
            scope = %params.scope,
            basis = %params.metric.basis,
            weight_scheme = %params.metric.weight_scheme,
            rank_cutoff = %params.metric.rank_cutoff,
            transform = %params.metric.transform,
            max_clusters = params.max_clusters,
            "Clustering engine created"
        );

        Ok(Self {
            provider,
            params,
            metric,
            cache: None,
            rng: StdRng::from_entropy(),
        })
    }

    /// Create an engine from the `clustering` and `cache` configuration sections.
    pub fn from_config(provider: Arc<P>, config: &Config) -> CoreResult<Self> {
        let params = ClusteringParams::from_config(&config.clustering)?;
        let engine = Self::new(provider, params)?;
        Ok(if config.cache.enabled {
            engine.with_cache(Arc::new(EffortCache::new()))
        } else {
            engine
        })
    }

    /// Decode through a shared cache.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<EffortCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Replace the tie-breaking random source.
    #[must_use]
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn params(&self) -> &ClusteringParams {
        &self.params
    }

    pub fn metric(&self) -> &DissimilarityMetric {
        &self.metric
    }

    pub fn cache(&self) -> Option<&Arc<EffortCache>> {
        self.cache.as_ref()
    }

    /// Choose up to `max_clusters` seeds by farthest-first selection.
    pub async fn select_seeds(&self) -> Result<Vec<LocationId>, ClusterError> {
        let run_id = Uuid::new_v4();
        let span = info_span!("select_seeds", %run_id, scope = %self.params.scope);
        self.seeds_inner().instrument(span).await
    }

    /// Partition eligible locations around caller-supplied seeds.
    pub async fn cluster_with_seeds(
        &mut self,
        seeds: &[LocationId],
    ) -> Result<ClusteringOutcome, ClusterError> {
        let run_id = Uuid::new_v4();
        let span = info_span!("cluster", %run_id, scope = %self.params.scope);
        self.assign_inner(run_id, seeds).instrument(span).await
    }

    /// Select seeds, then partition around them.
    pub async fn run(&mut self) -> Result<ClusteringOutcome, ClusterError> {
        let run_id = Uuid::new_v4();
        let span = info_span!("clustering_run", %run_id, scope = %self.params.scope);
        async {
            let seeds = self.seeds_inner().await?;
            self.assign_inner(run_id, &seeds).await
        }
        .instrument(span)
        .await
    }

    async fn seeds_inner(&self) -> Result<Vec<LocationId>, ClusterError> {
        let scope = self.params.scope.as_str();
        let loader = TallyLoader::new(&*self.provider, self.cache.as_deref(), scope);
        let seeds = SeedSelector::new(&*self.provider, loader, &self.metric, scope)
            .select(&self.params.seed_request())
            .await?;
        info!(seeds = ?seeds, "Seed selection finished");
        Ok(seeds)
    }

    async fn assign_inner(
        &mut self,
        run_id: Uuid,
        seeds: &[LocationId],
    ) -> Result<ClusteringOutcome, ClusterError> {
        let Self {
            provider,
            params,
            metric,
            cache,
            rng,
        } = self;

        let scope = params.scope.as_str();
        let request = AssignmentRequest {
            filter: params.filter,
            page_size: params.page_size,
            max_passes: params.max_passes,
        };
        let loader = TallyLoader::new(&**provider, cache.as_deref(), scope);
        let assignment = ClusterAssigner::new(&**provider, loader, &*metric, scope)
            .assign(seeds, &request, rng)
            .await?;

        if let Some(cache) = cache.as_ref() {
            let stats = cache.stats();
            info!(
                hits = stats.hits,
                misses = stats.misses,
                invalidations = stats.invalidations,
                "Effort cache statistics"
            );
        }

        Ok(ClusteringOutcome {
            run_id,
            computed_at: Utc::now(),
            clusters: assignment.clusters,
            passes: assignment.passes,
            moves_per_pass: assignment.moves_per_pass,
            converged: assignment.converged,
            rank_cutoff: params.metric.rank_cutoff,
        })
    }
}

impl<P: ?Sized> std::fmt::Debug for ClusteringEngine<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClusteringEngine")
            .field("params", &self.params)
            .field("cached", &self.cache.is_some())
            .finish()
    }
}
