//! Iterative cluster assignment.
//!
//! Partitions every eligible location around a fixed list of seeds, k-means
//! style, with taxon tallies standing in for centroids:
//!
//! 1. Each seed founds one cluster whose *current* tally is the seed's own.
//! 2. An initial pass assigns every non-seed location to its nearest cluster
//!    and absorbs it into that cluster's *next* tally.
//! 3. Each reassignment pass promotes *next* to *current*, empties *next*,
//!    then re-scores every location (seeds included) and absorbs each into
//!    the cluster it lands in.
//! 4. Passes repeat until one moves nothing. At least one reassignment pass
//!    always runs.
//!
//! # Tie-breaking
//!
//! When several clusters share the best score, the location stays where it is
//! if its current cluster is among them, otherwise one is drawn uniformly at
//! random. Scores are compared with exact equality.

use std::collections::{BTreeSet, HashMap, HashSet};

use rand::Rng;
use tracing::{debug, info, warn};

use super::cache::TallyLoader;
use super::cluster::Cluster;
use super::error::ClusterError;
use super::metric::DissimilarityMetric;
use crate::taxonomy::{LocationId, SpeciesFilter, TaxonTally};
use crate::traits::{EffortPages, EffortProvider};

/// Traversal settings for one assignment run.
#[derive(Debug, Clone, Copy)]
pub(crate) struct AssignmentRequest {
    pub filter: SpeciesFilter,
    pub page_size: usize,
    pub max_passes: Option<usize>,
}

/// Raw result of an assignment run.
#[derive(Debug)]
pub(crate) struct Assignment {
    pub clusters: Vec<Cluster>,
    pub passes: usize,
    pub moves_per_pass: Vec<usize>,
    pub converged: bool,
}

/// Reassignment loop over paginated effort records.
pub(crate) struct ClusterAssigner<'a, P: ?Sized> {
    provider: &'a P,
    loader: TallyLoader<'a, P>,
    metric: &'a DissimilarityMetric,
    scope: &'a str,
}

impl<'a, P> ClusterAssigner<'a, P>
where
    P: EffortProvider + ?Sized,
{
    pub(crate) fn new(
        provider: &'a P,
        loader: TallyLoader<'a, P>,
        metric: &'a DissimilarityMetric,
        scope: &'a str,
    ) -> Self {
        Self {
            provider,
            loader,
            metric,
            scope,
        }
    }

    /// Partition eligible locations around `seeds`.
    ///
    /// # Errors
    ///
    /// - `InvalidParameter` if a seed ID is repeated
    /// - `SeedNotFound` if a seed does not resolve in the scope
    /// - any provider or decode error met while streaming
    pub(crate) async fn assign<R>(
        &self,
        seeds: &[LocationId],
        request: &AssignmentRequest,
        rng: &mut R,
    ) -> Result<Assignment, ClusterError>
    where
        R: Rng + ?Sized,
    {
        if seeds.is_empty() {
            return Ok(Assignment {
                clusters: Vec::new(),
                passes: 0,
                moves_per_pass: Vec::new(),
                converged: true,
            });
        }

        let seed_set: HashSet<LocationId> = seeds.iter().copied().collect();
        if seed_set.len() != seeds.len() {
            return Err(ClusterError::invalid_parameter(format!(
                "seed list contains duplicates: {:?}",
                seeds
            )));
        }

        // ---- Seed initialization ----
        let mut current = self.seed_tallies(seeds).await?;
        let mut next = current.clone();
        let mut membership: HashMap<LocationId, usize> =
            seeds.iter().enumerate().map(|(i, &id)| (id, i)).collect();

        // ---- Initial assignment ----
        let mut pages = self.pages(request);
        let mut initial = 0usize;
        while let Some(page) = pages.next_page().await? {
            for effort in &page {
                if seed_set.contains(&effort.location_id) {
                    continue;
                }
                let tally = self.loader.load(effort).await?;
                let index = nearest(&self.scores(&current, &tally), None, rng);
                membership.insert(effort.location_id, index);
                next[index].absorb(&tally);
                initial += 1;
            }
        }
        debug!(
            seeds = seeds.len(),
            assigned = initial,
            "Initial assignment complete"
        );

        // ---- Reassignment passes ----
        let mut passes = 0usize;
        let mut moves_per_pass = Vec::new();
        let mut members: Vec<BTreeSet<LocationId>>;
        let converged = loop {
            passes += 1;
            current = std::mem::replace(&mut next, vec![TaxonTally::new(); seeds.len()]);
            members = vec![BTreeSet::new(); seeds.len()];
            let mut moves = 0usize;

            let mut pages = self.pages(request);
            while let Some(page) = pages.next_page().await? {
                for effort in &page {
                    let tally = self.loader.load(effort).await?;
                    let previous = membership.get(&effort.location_id).copied();
                    let index = nearest(&self.scores(&current, &tally), previous, rng);

                    if previous != Some(index) {
                        moves += 1;
                        membership.insert(effort.location_id, index);
                    }
                    next[index].absorb(&tally);
                    members[index].insert(effort.location_id);
                }
            }

            moves_per_pass.push(moves);
            debug!(pass = passes, moves, "Reassignment pass complete");

            if moves == 0 {
                break true;
            }
            if request.max_passes.is_some_and(|limit| passes >= limit) {
                warn!(
                    passes,
                    moves,
                    "Pass limit reached before assignments stabilized"
                );
                break false;
            }
        };

        info!(passes, converged, "Cluster assignment finished");

        let clusters = seeds
            .iter()
            .zip(next)
            .zip(members)
            .enumerate()
            .map(|(index, ((&seed, aggregate_tally), member_location_ids))| Cluster {
                index,
                seed_location_id: seed,
                member_location_ids,
                aggregate_tally,
            })
            .collect();

        Ok(Assignment {
            clusters,
            passes,
            moves_per_pass,
            converged,
        })
    }

    async fn seed_tallies(&self, seeds: &[LocationId]) -> Result<Vec<TaxonTally>, ClusterError> {
        let found = self.provider.fetch_by_ids(self.scope, seeds).await?;

        let mut tallies = Vec::with_capacity(seeds.len());
        for (i, &location_id) in seeds.iter().enumerate() {
            let Some(effort) = found.get(i).and_then(Option::as_ref) else {
                return Err(ClusterError::SeedNotFound { location_id });
            };
            tallies.push((*self.loader.load(effort).await?).clone());
        }
        Ok(tallies)
    }

    fn pages(&self, request: &AssignmentRequest) -> EffortPages<'a, P> {
        EffortPages::new(self.provider, self.scope, request.filter, request.page_size)
    }

    fn scores(&self, clusters: &[TaxonTally], candidate: &TaxonTally) -> Vec<f64> {
        clusters
            .iter()
            .map(|cluster| self.metric.score(cluster, candidate))
            .collect()
    }
}

/// Pick the cluster index with the lowest score.
///
/// Ties keep `previous` when it is among them, otherwise one tied index is
/// drawn at random.
pub(crate) fn nearest<R>(scores: &[f64], previous: Option<usize>, rng: &mut R) -> usize
where
    R: Rng + ?Sized,
{
    let best = scores.iter().copied().fold(f64::INFINITY, f64::min);
    let tied: Vec<usize> = scores
        .iter()
        .enumerate()
        .filter(|(_, &score)| score == best)
        .map(|(i, _)| i)
        .collect();

    match tied.as_slice() {
        [] => previous.unwrap_or(0),
        [only] => *only,
        _ => match previous {
            Some(index) if tied.contains(&index) => index,
            _ => tied[rng.gen_range(0..tied.len())],
        },
    }
}
