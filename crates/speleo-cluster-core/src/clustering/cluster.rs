//! Cluster output types.
//!
//! [`Cluster`] is the in-memory result of one assignment run: its seed, the
//! member locations and the aggregate tally accumulated on the final pass.
//! [`ClusterReport`] is the serializable view handed to callers, carrying the
//! aggregate visit map restricted to ranks at or below the metric's cutoff.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::taxonomy::{LocationId, Rank, TaxonTally};

/// One cluster of locations founded by a seed.
///
/// # Example
///
/// ```
/// use speleo_cluster_core::clustering::Cluster;
/// use speleo_cluster_core::taxonomy::TaxonTally;
///
/// let mut cluster = Cluster::new(0, 42, TaxonTally::new());
/// cluster.member_location_ids.insert(42);
/// assert_eq!(cluster.member_count(), 1);
/// assert!(cluster.contains(42));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    /// Position of the seed in the seed list.
    pub index: usize,

    /// Location that founded the cluster.
    pub seed_location_id: LocationId,

    /// Locations assigned on the final pass.
    pub member_location_ids: BTreeSet<LocationId>,

    /// Absorbed tallies of every member on the final pass.
    pub aggregate_tally: TaxonTally,
}

impl Cluster {
    pub fn new(index: usize, seed_location_id: LocationId, aggregate_tally: TaxonTally) -> Self {
        Self {
            index,
            seed_location_id,
            member_location_ids: BTreeSet::new(),
            aggregate_tally,
        }
    }

    #[inline]
    pub fn member_count(&self) -> usize {
        self.member_location_ids.len()
    }

    #[inline]
    pub fn contains(&self, location_id: LocationId) -> bool {
        self.member_location_ids.contains(&location_id)
    }

    /// True when no location ended up in this cluster, not even its seed.
    pub fn is_empty(&self) -> bool {
        self.member_location_ids.is_empty()
    }

    /// Serializable view with visits restricted to ranks at or below `cutoff`.
    pub fn report(&self, cutoff: Rank) -> ClusterReport {
        ClusterReport {
            seed_location_id: self.seed_location_id,
            member_location_ids: self.member_location_ids.iter().copied().collect(),
            taxon_visits: self.aggregate_tally.visits_at_or_below(cutoff),
        }
    }
}

/// Caller-facing summary of a cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterReport {
    pub seed_location_id: LocationId,

    /// Ascending member IDs.
    pub member_location_ids: Vec<LocationId>,

    /// Taxon name to total visits, ranks at or below the cutoff only.
    pub taxon_visits: BTreeMap<String, u32>,
}

impl ClusterReport {
    /// Taxa recorded somewhere in the cluster but not at `location`.
    ///
    /// These are the occurrences predicted for an under-sampled member.
    /// Returned in name order.
    pub fn predicted_taxa(&self, location: &TaxonTally) -> Vec<String> {
        self.taxon_visits
            .keys()
            .filter(|name| location.get(name).is_none())
            .cloned()
            .collect()
    }
}

/// Result of one clustering invocation.
#[derive(Debug, Clone)]
pub struct ClusteringOutcome {
    /// Identifies the invocation in logs.
    pub run_id: Uuid,

    pub computed_at: DateTime<Utc>,

    /// One cluster per seed, in seed order.
    pub clusters: Vec<Cluster>,

    /// Reassignment passes executed after the initial assignment.
    pub passes: usize,

    /// Locations that changed cluster on each reassignment pass.
    pub moves_per_pass: Vec<usize>,

    /// False when the pass limit stopped the loop before a fixed point.
    pub converged: bool,

    /// Cutoff used for reports.
    pub rank_cutoff: Rank,
}

impl ClusteringOutcome {
    /// Cluster owning `location_id`, if any.
    pub fn cluster_of(&self, location_id: LocationId) -> Option<&Cluster> {
        self.clusters.iter().find(|c| c.contains(location_id))
    }

    /// Member sets in cluster order.
    pub fn partition(&self) -> Vec<BTreeSet<LocationId>> {
        self.clusters
            .iter()
            .map(|c| c.member_location_ids.clone())
            .collect()
    }

    pub fn reports(&self) -> Vec<ClusterReport> {
        self.clusters
            .iter()
            .map(|c| c.report(self.rank_cutoff))
            .collect()
    }

    /// Number of locations assigned across all clusters.
    pub fn location_count(&self) -> usize {
        self.clusters.iter().map(Cluster::member_count).sum()
    }
}
