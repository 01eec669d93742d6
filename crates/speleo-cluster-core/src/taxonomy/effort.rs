//! Per-location effort snapshots as delivered by the upstream tallying layer.
//!
//! A [`LocationEffort`] is the storage-boundary form: for every rank it holds
//! parallel sequences of taxon names, one-character leaf markers and,
//! optionally, per-name visit counts. The engine treats these records as
//! read-only and decodes them into [`TaxonTally`](super::TaxonTally) values.

use serde::{Deserialize, Serialize};

use super::rank::{Rank, RANK_COUNT};

/// Identifier of a survey location.
pub type LocationId = u64;

/// Marker character for a name that terminates its occurrence (no more
/// specific taxon was recorded below it).
pub const LEAF_MARKER: char = '1';

/// Marker character for a name with a more specific descendant recorded.
pub const BRANCH_MARKER: char = '0';

/// Observations recorded at one rank of one location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankEffort {
    /// Distinct taxon names observed at this rank, in recording order.
    pub names: Vec<String>,

    /// One marker character per name (`'1'` leaf, `'0'` branch).
    pub leaf_markers: String,

    /// Per-name visit counts, when the upstream tally kept them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visits: Option<Vec<u32>>,
}

impl RankEffort {
    /// Create a rank record without visit counts.
    pub fn new(names: Vec<String>, leaf_markers: impl Into<String>) -> Self {
        Self {
            names,
            leaf_markers: leaf_markers.into(),
            visits: None,
        }
    }

    /// Attach per-name visit counts.
    #[must_use]
    pub fn with_visits(mut self, visits: Vec<u32>) -> Self {
        self.visits = Some(visits);
        self
    }

    /// Number of names recorded at this rank.
    #[inline]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// True when no names are recorded.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Accumulated survey effort for one location.
///
/// Absent ranks are `None`, never an empty [`RankEffort`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationEffort {
    /// Location this snapshot belongs to.
    pub location_id: LocationId,

    /// Number of survey visits to the location.
    pub total_visits: u32,

    /// Number of distinct species / operational units (leaf markers).
    pub total_species: u32,

    /// Observations by rank index.
    pub ranks: [Option<RankEffort>; RANK_COUNT],
}

impl LocationEffort {
    /// Create an effort record with no observations.
    pub fn new(location_id: LocationId) -> Self {
        Self {
            location_id,
            total_visits: 0,
            total_species: 0,
            ranks: Default::default(),
        }
    }

    /// Observations at `rank`, if any.
    #[inline]
    pub fn rank(&self, rank: Rank) -> Option<&RankEffort> {
        self.ranks[rank.index()].as_ref()
    }
}

/// Inclusive bounds on a location's total species count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeciesFilter {
    pub min_species: u32,
    pub max_species: u32,
}

impl SpeciesFilter {
    pub fn new(min_species: u32, max_species: u32) -> Self {
        Self {
            min_species,
            max_species,
        }
    }

    /// Check whether an effort record passes the filter.
    #[inline]
    pub fn accepts(&self, effort: &LocationEffort) -> bool {
        (self.min_species..=self.max_species).contains(&effort.total_species)
    }
}

impl Default for SpeciesFilter {
    fn default() -> Self {
        Self::new(1, u32::MAX)
    }
}
