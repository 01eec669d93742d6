//! Rank-indexed taxon tallies.
//!
//! A [`TaxonTally`] is the in-memory form of a location's (or a cluster's)
//! accumulated effort: for each rank, the ordered taxon names observed with a
//! leaf flag and locality/visit counters. The leaf flag marks names for which
//! no more specific taxon was recorded, so that counting leaves yields species
//! richness without double-counting a genus whose species is also known.
//!
//! # Operations
//!
//! - [`TaxonTally::decode`] - build from a [`LocationEffort`]
//! - [`TaxonTally::merge_path`] - fold one full taxonomic path in, kingdom first
//! - [`TaxonTally::absorb`] - fold another tally in (cluster accumulation)
//! - [`TaxonTally::to_effort`] - encode back to the storage-boundary form
//!
//! # Example
//!
//! ```
//! use speleo_cluster_core::taxonomy::{Rank, TaxonPath, TaxonTally};
//!
//! let mut tally = TaxonTally::new();
//! tally.merge_path(
//!     &TaxonPath::new()
//!         .with(Rank::Kingdom, "Animalia")
//!         .with(Rank::Genus, "Cicurina"),
//!     1,
//! );
//! tally.merge_path(
//!     &TaxonPath::new()
//!         .with(Rank::Kingdom, "Animalia")
//!         .with(Rank::Genus, "Cicurina")
//!         .with(Rank::Species, "Cicurina madla"),
//!     1,
//! );
//!
//! // The genus gained a species below it, so only the species is a leaf.
//! assert_eq!(tally.species_count(), 1);
//! ```

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use super::effort::{LocationEffort, LocationId, RankEffort, BRANCH_MARKER, LEAF_MARKER};
use super::rank::{Rank, RANK_COUNT};
use crate::clustering::ClusterError;

// =============================================================================
// TaxonPath
// =============================================================================

/// One taxonomic path, kingdom to subspecies, with unknown ranks left empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonPath {
    names: [Option<String>; RANK_COUNT],
}

impl TaxonPath {
    /// Create an empty path.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the name at `rank`.
    #[must_use]
    pub fn with(mut self, rank: Rank, name: impl Into<String>) -> Self {
        self.names[rank.index()] = Some(name.into());
        self
    }

    /// Build a path from consecutive names starting at kingdom.
    ///
    /// Names past subspecies are ignored.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Self {
        let mut path = Self::new();
        for (slot, name) in path.names.iter_mut().zip(names) {
            *slot = Some(name.as_ref().to_string());
        }
        path
    }

    /// Name at `rank`, if known.
    #[inline]
    pub fn get(&self, rank: Rank) -> Option<&str> {
        self.names[rank.index()].as_deref()
    }

    /// Whether any more specific rank than `rank` carries a name.
    pub fn has_name_below(&self, rank: Rank) -> bool {
        self.names[rank.index() + 1..].iter().any(Option::is_some)
    }

    /// Most specific rank with a name.
    pub fn terminal_rank(&self) -> Option<Rank> {
        Rank::ALL.iter().rev().copied().find(|r| self.get(*r).is_some())
    }
}

// =============================================================================
// TallyEntry
// =============================================================================

/// One taxon recorded in a tally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TallyEntry {
    /// Taxon unique name.
    pub name: String,

    /// No more specific taxon was recorded for this occurrence.
    pub is_leaf: bool,

    /// Number of locations that contributed this taxon.
    pub locality_count: u32,

    /// Number of visits on which this taxon was recorded.
    pub visit_count: u32,
}

impl TallyEntry {
    fn marker(&self) -> char {
        if self.is_leaf {
            LEAF_MARKER
        } else {
            BRANCH_MARKER
        }
    }
}

// =============================================================================
// TaxonTally
// =============================================================================

/// Rank-indexed record of observed taxa with leaf markers.
///
/// Names are distinct within a rank. Entry order per rank is insertion order,
/// so encoding is stable for identical input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaxonTally {
    ranks: [Vec<TallyEntry>; RANK_COUNT],
    positions: [HashMap<String, usize>; RANK_COUNT],
}

impl TaxonTally {
    /// Create an empty tally.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a location's effort record.
    ///
    /// Visit counts default to 1 per name when the record carries none.
    ///
    /// # Errors
    ///
    /// Returns `ClusterError::MalformedEffort` if a rank's marker or visit
    /// sequence length differs from its name count, or a marker is neither
    /// `'0'` nor `'1'`.
    pub fn decode(effort: &LocationEffort) -> Result<Self, ClusterError> {
        let mut tally = Self::new();

        for rank in Rank::ALL {
            let Some(record) = effort.rank(rank) else {
                continue;
            };
            let markers: Vec<char> = record.leaf_markers.chars().collect();
            if markers.len() != record.names.len() {
                return Err(ClusterError::malformed_effort(
                    effort.location_id,
                    rank,
                    format!(
                        "{} names but {} leaf markers",
                        record.names.len(),
                        markers.len()
                    ),
                ));
            }
            if let Some(visits) = &record.visits {
                if visits.len() != record.names.len() {
                    return Err(ClusterError::malformed_effort(
                        effort.location_id,
                        rank,
                        format!(
                            "{} names but {} visit counts",
                            record.names.len(),
                            visits.len()
                        ),
                    ));
                }
            }

            for (i, (name, marker)) in record.names.iter().zip(markers).enumerate() {
                let is_leaf = match marker {
                    LEAF_MARKER => true,
                    BRANCH_MARKER => false,
                    other => {
                        return Err(ClusterError::malformed_effort(
                            effort.location_id,
                            rank,
                            format!("invalid leaf marker '{}' for {}", other, name),
                        ))
                    }
                };
                let visits = record.visits.as_ref().map_or(1, |v| v[i]);
                tally.record(rank, name, is_leaf, visits);
            }
        }

        Ok(tally)
    }

    /// Merge one taxonomic path into the tally, kingdom to subspecies.
    ///
    /// For each rank with a name: a new name is appended as a leaf only if no
    /// more specific name follows it in the path; an existing leaf is flipped
    /// to non-leaf once a more specific name is seen. Names and markers are
    /// idempotent under repeated identical merges; only visit counts grow.
    pub fn merge_path(&mut self, path: &TaxonPath, visits: u32) {
        for rank in Rank::ALL {
            let Some(upper) = path.get(rank) else {
                continue;
            };
            let has_lower = path.has_name_below(rank);
            let r = rank.index();

            match self.positions[r].get(upper) {
                Some(&pos) => {
                    let entry = &mut self.ranks[r][pos];
                    if has_lower && entry.is_leaf {
                        entry.is_leaf = false;
                    }
                    entry.visit_count = entry.visit_count.saturating_add(visits);
                }
                None => self.push(
                    rank,
                    TallyEntry {
                        name: upper.to_string(),
                        is_leaf: !has_lower,
                        locality_count: 1,
                        visit_count: visits,
                    },
                ),
            }
        }
    }

    /// Fold another tally into this one.
    ///
    /// New names keep their marker; a name present on both sides stays a leaf
    /// only if it is a leaf on both. Locality and visit counts add up.
    pub fn absorb(&mut self, other: &TaxonTally) {
        for rank in Rank::ALL {
            let r = rank.index();
            for entry in &other.ranks[r] {
                match self.positions[r].get(&entry.name) {
                    Some(&pos) => {
                        let mine = &mut self.ranks[r][pos];
                        mine.is_leaf &= entry.is_leaf;
                        mine.locality_count = mine.locality_count.saturating_add(entry.locality_count);
                        mine.visit_count = mine.visit_count.saturating_add(entry.visit_count);
                    }
                    None => self.push(rank, entry.clone()),
                }
            }
        }
    }

    /// Encode to the storage-boundary form.
    ///
    /// Empty ranks become `None`. `total_species` is the leaf count.
    pub fn to_effort(&self, location_id: LocationId, total_visits: u32) -> LocationEffort {
        let mut effort = LocationEffort::new(location_id);
        effort.total_visits = total_visits;
        effort.total_species = self.species_count() as u32;

        for rank in Rank::ALL {
            let entries = self.entries(rank);
            if entries.is_empty() {
                continue;
            }
            effort.ranks[rank.index()] = Some(
                RankEffort::new(
                    entries.iter().map(|e| e.name.clone()).collect(),
                    self.marker_string(rank),
                )
                .with_visits(entries.iter().map(|e| e.visit_count).collect()),
            );
        }

        effort
    }

    /// Number of leaf markers over all ranks.
    pub fn species_count(&self) -> usize {
        self.ranks.iter().flatten().filter(|e| e.is_leaf).count()
    }

    /// Number of distinct taxa over all ranks.
    pub fn taxon_count(&self) -> usize {
        self.ranks.iter().map(Vec::len).sum()
    }

    /// True when no taxon has been recorded.
    pub fn is_empty(&self) -> bool {
        self.ranks.iter().all(Vec::is_empty)
    }

    /// Entries recorded at `rank`, in insertion order.
    #[inline]
    pub fn entries(&self, rank: Rank) -> &[TallyEntry] {
        &self.ranks[rank.index()]
    }

    /// Whether `name` is recorded at `rank`.
    #[inline]
    pub fn contains(&self, rank: Rank, name: &str) -> bool {
        self.positions[rank.index()].contains_key(name)
    }

    /// Look up a taxon by unique name.
    pub fn get(&self, name: &str) -> Option<(Rank, &TallyEntry)> {
        Rank::ALL.into_iter().find_map(|rank| {
            self.positions[rank.index()]
                .get(name)
                .map(|&pos| (rank, &self.ranks[rank.index()][pos]))
        })
    }

    /// All entries with their rank, kingdom first.
    pub fn iter(&self) -> impl Iterator<Item = (Rank, &TallyEntry)> + '_ {
        Rank::ALL
            .into_iter()
            .flat_map(move |rank| self.entries(rank).iter().map(move |e| (rank, e)))
    }

    /// Marker characters for `rank`, one per name.
    pub fn marker_string(&self, rank: Rank) -> String {
        self.entries(rank).iter().map(TallyEntry::marker).collect()
    }

    /// Visit totals per taxon for ranks at or below `cutoff`.
    pub fn visits_at_or_below(&self, cutoff: Rank) -> BTreeMap<String, u32> {
        self.iter()
            .filter(|(rank, _)| *rank >= cutoff)
            .map(|(_, e)| (e.name.clone(), e.visit_count))
            .collect()
    }

    fn record(&mut self, rank: Rank, name: &str, is_leaf: bool, visits: u32) {
        let r = rank.index();
        match self.positions[r].get(name) {
            Some(&pos) => {
                let entry = &mut self.ranks[r][pos];
                entry.is_leaf &= is_leaf;
                entry.visit_count = entry.visit_count.saturating_add(visits);
            }
            None => self.push(
                rank,
                TallyEntry {
                    name: name.to_string(),
                    is_leaf,
                    locality_count: 1,
                    visit_count: visits,
                },
            ),
        }
    }

    fn push(&mut self, rank: Rank, entry: TallyEntry) {
        let r = rank.index();
        self.positions[r].insert(entry.name.clone(), self.ranks[r].len());
        self.ranks[r].push(entry);
    }
}
