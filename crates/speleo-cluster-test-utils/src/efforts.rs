//! Effort record builders.
//!
//! Records are built the way the upstream tallying step would: every path is
//! merged into a `TaxonTally`, which is then encoded. Species counts and leaf
//! markers are therefore always consistent.

use rand::Rng;
use speleo_cluster_core::taxonomy::{LocationEffort, LocationId, Rank, TaxonPath, TaxonTally};

/// Builder for one location's effort record.
///
/// ```
/// use speleo_cluster_core::taxonomy::Rank;
/// use speleo_cluster_test_utils::EffortBuilder;
///
/// let effort = EffortBuilder::new(3)
///     .path(&["Animalia", "Arthropoda"])
///     .ranked_path(&[(Rank::Kingdom, "Animalia"), (Rank::Genus, "Cicurina")])
///     .build();
/// assert_eq!(effort.total_species, 2);
/// ```
#[derive(Debug, Clone)]
pub struct EffortBuilder {
    location_id: LocationId,
    tally: TaxonTally,
    visits: u32,
    total_visits: Option<u32>,
}

impl EffortBuilder {
    pub fn new(location_id: LocationId) -> Self {
        Self {
            location_id,
            tally: TaxonTally::new(),
            visits: 1,
            total_visits: None,
        }
    }

    /// Visits credited to each subsequently merged path.
    pub fn visits(mut self, visits: u32) -> Self {
        self.visits = visits;
        self
    }

    /// Override the record's total visit count (defaults to the path count).
    pub fn total_visits(mut self, total_visits: u32) -> Self {
        self.total_visits = Some(total_visits);
        self
    }

    /// Merge a path whose names fill ranks from kingdom down.
    pub fn path(mut self, names: &[&str]) -> Self {
        self.tally.merge_path(&TaxonPath::from_names(names), self.visits);
        self
    }

    /// Merge a path with explicit ranks; unnamed ranks stay empty.
    pub fn ranked_path(mut self, names: &[(Rank, &str)]) -> Self {
        let path = names
            .iter()
            .fold(TaxonPath::new(), |path, &(rank, name)| path.with(rank, name));
        self.tally.merge_path(&path, self.visits);
        self
    }

    pub fn tally(&self) -> &TaxonTally {
        &self.tally
    }

    pub fn build(self) -> LocationEffort {
        let total_visits = self
            .total_visits
            .unwrap_or_else(|| self.tally.iter().map(|(_, e)| e.visit_count).max().unwrap_or(0));
        self.tally.to_effort(self.location_id, total_visits)
    }
}

/// Generate a random effort record.
///
/// Draws `paths` kingdom-to-genus paths from a pool of `breadth` names per
/// rank, so small pools give heavily overlapping locations.
pub fn generate_random_effort<R: Rng + ?Sized>(
    rng: &mut R,
    location_id: LocationId,
    paths: usize,
    breadth: usize,
) -> LocationEffort {
    let breadth = breadth.max(1);
    let mut builder = EffortBuilder::new(location_id);
    for _ in 0..paths.max(1) {
        let depth = rng.gen_range(2..=Rank::Genus.index() + 1);
        let mut names: Vec<String> = Vec::with_capacity(depth);
        for rank in Rank::ALL.into_iter().take(depth) {
            let parent = names.last().map(String::as_str).unwrap_or("");
            let pick = rng.gen_range(0..breadth);
            names.push(format!("{}{}-{}", parent, &rank.name()[..1], pick));
        }
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        builder = builder.visits(rng.gen_range(1..=3)).path(&refs);
    }
    builder.build()
}

/// Generate `count` random records with IDs `1..=count`.
pub fn generate_random_efforts<R: Rng + ?Sized>(
    rng: &mut R,
    count: usize,
    breadth: usize,
) -> Vec<LocationEffort> {
    (1..=count as LocationId)
        .map(|id| {
            let paths = rng.gen_range(1..=6);
            generate_random_effort(rng, id, paths, breadth)
        })
        .collect()
}
