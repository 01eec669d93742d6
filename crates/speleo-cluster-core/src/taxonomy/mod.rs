//! Taxonomic ranks, per-location effort records and decoded taxon tallies.

mod effort;
mod rank;
mod tally;

pub use effort::{
    LocationEffort, LocationId, RankEffort, SpeciesFilter, BRANCH_MARKER, LEAF_MARKER,
};
pub use rank::{Rank, RANK_COUNT};
pub use tally::{TallyEntry, TaxonPath, TaxonTally};
