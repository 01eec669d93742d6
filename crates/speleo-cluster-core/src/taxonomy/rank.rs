//! Taxonomic ranks, ordered broad to narrow.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Number of taxonomic ranks tracked per location.
pub const RANK_COUNT: usize = 8;

/// One of the eight taxonomic levels, kingdom through subspecies.
///
/// The discriminant is the rank index used throughout the engine: a lower
/// index is a broader rank.
///
/// # Example
///
/// ```
/// use speleo_cluster_core::taxonomy::Rank;
///
/// assert_eq!(Rank::Genus.index(), 5);
/// assert_eq!(Rank::from_index(6), Some(Rank::Species));
/// assert!(Rank::Kingdom < Rank::Subspecies);
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Rank {
    Kingdom = 0,
    Phylum = 1,
    Class = 2,
    Order = 3,
    Family = 4,
    Genus = 5,
    Species = 6,
    Subspecies = 7,
}

impl Rank {
    /// All ranks in index order.
    pub const ALL: [Rank; RANK_COUNT] = [
        Rank::Kingdom,
        Rank::Phylum,
        Rank::Class,
        Rank::Order,
        Rank::Family,
        Rank::Genus,
        Rank::Species,
        Rank::Subspecies,
    ];

    /// Rank index in `0..RANK_COUNT`.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Rank for an index, `None` when out of range.
    pub fn from_index(index: usize) -> Option<Rank> {
        Self::ALL.get(index).copied()
    }

    /// Lowercase rank name.
    pub fn name(self) -> &'static str {
        match self {
            Rank::Kingdom => "kingdom",
            Rank::Phylum => "phylum",
            Rank::Class => "class",
            Rank::Order => "order",
            Rank::Family => "family",
            Rank::Genus => "genus",
            Rank::Species => "species",
            Rank::Subspecies => "subspecies",
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Rank {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|rank| rank.name() == wanted)
            .ok_or_else(|| format!("unknown rank '{}'", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_roundtrip() {
        for (i, rank) in Rank::ALL.iter().enumerate() {
            assert_eq!(rank.index(), i);
            assert_eq!(Rank::from_index(i), Some(*rank));
        }
        assert_eq!(Rank::from_index(RANK_COUNT), None);
        println!("[PASS] test_index_roundtrip - {} ranks", RANK_COUNT);
    }

    #[test]
    fn test_parse_rank_names() {
        assert_eq!("Genus".parse::<Rank>().unwrap(), Rank::Genus);
        assert_eq!(" subspecies ".parse::<Rank>().unwrap(), Rank::Subspecies);
        let err = "tribe".parse::<Rank>().unwrap_err();
        assert!(err.contains("tribe"));
    }
}
