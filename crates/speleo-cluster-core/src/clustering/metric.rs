//! Dissimilarity metrics over taxon tallies.
//!
//! A metric is assembled once from a [`MetricConfig`]:
//!
//! - a [`RankWeights`] table (per-rank weight, zero above the rank cutoff),
//! - a combining function picked by [`Basis`] from the weighted overlap of the
//!   two tallies,
//! - a [`Transform`] applied to the combined value.
//!
//! Every basis is oriented so that a lower score means "closer". The
//! `minus-common` basis is a negated similarity.
//!
//! # Example
//!
//! ```
//! use speleo_cluster_core::clustering::{Basis, DissimilarityMetric, MetricConfig};
//! use speleo_cluster_core::taxonomy::{TaxonPath, TaxonTally};
//!
//! let mut cave_a = TaxonTally::new();
//! cave_a.merge_path(&TaxonPath::from_names(&["Animalia", "Arthropoda"]), 1);
//! let mut cave_b = cave_a.clone();
//! cave_b.merge_path(&TaxonPath::from_names(&["Animalia", "Mollusca"]), 1);
//!
//! let metric = DissimilarityMetric::new(MetricConfig::default().with_basis(Basis::DiffTaxa));
//! assert_eq!(metric.score(&cave_a, &cave_b), 1.0);
//! assert_eq!(metric.score(&cave_b, &cave_a), 0.0);
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::taxonomy::{Rank, TaxonTally, RANK_COUNT};

// =============================================================================
// Enumerated options
// =============================================================================

/// Formula combining shared and differing weighted taxa into one score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Basis {
    /// Negative weight of taxa present in both tallies.
    MinusCommon,
    /// Weight of candidate-only taxa minus weight of shared taxa.
    DiffMinusCommon,
    /// Weight of taxa in exactly one tally minus weight of shared taxa.
    BothDiffsMinusCommon,
    /// Weight of candidate taxa missing from the cluster.
    DiffTaxa,
    /// Weight of the symmetric difference.
    BothDiffsTaxa,
}

impl Basis {
    pub const ALL: [Basis; 5] = [
        Basis::MinusCommon,
        Basis::DiffMinusCommon,
        Basis::BothDiffsMinusCommon,
        Basis::DiffTaxa,
        Basis::BothDiffsTaxa,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Basis::MinusCommon => "minus-common",
            Basis::DiffMinusCommon => "diff-minus-common",
            Basis::BothDiffsMinusCommon => "both-diffs-minus-common",
            Basis::DiffTaxa => "diff-taxa",
            Basis::BothDiffsTaxa => "both-diffs-taxa",
        }
    }

    /// Whether the raw aggregate can be negative.
    ///
    /// Signed bases get the transform applied to the magnitude with the sign
    /// restored afterwards.
    #[inline]
    pub fn is_signed(self) -> bool {
        matches!(
            self,
            Basis::MinusCommon | Basis::DiffMinusCommon | Basis::BothDiffsMinusCommon
        )
    }
}

/// Per-rank weighting rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WeightScheme {
    /// Weight 1 at every rank from the cutoff down.
    Uniform,
    /// Weight `d`, the 1-based distance below the cutoff.
    Linear,
    /// Weight `1.5 * d`.
    #[serde(rename = "linear-1.5")]
    Linear1_5,
    /// Weight `2 * d`.
    #[serde(rename = "linear-2")]
    Linear2,
    /// Weight `d * d`.
    Squared,
    /// Weight 1 at genus, species and subspecies only.
    GenusAndBelow,
}

impl WeightScheme {
    pub const ALL: [WeightScheme; 6] = [
        WeightScheme::Uniform,
        WeightScheme::Linear,
        WeightScheme::Linear1_5,
        WeightScheme::Linear2,
        WeightScheme::Squared,
        WeightScheme::GenusAndBelow,
    ];

    pub fn name(self) -> &'static str {
        match self {
            WeightScheme::Uniform => "uniform",
            WeightScheme::Linear => "linear",
            WeightScheme::Linear1_5 => "linear-1.5",
            WeightScheme::Linear2 => "linear-2",
            WeightScheme::Squared => "squared",
            WeightScheme::GenusAndBelow => "genus-and-below",
        }
    }
}

/// Post-aggregation transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Transform {
    Identity,
    /// Natural log, non-positive input maps to 0.
    Ln,
    /// Square root, non-positive input maps to 0.
    Sqrt,
    /// `x^1.5`, non-positive input maps to 0.
    #[serde(rename = "pow-1.5")]
    Pow1_5,
}

impl Transform {
    pub const ALL: [Transform; 4] = [
        Transform::Identity,
        Transform::Ln,
        Transform::Sqrt,
        Transform::Pow1_5,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Transform::Identity => "identity",
            Transform::Ln => "ln",
            Transform::Sqrt => "sqrt",
            Transform::Pow1_5 => "pow-1.5",
        }
    }

    /// Apply the transform directly.
    pub fn apply(self, x: f64) -> f64 {
        match self {
            Transform::Identity => x,
            _ if x <= 0.0 => 0.0,
            Transform::Ln => x.ln(),
            Transform::Sqrt => x.sqrt(),
            Transform::Pow1_5 => x.powf(1.5),
        }
    }

    /// Apply the transform to `|x|` and restore the sign of `x`.
    pub fn apply_signed(self, x: f64) -> f64 {
        if x < 0.0 {
            -self.apply(-x)
        } else {
            self.apply(x)
        }
    }
}

macro_rules! named_option {
    ($ty:ident, $what:literal) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }

        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim().to_ascii_lowercase();
                $ty::ALL
                    .iter()
                    .copied()
                    .find(|option| option.name() == wanted)
                    .ok_or_else(|| format!("unknown {} '{}'", $what, s))
            }
        }
    };
}

named_option!(Basis, "dissimilarity basis");
named_option!(WeightScheme, "weight scheme");
named_option!(Transform, "transform");

// =============================================================================
// MetricConfig
// =============================================================================

/// Immutable metric configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricConfig {
    pub basis: Basis,
    pub weight_scheme: WeightScheme,
    /// Ranks broader than this one carry no weight.
    pub rank_cutoff: Rank,
    pub transform: Transform,
}

impl Default for MetricConfig {
    fn default() -> Self {
        Self {
            basis: Basis::DiffTaxa,
            weight_scheme: WeightScheme::Uniform,
            rank_cutoff: Rank::Kingdom,
            transform: Transform::Identity,
        }
    }
}

impl MetricConfig {
    #[must_use]
    pub fn with_basis(mut self, basis: Basis) -> Self {
        self.basis = basis;
        self
    }

    #[must_use]
    pub fn with_weight_scheme(mut self, weight_scheme: WeightScheme) -> Self {
        self.weight_scheme = weight_scheme;
        self
    }

    #[must_use]
    pub fn with_rank_cutoff(mut self, rank_cutoff: Rank) -> Self {
        self.rank_cutoff = rank_cutoff;
        self
    }

    #[must_use]
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }
}

// =============================================================================
// RankWeights
// =============================================================================

/// Weight per rank index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankWeights([f64; RANK_COUNT]);

impl RankWeights {
    /// Build the weight table for a scheme and cutoff.
    pub fn build(scheme: WeightScheme, cutoff: Rank) -> Self {
        let mut weights = [0.0; RANK_COUNT];
        for rank in Rank::ALL.into_iter().filter(|r| *r >= cutoff) {
            let d = (rank.index() - cutoff.index() + 1) as f64;
            weights[rank.index()] = match scheme {
                WeightScheme::Uniform => 1.0,
                WeightScheme::Linear => d,
                WeightScheme::Linear1_5 => 1.5 * d,
                WeightScheme::Linear2 => 2.0 * d,
                WeightScheme::Squared => d * d,
                WeightScheme::GenusAndBelow if rank >= Rank::Genus => 1.0,
                WeightScheme::GenusAndBelow => 0.0,
            };
        }
        Self(weights)
    }

    #[inline]
    pub fn get(&self, rank: Rank) -> f64 {
        self.0[rank.index()]
    }

    pub fn as_array(&self) -> &[f64; RANK_COUNT] {
        &self.0
    }
}

// =============================================================================
// Overlap
// =============================================================================

/// Weighted presence/absence summary of two tallies.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Overlap {
    /// Weight of taxa present in both.
    pub common: f64,
    /// Weight of taxa only in the candidate.
    pub candidate_only: f64,
    /// Weight of taxa only in the cluster.
    pub cluster_only: f64,
}

impl Overlap {
    /// Measure the weighted overlap; zero-weight ranks are skipped.
    pub fn measure(weights: &RankWeights, cluster: &TaxonTally, candidate: &TaxonTally) -> Self {
        let mut overlap = Overlap::default();
        for rank in Rank::ALL {
            let w = weights.get(rank);
            if w == 0.0 {
                continue;
            }
            for entry in candidate.entries(rank) {
                if cluster.contains(rank, &entry.name) {
                    overlap.common += w;
                } else {
                    overlap.candidate_only += w;
                }
            }
            for entry in cluster.entries(rank) {
                if !candidate.contains(rank, &entry.name) {
                    overlap.cluster_only += w;
                }
            }
        }
        overlap
    }
}

/// Combining function for one basis.
pub type Combiner = fn(&Overlap) -> f64;

/// Pick the combining function for a basis.
pub fn combiner(basis: Basis) -> Combiner {
    match basis {
        Basis::MinusCommon => |o: &Overlap| -o.common,
        Basis::DiffMinusCommon => |o: &Overlap| o.candidate_only - o.common,
        Basis::BothDiffsMinusCommon => |o: &Overlap| o.candidate_only + o.cluster_only - o.common,
        Basis::DiffTaxa => |o: &Overlap| o.candidate_only,
        Basis::BothDiffsTaxa => |o: &Overlap| o.candidate_only + o.cluster_only,
    }
}

// =============================================================================
// DissimilarityMetric
// =============================================================================

/// Scoring function assembled from a [`MetricConfig`].
///
/// Stateless after construction; copy it freely.
#[derive(Clone, Copy)]
pub struct DissimilarityMetric {
    config: MetricConfig,
    weights: RankWeights,
    combine: Combiner,
}

impl DissimilarityMetric {
    pub fn new(config: MetricConfig) -> Self {
        Self {
            config,
            weights: RankWeights::build(config.weight_scheme, config.rank_cutoff),
            combine: combiner(config.basis),
        }
    }

    /// Score a candidate tally against a cluster tally. Lower is closer.
    pub fn score(&self, cluster: &TaxonTally, candidate: &TaxonTally) -> f64 {
        let raw = (self.combine)(&Overlap::measure(&self.weights, cluster, candidate));
        if self.config.basis.is_signed() {
            self.config.transform.apply_signed(raw)
        } else {
            self.config.transform.apply(raw)
        }
    }

    pub fn config(&self) -> &MetricConfig {
        &self.config
    }

    pub fn weights(&self) -> &RankWeights {
        &self.weights
    }
}

impl fmt::Debug for DissimilarityMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DissimilarityMetric")
            .field("config", &self.config)
            .field("weights", &self.weights)
            .finish()
    }
}
