//! Validated per-invocation clustering parameters.

use super::error::ClusterError;
use super::metric::{Basis, MetricConfig, Transform, WeightScheme};
use super::seeds::{SeedComparison, SeedRequest};
use crate::config::ClusteringConfig;
use crate::taxonomy::{Rank, SpeciesFilter};

/// Records requested from the provider per page.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Everything one clustering invocation needs besides its collaborators.
///
/// Build with [`ClusteringParams::new`] and the `with_*` methods, or from a
/// string-valued [`ClusteringConfig`] with [`ClusteringParams::from_config`].
/// The engine validates on construction.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusteringParams {
    pub metric: MetricConfig,

    /// Comparison scope tag passed to the provider and the cache.
    pub scope: String,

    /// Eligible total-species range, inclusive.
    pub filter: SpeciesFilter,

    /// Requested seed count (K).
    pub max_clusters: usize,

    pub seed_comparison: SeedComparison,

    pub page_size: usize,

    /// Baseline a seed candidate must exceed.
    pub greatest_lower_dissimilarity: f64,

    /// Upper bound on reassignment passes; `None` runs to a fixed point.
    pub max_passes: Option<usize>,
}

impl ClusteringParams {
    pub fn new(scope: impl Into<String>, max_clusters: usize) -> Self {
        Self {
            metric: MetricConfig::default(),
            scope: scope.into(),
            filter: SpeciesFilter::default(),
            max_clusters,
            seed_comparison: SeedComparison::default(),
            page_size: DEFAULT_PAGE_SIZE,
            greatest_lower_dissimilarity: 0.0,
            max_passes: None,
        }
    }

    #[must_use]
    pub fn with_metric(mut self, metric: MetricConfig) -> Self {
        self.metric = metric;
        self
    }

    #[must_use]
    pub fn with_species_range(mut self, min_species: u32, max_species: u32) -> Self {
        self.filter = SpeciesFilter::new(min_species, max_species);
        self
    }

    #[must_use]
    pub fn with_seed_comparison(mut self, seed_comparison: SeedComparison) -> Self {
        self.seed_comparison = seed_comparison;
        self
    }

    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    #[must_use]
    pub fn with_greatest_lower_dissimilarity(mut self, value: f64) -> Self {
        self.greatest_lower_dissimilarity = value;
        self
    }

    #[must_use]
    pub fn with_max_passes(mut self, max_passes: usize) -> Self {
        self.max_passes = Some(max_passes);
        self
    }

    /// Parse and validate a string-valued configuration section.
    ///
    /// # Errors
    ///
    /// `ClusterError::InvalidParameter` naming the first unknown option or
    /// out-of-range value.
    pub fn from_config(config: &ClusteringConfig) -> Result<Self, ClusterError> {
        let metric = MetricConfig {
            basis: parse::<Basis>(&config.basis)?,
            weight_scheme: parse::<WeightScheme>(&config.weight_scheme)?,
            rank_cutoff: parse::<Rank>(&config.rank_cutoff)?,
            transform: parse::<Transform>(&config.transform)?,
        };

        let params = Self {
            metric,
            scope: config.scope.clone(),
            filter: SpeciesFilter::new(config.min_species, config.max_species),
            max_clusters: config.max_clusters,
            seed_comparison: parse::<SeedComparison>(&config.seed_comparison)?,
            page_size: config.page_size,
            greatest_lower_dissimilarity: config.greatest_lower_dissimilarity,
            max_passes: config.max_passes,
        };
        params.validate()?;
        Ok(params)
    }

    /// Check ranges and required values.
    pub fn validate(&self) -> Result<(), ClusterError> {
        if self.scope.trim().is_empty() {
            return Err(ClusterError::invalid_parameter("scope must be specified"));
        }
        if self.filter.min_species > self.filter.max_species {
            return Err(ClusterError::invalid_parameter(format!(
                "min_species ({}) exceeds max_species ({})",
                self.filter.min_species, self.filter.max_species
            )));
        }
        if self.max_clusters == 0 {
            return Err(ClusterError::invalid_parameter(
                "max_clusters must be greater than 0",
            ));
        }
        if self.page_size == 0 {
            return Err(ClusterError::invalid_parameter(
                "page_size must be greater than 0",
            ));
        }
        if !self.greatest_lower_dissimilarity.is_finite() {
            return Err(ClusterError::invalid_parameter(
                "greatest_lower_dissimilarity must be finite",
            ));
        }
        if self.max_passes == Some(0) {
            return Err(ClusterError::invalid_parameter(
                "max_passes must be greater than 0 when set",
            ));
        }
        Ok(())
    }

    pub(crate) fn seed_request(&self) -> SeedRequest {
        SeedRequest {
            filter: self.filter,
            count: self.max_clusters,
            comparison: self.seed_comparison,
            greatest_lower_dissimilarity: self.greatest_lower_dissimilarity,
            page_size: self.page_size,
        }
    }
}

fn parse<T>(value: &str) -> Result<T, ClusterError>
where
    T: std::str::FromStr<Err = String>,
{
    value.parse::<T>().map_err(ClusterError::invalid_parameter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let params = ClusteringParams::new("caves", 3);
        assert!(params.validate().is_ok());
        assert_eq!(params.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(params.max_passes, None);
        assert_eq!(params.seed_comparison, SeedComparison::Cumulative);
    }

    #[test]
    fn test_from_config_parses_names() {
        let config = ClusteringConfig {
            scope: "texas".into(),
            basis: "both-diffs-minus-common".into(),
            weight_scheme: "linear-2".into(),
            rank_cutoff: "family".into(),
            transform: "sqrt".into(),
            seed_comparison: "per-seed".into(),
            max_passes: Some(25),
            ..ClusteringConfig::default()
        };

        let params = ClusteringParams::from_config(&config).expect("valid config");
        assert_eq!(params.metric.basis, Basis::BothDiffsMinusCommon);
        assert_eq!(params.metric.weight_scheme, WeightScheme::Linear2);
        assert_eq!(params.metric.rank_cutoff, Rank::Family);
        assert_eq!(params.metric.transform, Transform::Sqrt);
        assert_eq!(params.seed_comparison, SeedComparison::PerSeed);
        assert_eq!(params.max_passes, Some(25));
        println!("[PASS] test_from_config_parses_names - metric={:?}", params.metric);
    }

    #[test]
    fn test_unknown_names_are_rejected() {
        let cases = [
            ClusteringConfig {
                basis: "jaccard".into(),
                ..ClusteringConfig::default()
            },
            ClusteringConfig {
                weight_scheme: "cubic".into(),
                ..ClusteringConfig::default()
            },
            ClusteringConfig {
                transform: "log10".into(),
                ..ClusteringConfig::default()
            },
            ClusteringConfig {
                rank_cutoff: "tribe".into(),
                ..ClusteringConfig::default()
            },
            ClusteringConfig {
                seed_comparison: "pairwise".into(),
                ..ClusteringConfig::default()
            },
        ];

        for config in cases {
            let err = ClusteringParams::from_config(&config).unwrap_err();
            assert!(
                matches!(err, ClusterError::InvalidParameter { .. }),
                "expected InvalidParameter, got {:?}",
                err
            );
        }
    }

    #[test]
    fn test_range_validation() {
        let invalid = [
            ClusteringParams::new("   ", 2),
            ClusteringParams::new("caves", 0),
            ClusteringParams::new("caves", 2).with_species_range(10, 2),
            ClusteringParams::new("caves", 2).with_page_size(0),
            ClusteringParams::new("caves", 2).with_max_passes(0),
            ClusteringParams::new("caves", 2).with_greatest_lower_dissimilarity(f64::NAN),
        ];
        for params in invalid {
            assert!(params.validate().is_err(), "{:?} should be rejected", params);
        }

        let edge = ClusteringParams::new("caves", 1).with_species_range(4, 4);
        assert!(edge.validate().is_ok(), "equal bounds are allowed");
    }
}
