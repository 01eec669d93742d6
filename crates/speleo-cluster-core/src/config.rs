//! Configuration management for speleo-cluster.
//!
//! Options are plain strings and numbers so they can come from TOML files or
//! environment variables; [`ClusteringParams::from_config`] parses and
//! validates the clustering section.
//!
//! [`ClusteringParams::from_config`]: crate::clustering::ClusteringParams::from_config

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::clustering::ClusteringParams;
use crate::error::{CoreError, CoreResult};

/// Environment variable selecting the environment-specific config file.
pub const ENV_SELECTOR: &str = "SPELEO_CLUSTER_ENV";

/// Prefix for environment overrides, e.g. `SPELEO_CLUSTER__CLUSTERING__SCOPE`.
pub const ENV_PREFIX: &str = "SPELEO_CLUSTER";

/// Main configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub clustering: ClusteringConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

impl Config {
    /// Load configuration from files and environment.
    ///
    /// Configuration is loaded in order:
    /// 1. config/default.toml (base settings)
    /// 2. config/{SPELEO_CLUSTER_ENV}.toml (environment-specific)
    /// 3. Environment variables with the SPELEO_CLUSTER prefix, `__` separated
    pub fn load() -> CoreResult<Self> {
        let env = std::env::var(ENV_SELECTOR).unwrap_or_else(|_| "development".to_string());

        let builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{}", env)).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"));

        let config: Config = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Configuration with defaults for testing/development.
    pub fn default_config() -> Self {
        Self {
            logging: LoggingConfig::default(),
            clustering: ClusteringConfig::default(),
            cache: CacheConfig::default(),
        }
    }

    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CoreError::ConfigError(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| CoreError::ConfigError(format!("Failed to parse config file: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> CoreResult<()> {
        if !matches!(self.logging.format.as_str(), "pretty" | "compact") {
            return Err(CoreError::ConfigError(format!(
                "logging.format must be 'pretty' or 'compact', got '{}'",
                self.logging.format
            )));
        }

        ClusteringParams::from_config(&self.clustering)
            .map_err(|e| CoreError::ConfigError(format!("clustering: {}", e)))?;

        Ok(())
    }
}

// ============================================================================
// LoggingConfig
// ============================================================================

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` takes precedence when set.
    #[serde(default = "default_level")]
    pub level: String,

    /// "pretty" or "compact"
    #[serde(default = "default_format")]
    pub format: String,

    #[serde(default)]
    pub include_location: bool,
}

fn default_level() -> String {
    "info".to_string()
}

fn default_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: default_format(),
            include_location: false,
        }
    }
}

// ============================================================================
// ClusteringConfig
// ============================================================================

/// Per-invocation clustering options in string form.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClusteringConfig {
    /// Comparison scope tag (required, non-empty).
    #[serde(default = "default_scope")]
    pub scope: String,

    /// One of: minus-common, diff-minus-common, both-diffs-minus-common,
    /// diff-taxa, both-diffs-taxa
    #[serde(default = "default_basis")]
    pub basis: String,

    /// One of: uniform, linear, linear-1.5, linear-2, squared, genus-and-below
    #[serde(default = "default_weight_scheme")]
    pub weight_scheme: String,

    /// Broadest rank that carries weight, kingdom..subspecies
    #[serde(default = "default_rank_cutoff")]
    pub rank_cutoff: String,

    /// One of: identity, ln, sqrt, pow-1.5
    #[serde(default = "default_transform")]
    pub transform: String,

    #[serde(default = "default_min_species")]
    pub min_species: u32,

    #[serde(default = "default_max_species")]
    pub max_species: u32,

    #[serde(default = "default_max_clusters")]
    pub max_clusters: usize,

    /// "cumulative" or "per-seed"
    #[serde(default = "default_seed_comparison")]
    pub seed_comparison: String,

    #[serde(default = "default_page_size")]
    pub page_size: usize,

    #[serde(default)]
    pub greatest_lower_dissimilarity: f64,

    /// Unset runs reassignment to a fixed point.
    #[serde(default)]
    pub max_passes: Option<usize>,
}

// ============================================================================
// Serde Default Functions for ClusteringConfig
// ============================================================================

fn default_scope() -> String {
    "default".to_string()
}

fn default_basis() -> String {
    "diff-taxa".to_string()
}

fn default_weight_scheme() -> String {
    "uniform".to_string()
}

fn default_rank_cutoff() -> String {
    "kingdom".to_string()
}

fn default_transform() -> String {
    "identity".to_string()
}

fn default_min_species() -> u32 {
    1
}

fn default_max_species() -> u32 {
    u32::MAX
}

fn default_max_clusters() -> usize {
    5
}

fn default_seed_comparison() -> String {
    "cumulative".to_string()
}

fn default_page_size() -> usize {
    crate::clustering::DEFAULT_PAGE_SIZE
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            scope: default_scope(),
            basis: default_basis(),
            weight_scheme: default_weight_scheme(),
            rank_cutoff: default_rank_cutoff(),
            transform: default_transform(),
            min_species: default_min_species(),
            max_species: default_max_species(),
            max_clusters: default_max_clusters(),
            seed_comparison: default_seed_comparison(),
            page_size: default_page_size(),
            greatest_lower_dissimilarity: 0.0,
            max_passes: None,
        }
    }
}

// ============================================================================
// CacheConfig
// ============================================================================

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    /// Decode through a shared effort cache.
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,
}

fn default_cache_enabled() -> bool {
    true
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default_config();
        assert_eq!(config.clustering.scope, "default");
        assert_eq!(config.clustering.basis, "diff-taxa");
        assert_eq!(config.clustering.page_size, 100);
        assert!(config.cache.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_fails_unknown_basis() {
        let mut config = Config::default_config();
        config.clustering.basis = "jaccard".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("jaccard"), "got: {}", err);
    }

    #[test]
    fn test_validation_fails_empty_scope() {
        let mut config = Config::default_config();
        config.clustering.scope = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_fails_bad_log_format() {
        let mut config = Config::default_config();
        config.logging.format = "json".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file_partial_toml() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(
            file,
            r#"
[clustering]
scope = "edwards-plateau"
basis = "both-diffs-taxa"
weight_scheme = "linear"
rank_cutoff = "order"
max_clusters = 4
seed_comparison = "per-seed"
max_passes = 50

[cache]
enabled = false
"#
        )
        .expect("write config");

        let config = Config::from_file(file.path()).expect("config loads");
        assert_eq!(config.clustering.scope, "edwards-plateau");
        assert_eq!(config.clustering.max_clusters, 4);
        assert_eq!(config.clustering.max_passes, Some(50));
        assert_eq!(config.clustering.transform, "identity", "missing keys use defaults");
        assert_eq!(config.logging.level, "info");
        assert!(!config.cache.enabled);

        println!("[PASS] test_from_file_partial_toml - scope={}", config.clustering.scope);
    }

    #[test]
    fn test_from_file_rejects_invalid_values() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "[clustering]\ntransform = \"cube\"").expect("write config");

        let err = Config::from_file(file.path()).unwrap_err();
        assert!(matches!(err, CoreError::ConfigError(_)));
    }

    #[test]
    fn test_from_file_missing_path() {
        let dir = tempfile::tempdir().expect("temp dir");
        let err = Config::from_file(&dir.path().join("absent.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_config_serialization_round_trip() {
        let mut config = Config::default_config();
        config.clustering.max_passes = Some(12);
        config.clustering.rank_cutoff = "genus".into();

        let toml_str = toml::to_string(&config).expect("Config must serialize to TOML");
        let deserialized: Config =
            toml::from_str(&toml_str).expect("Config must deserialize from TOML");

        assert_eq!(deserialized.clustering.max_passes, Some(12));
        assert_eq!(deserialized.clustering.rank_cutoff, "genus");
        assert_eq!(deserialized.clustering.max_species, u32::MAX);
        assert_eq!(deserialized.logging.format, config.logging.format);
    }
}
