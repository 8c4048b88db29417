//! Configuration types and management for reanchor-rs.
//!
//! Every threshold used by the matching engine lives here so that callers can
//! tune them from a YAML file. The defaults are the values the heuristics
//! were calibrated against.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::errors::{Result, ReanchorError};

mod validation;

pub use validation::{validate_non_negative, validate_positive_usize, validate_unit_range};


/// Main configuration for the re-anchoring engine
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReanchorConfig {
    /// Candidate acceptance and disambiguation settings
    #[serde(default)]
    pub matching: MatchingConfig,

    /// Heuristic pipeline parameters
    #[serde(default)]
    pub heuristics: HeuristicsConfig,

    /// Context extraction settings
    #[serde(default)]
    pub context: ContextConfig,

    /// Performance and resource limits
    #[serde(default)]
    pub performance: PerformanceConfig,
}

impl ReanchorConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| {
            ReanchorError::io(format!("Failed to read config file: {}", path.display()), e)
        })?;

        let config: Self = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a YAML file
    pub fn to_yaml_file(&self, path: impl Into<PathBuf>) -> Result<()> {
        let path = path.into();
        let content = serde_yaml::to_string(self)?;
        std::fs::write(&path, content).map_err(|e| {
            ReanchorError::io(
                format!("Failed to write config file: {}", path.display()),
                e,
            )
        })
    }

    /// Validate every section
    pub fn validate(&self) -> Result<()> {
        self.matching.validate()?;
        self.heuristics.validate()?;
        self.context.validate()?;
        self.performance.validate()?;
        Ok(())
    }
}

/// Thresholds used when deciding whether a candidate can be accepted without review
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Minimum similarity for automatic acceptance and for keeping a candidate
    /// column in the assignment matrix
    pub acceptance_threshold: f64,

    /// Required ratio between the runner-up's distance and the winner's distance
    /// (`1 - second >= (1 - best) * factor`)
    pub distinctiveness_factor: f64,

    /// Minimum fuzzy similarity for a differently named file to be searched in local scope
    pub file_similarity_threshold: f64,

    /// Multiplier converting `1 - similarity` into integer assignment costs
    pub cost_scale: f64,

    /// Use sibling contexts to break ties between structurally identical candidates
    pub use_siblings: bool,

    /// Number of closest same-type neighbours recorded with a new point
    pub closest_count: usize,

    /// Minimum similarity for a neighbour to be recorded as closest context
    pub closest_min_similarity: f64,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            acceptance_threshold: 0.6,
            distinctiveness_factor: 1.5,
            file_similarity_threshold: 0.6,
            cost_scale: 1000.0,
            use_siblings: false,
            closest_count: 2,
            closest_min_similarity: 0.5,
        }
    }
}

impl MatchingConfig {
    /// Validate matching thresholds
    pub fn validate(&self) -> Result<()> {
        validate_unit_range(self.acceptance_threshold, "matching.acceptance_threshold")?;
        validate_unit_range(
            self.file_similarity_threshold,
            "matching.file_similarity_threshold",
        )?;
        validate_unit_range(
            self.closest_min_similarity,
            "matching.closest_min_similarity",
        )?;

        if self.distinctiveness_factor < 1.0 {
            return Err(ReanchorError::validation_field(
                "distinctiveness_factor must be at least 1.0",
                "matching.distinctiveness_factor",
            ));
        }

        if self.cost_scale < 1.0 {
            return Err(ReanchorError::validation_field(
                "cost_scale must be at least 1.0",
                "matching.cost_scale",
            ));
        }

        Ok(())
    }

    /// Whether `best` clears the absolute threshold and is distinctive enough
    /// against `second` (absent runner-up always passes the margin test, a
    /// tie never does)
    pub fn is_confident(&self, best: f64, second: Option<f64>) -> bool {
        if best < self.acceptance_threshold {
            return false;
        }

        match second {
            Some(second) => {
                second < best && 1.0 - second >= (1.0 - best) * self.distinctiveness_factor
            }
            None => true,
        }
    }
}

/// Weights applied when no heuristic decided otherwise
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DefaultWeights {
    /// Header context weight
    pub header: f64,
    /// Ancestors context weight
    pub ancestors: f64,
    /// Inner context weight
    pub inner: f64,
}

impl Default for DefaultWeights {
    fn default() -> Self {
        Self {
            header: 3.0,
            ancestors: 2.0,
            inner: 1.0,
        }
    }
}

/// Parameters of the built-in heuristics
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HeuristicsConfig {
    /// Fallback weights
    pub default_weights: DefaultWeights,

    /// Inner weight is zeroed unless some candidate reaches this inner similarity
    pub inner_similarity_ceiling: f64,

    /// Number of top candidates inspected when measuring how well a signal separates them
    pub separability_window: usize,

    /// Minimal gap between the best and second best value of a signal
    pub separation_margin: f64,
}

impl Default for HeuristicsConfig {
    fn default() -> Self {
        Self {
            default_weights: DefaultWeights::default(),
            inner_similarity_ceiling: 0.7,
            separability_window: 5,
            separation_margin: 0.05,
        }
    }
}

impl HeuristicsConfig {
    /// Validate heuristic parameters
    pub fn validate(&self) -> Result<()> {
        validate_non_negative(self.default_weights.header, "heuristics.default_weights.header")?;
        validate_non_negative(
            self.default_weights.ancestors,
            "heuristics.default_weights.ancestors",
        )?;
        validate_non_negative(self.default_weights.inner, "heuristics.default_weights.inner")?;
        validate_unit_range(
            self.inner_similarity_ceiling,
            "heuristics.inner_similarity_ceiling",
        )?;
        validate_unit_range(self.separation_margin, "heuristics.separation_margin")?;

        if self.separability_window < 2 {
            return Err(ReanchorError::validation_field(
                "separability_window must be at least 2",
                "heuristics.separability_window",
            ));
        }

        Ok(())
    }
}

/// Context extraction settings used by the language adapters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Comment marker opening a custom block
    pub custom_block_start: String,

    /// Comment marker closing a custom block
    pub custom_block_end: String,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            custom_block_start: "#region".to_string(),
            custom_block_end: "#endregion".to_string(),
        }
    }
}

impl ContextConfig {
    /// Validate marker settings
    pub fn validate(&self) -> Result<()> {
        if self.custom_block_start.trim().is_empty() || self.custom_block_end.trim().is_empty() {
            return Err(ReanchorError::validation_field(
                "custom block markers must not be empty",
                "context.custom_block_start",
            ));
        }

        if self.custom_block_start == self.custom_block_end {
            return Err(ReanchorError::validation_field(
                "custom block start and end markers must differ",
                "context.custom_block_end",
            ));
        }

        Ok(())
    }
}

/// Performance and resource limits
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceConfig {
    /// Size of the dedicated scoring thread pool (global rayon pool when unset)
    pub max_threads: Option<usize>,
}

impl PerformanceConfig {
    /// Validate resource limits
    pub fn validate(&self) -> Result<()> {
        if let Some(threads) = self.max_threads {
            validate_positive_usize(threads, "performance.max_threads")?;
        }
        Ok(())
    }
}
