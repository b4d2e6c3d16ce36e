//! Engine configuration: weights and thresholds for every component.
//!
//! Built once at startup (defaults, or a TOML file) and handed to each
//! component by reference. Every section and field falls back to its default
//! when absent, so a config file only lists what it overrides:
//!
//! ```toml
//! [difficulty]
//! user_familiarity_weight = 0.5
//!
//! [selection]
//! quality_floor = 0.4
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use crate::quiz_engine::{error::ConfigError, helpers::GENERIC_DISTRACTORS, quality::QualityMetric};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub difficulty: DifficultyConfig,
    pub controller: ControllerConfig,
    pub validator: ValidatorConfig,
    pub quality: QualityConfig,
    pub selection: SelectionConfig,
    pub generation: GenerationConfig,
}

/// Weights of the five difficulty factors in the base score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DifficultyWeights {
    pub player_obscurity: f64,
    pub time_period_distance: f64,
    pub statistical_complexity: f64,
    pub answer_ambiguity: f64,
    pub historical_significance: f64,
}

impl Default for DifficultyWeights {
    fn default() -> Self {
        Self {
            player_obscurity: 0.30,
            time_period_distance: 0.20,
            statistical_complexity: 0.20,
            answer_ambiguity: 0.15,
            historical_significance: 0.15,
        }
    }
}

impl DifficultyWeights {
    fn as_array(&self) -> [f64; 5] {
        [
            self.player_obscurity,
            self.time_period_distance,
            self.statistical_complexity,
            self.answer_ambiguity,
            self.historical_significance,
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DifficultyConfig {
    pub weights: DifficultyWeights,
    /// Largest fraction by which familiarity can lower a question's difficulty.
    pub user_familiarity_weight: f64,
}

impl Default for DifficultyConfig {
    fn default() -> Self {
        Self {
            weights: DifficultyWeights::default(),
            user_familiarity_weight: 0.3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub adaptation_factor: f64,
    /// Success rate the controller steers towards.
    pub setpoint: f64,
    /// Number of most recent responses the controller looks at.
    pub window: usize,
    pub min_target: f64,
    pub max_target: f64,
    /// Target used for anonymous requests.
    pub default_target: f64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            adaptation_factor: 0.1,
            setpoint: 0.75,
            window: 10,
            min_target: 0.1,
            max_target: 0.9,
            default_target: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    pub acceptance_threshold: f64,
    /// Placeholder options that must never be shown to a user.
    pub generic_distractors: Vec<String>,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            acceptance_threshold: 0.7,
            generic_distractors: GENERIC_DISTRACTORS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    /// Metrics missing from this map do not count towards the composite.
    pub weights: BTreeMap<QualityMetric, f64>,
    pub minimums: BTreeMap<QualityMetric, f64>,
    pub high_quality_threshold: f64,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            weights: QualityMetric::ALL
                .into_iter()
                .map(|m| (m, m.default_weight()))
                .collect(),
            minimums: BTreeMap::new(),
            high_quality_threshold: 0.75,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Candidates scoring below this composite quality are dropped.
    pub quality_floor: f64,
    pub max_distractors: usize,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            quality_floor: 0.3,
            max_distractors: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Reference year for time distance; `None` uses the current UTC year.
    pub current_year: Option<i32>,
    pub max_records_per_query: Option<usize>,
    pub min_age: i64,
    pub max_age: i64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            current_year: None,
            max_records_per_query: None,
            min_age: 16,
            max_age: 45,
        }
    }
}

impl GenerationConfig {
    pub fn resolved_year(&self) -> i32 {
        self.current_year.unwrap_or_else(|| chrono::Utc::now().year())
    }
}

impl EngineConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let weights = self.difficulty.weights.as_array();
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(invalid("difficulty weights must be finite and non-negative"));
        }
        unit("difficulty.user_familiarity_weight", self.difficulty.user_familiarity_weight)?;

        let c = &self.controller;
        unit("controller.setpoint", c.setpoint)?;
        unit("controller.min_target", c.min_target)?;
        unit("controller.max_target", c.max_target)?;
        unit("controller.default_target", c.default_target)?;
        if c.min_target > c.max_target {
            return Err(invalid("controller.min_target exceeds controller.max_target"));
        }
        if c.window == 0 {
            return Err(invalid("controller.window must be positive"));
        }
        if !c.adaptation_factor.is_finite() {
            return Err(invalid("controller.adaptation_factor must be finite"));
        }

        unit("validator.acceptance_threshold", self.validator.acceptance_threshold)?;

        let q = &self.quality;
        if q.weights.values().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(invalid("quality weights must be finite and non-negative"));
        }
        if q.weights.values().sum::<f64>() <= 0.0 {
            return Err(invalid("quality weights must not all be zero"));
        }
        for (metric, minimum) in &q.minimums {
            unit(metric.name(), *minimum)?;
        }
        unit("quality.high_quality_threshold", q.high_quality_threshold)?;

        unit("selection.quality_floor", self.selection.quality_floor)?;
        if self.selection.max_distractors == 0 {
            return Err(invalid("selection.max_distractors must be positive"));
        }

        if self.generation.min_age >= self.generation.max_age {
            return Err(invalid("generation.min_age must be below generation.max_age"));
        }
        Ok(())
    }
}

fn invalid(msg: impl Into<String>) -> ConfigError {
    ConfigError::Invalid(msg.into())
}

fn unit(name: &str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(invalid(format!("{name} must lie in [0, 1], got {value}")))
    }
}
