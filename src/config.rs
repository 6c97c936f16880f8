//! Generator and dataset configuration
//!
//! Both structs deserialize from JSON with per-field defaults, so a config
//! file only needs the fields it changes.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::engine::DEFAULT_MAX_DEPTH;
use crate::error::{Error, Result};

/// Family universe generation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Total number of people, founders and outside spouses included (default: 50)
    #[serde(default = "default_population")]
    pub population: usize,

    /// Generation brackets below the founders (default: 4)
    #[serde(default = "default_max_generations")]
    pub max_generations: usize,

    /// Founder count; derived from population when absent
    #[serde(default)]
    pub founders: Option<usize>,

    /// Upper bound on children per couple (default: 4)
    #[serde(default = "default_max_children")]
    pub max_children: usize,

    /// Chance that a single without a partner in the bracket marries in
    /// from outside the family (default: 0.6)
    #[serde(default = "default_outside_spouse_probability")]
    pub outside_spouse_probability: f64,

    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_population() -> usize {
    50
}

fn default_max_generations() -> usize {
    4
}

fn default_max_children() -> usize {
    4
}

fn default_outside_spouse_probability() -> f64 {
    0.6
}

fn default_seed() -> u64 {
    1
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            population: default_population(),
            max_generations: default_max_generations(),
            founders: None,
            max_children: default_max_children(),
            outside_spouse_probability: default_outside_spouse_probability(),
            seed: default_seed(),
        }
    }
}

impl GeneratorConfig {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Default::default()
        }
    }

    /// Founders in bracket 0: the configured count, or an even share of the
    /// population per bracket. Never fewer than two.
    pub fn founder_count(&self) -> usize {
        self.founders
            .unwrap_or(self.population / (self.max_generations + 1))
            .max(2)
            .min(self.population.max(2))
    }

    pub fn validate(&self) -> Result<()> {
        if self.population < 2 {
            return Err(Error::Config(format!(
                "population must be at least 2, got {}",
                self.population
            )));
        }
        if self.max_generations == 0 {
            return Err(Error::Config("max_generations must be positive".to_string()));
        }
        if let Some(founders) = self.founders {
            if founders < 2 || founders > self.population {
                return Err(Error::Config(format!(
                    "founders must be between 2 and the population ({}), got {founders}",
                    self.population
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.outside_spouse_probability) {
            return Err(Error::Config(format!(
                "outside_spouse_probability must be within [0, 1], got {}",
                self.outside_spouse_probability
            )));
        }
        Ok(())
    }
}

/// Full dataset build parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetConfig {
    #[serde(default)]
    pub generator: GeneratorConfig,

    /// Resolution depth bound (default: 8)
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Keep at most this many questions per template; all when absent
    #[serde(default)]
    pub questions_per_template: Option<usize>,

    /// Sampling seed, independent of the generator seed
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Per-predicate weights applied over the default difficulty table
    #[serde(default)]
    pub difficulty_overrides: BTreeMap<String, u32>,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            generator: GeneratorConfig::default(),
            max_depth: default_max_depth(),
            questions_per_template: None,
            seed: default_seed(),
            difficulty_overrides: BTreeMap::new(),
        }
    }
}

impl DatasetConfig {
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: DatasetConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        self.generator.validate()?;
        if self.max_depth == 0 {
            return Err(Error::Config("max_depth must be positive".to_string()));
        }
        if self.questions_per_template == Some(0) {
            return Err(Error::Config(
                "questions_per_template must be positive when set".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DatasetConfig::default();
        assert_eq!(config.generator.population, 50);
        assert_eq!(config.generator.max_generations, 4);
        assert_eq!(config.max_depth, DEFAULT_MAX_DEPTH);
        assert!(config.questions_per_template.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config =
            DatasetConfig::from_json_str(r#"{"generator": {"population": 80}, "max_depth": 6}"#)
                .unwrap();
        assert_eq!(config.generator.population, 80);
        assert_eq!(config.generator.max_children, 4);
        assert_eq!(config.max_depth, 6);
        assert_eq!(config.seed, 1);
    }

    #[test]
    fn test_founder_count() {
        let config = GeneratorConfig::default();
        assert_eq!(config.founder_count(), 10);
        let small = GeneratorConfig {
            population: 3,
            ..Default::default()
        };
        assert_eq!(small.founder_count(), 2);
        let explicit = GeneratorConfig {
            founders: Some(6),
            ..Default::default()
        };
        assert_eq!(explicit.founder_count(), 6);
    }

    #[test]
    fn test_invalid_config_rejected() {
        for json in [
            r#"{"generator": {"population": 0}}"#,
            r#"{"generator": {"max_generations": 0}}"#,
            r#"{"generator": {"outside_spouse_probability": 1.5}}"#,
            r#"{"generator": {"founders": 1}}"#,
            r#"{"max_depth": 0}"#,
            r#"{"questions_per_template": 0}"#,
        ] {
            assert!(
                matches!(DatasetConfig::from_json_str(json), Err(Error::Config(_))),
                "{json} accepted"
            );
        }
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"generator": {"seed": 7}, "difficulty_overrides": {"count": 2}}"#)
            .unwrap();
        let config = DatasetConfig::from_json_file(&path).unwrap();
        assert_eq!(config.generator.seed, 7);
        assert_eq!(config.difficulty_overrides.get("count"), Some(&2));
    }
}
