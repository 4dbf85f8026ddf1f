// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Evaluation configuration loaded from TOML files or constructed programmatically.
//!
//! # TOML Format
//! ```toml
//! models_dir = "./models"
//! chunk_size = 32
//! runs = 5
//! base_seed = 42
//! weighting = "equal"      # or "by-size"
//! memory_budget = "64M"    # optional cap on one stacked chunk
//! parallel_models = false
//! ```

use crate::{ChunkWeighting, EvalError};
use memory_manager::MemoryBudget;
use std::path::{Path, PathBuf};

/// Configuration for an evaluation.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EvalConfig {
    /// Directory holding `variants.json` and the weight files.
    pub models_dir: PathBuf,
    /// Maximum images per chunk.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Number of seeded runs.
    #[serde(default = "default_runs")]
    pub runs: usize,
    /// Seed of run 0; run `i` uses `base_seed + i`.
    #[serde(default = "default_seed")]
    pub base_seed: u64,
    /// How chunk metrics are weighted within a run.
    #[serde(default)]
    pub weighting: ChunkWeighting,
    /// Optional ceiling on one stacked chunk (human-readable, e.g. `"64M"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_budget: Option<String>,
    /// Evaluate the models of a chunk on the rayon pool.
    #[serde(default)]
    pub parallel_models: bool,
}

fn default_chunk_size() -> usize {
    32
}

fn default_runs() -> usize {
    1
}

fn default_seed() -> u64 {
    42
}

impl EvalConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, EvalError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            EvalError::InvalidConfiguration(format!(
                "cannot read config '{}': {e}",
                path.display()
            ))
        })?;
        Self::from_toml(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, EvalError> {
        toml::from_str(toml_str)
            .map_err(|e| EvalError::InvalidConfiguration(format!("TOML parse error: {e}")))
    }

    /// Serialises configuration to TOML.
    pub fn to_toml(&self) -> Result<String, EvalError> {
        toml::to_string_pretty(self)
            .map_err(|e| EvalError::InvalidConfiguration(format!("TOML serialise error: {e}")))
    }

    /// Parses the optional memory budget.
    pub fn parse_budget(&self) -> Result<Option<MemoryBudget>, EvalError> {
        self.memory_budget
            .as_deref()
            .map(MemoryBudget::parse)
            .transpose()
            .map_err(|e| EvalError::InvalidConfiguration(format!("invalid budget: {e}")))
    }

    /// Checks every value that must hold before any computation starts.
    pub fn validate(&self) -> Result<(), EvalError> {
        if self.chunk_size == 0 {
            return Err(EvalError::InvalidConfiguration(
                "chunk_size must be at least 1".into(),
            ));
        }
        if self.runs == 0 {
            return Err(EvalError::InvalidConfiguration(
                "runs must be at least 1".into(),
            ));
        }
        self.parse_budget()?;
        Ok(())
    }
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            models_dir: PathBuf::from("./models"),
            chunk_size: default_chunk_size(),
            runs: default_runs(),
            base_seed: default_seed(),
            weighting: ChunkWeighting::Equal,
            memory_budget: None,
            parallel_models: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let c = EvalConfig::default();
        assert_eq!(c.chunk_size, 32);
        assert_eq!(c.runs, 1);
        assert_eq!(c.base_seed, 42);
        assert_eq!(c.weighting, ChunkWeighting::Equal);
        c.validate().unwrap();
    }

    #[test]
    fn test_from_toml() {
        let toml = r#"
models_dir = "/tmp/models"
chunk_size = 16
runs = 5
base_seed = 7
weighting = "by-size"
memory_budget = "8M"
parallel_models = true
"#;
        let c = EvalConfig::from_toml(toml).unwrap();
        assert_eq!(c.models_dir, PathBuf::from("/tmp/models"));
        assert_eq!(c.chunk_size, 16);
        assert_eq!(c.runs, 5);
        assert_eq!(c.base_seed, 7);
        assert_eq!(c.weighting, ChunkWeighting::BySize);
        assert_eq!(c.parse_budget().unwrap().unwrap().as_mb(), 8);
        assert!(c.parallel_models);
    }

    #[test]
    fn test_from_toml_defaults() {
        let c = EvalConfig::from_toml(r#"models_dir = "m""#).unwrap();
        assert_eq!(c.chunk_size, 32);
        assert_eq!(c.parse_budget().unwrap(), None);
        assert!(!c.parallel_models);
    }

    #[test]
    fn test_unknown_weighting() {
        assert!(EvalConfig::from_toml("models_dir = \"m\"\nweighting = \"median\"").is_err());
    }

    #[test]
    fn test_to_toml_roundtrip() {
        let c = EvalConfig {
            runs: 3,
            weighting: ChunkWeighting::BySize,
            memory_budget: Some("1G".into()),
            ..Default::default()
        };
        let back = EvalConfig::from_toml(&c.to_toml().unwrap()).unwrap();
        assert_eq!(back, c);

        let plain = EvalConfig::default();
        assert_eq!(EvalConfig::from_toml(&plain.to_toml().unwrap()).unwrap(), plain);
    }

    #[test]
    fn test_validate_rejects_zeroes() {
        let c = EvalConfig {
            chunk_size: 0,
            ..Default::default()
        };
        assert!(matches!(c.validate(), Err(EvalError::InvalidConfiguration(_))));

        let c = EvalConfig {
            runs: 0,
            ..Default::default()
        };
        assert!(matches!(c.validate(), Err(EvalError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_validate_rejects_bad_budget() {
        let c = EvalConfig {
            memory_budget: Some("lots".into()),
            ..Default::default()
        };
        assert!(c.validate().is_err());
    }

    #[test]
    fn test_from_missing_file() {
        assert!(EvalConfig::from_file(Path::new("/nonexistent/vbench.toml")).is_err());
    }
}
