// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The benchmark engine with type-state–enforced loading.
//!
//! ```text
//! BenchmarkEngine<Idle>
//!     │  .load_models()   (or .with_models(..))
//!     ▼
//! BenchmarkEngine<Ready>
//!     │  .evaluate(..) / .evaluate_source(..) / .evaluate_runs(..)
//!     ▼
//!   EvaluationReport / MultiRunReport
//! ```
//!
//! Loading consumes the idle engine, so an engine that can evaluate always
//! holds a validated configuration and at least one model.

use crate::chunker::Chunker;
use crate::evaluator::ChunkEvaluator;
use crate::multi_run::MultiRunAggregator;
use crate::report::{EvaluationReport, ModelOutcome, ModelReport, MultiRunReport};
use crate::seed::SeedController;
use crate::{ChunkAggregator, EvalConfig, EvalError, RunMetrics};
use image_source::ImageSource;
use memory_manager::{MemoryBudget, PoolStats, StagingPool};
use model_zoo::{ModelLoader, ModelVariant};
use std::collections::HashSet;
use std::sync::Arc;
use tensor_core::Tensor;

// ── Type-state markers ─────────────────────────────────────────

/// Engine is configured but holds no models.
#[derive(Debug)]
pub struct Idle;

/// Models are loaded; the engine can evaluate.
pub struct Ready {
    models: Vec<Arc<dyn ModelVariant>>,
    chunker: Chunker,
    pool: StagingPool,
    evaluator: ChunkEvaluator,
}

impl std::fmt::Debug for Ready {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.models.iter().map(|m| m.name()).collect();
        f.debug_struct("Ready")
            .field("models", &names)
            .field("chunker", &self.chunker)
            .field("pool", &self.pool)
            .finish()
    }
}

/// Sealed trait for engine states.
pub trait EngineState: std::fmt::Debug + sealed::Sealed {}
impl EngineState for Idle {}
impl EngineState for Ready {}

mod sealed {
    pub trait Sealed {}
    impl Sealed for super::Idle {}
    impl Sealed for super::Ready {}
}

// ── Engine ─────────────────────────────────────────────────────

/// Evaluates a fixed set of classifier variants over image sequences.
///
/// # Example
/// ```no_run
/// use eval_engine::{BenchmarkEngine, EvalConfig};
/// use image_source::BlankSource;
///
/// # fn example() -> Result<(), eval_engine::EvalError> {
/// let engine = BenchmarkEngine::new(EvalConfig::default()).load_models()?;
/// let report = engine.evaluate_runs(&BlankSource::mnist(100))?;
/// println!("{}", report.summary());
/// # Ok(())
/// # }
/// ```
pub struct BenchmarkEngine<S: EngineState = Idle> {
    config: EvalConfig,
    state: S,
}

// ── Idle → Ready ───────────────────────────────────────────────

impl BenchmarkEngine<Idle> {
    pub fn new(config: EvalConfig) -> Self {
        tracing::info!(
            chunk_size = config.chunk_size,
            runs = config.runs,
            base_seed = config.base_seed,
            "engine created"
        );
        Self { config, state: Idle }
    }

    /// Loads every variant in `config.models_dir`.
    ///
    /// The configuration is validated first; any load failure aborts.
    pub fn load_models(self) -> Result<BenchmarkEngine<Ready>, EvalError> {
        self.config.validate()?;
        let models = ModelLoader::load_dir(&self.config.models_dir)?;
        self.with_models(models)
    }

    /// Uses already constructed variants.
    pub fn with_models(
        self,
        models: Vec<Arc<dyn ModelVariant>>,
    ) -> Result<BenchmarkEngine<Ready>, EvalError> {
        self.config.validate()?;

        let first = models.first().ok_or_else(|| {
            EvalError::InvalidConfiguration("at least one model is required".into())
        })?;
        let mut seen = HashSet::new();
        if let Some(dup) = models.iter().map(|m| m.name()).find(|name| !seen.insert(*name)) {
            return Err(EvalError::InvalidConfiguration(format!(
                "duplicate model name '{dup}'"
            )));
        }

        let budget = self.config.parse_budget()?;
        let chunker = match budget {
            Some(b) => Chunker::with_budget(self.config.chunk_size, b, first.input_shape())?,
            None => Chunker::new(self.config.chunk_size)?,
        };
        let pool = StagingPool::new(budget.unwrap_or(MemoryBudget::from_bytes(usize::MAX)));

        tracing::info!(
            models = models.len(),
            chunk_size = chunker.chunk_size(),
            parallel = self.config.parallel_models,
            "engine ready"
        );

        Ok(BenchmarkEngine {
            state: Ready {
                models,
                chunker,
                pool,
                evaluator: ChunkEvaluator::new(self.config.parallel_models),
            },
            config: self.config,
        })
    }
}

// ── Ready: evaluation ──────────────────────────────────────────

impl BenchmarkEngine<Ready> {
    pub fn models(&self) -> &[Arc<dyn ModelVariant>] {
        &self.state.models
    }

    /// The chunk size in effect, after any budget cap.
    pub fn chunk_size(&self) -> usize {
        self.state.chunker.chunk_size()
    }

    /// Staging pool statistics accumulated over every evaluation so far.
    pub fn memory_stats(&self) -> PoolStats {
        self.state.pool.stats()
    }

    /// Evaluates a fixed image sequence once.
    pub fn evaluate(
        &self,
        images: &[Tensor],
        dataset_type: impl Into<String>,
    ) -> Result<EvaluationReport, EvalError> {
        let active = vec![true; self.state.models.len()];
        let outcomes = self.run_once(images, &active)?;
        Ok(EvaluationReport {
            dataset_type: dataset_type.into(),
            num_images: images.len(),
            num_chunks: self.state.chunker.num_chunks(images.len()),
            seed: self.config.base_seed,
            models: self.named(outcomes),
        })
    }

    /// Builds run 0's images from `source` and evaluates them once.
    pub fn evaluate_source(&self, source: &dyn ImageSource) -> Result<EvaluationReport, EvalError> {
        let seed = SeedController::new(self.config.base_seed).derive(0);
        let mut rng = seed.into_rng();
        let images = source
            .generate(&mut rng)
            .map_err(|source| EvalError::Source { run: 0, source })?;
        self.evaluate(&images, source.label())
    }

    /// Runs `config.runs` seeded evaluations and aggregates them.
    ///
    /// Run `i` draws its images from a generator seeded with
    /// `base_seed + i`, so the same source, models and configuration
    /// always produce the same non-latency statistics.
    pub fn evaluate_runs(&self, source: &dyn ImageSource) -> Result<MultiRunReport, EvalError> {
        let seeds = SeedController::new(self.config.base_seed);
        let mut aggregator = MultiRunAggregator::new(self.state.models.iter().map(|m| m.name()));
        let mut num_images = 0;

        for seed in seeds.runs(self.config.runs) {
            let run = seed.run();
            tracing::info!(run, seed = seed.seed(), "starting run");
            let mut rng = seed.into_rng();
            let images = source
                .generate(&mut rng)
                .map_err(|source| EvalError::Source { run, source })?;
            num_images = images.len();

            let outcomes = self.run_once(&images, &aggregator.active())?;
            aggregator.record(run, outcomes);
        }

        Ok(MultiRunReport {
            dataset_type: source.label(),
            num_images,
            runs: self.config.runs,
            base_seed: self.config.base_seed,
            models: aggregator.finish(),
        })
    }

    /// Evaluates `images` chunk by chunk for every model flagged in `active`.
    ///
    /// A model that fails on a chunk is dropped from later chunks. Inactive
    /// models are reported as `NoData`.
    fn run_once(
        &self,
        images: &[Tensor],
        active: &[bool],
    ) -> Result<Vec<ModelOutcome<RunMetrics>>, EvalError> {
        let ready = &self.state;
        let mut slots: Vec<Option<Result<ChunkAggregator, _>>> = active
            .iter()
            .map(|&on| on.then(|| Ok(ChunkAggregator::new(self.config.weighting))))
            .collect();

        for chunk in ready.chunker.chunks(images) {
            let live: Vec<usize> = slots
                .iter()
                .enumerate()
                .filter(|(_, slot)| matches!(slot, Some(Ok(_))))
                .map(|(i, _)| i)
                .collect();
            if live.is_empty() {
                break;
            }
            let models: Vec<Arc<dyn ModelVariant>> =
                live.iter().map(|&i| Arc::clone(&ready.models[i])).collect();

            let staged = chunk.stage(&ready.pool)?;
            let outcomes = ready
                .evaluator
                .evaluate(chunk.index(), &staged.view()?, &models)?;
            drop(staged);

            for (i, outcome) in live.into_iter().zip(outcomes) {
                match (outcome, &mut slots[i]) {
                    (Ok(metrics), Some(Ok(agg))) => agg.push(&metrics, chunk.len()),
                    (Err(failure), slot) => *slot = Some(Err(failure)),
                    _ => {}
                }
            }
        }

        Ok(slots
            .into_iter()
            .map(|slot| match slot {
                Some(Ok(agg)) => agg.finish().map_or(ModelOutcome::NoData, ModelOutcome::Completed),
                Some(Err(failure)) => ModelOutcome::Failed(failure),
                None => ModelOutcome::NoData,
            })
            .collect())
    }

    fn named<T>(&self, outcomes: Vec<ModelOutcome<T>>) -> Vec<ModelReport<T>> {
        self.state
            .models
            .iter()
            .zip(outcomes)
            .map(|(m, outcome)| ModelReport {
                name: m.name().to_string(),
                outcome,
            })
            .collect()
    }
}

impl<S: EngineState> BenchmarkEngine<S> {
    pub fn config(&self) -> &EvalConfig {
        &self.config
    }
}

impl<S: EngineState> std::fmt::Debug for BenchmarkEngine<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BenchmarkEngine")
            .field("state", &std::any::type_name::<S>())
            .field("config", &self.config)
            .field("inner", &self.state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image_source::BlankSource;
    use tensor_core::Shape;

    fn ready(config: EvalConfig) -> BenchmarkEngine<Ready> {
        BenchmarkEngine::new(config)
            .with_models(model_zoo::synthetic::generate(42).unwrap())
            .unwrap()
    }

    #[test]
    fn test_rejects_invalid_config_before_loading() {
        let config = EvalConfig {
            chunk_size: 0,
            models_dir: "/nonexistent".into(),
            ..Default::default()
        };
        assert!(matches!(
            BenchmarkEngine::new(config).load_models(),
            Err(EvalError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_requires_models() {
        assert!(matches!(
            BenchmarkEngine::new(EvalConfig::default()).with_models(Vec::new()),
            Err(EvalError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_rejects_duplicate_names() {
        let mut models = model_zoo::synthetic::generate(1).unwrap();
        models.push(Arc::clone(&models[0]));
        assert!(BenchmarkEngine::new(EvalConfig::default())
            .with_models(models)
            .is_err());
    }

    #[test]
    fn test_budget_caps_chunk_size() {
        let engine = ready(EvalConfig {
            memory_budget: Some("16K".into()),
            ..Default::default()
        });
        // 16 KiB / 3136 bytes per 28x28 image.
        assert_eq!(engine.chunk_size(), 5);
    }

    #[test]
    fn test_evaluate_reports_every_model_in_order() {
        let engine = ready(EvalConfig::default());
        let images = vec![Tensor::zeros(Shape::matrix(28, 28)); 10];
        let report = engine.evaluate(&images, "BLANK_10").unwrap();
        assert_eq!(report.num_images, 10);
        assert_eq!(report.num_chunks, 1);
        let names: Vec<&str> = report.models.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(
            names,
            ["baseline_mnist", "kd_mnist", "pruned_mnist", "quantized_mnist", "lrf_mnist", "ws_mnist"]
        );
        assert!(report.models.iter().all(|m| m.outcome.completed().is_some()));
    }

    #[test]
    fn test_evaluate_source_uses_label() {
        let engine = ready(EvalConfig::default());
        let report = engine.evaluate_source(&BlankSource::mnist(3)).unwrap();
        assert_eq!(report.dataset_type, "BLANK_3");
    }

    #[test]
    fn test_debug_shows_state() {
        let idle = BenchmarkEngine::new(EvalConfig::default());
        assert!(format!("{idle:?}").contains("Idle"));
        let engine = ready(EvalConfig::default());
        let debug = format!("{engine:?}");
        assert!(debug.contains("Ready"));
        assert!(debug.contains("baseline_mnist"));
    }
}
