// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Per-chunk metric computation.
//!
//! For a staged `[k, ...image]` batch and each model:
//!
//! 1. Time the `infer` call (wall clock).
//! 2. Check the scores are `[k, C]` and finite.
//! 3. Softmax, then derive the four metrics from scores and probabilities.
//!
//! A failure in step 1 or 2 is confined to that model.

use crate::metrics::ChunkMetrics;
use crate::report::{FailureStage, ModelFailure};
use crate::EvalError;
use model_zoo::ModelVariant;
use rayon::prelude::*;
use std::sync::Arc;
use std::time::Instant;
use tensor_core::{Shape, Tensor, TensorView};

/// Added to probabilities before taking the log in the entropy term.
pub const ENTROPY_EPSILON: f64 = 1e-8;

/// Result for one model on one chunk.
pub type ChunkOutcome = Result<ChunkMetrics, ModelFailure>;

/// Evaluates every model on one chunk.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChunkEvaluator {
    parallel: bool,
}

impl ChunkEvaluator {
    /// With `parallel`, models run concurrently on the rayon pool. Results
    /// are identical apart from latency.
    pub fn new(parallel: bool) -> Self {
        Self { parallel }
    }

    /// Returns one outcome per model, in `models` order.
    pub fn evaluate(
        &self,
        chunk: usize,
        batch: &TensorView<'_>,
        models: &[Arc<dyn ModelVariant>],
    ) -> Result<Vec<ChunkOutcome>, EvalError> {
        if batch.shape().batch_size() == 0 {
            return Err(EvalError::EmptyBatch { chunk });
        }

        let outcomes: Vec<ChunkOutcome> = if self.parallel {
            models
                .par_iter()
                .map(|m| evaluate_model(m.as_ref(), batch, chunk))
                .collect()
        } else {
            models
                .iter()
                .map(|m| evaluate_model(m.as_ref(), batch, chunk))
                .collect()
        };

        for (model, outcome) in models.iter().zip(&outcomes) {
            match outcome {
                Ok(m) => tracing::debug!(
                    model = model.name(),
                    chunk,
                    latency_ms = m.latency_ms(),
                    confidence = m.confidence_percent(),
                    "chunk evaluated"
                ),
                Err(f) => tracing::warn!(model = model.name(), chunk, "{f}"),
            }
        }
        Ok(outcomes)
    }
}

fn evaluate_model(model: &dyn ModelVariant, batch: &TensorView<'_>, chunk: usize) -> ChunkOutcome {
    let k = batch.shape().batch_size();
    let classes = model.num_classes();
    let fail = |stage, reason: String| ModelFailure::new(stage, reason, chunk);

    let start = Instant::now();
    let scores = model
        .infer(batch)
        .map_err(|e| fail(FailureStage::Inference, e.to_string()))?;
    let elapsed = start.elapsed();

    let expected = Shape::matrix(k, classes);
    if classes == 0 || scores.shape() != &expected {
        return Err(fail(
            FailureStage::OutputShape,
            format!("scores have shape {}, expected {expected}", scores.shape()),
        ));
    }
    if let Some(bad) = scores.as_slice().iter().find(|x| !x.is_finite()) {
        return Err(fail(
            FailureStage::NumericInstability,
            format!("non-finite score {bad}"),
        ));
    }

    let mut probs = Tensor::zeros(expected);
    tensor_core::softmax(&scores.view(), &mut probs)
        .map_err(|e| fail(FailureStage::Inference, e.to_string()))?;

    let latency_ms = elapsed.as_secs_f64() * 1000.0 / k as f64;
    Ok(ChunkMetrics::new(
        latency_ms,
        mean_confidence(&probs) * 100.0,
        mean_entropy(&probs),
        score_std(scores.as_slice()),
    ))
}

/// Mean over rows of the largest probability.
fn mean_confidence(probs: &Tensor) -> f64 {
    let rows = probs.shape().batch_size() as f64;
    let total: f64 = probs
        .rows()
        .map(|row| row.iter().copied().fold(f32::NEG_INFINITY, f32::max) as f64)
        .sum();
    total / rows
}

/// Mean over rows of `-Σ p · ln(p + ε)`, floored at zero.
fn mean_entropy(probs: &Tensor) -> f64 {
    let rows = probs.shape().batch_size() as f64;
    let total: f64 = probs
        .rows()
        .map(|row| {
            let h: f64 = row
                .iter()
                .map(|&p| {
                    let p = p as f64;
                    -p * (p + ENTROPY_EPSILON).ln()
                })
                .sum();
            h.max(0.0)
        })
        .sum();
    total / rows
}

/// Sample (n − 1) standard deviation of all scores; 0 for fewer than two.
fn score_std(scores: &[f32]) -> f64 {
    let n = scores.len();
    if n < 2 {
        return 0.0;
    }
    let mean = scores.iter().map(|&x| x as f64).sum::<f64>() / n as f64;
    let ss: f64 = scores.iter().map(|&x| (x as f64 - mean).powi(2)).sum();
    (ss / (n - 1) as f64).sqrt().abs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use model_zoo::{ModelError, VariantKind};

    /// Returns the same score row for every image.
    struct FixedScores {
        name: String,
        input: Shape,
        row: Vec<f32>,
    }

    impl FixedScores {
        fn new(name: &str, row: Vec<f32>) -> Arc<dyn ModelVariant> {
            Arc::new(Self {
                name: name.into(),
                input: Shape::vector(4),
                row,
            })
        }
    }

    impl ModelVariant for FixedScores {
        fn name(&self) -> &str {
            &self.name
        }
        fn kind(&self) -> VariantKind {
            VariantKind::Baseline
        }
        fn input_shape(&self) -> &Shape {
            &self.input
        }
        fn num_classes(&self) -> usize {
            self.row.len()
        }
        fn infer(&self, batch: &TensorView<'_>) -> Result<Tensor, ModelError> {
            let k = batch.shape().batch_size();
            let data = self.row.iter().copied().cycle().take(k * self.row.len()).collect();
            Ok(Tensor::from_vec(Shape::matrix(k, self.row.len()), data)?)
        }
    }

    fn batch(k: usize) -> Tensor {
        Tensor::zeros(Shape::new(vec![k, 4]))
    }

    #[test]
    fn test_uniform_scores() {
        let models = vec![FixedScores::new("flat", vec![0.0; 4])];
        let b = batch(3);
        let out = ChunkEvaluator::new(false).evaluate(0, &b.view(), &models).unwrap();
        let m = out[0].as_ref().unwrap();
        assert_relative_eq!(m.confidence_percent(), 25.0, epsilon = 1e-4);
        assert_relative_eq!(m.entropy(), 4f64.ln(), epsilon = 1e-5);
        assert_eq!(m.stability(), 0.0);
        assert!(m.latency_ms() >= 0.0);
    }

    #[test]
    fn test_confident_scores() {
        let models = vec![FixedScores::new("sharp", vec![50.0, 0.0, 0.0])];
        let b = batch(2);
        let out = ChunkEvaluator::new(false).evaluate(0, &b.view(), &models).unwrap();
        let m = out[0].as_ref().unwrap();
        assert_relative_eq!(m.confidence_percent(), 100.0, epsilon = 1e-4);
        assert!(m.entropy() >= 0.0 && m.entropy() < 1e-6);
    }

    #[test]
    fn test_stability_is_sample_std() {
        // Two rows of [1, 3]: values 1, 3, 1, 3, mean 2, sample variance 4/3.
        let models = vec![FixedScores::new("two", vec![1.0, 3.0])];
        let b = batch(2);
        let out = ChunkEvaluator::new(false).evaluate(0, &b.view(), &models).unwrap();
        assert_relative_eq!(out[0].as_ref().unwrap().stability(), (4.0f64 / 3.0).sqrt(), epsilon = 1e-9);
    }

    #[test]
    fn test_non_finite_scores_isolated() {
        let models = vec![
            FixedScores::new("nan", vec![f32::NAN, 0.0]),
            FixedScores::new("ok", vec![1.0, 0.0]),
        ];
        let b = batch(2);
        let out = ChunkEvaluator::new(false).evaluate(4, &b.view(), &models).unwrap();
        let failure = out[0].as_ref().unwrap_err();
        assert_eq!(failure.stage, FailureStage::NumericInstability);
        assert_eq!(failure.chunk, 4);
        assert!(out[1].is_ok());
    }

    #[test]
    fn test_input_shape_mismatch_is_inference_failure() {
        let models = model_zoo::synthetic::generate(1).unwrap();
        let b = batch(2);
        let out = ChunkEvaluator::new(false).evaluate(0, &b.view(), &models).unwrap();
        assert!(out
            .iter()
            .all(|o| o.as_ref().unwrap_err().stage == FailureStage::Inference));
    }

    #[test]
    fn test_empty_batch_rejected() {
        let models = vec![FixedScores::new("flat", vec![0.0; 4])];
        let empty = Tensor::zeros(Shape::new(vec![0, 4]));
        assert!(matches!(
            ChunkEvaluator::new(false).evaluate(2, &empty.view(), &models),
            Err(EvalError::EmptyBatch { chunk: 2 })
        ));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let models = model_zoo::synthetic::generate(3).unwrap();
        let b = Tensor::full(Shape::new(vec![5, 28, 28]), 0.3);
        let seq = ChunkEvaluator::new(false).evaluate(0, &b.view(), &models).unwrap();
        let par = ChunkEvaluator::new(true).evaluate(0, &b.view(), &models).unwrap();
        for (s, p) in seq.iter().zip(&par) {
            let (s, p) = (s.as_ref().unwrap(), p.as_ref().unwrap());
            assert_eq!(s.confidence_percent(), p.confidence_percent());
            assert_eq!(s.entropy(), p.entropy());
            assert_eq!(s.stability(), p.stability());
        }
    }
}
