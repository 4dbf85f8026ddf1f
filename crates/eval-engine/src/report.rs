// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Evaluation reports.
//!
//! A report lists every model in load order with one [`ModelOutcome`]. The
//! JSON form keys models by name:
//!
//! ```json
//! {
//!   "dataset_type": "MNIST_100",
//!   "num_images": 100,
//!   "models": {
//!     "baseline_mnist": { "status": "completed", "latency_ms": 0.012, ... },
//!     "ws_mnist":       { "status": "failed", "stage": "numeric_instability", ... }
//!   }
//! }
//! ```

use crate::metrics::{Metric, RunMetrics};
use crate::multi_run::MultiRunSummary;
use crate::EvalError;
use serde::{Serialize, Serializer};
use std::fmt;

/// Where a model failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    /// `infer` returned an error.
    Inference,
    /// The score matrix was not `[k, C]`.
    OutputShape,
    /// The scores contained NaN or infinity.
    NumericInstability,
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inference => f.write_str("inference"),
            Self::OutputShape => f.write_str("output shape"),
            Self::NumericInstability => f.write_str("numeric instability"),
        }
    }
}

/// Why one model produced no metrics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelFailure {
    pub stage: FailureStage,
    pub reason: String,
    /// Chunk in which the failure occurred.
    pub chunk: usize,
    /// Run in which the failure occurred, for multi-run evaluations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run: Option<usize>,
}

impl ModelFailure {
    pub(crate) fn new(stage: FailureStage, reason: impl Into<String>, chunk: usize) -> Self {
        Self {
            stage,
            reason: reason.into(),
            chunk,
            run: None,
        }
    }

    pub(crate) fn in_run(mut self, run: usize) -> Self {
        self.run = Some(run);
        self
    }
}

impl fmt::Display for ModelFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failure in chunk {}", self.stage, self.chunk)?;
        if let Some(run) = self.run {
            write!(f, " of run {run}")?;
        }
        write!(f, ": {}", self.reason)
    }
}

/// The result for one model.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ModelOutcome<T> {
    Completed(T),
    Failed(ModelFailure),
    /// The input held no images.
    NoData,
}

impl<T> ModelOutcome<T> {
    pub fn completed(&self) -> Option<&T> {
        match self {
            Self::Completed(t) => Some(t),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&ModelFailure> {
        match self {
            Self::Failed(f) => Some(f),
            _ => None,
        }
    }

    pub fn is_no_data(&self) -> bool {
        matches!(self, Self::NoData)
    }
}

/// A model name paired with its outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelReport<T> {
    pub name: String,
    pub outcome: ModelOutcome<T>,
}

fn serialize_models<T, S>(models: &[ModelReport<T>], serializer: S) -> Result<S::Ok, S::Error>
where
    T: Serialize,
    S: Serializer,
{
    serializer.collect_map(models.iter().map(|m| (&m.name, &m.outcome)))
}

fn find<'a, T>(models: &'a [ModelReport<T>], name: &str) -> Option<&'a ModelOutcome<T>> {
    models.iter().find(|m| m.name == name).map(|m| &m.outcome)
}

/// Result of a single-run evaluation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationReport {
    pub dataset_type: String,
    pub num_images: usize,
    pub num_chunks: usize,
    pub seed: u64,
    #[serde(serialize_with = "serialize_models")]
    pub models: Vec<ModelReport<RunMetrics>>,
}

impl EvaluationReport {
    pub fn get(&self, name: &str) -> Option<&ModelOutcome<RunMetrics>> {
        find(&self.models, name)
    }

    /// Metrics of a model that completed.
    pub fn metrics(&self, name: &str) -> Option<&RunMetrics> {
        self.get(name).and_then(ModelOutcome::completed)
    }

    pub fn to_json(&self) -> Result<String, EvalError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Fixed-width table, one row per model.
    pub fn summary(&self) -> String {
        let mut out = format!(
            "Dataset {} ({} images, {} chunks, seed {})\n{}\n",
            self.dataset_type,
            self.num_images,
            self.num_chunks,
            self.seed,
            table_header()
        );
        for m in &self.models {
            let row = match &m.outcome {
                ModelOutcome::Completed(r) => Metric::ALL
                    .iter()
                    .map(|&metric| format!("{:>20}", format_value(r.get(metric), metric)))
                    .collect::<String>(),
                ModelOutcome::Failed(f) => format!("  FAILED: {f}"),
                ModelOutcome::NoData => "  no data".to_string(),
            };
            out.push_str(&format!("{:<20}{row}\n", m.name));
        }
        out
    }
}

/// Result of a multi-run evaluation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MultiRunReport {
    pub dataset_type: String,
    /// Images per run (of the last run, when sources vary).
    pub num_images: usize,
    pub runs: usize,
    pub base_seed: u64,
    #[serde(serialize_with = "serialize_models")]
    pub models: Vec<ModelReport<MultiRunSummary>>,
}

impl MultiRunReport {
    pub fn get(&self, name: &str) -> Option<&ModelOutcome<MultiRunSummary>> {
        find(&self.models, name)
    }

    pub fn summary_for(&self, name: &str) -> Option<&MultiRunSummary> {
        self.get(name).and_then(ModelOutcome::completed)
    }

    pub fn to_json(&self) -> Result<String, EvalError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Fixed-width table of `mean ± std`, one row per model.
    pub fn summary(&self) -> String {
        let mut out = format!(
            "Dataset {} ({} images, {} runs from seed {})\n{}\n",
            self.dataset_type,
            self.num_images,
            self.runs,
            self.base_seed,
            table_header()
        );
        for m in &self.models {
            let row = match &m.outcome {
                ModelOutcome::Completed(s) => Metric::ALL
                    .iter()
                    .map(|&metric| {
                        let stat = s.statistics.get(metric);
                        let cell = format!(
                            "{}±{}",
                            format_value(stat.mean, metric),
                            format_value(stat.std, metric)
                        );
                        format!("{cell:>20}")
                    })
                    .collect::<String>(),
                ModelOutcome::Failed(f) => format!("  FAILED: {f}"),
                ModelOutcome::NoData => "  no data".to_string(),
            };
            out.push_str(&format!("{:<20}{row}\n", m.name));
        }
        out
    }
}

fn table_header() -> String {
    let mut header = format!("{:<20}", "model");
    for metric in Metric::ALL {
        header.push_str(&format!("{:>20}", metric.name()));
    }
    header
}

fn format_value(value: f64, metric: Metric) -> String {
    format!("{value:.prec$}", prec = metric.decimals() as usize)
}
