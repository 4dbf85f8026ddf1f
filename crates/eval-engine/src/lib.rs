// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # eval-engine
//!
//! Turns an image sequence and a set of classifier variants into
//! reproducible, statistically aggregated metrics.
//!
//! For every model, per chunk: latency per image, mean top-1 confidence,
//! mean predictive entropy, and the dispersion of raw scores ("stability").
//! Chunk metrics are averaged into one [`RunMetrics`] per run, and runs are
//! combined into a mean/std [`MultiRunStatistics`].
//!
//! # Pipeline
//! ```text
//! SeedController ─► ImageSource ─► Chunker ─► ChunkEvaluator ─► ChunkAggregator
//!        ▲                                                           │
//!        └──────────────────── MultiRunAggregator ◄──────────────────┘
//! ```
//!
//! # Type-State Engine
//! ```text
//! BenchmarkEngine<Idle>  ── .load_models() / .with_models() ──►  BenchmarkEngine<Ready>
//! ```
//! Only a `Ready` engine can evaluate, so models are always loaded (and
//! load failures surfaced) before any image is touched.
//!
//! # Failure Isolation
//! A model whose inference fails, returns a malformed score matrix, or
//! produces non-finite scores is reported as [`ModelOutcome::Failed`]; the
//! other models still complete. Empty input yields [`ModelOutcome::NoData`]
//! rather than zeros or NaN.

mod aggregate;
mod chunker;
mod config;
mod engine;
mod error;
mod evaluator;
mod metrics;
mod multi_run;
mod report;
mod seed;

pub use aggregate::{ChunkAggregator, ChunkWeighting};
pub use chunker::{chunk, Chunk, Chunker, StagedBatch};
pub use config::EvalConfig;
pub use engine::{BenchmarkEngine, EngineState, Idle, Ready};
pub use error::EvalError;
pub use evaluator::{ChunkEvaluator, ChunkOutcome, ENTROPY_EPSILON};
pub use metrics::{round_to, ChunkMetrics, Metric, MetricStat, MultiRunStatistics, RunMetrics};
pub use multi_run::{MultiRunAggregator, MultiRunSummary};
pub use report::{EvaluationReport, FailureStage, ModelFailure, ModelOutcome, ModelReport, MultiRunReport};
pub use seed::{derive, SeedController, SeedState};
