// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for the evaluation engine.
//!
//! These abort an evaluation. Failures confined to one model (inference
//! errors, non-finite scores) are not errors here: they become
//! [`crate::ModelOutcome::Failed`] entries in the report.

use tensor_core::Shape;

/// Errors that abort an evaluation.
#[derive(Debug, thiserror::Error)]
pub enum EvalError {
    /// A configuration value is out of range (checked before any computation).
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A variant could not be loaded.
    #[error("model load failed: {0}")]
    ModelLoad(#[from] model_zoo::ModelError),

    /// A chunk reached the evaluator with no images.
    #[error("chunk {chunk} contains no images")]
    EmptyBatch { chunk: usize },

    /// Images within one chunk disagree in shape.
    #[error("chunk {chunk}: image {index} has shape {actual}, expected {expected}")]
    ImageShape {
        chunk: usize,
        index: usize,
        expected: Shape,
        actual: Shape,
    },

    /// The image source failed to produce a run's images.
    #[error("image source failed in run {run}: {source}")]
    Source {
        run: usize,
        #[source]
        source: image_source::SourceError,
    },

    /// Staging a chunk batch failed.
    #[error("memory error: {0}")]
    Memory(#[from] memory_manager::MemoryError),

    /// A tensor could not be built.
    #[error("tensor error: {0}")]
    Tensor(#[from] tensor_core::TensorError),

    /// A report could not be serialized.
    #[error("report serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}
