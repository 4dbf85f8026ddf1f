// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for variant loading and inference.

use std::path::PathBuf;
use tensor_core::{Shape, TensorError};

/// Errors that can occur while loading or running a model variant.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// A file in the model directory could not be read or written.
    #[error("i/o error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The manifest JSON is malformed.
    #[error("failed to parse manifest: {0}")]
    ManifestParse(#[from] serde_json::Error),

    /// The manifest parsed but is not usable.
    #[error("invalid manifest: {0}")]
    InvalidManifest(String),

    /// A manifest entry names a kind that is not one of the six variants.
    #[error("variant '{variant}' has unknown kind '{kind}' (expected one of: {valid})")]
    UnknownKind {
        variant: String,
        kind: String,
        valid: String,
    },

    /// A required weight tensor is absent from the variant's file.
    #[error("variant '{variant}': weight tensor '{tensor}' not found")]
    WeightNotFound { variant: String, tensor: String },

    /// The SafeTensors file could not be parsed or produced.
    #[error("variant '{variant}': SafeTensors error: {detail}")]
    SafeTensors { variant: String, detail: String },

    /// Weights were found but their dtype or shape is inconsistent.
    #[error("variant '{variant}': invalid weights: {detail}")]
    InvalidWeights { variant: String, detail: String },

    /// A batch did not match the variant's expected image shape.
    #[error("variant '{variant}': expected images of shape {expected}, got batch {actual}")]
    InputShape {
        variant: String,
        expected: Shape,
        actual: Shape,
    },

    /// A tensor kernel failed during inference.
    #[error("tensor error: {0}")]
    Tensor(#[from] TensorError),
}

impl ModelError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
