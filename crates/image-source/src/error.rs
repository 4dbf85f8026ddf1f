// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for image sources.

use std::path::PathBuf;
use tensor_core::TensorError;

/// Errors that can occur while producing images.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// A dataset file could not be read.
    #[error("cannot read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not a well-formed IDX3 image file.
    #[error("invalid IDX image data: {0}")]
    InvalidIdx(String),

    /// A dataset name is not one of the presets.
    #[error("unknown dataset '{name}' (expected one of: {valid})")]
    UnknownPreset { name: String, valid: String },

    /// A source was asked for more images than its base set holds.
    #[error("requested {requested} images but only {available} are available")]
    NotEnoughImages { requested: usize, available: usize },

    /// Augmentation parameters are out of range.
    #[error("invalid augmentation: {0}")]
    InvalidAugmentation(String),

    /// A tensor could not be built.
    #[error("tensor error: {0}")]
    Tensor(#[from] TensorError),
}
