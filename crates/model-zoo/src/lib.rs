// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # model-zoo
//!
//! The classifier variants under benchmark and everything needed to load
//! them.
//!
//! - [`ModelVariant`]: the inference seam the evaluation engine talks to:
//!   a named, read-only, `Send + Sync` batch classifier.
//! - [`Classifier`]: the concrete two-layer perceptron every variant is
//!   built on (`input → hidden → ReLU → classes`).
//! - [`LinearLayer`]: per-kind weight storage: dense, sparse (CSR),
//!   low-rank, int8-quantized, and codebook weight-shared.
//! - [`ModelLoader`]: reads a model directory (`variants.json` plus one
//!   SafeTensors file per variant) via memory-mapped I/O.
//! - [`synthetic`]: deterministic weight generation for tests, benches and
//!   the `vbench synth` command.
//!
//! # Model Directory Layout
//! ```text
//! models/
//! ├── variants.json
//! ├── baseline_mnist.safetensors
//! ├── kd_mnist.safetensors
//! └── ...
//! ```
//!
//! # Example
//! ```no_run
//! use model_zoo::ModelLoader;
//! use std::path::Path;
//!
//! let variants = ModelLoader::load_dir(Path::new("./models")).unwrap();
//! for v in &variants {
//!     println!("{} ({}): {} parameters", v.name(), v.kind(), v.parameter_count());
//! }
//! ```

mod classifier;
mod error;
mod kind;
mod layer;
mod loader;
mod manifest;
pub mod synthetic;

pub use classifier::{Classifier, ModelVariant};
pub use error::ModelError;
pub use kind::{Device, VariantKind};
pub use layer::{CsrMatrix, LinearLayer};
pub use loader::ModelLoader;
pub use manifest::{VariantEntry, VariantManifest, MANIFEST_FILE};
