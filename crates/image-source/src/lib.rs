// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # image-source
//!
//! Supplies the ordered image sequences the evaluation engine benchmarks
//! against.
//!
//! - [`ImageSource`]: produces one run's images from the run-scoped
//!   [`RunRng`]. Deterministic sources ignore the generator; augmented
//!   sources draw all of their randomness from it, so a run is fully
//!   determined by its seed.
//! - [`Augmentation`]: clean, gaussian noise, gaussian blur, or blur
//!   followed by noise.
//! - [`DatasetPreset`]: the named benchmark datasets (`MNIST_100`,
//!   `MNIST_NOISY_BLUR_100`, ...).
//! - [`IdxImages`]: reader for the MNIST IDX3 image format.
//!
//! # Example
//! ```
//! use image_source::{BlankSource, ImageSource, RunRng};
//! use rand::SeedableRng;
//!
//! let source = BlankSource::mnist(100);
//! let images = source.generate(&mut RunRng::seed_from_u64(0)).unwrap();
//! assert_eq!(images.len(), 100);
//! ```

mod augment;
mod error;
mod idx;
mod preset;
mod source;

pub use augment::Augmentation;
pub use error::SourceError;
pub use idx::IdxImages;
pub use preset::DatasetPreset;
pub use source::{AugmentedSource, BlankSource, ImageSource, InMemorySource, RunRng};
