// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The [`ImageSource`] trait and its concrete sources.

use crate::{Augmentation, SourceError};
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;
use tensor_core::{Shape, Tensor};

/// The run-scoped random generator every source draws from.
pub type RunRng = ChaCha8Rng;

/// Produces the ordered image sequence for one run.
///
/// Called once per run with a freshly seeded generator. Sources must take
/// all of their randomness from `rng`; no global or thread-local state.
pub trait ImageSource: Send + Sync {
    /// Builds this run's images.
    fn generate(&self, rng: &mut RunRng) -> Result<Vec<Tensor>, SourceError>;

    /// Dataset label used in reports.
    fn label(&self) -> String {
        "CUSTOM".to_string()
    }
}

impl<F> ImageSource for F
where
    F: Fn(&mut RunRng) -> Result<Vec<Tensor>, SourceError> + Send + Sync,
{
    fn generate(&self, rng: &mut RunRng) -> Result<Vec<Tensor>, SourceError> {
        self(rng)
    }
}

/// A fixed, already preprocessed image set.
#[derive(Debug, Clone)]
pub struct InMemorySource {
    images: Vec<Tensor>,
    label: String,
}

impl InMemorySource {
    pub fn new(images: Vec<Tensor>) -> Self {
        Self::labelled(images, "CUSTOM")
    }

    pub fn labelled(images: Vec<Tensor>, label: impl Into<String>) -> Self {
        Self {
            images,
            label: label.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

impl ImageSource for InMemorySource {
    fn generate(&self, _rng: &mut RunRng) -> Result<Vec<Tensor>, SourceError> {
        Ok(self.images.clone())
    }

    fn label(&self) -> String {
        self.label.clone()
    }
}

/// `count` identical constant-valued images.
#[derive(Debug, Clone)]
pub struct BlankSource {
    count: usize,
    shape: Shape,
    value: f32,
}

impl BlankSource {
    pub fn new(count: usize, shape: Shape, value: f32) -> Self {
        Self { count, shape, value }
    }

    /// `count` all-zero 28×28 images.
    pub fn mnist(count: usize) -> Self {
        Self::new(count, Shape::matrix(28, 28), 0.0)
    }
}

impl ImageSource for BlankSource {
    fn generate(&self, _rng: &mut RunRng) -> Result<Vec<Tensor>, SourceError> {
        Ok(vec![Tensor::full(self.shape.clone(), self.value); self.count])
    }

    fn label(&self) -> String {
        format!("BLANK_{}", self.count)
    }
}

/// The first `count` images of a base set, each passed through an augmentation.
#[derive(Debug, Clone)]
pub struct AugmentedSource {
    base: Arc<[Tensor]>,
    count: usize,
    augmentation: Augmentation,
    label: String,
}

impl AugmentedSource {
    /// Fails if `base` holds fewer than `count` images or the augmentation is invalid.
    pub fn new(
        base: Arc<[Tensor]>,
        count: usize,
        augmentation: Augmentation,
        label: impl Into<String>,
    ) -> Result<Self, SourceError> {
        if base.len() < count {
            return Err(SourceError::NotEnoughImages {
                requested: count,
                available: base.len(),
            });
        }
        augmentation.validate()?;
        Ok(Self {
            base,
            count,
            augmentation,
            label: label.into(),
        })
    }

    pub fn augmentation(&self) -> Augmentation {
        self.augmentation
    }
}

impl ImageSource for AugmentedSource {
    fn generate(&self, rng: &mut RunRng) -> Result<Vec<Tensor>, SourceError> {
        let images = self.base[..self.count]
            .iter()
            .map(|img| self.augmentation.apply(img, rng))
            .collect::<Result<Vec<_>, _>>()?;
        tracing::debug!(
            dataset = %self.label,
            images = images.len(),
            "generated augmented images"
        );
        Ok(images)
    }

    fn label(&self) -> String {
        self.label.clone()
    }
}
