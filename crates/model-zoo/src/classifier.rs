// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The [`ModelVariant`] seam and the two-layer classifier behind it.

use crate::{Device, LinearLayer, ModelError, VariantKind};
use tensor_core::{relu, Shape, Tensor, TensorView};

/// A loaded classifier variant.
///
/// Implementations are read-only after construction: `infer` takes `&self`
/// and must return bit-identical scores for identical input. Variants are
/// shared across threads as `Arc<dyn ModelVariant>`.
pub trait ModelVariant: Send + Sync {
    /// Unique name, used as the key in reports.
    fn name(&self) -> &str;

    /// The compression technique this variant represents.
    fn kind(&self) -> VariantKind;

    /// Device the variant runs on.
    fn device(&self) -> Device {
        Device::Cpu
    }

    /// Shape of one input image, without the batch dimension.
    fn input_shape(&self) -> &Shape;

    /// Number of classes `C` in the score matrix.
    fn num_classes(&self) -> usize;

    /// Number of stored parameters.
    fn parameter_count(&self) -> usize {
        0
    }

    /// Runs a `[k, ...image]` batch and returns `[k, C]` unnormalized scores.
    fn infer(&self, batch: &TensorView<'_>) -> Result<Tensor, ModelError>;
}

/// Two-layer perceptron: `input → hidden → ReLU → classes`.
#[derive(Debug, Clone)]
pub struct Classifier {
    name: String,
    kind: VariantKind,
    device: Device,
    input_shape: Shape,
    hidden: LinearLayer,
    output: LinearLayer,
}

impl Classifier {
    /// Assembles a classifier, checking that layer widths line up.
    pub fn new(
        name: impl Into<String>,
        kind: VariantKind,
        input_shape: Shape,
        hidden: LinearLayer,
        output: LinearLayer,
    ) -> Result<Self, ModelError> {
        let name = name.into();
        let invalid = |detail: String| ModelError::InvalidWeights {
            variant: name.clone(),
            detail,
        };

        if hidden.in_features() != input_shape.num_elements() {
            return Err(invalid(format!(
                "fc1 expects {} inputs but images {} have {} pixels",
                hidden.in_features(),
                input_shape,
                input_shape.num_elements()
            )));
        }
        if hidden.out_features() != output.in_features() {
            return Err(invalid(format!(
                "fc1 produces {} features but fc2 expects {}",
                hidden.out_features(),
                output.in_features()
            )));
        }

        Ok(Self {
            name,
            kind,
            device: Device::Cpu,
            input_shape,
            hidden,
            output,
        })
    }

    /// Width of the hidden layer.
    pub fn hidden_width(&self) -> usize {
        self.hidden.out_features()
    }

    /// The two layers, input side first.
    pub fn layers(&self) -> [&LinearLayer; 2] {
        [&self.hidden, &self.output]
    }

    /// Returns a concise summary string for display.
    pub fn summary(&self) -> String {
        format!(
            "{} ({}): {} → {} [{}] → {} [{}], {} parameters",
            self.name,
            self.kind,
            self.input_shape,
            self.hidden.out_features(),
            self.hidden.storage(),
            self.output.out_features(),
            self.output.storage(),
            self.parameter_count(),
        )
    }
}

impl ModelVariant for Classifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> VariantKind {
        self.kind
    }

    fn device(&self) -> Device {
        self.device
    }

    fn input_shape(&self) -> &Shape {
        &self.input_shape
    }

    fn num_classes(&self) -> usize {
        self.output.out_features()
    }

    fn parameter_count(&self) -> usize {
        self.hidden.parameter_count() + self.output.parameter_count()
    }

    fn infer(&self, batch: &TensorView<'_>) -> Result<Tensor, ModelError> {
        let dims = batch.shape().dims();
        if dims.len() != self.input_shape.rank() + 1 || &dims[1..] != self.input_shape.dims() {
            return Err(ModelError::InputShape {
                variant: self.name.clone(),
                expected: self.input_shape.clone(),
                actual: batch.shape().clone(),
            });
        }

        let mut hidden = self.hidden.forward(batch)?;
        relu(&mut hidden);
        Ok(self.output.forward(&hidden.view())?)
    }
}
