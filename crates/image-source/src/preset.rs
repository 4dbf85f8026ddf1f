// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Named benchmark datasets.

use crate::{Augmentation, AugmentedSource, SourceError};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tensor_core::Tensor;

/// The preset datasets, each a prefix of the MNIST test set with an augmentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatasetPreset {
    Mnist100,
    Mnist500,
    MnistNoisy100,
    MnistBlur100,
    MnistNoisyBlur100,
}

impl DatasetPreset {
    pub const ALL: [DatasetPreset; 5] = [
        Self::Mnist100,
        Self::Mnist500,
        Self::MnistNoisy100,
        Self::MnistBlur100,
        Self::MnistNoisyBlur100,
    ];

    /// The preset's canonical name, e.g. `MNIST_NOISY_100`.
    pub fn name(self) -> &'static str {
        match self {
            Self::Mnist100 => "MNIST_100",
            Self::Mnist500 => "MNIST_500",
            Self::MnistNoisy100 => "MNIST_NOISY_100",
            Self::MnistBlur100 => "MNIST_BLUR_100",
            Self::MnistNoisyBlur100 => "MNIST_NOISY_BLUR_100",
        }
    }

    /// Number of images taken from the base set.
    pub fn count(self) -> usize {
        match self {
            Self::Mnist500 => 500,
            _ => 100,
        }
    }

    pub fn augmentation(self) -> Augmentation {
        match self {
            Self::Mnist100 | Self::Mnist500 => Augmentation::Clean,
            Self::MnistNoisy100 => Augmentation::noise(),
            Self::MnistBlur100 => Augmentation::blur(),
            Self::MnistNoisyBlur100 => Augmentation::noise_blur(),
        }
    }

    /// Builds the preset's source over `base`.
    pub fn source(self, base: Arc<[Tensor]>) -> Result<AugmentedSource, SourceError> {
        AugmentedSource::new(base, self.count(), self.augmentation(), self.name())
    }
}

impl fmt::Display for DatasetPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DatasetPreset {
    type Err = SourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.name() == s)
            .ok_or_else(|| SourceError::UnknownPreset {
                name: s.to_string(),
                valid: Self::ALL.map(|p| p.name()).join(", "),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tensor_core::Shape;

    #[test]
    fn test_parse_names() {
        for preset in DatasetPreset::ALL {
            assert_eq!(preset.name().parse::<DatasetPreset>().unwrap(), preset);
        }
    }

    #[test]
    fn test_unknown_lists_valid() {
        let err = "MNIST_1000".parse::<DatasetPreset>().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("MNIST_1000"));
        assert!(msg.contains("MNIST_NOISY_BLUR_100"));
    }

    #[test]
    fn test_names_are_case_sensitive() {
        assert!("mnist_100".parse::<DatasetPreset>().is_err());
    }

    #[test]
    fn test_counts_and_augmentations() {
        assert_eq!(DatasetPreset::Mnist500.count(), 500);
        assert_eq!(DatasetPreset::MnistBlur100.augmentation(), Augmentation::blur());
        assert!(DatasetPreset::MnistNoisyBlur100.augmentation().is_stochastic());
    }

    #[test]
    fn test_source_needs_enough_base_images() {
        let base: Arc<[Tensor]> = vec![Tensor::zeros(Shape::matrix(28, 28)); 100].into();
        assert!(DatasetPreset::Mnist100.source(Arc::clone(&base)).is_ok());
        assert!(DatasetPreset::Mnist500.source(base).is_err());
    }
}
