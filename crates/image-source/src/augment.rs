// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Stochastic and deterministic image augmentation.
//!
//! Images are single-channel tensors whose last two dimensions are
//! `[height, width]` (a leading channel dimension of 1 is allowed). Values
//! are kept in `[0, 1]`.

use crate::{RunRng, SourceError};
use rand::Rng;
use rand_distr::StandardNormal;
use tensor_core::Tensor;

/// Default noise standard deviation.
pub const DEFAULT_NOISE_STD: f32 = 0.2;
/// Default blur kernel size.
pub const DEFAULT_BLUR_KERNEL: usize = 5;
/// Default blur sigma.
pub const DEFAULT_BLUR_SIGMA: f32 = 1.0;

/// How each image is perturbed before evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Augmentation {
    /// Images are used as-is.
    Clean,
    /// `clamp(x + std · N(0, 1), 0, 1)` per pixel.
    Noise { std: f32 },
    /// Separable gaussian blur with reflect padding.
    Blur { kernel_size: usize, sigma: f32 },
    /// Blur, then noise.
    NoiseBlur {
        std: f32,
        kernel_size: usize,
        sigma: f32,
    },
}

impl Augmentation {
    /// Noise with the default standard deviation.
    pub fn noise() -> Self {
        Self::Noise {
            std: DEFAULT_NOISE_STD,
        }
    }

    /// Blur with the default kernel.
    pub fn blur() -> Self {
        Self::Blur {
            kernel_size: DEFAULT_BLUR_KERNEL,
            sigma: DEFAULT_BLUR_SIGMA,
        }
    }

    /// Blur followed by noise, both with defaults.
    pub fn noise_blur() -> Self {
        Self::NoiseBlur {
            std: DEFAULT_NOISE_STD,
            kernel_size: DEFAULT_BLUR_KERNEL,
            sigma: DEFAULT_BLUR_SIGMA,
        }
    }

    /// Whether applying this augmentation consumes randomness.
    pub fn is_stochastic(&self) -> bool {
        matches!(self, Self::Noise { .. } | Self::NoiseBlur { .. })
    }

    /// Checks parameter ranges.
    pub fn validate(&self) -> Result<(), SourceError> {
        let check_noise = |std: f32| {
            if std.is_finite() && std >= 0.0 {
                Ok(())
            } else {
                Err(SourceError::InvalidAugmentation(format!(
                    "noise std must be finite and non-negative, got {std}"
                )))
            }
        };
        let check_blur = |kernel_size: usize, sigma: f32| {
            if kernel_size == 0 || kernel_size % 2 == 0 {
                return Err(SourceError::InvalidAugmentation(format!(
                    "blur kernel size must be odd and positive, got {kernel_size}"
                )));
            }
            if !(sigma.is_finite() && sigma > 0.0) {
                return Err(SourceError::InvalidAugmentation(format!(
                    "blur sigma must be positive, got {sigma}"
                )));
            }
            Ok(())
        };

        match *self {
            Self::Clean => Ok(()),
            Self::Noise { std } => check_noise(std),
            Self::Blur { kernel_size, sigma } => check_blur(kernel_size, sigma),
            Self::NoiseBlur {
                std,
                kernel_size,
                sigma,
            } => {
                check_blur(kernel_size, sigma)?;
                check_noise(std)
            }
        }
    }

    /// Applies the augmentation to one image.
    pub fn apply(&self, image: &Tensor, rng: &mut RunRng) -> Result<Tensor, SourceError> {
        match *self {
            Self::Clean => Ok(image.clone()),
            Self::Noise { std } => Ok(add_noise(image.clone(), std, rng)),
            Self::Blur { kernel_size, sigma } => gaussian_blur(image, kernel_size, sigma),
            Self::NoiseBlur {
                std,
                kernel_size,
                sigma,
            } => Ok(add_noise(gaussian_blur(image, kernel_size, sigma)?, std, rng)),
        }
    }
}

fn add_noise(mut image: Tensor, std: f32, rng: &mut RunRng) -> Tensor {
    for x in image.as_mut_slice() {
        let n: f32 = rng.sample(StandardNormal);
        *x = (*x + std * n).clamp(0.0, 1.0);
    }
    image
}

/// Normalized 1-D gaussian weights over `[-(k-1)/2, (k-1)/2]`.
fn gaussian_kernel(kernel_size: usize, sigma: f32) -> Vec<f32> {
    let half = (kernel_size as f32 - 1.0) / 2.0;
    let raw: Vec<f32> = (0..kernel_size)
        .map(|i| {
            let x = (i as f32 - half) / sigma;
            (-0.5 * x * x).exp()
        })
        .collect();
    let sum: f32 = raw.iter().sum();
    raw.into_iter().map(|w| w / sum).collect()
}

/// Mirrors an out-of-range index without repeating the edge pixel.
fn reflect(i: isize, n: usize) -> usize {
    if n == 1 {
        return 0;
    }
    let period = 2 * (n as isize - 1);
    let m = i.rem_euclid(period);
    if m >= n as isize {
        (period - m) as usize
    } else {
        m as usize
    }
}

fn gaussian_blur(image: &Tensor, kernel_size: usize, sigma: f32) -> Result<Tensor, SourceError> {
    let dims = image.shape().dims();
    let (h, w) = match dims {
        [h, w] | [1, h, w] => (*h, *w),
        _ => {
            return Err(SourceError::InvalidAugmentation(format!(
                "blur needs a [H, W] or [1, H, W] image, got {}",
                image.shape()
            )))
        }
    };
    if h == 0 || w == 0 {
        return Ok(image.clone());
    }

    let kernel = gaussian_kernel(kernel_size, sigma);
    let radius = (kernel_size / 2) as isize;
    let src = image.as_slice();

    // Horizontal pass.
    let mut tmp = vec![0.0f32; h * w];
    for r in 0..h {
        for c in 0..w {
            tmp[r * w + c] = kernel
                .iter()
                .enumerate()
                .map(|(k, &kw)| kw * src[r * w + reflect(c as isize + k as isize - radius, w)])
                .sum();
        }
    }

    // Vertical pass.
    let mut out = vec![0.0f32; h * w];
    for r in 0..h {
        for c in 0..w {
            out[r * w + c] = kernel
                .iter()
                .enumerate()
                .map(|(k, &kw)| kw * tmp[reflect(r as isize + k as isize - radius, h) * w + c])
                .sum::<f32>()
                .clamp(0.0, 1.0);
        }
    }

    Ok(Tensor::from_vec(image.shape().clone(), out)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use tensor_core::Shape;

    fn rng(seed: u64) -> RunRng {
        RunRng::seed_from_u64(seed)
    }

    fn impulse() -> Tensor {
        let mut t = Tensor::zeros(Shape::matrix(7, 7));
        t.as_mut_slice()[3 * 7 + 3] = 1.0;
        t
    }

    #[test]
    fn test_kernel_normalized_and_symmetric() {
        let k = gaussian_kernel(5, 1.0);
        assert_relative_eq!(k.iter().sum::<f32>(), 1.0, epsilon = 1e-6);
        assert_relative_eq!(k[0], k[4], epsilon = 1e-7);
        assert!(k[2] > k[1] && k[1] > k[0]);
    }

    #[test]
    fn test_reflect() {
        assert_eq!(reflect(-1, 5), 1);
        assert_eq!(reflect(-2, 5), 2);
        assert_eq!(reflect(5, 5), 3);
        assert_eq!(reflect(6, 5), 2);
        assert_eq!(reflect(2, 5), 2);
        assert_eq!(reflect(-3, 1), 0);
    }

    #[test]
    fn test_blur_spreads_impulse_and_preserves_mass() {
        let out = Augmentation::blur().apply(&impulse(), &mut rng(0)).unwrap();
        let v = out.as_slice();
        assert!(v[3 * 7 + 3] < 1.0);
        assert!(v[3 * 7 + 4] > 0.0);
        assert_relative_eq!(v.iter().sum::<f32>(), 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_blur_constant_image_unchanged() {
        let img = Tensor::full(Shape::new(vec![1, 6, 6]), 0.4);
        let out = Augmentation::blur().apply(&img, &mut rng(0)).unwrap();
        for &x in out.as_slice() {
            assert_relative_eq!(x, 0.4, epsilon = 1e-6);
        }
        assert_eq!(out.shape(), img.shape());
    }

    #[test]
    fn test_blur_rejects_vectors() {
        let img = Tensor::zeros(Shape::vector(10));
        assert!(Augmentation::blur().apply(&img, &mut rng(0)).is_err());
    }

    #[test]
    fn test_noise_clamped_and_seeded() {
        let img = Tensor::full(Shape::matrix(28, 28), 0.5);
        let a = Augmentation::noise().apply(&img, &mut rng(9)).unwrap();
        let b = Augmentation::noise().apply(&img, &mut rng(9)).unwrap();
        let c = Augmentation::noise().apply(&img, &mut rng(10)).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.as_slice().iter().all(|&x| (0.0..=1.0).contains(&x)));
    }

    #[test]
    fn test_clean_is_identity() {
        let img = impulse();
        assert_eq!(Augmentation::Clean.apply(&img, &mut rng(0)).unwrap(), img);
        assert!(!Augmentation::Clean.is_stochastic());
        assert!(Augmentation::noise_blur().is_stochastic());
    }

    #[test]
    fn test_validate() {
        assert!(Augmentation::noise_blur().validate().is_ok());
        assert!(Augmentation::Blur { kernel_size: 4, sigma: 1.0 }.validate().is_err());
        assert!(Augmentation::Blur { kernel_size: 3, sigma: 0.0 }.validate().is_err());
        assert!(Augmentation::Noise { std: -0.1 }.validate().is_err());
    }
}
