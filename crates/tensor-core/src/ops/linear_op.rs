// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Fully connected layer: `output = input · Wᵀ + b`.

use crate::{Shape, Tensor, TensorError, TensorView};

/// Applies a dense linear transform to every row of `input`.
///
/// `input` is viewed as `[M, K]` (any trailing dimensions are flattened, so a
/// `[k, 28, 28]` image batch is treated as `[k, 784]`). `weight` is `[N, K]`
/// in the PyTorch `nn.Linear` layout, and `bias`, if given, has `N` entries.
/// The result is an `[M, N]` tensor.
///
/// # Errors
/// Returns [`TensorError::ShapeMismatch`] if the inner dimensions disagree or
/// the bias length differs from `N`.
pub fn linear(
    input: &TensorView<'_>,
    weight: &TensorView<'_>,
    bias: Option<&[f32]>,
) -> Result<Tensor, TensorError> {
    let w_dims = weight.shape().dims();
    if w_dims.len() != 2 {
        return Err(TensorError::ShapeMismatch {
            op: "linear (weight rank)",
            lhs: Shape::matrix(0, 0),
            rhs: weight.shape().clone(),
        });
    }
    let (n, k) = (w_dims[0], w_dims[1]);
    let m = input.shape().batch_size();

    if input.shape().row_len() != k {
        return Err(TensorError::ShapeMismatch {
            op: "linear",
            lhs: input.shape().clone(),
            rhs: weight.shape().clone(),
        });
    }
    if let Some(b) = bias {
        if b.len() != n {
            return Err(TensorError::ShapeMismatch {
                op: "linear (bias)",
                lhs: Shape::vector(n),
                rhs: Shape::vector(b.len()),
            });
        }
    }

    let x = input.as_slice();
    let w = weight.as_slice();
    let mut out = vec![0.0f32; m * n];

    for (row, out_row) in out.chunks_exact_mut(n.max(1)).enumerate().take(m) {
        let x_row = &x[row * k..(row + 1) * k];
        for (j, o) in out_row.iter_mut().enumerate() {
            let w_row = &w[j * k..(j + 1) * k];
            let mut acc = 0.0f32;
            for (a, b) in x_row.iter().zip(w_row) {
                acc += a * b;
            }
            *o = acc + bias.map_or(0.0, |b| b[j]);
        }
    }

    Tensor::from_vec(Shape::matrix(m, n), out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_identity() {
        let x = Tensor::from_vec(Shape::matrix(2, 2), vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let w = Tensor::from_vec(Shape::matrix(2, 2), vec![1.0, 0.0, 0.0, 1.0]).unwrap();
        let y = linear(&x.view(), &w.view(), None).unwrap();
        assert_eq!(y.as_slice(), x.as_slice());
    }

    #[test]
    fn test_linear_with_bias() {
        // [1, 3] · [2, 3]ᵀ + b
        let x = Tensor::from_vec(Shape::matrix(1, 3), vec![1.0, 2.0, 3.0]).unwrap();
        let w = Tensor::from_vec(Shape::matrix(2, 3), vec![1.0, 1.0, 1.0, 0.0, 1.0, 0.0]).unwrap();
        let y = linear(&x.view(), &w.view(), Some(&[0.5, -1.0])).unwrap();
        assert_eq!(y.shape(), &Shape::matrix(1, 2));
        assert_eq!(y.as_slice(), &[6.5, 1.0]);
    }

    #[test]
    fn test_linear_flattens_images() {
        let x = Tensor::full(Shape::new(vec![3, 2, 2]), 1.0);
        let w = Tensor::full(Shape::matrix(5, 4), 0.25);
        let y = linear(&x.view(), &w.view(), None).unwrap();
        assert_eq!(y.shape(), &Shape::matrix(3, 5));
        assert!(y.as_slice().iter().all(|&v| (v - 1.0).abs() < 1e-6));
    }

    #[test]
    fn test_linear_shape_mismatch() {
        let x = Tensor::zeros(Shape::matrix(2, 3));
        let w = Tensor::zeros(Shape::matrix(4, 5));
        assert!(linear(&x.view(), &w.view(), None).is_err());
    }

    #[test]
    fn test_linear_bias_mismatch() {
        let x = Tensor::zeros(Shape::matrix(1, 2));
        let w = Tensor::zeros(Shape::matrix(3, 2));
        assert!(linear(&x.view(), &w.view(), Some(&[0.0])).is_err());
    }

    #[test]
    fn test_linear_is_deterministic() {
        let x = Tensor::from_vec(Shape::matrix(2, 4), (0..8).map(|i| i as f32 * 0.37).collect()).unwrap();
        let w = Tensor::from_vec(Shape::matrix(3, 4), (0..12).map(|i| (i as f32).sin()).collect()).unwrap();
        let a = linear(&x.view(), &w.view(), None).unwrap();
        let b = linear(&x.view(), &w.view(), None).unwrap();
        assert_eq!(a.as_slice(), b.as_slice());
    }
}
