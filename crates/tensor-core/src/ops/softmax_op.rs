// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Softmax activation operation.

use crate::{Tensor, TensorError, TensorView};

/// Computes softmax along the last dimension: `output[i] = exp(x[i] - max) / sum(exp(x - max))`.
///
/// Uses the numerically stable variant that subtracts the row maximum
/// before exponentiation to prevent overflow. For a `[k, C]` score matrix
/// this yields one probability distribution per image.
///
/// # Errors
/// Returns [`TensorError::ShapeMismatch`] if input and output shapes differ.
pub fn softmax(input: &TensorView<'_>, output: &mut Tensor) -> Result<(), TensorError> {
    if input.shape() != output.shape() {
        return Err(TensorError::ShapeMismatch {
            op: "softmax",
            lhs: input.shape().clone(),
            rhs: output.shape().clone(),
        });
    }

    let last_dim = match input.shape().dims().last() {
        Some(&d) => d,
        None => {
            // Scalar: softmax of a single value is 1.0.
            output.as_mut_slice()[0] = 1.0;
            return Ok(());
        }
    };
    if last_dim == 0 {
        return Ok(());
    }

    let src = input.as_slice();
    let dst = output.as_mut_slice();

    for (row_src, row_dst) in src.chunks_exact(last_dim).zip(dst.chunks_exact_mut(last_dim)) {
        let max_val = row_src.iter().copied().fold(f32::NEG_INFINITY, f32::max);

        let mut sum = 0.0f32;
        for (d, &s) in row_dst.iter_mut().zip(row_src) {
            let e = (s - max_val).exp();
            *d = e;
            sum += e;
        }

        if sum > 0.0 {
            let inv_sum = 1.0 / sum;
            for d in row_dst.iter_mut() {
                *d *= inv_sum;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Shape;

    fn approx_eq(a: &[f32], b: &[f32], tol: f32) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(x, y)| (x - y).abs() < tol)
    }

    fn run(shape: Shape, values: Vec<f32>) -> Tensor {
        let input = Tensor::from_vec(shape.clone(), values).unwrap();
        let mut output = Tensor::zeros(shape);
        softmax(&input.view(), &mut output).unwrap();
        output
    }

    #[test]
    fn test_softmax_uniform() {
        let out = run(Shape::vector(4), vec![1.0; 4]);
        assert!(approx_eq(out.as_slice(), &[0.25; 4], 1e-6));
    }

    #[test]
    fn test_softmax_monotonic() {
        let out = run(Shape::vector(3), vec![1.0, 2.0, 3.0]);
        let r = out.as_slice();
        assert!(r[0] < r[1] && r[1] < r[2]);
    }

    #[test]
    fn test_softmax_rows_sum_to_one() {
        let out = run(Shape::matrix(2, 3), vec![1.0, 2.0, 3.0, 1.0, 1.0, 1.0]);
        let r = out.as_slice();
        let sum0: f32 = r[0..3].iter().sum();
        assert!((sum0 - 1.0).abs() < 1e-6);
        assert!(approx_eq(&r[3..6], &[1.0 / 3.0; 3], 1e-6));
    }

    #[test]
    fn test_softmax_numerical_stability() {
        let out = run(Shape::vector(3), vec![1000.0, 1001.0, 1002.0]);
        let sum: f32 = out.as_slice().iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        assert!(out.as_slice().iter().all(|x| x.is_finite()));
    }

    #[test]
    fn test_softmax_shape_mismatch() {
        let input = Tensor::zeros(Shape::matrix(2, 3));
        let mut output = Tensor::zeros(Shape::matrix(3, 2));
        assert!(softmax(&input.view(), &mut output).is_err());
    }
}
