// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Fully connected layers with per-variant weight storage.
//!
//! Every variant computes the same function shape, `y = x · Wᵀ + b`, but
//! stores `W` differently:
//!
//! | Storage      | Variant     | Per-output cost            |
//! |--------------|-------------|----------------------------|
//! | `Dense`      | baseline/kd | `in` multiply-adds         |
//! | `Sparse`     | pruned      | `nnz(row)` multiply-adds   |
//! | `LowRank`    | lrf         | `r·(in + out)` per image   |
//! | `Quantized`  | quantized   | `in` int8 dequant-adds     |
//! | `Shared`     | ws          | `in` codebook lookups      |

use tensor_core::{linear, Shape, Tensor, TensorError, TensorView};

/// A row-major sparse matrix in compressed sparse row format.
#[derive(Debug, Clone, PartialEq)]
pub struct CsrMatrix {
    rows: usize,
    cols: usize,
    row_ptr: Vec<usize>,
    col_idx: Vec<usize>,
    values: Vec<f32>,
}

impl CsrMatrix {
    /// Builds a CSR matrix from a dense `[rows, cols]` buffer, dropping exact zeros.
    pub fn from_dense(rows: usize, cols: usize, data: &[f32]) -> Result<Self, TensorError> {
        if data.len() != rows * cols {
            return Err(TensorError::BufferSizeMismatch {
                shape: Shape::matrix(rows, cols),
                expected: rows * cols,
                actual: data.len(),
            });
        }

        let mut row_ptr = Vec::with_capacity(rows + 1);
        let mut col_idx = Vec::new();
        let mut values = Vec::new();
        row_ptr.push(0);

        for row in data.chunks_exact(cols.max(1)).take(rows) {
            for (c, &v) in row.iter().enumerate() {
                if v != 0.0 {
                    col_idx.push(c);
                    values.push(v);
                }
            }
            row_ptr.push(values.len());
        }

        Ok(Self {
            rows,
            cols,
            row_ptr,
            col_idx,
            values,
        })
    }

    /// Number of stored (non-zero) entries.
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Fraction of entries that are stored, in `[0.0, 1.0]`.
    pub fn density(&self) -> f64 {
        let total = self.rows * self.cols;
        if total == 0 {
            return 0.0;
        }
        self.nnz() as f64 / total as f64
    }

    fn row_dot(&self, row: usize, x: &[f32]) -> f32 {
        let (start, end) = (self.row_ptr[row], self.row_ptr[row + 1]);
        self.col_idx[start..end]
            .iter()
            .zip(&self.values[start..end])
            .fold(0.0f32, |acc, (&c, &v)| acc + x[c] * v)
    }
}

/// One fully connected layer.
#[derive(Debug, Clone)]
pub enum LinearLayer {
    /// Dense `f32` weight `[out, in]`.
    Dense { weight: Tensor, bias: Vec<f32> },
    /// Pruned weight with zeros removed.
    Sparse { weight: CsrMatrix, bias: Vec<f32> },
    /// `W = U · V` with `U: [out, r]`, `V: [r, in]`.
    LowRank { u: Tensor, v: Tensor, bias: Vec<f32> },
    /// `W = scale · q` with `q` stored as `i8`.
    Quantized {
        weight: Vec<i8>,
        scale: f32,
        out_features: usize,
        in_features: usize,
        bias: Vec<f32>,
    },
    /// `W[i, j] = codebook[indices[i, j]]`.
    Shared {
        indices: Vec<u8>,
        codebook: Vec<f32>,
        out_features: usize,
        in_features: usize,
        bias: Vec<f32>,
    },
}

fn check_bias(op: &'static str, out_features: usize, bias: &[f32]) -> Result<(), TensorError> {
    if bias.len() != out_features {
        return Err(TensorError::ShapeMismatch {
            op,
            lhs: Shape::vector(out_features),
            rhs: Shape::vector(bias.len()),
        });
    }
    Ok(())
}

fn matrix_dims(op: &'static str, t: &Tensor) -> Result<(usize, usize), TensorError> {
    match t.shape().dims() {
        &[rows, cols] if rows > 0 && cols > 0 => Ok((rows, cols)),
        _ => Err(TensorError::ShapeMismatch {
            op,
            lhs: Shape::matrix(1, 1),
            rhs: t.shape().clone(),
        }),
    }
}

impl LinearLayer {
    /// A dense layer. `weight` must be a non-empty `[out, in]` matrix.
    pub fn dense(weight: Tensor, bias: Vec<f32>) -> Result<Self, TensorError> {
        let (out, _) = matrix_dims("dense weight", &weight)?;
        check_bias("dense bias", out, &bias)?;
        Ok(Self::Dense { weight, bias })
    }

    /// A sparse layer built from a dense pruned `[out, in]` weight.
    pub fn sparse(weight: &Tensor, bias: Vec<f32>) -> Result<Self, TensorError> {
        let (out, inp) = matrix_dims("sparse weight", weight)?;
        check_bias("sparse bias", out, &bias)?;
        let weight = CsrMatrix::from_dense(out, inp, weight.as_slice())?;
        Ok(Self::Sparse { weight, bias })
    }

    /// A low-rank layer. `u` is `[out, r]`, `v` is `[r, in]`.
    pub fn low_rank(u: Tensor, v: Tensor, bias: Vec<f32>) -> Result<Self, TensorError> {
        let (out, r_u) = matrix_dims("low-rank u", &u)?;
        let (r_v, _) = matrix_dims("low-rank v", &v)?;
        if r_u != r_v {
            return Err(TensorError::ShapeMismatch {
                op: "low-rank factors",
                lhs: u.shape().clone(),
                rhs: v.shape().clone(),
            });
        }
        check_bias("low-rank bias", out, &bias)?;
        Ok(Self::LowRank { u, v, bias })
    }

    /// An int8 layer with a per-tensor scale.
    pub fn quantized(
        weight: Vec<i8>,
        scale: f32,
        shape: &Shape,
        bias: Vec<f32>,
    ) -> Result<Self, TensorError> {
        let (out_features, in_features) = match shape.dims() {
            &[o, i] if o > 0 && i > 0 => (o, i),
            _ => {
                return Err(TensorError::ShapeMismatch {
                    op: "quantized weight",
                    lhs: Shape::matrix(1, 1),
                    rhs: shape.clone(),
                })
            }
        };
        if weight.len() != out_features * in_features {
            return Err(TensorError::BufferSizeMismatch {
                shape: shape.clone(),
                expected: out_features * in_features,
                actual: weight.len(),
            });
        }
        check_bias("quantized bias", out_features, &bias)?;
        Ok(Self::Quantized {
            weight,
            scale,
            out_features,
            in_features,
            bias,
        })
    }

    /// A weight-shared layer. Every index must address an entry of `codebook`.
    pub fn shared(
        indices: Vec<u8>,
        codebook: Vec<f32>,
        shape: &Shape,
        bias: Vec<f32>,
    ) -> Result<Self, TensorError> {
        let (out_features, in_features) = match shape.dims() {
            &[o, i] if o > 0 && i > 0 => (o, i),
            _ => {
                return Err(TensorError::ShapeMismatch {
                    op: "shared indices",
                    lhs: Shape::matrix(1, 1),
                    rhs: shape.clone(),
                })
            }
        };
        if indices.len() != out_features * in_features {
            return Err(TensorError::BufferSizeMismatch {
                shape: shape.clone(),
                expected: out_features * in_features,
                actual: indices.len(),
            });
        }
        let max_index = indices.iter().copied().max().unwrap_or(0) as usize;
        if max_index >= codebook.len() {
            return Err(TensorError::ShapeMismatch {
                op: "codebook lookup",
                lhs: Shape::vector(codebook.len()),
                rhs: Shape::vector(max_index + 1),
            });
        }
        check_bias("shared bias", out_features, &bias)?;
        Ok(Self::Shared {
            indices,
            codebook,
            out_features,
            in_features,
            bias,
        })
    }

    /// Width of the layer's input.
    pub fn in_features(&self) -> usize {
        match self {
            Self::Dense { weight, .. } => weight.shape().row_len(),
            Self::Sparse { weight, .. } => weight.cols,
            Self::LowRank { v, .. } => v.shape().row_len(),
            Self::Quantized { in_features, .. } | Self::Shared { in_features, .. } => *in_features,
        }
    }

    /// Width of the layer's output.
    pub fn out_features(&self) -> usize {
        match self {
            Self::Dense { weight, .. } => weight.shape().batch_size(),
            Self::Sparse { weight, .. } => weight.rows,
            Self::LowRank { u, .. } => u.shape().batch_size(),
            Self::Quantized { out_features, .. } | Self::Shared { out_features, .. } => {
                *out_features
            }
        }
    }

    /// Number of stored weight values, including the bias.
    pub fn parameter_count(&self) -> usize {
        let weights = match self {
            Self::Dense { weight, .. } => weight.len(),
            Self::Sparse { weight, .. } => weight.nnz(),
            Self::LowRank { u, v, .. } => u.len() + v.len(),
            Self::Quantized { weight, .. } => weight.len() + 1,
            Self::Shared {
                indices, codebook, ..
            } => indices.len() + codebook.len(),
        };
        weights + self.bias().len()
    }

    /// Short name of the storage format.
    pub fn storage(&self) -> &'static str {
        match self {
            Self::Dense { .. } => "dense",
            Self::Sparse { .. } => "csr",
            Self::LowRank { .. } => "low-rank",
            Self::Quantized { .. } => "int8",
            Self::Shared { .. } => "codebook",
        }
    }

    fn bias(&self) -> &[f32] {
        match self {
            Self::Dense { bias, .. }
            | Self::Sparse { bias, .. }
            | Self::LowRank { bias, .. }
            | Self::Quantized { bias, .. }
            | Self::Shared { bias, .. } => bias,
        }
    }

    /// Applies the layer to every row of `input` (`[k, ...]` → `[k, out]`).
    pub fn forward(&self, input: &TensorView<'_>) -> Result<Tensor, TensorError> {
        match self {
            Self::Dense { weight, bias } => linear(input, &weight.view(), Some(bias.as_slice())),
            Self::LowRank { u, v, bias } => {
                let projected = linear(input, &v.view(), None)?;
                linear(&projected.view(), &u.view(), Some(bias.as_slice()))
            }
            Self::Sparse { weight, bias } => {
                project(input, weight.rows, weight.cols, bias, |row, x| {
                    weight.row_dot(row, x)
                })
            }
            Self::Quantized {
                weight,
                scale,
                out_features,
                in_features,
                bias,
            } => project(input, *out_features, *in_features, bias, |row, x| {
                let q = &weight[row * in_features..(row + 1) * in_features];
                let acc = x
                    .iter()
                    .zip(q)
                    .fold(0.0f32, |acc, (&a, &w)| acc + a * f32::from(w));
                acc * scale
            }),
            Self::Shared {
                indices,
                codebook,
                out_features,
                in_features,
                bias,
            } => project(input, *out_features, *in_features, bias, |row, x| {
                let idx = &indices[row * in_features..(row + 1) * in_features];
                x.iter()
                    .zip(idx)
                    .fold(0.0f32, |acc, (&a, &i)| acc + a * codebook[usize::from(i)])
            }),
        }
    }
}

/// Shared driver for the non-dense formats: `out[m, j] = dot(j, x_m) + b[j]`.
fn project<F>(
    input: &TensorView<'_>,
    out_features: usize,
    in_features: usize,
    bias: &[f32],
    dot: F,
) -> Result<Tensor, TensorError>
where
    F: Fn(usize, &[f32]) -> f32,
{
    if input.shape().row_len() != in_features {
        return Err(TensorError::ShapeMismatch {
            op: "linear",
            lhs: input.shape().clone(),
            rhs: Shape::matrix(out_features, in_features),
        });
    }

    let m = input.shape().batch_size();
    let mut out = vec![0.0f32; m * out_features];
    for (x, out_row) in input.rows().zip(out.chunks_exact_mut(out_features)) {
        for (j, o) in out_row.iter_mut().enumerate() {
            *o = dot(j, x) + bias[j];
        }
    }
    Tensor::from_vec(Shape::matrix(m, out_features), out)
}
