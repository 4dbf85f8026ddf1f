// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Core tensor type and view abstractions.

use crate::{Shape, TensorError};

/// An owned, n-dimensional `f32` tensor stored in contiguous memory.
///
/// `Tensor` is the data carrier for images and model activations.
/// It owns its buffer and exposes immutable views via [`TensorView`].
///
/// # Memory Layout
/// Data is stored in row-major (C) order.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    shape: Shape,
    data: Vec<f32>,
}

impl Tensor {
    /// Creates a new tensor filled with zeros.
    ///
    /// # Examples
    /// ```
    /// use tensor_core::{Tensor, Shape};
    /// let t = Tensor::zeros(Shape::matrix(2, 3));
    /// assert_eq!(t.len(), 6);
    /// ```
    pub fn zeros(shape: Shape) -> Self {
        Self::full(shape, 0.0)
    }

    /// Creates a tensor with every element set to `value`.
    pub fn full(shape: Shape, value: f32) -> Self {
        let n = shape.num_elements();
        Self {
            shape,
            data: vec![value; n],
        }
    }

    /// Creates a tensor from an owned vector of values.
    ///
    /// Returns an error if `values.len()` does not match the shape.
    ///
    /// # Examples
    /// ```
    /// use tensor_core::{Tensor, Shape};
    /// let t = Tensor::from_vec(Shape::vector(3), vec![1.0, 2.0, 3.0]).unwrap();
    /// assert_eq!(t.as_slice(), &[1.0, 2.0, 3.0]);
    /// ```
    pub fn from_vec(shape: Shape, values: Vec<f32>) -> Result<Self, TensorError> {
        let expected = shape.num_elements();
        if values.len() != expected {
            return Err(TensorError::BufferSizeMismatch {
                shape,
                expected,
                actual: values.len(),
            });
        }
        Ok(Self {
            shape,
            data: values,
        })
    }

    /// Creates a tensor by copying a slice of values.
    pub fn from_slice(shape: Shape, values: &[f32]) -> Result<Self, TensorError> {
        Self::from_vec(shape, values.to_vec())
    }

    /// Stacks equally-shaped tensors along a new leading batch dimension.
    ///
    /// # Errors
    /// Returns [`TensorError::EmptyInput`] for an empty slice and
    /// [`TensorError::ShapeMismatch`] if any tensor differs in shape from
    /// the first one.
    pub fn stack(items: &[Tensor]) -> Result<Self, TensorError> {
        let first = items.first().ok_or(TensorError::EmptyInput { op: "stack" })?;
        let item_shape = first.shape().clone();
        let mut data = Vec::with_capacity(item_shape.num_elements() * items.len());
        for item in items {
            if item.shape() != &item_shape {
                return Err(TensorError::ShapeMismatch {
                    op: "stack",
                    lhs: item_shape,
                    rhs: item.shape().clone(),
                });
            }
            data.extend_from_slice(item.as_slice());
        }
        Ok(Self {
            shape: item_shape.batched(items.len()),
            data,
        })
    }

    /// Returns the tensor's shape.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Returns the number of elements.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the tensor holds no elements.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns an immutable view over this tensor's data.
    pub fn view(&self) -> TensorView<'_> {
        TensorView {
            shape: self.shape.clone(),
            data: &self.data,
        }
    }

    /// Returns the values in row-major order.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Returns the values mutably in row-major order.
    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Consumes the tensor and returns its buffer.
    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }

    /// Iterates over rows of the tensor viewed as `[dim0, rest]`.
    pub fn rows(&self) -> std::slice::ChunksExact<'_, f32> {
        self.data.chunks_exact(self.shape.row_len().max(1))
    }

    /// Returns the memory footprint of this tensor's data in bytes.
    pub fn size_bytes(&self) -> usize {
        self.data.len() * std::mem::size_of::<f32>()
    }
}

/// A borrowed, read-only view over `f32` data with a shape.
///
/// Views are zero-copy and tied to the lifetime of the source buffer,
/// which may be a [`Tensor`] or a pooled staging buffer.
#[derive(Debug, Clone)]
pub struct TensorView<'a> {
    shape: Shape,
    data: &'a [f32],
}

impl<'a> TensorView<'a> {
    /// Creates a view over `data` with the given shape.
    ///
    /// Returns an error if the slice length does not match the shape.
    pub fn from_parts(shape: Shape, data: &'a [f32]) -> Result<Self, TensorError> {
        let expected = shape.num_elements();
        if data.len() != expected {
            return Err(TensorError::BufferSizeMismatch {
                shape,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { shape, data })
    }

    /// Returns the shape of the viewed data.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Returns the viewed values.
    pub fn as_slice(&self) -> &'a [f32] {
        self.data
    }

    /// Iterates over rows of the view interpreted as `[dim0, rest]`.
    pub fn rows(&self) -> std::slice::ChunksExact<'a, f32> {
        self.data.chunks_exact(self.shape.row_len().max(1))
    }

    /// Copies the view into an owned tensor.
    pub fn to_tensor(&self) -> Tensor {
        Tensor {
            shape: self.shape.clone(),
            data: self.data.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zeros() {
        let t = Tensor::zeros(Shape::matrix(2, 3));
        assert_eq!(t.size_bytes(), 24);
        assert_eq!(t.shape(), &Shape::matrix(2, 3));
        assert!(t.as_slice().iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_from_vec_size_mismatch() {
        let result = Tensor::from_vec(Shape::matrix(2, 3), vec![0.0; 5]);
        assert!(matches!(
            result,
            Err(TensorError::BufferSizeMismatch {
                expected: 6,
                actual: 5,
                ..
            })
        ));
    }

    #[test]
    fn test_stack_preserves_order() {
        let a = Tensor::from_vec(Shape::vector(2), vec![1.0, 2.0]).unwrap();
        let b = Tensor::from_vec(Shape::vector(2), vec![3.0, 4.0]).unwrap();
        let s = Tensor::stack(&[a, b]).unwrap();
        assert_eq!(s.shape().dims(), &[2, 2]);
        assert_eq!(s.as_slice(), &[1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_stack_rejects_mixed_shapes() {
        let a = Tensor::zeros(Shape::vector(2));
        let b = Tensor::zeros(Shape::vector(3));
        assert!(matches!(
            Tensor::stack(&[a, b]),
            Err(TensorError::ShapeMismatch { op: "stack", .. })
        ));
    }

    #[test]
    fn test_stack_empty() {
        assert!(matches!(
            Tensor::stack(&[]),
            Err(TensorError::EmptyInput { .. })
        ));
    }

    #[test]
    fn test_rows() {
        let t = Tensor::from_vec(Shape::matrix(2, 3), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let rows: Vec<&[f32]> = t.rows().collect();
        assert_eq!(rows, vec![&[1.0, 2.0, 3.0][..], &[4.0, 5.0, 6.0][..]]);
    }

    #[test]
    fn test_view_from_parts() {
        let data = [0.5f32; 8];
        let v = TensorView::from_parts(Shape::new(vec![2, 2, 2]), &data).unwrap();
        assert_eq!(v.rows().count(), 2);
        assert_eq!(v.to_tensor().len(), 8);
        assert!(TensorView::from_parts(Shape::vector(3), &data).is_err());
    }
}
