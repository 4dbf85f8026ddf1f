// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # tensor-core
//!
//! Small, dependency-light tensor types and the handful of kernels that the
//! classifier variants in `model-zoo` are built from.
//!
//! This crate provides:
//! - [`Tensor`]: an owned, row-major `f32` tensor.
//! - [`TensorView`]: a borrowed view, used to hand stacked chunk batches to
//!   models without copying them out of the staging pool.
//! - [`Shape`]: runtime shape descriptors with batch helpers.
//! - [`DType`]: element types found in weight files (`f32`, `i8`, `u8`).
//! - Kernels: [`linear`] (`x · Wᵀ + b`), [`relu`], and row-wise [`softmax`].
//!
//! Every kernel is a pure function of its inputs: identical inputs produce
//! bit-identical outputs, which the evaluation engine relies on for
//! reproducible metrics.

mod dtype;
mod error;
mod ops;
mod shape;
mod tensor;

pub use dtype::DType;
pub use error::TensorError;
pub use ops::{linear, relu, softmax};
pub use shape::Shape;
pub use tensor::{Tensor, TensorView};
