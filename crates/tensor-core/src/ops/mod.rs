// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Tensor arithmetic operations.
//!
//! Kernels are deliberately plain loops with a fixed accumulation order so
//! that repeated calls on the same input are bit-for-bit identical.

mod linear_op;
mod relu_op;
mod softmax_op;

pub use linear_op::linear;
pub use relu_op::relu;
pub use softmax_op::softmax;
