// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Rectified linear unit, applied in place.

use crate::Tensor;

/// Replaces every negative element with zero.
///
/// NaN inputs are left untouched so that numeric faults surface downstream
/// instead of being masked as zeros.
pub fn relu(tensor: &mut Tensor) {
    for x in tensor.as_mut_slice() {
        if *x < 0.0 {
            *x = 0.0;
        }
    }
}
