// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! RAII staging buffer that returns itself to the pool on drop.

use crate::pool::PoolInner;
use std::sync::Arc;

/// A staged `f32` buffer holding one stacked chunk batch.
///
/// When a `BatchBuffer` is dropped its storage goes back to the
/// [`StagingPool`](crate::StagingPool) free list and the pool's live-bytes
/// counter is decremented.
pub struct BatchBuffer {
    /// Wrapped in `Option` so that `drop()` can move it out.
    data: Option<Vec<f32>>,
    pool: Arc<PoolInner>,
}

impl BatchBuffer {
    pub(crate) fn new(data: Vec<f32>, pool: Arc<PoolInner>) -> Self {
        Self {
            data: Some(data),
            pool,
        }
    }

    /// Returns the staged values.
    pub fn as_slice(&self) -> &[f32] {
        self.data.as_deref().unwrap_or(&[])
    }

    /// Returns the staged values mutably.
    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        self.data.as_deref_mut().unwrap_or(&mut [])
    }

    /// Number of `f32` elements in the buffer.
    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    /// Returns `true` if the buffer has no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Size of this buffer in bytes.
    pub fn size_bytes(&self) -> usize {
        self.len() * std::mem::size_of::<f32>()
    }
}

impl Drop for BatchBuffer {
    fn drop(&mut self) {
        if let Some(buffer) = self.data.take() {
            self.pool.release(buffer);
        }
    }
}

impl std::fmt::Debug for BatchBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchBuffer")
            .field("len", &self.len())
            .finish()
    }
}
