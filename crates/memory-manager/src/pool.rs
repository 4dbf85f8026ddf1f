// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Budget-enforced staging pool for stacked chunk batches.
//!
//! The [`StagingPool`]:
//!
//! 1. Enforces a hard ceiling on live staging memory. An acquire that would
//!    exceed the budget returns `Err(OutOfMemory)`.
//! 2. Keeps returned buffers on a free list keyed by element count. A run
//!    over `n` images in chunks of `c` produces at most two distinct sizes
//!    (`c` and `n % c`), so after the first chunk nearly every acquire is a
//!    reuse hit. Cached buffers count against the budget together with live
//!    ones; a fresh acquire evicts cached buffers of other sizes to make room.
//! 3. Tracks [`PoolStats`] for the engine's memory report.
//!
//! # Thread Safety
//! `StagingPool` is `Send + Sync`; all interior state sits behind atomics or
//! a `Mutex`.

use crate::{BatchBuffer, MemoryBudget, MemoryError, PoolStats};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Free buffers kept per element count.
const MAX_FREE_PER_SIZE: usize = 4;

fn byte_len(len: usize) -> usize {
    len.saturating_mul(std::mem::size_of::<f32>())
}

/// Returned buffers awaiting reuse.
#[derive(Default)]
struct FreeList {
    buffers: HashMap<usize, Vec<Vec<f32>>>,
    cached_bytes: usize,
}

impl FreeList {
    fn take(&mut self, len: usize) -> Option<Vec<f32>> {
        let buffer = self.buffers.get_mut(&len)?.pop()?;
        self.cached_bytes -= byte_len(len);
        Some(buffer)
    }

    /// Caches `buffer` if its size class has room and the cache stays within `limit`.
    fn insert(&mut self, buffer: Vec<f32>, limit: usize) {
        let bytes = byte_len(buffer.len());
        if self.cached_bytes.saturating_add(bytes) > limit {
            return;
        }
        let slot = self.buffers.entry(buffer.len()).or_default();
        if slot.len() < MAX_FREE_PER_SIZE {
            slot.push(buffer);
            self.cached_bytes += bytes;
        }
    }

    /// Drops cached buffers until at most `limit` bytes remain.
    fn evict_to(&mut self, limit: usize) -> usize {
        let mut evicted = 0;
        let cached = &mut self.cached_bytes;
        self.buffers.retain(|_, slot| {
            while *cached > limit {
                match slot.pop() {
                    Some(buffer) => {
                        *cached -= byte_len(buffer.len());
                        evicted += 1;
                    }
                    None => break,
                }
            }
            !slot.is_empty()
        });
        evicted
    }

    fn clear(&mut self) {
        self.buffers.clear();
        self.cached_bytes = 0;
    }
}

/// Shared pool state, referenced by every outstanding [`BatchBuffer`].
pub struct PoolInner {
    budget: MemoryBudget,
    live_bytes: AtomicUsize,
    free_buffers: Mutex<FreeList>,
    stats: Mutex<PoolStats>,
}

impl PoolInner {
    /// Called by `BatchBuffer::drop`.
    pub(crate) fn release(&self, buffer: Vec<f32>) {
        let bytes = byte_len(buffer.len());
        let live = self.live_bytes.fetch_sub(bytes, Ordering::AcqRel) - bytes;

        if let Ok(mut stats) = self.stats.lock() {
            stats.record_release();
        }

        if let Ok(mut free) = self.free_buffers.lock() {
            free.insert(buffer, self.budget.as_bytes().saturating_sub(live));
        }
    }
}

/// Allocator for chunk staging buffers.
///
/// # Example
/// ```
/// use memory_manager::{MemoryBudget, StagingPool};
///
/// let pool = StagingPool::new(MemoryBudget::from_mb(1));
/// drop(pool.acquire(1024).unwrap());
/// let _again = pool.acquire(1024).unwrap();
/// assert_eq!(pool.stats().reuse_hits, 1);
/// ```
pub struct StagingPool {
    inner: Arc<PoolInner>,
}

impl StagingPool {
    /// Creates a new pool with the given budget.
    pub fn new(budget: MemoryBudget) -> Self {
        Self {
            inner: Arc::new(PoolInner {
                budget,
                live_bytes: AtomicUsize::new(0),
                free_buffers: Mutex::new(FreeList::default()),
                stats: Mutex::new(PoolStats::default()),
            }),
        }
    }

    /// Creates a pool with no practical ceiling.
    pub fn unbounded() -> Self {
        Self::new(MemoryBudget::from_bytes(usize::MAX))
    }

    /// Acquires a zeroed buffer of `len` `f32` elements.
    pub fn acquire(&self, len: usize) -> Result<BatchBuffer, MemoryError> {
        if len == 0 {
            return Err(MemoryError::ZeroSizedAllocation);
        }

        let bytes = byte_len(len);
        let budget = self.inner.budget.as_bytes();
        let live = self.inner.live_bytes.load(Ordering::Acquire);

        if live.saturating_add(bytes) > budget {
            if let Ok(mut stats) = self.inner.stats.lock() {
                stats.record_rejected();
            }
            return Err(MemoryError::OutOfMemory {
                requested_bytes: bytes,
                available_bytes: budget.saturating_sub(live),
                budget_bytes: budget,
            });
        }

        let reused = match self.inner.free_buffers.lock() {
            Ok(mut free) => {
                let hit = free.take(len);
                if hit.is_none() {
                    let evicted = free.evict_to(budget.saturating_sub(live).saturating_sub(bytes));
                    if evicted > 0 {
                        tracing::trace!(evicted, "evicted cached buffers");
                    }
                }
                hit
            }
            Err(_) => None,
        };

        let is_hit = reused.is_some();
        let data = match reused {
            Some(mut buf) => {
                buf.fill(0.0);
                buf
            }
            None => vec![0.0f32; len],
        };

        let now_live = self.inner.live_bytes.fetch_add(bytes, Ordering::AcqRel) + bytes;

        if let Ok(mut stats) = self.inner.stats.lock() {
            if is_hit {
                stats.record_reuse();
            } else {
                stats.record_fresh();
            }
            stats.update_peak(now_live);
        }

        Ok(BatchBuffer::new(data, Arc::clone(&self.inner)))
    }

    /// Acquires a buffer and fills it with the concatenation of `parts`.
    ///
    /// This is how a chunk of images is stacked into one batch.
    pub fn stage<'a, I>(&self, parts: I, total_len: usize) -> Result<BatchBuffer, MemoryError>
    where
        I: IntoIterator<Item = &'a [f32]>,
    {
        let mut buffer = self.acquire(total_len)?;
        let dst = buffer.as_mut_slice();
        let mut offset = 0;
        for part in parts {
            let end = (offset + part.len()).min(dst.len());
            dst[offset..end].copy_from_slice(&part[..end - offset]);
            offset = end;
        }
        tracing::trace!(elements = total_len, "staged batch");
        Ok(buffer)
    }

    /// Returns the number of bytes currently live.
    pub fn allocated_bytes(&self) -> usize {
        self.inner.live_bytes.load(Ordering::Acquire)
    }

    /// Returns the budget.
    pub fn budget(&self) -> MemoryBudget {
        self.inner.budget
    }

    /// Returns a snapshot of pool statistics.
    pub fn stats(&self) -> PoolStats {
        self.inner
            .stats
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    /// Returns the number of bytes held by cached free buffers.
    pub fn cached_bytes(&self) -> usize {
        self.inner
            .free_buffers
            .lock()
            .map(|free| free.cached_bytes)
            .unwrap_or(0)
    }

    /// Drops every cached free buffer.
    pub fn shrink(&self) {
        if let Ok(mut free) = self.inner.free_buffers.lock() {
            free.clear();
        }
    }
}

impl std::fmt::Debug for StagingPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StagingPool")
            .field("budget", &self.inner.budget)
            .field("allocated_bytes", &self.allocated_bytes())
            .field("cached_bytes", &self.cached_bytes())
            .finish()
    }
}
