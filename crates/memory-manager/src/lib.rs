// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # memory-manager
//!
//! Bounded memory for chunked batch evaluation.
//!
//! # Key Components
//!
//! - [`MemoryBudget`]: a hard memory ceiling with human-readable parsing
//!   (`"64M"`, `"1G"`, etc.), used to cap how many images one chunk may hold.
//! - [`StagingPool`]: hands out `f32` staging buffers for stacked chunk
//!   batches, enforces the budget, and keeps returned buffers on a free list
//!   so that equally sized chunks reuse the same allocation.
//! - [`BatchBuffer`]: an RAII wrapper around a staging buffer. Dropping it
//!   returns the buffer to the pool.
//! - [`PoolStats`]: cumulative pool metrics (peak usage, reuse hits, budget
//!   rejections).
//!
//! # Ownership Model
//!
//! ```text
//! StagingPool::acquire(len)
//!       │
//!       ▼
//!   BatchBuffer  ◄─── owns Vec<f32>, holds Arc<PoolInner>
//!       │
//!       │  drop()
//!       ▼
//!   PoolInner::release()  ──► free list
//! ```
//!
//! # Example
//! ```
//! use memory_manager::{MemoryBudget, StagingPool};
//!
//! let pool = StagingPool::new(MemoryBudget::from_mb(4));
//! let batch = pool.acquire(32 * 784).unwrap();
//! assert_eq!(pool.allocated_bytes(), 32 * 784 * 4);
//! drop(batch);
//! assert_eq!(pool.allocated_bytes(), 0);
//! ```

mod budget;
mod error;
mod guard;
pub mod pool;
mod stats;

pub use budget::MemoryBudget;
pub use error::MemoryError;
pub use guard::BatchBuffer;
pub use pool::StagingPool;
pub use stats::PoolStats;
