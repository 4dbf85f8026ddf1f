// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for memory management.

/// Errors that can occur while parsing budgets or staging batches.
#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
    /// The requested buffer would exceed the memory budget.
    #[error("out of memory: requested {requested_bytes} bytes, but only {available_bytes} available (budget: {budget_bytes})")]
    OutOfMemory {
        requested_bytes: usize,
        available_bytes: usize,
        budget_bytes: usize,
    },

    /// Attempted to acquire a zero-length buffer.
    #[error("cannot stage a zero-length buffer")]
    ZeroSizedAllocation,

    /// A budget string could not be parsed.
    #[error("invalid memory budget '{input}': {reason}")]
    InvalidBudget { input: String, reason: String },
}
