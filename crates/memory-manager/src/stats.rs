// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Staging pool statistics.
//!
//! [`PoolStats`] shows how chunk batches used the pool: the peak live bytes
//! should never exceed one chunk's batch, and every chunk after the first
//! full one should be served from the free list.

/// Cumulative statistics about staging pool usage.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct PoolStats {
    /// Total number of acquire requests, including rejected ones.
    pub total_acquires: u64,
    /// Acquires served from the free list.
    pub reuse_hits: u64,
    /// Acquires that required a fresh allocation.
    pub fresh_allocations: u64,
    /// Acquires rejected because they would exceed the budget.
    pub rejected: u64,
    /// Peak live bytes.
    pub peak_live_bytes: usize,
    /// Number of buffers returned to the pool.
    pub total_releases: u64,
}

impl PoolStats {
    /// Fraction of successful acquires served from the free list, in `[0.0, 1.0]`.
    pub fn reuse_ratio(&self) -> f64 {
        let served = self.reuse_hits + self.fresh_allocations;
        if served == 0 {
            return 0.0;
        }
        self.reuse_hits as f64 / served as f64
    }

    pub(crate) fn record_reuse(&mut self) {
        self.total_acquires += 1;
        self.reuse_hits += 1;
    }

    pub(crate) fn record_fresh(&mut self) {
        self.total_acquires += 1;
        self.fresh_allocations += 1;
    }

    pub(crate) fn record_rejected(&mut self) {
        self.total_acquires += 1;
        self.rejected += 1;
    }

    pub(crate) fn record_release(&mut self) {
        self.total_releases += 1;
    }

    pub(crate) fn update_peak(&mut self, live_bytes: usize) {
        self.peak_live_bytes = self.peak_live_bytes.max(live_bytes);
    }

    /// Returns a human-readable summary.
    pub fn summary(&self) -> String {
        format!(
            "Staging: {} acquires ({} reused, {} fresh, {:.0}% reuse), {} rejected, peak {:.2} KB",
            self.total_acquires,
            self.reuse_hits,
            self.fresh_allocations,
            self.reuse_ratio() * 100.0,
            self.rejected,
            self.peak_live_bytes as f64 / 1024.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let s = PoolStats::default();
        assert_eq!(s.total_acquires, 0);
        assert_eq!(s.reuse_ratio(), 0.0);
    }

    #[test]
    fn test_reuse_ratio_ignores_rejections() {
        let mut s = PoolStats::default();
        s.record_fresh();
        s.record_reuse();
        s.record_reuse();
        s.record_rejected();
        assert_eq!(s.total_acquires, 4);
        assert!((s.reuse_ratio() - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_peak_never_decreases() {
        let mut s = PoolStats::default();
        s.update_peak(100);
        s.update_peak(50);
        assert_eq!(s.peak_live_bytes, 100);
    }

    #[test]
    fn test_summary() {
        let mut s = PoolStats::default();
        s.record_fresh();
        s.record_reuse();
        let summary = s.summary();
        assert!(summary.contains("2 acquires"));
        assert!(summary.contains("1 reused"));
    }
}
