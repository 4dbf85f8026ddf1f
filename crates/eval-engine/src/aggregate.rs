// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Combining chunk metrics into one run's metrics.

use crate::metrics::{ChunkMetrics, MetricValues, RunMetrics};
use std::fmt;
use std::str::FromStr;

/// How chunks are weighted when averaging within a run.
///
/// `Equal` treats every chunk as one sample, so a short tail chunk counts as
/// much as a full one. `BySize` weights each chunk by its image count, which
/// matches a per-image mean for the accuracy-like metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChunkWeighting {
    #[default]
    Equal,
    BySize,
}

impl ChunkWeighting {
    fn weight(self, chunk_len: usize) -> f64 {
        match self {
            Self::Equal => 1.0,
            Self::BySize => chunk_len as f64,
        }
    }
}

impl fmt::Display for ChunkWeighting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equal => f.write_str("equal"),
            Self::BySize => f.write_str("by-size"),
        }
    }
}

impl FromStr for ChunkWeighting {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "equal" => Ok(Self::Equal),
            "by-size" => Ok(Self::BySize),
            other => Err(format!("unknown weighting '{other}' (expected equal or by-size)")),
        }
    }
}

/// Running weighted mean of chunk metrics for one model.
///
/// Chunks are pushed in index order; the sums are accumulated in that
/// order, so identical inputs give bit-identical results.
#[derive(Debug, Clone)]
pub struct ChunkAggregator {
    weighting: ChunkWeighting,
    weighted_sums: MetricValues,
    total_weight: f64,
    chunks: usize,
    images: usize,
}

impl ChunkAggregator {
    pub fn new(weighting: ChunkWeighting) -> Self {
        Self {
            weighting,
            weighted_sums: [0.0; 4],
            total_weight: 0.0,
            chunks: 0,
            images: 0,
        }
    }

    /// Adds one chunk's metrics; `chunk_len` is its image count.
    pub fn push(&mut self, metrics: &ChunkMetrics, chunk_len: usize) {
        let w = self.weighting.weight(chunk_len);
        for (sum, value) in self.weighted_sums.iter_mut().zip(metrics.values()) {
            *sum += w * value;
        }
        self.total_weight += w;
        self.chunks += 1;
        self.images += chunk_len;
    }

    /// Number of chunks pushed so far.
    pub fn chunks(&self) -> usize {
        self.chunks
    }

    /// Returns `None` if no chunk was pushed.
    pub fn finish(self) -> Option<RunMetrics> {
        if self.chunks == 0 || self.total_weight <= 0.0 {
            return None;
        }
        let values = self.weighted_sums.map(|sum| sum / self.total_weight);
        Some(RunMetrics::new(values, self.chunks, self.images))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn chunk(confidence: f64) -> ChunkMetrics {
        ChunkMetrics::new(0.1, confidence, 0.2, 0.3)
    }

    #[test]
    fn test_equal_weighting_is_plain_mean() {
        let mut agg = ChunkAggregator::new(ChunkWeighting::Equal);
        agg.push(&chunk(90.0), 32);
        agg.push(&chunk(60.0), 4);
        let run = agg.finish().unwrap();
        assert_relative_eq!(run.confidence_percent(), 75.0);
        assert_eq!(run.chunks(), 2);
        assert_eq!(run.images(), 36);
    }

    #[test]
    fn test_by_size_weighting() {
        let mut agg = ChunkAggregator::new(ChunkWeighting::BySize);
        agg.push(&chunk(90.0), 30);
        agg.push(&chunk(60.0), 10);
        let run = agg.finish().unwrap();
        assert_relative_eq!(run.confidence_percent(), 82.5);
        assert_relative_eq!(run.latency_ms(), 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_empty_aggregator_has_no_data() {
        assert!(ChunkAggregator::new(ChunkWeighting::Equal).finish().is_none());
    }

    #[test]
    fn test_weighting_parse_and_display() {
        assert_eq!("by-size".parse::<ChunkWeighting>().unwrap(), ChunkWeighting::BySize);
        assert_eq!(ChunkWeighting::Equal.to_string(), "equal");
        assert!("mean".parse::<ChunkWeighting>().is_err());
    }
}
