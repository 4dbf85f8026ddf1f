// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Metric records at chunk, run and multi-run granularity.
//!
//! Values are held at full precision. Rounding happens only when a record
//! is serialized or displayed: latency to 3 decimals, confidence to 2,
//! entropy and stability to 4.

use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;
use std::fmt;

/// Rounds half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// The four reported metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    /// Wall-clock milliseconds per image.
    Latency,
    /// Mean top-1 probability, in percent.
    Confidence,
    /// Mean predictive entropy, in nats.
    Entropy,
    /// Standard deviation of the raw scores.
    Stability,
}

impl Metric {
    pub const ALL: [Metric; 4] = [
        Metric::Latency,
        Metric::Confidence,
        Metric::Entropy,
        Metric::Stability,
    ];

    /// Report key.
    pub fn name(self) -> &'static str {
        match self {
            Self::Latency => "latency_ms",
            Self::Confidence => "confidence_percent",
            Self::Entropy => "entropy",
            Self::Stability => "stability",
        }
    }

    /// Presentation precision.
    pub fn decimals(self) -> u32 {
        match self {
            Self::Latency => 3,
            Self::Confidence => 2,
            Self::Entropy | Self::Stability => 4,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Metric values indexed by [`Metric`].
pub(crate) type MetricValues = [f64; 4];

fn serialize_values<S: Serializer>(
    name: &'static str,
    values: &MetricValues,
    extra: &[(&'static str, usize)],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let mut s = serializer.serialize_struct(name, Metric::ALL.len() + extra.len())?;
    for metric in Metric::ALL {
        s.serialize_field(metric.name(), &round_to(values[metric.index()], metric.decimals()))?;
    }
    for (key, value) in extra {
        s.serialize_field(*key, value)?;
    }
    s.end()
}

/// Metrics of one model on one chunk.
///
/// Only the evaluator builds these, so every instance comes from finite,
/// correctly shaped scores.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChunkMetrics {
    values: MetricValues,
}

impl ChunkMetrics {
    pub(crate) fn new(latency_ms: f64, confidence_percent: f64, entropy: f64, stability: f64) -> Self {
        Self {
            values: [latency_ms, confidence_percent, entropy, stability],
        }
    }

    pub fn get(&self, metric: Metric) -> f64 {
        self.values[metric.index()]
    }

    pub fn latency_ms(&self) -> f64 {
        self.get(Metric::Latency)
    }

    pub fn confidence_percent(&self) -> f64 {
        self.get(Metric::Confidence)
    }

    pub fn entropy(&self) -> f64 {
        self.get(Metric::Entropy)
    }

    pub fn stability(&self) -> f64 {
        self.get(Metric::Stability)
    }

    pub(crate) fn values(&self) -> &MetricValues {
        &self.values
    }
}

impl Serialize for ChunkMetrics {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_values("ChunkMetrics", &self.values, &[], serializer)
    }
}

/// One model's metrics for one run, averaged over its chunks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunMetrics {
    values: MetricValues,
    chunks: usize,
    images: usize,
}

impl RunMetrics {
    pub(crate) fn new(values: MetricValues, chunks: usize, images: usize) -> Self {
        Self {
            values,
            chunks,
            images,
        }
    }

    pub fn get(&self, metric: Metric) -> f64 {
        self.values[metric.index()]
    }

    pub fn latency_ms(&self) -> f64 {
        self.get(Metric::Latency)
    }

    pub fn confidence_percent(&self) -> f64 {
        self.get(Metric::Confidence)
    }

    pub fn entropy(&self) -> f64 {
        self.get(Metric::Entropy)
    }

    pub fn stability(&self) -> f64 {
        self.get(Metric::Stability)
    }

    /// Chunks that contributed.
    pub fn chunks(&self) -> usize {
        self.chunks
    }

    /// Images that contributed.
    pub fn images(&self) -> usize {
        self.images
    }
}

impl Serialize for RunMetrics {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_values(
            "RunMetrics",
            &self.values,
            &[("chunks", self.chunks), ("images", self.images)],
            serializer,
        )
    }
}

impl fmt::Display for RunMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.3} ms/img, {:.2}% conf, entropy {:.4}, stability {:.4}",
            self.latency_ms(),
            self.confidence_percent(),
            self.entropy(),
            self.stability()
        )
    }
}

/// Mean and population standard deviation of one metric across runs.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MetricStat {
    pub mean: f64,
    pub std: f64,
}

impl MetricStat {
    /// Returns `None` for an empty sample.
    pub fn from_samples(samples: &[f64]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        let n = samples.len() as f64;
        let mean = samples.iter().sum::<f64>() / n;
        let variance = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
        Some(Self {
            mean,
            std: variance.sqrt(),
        })
    }
}

/// Per-metric mean/std over the runs of a multi-run evaluation.
///
/// Serializes as `<metric>_mean` / `<metric>_std` pairs.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiRunStatistics {
    stats: [MetricStat; 4],
    runs: usize,
}

impl MultiRunStatistics {
    /// Summarizes completed runs. Returns `None` if `runs` is empty.
    pub fn from_runs(runs: &[RunMetrics]) -> Option<Self> {
        if runs.is_empty() {
            return None;
        }
        let mut stats = [MetricStat::default(); 4];
        for metric in Metric::ALL {
            let samples: Vec<f64> = runs.iter().map(|r| r.get(metric)).collect();
            stats[metric.index()] = MetricStat::from_samples(&samples)?;
        }
        Some(Self {
            stats,
            runs: runs.len(),
        })
    }

    pub fn get(&self, metric: Metric) -> MetricStat {
        self.stats[metric.index()]
    }

    /// Number of runs summarized.
    pub fn runs(&self) -> usize {
        self.runs
    }
}

impl Serialize for MultiRunStatistics {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        const KEYS: [(&str, &str); 4] = [
            ("latency_ms_mean", "latency_ms_std"),
            ("confidence_percent_mean", "confidence_percent_std"),
            ("entropy_mean", "entropy_std"),
            ("stability_mean", "stability_std"),
        ];
        let mut s = serializer.serialize_struct("MultiRunStatistics", 9)?;
        for metric in Metric::ALL {
            let (mean_key, std_key) = KEYS[metric.index()];
            let stat = self.get(metric);
            s.serialize_field(mean_key, &round_to(stat.mean, metric.decimals()))?;
            s.serialize_field(std_key, &round_to(stat.std, metric.decimals()))?;
        }
        s.serialize_field("runs", &self.runs)?;
        s.end()
    }
}
