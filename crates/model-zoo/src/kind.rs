// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Variant kinds and device affinity.

use std::fmt;

/// The compression technique a variant was produced with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariantKind {
    /// Uncompressed reference model.
    Baseline,
    /// Knowledge-distilled student with a narrower hidden layer.
    Distilled,
    /// Magnitude-pruned weights, stored sparse.
    Pruned,
    /// Int8 weights with a per-tensor scale.
    Quantized,
    /// Low-rank factorized layers (`W ≈ U·V`).
    LowRank,
    /// Weight sharing through a small codebook.
    WeightShared,
}

impl VariantKind {
    /// All kinds, in canonical report order.
    pub const ALL: [VariantKind; 6] = [
        Self::Baseline,
        Self::Distilled,
        Self::Pruned,
        Self::Quantized,
        Self::LowRank,
        Self::WeightShared,
    ];

    /// Parses a kind from a manifest string.
    ///
    /// Accepts the short labels used in weight file names (`"kd"`, `"lrf"`,
    /// `"ws"`) as well as the long forms (`"distilled"`, `"low_rank"`).
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "baseline" | "base" => Some(Self::Baseline),
            "kd" | "distilled" | "distillation" => Some(Self::Distilled),
            "pruned" | "pruning" => Some(Self::Pruned),
            "quantized" | "quant" | "int8" => Some(Self::Quantized),
            "lrf" | "low_rank" | "lowrank" => Some(Self::LowRank),
            "ws" | "weight_shared" | "weight_sharing" => Some(Self::WeightShared),
            _ => None,
        }
    }

    /// Short label, matching the weight file prefix (`kd_mnist`, `lrf_mnist`, ...).
    pub fn label(self) -> &'static str {
        match self {
            Self::Baseline => "baseline",
            Self::Distilled => "kd",
            Self::Pruned => "pruned",
            Self::Quantized => "quantized",
            Self::LowRank => "lrf",
            Self::WeightShared => "ws",
        }
    }

    /// Comma-separated list of canonical labels, for error messages.
    pub fn valid_labels() -> String {
        Self::ALL
            .iter()
            .map(|k| k.label())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for VariantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Where a variant runs. There is a single CPU device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    #[default]
    Cpu,
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cpu => f.write_str("cpu"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str_loose() {
        assert_eq!(VariantKind::from_str_loose("kd"), Some(VariantKind::Distilled));
        assert_eq!(VariantKind::from_str_loose("LRF"), Some(VariantKind::LowRank));
        assert_eq!(VariantKind::from_str_loose("weight_shared"), Some(VariantKind::WeightShared));
        assert_eq!(VariantKind::from_str_loose("transformer"), None);
    }

    #[test]
    fn test_labels_roundtrip() {
        for kind in VariantKind::ALL {
            assert_eq!(VariantKind::from_str_loose(kind.label()), Some(kind));
        }
    }

    #[test]
    fn test_valid_labels() {
        assert_eq!(VariantKind::valid_labels(), "baseline, kd, pruned, quantized, lrf, ws");
    }

    #[test]
    fn test_device_display() {
        assert_eq!(Device::default().to_string(), "cpu");
    }
}
