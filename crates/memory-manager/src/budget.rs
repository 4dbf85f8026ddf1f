// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Memory budget configuration and parsing.

use crate::MemoryError;
use std::fmt;

const KB: usize = 1024;
const MB: usize = 1024 * KB;
const GB: usize = 1024 * MB;

/// A hard memory ceiling for one staged chunk batch.
///
/// # Parsing
/// Supports human-readable strings with binary suffixes:
/// - `"64M"` or `"64MB"` → 64 × 1024² bytes
/// - `"1G"` or `"1GB"` → 1 × 1024³ bytes
/// - `"512K"` or `"512KB"` → 512 × 1024 bytes
/// - `"1048576"` or `"1048576B"` → raw byte count
///
/// # Examples
/// ```
/// use memory_manager::MemoryBudget;
///
/// let b = MemoryBudget::parse("1G").unwrap();
/// assert_eq!(b.as_mb(), 1024);
/// assert_eq!(b.max_items(4 * 1024 * 1024), 256);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MemoryBudget {
    bytes: usize,
}

impl MemoryBudget {
    /// Creates a budget from a byte count.
    pub fn from_bytes(bytes: usize) -> Self {
        Self { bytes }
    }

    /// Creates a budget from megabytes.
    pub fn from_mb(mb: usize) -> Self {
        Self { bytes: mb * MB }
    }

    /// Returns the budget in bytes.
    pub fn as_bytes(&self) -> usize {
        self.bytes
    }

    /// Returns the budget in megabytes (truncated).
    pub fn as_mb(&self) -> usize {
        self.bytes / MB
    }

    /// How many items of `item_bytes` each fit within this budget.
    ///
    /// Returns 0 when a single item is larger than the budget.
    pub fn max_items(&self, item_bytes: usize) -> usize {
        if item_bytes == 0 {
            return usize::MAX;
        }
        self.bytes / item_bytes
    }

    /// Parses a human-readable budget string. Case-insensitive.
    pub fn parse(s: &str) -> Result<Self, MemoryError> {
        let trimmed = s.trim();
        let invalid = |reason: &str| MemoryError::InvalidBudget {
            input: s.to_string(),
            reason: reason.to_string(),
        };

        if trimmed.is_empty() {
            return Err(invalid("empty string"));
        }

        let upper = trimmed.to_uppercase();
        let (num_str, multiplier) = [("GB", GB), ("G", GB), ("MB", MB), ("M", MB), ("KB", KB), ("K", KB), ("B", 1)]
            .iter()
            .find(|(suffix, _)| upper.ends_with(suffix))
            .map(|(suffix, mult)| (&trimmed[..trimmed.len() - suffix.len()], *mult))
            .unwrap_or((trimmed, 1));

        let value: usize = num_str
            .trim()
            .parse()
            .map_err(|_| invalid("expected a number followed by an optional suffix (K, M, G)"))?;

        let bytes = value
            .checked_mul(multiplier)
            .ok_or_else(|| invalid("value overflows"))?;

        if bytes == 0 {
            return Err(invalid("budget must be positive"));
        }

        Ok(Self { bytes })
    }
}

impl fmt::Display for MemoryBudget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.bytes >= GB && self.bytes % GB == 0 {
            write!(f, "{} GB", self.bytes / GB)
        } else if self.bytes >= MB && self.bytes % MB == 0 {
            write!(f, "{} MB", self.bytes / MB)
        } else if self.bytes >= KB && self.bytes % KB == 0 {
            write!(f, "{} KB", self.bytes / KB)
        } else {
            write!(f, "{} B", self.bytes)
        }
    }
}
