// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! JSON manifest describing the variants in a model directory.
//!
//! # Format
//! ```json
//! {
//!   "input_shape": [28, 28],
//!   "num_classes": 10,
//!   "variants": [
//!     { "name": "baseline_mnist", "kind": "baseline", "file": "baseline_mnist.safetensors" },
//!     { "name": "kd_mnist", "kind": "kd", "file": "kd_mnist.safetensors" }
//!   ]
//! }
//! ```

use crate::{ModelError, VariantKind};
use std::collections::HashSet;
use std::path::Path;
use tensor_core::Shape;

/// Manifest filename inside a model directory.
pub const MANIFEST_FILE: &str = "variants.json";

/// Top-level manifest, deserialized from `variants.json`.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct VariantManifest {
    /// Shape of one image, without the batch dimension.
    #[serde(default = "default_input_shape")]
    pub input_shape: Vec<usize>,
    /// Number of output classes.
    #[serde(default = "default_num_classes")]
    pub num_classes: usize,
    /// The variants, in report order.
    pub variants: Vec<VariantEntry>,
}

fn default_input_shape() -> Vec<usize> {
    vec![28, 28]
}

fn default_num_classes() -> usize {
    10
}

/// A single variant entry.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct VariantEntry {
    /// Unique variant name, used as the key in every report.
    pub name: String,
    /// Kind label (`"baseline"`, `"kd"`, `"pruned"`, `"quantized"`, `"lrf"`, `"ws"`).
    pub kind: String,
    /// SafeTensors file, relative to the model directory.
    pub file: String,
}

impl VariantEntry {
    /// Resolves the entry's kind label.
    pub fn parsed_kind(&self) -> Result<VariantKind, ModelError> {
        VariantKind::from_str_loose(&self.kind).ok_or_else(|| ModelError::UnknownKind {
            variant: self.name.clone(),
            kind: self.kind.clone(),
            valid: VariantKind::valid_labels(),
        })
    }
}

impl VariantManifest {
    /// Loads a manifest from a JSON file path.
    pub fn from_file(path: &Path) -> Result<Self, ModelError> {
        let content = std::fs::read_to_string(path).map_err(|e| ModelError::io(path, e))?;
        Self::from_json(&content)
    }

    /// Parses a manifest from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        let manifest: Self = serde_json::from_str(json)?;
        Ok(manifest)
    }

    /// Serializes the manifest as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, ModelError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Image shape as a [`Shape`].
    pub fn image_shape(&self) -> Shape {
        Shape::new(self.input_shape.clone())
    }

    /// Validates that the manifest is internally consistent.
    ///
    /// Checks:
    /// - At least one variant is listed.
    /// - The input shape and class count are non-zero.
    /// - Every kind label is recognised.
    /// - No two variants share a name.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.variants.is_empty() {
            return Err(ModelError::InvalidManifest(
                "manifest lists no variants".into(),
            ));
        }

        if self.input_shape.is_empty() || self.input_shape.contains(&0) {
            return Err(ModelError::InvalidManifest(format!(
                "input_shape {:?} must be non-empty with positive dimensions",
                self.input_shape
            )));
        }

        if self.num_classes == 0 {
            return Err(ModelError::InvalidManifest(
                "num_classes must be positive".into(),
            ));
        }

        let mut seen = HashSet::new();
        for entry in &self.variants {
            if entry.name.trim().is_empty() {
                return Err(ModelError::InvalidManifest(
                    "variant with an empty name".into(),
                ));
            }
            if !seen.insert(entry.name.as_str()) {
                return Err(ModelError::InvalidManifest(format!(
                    "duplicate variant name '{}'",
                    entry.name
                )));
            }
            entry.parsed_kind()?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_json() -> &'static str {
        r#"{
            "input_shape": [28, 28],
            "num_classes": 10,
            "variants": [
                { "name": "baseline_mnist", "kind": "baseline", "file": "baseline_mnist.safetensors" },
                { "name": "kd_mnist", "kind": "kd", "file": "kd_mnist.safetensors" },
                { "name": "ws_mnist", "kind": "ws", "file": "ws_mnist.safetensors" }
            ]
        }"#
    }

    #[test]
    fn test_parse_manifest() {
        let m = VariantManifest::from_json(sample_json()).unwrap();
        assert_eq!(m.variants.len(), 3);
        assert_eq!(m.image_shape(), Shape::matrix(28, 28));
        assert_eq!(m.variants[1].parsed_kind().unwrap(), VariantKind::Distilled);
        m.validate().unwrap();
    }

    #[test]
    fn test_defaults() {
        let m = VariantManifest::from_json(
            r#"{ "variants": [{ "name": "a", "kind": "pruned", "file": "a.safetensors" }] }"#,
        )
        .unwrap();
        assert_eq!(m.input_shape, vec![28, 28]);
        assert_eq!(m.num_classes, 10);
    }

    #[test]
    fn test_validate_empty() {
        let m = VariantManifest::from_json(r#"{ "variants": [] }"#).unwrap();
        assert!(matches!(m.validate(), Err(ModelError::InvalidManifest(_))));
    }

    #[test]
    fn test_validate_duplicate_names() {
        let m = VariantManifest::from_json(
            r#"{ "variants": [
                { "name": "a", "kind": "baseline", "file": "a.safetensors" },
                { "name": "a", "kind": "kd", "file": "b.safetensors" }
            ] }"#,
        )
        .unwrap();
        let err = m.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_validate_unknown_kind() {
        let m = VariantManifest::from_json(
            r#"{ "variants": [{ "name": "a", "kind": "transformer", "file": "a.safetensors" }] }"#,
        )
        .unwrap();
        assert!(matches!(m.validate(), Err(ModelError::UnknownKind { .. })));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            VariantManifest::from_json("{ not json"),
            Err(ModelError::ManifestParse(_))
        ));
    }

    #[test]
    fn test_json_roundtrip() {
        let m = VariantManifest::from_json(sample_json()).unwrap();
        let back = VariantManifest::from_json(&m.to_json().unwrap()).unwrap();
        assert_eq!(back.variants, m.variants);
    }
}
