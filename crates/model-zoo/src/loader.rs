// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Variant loading from a manifest + SafeTensors files.
//!
//! Each variant file holds two layers, `fc1` (input → hidden) and `fc2`
//! (hidden → classes). The tensors expected under each layer prefix depend
//! on the variant kind:
//!
//! | Kind                  | Tensors                                   |
//! |-----------------------|-------------------------------------------|
//! | baseline, kd, pruned  | `weight` F32, `bias` F32                  |
//! | quantized             | `weight` I8, `scale` F32 `[1]`, `bias`    |
//! | lrf                   | `u` F32, `v` F32, `bias`                  |
//! | ws                    | `indices` U8, `codebook` F32, `bias`      |
//!
//! Files are memory-mapped; tensor data is copied out once into the
//! variant's own storage and the map is released after loading.

use crate::{
    Classifier, LinearLayer, ModelError, ModelVariant, VariantKind, VariantManifest,
    MANIFEST_FILE,
};
use safetensors::{Dtype, SafeTensors};
use std::path::Path;
use std::sync::Arc;
use tensor_core::{Shape, Tensor};

/// Layer prefixes in execution order.
const LAYERS: [&str; 2] = ["fc1", "fc2"];

/// Loads classifier variants from disk.
///
/// # Example
/// ```no_run
/// use model_zoo::ModelLoader;
/// use std::path::Path;
///
/// let variants = ModelLoader::load_dir(Path::new("./models")).unwrap();
/// println!("Loaded {} variants", variants.len());
/// ```
pub struct ModelLoader;

impl ModelLoader {
    /// Loads every variant listed in `<dir>/variants.json`.
    ///
    /// Any failure (unreadable manifest, missing file, corrupt or
    /// inconsistent weights) aborts the whole load.
    pub fn load_dir(dir: &Path) -> Result<Vec<Arc<dyn ModelVariant>>, ModelError> {
        let manifest = Self::load_manifest(dir)?;
        let image_shape = manifest.image_shape();

        let mut variants: Vec<Arc<dyn ModelVariant>> = Vec::with_capacity(manifest.variants.len());
        for entry in &manifest.variants {
            let kind = entry.parsed_kind()?;
            let model = Self::load_file(
                &dir.join(&entry.file),
                &entry.name,
                kind,
                &image_shape,
                manifest.num_classes,
            )?;
            variants.push(Arc::new(model));
        }

        tracing::info!(
            "model loader: {} variants from '{}'",
            variants.len(),
            dir.display()
        );
        Ok(variants)
    }

    /// Parses and validates the manifest in `dir`.
    pub fn load_manifest(dir: &Path) -> Result<VariantManifest, ModelError> {
        let manifest = VariantManifest::from_file(&dir.join(MANIFEST_FILE))?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Loads one variant from a SafeTensors file via mmap.
    pub fn load_file(
        path: &Path,
        name: &str,
        kind: VariantKind,
        input_shape: &Shape,
        num_classes: usize,
    ) -> Result<Classifier, ModelError> {
        let file = std::fs::File::open(path).map_err(|e| ModelError::io(path, e))?;

        // SAFETY: the file is opened read-only and the map does not outlive
        // this call; all tensor data is copied before returning.
        let mmap = unsafe { memmap2::Mmap::map(&file) }.map_err(|e| ModelError::io(path, e))?;
        tracing::debug!(
            "model loader: mmap'd {} ({:.2} KB)",
            path.display(),
            mmap.len() as f64 / 1024.0,
        );

        Self::from_bytes(&mmap, name, kind, input_shape, num_classes)
    }

    /// Builds a variant from an in-memory SafeTensors buffer.
    pub fn from_bytes(
        bytes: &[u8],
        name: &str,
        kind: VariantKind,
        input_shape: &Shape,
        num_classes: usize,
    ) -> Result<Classifier, ModelError> {
        let tensors = SafeTensors::deserialize(bytes).map_err(|e| ModelError::SafeTensors {
            variant: name.to_string(),
            detail: e.to_string(),
        })?;
        let reader = WeightReader {
            variant: name,
            tensors,
        };

        let [hidden, output] = LAYERS.map(|prefix| reader.layer(prefix, kind));
        let classifier = Classifier::new(name, kind, input_shape.clone(), hidden?, output?)?;

        if classifier.num_classes() != num_classes {
            return Err(ModelError::InvalidWeights {
                variant: name.to_string(),
                detail: format!(
                    "fc2 produces {} classes, manifest declares {num_classes}",
                    classifier.num_classes()
                ),
            });
        }

        tracing::info!(
            variant = name,
            kind = %kind,
            parameters = classifier.parameter_count(),
            "loaded variant"
        );
        Ok(classifier)
    }
}

/// Typed access to the tensors of one variant file.
struct WeightReader<'a> {
    variant: &'a str,
    tensors: SafeTensors<'a>,
}

impl<'a> WeightReader<'a> {
    fn layer(&self, prefix: &str, kind: VariantKind) -> Result<LinearLayer, ModelError> {
        let bias = self.f32(&format!("{prefix}.bias"))?.into_vec();

        let layer = match kind {
            VariantKind::Baseline | VariantKind::Distilled => {
                LinearLayer::dense(self.f32(&format!("{prefix}.weight"))?, bias)
            }
            VariantKind::Pruned => LinearLayer::sparse(&self.f32(&format!("{prefix}.weight"))?, bias),
            VariantKind::Quantized => {
                let (shape, bytes) = self.raw(&format!("{prefix}.weight"), Dtype::I8)?;
                let weight = bytes.iter().map(|&b| b as i8).collect();
                let scale = self.scalar(&format!("{prefix}.scale"))?;
                LinearLayer::quantized(weight, scale, &shape, bias)
            }
            VariantKind::LowRank => LinearLayer::low_rank(
                self.f32(&format!("{prefix}.u"))?,
                self.f32(&format!("{prefix}.v"))?,
                bias,
            ),
            VariantKind::WeightShared => {
                let (shape, indices) = self.raw(&format!("{prefix}.indices"), Dtype::U8)?;
                let codebook = self.f32(&format!("{prefix}.codebook"))?.into_vec();
                LinearLayer::shared(indices.to_vec(), codebook, &shape, bias)
            }
        };

        let layer = layer.map_err(|e| self.invalid(format!("{prefix}: {e}")))?;
        tracing::debug!(
            variant = self.variant,
            layer = prefix,
            storage = layer.storage(),
            "{} → {}",
            layer.in_features(),
            layer.out_features()
        );
        Ok(layer)
    }

    fn raw(&self, key: &str, dtype: Dtype) -> Result<(Shape, &'a [u8]), ModelError> {
        let view = self
            .tensors
            .tensor(key)
            .map_err(|_| ModelError::WeightNotFound {
                variant: self.variant.to_string(),
                tensor: key.to_string(),
            })?;
        if view.dtype() != dtype {
            return Err(self.invalid(format!(
                "tensor '{key}' has dtype {:?}, expected {dtype:?}",
                view.dtype()
            )));
        }
        Ok((Shape::new(view.shape().to_vec()), view.data()))
    }

    fn f32(&self, key: &str) -> Result<Tensor, ModelError> {
        let (shape, bytes) = self.raw(key, Dtype::F32)?;
        let values = bytes
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect::<Vec<f32>>();
        if let Some(pos) = values.iter().position(|v| !v.is_finite()) {
            return Err(self.invalid(format!(
                "tensor '{key}' holds non-finite value {} at element {pos}",
                values[pos]
            )));
        }
        Tensor::from_vec(shape, values).map_err(|e| self.invalid(format!("tensor '{key}': {e}")))
    }

    fn scalar(&self, key: &str) -> Result<f32, ModelError> {
        let t = self.f32(key)?;
        match t.as_slice() {
            [v] => Ok(*v),
            other => Err(self.invalid(format!(
                "'{key}' must hold one value, found {} values",
                other.len()
            ))),
        }
    }

    fn invalid(&self, detail: String) -> ModelError {
        ModelError::InvalidWeights {
            variant: self.variant.to_string(),
            detail,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthetic;

    fn write_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        synthetic::write_dir(dir.path(), 7).unwrap();
        dir
    }

    #[test]
    fn test_load_all_kinds_from_disk() {
        let dir = write_dir();
        let variants = ModelLoader::load_dir(dir.path()).unwrap();
        assert_eq!(variants.len(), 6);
        let kinds: Vec<VariantKind> = variants.iter().map(|v| v.kind()).collect();
        assert_eq!(kinds, VariantKind::ALL.to_vec());
        for v in &variants {
            assert_eq!(v.num_classes(), 10);
            assert_eq!(v.input_shape(), &Shape::matrix(28, 28));
        }
    }

    #[test]
    fn test_disk_matches_in_memory() {
        let dir = write_dir();
        let from_disk = ModelLoader::load_dir(dir.path()).unwrap();
        let in_memory = synthetic::generate(7).unwrap();
        let batch = Tensor::full(Shape::new(vec![2, 28, 28]), 0.5);
        for (a, b) in from_disk.iter().zip(&in_memory) {
            assert_eq!(a.name(), b.name());
            assert_eq!(
                a.infer(&batch.view()).unwrap(),
                b.infer(&batch.view()).unwrap()
            );
        }
    }

    #[test]
    fn test_missing_manifest() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            ModelLoader::load_dir(dir.path()),
            Err(ModelError::Io { .. })
        ));
    }

    #[test]
    fn test_missing_weight_file() {
        let dir = write_dir();
        std::fs::remove_file(dir.path().join("kd_mnist.safetensors")).unwrap();
        let err = ModelLoader::load_dir(dir.path()).err().unwrap();
        assert!(err.to_string().contains("kd_mnist.safetensors"));
    }

    #[test]
    fn test_corrupt_weight_file() {
        let dir = write_dir();
        std::fs::write(dir.path().join("pruned_mnist.safetensors"), b"not a safetensors file").unwrap();
        assert!(matches!(
            ModelLoader::load_dir(dir.path()),
            Err(ModelError::SafeTensors { .. })
        ));
    }

    #[test]
    fn test_kind_mismatch_reports_missing_tensor() {
        let bytes = synthetic::variant_bytes(VariantKind::Baseline, &synthetic::SyntheticSpec::default(), 1).unwrap();
        let result = ModelLoader::from_bytes(&bytes, "x", VariantKind::LowRank, &Shape::matrix(28, 28), 10);
        assert!(matches!(result, Err(ModelError::WeightNotFound { .. })));
    }

    #[test]
    fn test_class_count_mismatch() {
        let bytes = synthetic::variant_bytes(VariantKind::Baseline, &synthetic::SyntheticSpec::default(), 1).unwrap();
        let result = ModelLoader::from_bytes(&bytes, "x", VariantKind::Baseline, &Shape::matrix(28, 28), 12);
        assert!(matches!(result, Err(ModelError::InvalidWeights { .. })));
    }

    /// Overwrites element 0 of `key` in a serialized variant file.
    fn poison(bytes: &mut [u8], key: &str, value: f32) {
        let offset = {
            let tensors = SafeTensors::deserialize(bytes).unwrap();
            let data = tensors.tensor(key).unwrap().data();
            data.as_ptr() as usize - bytes.as_ptr() as usize
        };
        bytes[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
    }

    #[test]
    fn test_non_finite_weights_rejected_at_load() {
        let cases = [
            (VariantKind::Baseline, "fc1.bias", f32::NAN),
            (VariantKind::Baseline, "fc2.weight", f32::INFINITY),
            (VariantKind::LowRank, "fc1.u", f32::NEG_INFINITY),
            (VariantKind::WeightShared, "fc2.codebook", f32::NAN),
            (VariantKind::Quantized, "fc1.scale", f32::INFINITY),
        ];
        for (kind, key, value) in cases {
            let mut bytes = synthetic::variant_bytes(kind, &synthetic::SyntheticSpec::default(), 3).unwrap();
            poison(&mut bytes, key, value);
            let result = ModelLoader::from_bytes(&bytes, "x", kind, &Shape::matrix(28, 28), 10);
            match result {
                Err(ModelError::InvalidWeights { detail, .. }) => assert!(detail.contains(key), "{detail}"),
                other => panic!("{kind} with non-finite {key}: {:?}", other.map(|c| c.name().to_string())),
            }
        }
    }

    #[test]
    fn test_input_shape_mismatch() {
        let bytes = synthetic::variant_bytes(VariantKind::Quantized, &synthetic::SyntheticSpec::default(), 1).unwrap();
        let result = ModelLoader::from_bytes(&bytes, "x", VariantKind::Quantized, &Shape::matrix(32, 32), 10);
        assert!(matches!(result, Err(ModelError::InvalidWeights { .. })));
    }
}
