// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Deterministic synthetic variants.
//!
//! Generates a reference dense classifier from a seed and derives the
//! compressed variants from it the way the real ones are produced: pruning
//! drops the smallest-magnitude weights, quantization rounds to int8 with a
//! per-tensor scale, weight sharing snaps each weight to the nearest of a
//! few evenly spaced levels. The distilled variant is an independently drawn
//! narrower network and the low-rank variant draws its factors directly.
//!
//! The same seed always yields byte-identical SafeTensors files.

use crate::{ModelError, ModelLoader, ModelVariant, VariantEntry, VariantKind, VariantManifest, MANIFEST_FILE};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;
use safetensors::tensor::TensorView as StView;
use safetensors::Dtype;
use std::path::Path;
use std::sync::Arc;
use tensor_core::Shape;

/// Default generation seed.
pub const DEFAULT_SEED: u64 = 42;

/// Architecture parameters for synthetic variants.
#[derive(Debug, Clone)]
pub struct SyntheticSpec {
    pub input_shape: Shape,
    pub num_classes: usize,
    pub hidden: usize,
    pub distilled_hidden: usize,
    pub rank: usize,
    pub codebook_size: usize,
    /// Fraction of weights removed in the pruned variant.
    pub sparsity: f32,
}

impl Default for SyntheticSpec {
    fn default() -> Self {
        Self {
            input_shape: Shape::matrix(28, 28),
            num_classes: 10,
            hidden: 64,
            distilled_hidden: 32,
            rank: 8,
            codebook_size: 16,
            sparsity: 0.5,
        }
    }
}

/// One tensor ready for serialization.
struct RawTensor {
    name: String,
    dtype: Dtype,
    shape: Vec<usize>,
    data: Vec<u8>,
}

impl RawTensor {
    fn f32(name: String, shape: Vec<usize>, values: &[f32]) -> Self {
        Self {
            name,
            dtype: Dtype::F32,
            shape,
            data: values.iter().flat_map(|v| v.to_le_bytes()).collect(),
        }
    }
}

/// Canonical variant name for a kind, e.g. `kd_mnist`.
pub fn variant_name(kind: VariantKind) -> String {
    format!("{}_mnist", kind.label())
}

/// Draws `n` values from `N(0, 1/fan_in)`.
fn gaussian(rng: &mut ChaCha8Rng, n: usize, fan_in: usize) -> Vec<f32> {
    let scale = 1.0 / (fan_in.max(1) as f32).sqrt();
    (0..n)
        .map(|_| rng.sample::<f32, _>(StandardNormal) * scale)
        .collect()
}

fn bias(rng: &mut ChaCha8Rng, n: usize) -> Vec<f32> {
    (0..n).map(|_| rng.gen_range(-0.05f32..0.05)).collect()
}

/// Zeros the `sparsity` fraction of smallest-magnitude weights.
fn prune(weights: &[f32], sparsity: f32) -> Vec<f32> {
    let mut magnitudes: Vec<f32> = weights.iter().map(|w| w.abs()).collect();
    magnitudes.sort_by(f32::total_cmp);
    let cut = ((weights.len() as f32 * sparsity.clamp(0.0, 1.0)) as usize).min(weights.len());
    if cut == 0 {
        return weights.to_vec();
    }
    let threshold = magnitudes[cut - 1];
    weights
        .iter()
        .map(|&w| if w.abs() <= threshold { 0.0 } else { w })
        .collect()
}

/// Symmetric per-tensor int8 quantization.
fn quantize(weights: &[f32]) -> (Vec<u8>, f32) {
    let max_abs = weights.iter().fold(0.0f32, |m, w| m.max(w.abs()));
    let scale = if max_abs > 0.0 { max_abs / 127.0 } else { 1.0 };
    let q = weights
        .iter()
        .map(|w| ((w / scale).round().clamp(-127.0, 127.0) as i8) as u8)
        .collect();
    (q, scale)
}

/// Snaps each weight to the nearest of `levels` evenly spaced values.
fn share(weights: &[f32], levels: usize) -> (Vec<u8>, Vec<f32>) {
    let levels = levels.clamp(1, 256);
    let (lo, hi) = weights
        .iter()
        .fold((f32::MAX, f32::MIN), |(lo, hi), &w| (lo.min(w), hi.max(w)));
    if levels == 1 || !(hi > lo) {
        let center = if lo <= hi { (lo + hi) / 2.0 } else { 0.0 };
        return (vec![0; weights.len()], vec![center]);
    }
    let step = (hi - lo) / (levels - 1) as f32;
    let codebook: Vec<f32> = (0..levels).map(|i| lo + step * i as f32).collect();
    let indices = weights
        .iter()
        .map(|&w| (((w - lo) / step).round() as usize).min(levels - 1) as u8)
        .collect();
    (indices, codebook)
}

fn layer_tensors(
    out: &mut Vec<RawTensor>,
    rng: &mut ChaCha8Rng,
    kind: VariantKind,
    spec: &SyntheticSpec,
    prefix: &str,
    out_features: usize,
    in_features: usize,
) {
    let shape = vec![out_features, in_features];
    let b = bias(rng, out_features);

    match kind {
        VariantKind::LowRank => {
            let rank = spec.rank.clamp(1, out_features.min(in_features));
            let u = gaussian(rng, out_features * rank, rank);
            let v = gaussian(rng, rank * in_features, in_features);
            out.push(RawTensor::f32(format!("{prefix}.u"), vec![out_features, rank], &u));
            out.push(RawTensor::f32(format!("{prefix}.v"), vec![rank, in_features], &v));
        }
        _ => {
            let w = gaussian(rng, out_features * in_features, in_features);
            match kind {
                VariantKind::Pruned => {
                    let pruned = prune(&w, spec.sparsity);
                    out.push(RawTensor::f32(format!("{prefix}.weight"), shape, &pruned));
                }
                VariantKind::Quantized => {
                    let (q, scale) = quantize(&w);
                    out.push(RawTensor {
                        name: format!("{prefix}.weight"),
                        dtype: Dtype::I8,
                        shape,
                        data: q,
                    });
                    out.push(RawTensor::f32(format!("{prefix}.scale"), vec![1], &[scale]));
                }
                VariantKind::WeightShared => {
                    let (indices, codebook) = share(&w, spec.codebook_size);
                    out.push(RawTensor {
                        name: format!("{prefix}.indices"),
                        dtype: Dtype::U8,
                        shape,
                        data: indices,
                    });
                    let len = codebook.len();
                    out.push(RawTensor::f32(format!("{prefix}.codebook"), vec![len], &codebook));
                }
                _ => out.push(RawTensor::f32(format!("{prefix}.weight"), shape, &w)),
            }
        }
    }
    out.push(RawTensor::f32(format!("{prefix}.bias"), vec![out_features], &b));
}

/// Serializes one synthetic variant to SafeTensors bytes.
///
/// Every kind except `kd` and `lrf` is derived from the same reference
/// weights, so they differ only by their compression.
pub fn variant_bytes(kind: VariantKind, spec: &SyntheticSpec, seed: u64) -> Result<Vec<u8>, ModelError> {
    let stream = match kind {
        VariantKind::Distilled => 1,
        VariantKind::LowRank => 2,
        _ => 0,
    };
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(stream);

    let hidden = if kind == VariantKind::Distilled {
        spec.distilled_hidden
    } else {
        spec.hidden
    };
    let pixels = spec.input_shape.num_elements();

    let mut raws = Vec::new();
    layer_tensors(&mut raws, &mut rng, kind, spec, "fc1", hidden, pixels);
    layer_tensors(&mut raws, &mut rng, kind, spec, "fc2", spec.num_classes, hidden);

    let name = variant_name(kind);
    let st_error = |e: safetensors::SafeTensorError| ModelError::SafeTensors {
        variant: name.clone(),
        detail: e.to_string(),
    };
    let views = raws
        .iter()
        .map(|r| Ok((r.name.clone(), StView::new(r.dtype, r.shape.clone(), &r.data)?)))
        .collect::<Result<Vec<_>, safetensors::SafeTensorError>>()
        .map_err(st_error)?;
    safetensors::serialize(views.iter().map(|(n, v)| (n.as_str(), v)), &None).map_err(st_error)
}

/// Generates all six default variants in memory.
pub fn generate(seed: u64) -> Result<Vec<Arc<dyn ModelVariant>>, ModelError> {
    generate_with(&SyntheticSpec::default(), seed)
}

/// Generates all six variants for a custom architecture.
pub fn generate_with(spec: &SyntheticSpec, seed: u64) -> Result<Vec<Arc<dyn ModelVariant>>, ModelError> {
    VariantKind::ALL
        .iter()
        .map(|&kind| {
            let bytes = variant_bytes(kind, spec, seed)?;
            let model = ModelLoader::from_bytes(
                &bytes,
                &variant_name(kind),
                kind,
                &spec.input_shape,
                spec.num_classes,
            )?;
            Ok(Arc::new(model) as Arc<dyn ModelVariant>)
        })
        .collect()
}

/// Writes all six default variants plus `variants.json` into `dir`.
pub fn write_dir(dir: &Path, seed: u64) -> Result<VariantManifest, ModelError> {
    let spec = SyntheticSpec::default();
    std::fs::create_dir_all(dir).map_err(|e| ModelError::io(dir, e))?;

    let mut entries = Vec::with_capacity(VariantKind::ALL.len());
    for kind in VariantKind::ALL {
        let name = variant_name(kind);
        let file = format!("{name}.safetensors");
        let path = dir.join(&file);
        let bytes = variant_bytes(kind, &spec, seed)?;
        std::fs::write(&path, &bytes).map_err(|e| ModelError::io(&path, e))?;
        tracing::debug!("synthetic: wrote {} ({} bytes)", path.display(), bytes.len());
        entries.push(VariantEntry {
            name,
            kind: kind.label().to_string(),
            file,
        });
    }

    let manifest = VariantManifest {
        input_shape: spec.input_shape.dims().to_vec(),
        num_classes: spec.num_classes,
        variants: entries,
    };
    let manifest_path = dir.join(MANIFEST_FILE);
    std::fs::write(&manifest_path, manifest.to_json()?).map_err(|e| ModelError::io(&manifest_path, e))?;

    tracing::info!(
        "synthetic: wrote {} variants to '{}' (seed {seed})",
        manifest.variants.len(),
        dir.display()
    );
    Ok(manifest)
}
