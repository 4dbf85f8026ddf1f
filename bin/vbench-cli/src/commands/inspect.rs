// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `vbench inspect` command: load a model directory and list its variants.

use std::path::PathBuf;

pub async fn execute(models: PathBuf) -> anyhow::Result<()> {
    super::banner("vbench · Variant Inspector");

    let manifest = model_zoo::ModelLoader::load_manifest(&models)
        .map_err(|e| anyhow::anyhow!("failed to read '{}': {e}", models.display()))?;
    let variants = model_zoo::ModelLoader::load_dir(&models)?;

    println!("  Directory: {}", models.display());
    println!("  Input:     {}", manifest.image_shape());
    println!("  Classes:   {}", manifest.num_classes);
    println!();

    println!("  {:<20} {:<10} {:<6} {:>12}", "Name", "Kind", "Device", "Parameters");
    println!("  {}", "-".repeat(52));
    let baseline = variants
        .iter()
        .find(|v| v.kind() == model_zoo::VariantKind::Baseline)
        .map(|v| v.parameter_count());
    for v in &variants {
        let ratio = match baseline {
            Some(b) if b > 0 => format!("  ({:.0}% of baseline)", v.parameter_count() as f64 / b as f64 * 100.0),
            _ => String::new(),
        };
        println!(
            "  {:<20} {:<10} {:<6} {:>12}{ratio}",
            v.name(),
            v.kind().to_string(),
            v.device().to_string(),
            v.parameter_count(),
        );
    }
    println!();
    Ok(())
}
