// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `vbench synth` command: write the synthetic variant set to disk.

use std::path::PathBuf;

pub async fn execute(out: PathBuf, seed: u64) -> anyhow::Result<()> {
    super::banner("vbench · Synthetic Variants");

    std::fs::create_dir_all(&out)
        .map_err(|e| anyhow::anyhow!("cannot create '{}': {e}", out.display()))?;
    let manifest = model_zoo::synthetic::write_dir(&out, seed)?;

    println!("  Seed:   {seed}");
    println!("  Output: {}", out.display());
    println!();
    println!("  {:<20} {:<10} {}", "Name", "Kind", "File");
    println!("  {}", "-".repeat(60));
    for entry in &manifest.variants {
        println!("  {:<20} {:<10} {}", entry.name, entry.kind, entry.file);
    }
    println!();
    Ok(())
}
