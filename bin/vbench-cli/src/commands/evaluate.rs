// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `vbench evaluate` command: benchmark every variant on one dataset.
//!
//! Settings come from `--config` (if given) with CLI flags layered on top.
//! A single run prints an [`EvaluationReport`]; several runs print the
//! mean ± std [`MultiRunReport`].
//!
//! [`EvaluationReport`]: eval_engine::EvaluationReport
//! [`MultiRunReport`]: eval_engine::MultiRunReport

use eval_engine::{BenchmarkEngine, ChunkWeighting, EvalConfig};
use image_source::{BlankSource, DatasetPreset, IdxImages, ImageSource};
use std::path::PathBuf;

#[derive(clap::Args, Debug)]
pub struct EvaluateArgs {
    /// Directory holding `variants.json` and the weight files.
    #[arg(short, long)]
    models: Option<PathBuf>,

    /// Use the in-memory synthetic variants instead of a model directory.
    #[arg(long, conflicts_with = "models")]
    synthetic: bool,

    /// Dataset preset (MNIST_100, MNIST_500, MNIST_NOISY_100, MNIST_BLUR_100, MNIST_NOISY_BLUR_100).
    #[arg(short, long, requires = "mnist", conflicts_with = "blank")]
    dataset: Option<String>,

    /// Path to an IDX3 image file (e.g. `t10k-images-idx3-ubyte`).
    #[arg(long)]
    mnist: Option<PathBuf>,

    /// Evaluate on this many all-zero 28×28 images.
    #[arg(long)]
    blank: Option<usize>,

    /// Maximum images per chunk.
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Number of seeded runs.
    #[arg(short, long)]
    runs: Option<usize>,

    /// Seed of run 0.
    #[arg(short, long)]
    seed: Option<u64>,

    /// Chunk weighting within a run: equal or by-size.
    #[arg(short, long)]
    weighting: Option<ChunkWeighting>,

    /// Cap on one stacked chunk (e.g. "16M").
    #[arg(short = 'b', long)]
    memory_budget: Option<String>,

    /// Evaluate the models of each chunk in parallel.
    #[arg(long)]
    parallel: bool,

    /// Print the report as JSON.
    #[arg(long)]
    json: bool,
}

impl EvaluateArgs {
    /// Layers CLI flags over the file config (or defaults).
    fn to_config(&self, config_path: Option<PathBuf>) -> anyhow::Result<EvalConfig> {
        let mut config = match config_path {
            Some(path) => EvalConfig::from_file(&path)?,
            None => EvalConfig::default(),
        };
        if let Some(dir) = &self.models {
            config.models_dir = dir.clone();
        }
        if let Some(chunk_size) = self.chunk_size {
            config.chunk_size = chunk_size;
        }
        if let Some(runs) = self.runs {
            config.runs = runs;
        }
        if let Some(seed) = self.seed {
            config.base_seed = seed;
        }
        if let Some(weighting) = self.weighting {
            config.weighting = weighting;
        }
        if let Some(budget) = &self.memory_budget {
            config.memory_budget = Some(budget.clone());
        }
        config.parallel_models |= self.parallel;
        config.validate()?;
        Ok(config)
    }

    fn to_source(&self) -> anyhow::Result<Box<dyn ImageSource>> {
        match (&self.dataset, &self.mnist, self.blank) {
            (Some(name), Some(path), _) => {
                let preset: DatasetPreset = name.parse()?;
                let base = IdxImages::open(path)?.into_shared();
                Ok(Box::new(preset.source(base)?))
            }
            (None, _, Some(count)) => Ok(Box::new(BlankSource::mnist(count))),
            (None, Some(path), None) => {
                let base = IdxImages::open(path)?.into_shared();
                Ok(Box::new(DatasetPreset::Mnist100.source(base)?))
            }
            _ => anyhow::bail!("choose a dataset with --dataset/--mnist or --blank"),
        }
    }
}

pub async fn execute(config_path: Option<PathBuf>, args: EvaluateArgs) -> anyhow::Result<()> {
    let config = args.to_config(config_path)?;
    let source = args.to_source()?;
    let synthetic = args.synthetic;
    let json = args.json;

    if !json {
        super::banner("vbench · Variant Evaluation");
        println!("  Dataset:   {}", source.label());
        println!(
            "  Models:    {}",
            if synthetic {
                "<synthetic>".to_string()
            } else {
                config.models_dir.display().to_string()
            }
        );
        println!("  Chunk:     {} ({} weighting)", config.chunk_size, config.weighting);
        println!("  Runs:      {} from seed {}", config.runs, config.base_seed);
        println!();
    }

    // Evaluation is CPU-bound; keep it off the async workers.
    let output = tokio::task::spawn_blocking(move || -> anyhow::Result<String> {
        let idle = BenchmarkEngine::new(config);
        let engine = if synthetic {
            let seed = idle.config().base_seed;
            idle.with_models(model_zoo::synthetic::generate(seed)?)?
        } else {
            idle.load_models()?
        };

        let text = if engine.config().runs == 1 {
            let report = engine.evaluate_source(source.as_ref())?;
            if json {
                report.to_json()?
            } else {
                report.summary()
            }
        } else {
            let report = engine.evaluate_runs(source.as_ref())?;
            if json {
                report.to_json()?
            } else {
                report.summary()
            }
        };

        if !json {
            tracing::info!("{}", engine.memory_stats().summary());
        }
        Ok(text)
    })
    .await??;

    println!("{output}");
    Ok(())
}
