// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # vbench
//!
//! Command-line interface for the variant benchmark engine.
//!
//! ## Usage
//! ```bash
//! # Write the six synthetic variants to disk
//! vbench synth --out ./models
//!
//! # Evaluate them on 100 noisy MNIST test images, 5 seeded runs
//! vbench evaluate --models ./models --mnist ./t10k-images-idx3-ubyte \
//!     --dataset MNIST_NOISY_100 --runs 5
//!
//! # Quick check with blank images and JSON output
//! vbench evaluate --models ./models --blank 100 --json
//!
//! # List the variants in a model directory
//! vbench inspect --models ./models
//! ```

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "vbench",
    about = "Benchmark compressed classifier variants on MNIST-style images",
    version,
    author
)]
struct Cli {
    /// Path to a TOML evaluation config (CLI flags override its values).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging (repeat for more: -v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate every variant on a dataset.
    Evaluate(commands::evaluate::EvaluateArgs),

    /// Generate the six synthetic variants and their manifest.
    Synth {
        /// Output directory.
        #[arg(short, long)]
        out: PathBuf,

        /// Weight generation seed.
        #[arg(long, default_value_t = model_zoo::synthetic::DEFAULT_SEED)]
        seed: u64,
    },

    /// List the variants in a model directory.
    Inspect {
        /// Directory holding `variants.json`.
        #[arg(short, long, default_value = "./models")]
        models: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    commands::init_tracing(cli.verbose);

    match cli.command {
        Commands::Evaluate(args) => commands::evaluate::execute(cli.config, args).await,
        Commands::Synth { out, seed } => commands::synth::execute(out, seed).await,
        Commands::Inspect { models } => commands::inspect::execute(models).await,
    }
}
