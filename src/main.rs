// SPDX-License-Identifier: GPL-3.0-only

use ar_depth_cloud::DensityPreset;
use ar_depth_cloud::constants::synthetic::FRAME_RATE;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "depth-cloud")]
#[command(about = "Colored point clouds from AR depth samples")]
#[command(version = ar_depth_cloud::constants::app_info::version())]
struct Cli {
    /// Config file (default: ~/.config/ar-depth-cloud/config.json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a capture session on synthetic frames
    Run {
        /// Number of frames to render
        #[arg(short, long, default_value = "90")]
        frames: u64,

        /// Target frame rate
        #[arg(long, default_value_t = FRAME_RATE)]
        fps: u32,

        /// Worker slots (default: config, then available parallelism)
        #[arg(short, long)]
        workers: Option<usize>,

        /// Process jobs on the frame loop instead of the worker pool
        #[arg(long, conflicts_with = "workers")]
        inline: bool,

        /// Pixel stride on both axes
        #[arg(short, long, conflicts_with = "density")]
        stride: Option<u32>,

        /// Sampling density preset
        #[arg(short, long, value_enum)]
        density: Option<Density>,

        /// Seed for grid offsets
        #[arg(long)]
        seed: Option<u64>,

        /// Image to use as the camera frame
        #[arg(long)]
        color: Option<PathBuf>,

        /// Print stats as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the effective configuration
    Config,
}

#[derive(Clone, Copy, ValueEnum)]
enum Density {
    Sparse,
    Balanced,
    Dense,
}

impl From<Density> for DensityPreset {
    fn from(density: Density) -> Self {
        match density {
            Density::Sparse => DensityPreset::Sparse,
            Density::Balanced => DensityPreset::Balanced,
            Density::Dense => DensityPreset::Dense,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=ar_depth_cloud=trace, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Run {
            frames,
            fps,
            workers,
            inline,
            stride,
            density,
            seed,
            color,
            json,
        } => {
            let mut config = config;
            if let Some(preset) = density {
                config = config.with_density(preset.into());
            }
            if let Some(stride) = stride {
                config.stride_x = stride;
                config.stride_y = stride;
            }
            if workers.is_some() {
                config.worker_count = workers;
            }
            if inline {
                config.use_workers = false;
            }
            if seed.is_some() {
                config.seed = seed;
            }
            cli::run(
                config,
                cli::RunOptions {
                    frames,
                    fps,
                    color,
                    json,
                },
            )
        }
        Commands::Config => cli::show_config(&config, cli.config.as_deref()),
    }
}
