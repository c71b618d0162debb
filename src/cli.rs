// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for capture sessions
//!
//! This module provides command-line functionality for:
//! - Running a capture session on synthetic frames
//! - Showing the effective configuration

use ar_depth_cloud::synthetic::load_color_image;
use ar_depth_cloud::{CaptureSession, CaptureStats, Config, PointCloudScene, SyntheticSource};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Options for `run` that aren't part of the persisted config
pub struct RunOptions {
    pub frames: u64,
    pub fps: u32,
    pub color: Option<PathBuf>,
    pub json: bool,
}

/// Load the config from an explicit path, or the default location
pub fn load_config(path: Option<&Path>) -> Result<Config, Box<dyn std::error::Error>> {
    match path {
        Some(path) => Ok(Config::load(path)?),
        None => Ok(Config::load_or_default()),
    }
}

/// Drive a capture session with synthetic frames at a fixed rate
pub fn run(config: Config, options: RunOptions) -> Result<(), Box<dyn std::error::Error>> {
    let mut source = SyntheticSource::default();
    if let Some(path) = options.color.as_deref() {
        source = source.with_color_image(load_color_image(path)?);
    }

    let scene = PointCloudScene::new(config.point_size);
    let mut session = CaptureSession::new(&config, scene)?;
    session.set_capture(true);

    if !options.json {
        match session.worker_count() {
            Some(count) => println!("Workers: {}", count),
            None => println!("Workers: inline"),
        }
        println!("Stride: {}x{}", config.stride_x, config.stride_y);
        println!("Frames: {} @ {}fps", options.frames, options.fps);
    }

    let period = Duration::from_secs_f64(1.0 / f64::from(options.fps.max(1)));
    let start = Instant::now();

    // Frame loop on a current-thread runtime; the pool does the heavy lifting
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;
    rt.block_on(async {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        for _ in 0..options.frames {
            interval.tick().await;
            let (depth, color, pose) = source.next_frame();
            session.process(depth, color, pose)?;
        }
        Ok::<(), ar_depth_cloud::errors::PipelineError>(())
    })?;

    session.flush();
    let stats = session.stats();
    let elapsed = start.elapsed();
    let scene = session.into_sink();

    if options.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        print_summary(&stats, scene.point_count(), elapsed);
    }

    Ok(())
}

fn print_summary(stats: &CaptureStats, scene_points: usize, elapsed: Duration) {
    println!();
    println!("Frames submitted: {}", stats.submitted);
    println!("  accepted: {}", stats.accepted);
    println!("  dropped:  {}", stats.dropped);
    if stats.failed > 0 {
        println!("  failed:   {}", stats.failed);
    }
    println!("Batches delivered: {}", stats.delivered);
    println!("Points: {}", scene_points);
    println!("Elapsed: {:.2}s", elapsed.as_secs_f64());
}

/// Print the effective configuration and where it comes from
pub fn show_config(config: &Config, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let path = path.map(Path::to_path_buf).or_else(Config::default_path);
    match path {
        Some(path) if path.exists() => println!("# {}", path.display()),
        Some(path) => println!("# {} (not found, using defaults)", path.display()),
        None => println!("# no config directory, using defaults"),
    }
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}
