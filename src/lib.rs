// SPDX-License-Identifier: GPL-3.0-only

//! AR Depth Cloud - colored point clouds from AR depth samples
//!
//! This library turns per-frame depth and camera readbacks from an AR
//! session into colored world-space points, spreading the work across a
//! fixed pool of worker threads and dropping frames when every worker is
//! busy.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`math`]: Column-major 4x4 matrices and vectors
//! - [`frames`]: Depth, color and pose inputs for one frame
//! - [`pipelines`]: Depth decoding, unprojection, color sampling and grid scheduling
//! - [`workers`]: Fixed-size worker pool with drop-on-saturation
//! - [`capture`]: Per-frame entry point tying the pieces together
//! - [`scene`]: Point cloud sink and an in-memory scene
//! - [`synthetic`]: Synthetic frame source for running without a device
//! - [`config`]: User configuration handling
//!
//! # Example
//!
//! ```no_run
//! use ar_depth_cloud::{CaptureSession, Config, PointCloudScene, SyntheticSource};
//!
//! let mut session = CaptureSession::new(&Config::default(), PointCloudScene::default())?;
//! let mut source = SyntheticSource::default();
//! for _ in 0..30 {
//!     let (depth, color, pose) = source.next_frame();
//!     session.process(depth, color, pose)?;
//! }
//! let scene = session.into_sink();
//! println!("{} points", scene.point_count());
//! # Ok::<(), ar_depth_cloud::errors::PipelineError>(())
//! ```

pub mod capture;
pub mod config;
pub mod constants;
pub mod errors;
pub mod frames;
pub mod math;
pub mod pipelines;
pub mod scene;
pub mod synthetic;
pub mod workers;

// Re-export commonly used types
pub use capture::{CaptureSession, CaptureStats, FrameOutcome};
pub use config::Config;
pub use constants::DensityPreset;
pub use frames::{ColorFrame, DepthFrame, ViewPose};
pub use math::{Mat4, Vec4};
pub use pipelines::point_cloud::{Job, JobProcessor, PointCloudBatch, PointCloudProcessor};
pub use scene::{PointCloudScene, PointCloudSink};
pub use synthetic::SyntheticSource;
pub use workers::{SubmitOutcome, WorkerPool};
