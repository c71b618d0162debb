// SPDX-License-Identifier: GPL-3.0-only

//! Depth + color to colored world-space points
//!
//! ```text
//! SampleGrid ─▶ for each cell (x, y):
//!                 u, v  = x / width, y / height
//!                 depth = decode_depth(u, v)          (skip NaN / zero)
//!                 rgb   = sample_color(u, v)
//!                 world = unproject(ndc(u), ndc(v), depth)
//!             ─▶ PointCloudBatch
//! ```
//!
//! A [`Job`] owns every buffer it reads, so a worker can process it without
//! locks. [`PointCloudProcessor`] is the default [`JobProcessor`] the worker
//! pool runs.

pub mod batch;
pub mod color;
pub mod depth;
pub mod stride;
pub mod unproject;

pub use batch::{PointCloudBatch, PointSample};
pub use color::sample_color;
pub use depth::decode_depth;
pub use stride::{OffsetWrap, SampleGrid, StrideScheduler};
pub use unproject::{to_ndc, unproject};

use crate::errors::DataIntegrityError;
use crate::frames::{ColorFrame, DepthFrame, ViewPose};
use tracing::{trace, warn};

/// Everything one sampling pass needs, moved into the worker that runs it
#[derive(Debug, Clone)]
pub struct Job {
    depth: DepthFrame,
    color: ColorFrame,
    pose: ViewPose,
    grid: SampleGrid,
}

impl Job {
    /// Bundle frames for submission, checking buffer lengths first
    pub fn new(
        depth: DepthFrame,
        color: ColorFrame,
        pose: ViewPose,
        grid: SampleGrid,
    ) -> Result<Self, DataIntegrityError> {
        depth.validate()?;
        color.validate()?;
        if !grid.is_valid() {
            return Err(DataIntegrityError::InvalidGrid {
                x_inc: grid.x_inc,
                y_inc: grid.y_inc,
            });
        }
        Ok(Self {
            depth,
            color,
            pose,
            grid,
        })
    }

    pub fn depth(&self) -> &DepthFrame {
        &self.depth
    }

    pub fn color(&self) -> &ColorFrame {
        &self.color
    }

    pub fn pose(&self) -> &ViewPose {
        &self.pose
    }

    pub fn grid(&self) -> SampleGrid {
        self.grid
    }
}

/// Work a pool slot performs on a job
///
/// Implementations run on worker threads, one job at a time per slot.
pub trait JobProcessor: Send + Sync + 'static {
    fn process(&self, job: Job) -> PointCloudBatch;
}

/// Default job processor: decode, unproject and color every grid cell
#[derive(Debug, Clone, Copy, Default)]
pub struct PointCloudProcessor;

impl PointCloudProcessor {
    pub fn new() -> Self {
        Self
    }

    /// Run one sampling pass over a job's frames
    pub fn run(&self, job: &Job) -> PointCloudBatch {
        let start = std::time::Instant::now();
        let depth = &job.depth;
        let grid = job.grid;

        let Some(inv_projection) = job.pose.inverse_projection() else {
            warn!("Projection matrix is not invertible, skipping depth sample");
            return PointCloudBatch::new();
        };
        let view_matrix = &job.pose.view_matrix;

        let width = depth.width as f32;
        let height = depth.height as f32;
        let mut batch = PointCloudBatch::with_capacity(grid.cell_count(depth.width, depth.height));

        for (x, y) in grid.cells(depth.width, depth.height) {
            let u = x as f32 / width;
            let v = y as f32 / height;

            let depth_m = decode_depth(u, v, depth);
            // Raw value 0 means the sensor had no measurement
            if !depth_m.is_finite() || depth_m == 0.0 {
                continue;
            }

            let color = sample_color(u, v, &job.color);
            let position = unproject(to_ndc(u), to_ndc(v), depth_m, &inv_projection, view_matrix);
            batch.push(position, color);
        }

        trace!(
            points = batch.len(),
            x_start = grid.x_start,
            y_start = grid.y_start,
            elapsed_us = start.elapsed().as_micros() as u64,
            "Sampled depth grid"
        );

        batch
    }
}

impl JobProcessor for PointCloudProcessor {
    fn process(&self, job: Job) -> PointCloudBatch {
        self.run(&job)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Mat4;

    fn identity_pose() -> ViewPose {
        ViewPose {
            projection_matrix: Mat4::IDENTITY,
            view_matrix: Mat4::IDENTITY,
        }
    }

    fn color(width: u32, height: u32) -> ColorFrame {
        ColorFrame {
            camera_width: width,
            camera_height: height,
            pixels: vec![200; (width * height * 4) as usize],
        }
    }

    #[test]
    fn test_zero_and_missing_depth_skipped() {
        let mut raw = vec![0u16; 16];
        raw[2 * 4 + 2] = 2000;
        let depth = DepthFrame::from_raw_values(4, 4, &raw, 0.001, Mat4::IDENTITY);
        let job = Job::new(depth, color(4, 4), identity_pose(), SampleGrid::new(1, 1)).unwrap();

        let batch = PointCloudProcessor.run(&job);
        assert_eq!(batch.len(), 1);
        let p = batch.positions()[0];
        assert!((p[2] + 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_singular_projection_gives_empty_batch() {
        let raw = vec![1000u16; 16];
        let depth = DepthFrame::from_raw_values(4, 4, &raw, 0.001, Mat4::IDENTITY);
        let pose = ViewPose {
            projection_matrix: Mat4::from_cols_array([0.0; 16]),
            view_matrix: Mat4::IDENTITY,
        };
        let job = Job::new(depth, color(4, 4), pose, SampleGrid::new(1, 1)).unwrap();
        assert!(PointCloudProcessor.run(&job).is_empty());
    }

    #[test]
    fn test_grid_controls_sample_count() {
        let raw = vec![1000u16; 100];
        let depth = DepthFrame::from_raw_values(10, 10, &raw, 0.001, Mat4::IDENTITY);
        let grid = SampleGrid::new(5, 5).advanced_by(1, 3, OffsetWrap::Exclusive);
        let job = Job::new(depth, color(10, 10), identity_pose(), grid).unwrap();
        // x in {1, 6}, y in {3, 8}
        assert_eq!(PointCloudProcessor.run(&job).len(), 4);
    }

    #[test]
    fn test_job_rejects_bad_buffers() {
        let depth = DepthFrame::from_raw_values(4, 4, &[0; 15], 0.001, Mat4::IDENTITY);
        let err = Job::new(depth, color(4, 4), identity_pose(), SampleGrid::new(1, 1));
        assert!(matches!(err, Err(DataIntegrityError::DepthBufferLength { .. })));
    }

    #[test]
    fn test_job_rejects_zero_stride_grid() {
        let depth = DepthFrame::from_raw_values(4, 4, &[1000; 16], 0.001, Mat4::IDENTITY);
        let grid = SampleGrid {
            x_inc: 0,
            ..SampleGrid::new(1, 1)
        };
        let err = Job::new(depth, color(4, 4), identity_pose(), grid);
        assert!(matches!(
            err,
            Err(DataIntegrityError::InvalidGrid { x_inc: 0, y_inc: 1 })
        ));
    }
}
