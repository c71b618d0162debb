// SPDX-License-Identifier: GPL-3.0-only

//! Per-frame capture entry point
//!
//! A [`CaptureSession`] turns each rendered frame's depth sample into a job,
//! hands it to the worker pool (or runs it inline when workers are
//! disabled), and forwards finished batches to its [`PointCloudSink`].
//!
//! ```text
//! process(depth, color, pose)
//!   ├─ deliver completed batches ──▶ sink.add_batch
//!   ├─ validate buffers            ──▶ Err(DataIntegrity)
//!   └─ submit Job(grid)
//!        ├─ Accepted ──▶ grid advances
//!        └─ Dropped  ──▶ grid kept for the next frame
//! ```

use crate::config::Config;
use crate::errors::{JobFailed, PipelineResult};
use crate::frames::{ColorFrame, DepthFrame, ViewPose};
use crate::pipelines::point_cloud::{
    Job, PointCloudBatch, PointCloudProcessor, SampleGrid, StrideScheduler,
};
use crate::scene::{PointCloudScene, PointCloudSink};
use crate::workers::{Completion, JobId, SubmitOutcome, WorkerPool, available_parallelism};
use serde::Serialize;
use tracing::{debug, info, warn};

/// What happened to one frame's depth sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// A job was started for this frame
    Accepted(JobId),
    /// Every worker was busy; this frame contributes no points
    Dropped,
    /// Capture is switched off
    NotCapturing,
}

/// Running counters for a session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CaptureStats {
    /// Frames offered while capturing
    pub submitted: u64,
    pub accepted: u64,
    pub dropped: u64,
    /// Accepted jobs that never produced a batch
    pub failed: u64,
    /// Batches handed to the sink
    pub delivered: u64,
    /// Points across delivered batches
    pub points: u64,
}

enum Executor {
    Pool(WorkerPool),
    Inline {
        processor: PointCloudProcessor,
        next_id: u64,
    },
}

/// Failures kept for `take_failures`; older ones are only counted
const MAX_KEPT_FAILURES: usize = 64;

/// Capture state for one AR session
///
/// Call [`process`](Self::process) once per rendered frame, whether or not
/// capture is on: it delivers finished batches before anything else, so
/// jobs accepted before capture was switched off still reach the sink and
/// free their slots. A loop that stops calling `process` must call
/// [`pump`](Self::pump) each frame instead, or [`flush`](Self::flush) to wait.
pub struct CaptureSession<S: PointCloudSink = PointCloudScene> {
    executor: Executor,
    scheduler: StrideScheduler,
    grid: SampleGrid,
    sink: S,
    capturing: bool,
    stats: CaptureStats,
    failures: Vec<JobFailed>,
}

impl<S: PointCloudSink> CaptureSession<S> {
    /// Build a session from config, spawning the worker pool if enabled
    pub fn new(config: &Config, sink: S) -> PipelineResult<Self> {
        config.validate()?;

        let executor = if config.use_workers {
            let size = config.worker_count.unwrap_or_else(available_parallelism);
            Executor::Pool(WorkerPool::new(size, PointCloudProcessor)?)
        } else {
            Executor::Inline {
                processor: PointCloudProcessor,
                next_id: 0,
            }
        };

        let scheduler = match config.seed {
            Some(seed) => StrideScheduler::seeded(seed, config.offset_wrap),
            None => StrideScheduler::new(config.offset_wrap),
        };

        info!(
            workers = config.use_workers,
            stride_x = config.stride_x,
            stride_y = config.stride_y,
            wrap = ?config.offset_wrap,
            "Capture session created"
        );

        let mut session = Self::with_pool_parts(
            executor,
            scheduler,
            SampleGrid::new(config.stride_x, config.stride_y),
            sink,
        );
        session.capturing = config.capture_on_start;
        Ok(session)
    }

    /// Build a session around an existing pool, e.g. one running a custom processor
    pub fn with_pool(pool: WorkerPool, scheduler: StrideScheduler, grid: SampleGrid, sink: S) -> Self {
        Self::with_pool_parts(Executor::Pool(pool), scheduler, grid, sink)
    }

    fn with_pool_parts(
        executor: Executor,
        scheduler: StrideScheduler,
        grid: SampleGrid,
        sink: S,
    ) -> Self {
        Self {
            executor,
            scheduler,
            grid,
            sink,
            capturing: true,
            stats: CaptureStats::default(),
            failures: Vec::new(),
        }
    }

    /// Handle one frame's depth sample
    ///
    /// Completed batches are delivered first, even while not capturing.
    /// Buffers are moved in. Integrity errors are returned; a saturated pool
    /// is not an error and yields `FrameOutcome::Dropped`.
    pub fn process(
        &mut self,
        depth: DepthFrame,
        color: ColorFrame,
        pose: ViewPose,
    ) -> PipelineResult<FrameOutcome> {
        self.pump();

        if !self.capturing {
            return Ok(FrameOutcome::NotCapturing);
        }

        let job = Job::new(depth, color, pose, self.grid)?;
        self.stats.submitted += 1;

        let (outcome, inline_batch) = match &mut self.executor {
            Executor::Pool(pool) => match pool.submit(job) {
                SubmitOutcome::Accepted(id) => (FrameOutcome::Accepted(id), None),
                SubmitOutcome::Dropped => (FrameOutcome::Dropped, None),
            },
            Executor::Inline { processor, next_id } => {
                let id = JobId(*next_id);
                *next_id += 1;
                (FrameOutcome::Accepted(id), Some(processor.run(&job)))
            }
        };

        match outcome {
            FrameOutcome::Accepted(id) => {
                self.stats.accepted += 1;
                let (this_frame, next) = self.scheduler.advance(self.grid);
                debug!(
                    job = %id,
                    x_start = this_frame.x_start,
                    y_start = this_frame.y_start,
                    "Depth sample accepted"
                );
                self.grid = next;
            }
            FrameOutcome::Dropped => self.stats.dropped += 1,
            FrameOutcome::NotCapturing => {}
        }

        if let Some(batch) = inline_batch {
            self.deliver(batch);
        }

        Ok(outcome)
    }

    /// Deliver every batch that is ready, without waiting
    ///
    /// Returns the number of completions handled.
    pub fn pump(&mut self) -> usize {
        let completions = match &mut self.executor {
            Executor::Pool(pool) => pool.poll_completions(),
            Executor::Inline { .. } => Vec::new(),
        };
        self.handle_completions(completions)
    }

    /// Wait for every in-flight job and deliver the results
    pub fn flush(&mut self) -> usize {
        let completions = match &mut self.executor {
            Executor::Pool(pool) => pool.drain(),
            Executor::Inline { .. } => Vec::new(),
        };
        self.handle_completions(completions)
    }

    fn handle_completions(&mut self, completions: Vec<Completion>) -> usize {
        let count = completions.len();
        for completion in completions {
            match completion {
                Completion::Finished { batch, .. } => self.deliver(batch),
                Completion::Failed(failed) => {
                    warn!(error = %failed, "Depth job failed");
                    self.stats.failed += 1;
                    if self.failures.len() == MAX_KEPT_FAILURES {
                        self.failures.remove(0);
                    }
                    self.failures.push(failed);
                }
            }
        }
        count
    }

    fn deliver(&mut self, batch: PointCloudBatch) {
        self.stats.delivered += 1;
        self.stats.points += batch.len() as u64;
        self.sink.add_batch(batch);
    }

    pub fn set_capture(&mut self, capturing: bool) {
        if self.capturing != capturing {
            info!(capturing, "Capture toggled");
        }
        self.capturing = capturing;
    }

    /// Flip capture on/off, returning the new state
    pub fn toggle_capture(&mut self) -> bool {
        self.set_capture(!self.capturing);
        self.capturing
    }

    pub fn is_capturing(&self) -> bool {
        self.capturing
    }

    /// Remove accumulated points; jobs already in flight still deliver later
    pub fn clear_points(&mut self) {
        self.sink.clear();
    }

    pub fn set_points_visible(&mut self, visible: bool) {
        self.sink.set_visible(visible);
    }

    /// Grid the next accepted job will use
    pub fn grid(&self) -> SampleGrid {
        self.grid
    }

    pub fn stats(&self) -> CaptureStats {
        self.stats
    }

    /// Worker slots, or None when jobs run inline
    pub fn worker_count(&self) -> Option<usize> {
        match &self.executor {
            Executor::Pool(pool) => Some(pool.size()),
            Executor::Inline { .. } => None,
        }
    }

    /// Most recent failures since the last call, at most 64
    ///
    /// `stats().failed` counts every failure.
    pub fn take_failures(&mut self) -> Vec<JobFailed> {
        std::mem::take(&mut self.failures)
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Wait for outstanding jobs and hand back the sink
    pub fn into_sink(mut self) -> S {
        self.flush();
        let Self { sink, .. } = self;
        sink
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{DataIntegrityError, PipelineError};
    use crate::math::Mat4;
    use crate::pipelines::point_cloud::{Job, JobProcessor, OffsetWrap};

    struct Failing;

    impl JobProcessor for Failing {
        fn process(&self, _job: Job) -> PointCloudBatch {
            panic!("bad frame");
        }
    }

    fn frames() -> (DepthFrame, ColorFrame, ViewPose) {
        let depth = DepthFrame::from_raw_values(8, 8, &[1000; 64], 0.001, Mat4::IDENTITY);
        let color = ColorFrame {
            camera_width: 8,
            camera_height: 8,
            pixels: vec![64; 256],
        };
        let pose = ViewPose {
            projection_matrix: Mat4::IDENTITY,
            view_matrix: Mat4::IDENTITY,
        };
        (depth, color, pose)
    }

    fn inline_config() -> Config {
        Config {
            use_workers: false,
            seed: Some(1),
            stride_x: 2,
            stride_y: 2,
            ..Config::default()
        }
    }

    #[test]
    fn test_inline_delivers_immediately() {
        let mut session = CaptureSession::new(&inline_config(), PointCloudScene::default()).unwrap();
        let (d, c, p) = frames();
        let outcome = session.process(d, c, p).unwrap();
        assert!(matches!(outcome, FrameOutcome::Accepted(_)));
        assert_eq!(session.sink().batch_count(), 1);
        assert_eq!(session.stats().points, 16);
        assert_eq!(session.worker_count(), None);
    }

    #[test]
    fn test_not_capturing_skips() {
        let mut session = CaptureSession::new(&inline_config(), PointCloudScene::default()).unwrap();
        assert!(!session.toggle_capture());
        let (d, c, p) = frames();
        assert_eq!(session.process(d, c, p).unwrap(), FrameOutcome::NotCapturing);
        assert_eq!(session.stats(), CaptureStats::default());
    }

    #[test]
    fn test_integrity_error_propagates() {
        let mut session = CaptureSession::new(&inline_config(), PointCloudScene::default()).unwrap();
        let (mut d, c, p) = frames();
        d.data.truncate(10);
        let err = session.process(d, c, p).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::DataIntegrity(DataIntegrityError::DepthBufferLength { .. })
        ));
        assert_eq!(session.stats().submitted, 0);
    }

    #[test]
    fn test_grid_advances_per_accepted_job() {
        let config = Config {
            stride_x: 4,
            stride_y: 4,
            ..inline_config()
        };
        let mut session = CaptureSession::new(&config, PointCloudScene::default()).unwrap();
        let mut expected = StrideScheduler::seeded(1, config.offset_wrap);
        let mut grid = SampleGrid::new(4, 4);

        for _ in 0..5 {
            assert_eq!(session.grid(), grid);
            let (d, c, p) = frames();
            session.process(d, c, p).unwrap();
            grid = expected.advance(grid).1;
        }
    }

    #[test]
    fn test_kept_failures_are_capped() {
        let pool = WorkerPool::new(1, Failing).unwrap();
        let mut session = CaptureSession::with_pool(
            pool,
            StrideScheduler::seeded(0, OffsetWrap::Exclusive),
            SampleGrid::new(2, 2),
            PointCloudScene::default(),
        );

        for _ in 0..70 {
            let (d, c, p) = frames();
            assert!(matches!(session.process(d, c, p).unwrap(), FrameOutcome::Accepted(_)));
            session.flush();
        }

        assert_eq!(session.stats().failed, 70);
        let kept = session.take_failures();
        assert_eq!(kept.len(), MAX_KEPT_FAILURES);
        assert_eq!(kept.last().map(|f| f.id), Some(JobId(69)));
        assert_eq!(kept.first().map(|f| f.id), Some(JobId(6)));
        assert!(session.take_failures().is_empty());
    }
}
