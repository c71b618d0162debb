// SPDX-License-Identifier: GPL-3.0-only

//! Slot assignment and completion delivery

use super::slot::{Assignment, JobReply, WorkerSlot};
use super::{Completion, JobId, SubmitOutcome};
use crate::constants::workers::FALLBACK_POOL_SIZE;
use crate::errors::{JobFailed, PoolError};
use crate::pipelines::point_cloud::{Job, JobProcessor};
use futures::channel::oneshot;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// An accepted job whose completion has not been consumed yet
struct InFlight {
    id: JobId,
    slot: usize,
    receiver: oneshot::Receiver<JobReply>,
}

/// Fixed-size pool of worker slots
///
/// Owned and driven by a single dispatching thread. `submit` never blocks:
/// it either hands the job to an idle slot or drops it.
pub struct WorkerPool {
    slots: Vec<WorkerSlot>,
    in_flight: Vec<InFlight>,
    processor: Arc<dyn JobProcessor>,
    next_id: u64,
}

impl WorkerPool {
    /// Create a pool with `size` slots running `processor`
    pub fn new<P: JobProcessor>(size: usize, processor: P) -> Result<Self, PoolError> {
        if size == 0 {
            return Err(PoolError::ZeroSize);
        }

        let processor: Arc<dyn JobProcessor> = Arc::new(processor);
        let slots = (0..size)
            .map(|index| WorkerSlot::spawn(index, Arc::clone(&processor)))
            .collect::<Result<Vec<_>, _>>()?;

        info!(size, "Depth worker pool started");

        Ok(Self {
            slots,
            in_flight: Vec::with_capacity(size),
            processor,
            next_id: 0,
        })
    }

    /// Create a pool sized to the machine's available parallelism
    pub fn with_available_parallelism<P: JobProcessor>(processor: P) -> Result<Self, PoolError> {
        Self::new(available_parallelism(), processor)
    }

    /// Number of slots, fixed for the pool's lifetime
    pub fn size(&self) -> usize {
        self.slots.len()
    }

    pub fn busy_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_busy()).count()
    }

    pub fn idle_count(&self) -> usize {
        self.size() - self.busy_count()
    }

    pub fn is_slot_busy(&self, slot: usize) -> bool {
        self.slots.get(slot).is_some_and(|s| s.is_busy())
    }

    /// Jobs accepted whose completion hasn't been consumed
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Offer a job to the first idle slot, dropping it if there is none
    pub fn submit(&mut self, job: Job) -> SubmitOutcome {
        let Some(index) = self.slots.iter().position(|s| !s.is_busy()) else {
            warn!(
                pool_size = self.slots.len(),
                "All depth workers busy, dropping frame"
            );
            return SubmitOutcome::Dropped;
        };

        let id = JobId(self.next_id);
        self.next_id += 1;

        let (reply, receiver) = oneshot::channel();
        let assignment = Assignment { id, job, reply };

        if let Err(assignment) = self.slots[index].assign(assignment) {
            // Thread is gone; bring up a replacement before giving up on the job
            let slot = &mut self.slots[index];
            let retried = match slot.respawn(Arc::clone(&self.processor)) {
                Ok(()) => slot.assign(assignment).is_ok(),
                Err(e) => {
                    warn!(slot = index, error = %e, "Could not respawn worker");
                    false
                }
            };
            if retried {
                debug!(job = %id, slot = index, "Job assigned to respawned worker");
            } else {
                // The reply sender is gone, so this job resolves as failed
                slot.hold();
                warn!(job = %id, slot = index, "No worker took the job, it will report as failed");
            }
        } else {
            debug!(job = %id, slot = index, "Job assigned");
        }

        self.track(id, index, receiver);
        SubmitOutcome::Accepted(id)
    }

    fn track(&mut self, id: JobId, slot: usize, receiver: oneshot::Receiver<JobReply>) {
        self.in_flight.push(InFlight { id, slot, receiver });
    }

    /// Collect completions that are ready without waiting
    ///
    /// Each returned completion's slot is idle again.
    pub fn poll_completions(&mut self) -> Vec<Completion> {
        let mut completed = Vec::new();
        let mut pending = Vec::with_capacity(self.in_flight.len());

        for mut job in std::mem::take(&mut self.in_flight) {
            match job.receiver.try_recv() {
                Ok(None) => pending.push(job),
                Ok(Some(reply)) => completed.push(self.complete(job.id, job.slot, Ok(reply))),
                Err(oneshot::Canceled) => {
                    completed.push(self.complete(job.id, job.slot, Err(oneshot::Canceled)))
                }
            }
        }

        self.in_flight = pending;
        completed
    }

    /// Block until every in-flight job has completed
    pub fn drain(&mut self) -> Vec<Completion> {
        std::mem::take(&mut self.in_flight)
            .into_iter()
            .map(|job| {
                let result = pollster::block_on(job.receiver);
                self.complete(job.id, job.slot, result)
            })
            .collect()
    }

    fn complete(
        &mut self,
        id: JobId,
        slot: usize,
        result: Result<JobReply, oneshot::Canceled>,
    ) -> Completion {
        self.slots[slot].release();

        match result {
            Ok(Ok(batch)) => {
                debug!(job = %id, slot, points = batch.len(), "Job finished");
                Completion::Finished { id, slot, batch }
            }
            Ok(Err(reason)) => Completion::Failed(JobFailed { id, slot, reason }),
            Err(oneshot::Canceled) => {
                warn!(job = %id, slot, "Worker exited before completing job");
                Completion::Failed(JobFailed {
                    id,
                    slot,
                    reason: "worker thread exited before completing the job".to_string(),
                })
            }
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        if !self.in_flight.is_empty() {
            debug!(
                in_flight = self.in_flight.len(),
                "Dropping worker pool with unconsumed jobs"
            );
        }
        // Slots close their channels and join as they drop
        self.slots.clear();
        info!("Depth worker pool stopped");
    }
}

/// Worker count matching the machine's available parallelism
pub fn available_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(FALLBACK_POOL_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frames::{ColorFrame, DepthFrame, ViewPose};
    use crate::math::Mat4;
    use crate::pipelines::point_cloud::{PointCloudProcessor, SampleGrid};

    fn job() -> Job {
        let depth = DepthFrame::from_raw_values(4, 4, &[1500; 16], 0.001, Mat4::IDENTITY);
        let color = ColorFrame {
            camera_width: 4,
            camera_height: 4,
            pixels: vec![128; 64],
        };
        let pose = ViewPose {
            projection_matrix: Mat4::IDENTITY,
            view_matrix: Mat4::IDENTITY,
        };
        Job::new(depth, color, pose, SampleGrid::new(2, 2)).unwrap()
    }

    #[test]
    fn test_zero_size_rejected() {
        assert_eq!(
            WorkerPool::new(0, PointCloudProcessor).err(),
            Some(PoolError::ZeroSize)
        );
    }

    #[test]
    fn test_slot_stays_busy_until_completion_consumed() {
        let mut pool = WorkerPool::new(1, PointCloudProcessor).unwrap();
        assert!(pool.submit(job()).is_accepted());
        assert_eq!(pool.busy_count(), 1);

        // The job may already be done, but the slot is only freed on consumption
        std::thread::sleep(std::time::Duration::from_millis(20));
        assert_eq!(pool.submit(job()), SubmitOutcome::Dropped);

        let completions = pool.drain();
        assert_eq!(completions.len(), 1);
        assert_eq!(pool.busy_count(), 0);
        assert!(pool.submit(job()).is_accepted());
        pool.drain();
    }

    #[test]
    fn test_job_ids_increase() {
        let mut pool = WorkerPool::new(2, PointCloudProcessor).unwrap();
        assert_eq!(pool.submit(job()), SubmitOutcome::Accepted(JobId(0)));
        assert_eq!(pool.submit(job()), SubmitOutcome::Accepted(JobId(1)));
        let mut ids: Vec<_> = pool.drain().iter().map(Completion::id).collect();
        ids.sort();
        assert_eq!(ids, vec![JobId(0), JobId(1)]);
    }

    #[test]
    fn test_poll_eventually_delivers() {
        let mut pool = WorkerPool::new(2, PointCloudProcessor).unwrap();
        pool.submit(job());

        let mut delivered = Vec::new();
        for _ in 0..500 {
            delivered.extend(pool.poll_completions());
            if !delivered.is_empty() {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(2));
        }

        assert_eq!(delivered.len(), 1);
        assert!(matches!(
            &delivered[0],
            Completion::Finished { batch, .. } if batch.len() == 4
        ));
        assert_eq!(pool.in_flight(), 0);
        assert_eq!(pool.busy_count(), 0);
    }

    #[test]
    fn test_lost_thread_is_respawned_for_the_job() {
        let mut pool = WorkerPool::new(2, PointCloudProcessor).unwrap();
        pool.slots[0].shutdown();

        let outcome = pool.submit(job());
        assert_eq!(outcome, SubmitOutcome::Accepted(JobId(0)));
        assert!(pool.is_slot_busy(0));

        let completions = pool.drain();
        assert!(matches!(
            &completions[..],
            [Completion::Finished { slot: 0, batch, .. }] if batch.len() == 4
        ));
        assert_eq!(pool.busy_count(), 0);

        // The replacement thread keeps serving
        assert!(pool.submit(job()).is_accepted());
        assert!(matches!(pool.drain()[0], Completion::Finished { slot: 0, .. }));
    }

    #[test]
    fn test_unanswered_job_fails_and_frees_slot() {
        let mut pool = WorkerPool::new(1, PointCloudProcessor).unwrap();

        // A held slot whose reply sender is gone, as when no worker could take the job
        let (reply, receiver) = oneshot::channel::<JobReply>();
        drop(reply);
        pool.slots[0].hold();
        pool.track(JobId(7), 0, receiver);
        assert_eq!(pool.submit(job()), SubmitOutcome::Dropped);

        let completions = pool.poll_completions();
        match &completions[..] {
            [Completion::Failed(failed)] => {
                assert_eq!(failed.id, JobId(7));
                assert_eq!(failed.slot, 0);
                assert!(failed.reason.contains("exited"));
            }
            other => panic!("expected one failure, got {other:?}"),
        }
        assert_eq!(pool.idle_count(), 1);
        assert!(pool.submit(job()).is_accepted());
        pool.drain();
    }
}
