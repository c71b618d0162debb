// SPDX-License-Identifier: GPL-3.0-only

//! Fixed-size worker pool for point cloud jobs
//!
//! The pool has a fixed number of slots, each backed by one thread. A
//! submitted job goes to the lowest-numbered idle slot or is dropped when
//! every slot is busy; nothing is ever queued. A slot becomes idle again
//! once the dispatching side has consumed its job's completion, so the
//! number of busy slots is bounded by the pool size at all times.
//!
//! Completions can arrive in any order relative to submission.

mod pool;
mod slot;

pub use pool::{WorkerPool, available_parallelism};

use crate::errors::JobFailed;
use crate::pipelines::point_cloud::PointCloudBatch;
use std::fmt;

/// Identifier assigned to each accepted job, increasing per pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(pub u64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Result of offering a job to the pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// A slot took the job
    Accepted(JobId),
    /// Every slot was busy; the job and its buffers were discarded
    Dropped,
}

impl SubmitOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, SubmitOutcome::Accepted(_))
    }
}

/// A job that has left its slot
#[derive(Debug)]
pub enum Completion {
    /// The job produced a batch
    Finished {
        id: JobId,
        slot: usize,
        batch: PointCloudBatch,
    },
    /// The job never produced a batch (worker panic or lost thread)
    Failed(JobFailed),
}

impl Completion {
    pub fn id(&self) -> JobId {
        match self {
            Completion::Finished { id, .. } => *id,
            Completion::Failed(failed) => failed.id,
        }
    }
}
