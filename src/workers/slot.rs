// SPDX-License-Identifier: GPL-3.0-only

//! Worker slot thread lifecycle
//!
//! Each slot owns one OS thread and the sending half of that thread's job
//! channel. Jobs go in by move and results come back on a one-shot channel
//! created per job, so a slot never shares mutable state with the pool or
//! with other slots.

use super::JobId;
use crate::errors::PoolError;
use crate::pipelines::point_cloud::{Job, JobProcessor, PointCloudBatch};
use futures::channel::oneshot;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

/// What a worker reports back for one job
pub(crate) type JobReply = Result<PointCloudBatch, String>;

/// A job on its way to a worker thread, with the one-shot to answer on
pub(crate) struct Assignment {
    pub id: JobId,
    pub job: Job,
    pub reply: oneshot::Sender<JobReply>,
}

/// One unit of parallel capacity in the pool
pub(crate) struct WorkerSlot {
    index: usize,
    name: String,
    sender: Option<mpsc::Sender<Assignment>>,
    thread_handle: Option<JoinHandle<()>>,
    busy: bool,
}

impl WorkerSlot {
    /// Spawn the slot's thread
    pub fn spawn(index: usize, processor: Arc<dyn JobProcessor>) -> Result<Self, PoolError> {
        let name = format!("{}-{}", crate::constants::workers::THREAD_NAME_PREFIX, index);
        let (sender, thread_handle) = start_thread(index, &name, processor)?;
        Ok(Self {
            index,
            name,
            sender: Some(sender),
            thread_handle: Some(thread_handle),
            busy: false,
        })
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Hand a job to the thread and mark the slot busy
    ///
    /// Gives the assignment back if the thread is no longer receiving.
    pub fn assign(&mut self, assignment: Assignment) -> Result<(), Assignment> {
        let Some(sender) = self.sender.as_ref() else {
            return Err(assignment);
        };
        sender.send(assignment).map_err(|mpsc::SendError(a)| a)?;
        self.busy = true;
        Ok(())
    }

    /// Mark the slot idle; called once its job's completion has been consumed
    pub fn release(&mut self) {
        self.busy = false;
    }

    /// Mark the slot busy without a live thread behind it
    ///
    /// Used when a job could not be handed over at all; the job's dropped
    /// reply surfaces as a failure that releases the slot again.
    pub fn hold(&mut self) {
        self.busy = true;
    }

    /// Replace a thread that stopped receiving jobs
    pub fn respawn(&mut self, processor: Arc<dyn JobProcessor>) -> Result<(), PoolError> {
        warn!(name = %self.name, "Worker thread stopped, respawning");
        self.shutdown();
        let (sender, thread_handle) = start_thread(self.index, &self.name, processor)?;
        self.sender = Some(sender);
        self.thread_handle = Some(thread_handle);
        Ok(())
    }

    /// Close the job channel and wait for the thread to finish its current job
    pub fn shutdown(&mut self) {
        self.sender = None;
        if let Some(handle) = self.thread_handle.take() {
            debug!(name = %self.name, "Waiting for worker thread to finish");
            if let Err(e) = handle.join() {
                warn!(name = %self.name, "Worker thread panicked: {:?}", e);
            }
        }
    }
}

impl Drop for WorkerSlot {
    fn drop(&mut self) {
        if self.thread_handle.is_some() {
            self.shutdown();
        }
    }
}

fn start_thread(
    index: usize,
    name: &str,
    processor: Arc<dyn JobProcessor>,
) -> Result<(mpsc::Sender<Assignment>, JoinHandle<()>), PoolError> {
    let (sender, receiver) = mpsc::channel::<Assignment>();
    let thread_name = name.to_string();

    let handle = thread::Builder::new()
        .name(name.to_string())
        .spawn(move || worker_loop(&thread_name, receiver, processor))
        .map_err(|e| PoolError::SpawnFailed {
            slot: index,
            reason: e.to_string(),
        })?;

    Ok((sender, handle))
}

fn worker_loop(name: &str, jobs: mpsc::Receiver<Assignment>, processor: Arc<dyn JobProcessor>) {
    debug!(name = %name, "Worker thread started");

    // Ends when the pool drops this slot's sender
    while let Ok(Assignment { id, job, reply }) = jobs.recv() {
        debug!(name = %name, job = %id, "Processing job");

        let result = panic::catch_unwind(AssertUnwindSafe(|| processor.process(job)))
            .map_err(|payload| panic_reason(payload.as_ref()));

        if let Err(reason) = &result {
            warn!(name = %name, job = %id, reason = %reason, "Job panicked");
        }
        if reply.send(result).is_err() {
            debug!(name = %name, job = %id, "Job result no longer awaited");
        }
    }

    info!(name = %name, "Worker thread exiting");
}

fn panic_reason(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_string()
    }
}
