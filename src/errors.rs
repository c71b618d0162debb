// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the depth point cloud pipeline
//!
//! Invalid samples and pool saturation are not errors: they are handled
//! locally (skip / drop). Only buffer integrity failures, pool setup
//! failures and configuration problems surface through these types.

use crate::workers::JobId;
use thiserror::Error;

/// Result type alias using PipelineError
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Top-level pipeline error type
#[derive(Debug, Clone, Error)]
pub enum PipelineError {
    /// A frame's declared dimensions don't match its buffer
    #[error("Data integrity error: {0}")]
    DataIntegrity(#[from] DataIntegrityError),
    /// Worker pool could not be created
    #[error("Worker pool error: {0}")]
    Pool(#[from] PoolError),
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    /// Frame source errors
    #[error("Frame source error: {0}")]
    Source(#[from] SourceError),
}

/// Buffer contract violations detected before a job is built
///
/// These indicate a producer bug upstream (wrong readback size, wrong
/// format), never a recoverable runtime condition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataIntegrityError {
    /// Depth buffer length is not 2 * width * height
    #[error("depth buffer is {actual} bytes, expected {expected} for {width}x{height}")]
    DepthBufferLength {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
    /// Color buffer length is not 4 * width * height
    #[error("color buffer is {actual} bytes, expected {expected} for {width}x{height}")]
    ColorBufferLength {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
    /// A sampling grid with a zero stride
    #[error("sampling grid strides must be positive, got {x_inc}x{y_inc}")]
    InvalidGrid { x_inc: u32, y_inc: u32 },
    /// A frame reported a zero width or height
    #[error("{frame} frame has empty dimensions {width}x{height}")]
    EmptyFrame {
        frame: &'static str,
        width: u32,
        height: u32,
    },
}

/// Worker pool setup errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    /// Pools must have at least one slot
    #[error("worker pool size must be at least 1")]
    ZeroSize,
    /// OS refused to create a worker thread
    #[error("failed to spawn worker thread {slot}: {reason}")]
    SpawnFailed { slot: usize, reason: String },
}

/// Configuration load/save/validation errors
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("failed to access config file: {0}")]
    Io(String),
    #[error("failed to parse config: {0}")]
    Parse(String),
    #[error("invalid config value: {0}")]
    Invalid(String),
}

/// Errors producing frames outside a live AR session
#[derive(Debug, Clone, Error)]
pub enum SourceError {
    #[error("failed to load image '{path}': {reason}")]
    Image { path: String, reason: String },
}

/// A job that was accepted but did not produce a batch
///
/// The slot that ran it is back to idle by the time this is observed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("job {id} on worker slot {slot} failed: {reason}")]
pub struct JobFailed {
    pub id: JobId,
    pub slot: usize,
    pub reason: String,
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}
