// SPDX-License-Identifier: GPL-3.0-only

//! Point cloud assembly
//!
//! [`PointCloudSink`] is the boundary to whatever draws the points. The
//! capture session only relies on its three operations. [`PointCloudScene`]
//! is an in-memory implementation that keeps every delivered batch as its
//! own drawable.

use crate::constants::scene::DEFAULT_POINT_SIZE;
use crate::pipelines::point_cloud::{PointCloudBatch, PointSample};
use tracing::debug;

/// Handle to one drawable created from a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DrawableHandle(pub u64);

/// Consumer of delivered point cloud batches
pub trait PointCloudSink {
    /// Add a batch as a new drawable
    ///
    /// Must accept batches at any time, including ones that arrive after
    /// `clear()` for jobs submitted before it.
    fn add_batch(&mut self, batch: PointCloudBatch) -> DrawableHandle;

    /// Drop every drawable added so far
    fn clear(&mut self);

    /// Show or hide all drawables
    fn set_visible(&mut self, visible: bool);
}

/// A batch kept as a drawable
#[derive(Debug, Clone)]
pub struct Drawable {
    pub handle: DrawableHandle,
    pub batch: PointCloudBatch,
}

/// Append-only in-memory point cloud
#[derive(Debug, Clone)]
pub struct PointCloudScene {
    drawables: Vec<Drawable>,
    visible: bool,
    point_size: f32,
    next_handle: u64,
}

impl Default for PointCloudScene {
    fn default() -> Self {
        Self::new(DEFAULT_POINT_SIZE)
    }
}

impl PointCloudScene {
    pub fn new(point_size: f32) -> Self {
        Self {
            drawables: Vec::new(),
            visible: true,
            point_size,
            next_handle: 0,
        }
    }

    pub fn point_size(&self) -> f32 {
        self.point_size
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Flip visibility, returning the new state
    pub fn toggle_visible(&mut self) -> bool {
        self.visible = !self.visible;
        self.visible
    }

    pub fn drawables(&self) -> &[Drawable] {
        &self.drawables
    }

    pub fn batch_count(&self) -> usize {
        self.drawables.len()
    }

    /// Total points across every drawable, visible or not
    pub fn point_count(&self) -> usize {
        self.drawables.iter().map(|d| d.batch.len()).sum()
    }

    /// Points currently shown, in delivery order
    ///
    /// Empty while the scene is hidden.
    pub fn visible_points(&self) -> impl Iterator<Item = PointSample> + '_ {
        let shown: &[Drawable] = if self.visible {
            self.drawables.as_slice()
        } else {
            &[]
        };
        shown.iter().flat_map(|d| d.batch.iter())
    }
}

impl PointCloudSink for PointCloudScene {
    fn add_batch(&mut self, batch: PointCloudBatch) -> DrawableHandle {
        let handle = DrawableHandle(self.next_handle);
        self.next_handle += 1;
        self.drawables.push(Drawable { handle, batch });
        handle
    }

    fn clear(&mut self) {
        debug!(drawables = self.drawables.len(), "Clearing point cloud scene");
        self.drawables.clear();
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }
}
