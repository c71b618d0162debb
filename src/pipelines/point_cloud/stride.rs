// SPDX-License-Identifier: GPL-3.0-only

//! Sparse sampling grid that shifts from frame to frame
//!
//! Each job only visits every `x_inc`-th column and `y_inc`-th row. Moving
//! the start offsets by a random amount after every accepted job spreads
//! coverage over the full depth image across many frames without raising
//! the per-frame cost.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// How start offsets wrap around the stride
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OffsetWrap {
    /// Draw in `[0, stride)`, wrap modulo `stride`: `0 <= start < stride`
    #[default]
    Exclusive,
    /// Draw in `[0, stride]`, wrap modulo `stride + 1`: `0 <= start <= stride`
    ///
    /// An offset equal to the stride skips the first column/row residue
    /// entirely for that frame.
    Inclusive,
}

impl OffsetWrap {
    /// Modulus applied to offsets for a given stride, never zero
    ///
    /// A zero stride counts as 1. The inclusive modulus saturates at
    /// `u32::MAX`.
    pub fn modulus(self, stride: u32) -> u32 {
        let stride = stride.max(1);
        match self {
            OffsetWrap::Exclusive => stride,
            OffsetWrap::Inclusive => stride.saturating_add(1),
        }
    }

    /// Largest offset a step may draw for a given stride
    pub fn max_step(self, stride: u32) -> u32 {
        self.modulus(stride) - 1
    }
}

/// Start offsets and strides for one job's sampling pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleGrid {
    pub x_start: u32,
    pub y_start: u32,
    pub x_inc: u32,
    pub y_inc: u32,
}

impl SampleGrid {
    /// Grid starting at the origin; strides are raised to at least 1
    pub fn new(x_inc: u32, y_inc: u32) -> Self {
        Self {
            x_start: 0,
            y_start: 0,
            x_inc: x_inc.max(1),
            y_inc: y_inc.max(1),
        }
    }

    /// Grid shifted by `(dx, dy)` with offsets wrapped per `wrap`
    pub fn advanced_by(self, dx: u32, dy: u32, wrap: OffsetWrap) -> Self {
        Self {
            x_start: wrap_offset(self.x_start, dx, wrap.modulus(self.x_inc)),
            y_start: wrap_offset(self.y_start, dy, wrap.modulus(self.y_inc)),
            ..self
        }
    }

    /// Both strides are at least 1
    pub fn is_valid(&self) -> bool {
        self.x_inc > 0 && self.y_inc > 0
    }

    /// Number of cells visited over a `width x height` depth image
    pub fn cell_count(&self, width: u32, height: u32) -> usize {
        let cols = width.saturating_sub(self.x_start).div_ceil(self.x_inc.max(1));
        let rows = height.saturating_sub(self.y_start).div_ceil(self.y_inc.max(1));
        cols as usize * rows as usize
    }

    /// Depth pixel coordinates visited, row-major
    pub fn cells(&self, width: u32, height: u32) -> impl Iterator<Item = (u32, u32)> + '_ {
        let (x_start, x_inc) = (self.x_start, self.x_inc.max(1) as usize);
        (self.y_start..height)
            .step_by(self.y_inc.max(1) as usize)
            .flat_map(move |y| (x_start..width).step_by(x_inc).map(move |x| (x, y)))
    }
}

fn wrap_offset(start: u32, step: u32, modulus: u32) -> u32 {
    ((u64::from(start) + u64::from(step)) % u64::from(modulus)) as u32
}

/// Pseudo-random source of per-frame grid offsets
pub struct StrideScheduler {
    rng: StdRng,
    wrap: OffsetWrap,
}

impl StrideScheduler {
    /// Scheduler seeded from OS entropy
    pub fn new(wrap: OffsetWrap) -> Self {
        Self {
            rng: StdRng::from_os_rng(),
            wrap,
        }
    }

    /// Deterministic scheduler, identical seeds give identical offset sequences
    pub fn seeded(seed: u64, wrap: OffsetWrap) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            wrap,
        }
    }

    pub fn wrap(&self) -> OffsetWrap {
        self.wrap
    }

    /// Returns `(grid for this job, grid for the next job)`
    ///
    /// Call once per accepted job, after the job's grid has been taken.
    pub fn advance(&mut self, grid: SampleGrid) -> (SampleGrid, SampleGrid) {
        let dx = self.rng.random_range(0..=self.wrap.max_step(grid.x_inc));
        let dy = self.rng.random_range(0..=self.wrap.max_step(grid.y_inc));
        (grid, grid.advanced_by(dx, dy, self.wrap))
    }
}
