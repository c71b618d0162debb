// SPDX-License-Identifier: GPL-3.0-only

//! Colored points produced by one job

/// One colored world-space point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointSample {
    pub position: [f32; 3],
    /// Normalized RGB in `[0, 1]`
    pub color: [f32; 3],
}

/// Ordered points from exactly one job
///
/// Positions and colors are stored as parallel arrays so they can be handed
/// to a renderer as two flat vertex attributes. A batch is never merged
/// with another one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointCloudBatch {
    positions: Vec<[f32; 3]>,
    colors: Vec<[f32; 3]>,
}

impl PointCloudBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            positions: Vec::with_capacity(capacity),
            colors: Vec::with_capacity(capacity),
        }
    }

    /// Append one point; positions and colors always grow together
    #[inline]
    pub fn push(&mut self, position: [f32; 3], color: [f32; 3]) {
        self.positions.push(position);
        self.colors.push(color);
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn positions(&self) -> &[[f32; 3]] {
        &self.positions
    }

    pub fn colors(&self) -> &[[f32; 3]] {
        &self.colors
    }

    /// Positions as `x, y, z, x, y, z, ...`
    pub fn flat_positions(&self) -> &[f32] {
        bytemuck::cast_slice(&self.positions)
    }

    /// Colors as `r, g, b, r, g, b, ...`
    pub fn flat_colors(&self) -> &[f32] {
        bytemuck::cast_slice(&self.colors)
    }

    pub fn iter(&self) -> impl Iterator<Item = PointSample> + '_ {
        self.positions
            .iter()
            .zip(self.colors.iter())
            .map(|(&position, &color)| PointSample { position, color })
    }
}

impl FromIterator<PointSample> for PointCloudBatch {
    fn from_iter<I: IntoIterator<Item = PointSample>>(iter: I) -> Self {
        let mut batch = PointCloudBatch::new();
        for sample in iter {
            batch.push(sample.position, sample.color);
        }
        batch
    }
}
