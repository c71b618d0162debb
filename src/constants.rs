// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use serde::{Deserialize, Serialize};

/// Sampling density presets
///
/// Each preset picks the pixel stride used on both axes of the depth image.
/// Denser presets produce more points per frame at a higher per-job cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DensityPreset {
    /// Every 10th pixel
    #[default]
    Sparse,
    /// Every 7th pixel
    Balanced,
    /// Every 5th pixel
    Dense,
}

impl DensityPreset {
    /// All presets, sparsest first
    pub const ALL: [DensityPreset; 3] = [
        DensityPreset::Sparse,
        DensityPreset::Balanced,
        DensityPreset::Dense,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            DensityPreset::Sparse => "Sparse",
            DensityPreset::Balanced => "Balanced",
            DensityPreset::Dense => "Dense",
        }
    }

    /// Pixel stride on each axis
    pub fn stride(&self) -> u32 {
        match self {
            DensityPreset::Sparse => 10,
            DensityPreset::Balanced => 7,
            DensityPreset::Dense => 5,
        }
    }

    /// Upper bound on samples per job for a depth image of this size
    pub fn max_samples(&self, width: u32, height: u32) -> usize {
        let stride = self.stride();
        width.div_ceil(stride) as usize * height.div_ceil(stride) as usize
    }
}

/// Sampling defaults
pub mod sampling {
    /// Default stride on both axes (matches `DensityPreset::Sparse`)
    pub const DEFAULT_STRIDE: u32 = 10;

    /// Largest stride accepted from config, the widest depth image dimension possible
    pub const MAX_STRIDE: u32 = u16::MAX as u32;

    /// Scale from raw 16-bit depth to meters used by AR depth APIs (millimeters)
    pub const DEFAULT_RAW_VALUE_TO_METERS: f32 = 0.001;
}

/// Worker pool constants
pub mod workers {
    /// Pool size when available parallelism can't be queried
    pub const FALLBACK_POOL_SIZE: usize = 4;

    /// Worker thread name prefix, suffixed with the slot index
    pub const THREAD_NAME_PREFIX: &str = "depth-worker";
}

/// Scene defaults
pub mod scene {
    /// Rendered point size in meters
    pub const DEFAULT_POINT_SIZE: f32 = 0.01;
}

/// Synthetic session defaults
pub mod synthetic {
    /// Depth image size, typical of phone depth APIs
    pub const DEPTH_WIDTH: u32 = 160;
    pub const DEPTH_HEIGHT: u32 = 90;

    /// Color camera image size
    pub const CAMERA_WIDTH: u32 = 640;
    pub const CAMERA_HEIGHT: u32 = 360;

    /// Vertical field of view in radians
    pub const FOV_Y: f32 = 1.0;

    /// Target frame rate for the frame loop
    pub const FRAME_RATE: u32 = 30;
}

/// Application information utilities
pub mod app_info {
    /// Crate version
    pub fn version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }
}
