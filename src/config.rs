// SPDX-License-Identifier: GPL-3.0-only

use crate::constants::scene::DEFAULT_POINT_SIZE;
use crate::constants::DensityPreset;
use crate::constants::sampling::{DEFAULT_STRIDE, MAX_STRIDE};
use crate::errors::ConfigError;
use crate::pipelines::point_cloud::OffsetWrap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Directory name under the user config dir
const CONFIG_DIR_NAME: &str = "ar-depth-cloud";
const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Horizontal sampling stride in depth pixels
    pub stride_x: u32,
    /// Vertical sampling stride in depth pixels
    pub stride_y: u32,
    /// How grid offsets wrap from frame to frame
    pub offset_wrap: OffsetWrap,
    /// Worker slots (None = available parallelism)
    pub worker_count: Option<usize>,
    /// Run jobs on the worker pool; when false they run on the calling thread
    pub use_workers: bool,
    /// Fixed seed for grid offsets, for reproducible captures
    pub seed: Option<u64>,
    /// Rendered point size in meters
    pub point_size: f32,
    /// Start sessions with capture enabled
    pub capture_on_start: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            stride_x: DEFAULT_STRIDE,
            stride_y: DEFAULT_STRIDE,
            offset_wrap: OffsetWrap::default(),
            worker_count: None, // Match available parallelism
            use_workers: true,
            seed: None,
            point_size: DEFAULT_POINT_SIZE,
            capture_on_start: true,
        }
    }
}

impl Config {
    /// Use a density preset's stride on both axes
    pub fn with_density(mut self, preset: DensityPreset) -> Self {
        self.stride_x = preset.stride();
        self.stride_y = preset.stride();
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let stride_range = 1..=MAX_STRIDE;
        if !stride_range.contains(&self.stride_x) || !stride_range.contains(&self.stride_y) {
            return Err(ConfigError::Invalid(format!(
                "strides must be in 1..={}, got {}x{}",
                MAX_STRIDE, self.stride_x, self.stride_y
            )));
        }
        if self.worker_count == Some(0) {
            return Err(ConfigError::Invalid(
                "worker_count must be at least 1".to_string(),
            ));
        }
        if !(self.point_size.is_finite() && self.point_size > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "point_size must be positive, got {}",
                self.point_size
            )));
        }
        Ok(())
    }

    /// Default config file location, e.g. `~/.config/ar-depth-cloud/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load and validate a config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&text)?;
        config.validate()?;
        debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Load from the default location, falling back to defaults
    pub fn load_or_default() -> Self {
        let Some(path) = Self::default_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        Self::load(&path).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "Ignoring invalid config, using defaults");
            Self::default()
        })
    }

    /// Write the config as pretty JSON, creating parent directories
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text)?;
        Ok(())
    }
}
