// SPDX-License-Identifier: GPL-3.0-only

//! Synthetic frame source
//!
//! Produces depth, color and pose samples shaped like an AR session's CPU
//! readbacks, for driving the pipeline without a device. The camera stands
//! at the origin and slowly turns about +Y, looking at a room whose depth
//! rises toward the top of the image, with a patch of missing depth.

use crate::constants::sampling::DEFAULT_RAW_VALUE_TO_METERS;
use crate::constants::synthetic::{
    CAMERA_HEIGHT, CAMERA_WIDTH, DEPTH_HEIGHT, DEPTH_WIDTH, FOV_Y,
};
use crate::errors::SourceError;
use crate::frames::{ColorFrame, DepthFrame, ViewPose};
use crate::math::Mat4;
use std::path::Path;
use tracing::info;

/// Radians the camera turns per frame
const YAW_PER_FRAME: f32 = 0.01;

/// Synthetic AR session frames
#[derive(Debug, Clone)]
pub struct SyntheticSource {
    depth_width: u32,
    depth_height: u32,
    camera_width: u32,
    camera_height: u32,
    color_template: Option<ColorFrame>,
    frame_index: u64,
}

impl Default for SyntheticSource {
    fn default() -> Self {
        Self::new(DEPTH_WIDTH, DEPTH_HEIGHT, CAMERA_WIDTH, CAMERA_HEIGHT)
    }
}

impl SyntheticSource {
    pub fn new(depth_width: u32, depth_height: u32, camera_width: u32, camera_height: u32) -> Self {
        Self {
            depth_width,
            depth_height,
            camera_width,
            camera_height,
            color_template: None,
            frame_index: 0,
        }
    }

    /// Use a fixed image as the camera frame instead of the generated gradient
    pub fn with_color_image(mut self, color: ColorFrame) -> Self {
        self.camera_width = color.camera_width;
        self.camera_height = color.camera_height;
        self.color_template = Some(color);
        self
    }

    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Produce the next frame's samples
    pub fn next_frame(&mut self) -> (DepthFrame, ColorFrame, ViewPose) {
        let index = self.frame_index;
        self.frame_index += 1;
        (self.depth_frame(), self.color_frame(), self.pose(index))
    }

    fn depth_frame(&self) -> DepthFrame {
        let (w, h) = (self.depth_width, self.depth_height);
        let hole_x = w / 3..w / 2;
        let hole_y = h / 3..h / 2;

        let raw: Vec<u16> = (0..h)
            .flat_map(|y| (0..w).map(move |x| (x, y)))
            .map(|(x, y)| {
                if hole_x.contains(&x) && hole_y.contains(&y) {
                    0
                } else {
                    // 1.5 m at the bottom rising to 4.5 m at the top
                    1500 + (3000 * (h - 1 - y) / h.max(1)) as u16
                }
            })
            .collect();

        DepthFrame::from_raw_values(w, h, &raw, DEFAULT_RAW_VALUE_TO_METERS, Mat4::IDENTITY)
    }

    fn color_frame(&self) -> ColorFrame {
        if let Some(template) = &self.color_template {
            return template.clone();
        }

        let (w, h) = (self.camera_width, self.camera_height);
        let mut pixels = Vec::with_capacity((w * h * 4) as usize);
        for y in 0..h {
            for x in 0..w {
                pixels.push((x * 255 / w.max(1)) as u8);
                pixels.push((y * 255 / h.max(1)) as u8);
                pixels.push(128);
                pixels.push(255);
            }
        }
        ColorFrame {
            camera_width: w,
            camera_height: h,
            pixels,
        }
    }

    fn pose(&self, index: u64) -> ViewPose {
        let aspect = self.camera_width as f32 / self.camera_height as f32;
        ViewPose {
            projection_matrix: Mat4::perspective(FOV_Y, aspect, 0.1, 100.0),
            view_matrix: Mat4::from_rotation_y(index as f32 * YAW_PER_FRAME),
        }
    }
}

/// Load an image file as a color frame
pub fn load_color_image(path: &Path) -> Result<ColorFrame, SourceError> {
    info!(path = %path.display(), "Loading color image");

    let img = image::open(path).map_err(|e| SourceError::Image {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    let frame = ColorFrame::from(img.to_rgba8());
    info!(
        width = frame.camera_width,
        height = frame.camera_height,
        "Image loaded successfully"
    );
    Ok(frame)
}
