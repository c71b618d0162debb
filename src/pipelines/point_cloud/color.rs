// SPDX-License-Identifier: GPL-3.0-only

//! Nearest-neighbor color lookup in the camera image

use crate::frames::{COLOR_BYTES_PER_PIXEL, ColorFrame};

/// Normalized RGB of the camera pixel nearest to `(u, v)`
///
/// Expects `u, v` in `[0, 1]`; the pixel index is clamped to the last row
/// and column so `u = 1` or `v = 1` still reads inside the image. Alpha is
/// discarded.
#[inline]
pub fn sample_color(u: f32, v: f32, frame: &ColorFrame) -> [f32; 3] {
    let cam_x = ((u * frame.camera_width as f32).floor() as u32).min(frame.camera_width - 1);
    let cam_y = ((v * frame.camera_height as f32).floor() as u32).min(frame.camera_height - 1);
    let index =
        (cam_y as usize * frame.camera_width as usize + cam_x as usize) * COLOR_BYTES_PER_PIXEL;

    let px = &frame.pixels[index..index + 3];
    [
        px[0] as f32 / 255.0,
        px[1] as f32 / 255.0,
        px[2] as f32 / 255.0,
    ]
}
