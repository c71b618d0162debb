// SPDX-License-Identifier: GPL-3.0-only

//! Fixed-point depth lookup

use crate::frames::DepthFrame;
use crate::math::Vec4;

/// Metric depth at normalized view coordinate `(u, v)`
///
/// Returns NaN for coordinates outside `[0, 1]` or when the depth-space
/// transform produces a non-finite position. The lookup is clamped to the
/// buffer so it never indexes out of bounds. Callers treat NaN as "no
/// sample here".
pub fn decode_depth(u: f32, v: f32, frame: &DepthFrame) -> f32 {
    if !(0.0..=1.0).contains(&u) || !(0.0..=1.0).contains(&v) {
        return f32::NAN;
    }

    let norm_depth = frame
        .norm_depth_buffer_from_norm_view
        .transform_vec4(Vec4::new(u, v, 0.0, 1.0));

    let fx = norm_depth.x * frame.width as f32;
    let fy = norm_depth.y * frame.height as f32;
    if !fx.is_finite() || !fy.is_finite() {
        return f32::NAN;
    }

    let col = fx.clamp(0.0, (frame.width - 1) as f32).trunc() as u32;
    let row = fy.clamp(0.0, (frame.height - 1) as f32).trunc() as u32;

    frame.raw_value_at(col, row) as f32 * frame.raw_value_to_meters
}
