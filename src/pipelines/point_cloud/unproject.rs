// SPDX-License-Identifier: GPL-3.0-only

//! Screen pixel + metric depth to world space

use crate::math::{Mat4, Vec4};

/// NDC coordinate for a depth pixel, `u * 2 - 1`
#[inline]
pub fn to_ndc(u: f32) -> f32 {
    u * 2.0 - 1.0
}

/// World-space position of an NDC sample at `depth` meters
///
/// The clip vector `(ndc_x, ndc_y, -1, 1)` is taken to eye space with the
/// inverse projection (no perspective divide) and scaled so that the point
/// sits `depth` meters in front of the camera along -Z. The view matrix
/// (camera-to-world) then places it in the world.
#[inline]
pub fn unproject(
    ndc_x: f32,
    ndc_y: f32,
    depth: f32,
    inv_projection: &Mat4,
    view_matrix: &Mat4,
) -> [f32; 3] {
    let eye = inv_projection.transform_vec4(Vec4::new(ndc_x, ndc_y, -1.0, 1.0));
    let eye_pos = [eye.x * depth, eye.y * depth, -depth];
    view_matrix.transform_point3(eye_pos)
}
