// SPDX-License-Identifier: GPL-3.0-only

//! Per-frame sensor samples handed to the pipeline
//!
//! Buffers are owned `Vec<u8>`s. Building a job moves them, so once a frame
//! is submitted the caller can no longer read or mutate its bytes.

use crate::errors::DataIntegrityError;
use crate::math::Mat4;

/// Bytes per depth pixel (luminance + alpha)
pub const DEPTH_BYTES_PER_PIXEL: usize = 2;
/// Bytes per color pixel (RGBA8)
pub const COLOR_BYTES_PER_PIXEL: usize = 4;

/// CPU copy of one depth sensor sample
///
/// Each pixel is a 16-bit raw value split into a luminance byte (low) and an
/// alpha byte (high).
#[derive(Debug, Clone)]
pub struct DepthFrame {
    pub width: u32,
    pub height: u32,
    /// Luminance/alpha pairs, `2 * width * height` bytes
    pub data: Vec<u8>,
    /// Scale from raw 16-bit value to meters
    pub raw_value_to_meters: f32,
    /// Maps normalized view coordinates to normalized depth-buffer coordinates
    pub norm_depth_buffer_from_norm_view: Mat4,
}

impl DepthFrame {
    /// Build a frame from raw 16-bit values, encoding them as luminance/alpha bytes
    pub fn from_raw_values(
        width: u32,
        height: u32,
        raw: &[u16],
        raw_value_to_meters: f32,
        norm_depth_buffer_from_norm_view: Mat4,
    ) -> Self {
        let mut data = Vec::with_capacity(raw.len() * DEPTH_BYTES_PER_PIXEL);
        for value in raw {
            let [lo, hi] = value.to_le_bytes();
            data.push(lo);
            data.push(hi);
        }
        Self {
            width,
            height,
            data,
            raw_value_to_meters,
            norm_depth_buffer_from_norm_view,
        }
    }

    /// Expected buffer length for the declared dimensions
    pub fn expected_len(&self) -> usize {
        DEPTH_BYTES_PER_PIXEL * self.width as usize * self.height as usize
    }

    pub fn validate(&self) -> Result<(), DataIntegrityError> {
        if self.width == 0 || self.height == 0 {
            return Err(DataIntegrityError::EmptyFrame {
                frame: "depth",
                width: self.width,
                height: self.height,
            });
        }
        let expected = self.expected_len();
        if self.data.len() != expected {
            return Err(DataIntegrityError::DepthBufferLength {
                width: self.width,
                height: self.height,
                expected,
                actual: self.data.len(),
            });
        }
        Ok(())
    }

    /// Raw 16-bit value at a pixel, `(alpha << 8) | luminance`
    #[inline]
    pub fn raw_value_at(&self, col: u32, row: u32) -> u16 {
        let byte_index = (row as usize * self.width as usize + col as usize) * DEPTH_BYTES_PER_PIXEL;
        let luminance = self.data[byte_index] as u16;
        let alpha = self.data[byte_index + 1] as u16;
        (alpha << 8) | luminance
    }
}

/// CPU readback of the color camera image (RGBA8)
#[derive(Debug, Clone)]
pub struct ColorFrame {
    pub camera_width: u32,
    pub camera_height: u32,
    /// RGBA bytes, `4 * camera_width * camera_height`
    pub pixels: Vec<u8>,
}

impl ColorFrame {
    pub fn expected_len(&self) -> usize {
        COLOR_BYTES_PER_PIXEL * self.camera_width as usize * self.camera_height as usize
    }

    pub fn validate(&self) -> Result<(), DataIntegrityError> {
        if self.camera_width == 0 || self.camera_height == 0 {
            return Err(DataIntegrityError::EmptyFrame {
                frame: "color",
                width: self.camera_width,
                height: self.camera_height,
            });
        }
        let expected = self.expected_len();
        if self.pixels.len() != expected {
            return Err(DataIntegrityError::ColorBufferLength {
                width: self.camera_width,
                height: self.camera_height,
                expected,
                actual: self.pixels.len(),
            });
        }
        Ok(())
    }
}

impl From<image::RgbaImage> for ColorFrame {
    fn from(img: image::RgbaImage) -> Self {
        let (camera_width, camera_height) = img.dimensions();
        Self {
            camera_width,
            camera_height,
            pixels: img.into_raw(),
        }
    }
}

/// View matrices for the eye that produced a depth sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewPose {
    pub projection_matrix: Mat4,
    /// Camera-to-world transform
    pub view_matrix: Mat4,
}

impl ViewPose {
    /// Inverse projection, computed once and reused across a whole sample grid
    pub fn inverse_projection(&self) -> Option<Mat4> {
        self.projection_matrix.inverse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_value_encoding() {
        let frame = DepthFrame::from_raw_values(2, 1, &[2000, 0xABCD], 0.001, Mat4::IDENTITY);
        assert_eq!(frame.data, vec![208, 7, 0xCD, 0xAB]);
        assert_eq!(frame.raw_value_at(0, 0), 2000);
        assert_eq!(frame.raw_value_at(1, 0), 0xABCD);
    }

    #[test]
    fn test_depth_length_mismatch() {
        let mut frame = DepthFrame::from_raw_values(4, 4, &[0; 16], 0.001, Mat4::IDENTITY);
        assert!(frame.validate().is_ok());
        frame.data.pop();
        assert_eq!(
            frame.validate(),
            Err(DataIntegrityError::DepthBufferLength {
                width: 4,
                height: 4,
                expected: 32,
                actual: 31,
            })
        );
    }

    #[test]
    fn test_color_length_mismatch() {
        let frame = ColorFrame {
            camera_width: 2,
            camera_height: 2,
            pixels: vec![0; 12],
        };
        assert!(matches!(
            frame.validate(),
            Err(DataIntegrityError::ColorBufferLength { expected: 16, actual: 12, .. })
        ));
    }

    #[test]
    fn test_empty_frames_rejected() {
        let frame = ColorFrame {
            camera_width: 0,
            camera_height: 2,
            pixels: Vec::new(),
        };
        assert!(matches!(
            frame.validate(),
            Err(DataIntegrityError::EmptyFrame { frame: "color", .. })
        ));
    }

    #[test]
    fn test_color_from_image() {
        let img = image::RgbaImage::from_pixel(3, 2, image::Rgba([1, 2, 3, 4]));
        let frame = ColorFrame::from(img);
        assert_eq!(frame.camera_width, 3);
        assert_eq!(frame.camera_height, 2);
        assert!(frame.validate().is_ok());
        assert_eq!(&frame.pixels[0..4], &[1, 2, 3, 4]);
    }
}
