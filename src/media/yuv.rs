// SPDX-License-Identifier: GPL-3.0-only
//! CPU conversion of planar 4:2:0 frames to RGB
//!
//! Uses full-range BT.601 coefficients, which is what camera preview
//! buffers carry.

use super::frame::{PlanarFormat, PlanarFrame};
use crate::errors::TransformError;
use image::RgbImage;

/// Convert one YUV sample to RGB (BT.601)
#[inline]
fn yuv_to_rgb(y: u8, u: u8, v: u8) -> [u8; 3] {
    let y = y as f32;
    let u = u as f32 - 128.0;
    let v = v as f32 - 128.0;

    let r = (y + 1.402 * v).round().clamp(0.0, 255.0) as u8;
    let g = (y - 0.344 * u - 0.714 * v).round().clamp(0.0, 255.0) as u8;
    let b = (y + 1.772 * u).round().clamp(0.0, 255.0) as u8;
    [r, g, b]
}

/// Convert a planar frame to an RGB bitmap
pub fn planar_to_rgb(frame: &PlanarFrame) -> Result<RgbImage, TransformError> {
    frame.validate()?;

    let width = frame.width as usize;
    let height = frame.height as usize;
    let (chroma_width, chroma_height) = frame.chroma_dimensions();

    let luma = &frame.data[..width * height];
    let chroma = &frame.data[width * height..];

    let mut rgb = vec![0u8; width * height * 3];

    for row in 0..height {
        let chroma_row = row / 2;
        for col in 0..width {
            let chroma_col = col / 2;
            let y = luma[row * width + col];

            let (u, v) = match frame.format {
                PlanarFormat::Nv21 => {
                    let i = (chroma_row * chroma_width + chroma_col) * 2;
                    (chroma[i + 1], chroma[i])
                }
                PlanarFormat::Nv12 => {
                    let i = (chroma_row * chroma_width + chroma_col) * 2;
                    (chroma[i], chroma[i + 1])
                }
                PlanarFormat::I420 => {
                    let plane = chroma_width * chroma_height;
                    let i = chroma_row * chroma_width + chroma_col;
                    (chroma[i], chroma[plane + i])
                }
            };

            let out = (row * width + col) * 3;
            rgb[out..out + 3].copy_from_slice(&yuv_to_rgb(y, u, v));
        }
    }

    RgbImage::from_raw(frame.width, frame.height, rgb)
        .ok_or_else(|| TransformError::Decode("Failed to create RGB image from buffer".into()))
}
