// SPDX-License-Identifier: GPL-3.0-only

//! Bitmap operations used by the capture transform
//!
//! The transform only talks to the [`ImageBuffer`] trait, so a hardware
//! implementation can replace [`SoftwareImageBuffer`] without touching the
//! pipeline.

use super::frame::PlanarFrame;
use super::yuv::planar_to_rgb;
use crate::constants::{RESIZE_FILTER, quality};
use crate::errors::TransformError;
use image::RgbImage;
use tracing::debug;

/// Decode, resize, rotate and encode capability
pub trait ImageBuffer: Send + Sync {
    /// Decode compressed bytes (JPEG, PNG, ...) into a bitmap
    fn decode_encoded(&self, data: &[u8]) -> Result<RgbImage, TransformError>;

    /// Convert a planar luma/chroma frame into a bitmap
    fn decode_planar(&self, frame: &PlanarFrame) -> Result<RgbImage, TransformError>;

    /// Resize with a smoothing filter
    fn resize(&self, image: &RgbImage, width: u32, height: u32)
    -> Result<RgbImage, TransformError>;

    /// Rotate clockwise by a multiple of 90 degrees
    fn rotate(&self, image: &RgbImage, degrees: u32) -> Result<RgbImage, TransformError>;

    /// Encode as JPEG at a quality in [0, 100]
    fn encode_jpeg(&self, image: &RgbImage, quality: u8) -> Result<Vec<u8>, TransformError>;
}

/// CPU implementation backed by the `image` crate
#[derive(Debug, Clone, Copy, Default)]
pub struct SoftwareImageBuffer;

impl SoftwareImageBuffer {
    pub fn new() -> Self {
        Self
    }
}

impl ImageBuffer for SoftwareImageBuffer {
    fn decode_encoded(&self, data: &[u8]) -> Result<RgbImage, TransformError> {
        let decoded = image::load_from_memory(data)
            .map_err(|e| TransformError::Decode(e.to_string()))?;
        Ok(decoded.into_rgb8())
    }

    fn decode_planar(&self, frame: &PlanarFrame) -> Result<RgbImage, TransformError> {
        planar_to_rgb(frame)
    }

    fn resize(
        &self,
        image: &RgbImage,
        width: u32,
        height: u32,
    ) -> Result<RgbImage, TransformError> {
        if width == 0 || height == 0 {
            return Err(TransformError::InvalidDimensions { width, height });
        }
        debug!(
            from_width = image.width(),
            from_height = image.height(),
            width,
            height,
            "Resizing bitmap"
        );
        Ok(image::imageops::resize(image, width, height, RESIZE_FILTER))
    }

    fn rotate(&self, image: &RgbImage, degrees: u32) -> Result<RgbImage, TransformError> {
        match degrees % 360 {
            0 => Ok(image.clone()),
            90 => Ok(image::imageops::rotate90(image)),
            180 => Ok(image::imageops::rotate180(image)),
            270 => Ok(image::imageops::rotate270(image)),
            other => Err(TransformError::Rotate(format!(
                "unsupported rotation of {} degrees",
                other
            ))),
        }
    }

    fn encode_jpeg(&self, image: &RgbImage, jpeg_quality: u8) -> Result<Vec<u8>, TransformError> {
        let mut buffer = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut buffer);

        // The codec's scale starts at 1; quality 0 maps to its floor
        let jpeg_quality = jpeg_quality.clamp(quality::ENCODER_FLOOR, quality::MAX);
        let mut encoder =
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut cursor, jpeg_quality);

        encoder
            .encode(
                image.as_raw(),
                image.width(),
                image.height(),
                image::ExtendedColorType::Rgb8,
            )
            .map_err(|e| TransformError::Encode(format!("JPEG encoding failed: {}", e)))?;

        Ok(buffer)
    }
}
