// SPDX-License-Identifier: GPL-3.0-only

//! Raw frame representation handed over by the frame source

use crate::errors::TransformError;
use image::RgbImage;
use std::sync::Arc;

/// Layout of a planar 4:2:0 luma/chroma buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlanarFormat {
    /// Y plane followed by interleaved V/U (camera preview default)
    Nv21,
    /// Y plane followed by interleaved U/V
    Nv12,
    /// Y plane, then U plane, then V plane
    I420,
}

impl PlanarFormat {
    /// Parse a format name such as `"nv21"`, case-insensitive
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "nv21" => Some(PlanarFormat::Nv21),
            "nv12" => Some(PlanarFormat::Nv12),
            "i420" | "yuv420p" => Some(PlanarFormat::I420),
            _ => None,
        }
    }
}

/// Planar frame with its sensor dimensions
#[derive(Clone)]
pub struct PlanarFrame {
    pub format: PlanarFormat,
    pub width: u32,
    pub height: u32,
    pub data: Arc<[u8]>,
}

impl PlanarFrame {
    pub fn new(format: PlanarFormat, width: u32, height: u32, data: impl Into<Arc<[u8]>>) -> Self {
        Self {
            format,
            width,
            height,
            data: data.into(),
        }
    }

    /// Width and height of each chroma plane (rounded up)
    pub fn chroma_dimensions(&self) -> (usize, usize) {
        (
            (self.width as usize).div_ceil(2),
            (self.height as usize).div_ceil(2),
        )
    }

    /// Minimum number of bytes for a frame of this size
    pub fn expected_len(&self) -> usize {
        let (chroma_width, chroma_height) = self.chroma_dimensions();
        self.width as usize * self.height as usize + 2 * chroma_width * chroma_height
    }

    /// Check dimensions and buffer length
    pub fn validate(&self) -> Result<(), TransformError> {
        if self.width == 0 || self.height == 0 {
            return Err(TransformError::Decode(format!(
                "frame has zero size {}x{}",
                self.width, self.height
            )));
        }
        let expected = self.expected_len();
        if self.data.len() < expected {
            return Err(TransformError::Decode(format!(
                "{:?} data too small for {}x{}: expected {}, got {}",
                self.format,
                self.width,
                self.height,
                expected,
                self.data.len()
            )));
        }
        Ok(())
    }
}

impl std::fmt::Debug for PlanarFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlanarFrame")
            .field("format", &self.format)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("data", &format_args!("{} bytes", self.data.len()))
            .finish()
    }
}

/// Frame data as delivered by the frame source
#[derive(Clone)]
pub enum RawFrame {
    /// Planar luma/chroma bytes from a preview callback
    Planar(PlanarFrame),
    /// Compressed image bytes (JPEG, PNG, ...)
    Encoded(Arc<[u8]>),
    /// Already decoded RGB bitmap
    Bitmap(Arc<RgbImage>),
}

impl RawFrame {
    /// Source dimensions when known without decoding
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        match self {
            RawFrame::Planar(frame) => Some((frame.width, frame.height)),
            RawFrame::Encoded(_) => None,
            RawFrame::Bitmap(image) => Some(image.dimensions()),
        }
    }

    /// Short label for logging
    pub fn kind(&self) -> &'static str {
        match self {
            RawFrame::Planar(_) => "planar",
            RawFrame::Encoded(_) => "encoded",
            RawFrame::Bitmap(_) => "bitmap",
        }
    }
}

impl std::fmt::Debug for RawFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RawFrame::Planar(frame) => write!(f, "RawFrame::Planar({:?})", frame),
            RawFrame::Encoded(data) => write!(f, "RawFrame::Encoded({} bytes)", data.len()),
            RawFrame::Bitmap(image) => {
                write!(f, "RawFrame::Bitmap({}x{})", image.width(), image.height())
            }
        }
    }
}

impl From<PlanarFrame> for RawFrame {
    fn from(frame: PlanarFrame) -> Self {
        RawFrame::Planar(frame)
    }
}

impl From<RgbImage> for RawFrame {
    fn from(image: RgbImage) -> Self {
        RawFrame::Bitmap(Arc::new(image))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expected_len_even() {
        let frame = PlanarFrame::new(PlanarFormat::Nv21, 640, 480, vec![0u8; 10]);
        assert_eq!(frame.expected_len(), 640 * 480 * 3 / 2);
    }

    #[test]
    fn test_expected_len_odd() {
        let frame = PlanarFrame::new(PlanarFormat::I420, 3, 3, vec![0u8; 17]);
        // 9 luma + 2 * (2 * 2) chroma
        assert_eq!(frame.expected_len(), 17);
        assert!(frame.validate().is_ok());
    }

    #[test]
    fn test_validate_short_buffer() {
        let frame = PlanarFrame::new(PlanarFormat::Nv12, 4, 4, vec![0u8; 20]);
        assert!(matches!(frame.validate(), Err(TransformError::Decode(_))));
    }

    #[test]
    fn test_format_from_name() {
        assert_eq!(PlanarFormat::from_name("NV21"), Some(PlanarFormat::Nv21));
        assert_eq!(PlanarFormat::from_name("yuv420p"), Some(PlanarFormat::I420));
        assert_eq!(PlanarFormat::from_name("rgb"), None);
    }
}
