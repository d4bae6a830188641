// SPDX-License-Identifier: GPL-3.0-only

//! Per-profile image transform
//!
//! For each profile the frame is decoded, scaled, oriented, JPEG-encoded and
//! written:
//!
//! 1. **Decode**: planar frames go through a baseline JPEG at the profile's
//!    quality and back (unless disabled); encoded frames are decoded;
//!    bitmaps are used as-is
//! 2. **Scale**: both sides are multiplied by the profile's scale and rounded;
//!    resizing only happens when the size actually changes
//! 3. **Orient**: landscape buffers are rotated 90° clockwise
//! 4. **Encode** at the profile's quality
//! 5. **Write** to `<destination root>/<name>.jpg`, replacing any old file
//!
//! Intermediate bitmaps are dropped as soon as the next stage has its input.

use super::ProfileOutcome;
use crate::constants::ORIENTATION_CORRECTION_DEGREES;
use crate::errors::TransformError;
use crate::media::{ImageBuffer, PlanarFrame, RawFrame};
use crate::profiles::{OutputProfile, OutputProfileSet};
use crate::storage::{self, DestinationResolver};
use image::RgbImage;
use std::borrow::Cow;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Applies output profiles to raw frames
#[derive(Clone)]
pub struct ImageTransformer {
    buffer: Arc<dyn ImageBuffer>,
    resolver: Arc<dyn DestinationResolver>,
    planar_round_trip: bool,
}

impl ImageTransformer {
    pub fn new(buffer: Arc<dyn ImageBuffer>, resolver: Arc<dyn DestinationResolver>) -> Self {
        Self {
            buffer,
            resolver,
            planar_round_trip: true,
        }
    }

    /// Decode planar frames directly instead of through a baseline JPEG
    pub fn with_planar_round_trip(mut self, enabled: bool) -> Self {
        self.planar_round_trip = enabled;
        self
    }

    /// Apply every profile in order; one failure never stops the rest
    pub fn apply_all(&self, frame: &RawFrame, profiles: &OutputProfileSet) -> Vec<ProfileOutcome> {
        profiles
            .iter()
            .map(|profile| {
                let result = self.save(frame, profile);
                if let Err(e) = &result {
                    warn!(profile = %profile.name(), error = %e, "Profile output skipped");
                }
                ProfileOutcome {
                    name: profile.name().to_string(),
                    result,
                }
            })
            .collect()
    }

    /// Run the full transform for one profile and return the written path
    pub fn save(&self, frame: &RawFrame, profile: &OutputProfile) -> Result<PathBuf, TransformError> {
        let encoded = self.encode(frame, profile)?;
        let path = storage::output_path(self.resolver.as_ref(), profile)?;
        storage::write_file(&path, &encoded)?;

        info!(
            profile = %profile.name(),
            path = %path.display(),
            bytes = encoded.len(),
            "Profile output saved"
        );
        Ok(path)
    }

    /// Decode, scale, orient and encode without touching the filesystem
    pub fn encode(&self, frame: &RawFrame, profile: &OutputProfile) -> Result<Vec<u8>, TransformError> {
        let quality = profile.jpeg_quality()?;
        let image = self.render(frame, profile)?;
        self.buffer.encode_jpeg(&image, quality)
    }

    /// Produce the final bitmap for a profile (steps 1-3)
    pub fn render(&self, frame: &RawFrame, profile: &OutputProfile) -> Result<RgbImage, TransformError> {
        profile.validate()?;
        let quality = profile.jpeg_quality()?;

        let source = self.decode(frame, quality)?;
        let (width, height) = source.dimensions();
        let (target_width, target_height) = profile.target_dimensions(width, height)?;

        debug!(
            profile = %profile.name(),
            width,
            height,
            target_width,
            target_height,
            "Transforming frame"
        );

        let scaled = if (target_width, target_height) != (width, height) {
            let resized = self.buffer.resize(&source, target_width, target_height)?;
            drop(source);
            Cow::Owned(resized)
        } else {
            source
        };

        self.orient(scaled)
    }

    fn decode<'a>(&self, frame: &'a RawFrame, quality: u8) -> Result<Cow<'a, RgbImage>, TransformError> {
        match frame {
            RawFrame::Planar(planar) => self.decode_planar(planar, quality).map(Cow::Owned),
            RawFrame::Encoded(data) => self.buffer.decode_encoded(data).map(Cow::Owned),
            RawFrame::Bitmap(image) => Ok(Cow::Borrowed(image.as_ref())),
        }
    }

    fn decode_planar(&self, frame: &PlanarFrame, quality: u8) -> Result<RgbImage, TransformError> {
        let bitmap = self.buffer.decode_planar(frame)?;
        if !self.planar_round_trip {
            return Ok(bitmap);
        }

        let baseline = self.buffer.encode_jpeg(&bitmap, quality)?;
        drop(bitmap);
        self.buffer.decode_encoded(&baseline)
    }

    /// Landscape buffers are rotated to portrait; others are left alone
    fn orient(&self, image: Cow<'_, RgbImage>) -> Result<RgbImage, TransformError> {
        if image.width() > image.height() {
            self.buffer.rotate(&image, ORIENTATION_CORRECTION_DEGREES)
        } else {
            Ok(image.into_owned())
        }
    }
}

impl std::fmt::Debug for ImageTransformer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageTransformer")
            .field("planar_round_trip", &self.planar_round_trip)
            .finish_non_exhaustive()
    }
}
