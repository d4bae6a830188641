// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use image::imageops::FilterType;

/// Extension forced onto every output file name
pub const JPEG_EXTENSION: &str = "jpg";

/// Application name used to namespace the cache and private roots
pub const DEFAULT_APP_NAME: &str = "preview-capture";

/// Folder under the user's pictures directory for public outputs
pub const DEFAULT_PUBLIC_FOLDER: &str = "Camera";

/// Name of the background worker thread
pub const WORKER_THREAD_NAME: &str = "capture-worker";

/// Rotation applied to landscape-shaped buffers, clockwise
pub const ORIENTATION_CORRECTION_DEGREES: u32 = 90;

/// Largest output a profile may ask for, in pixels
pub const MAX_OUTPUT_PIXELS: u64 = 100_000_000;

/// Smoothing filter used when a profile resizes the frame
pub const RESIZE_FILTER: FilterType = FilterType::Triangle;

/// Default tracing filter when RUST_LOG is unset
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// JPEG quality bounds accepted by the encoder
pub mod quality {
    /// Lowest encoder quality
    pub const MIN: u8 = 0;
    /// Highest encoder quality
    pub const MAX: u8 = 100;
    /// Lowest value the JPEG codec itself accepts
    pub const ENCODER_FLOOR: u8 = 1;
}

/// Default output profiles used when no configuration is supplied
pub mod profiles {
    /// Thumbnail profile name
    pub const THUMB_NAME: &str = "thumb";
    /// Thumbnail scale factor
    pub const THUMB_SCALE: f64 = 0.25;
    /// Thumbnail quality
    pub const THUMB_QUALITY: f64 = 0.5;
    /// Full-size profile name
    pub const FULL_NAME: &str = "full";
    /// Full-size scale factor
    pub const FULL_SCALE: f64 = 1.0;
    /// Full-size quality
    pub const FULL_QUALITY: f64 = 0.9;
}
