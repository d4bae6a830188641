// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the capture pipeline

use std::fmt;
use std::path::PathBuf;

/// Result type alias using CaptureError
pub type CaptureResult<T> = Result<T, CaptureError>;

/// Crate-level error type
#[derive(Debug, Clone)]
pub enum CaptureError {
    /// Configuration could not be read or parsed
    Config(String),
    /// Storage root missing or unusable
    Storage(String),
    /// Worker lifecycle errors (thread spawn, poisoned state)
    Worker(String),
    /// A single-profile transform failure surfaced outside the worker
    Transform(TransformError),
}

/// Failure while turning one frame into one profile's output file
#[derive(Debug, Clone, PartialEq)]
pub enum TransformError {
    /// Profile has an unusable field (empty name, bad scale, NaN quality)
    InvalidProfile(String),
    /// Scaled output would have a zero dimension
    InvalidDimensions { width: u32, height: u32 },
    /// Raw frame could not be decoded into a bitmap
    Decode(String),
    /// Resize step failed
    Resize(String),
    /// Rotation step failed
    Rotate(String),
    /// JPEG encoding failed
    Encode(String),
    /// No storage root is configured for the profile's destination
    NoDestination(String),
    /// Writing the output file failed
    Write { path: PathBuf, reason: String },
}

/// Errors returned by a blocking dequeue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    /// The waiting consumer was interrupted by shutdown
    Cancelled,
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CaptureError::Storage(msg) => write!(f, "Storage error: {}", msg),
            CaptureError::Worker(msg) => write!(f, "Worker error: {}", msg),
            CaptureError::Transform(e) => write!(f, "Transform error: {}", e),
        }
    }
}

impl fmt::Display for TransformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransformError::InvalidProfile(msg) => write!(f, "Invalid profile: {}", msg),
            TransformError::InvalidDimensions { width, height } => {
                write!(f, "Invalid output dimensions {}x{}", width, height)
            }
            TransformError::Decode(msg) => write!(f, "Decode failed: {}", msg),
            TransformError::Resize(msg) => write!(f, "Resize failed: {}", msg),
            TransformError::Rotate(msg) => write!(f, "Rotation failed: {}", msg),
            TransformError::Encode(msg) => write!(f, "Encoding failed: {}", msg),
            TransformError::NoDestination(msg) => write!(f, "No destination: {}", msg),
            TransformError::Write { path, reason } => {
                write!(f, "Write to {} failed: {}", path.display(), reason)
            }
        }
    }
}

impl fmt::Display for QueueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueueError::Cancelled => write!(f, "Dequeue cancelled by shutdown"),
        }
    }
}

impl std::error::Error for CaptureError {}
impl std::error::Error for TransformError {}
impl std::error::Error for QueueError {}

impl From<TransformError> for CaptureError {
    fn from(err: TransformError) -> Self {
        CaptureError::Transform(err)
    }
}

impl From<std::io::Error> for CaptureError {
    fn from(err: std::io::Error) -> Self {
        CaptureError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for CaptureError {
    fn from(err: serde_json::Error) -> Self {
        CaptureError::Config(err.to_string())
    }
}

impl From<image::ImageError> for TransformError {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::Decoding(e) => TransformError::Decode(e.to_string()),
            image::ImageError::Encoding(e) => TransformError::Encode(e.to_string()),
            other => TransformError::Encode(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform_error_display() {
        let err = TransformError::InvalidDimensions {
            width: 0,
            height: 12,
        };
        assert_eq!(err.to_string(), "Invalid output dimensions 0x12");

        let err = TransformError::Write {
            path: PathBuf::from("/tmp/a.jpg"),
            reason: "denied".to_string(),
        };
        assert_eq!(err.to_string(), "Write to /tmp/a.jpg failed: denied");
    }

    #[test]
    fn test_capture_error_from_transform() {
        let err: CaptureError = TransformError::Decode("bad".into()).into();
        assert_eq!(err.to_string(), "Transform error: Decode failed: bad");
    }
}
