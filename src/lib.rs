// SPDX-License-Identifier: GPL-3.0-only

//! Preview Capture - on-demand capture of camera preview frames
//!
//! A frame accepted from the preview callback is transformed once per
//! output profile (scale, orientation, JPEG quality) and written to the
//! profile's storage root. The resulting `{name, file}` entries are reported
//! back to the owner.
//!
//! # Architecture
//!
//! - [`profiles`]: output profile data model
//! - [`media`]: frame representation and bitmap operations
//! - [`pipelines`]: capture queue, worker, transform and result delivery
//! - [`storage`]: destination roots and file writing
//! - [`config`]: user configuration
//!
//! # Example
//!
//! ```ignore
//! let config = Config::default();
//! let (sink, mut reports) = ChannelSink::channel();
//! let worker = CaptureWorker::from_config(&config, Arc::new(sink));
//! worker.start()?;
//! worker.offer(CaptureRequest::new(frame, Arc::new(config.profile_set())));
//! let report = reports.recv().await;
//! ```

pub mod config;
pub mod constants;
pub mod errors;
pub mod media;
pub mod pipelines;
pub mod profiles;
pub mod storage;

// Re-export commonly used types
pub use config::Config;
pub use errors::{CaptureError, CaptureResult, TransformError};
pub use media::{PlanarFormat, PlanarFrame, RawFrame};
pub use pipelines::capture::{
    CaptureEntry, CaptureQueue, CaptureReport, CaptureRequest, CaptureWorker, ChannelSink,
    ImageTransformer, OfferOutcome, PreviewTrigger, ResultSink,
};
pub use profiles::{Destination, OutputProfile, OutputProfileSet, RotationPolicy};
pub use storage::{DestinationResolver, StorageRoots};
