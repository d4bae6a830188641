// SPDX-License-Identifier: GPL-3.0-only

//! Capture request pipeline
//!
//! Turns an accepted preview frame into one JPEG file per output profile:
//!
//! ```text
//! Frame callback → PreviewTrigger → CaptureQueue (1 slot) → CaptureWorker
//!                                                               ↓
//!                          ResultSink ← CaptureReport ← ImageTransformer × profiles
//! ```
//!
//! # Pipeline Stages
//!
//! 1. **Offer**: the frame callback offers a request; it is dropped if one is
//!    already pending, so the callback never blocks
//! 2. **Take**: the worker thread blocks on the queue until a request arrives
//!    or shutdown interrupts it
//! 3. **Transform**: each profile is decoded, scaled, oriented, encoded and
//!    written in turn; a failing profile does not stop the others
//! 4. **Deliver**: the report is handed to the result sink, which posts it to
//!    the owner's context

pub mod queue;
pub mod sink;
pub mod transform;
pub mod trigger;
pub mod worker;

pub use queue::{CaptureQueue, OfferOutcome};
pub use sink::{ChannelSink, PostedSink, ResultSink};
pub use transform::ImageTransformer;
pub use trigger::{FrameDisposition, PreviewTrigger};
pub use worker::{CaptureWorker, WorkerState};

use crate::errors::TransformError;
use crate::media::RawFrame;
use crate::profiles::OutputProfileSet;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

/// Immutable snapshot of one accepted frame and the profiles to apply
#[derive(Debug, Clone)]
pub struct CaptureRequest {
    id: Uuid,
    frame: RawFrame,
    profiles: Arc<OutputProfileSet>,
    accepted_at: DateTime<Local>,
}

impl CaptureRequest {
    pub fn new(frame: RawFrame, profiles: Arc<OutputProfileSet>) -> Self {
        Self {
            id: Uuid::new_v4(),
            frame,
            profiles,
            accepted_at: Local::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn frame(&self) -> &RawFrame {
        &self.frame
    }

    pub fn profiles(&self) -> &OutputProfileSet {
        &self.profiles
    }

    pub fn accepted_at(&self) -> DateTime<Local> {
        self.accepted_at
    }
}

/// One successful output: profile name and absolute file path
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaptureEntry {
    pub name: String,
    pub file: PathBuf,
}

/// Result of applying one profile
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileOutcome {
    pub name: String,
    pub result: Result<PathBuf, TransformError>,
}

/// Everything the worker produced for one request, in profile order
#[derive(Debug, Clone)]
pub struct CaptureReport {
    pub request_id: Uuid,
    pub accepted_at: DateTime<Local>,
    pub completed_at: DateTime<Local>,
    pub outcomes: Vec<ProfileOutcome>,
}

impl CaptureReport {
    /// Successful outputs in profile order; failed profiles are omitted
    pub fn entries(&self) -> Vec<CaptureEntry> {
        self.outcomes
            .iter()
            .filter_map(|outcome| {
                outcome.result.as_ref().ok().map(|file| CaptureEntry {
                    name: outcome.name.clone(),
                    file: file.clone(),
                })
            })
            .collect()
    }

    /// Failed profiles with their errors
    pub fn failures(&self) -> impl Iterator<Item = (&str, &TransformError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.name.as_str(), e)))
    }

    /// True when every profile produced a file
    pub fn is_complete(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.is_ok())
    }

    /// Entries as a JSON array of `{"name", "file"}` objects
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.entries())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> CaptureReport {
        CaptureReport {
            request_id: Uuid::new_v4(),
            accepted_at: Local::now(),
            completed_at: Local::now(),
            outcomes: vec![
                ProfileOutcome {
                    name: "a".into(),
                    result: Ok(PathBuf::from("/c/a.jpg")),
                },
                ProfileOutcome {
                    name: "b".into(),
                    result: Err(TransformError::Encode("boom".into())),
                },
                ProfileOutcome {
                    name: "c".into(),
                    result: Ok(PathBuf::from("/p/c.jpg")),
                },
            ],
        }
    }

    #[test]
    fn test_entries_skip_failures_in_order() {
        let report = report();
        let names: Vec<_> = report.entries().into_iter().map(|e| e.name).collect();
        assert_eq!(names, ["a", "c"]);
        assert!(!report.is_complete());
        assert_eq!(report.failures().count(), 1);
    }

    #[test]
    fn test_report_json() {
        assert_eq!(
            report().to_json().unwrap(),
            r#"[{"name":"a","file":"/c/a.jpg"},{"name":"c","file":"/p/c.jpg"}]"#
        );
    }
}
