// SPDX-License-Identifier: GPL-3.0-only

//! Frame-callback side of the pipeline
//!
//! Preview frames arrive continuously; only the first frame after the owner
//! has armed a capture (ready and focused) becomes a request.

use super::queue::OfferOutcome;
use super::worker::CaptureWorker;
use super::CaptureRequest;
use crate::media::RawFrame;
use crate::profiles::OutputProfileSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, warn};

/// What happened to a frame handed to [`PreviewTrigger::on_preview_frame`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameDisposition {
    /// Capture not armed; frame ignored
    Ignored,
    /// Frame became the pending capture request
    Queued,
    /// A request was already pending; frame dropped
    Dropped,
}

/// Gate between the preview callback and the capture worker
pub struct PreviewTrigger {
    worker: Arc<CaptureWorker>,
    profiles: RwLock<Arc<OutputProfileSet>>,
    ready_for_capture: AtomicBool,
    focused: AtomicBool,
}

impl PreviewTrigger {
    pub fn new(worker: Arc<CaptureWorker>, profiles: OutputProfileSet) -> Self {
        Self {
            worker,
            profiles: RwLock::new(Arc::new(profiles)),
            ready_for_capture: AtomicBool::new(false),
            focused: AtomicBool::new(false),
        }
    }

    /// Handle one preview frame without blocking
    ///
    /// When both flags are set they are cleared, the worker is started if
    /// needed and the frame is offered together with a snapshot of the
    /// current profiles.
    pub fn on_preview_frame(&self, frame: RawFrame) -> FrameDisposition {
        if !(self.focused.load(Ordering::Acquire) && self.ready_for_capture.load(Ordering::Acquire))
        {
            return FrameDisposition::Ignored;
        }

        // Only one frame may claim the armed capture
        if !self.ready_for_capture.swap(false, Ordering::AcqRel) {
            return FrameDisposition::Ignored;
        }
        self.focused.store(false, Ordering::Release);

        if !self.worker.is_running()
            && let Err(e) = self.worker.start()
        {
            warn!(error = %e, "Failed to start capture worker");
        }

        let request = CaptureRequest::new(frame, self.profiles());
        debug!(request = %request.id(), "Preview frame accepted for capture");

        match self.worker.offer(request) {
            OfferOutcome::Accepted => FrameDisposition::Queued,
            OfferOutcome::Dropped => FrameDisposition::Dropped,
        }
    }

    /// Arm or disarm the next capture
    pub fn set_ready_for_capture(&self, ready: bool) {
        self.ready_for_capture.store(ready, Ordering::Release);
    }

    /// Report whether the camera is currently focused
    pub fn set_focused(&self, focused: bool) {
        self.focused.store(focused, Ordering::Release);
    }

    /// Replace the profiles used for future captures
    ///
    /// Requests already queued keep the snapshot they were created with.
    pub fn set_profiles(&self, profiles: OutputProfileSet) {
        *self
            .profiles
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Arc::new(profiles);
    }

    /// Snapshot of the current profiles
    pub fn profiles(&self) -> Arc<OutputProfileSet> {
        Arc::clone(&self.profiles.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn worker(&self) -> &Arc<CaptureWorker> {
        &self.worker
    }
}
