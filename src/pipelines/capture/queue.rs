// SPDX-License-Identifier: GPL-3.0-only
//! Single-slot handoff between the frame callback and the capture worker

use super::CaptureRequest;
use crate::errors::QueueError;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Result of offering a request to the queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfferOutcome {
    /// The request is now pending
    Accepted,
    /// Another request was already pending; this one was discarded
    Dropped,
}

/// Bounded queue holding at most one pending request
///
/// `offer` never blocks and never replaces a pending request. `take` blocks
/// until a request arrives or the caller's cancel flag is raised and
/// [`CaptureQueue::interrupt`] is called.
#[derive(Debug, Default)]
pub struct CaptureQueue {
    slot: Mutex<Option<CaptureRequest>>,
    available: Condvar,
    accepted: AtomicU64,
    dropped: AtomicU64,
}

impl CaptureQueue {
    pub fn new() -> Self {
        Self::default()
    }

    // The slot is a plain Option, so a panic while holding it leaves it valid
    fn lock(&self) -> MutexGuard<'_, Option<CaptureRequest>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Offer a request without blocking
    pub fn offer(&self, request: CaptureRequest) -> OfferOutcome {
        let mut slot = self.lock();
        if slot.is_some() {
            let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
            debug!(
                request = %request.id(),
                dropped,
                "Capture request dropped, another one is pending"
            );
            return OfferOutcome::Dropped;
        }

        debug!(request = %request.id(), "Capture request queued");
        *slot = Some(request);
        self.accepted.fetch_add(1, Ordering::Relaxed);
        drop(slot);
        self.available.notify_one();
        OfferOutcome::Accepted
    }

    /// Block until a request is available, removing and returning it
    ///
    /// Returns [`QueueError::Cancelled`] once `cancel` is set; the flag is
    /// checked before the slot so a stopped consumer never takes work.
    pub fn take(&self, cancel: &AtomicBool) -> Result<CaptureRequest, QueueError> {
        let mut slot = self.lock();
        loop {
            if cancel.load(Ordering::Acquire) {
                return Err(QueueError::Cancelled);
            }
            if let Some(request) = slot.take() {
                return Ok(request);
            }
            slot = self
                .available
                .wait(slot)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Remove the pending request without blocking
    pub fn try_take(&self) -> Option<CaptureRequest> {
        self.lock().take()
    }

    /// Discard the pending request, if any, returning it
    pub fn drain(&self) -> Option<CaptureRequest> {
        let drained = self.lock().take();
        if let Some(request) = &drained {
            debug!(request = %request.id(), "Pending capture request discarded");
        }
        drained
    }

    /// Wake every blocked `take` so it can observe its cancel flag
    pub fn interrupt(&self) {
        // Taking the lock orders the waker after any waiter's flag check
        let _slot = self.lock();
        self.available.notify_all();
    }

    /// True when no request is pending
    pub fn is_empty(&self) -> bool {
        self.lock().is_none()
    }

    /// Number of requests accepted so far
    pub fn accepted_count(&self) -> u64 {
        self.accepted.load(Ordering::Relaxed)
    }

    /// Number of requests dropped because the slot was full
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}
