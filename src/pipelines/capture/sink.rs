// SPDX-License-Identifier: GPL-3.0-only

//! Result delivery
//!
//! The worker hands each [`CaptureReport`] to a [`ResultSink`]. Sinks must
//! return quickly: the worker thread calls them between requests.

use super::CaptureReport;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Receiver of completed capture reports
pub trait ResultSink: Send + Sync {
    /// Accept one report; must not block the caller
    fn deliver(&self, report: CaptureReport);
}

impl<F> ResultSink for F
where
    F: Fn(CaptureReport) + Send + Sync,
{
    fn deliver(&self, report: CaptureReport) {
        self(report)
    }
}

/// Sends reports into an unbounded tokio channel owned by the caller
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: mpsc::UnboundedSender<CaptureReport>,
}

impl ChannelSink {
    /// Create a sink and the receiver the owner reads reports from
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<CaptureReport>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    pub fn new(sender: mpsc::UnboundedSender<CaptureReport>) -> Self {
        Self { sender }
    }
}

impl ResultSink for ChannelSink {
    fn deliver(&self, report: CaptureReport) {
        let request_id = report.request_id;
        if self.sender.send(report).is_err() {
            warn!(request = %request_id, "Report receiver closed, dropping capture report");
        }
    }
}

/// Posts delivery onto the owner's runtime instead of the worker thread
pub struct PostedSink {
    handle: Handle,
    inner: Arc<dyn ResultSink>,
}

impl PostedSink {
    /// Deliver to `inner` from a task spawned on `handle`
    pub fn new(handle: Handle, inner: Arc<dyn ResultSink>) -> Self {
        Self { handle, inner }
    }

    /// Post onto the runtime the caller is currently running in
    ///
    /// Returns `None` outside of a tokio runtime.
    pub fn on_current(inner: Arc<dyn ResultSink>) -> Option<Self> {
        Handle::try_current().ok().map(|handle| Self::new(handle, inner))
    }
}

impl ResultSink for PostedSink {
    fn deliver(&self, report: CaptureReport) {
        let inner = Arc::clone(&self.inner);
        debug!(request = %report.request_id, "Posting capture report to owner runtime");
        self.handle.spawn(async move {
            inner.deliver(report);
        });
    }
}

impl std::fmt::Debug for PostedSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostedSink").finish_non_exhaustive()
    }
}
