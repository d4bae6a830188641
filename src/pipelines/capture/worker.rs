// SPDX-License-Identifier: GPL-3.0-only
//! Background capture worker
//!
//! Owns one thread that drains the [`CaptureQueue`], runs every profile of a
//! request through the [`ImageTransformer`] and hands the report to the
//! [`ResultSink`].
//!
//! Lifecycle: `Stopped → Running → Stopping → Stopped`. Stopping is
//! cooperative: `stop()` raises the loop's cancel flag, discards the pending
//! request and wakes a blocked dequeue. A transform that is already running
//! finishes first.
//!
//! ```ignore
//! let worker = CaptureWorker::from_config(&config, Arc::new(sink));
//! worker.start()?;
//! worker.offer(CaptureRequest::new(frame, profiles));
//! // Later
//! worker.stop_and_wait();
//! ```

use super::queue::{CaptureQueue, OfferOutcome};
use super::sink::ResultSink;
use super::transform::ImageTransformer;
use super::{CaptureReport, CaptureRequest};
use crate::config::Config;
use crate::constants::WORKER_THREAD_NAME;
use crate::errors::{CaptureError, CaptureResult, QueueError};
use crate::media::SoftwareImageBuffer;
use chrono::Local;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

/// Worker lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Stopped,
    Running,
    /// Stop requested; the loop thread has not exited yet
    Stopping,
}

struct Lifecycle {
    state: WorkerState,
    /// Bumped on every start so a late-exiting old loop cannot reset a new one
    generation: u64,
    cancel: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
    /// Loops of earlier generations that have not been joined yet
    retired: Vec<JoinHandle<()>>,
}

/// Everything the loop thread needs
struct LoopContext {
    queue: Arc<CaptureQueue>,
    transformer: ImageTransformer,
    sink: Arc<dyn ResultSink>,
    cancel: Arc<AtomicBool>,
}

/// Marks the worker stopped when its loop thread exits, panics included
struct ExitGuard {
    lifecycle: Arc<Mutex<Lifecycle>>,
    generation: u64,
}

impl Drop for ExitGuard {
    fn drop(&mut self) {
        let mut lifecycle = lock(&self.lifecycle);
        if lifecycle.generation == self.generation {
            lifecycle.state = WorkerState::Stopped;
        }
    }
}

fn lock(lifecycle: &Mutex<Lifecycle>) -> MutexGuard<'_, Lifecycle> {
    lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Single background worker for capture requests
pub struct CaptureWorker {
    queue: Arc<CaptureQueue>,
    transformer: ImageTransformer,
    sink: Arc<dyn ResultSink>,
    lifecycle: Arc<Mutex<Lifecycle>>,
}

impl CaptureWorker {
    /// Create a stopped worker with its own queue
    pub fn new(transformer: ImageTransformer, sink: Arc<dyn ResultSink>) -> Self {
        Self::with_queue(Arc::new(CaptureQueue::new()), transformer, sink)
    }

    /// Create a stopped worker draining an existing queue
    pub fn with_queue(
        queue: Arc<CaptureQueue>,
        transformer: ImageTransformer,
        sink: Arc<dyn ResultSink>,
    ) -> Self {
        Self {
            queue,
            transformer,
            sink,
            lifecycle: Arc::new(Mutex::new(Lifecycle {
                state: WorkerState::Stopped,
                generation: 0,
                cancel: Arc::new(AtomicBool::new(false)),
                thread: None,
                retired: Vec::new(),
            })),
        }
    }

    /// Software image backend with storage roots taken from `config`
    pub fn from_config(config: &Config, sink: Arc<dyn ResultSink>) -> Self {
        let transformer = ImageTransformer::new(
            Arc::new(SoftwareImageBuffer::new()),
            Arc::new(config.storage_roots()),
        )
        .with_planar_round_trip(config.planar_round_trip);
        Self::new(transformer, sink)
    }

    /// Queue this worker drains
    pub fn queue(&self) -> Arc<CaptureQueue> {
        Arc::clone(&self.queue)
    }

    /// Offer a request without blocking
    pub fn offer(&self, request: CaptureRequest) -> OfferOutcome {
        self.queue.offer(request)
    }

    /// Current lifecycle state
    pub fn state(&self) -> WorkerState {
        lock(&self.lifecycle).state
    }

    /// True between `start()` and `stop()`
    pub fn is_running(&self) -> bool {
        self.state() == WorkerState::Running
    }

    /// Spawn the processing loop; does nothing if already running
    pub fn start(&self) -> CaptureResult<()> {
        let mut lifecycle = lock(&self.lifecycle);
        if lifecycle.state == WorkerState::Running {
            debug!("Capture worker already running");
            return Ok(());
        }

        let generation = lifecycle.generation + 1;
        let cancel = Arc::new(AtomicBool::new(false));
        let context = LoopContext {
            queue: Arc::clone(&self.queue),
            transformer: self.transformer.clone(),
            sink: Arc::clone(&self.sink),
            cancel: Arc::clone(&cancel),
        };
        let shared = Arc::clone(&self.lifecycle);

        let thread = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || {
                let _guard = ExitGuard {
                    lifecycle: shared,
                    generation,
                };
                run_loop(context);
            })
            .map_err(|e| CaptureError::Worker(format!("Spawn capture worker: {}", e)))?;

        // A previous loop still winding down keeps its own cancel flag and exits alone
        lifecycle.retired.retain(|handle| !handle.is_finished());
        if let Some(previous) = lifecycle.thread.replace(thread) {
            lifecycle.retired.push(previous);
        }
        lifecycle.generation = generation;
        lifecycle.cancel = cancel;
        lifecycle.state = WorkerState::Running;

        info!(generation, "Capture worker started");
        Ok(())
    }

    /// Request shutdown without waiting for the loop thread
    ///
    /// The pending request, if any, is discarded and never processed, even
    /// when the worker was not running.
    pub fn stop(&self) {
        let was_running = {
            let mut lifecycle = lock(&self.lifecycle);
            let was_running = lifecycle.state == WorkerState::Running;
            if was_running {
                lifecycle.state = WorkerState::Stopping;
                lifecycle.cancel.store(true, Ordering::Release);
            }
            was_running
        };

        self.queue.drain();
        self.queue.interrupt();
        if was_running {
            info!("Capture worker stopping");
        }
    }

    /// Stop and wait for the loop thread, and any earlier loop still
    /// winding down, to exit
    pub fn stop_and_wait(&self) {
        self.stop();
        let handles: Vec<_> = {
            let mut lifecycle = lock(&self.lifecycle);
            let current = lifecycle.thread.take();
            lifecycle.retired.drain(..).chain(current).collect()
        };
        for handle in handles {
            debug!("Waiting for capture worker thread to finish");
            if let Err(e) = handle.join() {
                warn!("Capture worker thread panicked: {:?}", e);
            }
        }
    }
}

impl Drop for CaptureWorker {
    fn drop(&mut self) {
        let has_threads = {
            let lifecycle = lock(&self.lifecycle);
            lifecycle.thread.is_some() || !lifecycle.retired.is_empty()
        };
        if has_threads {
            debug!("CaptureWorker dropped, stopping loop");
            self.stop_and_wait();
        }
    }
}

impl std::fmt::Debug for CaptureWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureWorker")
            .field("state", &self.state())
            .field("queue", &self.queue)
            .finish_non_exhaustive()
    }
}

fn run_loop(context: LoopContext) {
    debug!("Capture worker loop started");

    loop {
        if context.cancel.load(Ordering::Acquire) {
            debug!("Stop signal received");
            break;
        }

        let request = match context.queue.take(&context.cancel) {
            Ok(request) => request,
            Err(QueueError::Cancelled) => {
                debug!("Dequeue interrupted by shutdown");
                break;
            }
        };

        let report = process(&context.transformer, request);
        context.sink.deliver(report);
    }

    info!("Capture worker loop exiting");
}

/// Apply every profile of `request`; the request is released on return
fn process(transformer: &ImageTransformer, request: CaptureRequest) -> CaptureReport {
    debug!(
        request = %request.id(),
        frame = request.frame().kind(),
        profiles = request.profiles().len(),
        "Processing capture request"
    );

    let outcomes = transformer.apply_all(request.frame(), request.profiles());
    let report = CaptureReport {
        request_id: request.id(),
        accepted_at: request.accepted_at(),
        completed_at: Local::now(),
        outcomes,
    };

    info!(
        request = %report.request_id,
        saved = report.entries().len(),
        failed = report.failures().count(),
        "Capture request complete"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::RawFrame;
    use crate::profiles::{OutputProfile, OutputProfileSet};
    use crate::storage::StorageRoots;
    use image::RgbImage;
    use std::sync::{Barrier, mpsc};
    use std::time::Duration;

    fn worker(dir: &std::path::Path) -> (CaptureWorker, mpsc::Receiver<CaptureReport>) {
        let (tx, rx) = mpsc::channel();
        let sink = move |report: CaptureReport| {
            let _ = tx.send(report);
        };
        let transformer = ImageTransformer::new(
            Arc::new(SoftwareImageBuffer::new()),
            Arc::new(StorageRoots::under(dir)),
        );
        (CaptureWorker::new(transformer, Arc::new(sink)), rx)
    }

    fn request(names: &[&str]) -> CaptureRequest {
        let profiles: OutputProfileSet = names.iter().map(|n| OutputProfile::named(*n)).collect();
        CaptureRequest::new(RawFrame::from(RgbImage::new(12, 16)), Arc::new(profiles))
    }

    #[test]
    fn test_state_transitions() {
        let dir = tempfile::tempdir().unwrap();
        let (worker, _rx) = worker(dir.path());
        assert_eq!(worker.state(), WorkerState::Stopped);

        worker.start().unwrap();
        assert!(worker.is_running());

        worker.stop();
        assert!(!worker.is_running());

        worker.stop_and_wait();
        assert_eq!(worker.state(), WorkerState::Stopped);
    }

    #[test]
    fn test_processes_request() {
        let dir = tempfile::tempdir().unwrap();
        let (worker, rx) = worker(dir.path());
        worker.start().unwrap();

        assert_eq!(worker.offer(request(&["one", "two"])), OfferOutcome::Accepted);
        let report = rx.recv_timeout(Duration::from_secs(10)).unwrap();
        let names: Vec<_> = report.entries().into_iter().map(|e| e.name).collect();
        assert_eq!(names, ["one", "two"]);

        worker.stop_and_wait();
    }

    #[test]
    fn test_idempotent_start() {
        let dir = tempfile::tempdir().unwrap();
        let (worker, rx) = worker(dir.path());
        worker.start().unwrap();
        worker.start().unwrap();

        worker.offer(request(&["only"]));
        assert!(rx.recv_timeout(Duration::from_secs(10)).is_ok());
        // A second loop would have nothing to duplicate, but must not exist either
        assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());

        worker.stop_and_wait();
    }

    #[test]
    fn test_stop_discards_pending() {
        let dir = tempfile::tempdir().unwrap();
        let (worker, rx) = worker(dir.path());

        // Queued but never taken
        worker.offer(request(&["late"]));
        worker.stop();
        assert!(worker.queue().is_empty());

        worker.start().unwrap();
        assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
        worker.stop_and_wait();
    }

    #[test]
    fn test_restart_while_stopping() {
        let dir = tempfile::tempdir().unwrap();
        let (tx, rx) = mpsc::channel();
        let gate = Arc::new(Barrier::new(2));
        let first_delivery = Arc::new(AtomicBool::new(true));
        let sink = {
            let gate = Arc::clone(&gate);
            move |report: CaptureReport| {
                // Only the first report is held at the gate
                if first_delivery.swap(false, Ordering::AcqRel) {
                    gate.wait();
                }
                let _ = tx.send(report.request_id);
            }
        };
        let transformer = ImageTransformer::new(
            Arc::new(SoftwareImageBuffer::new()),
            Arc::new(StorageRoots::under(dir.path())),
        );
        let worker = CaptureWorker::new(transformer, Arc::new(sink));
        worker.start().unwrap();

        let held = request(&["held"]);
        let held_id = held.id();
        worker.offer(held);
        while !worker.queue().is_empty() {
            thread::sleep(Duration::from_millis(5));
        }

        // Old loop is parked in the sink while a new generation starts
        worker.stop();
        assert_eq!(worker.state(), WorkerState::Stopping);
        worker.start().unwrap();
        assert!(worker.is_running());

        gate.wait();
        assert_eq!(rx.recv_timeout(Duration::from_secs(10)).unwrap(), held_id);

        // Give the old loop time to exit; its guard must not touch the new state
        thread::sleep(Duration::from_millis(100));
        assert!(worker.is_running());

        let next = request(&["next"]);
        let next_id = next.id();
        worker.offer(next);
        assert_eq!(rx.recv_timeout(Duration::from_secs(10)).unwrap(), next_id);

        worker.stop_and_wait();
        assert_eq!(worker.state(), WorkerState::Stopped);
        assert!(lock(&worker.lifecycle).retired.is_empty());
    }

    #[test]
    fn test_stop_and_wait_joins_retired_loop() {
        let dir = tempfile::tempdir().unwrap();
        let (tx, rx) = mpsc::channel();
        let gate = Arc::new(Barrier::new(2));
        let sink = {
            let gate = Arc::clone(&gate);
            move |report: CaptureReport| {
                gate.wait();
                let _ = tx.send(report.request_id);
            }
        };
        let transformer = ImageTransformer::new(
            Arc::new(SoftwareImageBuffer::new()),
            Arc::new(StorageRoots::under(dir.path())),
        );
        let worker = Arc::new(CaptureWorker::new(transformer, Arc::new(sink)));
        worker.start().unwrap();

        worker.offer(request(&["slow"]));
        while !worker.queue().is_empty() {
            thread::sleep(Duration::from_millis(5));
        }
        worker.stop();
        worker.start().unwrap();
        assert_eq!(lock(&worker.lifecycle).retired.len(), 1);

        let waiter = {
            let worker = Arc::clone(&worker);
            thread::spawn(move || worker.stop_and_wait())
        };
        // The retired loop is still parked, so the waiter cannot have returned
        thread::sleep(Duration::from_millis(100));
        assert!(!waiter.is_finished());

        gate.wait();
        waiter.join().unwrap();
        assert!(rx.try_recv().is_ok());
        assert_eq!(worker.state(), WorkerState::Stopped);
    }

    #[test]
    fn test_restart_after_stop() {
        let dir = tempfile::tempdir().unwrap();
        let (worker, rx) = worker(dir.path());
        worker.start().unwrap();
        worker.stop_and_wait();

        worker.start().unwrap();
        assert!(worker.is_running());
        worker.offer(request(&["again"]));
        assert!(rx.recv_timeout(Duration::from_secs(10)).is_ok());
        worker.stop_and_wait();
    }
}
