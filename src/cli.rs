// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands
//!
//! - Capturing a frame file through the worker pipeline
//! - Printing the effective configuration

use preview_capture::{
    CaptureRequest, CaptureWorker, ChannelSink, Config, OfferOutcome, PlanarFormat, PlanarFrame,
    RawFrame,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// How long to wait for the worker to finish one request
const REPORT_TIMEOUT: Duration = Duration::from_secs(120);

/// Run one frame file through every configured profile and print the result
pub fn capture(
    config: &Config,
    input: &Path,
    format: &str,
    width: Option<u32>,
    height: Option<u32>,
) -> Result<(), Box<dyn std::error::Error>> {
    let frame = read_frame(input, format, width, height)?;
    let profiles = Arc::new(config.profile_set());
    if profiles.is_empty() {
        return Err("No output profiles configured".into());
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let (sink, mut reports) = ChannelSink::channel();
    let worker = CaptureWorker::from_config(config, Arc::new(sink));
    worker.start()?;

    if worker.offer(CaptureRequest::new(frame, profiles)) == OfferOutcome::Dropped {
        worker.stop_and_wait();
        return Err("Capture request was dropped".into());
    }

    let report = runtime.block_on(async {
        tokio::time::timeout(REPORT_TIMEOUT, reports.recv()).await
    });
    worker.stop_and_wait();

    let report = match report {
        Ok(Some(report)) => report,
        Ok(None) => return Err("Capture worker exited without a report".into()),
        Err(_) => return Err("Timed out waiting for the capture report".into()),
    };

    for (name, error) in report.failures() {
        eprintln!("Profile '{}' failed: {}", name, error);
    }
    println!("{}", report.to_json()?);

    Ok(())
}

/// Print the effective configuration as JSON
pub fn print_config(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", config.to_json()?);
    Ok(())
}

fn read_frame(
    input: &Path,
    format: &str,
    width: Option<u32>,
    height: Option<u32>,
) -> Result<RawFrame, Box<dyn std::error::Error>> {
    let data = std::fs::read(input)
        .map_err(|e| format!("Failed to read {}: {}", input.display(), e))?;

    if format.eq_ignore_ascii_case("encoded") {
        return Ok(RawFrame::Encoded(Arc::from(data)));
    }

    let planar_format =
        PlanarFormat::from_name(format).ok_or_else(|| format!("Unknown frame format '{}'", format))?;
    let (Some(width), Some(height)) = (width, height) else {
        return Err("--width and --height are required for planar frames".into());
    };

    Ok(RawFrame::Planar(PlanarFrame::new(
        planar_format,
        width,
        height,
        data,
    )))
}
