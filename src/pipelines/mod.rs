// SPDX-License-Identifier: GPL-3.0-only

//! Processing pipelines
//!
//! - [`capture`]: preview frame capture into per-profile JPEG files

pub mod capture;
