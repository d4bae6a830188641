// SPDX-License-Identifier: GPL-3.0-only

//! Frame representation and bitmap operations

pub mod frame;
pub mod image_buffer;
pub mod yuv;

pub use frame::{PlanarFormat, PlanarFrame, RawFrame};
pub use image_buffer::{ImageBuffer, SoftwareImageBuffer};
