// SPDX-License-Identifier: MPL-2.0
//! Viewport geometry and resolution tracking.

pub mod dpi;
pub mod state;

pub use dpi::{watch_device_pixel_ratio, DpiMonitor};
pub use state::{Geometry, ViewportState, ZoomFactor};
