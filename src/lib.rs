// SPDX-License-Identifier: MPL-2.0
//! `viewport_sync` keeps a zoomable viewer layer and its input overlays in
//! step, and tells two-finger pinches apart from two-finger scrolls.
//!
//! The viewer layer owns zoom, DPI and workspace size; overlays mirror it
//! through a [`sync::SyncCoordinator`] once they are ready. Touch input goes
//! through a [`gesture::GestureClassifier`], and a [`lock::LockController`]
//! blocks input while the viewer is busy. [`viewer::Viewer`] wires all of it
//! together behind a message/effect API.

#![doc(html_root_url = "https://docs.rs/viewport_sync/0.3.0")]

pub mod config;
pub mod error;
pub mod geometry;
pub mod gesture;
pub mod layer;
pub mod lock;
pub mod sync;
pub mod viewer;
pub mod viewport;

#[cfg(test)]
pub(crate) mod test_utils;
