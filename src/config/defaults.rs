// SPDX-License-Identifier: MPL-2.0
//! Centralized default values for all configuration constants.
//!
//! This module serves as the single source of truth for default values
//! used across the crate. Constants are organized by category.
//!
//! # Categories
//!
//! - **Zoom**: Zoom factor bounds
//! - **Resolution**: DPI and device pixel ratio
//! - **Gesture**: Pinch/pan classification thresholds
//! - **Timers**: Press guard and DPI polling intervals

// ==========================================================================
// Zoom Defaults
// ==========================================================================

/// Default zoom factor when a layer is created (1.0 = workspace units at nominal DPI).
pub const DEFAULT_ZOOM: f64 = 1.0;

/// Minimum allowed zoom factor. Invalid zoom input collapses to this value.
pub const MIN_ZOOM: f64 = 0.05;

/// Multiplier applied by a single zoom in/out step.
pub const DEFAULT_ZOOM_STEP_FACTOR: f64 = 1.25;

// ==========================================================================
// Resolution Defaults
// ==========================================================================

/// Default horizontal and vertical screen DPI.
pub const DEFAULT_DPI: f64 = 96.0;

/// Default device pixel ratio (physical pixels per CSS pixel).
pub const DEFAULT_DEVICE_PIXEL_RATIO: f64 = 1.0;

/// Logical workspace units per inch.
pub const POINTS_PER_INCH: f64 = 72.0;

/// Default workspace width in logical units (A4 portrait, points).
pub const DEFAULT_WORKSPACE_WIDTH: f64 = 595.0;

/// Default workspace height in logical units (A4 portrait, points).
pub const DEFAULT_WORKSPACE_HEIGHT: f64 = 842.0;

// ==========================================================================
// Gesture Defaults
// ==========================================================================

/// Minimum angle (degrees) between the two touch rays for a pinch.
pub const PINCH_MIN_ANGLE_DEG: f32 = 160.0;

/// Framework scale at or below which fingers count as closing in.
pub const PINCH_SHRINK_SCALE: f32 = 0.85;

/// Framework scale at or above which fingers count as spreading out.
pub const PINCH_GROW_SCALE: f32 = 1.3;

/// Elapsed gesture time (ms) after which the classification is committed.
pub const CLASSIFY_AFTER_MS: u64 = 350;

// ==========================================================================
// Timer Defaults
// ==========================================================================

/// How long (ms) a single-pointer press is held back waiting for a second touch.
pub const PRESS_GUARD_MS: u64 = 100;

/// Interval (ms) between device pixel ratio samples.
pub const DPI_POLL_INTERVAL_MS: u64 = 1000;

// ==========================================================================
// Compile-time Validation
// ==========================================================================

const _: () = {
    // Zoom validation
    assert!(MIN_ZOOM > 0.0);
    assert!(MIN_ZOOM < DEFAULT_ZOOM);
    assert!(DEFAULT_ZOOM_STEP_FACTOR > 1.0);

    // Resolution validation
    assert!(DEFAULT_DPI > 0.0);
    assert!(DEFAULT_DEVICE_PIXEL_RATIO > 0.0);
    assert!(POINTS_PER_INCH > 0.0);
    assert!(DEFAULT_WORKSPACE_WIDTH > 0.0);
    assert!(DEFAULT_WORKSPACE_HEIGHT > 0.0);

    // Gesture validation
    assert!(PINCH_MIN_ANGLE_DEG > 0.0);
    assert!(PINCH_MIN_ANGLE_DEG <= 180.0);
    assert!(PINCH_SHRINK_SCALE < 1.0);
    assert!(PINCH_GROW_SCALE > 1.0);
    assert!(CLASSIFY_AFTER_MS > 0);

    // Timer validation
    assert!(PRESS_GUARD_MS > 0);
    assert!(PRESS_GUARD_MS < CLASSIFY_AFTER_MS);
    assert!(DPI_POLL_INTERVAL_MS > 0);
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zoom_defaults_are_valid() {
        assert_eq!(DEFAULT_ZOOM, 1.0);
        assert!(MIN_ZOOM < DEFAULT_ZOOM);
    }

    #[test]
    fn default_resolution_scales_above_one() {
        // 96 dpi on a 1x display maps one point to 4/3 pixels.
        let scale = DEFAULT_DPI / DEFAULT_DEVICE_PIXEL_RATIO / POINTS_PER_INCH;
        assert!(scale > 1.0);
    }

    #[test]
    fn pinch_scale_band_excludes_identity() {
        assert!(PINCH_SHRINK_SCALE < 1.0 && 1.0 < PINCH_GROW_SCALE);
    }
}
