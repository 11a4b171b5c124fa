// SPDX-License-Identifier: MPL-2.0
//! This module handles the crate's configuration, including loading and saving
//! gesture and viewport tuning to a `settings.toml` file.
//!
//! # Examples
//!
//! ```no_run
//! use viewport_sync::config::{self, Config, PinchRule};
//! use std::path::PathBuf;
//!
//! // Load existing configuration
//! let mut config = config::load().unwrap_or_default();
//!
//! // Relax the pinch test for touch browsers that report noisy angles
//! config.gesture.pinch_rule = PinchRule::Lenient;
//!
//! // Save the modified configuration
//! config::save(&config).expect("Failed to save config");
//!
//! // To load/save from a specific path (e.g., for testing)
//! let temp_file = PathBuf::from("./temp_config_dir/test_settings.toml");
//! config::save_to_path(&config, &temp_file).expect("Failed to save to path");
//! let loaded = config::load_from_path(&temp_file).expect("Failed to load from path");
//! assert_eq!(loaded.gesture.pinch_rule, PinchRule::Lenient);
//! std::fs::remove_dir_all("./temp_config_dir").unwrap();
//! ```

mod defaults;

pub use defaults::*;

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_FILE: &str = "settings.toml";
const APP_NAME: &str = "ViewportSync";

/// Keeps `value` when `valid` accepts it, otherwise logs and falls back, so
/// a hand-edited settings file cannot request nonsensical thresholds.
fn checked<T: Copy + fmt::Debug>(
    field: &str,
    value: T,
    fallback: T,
    valid: impl Fn(T) -> bool,
) -> T {
    if valid(value) {
        value
    } else {
        tracing::warn!(
            field,
            value = ?value,
            fallback = ?fallback,
            "setting out of range, using default"
        );
        fallback
    }
}

/// Which angle test decides a pinch.
///
/// `Strict` requires the rays to be opposed *and* the scale to have moved
/// out of the neutral band. `Lenient` accepts either condition, for touch
/// stacks whose reported finger positions jitter too much for the angle alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PinchRule {
    #[default]
    Strict,
    Lenient,
}

/// Thresholds used by the gesture classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureSettings {
    pub pinch_rule: PinchRule,
    pub min_angle_deg: f32,
    pub shrink_scale: f32,
    pub grow_scale: f32,
    pub classify_after_ms: u64,
    pub press_guard_ms: u64,
}

impl Default for GestureSettings {
    fn default() -> Self {
        Self {
            pinch_rule: PinchRule::default(),
            min_angle_deg: PINCH_MIN_ANGLE_DEG,
            shrink_scale: PINCH_SHRINK_SCALE,
            grow_scale: PINCH_GROW_SCALE,
            classify_after_ms: CLASSIFY_AFTER_MS,
            press_guard_ms: PRESS_GUARD_MS,
        }
    }
}

impl GestureSettings {
    #[must_use]
    pub fn classify_after(&self) -> Duration {
        Duration::from_millis(self.classify_after_ms)
    }

    #[must_use]
    pub fn press_guard(&self) -> Duration {
        Duration::from_millis(self.press_guard_ms)
    }

    /// Replaces out-of-range thresholds with their defaults.
    #[must_use]
    pub fn sanitized(self) -> Self {
        Self {
            pinch_rule: self.pinch_rule,
            min_angle_deg: checked(
                "gesture.min_angle_deg",
                self.min_angle_deg,
                PINCH_MIN_ANGLE_DEG,
                |v| v > 0.0 && v <= 180.0,
            ),
            shrink_scale: checked(
                "gesture.shrink_scale",
                self.shrink_scale,
                PINCH_SHRINK_SCALE,
                |v| v > 0.0 && v < 1.0,
            ),
            grow_scale: checked(
                "gesture.grow_scale",
                self.grow_scale,
                PINCH_GROW_SCALE,
                |v| v.is_finite() && v > 1.0,
            ),
            classify_after_ms: checked(
                "gesture.classify_after_ms",
                self.classify_after_ms,
                CLASSIFY_AFTER_MS,
                |v| v > 0,
            ),
            press_guard_ms: self.press_guard_ms,
        }
    }
}

/// Zoom bounds and polling intervals for viewport layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportSettings {
    pub min_zoom: f64,
    pub zoom_step_factor: f64,
    pub dpi_poll_interval_ms: u64,
}

impl Default for ViewportSettings {
    fn default() -> Self {
        Self {
            min_zoom: MIN_ZOOM,
            zoom_step_factor: DEFAULT_ZOOM_STEP_FACTOR,
            dpi_poll_interval_ms: DPI_POLL_INTERVAL_MS,
        }
    }
}

impl ViewportSettings {
    /// Interval between device pixel ratio samples. Zero means the default.
    #[must_use]
    pub fn dpi_poll_interval(&self) -> Duration {
        match self.dpi_poll_interval_ms {
            0 => Duration::from_millis(DPI_POLL_INTERVAL_MS),
            ms => Duration::from_millis(ms),
        }
    }

    /// Replaces out-of-range bounds with their defaults.
    #[must_use]
    pub fn sanitized(self) -> Self {
        Self {
            min_zoom: checked("viewport.min_zoom", self.min_zoom, MIN_ZOOM, |v| {
                v.is_finite() && v > 0.0
            }),
            zoom_step_factor: checked(
                "viewport.zoom_step_factor",
                self.zoom_step_factor,
                DEFAULT_ZOOM_STEP_FACTOR,
                |v| v.is_finite() && v > 1.0,
            ),
            dpi_poll_interval_ms: checked(
                "viewport.dpi_poll_interval_ms",
                self.dpi_poll_interval_ms,
                DPI_POLL_INTERVAL_MS,
                |v| v > 0,
            ),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub gesture: GestureSettings,
    pub viewport: ViewportSettings,
}

impl Config {
    /// Replaces every out-of-range value with its default.
    #[must_use]
    pub fn sanitized(self) -> Self {
        Self {
            gesture: self.gesture.sanitized(),
            viewport: self.viewport.sanitized(),
        }
    }
}

fn get_default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|mut path| {
        path.push(APP_NAME);
        path.push(CONFIG_FILE);
        path
    })
}

pub fn load() -> Result<Config> {
    if let Some(path) = get_default_config_path() {
        if path.exists() {
            return load_from_path(&path);
        }
    }
    Ok(Config::default())
}

pub fn save(config: &Config) -> Result<()> {
    if let Some(path) = get_default_config_path() {
        return save_to_path(config, &path);
    }
    Ok(())
}

/// Loads a configuration file. Unparsable content falls back to defaults,
/// and out-of-range values are replaced individually.
pub fn load_from_path(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)?;
    match toml::from_str::<Config>(&content) {
        Ok(config) => Ok(config.sanitized()),
        Err(err) => {
            tracing::warn!(
                path = %path.display(),
                error = %err,
                "invalid settings, using defaults"
            );
            Ok(Config::default())
        }
    }
}

pub fn save_to_path(config: &Config, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)?;
    fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn save_and_load_round_trip_preserves_rule() {
        let mut config = Config::default();
        config.gesture.pinch_rule = PinchRule::Lenient;
        config.viewport.min_zoom = 0.25;
        let temp_dir = tempdir().expect("failed to create temp dir");
        let config_path = temp_dir.path().join("nested").join("settings.toml");

        save_to_path(&config, &config_path).expect("failed to save config");
        let loaded = load_from_path(&config_path).expect("failed to load config");

        assert_eq!(loaded, config);
    }

    #[test]
    fn load_from_path_returns_default_on_invalid_toml() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let config_path = temp_dir.path().join("settings.toml");
        fs::write(&config_path, "not = valid = toml").expect("failed to write invalid toml");

        let loaded = load_from_path(&config_path).expect("load should not error");
        assert_eq!(loaded, Config::default());
    }

    #[test]
    fn missing_tables_are_filled_with_defaults() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let config_path = temp_dir.path().join("settings.toml");
        fs::write(&config_path, "[gesture]\nmin_angle_deg = 150.0\n")
            .expect("failed to write partial toml");

        let loaded = load_from_path(&config_path).expect("load should not error");
        assert_eq!(loaded.gesture.min_angle_deg, 150.0);
        assert_eq!(loaded.gesture.classify_after_ms, CLASSIFY_AFTER_MS);
        assert_eq!(loaded.viewport, ViewportSettings::default());
    }

    #[test]
    fn load_from_missing_path_is_an_io_error() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let result = load_from_path(&temp_dir.path().join("absent.toml"));
        assert!(matches!(result, Err(crate::error::Error::Io(_))));
    }

    #[test]
    fn out_of_range_values_fall_back_to_defaults() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let config_path = temp_dir.path().join("settings.toml");
        fs::write(
            &config_path,
            "[viewport]\nmin_zoom = -2.0\nzoom_step_factor = 0.5\ndpi_poll_interval_ms = 0\n\
             [gesture]\nmin_angle_deg = 270.0\nshrink_scale = 1.5\ngrow_scale = 0.9\n\
             classify_after_ms = 0\n",
        )
        .expect("failed to write toml");

        let loaded = load_from_path(&config_path).expect("load should not error");
        assert_eq!(loaded, Config::default());
    }

    #[test]
    fn sanitized_keeps_valid_values() {
        let mut config = Config::default();
        config.viewport.min_zoom = 0.2;
        config.viewport.zoom_step_factor = 2.0;
        config.gesture.min_angle_deg = 150.0;
        config.gesture.press_guard_ms = 0;

        assert_eq!(config.clone().sanitized(), config);
    }

    #[test]
    fn nan_minimum_zoom_is_replaced() {
        let settings = ViewportSettings {
            min_zoom: f64::NAN,
            ..ViewportSettings::default()
        };
        assert_eq!(settings.sanitized().min_zoom, MIN_ZOOM);
    }

    #[test]
    fn zero_poll_interval_uses_default() {
        let settings = ViewportSettings {
            dpi_poll_interval_ms: 0,
            ..ViewportSettings::default()
        };
        assert_eq!(
            settings.dpi_poll_interval(),
            Duration::from_millis(DPI_POLL_INTERVAL_MS)
        );
    }

    #[test]
    fn default_durations_match_constants() {
        let config = Config::default();
        assert_eq!(
            config.gesture.classify_after(),
            Duration::from_millis(CLASSIFY_AFTER_MS)
        );
        assert_eq!(
            config.viewport.dpi_poll_interval(),
            Duration::from_millis(DPI_POLL_INTERVAL_MS)
        );
    }
}
