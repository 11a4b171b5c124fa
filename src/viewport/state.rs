// SPDX-License-Identifier: MPL-2.0
//! Viewport geometry for one visual layer.
//!
//! Holds zoom, DPI, device pixel ratio and workspace size, and the pixel
//! dimensions derived from them. Every setter recomputes the derived size
//! before returning, so readers never observe a half-updated state.

use crate::config::{
    ViewportSettings, DEFAULT_DEVICE_PIXEL_RATIO, DEFAULT_DPI, DEFAULT_WORKSPACE_HEIGHT,
    DEFAULT_WORKSPACE_WIDTH, DEFAULT_ZOOM, MIN_ZOOM, POINTS_PER_INCH,
};
use iced_core::Size;

/// Zoom multiplier, guaranteed to be finite and strictly positive.
///
/// Construction clamps against a lower bound, so a value of this type never
/// needs to be checked again at usage sites.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct ZoomFactor(f64);

impl Default for ZoomFactor {
    fn default() -> Self {
        Self(DEFAULT_ZOOM)
    }
}

impl ZoomFactor {
    /// Creates a zoom factor of at least `min`. Non-finite values collapse
    /// to `min`; an invalid `min` is replaced by [`MIN_ZOOM`].
    #[must_use]
    pub fn new(value: f64, min: f64) -> Self {
        let min = valid_min_zoom(min);
        if value.is_finite() {
            Self(value.max(min))
        } else {
            Self(min)
        }
    }

    /// Returns the raw multiplier.
    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }

    /// Returns whether the zoom sits at the bound `min`.
    #[must_use]
    pub fn is_min(self, min: f64) -> bool {
        self.0 <= valid_min_zoom(min)
    }

    /// Multiplies the zoom by `factor`, clamped to `min`.
    #[must_use]
    pub fn scaled(self, factor: f64, min: f64) -> Self {
        Self::new(self.0 * factor, min)
    }
}

/// A usable lower zoom bound: finite and strictly positive.
fn valid_min_zoom(min: f64) -> f64 {
    if min.is_finite() && min > 0.0 {
        min
    } else {
        MIN_ZOOM
    }
}

/// The inputs a dependent layer mirrors from its primary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geometry {
    pub zoom: ZoomFactor,
    pub dpi_x: f64,
    pub dpi_y: f64,
    pub device_pixel_ratio: f64,
    pub workspace_width: f64,
    pub workspace_height: f64,
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            zoom: ZoomFactor::default(),
            dpi_x: DEFAULT_DPI,
            dpi_y: DEFAULT_DPI,
            device_pixel_ratio: DEFAULT_DEVICE_PIXEL_RATIO,
            workspace_width: DEFAULT_WORKSPACE_WIDTH,
            workspace_height: DEFAULT_WORKSPACE_HEIGHT,
        }
    }
}

/// Parses zoom text typed by the user. Anything that is not a number maps
/// to NaN, which the zoom setters turn into the minimum zoom.
#[must_use]
pub fn parse_zoom_input(input: &str) -> f64 {
    input.trim().parse::<f64>().unwrap_or(f64::NAN)
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

/// Pixel extent of `units` logical units at the given zoom and DPI scale.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_pixels(units: f64, zoom: f64, scale: f64) -> u32 {
    (units * zoom * scale).round().clamp(0.0, f64::from(u32::MAX)) as u32
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewportState {
    geometry: Geometry,
    min_zoom: f64,
    pixel_size: Size<u32>,
}

impl Default for ViewportState {
    fn default() -> Self {
        Self::new(&ViewportSettings::default())
    }
}

impl ViewportState {
    #[must_use]
    pub fn new(settings: &ViewportSettings) -> Self {
        let min_zoom = valid_min_zoom(settings.min_zoom);
        if min_zoom != settings.min_zoom {
            tracing::warn!(
                configured = settings.min_zoom,
                fallback = min_zoom,
                "invalid minimum zoom"
            );
        }
        let mut state = Self {
            geometry: Geometry {
                zoom: ZoomFactor::new(DEFAULT_ZOOM, min_zoom),
                ..Geometry::default()
            },
            min_zoom,
            pixel_size: Size {
                width: 0,
                height: 0,
            },
        };
        state.recompute();
        state
    }

    fn recompute(&mut self) {
        let (scale_x, scale_y) = self.dpi_scale();
        let zoom = self.geometry.zoom.value();
        self.pixel_size = Size {
            width: to_pixels(self.geometry.workspace_width, zoom, scale_x),
            height: to_pixels(self.geometry.workspace_height, zoom, scale_y),
        };
    }

    /// Sets the zoom factor, clamped to at least `min_zoom`. Non-finite
    /// values collapse to `min_zoom`. Returns the effective zoom.
    pub fn set_zoom(&mut self, value: f64) -> f64 {
        let zoom = ZoomFactor::new(value, self.min_zoom);
        if zoom.value() != value {
            tracing::debug!(requested = value, effective = zoom.value(), "zoom clamped");
        }
        self.geometry.zoom = zoom;
        self.recompute();
        zoom.value()
    }

    /// Sets the zoom from user text. Text that is not a number yields `min_zoom`.
    pub fn set_zoom_input(&mut self, input: &str) -> f64 {
        self.set_zoom(parse_zoom_input(input))
    }

    /// Multiplies the zoom by `factor`.
    pub fn zoom_by(&mut self, factor: f64) -> f64 {
        self.set_zoom(self.geometry.zoom.value() * factor)
    }

    /// Updates the logical workspace size. Non-positive sizes are ignored.
    /// Returns whether the size changed.
    pub fn set_workspace_size(&mut self, width: f64, height: f64) -> bool {
        if !is_positive(width) || !is_positive(height) {
            tracing::warn!(width, height, "ignoring invalid workspace size");
            return false;
        }
        let changed =
            self.geometry.workspace_width != width || self.geometry.workspace_height != height;
        self.geometry.workspace_width = width;
        self.geometry.workspace_height = height;
        self.recompute();
        changed
    }

    /// Updates the screen DPI. Non-positive values are ignored.
    /// Returns whether the DPI changed.
    pub fn set_dpi(&mut self, dpi_x: f64, dpi_y: f64) -> bool {
        if !is_positive(dpi_x) || !is_positive(dpi_y) {
            tracing::warn!(dpi_x, dpi_y, "ignoring invalid dpi");
            return false;
        }
        let changed = self.geometry.dpi_x != dpi_x || self.geometry.dpi_y != dpi_y;
        self.geometry.dpi_x = dpi_x;
        self.geometry.dpi_y = dpi_y;
        self.recompute();
        changed
    }

    /// Updates the device pixel ratio. Non-positive values are ignored.
    /// Returns whether the ratio changed.
    pub fn set_device_pixel_ratio(&mut self, ratio: f64) -> bool {
        if !is_positive(ratio) {
            tracing::warn!(ratio, "ignoring invalid device pixel ratio");
            return false;
        }
        let changed = self.geometry.device_pixel_ratio != ratio;
        self.geometry.device_pixel_ratio = ratio;
        self.recompute();
        changed
    }

    /// Replaces every geometry input in one step.
    ///
    /// The zoom is taken as-is, without this layer's own minimum, so a
    /// mirror always renders at exactly the source zoom. Invalid scale
    /// inputs keep their current value.
    pub fn apply_geometry(&mut self, geometry: Geometry) {
        let current = self.geometry;
        let pick = |incoming: f64, fallback: f64| {
            if is_positive(incoming) {
                incoming
            } else {
                fallback
            }
        };
        self.geometry = Geometry {
            zoom: geometry.zoom,
            dpi_x: pick(geometry.dpi_x, current.dpi_x),
            dpi_y: pick(geometry.dpi_y, current.dpi_y),
            device_pixel_ratio: pick(geometry.device_pixel_ratio, current.device_pixel_ratio),
            workspace_width: pick(geometry.workspace_width, current.workspace_width),
            workspace_height: pick(geometry.workspace_height, current.workspace_height),
        };
        self.recompute();
    }

    #[must_use]
    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    #[must_use]
    pub fn zoom(&self) -> f64 {
        self.geometry.zoom.value()
    }

    #[must_use]
    pub fn zoom_factor(&self) -> ZoomFactor {
        self.geometry.zoom
    }

    #[must_use]
    pub fn min_zoom(&self) -> f64 {
        self.min_zoom
    }

    #[must_use]
    pub fn dpi(&self) -> (f64, f64) {
        (self.geometry.dpi_x, self.geometry.dpi_y)
    }

    #[must_use]
    pub fn device_pixel_ratio(&self) -> f64 {
        self.geometry.device_pixel_ratio
    }

    #[must_use]
    pub fn workspace_size(&self) -> (f64, f64) {
        (self.geometry.workspace_width, self.geometry.workspace_height)
    }

    /// Pixels per logical unit on each axis, before zoom.
    #[must_use]
    pub fn dpi_scale(&self) -> (f64, f64) {
        let ratio = self.geometry.device_pixel_ratio;
        (
            self.geometry.dpi_x / ratio / POINTS_PER_INCH,
            self.geometry.dpi_y / ratio / POINTS_PER_INCH,
        )
    }

    /// Rendered size of the workspace in pixels.
    #[must_use]
    pub fn pixel_size(&self) -> Size<u32> {
        self.pixel_size
    }
}
