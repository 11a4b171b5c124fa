// SPDX-License-Identifier: MPL-2.0
//! Vector helpers for two-finger gesture analysis.
//!
//! All functions treat touch points as rays from a shared gesture center.

use crate::error::GeometryError;
use iced_core::{Point, Vector};

/// Rays shorter than this (in screen pixels) are treated as zero-length.
const MIN_RAY_LENGTH: f32 = 1e-4;

/// Euclidean norm of a vector.
#[must_use]
pub fn magnitude(vector: Vector) -> f32 {
    vector.x.hypot(vector.y)
}

/// Angle in degrees (0–180) between the rays `center → p1` and `center → p2`.
///
/// # Errors
///
/// Returns [`GeometryError::DegenerateVector`] when either point coincides
/// with the center, since the angle is undefined there.
pub fn angle_between(p1: Point, p2: Point, center: Point) -> Result<f32, GeometryError> {
    let a = p1 - center;
    let b = p2 - center;
    let lengths = magnitude(a) * magnitude(b);

    if lengths < MIN_RAY_LENGTH * MIN_RAY_LENGTH || !lengths.is_finite() {
        return Err(GeometryError::DegenerateVector);
    }

    // Rounding can push the cosine slightly outside [-1, 1].
    let cos = ((a.x * b.x + a.y * b.y) / lengths).clamp(-1.0, 1.0);
    Ok(cos.acos().to_degrees())
}

/// True when the two rays mostly cancel out: the magnitude of their sum is
/// strictly smaller than each ray on its own.
///
/// Fingers on opposite sides of the center (spreading apart or closing in)
/// satisfy this; fingers dragged side by side do not.
#[must_use]
pub fn is_converging(p1: Point, p2: Point, center: Point) -> bool {
    let a = p1 - center;
    let b = p2 - center;
    let sum = magnitude(a + b);
    sum < magnitude(a) && sum < magnitude(b)
}
