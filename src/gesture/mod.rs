// SPDX-License-Identifier: MPL-2.0
//! Touch gesture disambiguation.
//!
//! ## Architecture
//!
//! ```text
//! classifier (owns config + optional session)
//!     ├── session      - per-gesture finite-state machine
//!     └── press_guard  - holds single-pointer presses back for a second touch
//! ```
//!
//! The classifier consumes [`TouchFrame`]s and produces [`GestureEvent`]s,
//! which hosts either match on directly or forward to a [`GestureHandler`].

pub mod classifier;
pub mod press_guard;
pub mod session;

pub use classifier::{AngleTest, GestureClassifier, PinchPredicate, ScrollOffsets};
pub use press_guard::{PointerEvent, PressGuard};
pub use session::{GestureSession, Phase};

use iced_core::{Point, Vector};
use std::time::Duration;

/// One frame of a two-finger gesture as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchFrame {
    /// Screen positions of the two touches.
    pub touches: [Point; 2],
    /// Centroid reported by the gesture framework.
    pub centroid: Point,
    /// Time since the gesture started.
    pub elapsed: Duration,
    /// Pinch scale relative to the gesture start (1.0 = unchanged).
    pub scale: f32,
}

impl TouchFrame {
    /// Builds a frame whose centroid is the midpoint of the two touches.
    #[must_use]
    pub fn new(first: Point, second: Point, elapsed: Duration, scale: f32) -> Self {
        Self {
            touches: [first, second],
            centroid: Point::new((first.x + second.x) / 2.0, (first.y + second.y) / 2.0),
            elapsed,
            scale,
        }
    }
}

/// Classified output of the gesture classifier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureEvent {
    /// Scroll the container to `offset`.
    Pan { offset: Vector },
    /// Zoom by `scale` relative to the zoom at gesture start, around `center`.
    Pinch { scale: f32, center: Point },
    /// The gesture session closed.
    End,
}

/// Host callbacks for classified gestures.
pub trait GestureHandler {
    fn on_pinch(&mut self, scale: f32, center: Point);

    fn on_pan(&mut self, offset: Vector);

    fn on_gesture_end(&mut self);

    /// A short press released before the press guard expired.
    fn on_click(&mut self, _position: Point) {}
}

impl GestureEvent {
    /// Forwards this event to the matching handler callback.
    pub fn dispatch<H: GestureHandler + ?Sized>(&self, handler: &mut H) {
        match *self {
            GestureEvent::Pan { offset } => handler.on_pan(offset),
            GestureEvent::Pinch { scale, center } => handler.on_pinch(scale, center),
            GestureEvent::End => handler.on_gesture_end(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        pinches: Vec<f32>,
        pans: Vec<Vector>,
        ends: usize,
    }

    impl GestureHandler for Recorder {
        fn on_pinch(&mut self, scale: f32, _center: Point) {
            self.pinches.push(scale);
        }

        fn on_pan(&mut self, offset: Vector) {
            self.pans.push(offset);
        }

        fn on_gesture_end(&mut self) {
            self.ends += 1;
        }
    }

    #[test]
    fn frame_centroid_is_midpoint() {
        let frame = TouchFrame::new(
            Point::new(0.0, 0.0),
            Point::new(10.0, 20.0),
            Duration::ZERO,
            1.0,
        );
        assert_eq!(frame.centroid, Point::new(5.0, 10.0));
    }

    #[test]
    fn dispatch_routes_each_variant() {
        let mut recorder = Recorder::default();
        GestureEvent::Pan {
            offset: Vector::new(3.0, 4.0),
        }
        .dispatch(&mut recorder);
        GestureEvent::Pinch {
            scale: 1.5,
            center: Point::ORIGIN,
        }
        .dispatch(&mut recorder);
        GestureEvent::End.dispatch(&mut recorder);

        assert_eq!(recorder.pans, vec![Vector::new(3.0, 4.0)]);
        assert_eq!(recorder.pinches, vec![1.5]);
        assert_eq!(recorder.ends, 1);
    }
}
