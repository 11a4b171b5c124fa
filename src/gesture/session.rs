// SPDX-License-Identifier: MPL-2.0
//! Per-gesture state machine.
//!
//! A session lives from the first two-finger frame until release. It starts
//! out treating the gesture as a scroll, and commits exactly once to either
//! pinch or scroll after the classification delay. A release before that
//! delay gets one last look at the final frame so quick pinches still zoom.

use super::classifier::PinchPredicate;
use super::{GestureEvent, TouchFrame};
use crate::geometry;
use iced_core::{Point, Vector};
use std::time::Duration;

/// Classification phase of a gesture session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Still panning, classification not committed yet.
    Undetermined,
    /// Committed to zoom for the rest of the session.
    CommittedPinch,
    /// Committed to scroll for the rest of the session.
    CommittedScroll,
}

/// Mutable record of one multi-touch interaction.
#[derive(Debug, Clone)]
pub struct GestureSession {
    center: Point,
    start_offsets: Vector,
    phase: Phase,
    last_frame: TouchFrame,
}

impl GestureSession {
    /// Opens a session from the first two-finger frame.
    ///
    /// The frame's centroid becomes the fixed gesture center and
    /// `start_offsets` the scroll position every pan is measured from.
    #[must_use]
    pub fn start(frame: TouchFrame, start_offsets: Vector) -> Self {
        Self {
            center: frame.centroid,
            start_offsets,
            phase: Phase::Undetermined,
            last_frame: frame,
        }
    }

    #[must_use]
    pub fn center(&self) -> Point {
        self.center
    }

    #[must_use]
    pub fn start_offsets(&self) -> Vector {
        self.start_offsets
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Whether frames are currently interpreted as scrolling.
    #[must_use]
    pub fn is_scroll(&self) -> bool {
        self.phase != Phase::CommittedPinch
    }

    /// Whether a final classification has been committed.
    #[must_use]
    pub fn is_scroll_checked(&self) -> bool {
        self.phase != Phase::Undetermined
    }

    #[must_use]
    pub fn last_frame(&self) -> &TouchFrame {
        &self.last_frame
    }

    /// Scroll offset for a given centroid: the start offsets shifted by how
    /// far the centroid has travelled from the gesture center.
    #[must_use]
    pub fn pan_offset(&self, centroid: Point) -> Vector {
        self.start_offsets - (self.center - centroid)
    }

    fn pinch_event(&self, frame: &TouchFrame) -> GestureEvent {
        GestureEvent::Pinch {
            scale: frame.scale,
            center: self.center,
        }
    }

    /// Angle between the two touch rays, with a degenerate ray counting as
    /// no rotation at all.
    fn frame_angle(&self, frame: &TouchFrame) -> f32 {
        let [first, second] = frame.touches;
        geometry::angle_between(first, second, self.center).unwrap_or_else(|err| {
            tracing::trace!(%err, "touch on gesture center, treating angle as 0");
            0.0
        })
    }

    /// Processes a follow-up frame and returns the events it produces.
    pub(crate) fn advance(
        &mut self,
        frame: TouchFrame,
        predicate: &dyn PinchPredicate,
        classify_after: Duration,
    ) -> Vec<GestureEvent> {
        let mut events = Vec::with_capacity(2);

        match self.phase {
            Phase::CommittedPinch => events.push(self.pinch_event(&frame)),
            Phase::CommittedScroll => events.push(GestureEvent::Pan {
                offset: self.pan_offset(frame.centroid),
            }),
            Phase::Undetermined => {
                events.push(GestureEvent::Pan {
                    offset: self.pan_offset(frame.centroid),
                });

                if frame.elapsed > classify_after {
                    let angle = self.frame_angle(&frame);
                    let [first, second] = frame.touches;
                    let converging = geometry::is_converging(first, second, self.center);

                    if converging && predicate.passes(angle, frame.scale) {
                        self.phase = Phase::CommittedPinch;
                        events.push(self.pinch_event(&frame));
                    } else {
                        self.phase = Phase::CommittedScroll;
                    }
                    tracing::debug!(
                        angle,
                        scale = frame.scale,
                        converging,
                        phase = ?self.phase,
                        "gesture classified"
                    );
                }
            }
        }

        self.last_frame = frame;
        events
    }

    /// Closes the session. An uncommitted session whose last frame passes
    /// the angle test yields one final pinch before the end event.
    pub(crate) fn finish(self, predicate: &dyn PinchPredicate) -> Vec<GestureEvent> {
        let mut events = Vec::with_capacity(2);

        if self.phase == Phase::Undetermined {
            let angle = self.frame_angle(&self.last_frame);
            if predicate.passes(angle, self.last_frame.scale) {
                tracing::debug!(angle, scale = self.last_frame.scale, "late pinch on release");
                events.push(self.pinch_event(&self.last_frame));
            }
        }

        events.push(GestureEvent::End);
        events
    }
}
