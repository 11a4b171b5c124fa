// SPDX-License-Identifier: MPL-2.0
//! Pinch vs. pan classifier for two-finger gestures.

use super::session::GestureSession;
use super::{GestureEvent, TouchFrame};
use crate::config::{GestureSettings, PinchRule};
use iced_core::Vector;
use std::fmt;
use std::time::Duration;

/// Decides whether a ray angle and framework scale describe a pinch.
pub trait PinchPredicate {
    fn passes(&self, angle_deg: f32, scale: f32) -> bool;
}

impl<F> PinchPredicate for F
where
    F: Fn(f32, f32) -> bool,
{
    fn passes(&self, angle_deg: f32, scale: f32) -> bool {
        self(angle_deg, scale)
    }
}

/// Threshold-based pinch test built from [`GestureSettings`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngleTest {
    rule: PinchRule,
    min_angle_deg: f32,
    shrink_scale: f32,
    grow_scale: f32,
}

impl AngleTest {
    #[must_use]
    pub fn from_settings(settings: &GestureSettings) -> Self {
        Self {
            rule: settings.pinch_rule,
            min_angle_deg: settings.min_angle_deg,
            shrink_scale: settings.shrink_scale,
            grow_scale: settings.grow_scale,
        }
    }

    #[must_use]
    pub fn rule(&self) -> PinchRule {
        self.rule
    }
}

impl PinchPredicate for AngleTest {
    fn passes(&self, angle_deg: f32, scale: f32) -> bool {
        let opposed = angle_deg >= self.min_angle_deg;
        let scaled = scale <= self.shrink_scale || scale >= self.grow_scale;
        match self.rule {
            PinchRule::Strict => opposed && scaled,
            PinchRule::Lenient => opposed || scaled,
        }
    }
}

/// Source of the scroll container offsets captured when a gesture starts.
pub trait ScrollOffsets {
    fn scroll_offsets(&self) -> Vector;
}

impl ScrollOffsets for Vector {
    fn scroll_offsets(&self) -> Vector {
        *self
    }
}

/// Turns a stream of two-finger frames into pan and pinch events.
///
/// Holds at most one [`GestureSession`]; the session is created by the
/// first frame after idle and destroyed on release.
pub struct GestureClassifier {
    predicate: Box<dyn PinchPredicate>,
    classify_after: Duration,
    session: Option<GestureSession>,
}

impl fmt::Debug for GestureClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GestureClassifier")
            .field("classify_after", &self.classify_after)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl Default for GestureClassifier {
    fn default() -> Self {
        Self::new(&GestureSettings::default())
    }
}

impl GestureClassifier {
    /// Creates a classifier using the threshold test described by `settings`.
    #[must_use]
    pub fn new(settings: &GestureSettings) -> Self {
        Self::with_predicate(settings, AngleTest::from_settings(settings))
    }

    /// Creates a classifier with a custom pinch test. Only the timing from
    /// `settings` is used.
    #[must_use]
    pub fn with_predicate(
        settings: &GestureSettings,
        predicate: impl PinchPredicate + 'static,
    ) -> Self {
        Self {
            predicate: Box::new(predicate),
            classify_after: settings.classify_after(),
            session: None,
        }
    }

    /// The active session, if a gesture is in progress.
    #[must_use]
    pub fn session(&self) -> Option<&GestureSession> {
        self.session.as_ref()
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Feeds one two-finger frame.
    ///
    /// The first frame of a gesture opens a session and reads the scroll
    /// offsets from `container`; it emits nothing. Later frames emit a pan
    /// or pinch, plus a pinch on the frame that commits to zooming.
    pub fn on_frame(
        &mut self,
        frame: TouchFrame,
        container: &impl ScrollOffsets,
    ) -> Vec<GestureEvent> {
        match self.session.as_mut() {
            Some(session) => session.advance(frame, self.predicate.as_ref(), self.classify_after),
            None => {
                let session = GestureSession::start(frame, container.scroll_offsets());
                tracing::debug!(center = ?session.center(), "gesture session started");
                self.session = Some(session);
                Vec::new()
            }
        }
    }

    /// Ends the current gesture. Returns nothing when no gesture is active.
    pub fn on_release(&mut self) -> Vec<GestureEvent> {
        match self.session.take() {
            Some(session) => {
                let events = session.finish(self.predicate.as_ref());
                tracing::debug!("gesture session ended");
                events
            }
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::Phase;
    use iced_core::Point;

    const CENTER: Point = Point { x: 200.0, y: 200.0 };

    /// Two touches at `radius` around `CENTER`, `angle` degrees apart,
    /// mirrored around the vertical axis so the centroid stays near `CENTER`.
    fn spread(angle: f32, radius: f32, elapsed_ms: u64, scale: f32) -> TouchFrame {
        let half = (angle / 2.0).to_radians();
        let first = Point::new(CENTER.x - radius * half.sin(), CENTER.y - radius * half.cos());
        let second = Point::new(CENTER.x + radius * half.sin(), CENTER.y - radius * half.cos());
        TouchFrame {
            touches: [first, second],
            centroid: CENTER,
            elapsed: Duration::from_millis(elapsed_ms),
            scale,
        }
    }

    fn count(events: &[GestureEvent], pinch: bool) -> usize {
        events
            .iter()
            .filter(|e| match e {
                GestureEvent::Pinch { .. } => pinch,
                GestureEvent::Pan { .. } => !pinch,
                GestureEvent::End => false,
            })
            .count()
    }

    #[test]
    fn strict_test_needs_angle_and_scale() {
        let test = AngleTest::from_settings(&GestureSettings::default());
        assert!(test.passes(170.0, 0.7));
        assert!(test.passes(160.0, 1.3));
        assert!(!test.passes(170.0, 1.0));
        assert!(!test.passes(90.0, 0.7));
    }

    #[test]
    fn lenient_test_needs_either() {
        let settings = GestureSettings {
            pinch_rule: PinchRule::Lenient,
            ..GestureSettings::default()
        };
        let test = AngleTest::from_settings(&settings);
        assert!(test.passes(170.0, 1.0));
        assert!(test.passes(90.0, 0.7));
        assert!(!test.passes(90.0, 1.0));
    }

    #[test]
    fn first_frame_opens_session_silently() {
        let mut classifier = GestureClassifier::default();
        let events = classifier.on_frame(spread(170.0, 50.0, 0, 1.0), &Vector::new(5.0, 7.0));

        assert!(events.is_empty());
        let session = classifier.session().unwrap();
        assert_eq!(session.start_offsets(), Vector::new(5.0, 7.0));
        assert!(session.is_scroll());
    }

    #[test]
    fn sustained_pinch_commits_and_stops_panning() {
        let mut classifier = GestureClassifier::default();
        let container = Vector::ZERO;
        classifier.on_frame(spread(170.0, 50.0, 0, 1.0), &container);

        let early = classifier.on_frame(spread(170.0, 45.0, 200, 0.8), &container);
        assert_eq!(count(&early, false), 1);

        let committing = classifier.on_frame(spread(170.0, 35.0, 400, 0.7), &container);
        assert_eq!(committing.last(), Some(&GestureEvent::Pinch { scale: 0.7, center: CENTER }));
        assert_eq!(classifier.session().unwrap().phase(), Phase::CommittedPinch);

        let mut after = Vec::new();
        for ms in [450, 500, 550] {
            after.extend(classifier.on_frame(spread(170.0, 30.0, ms, 0.6), &container));
        }
        after.extend(classifier.on_release());

        assert_eq!(count(&after, false), 0);
        assert_eq!(count(&after, true), 3);
        assert_eq!(after.last(), Some(&GestureEvent::End));
    }

    #[test]
    fn perpendicular_gesture_stays_scroll() {
        let mut classifier = GestureClassifier::default();
        let container = Vector::ZERO;
        classifier.on_frame(spread(90.0, 50.0, 0, 1.0), &container);

        let mut events = Vec::new();
        for ms in (50..=800).step_by(50) {
            let frame_events = classifier.on_frame(spread(90.0, 50.0, ms, 1.0), &container);
            assert_eq!(count(&frame_events, false), 1);
            events.extend(frame_events);
        }
        assert_eq!(classifier.session().unwrap().phase(), Phase::CommittedScroll);
        events.extend(classifier.on_release());

        assert_eq!(count(&events, true), 0);
        assert_eq!(count(&events, false), 16);
    }

    #[test]
    fn quick_pinch_is_recognized_on_release() {
        let mut classifier = GestureClassifier::default();
        let container = Vector::ZERO;
        classifier.on_frame(spread(150.0, 40.0, 0, 1.0), &container);
        classifier.on_frame(spread(160.0, 50.0, 50, 1.2), &container);
        classifier.on_frame(spread(165.0, 56.0, 100, 1.4), &container);

        let released = classifier.on_release();
        assert_eq!(
            released,
            vec![
                GestureEvent::Pinch { scale: 1.4, center: CENTER },
                GestureEvent::End
            ]
        );
        assert!(!classifier.is_active());
    }

    #[test]
    fn quick_scroll_release_emits_only_end() {
        let mut classifier = GestureClassifier::default();
        classifier.on_frame(spread(40.0, 50.0, 0, 1.0), &Vector::ZERO);
        classifier.on_frame(spread(40.0, 50.0, 100, 1.0), &Vector::ZERO);

        assert_eq!(classifier.on_release(), vec![GestureEvent::End]);
    }

    #[test]
    fn release_without_session_is_silent() {
        let mut classifier = GestureClassifier::default();
        assert!(classifier.on_release().is_empty());
    }

    #[test]
    fn touch_on_center_counts_as_no_rotation() {
        let mut classifier = GestureClassifier::default();
        let degenerate = TouchFrame {
            touches: [CENTER, Point::new(CENTER.x + 40.0, CENTER.y)],
            centroid: CENTER,
            elapsed: Duration::ZERO,
            scale: 1.0,
        };
        classifier.on_frame(degenerate, &Vector::ZERO);
        let events = classifier.on_frame(
            TouchFrame {
                elapsed: Duration::from_millis(400),
                scale: 0.5,
                ..degenerate
            },
            &Vector::ZERO,
        );

        assert_eq!(count(&events, true), 0);
        assert_eq!(classifier.session().unwrap().phase(), Phase::CommittedScroll);
    }

    #[test]
    fn injected_predicate_overrides_thresholds() {
        let mut classifier =
            GestureClassifier::with_predicate(&GestureSettings::default(), |_: f32, _: f32| true);
        classifier.on_frame(spread(170.0, 50.0, 0, 1.0), &Vector::ZERO);
        let events = classifier.on_frame(spread(170.0, 50.0, 400, 1.0), &Vector::ZERO);

        assert_eq!(count(&events, true), 1);
    }

    #[test]
    fn new_gesture_after_release_starts_fresh() {
        let mut classifier = GestureClassifier::default();
        classifier.on_frame(spread(170.0, 50.0, 0, 1.0), &Vector::ZERO);
        classifier.on_frame(spread(170.0, 30.0, 400, 0.6), &Vector::ZERO);
        classifier.on_release();

        classifier.on_frame(spread(90.0, 50.0, 0, 1.0), &Vector::new(1.0, 1.0));
        let session = classifier.session().unwrap();
        assert_eq!(session.phase(), Phase::Undetermined);
        assert_eq!(session.start_offsets(), Vector::new(1.0, 1.0));
    }
}
