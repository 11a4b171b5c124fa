// SPDX-License-Identifier: MPL-2.0
//! Press guard for single-pointer input.
//!
//! A touch press is held back for a short delay before being routed as a
//! pointer down, because a second finger landing right after it turns the
//! interaction into a two-finger gesture. Real move or release input that
//! arrives first cancels the pending timer and is routed immediately, so a
//! stale synthetic press can never fire after it.

use crate::config::GestureSettings;
use iced_core::Point;
use std::time::{Duration, Instant};

/// Pointer input routed to the host after the guard.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down(Point),
    Move(Point),
    Up(Point),
    /// Press and release completed within the guard delay.
    Click(Point),
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct PendingPress {
    position: Point,
    deadline: Instant,
}

/// Holds a press back until its deadline, a second touch, or real input.
#[derive(Debug, Clone)]
pub struct PressGuard {
    delay: Duration,
    pending: Option<PendingPress>,
    /// Last position of a press already routed as `Down`.
    pressed: Option<Point>,
}

impl Default for PressGuard {
    fn default() -> Self {
        Self::from_settings(&GestureSettings::default())
    }
}

impl PressGuard {
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
            pressed: None,
        }
    }

    #[must_use]
    pub fn from_settings(settings: &GestureSettings) -> Self {
        Self::new(settings.press_guard())
    }

    /// Whether a press is waiting on its timer.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Whether a `Down` was routed without its `Up` yet.
    #[must_use]
    pub fn is_pressed(&self) -> bool {
        self.pressed.is_some()
    }

    /// When the pending press fires, if one is armed.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.map(|p| p.deadline)
    }

    /// Arms the timer for a new press. A press still pending is replaced.
    pub fn press(&mut self, position: Point, now: Instant) {
        self.pending = Some(PendingPress {
            position,
            deadline: now + self.delay,
        });
        self.pressed = None;
    }

    /// Fires the pending press once its deadline has passed.
    pub fn poll(&mut self, now: Instant) -> Option<PointerEvent> {
        let pending = self.pending?;
        if now < pending.deadline {
            return None;
        }
        self.pending = None;
        self.pressed = Some(pending.position);
        Some(PointerEvent::Down(pending.position))
    }

    /// Routes a move. A pending press is flushed first so the host sees
    /// the down before the move.
    pub fn pointer_moved(&mut self, position: Point) -> Vec<PointerEvent> {
        let pending = self.pending.take();
        if pending.is_some() || self.pressed.is_some() {
            self.pressed = Some(position);
        }
        match pending {
            Some(pending) => {
                vec![PointerEvent::Down(pending.position), PointerEvent::Move(position)]
            }
            None => vec![PointerEvent::Move(position)],
        }
    }

    /// Routes a release. A release while the press is still pending is a click.
    pub fn pointer_released(&mut self, position: Point) -> Vec<PointerEvent> {
        let was_pressed = self.pressed.take().is_some();
        match self.pending.take() {
            Some(pending) => vec![
                PointerEvent::Down(pending.position),
                PointerEvent::Up(position),
                PointerEvent::Click(position),
            ],
            None if was_pressed => vec![PointerEvent::Up(position)],
            None => Vec::new(),
        }
    }

    /// A second touch landed and the pointer becomes part of a gesture.
    ///
    /// A press still pending is dropped. A press already routed as `Down`
    /// is closed with the returned `Up`, which must reach the host before
    /// the gesture starts.
    pub fn second_touch(&mut self) -> Option<PointerEvent> {
        if self.pending.take().is_some() {
            tracing::trace!("pending press absorbed by two-finger gesture");
        }
        let position = self.pressed.take()?;
        tracing::trace!(?position, "routed press closed by two-finger gesture");
        Some(PointerEvent::Up(position))
    }
}
