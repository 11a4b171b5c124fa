// SPDX-License-Identifier: MPL-2.0
//! Blocking overlay shown while the content layer is busy.

use crate::layer::{LayerEvent, LayerHandle, LayerReadiness, ListenerFlow, Subscription};
use iced_core::{Point, Rectangle, Size};
use std::cell::RefCell;
use std::rc::Rc;

/// Host-side overlay that blocks input over the whole host element.
pub trait LockOverlay {
    fn show(&mut self, bounds: Rectangle);

    fn hide(&mut self);

    /// The host element was resized while the overlay is visible.
    fn reposition(&mut self, _bounds: Rectangle) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LockState {
    #[default]
    Unlocked,
    Locked,
}

/// Tracks the lock state and drives the overlay on real transitions only.
#[derive(Debug)]
pub struct LockController<O> {
    state: LockState,
    host_bounds: Rectangle,
    overlay: O,
}

impl<O: LockOverlay> LockController<O> {
    #[must_use]
    pub fn new(overlay: O) -> Self {
        Self {
            state: LockState::Unlocked,
            host_bounds: Rectangle::new(Point::ORIGIN, Size::ZERO),
            overlay,
        }
    }

    #[must_use]
    pub fn state(&self) -> LockState {
        self.state
    }

    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.state == LockState::Locked
    }

    #[must_use]
    pub fn host_bounds(&self) -> Rectangle {
        self.host_bounds
    }

    #[must_use]
    pub fn overlay(&self) -> &O {
        &self.overlay
    }

    pub fn overlay_mut(&mut self) -> &mut O {
        &mut self.overlay
    }

    /// Shows the overlay. Returns false if it was already locked.
    pub fn lock(&mut self) -> bool {
        if self.is_locked() {
            return false;
        }
        self.state = LockState::Locked;
        self.overlay.show(self.host_bounds);
        tracing::debug!("content locked");
        true
    }

    /// Hides the overlay. Returns false if it was not locked.
    pub fn unlock(&mut self) -> bool {
        if !self.is_locked() {
            return false;
        }
        self.state = LockState::Unlocked;
        self.overlay.hide();
        tracing::debug!("content unlocked");
        true
    }

    /// Applies a layer status: `Busy` locks, `Ready` unlocks, anything
    /// else leaves the lock alone. Returns whether the state changed.
    pub fn observe(&mut self, readiness: LayerReadiness) -> bool {
        match readiness {
            LayerReadiness::Busy => self.lock(),
            LayerReadiness::Ready => self.unlock(),
            LayerReadiness::Uninitialized | LayerReadiness::Initializing => false,
        }
    }

    /// Records the host element bounds the overlay must cover.
    pub fn set_host_bounds(&mut self, bounds: Rectangle) {
        if self.host_bounds == bounds {
            return;
        }
        self.host_bounds = bounds;
        if self.is_locked() {
            self.overlay.reposition(bounds);
        }
    }
}

impl<O: LockOverlay + 'static> LockController<O> {
    /// Follows the status transitions of `layer` until the returned
    /// subscription is dropped.
    #[must_use = "dropping the subscription stops following the layer"]
    pub fn bind(controller: &Rc<RefCell<Self>>, layer: &LayerHandle) -> Subscription {
        let controller = Rc::downgrade(controller);
        layer.subscribe(move |layer, event| {
            let LayerEvent::StatusChanged { to, .. } = *event else {
                return ListenerFlow::Keep;
            };
            let Some(controller) = controller.upgrade() else {
                return ListenerFlow::Remove;
            };
            match controller.try_borrow_mut() {
                Ok(mut controller) => {
                    controller.observe(to);
                }
                Err(_) => {
                    tracing::warn!(layer = layer.name(), "lock controller busy, status dropped");
                }
            }
            ListenerFlow::Keep
        })
    }
}
