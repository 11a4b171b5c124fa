// SPDX-License-Identifier: MPL-2.0
//! Host-side viewport logic.
//!
//! The viewer owns the primary layer and wires the pieces together:
//!
//! ```text
//! Viewer (orchestrator)
//!     ├── classifier   - two-finger frames -> pan / pinch
//!     ├── press_guard  - single-pointer presses
//!     ├── primary      - canonical zoom / DPI / workspace
//!     ├── sync         - mirrors the primary onto overlays
//!     └── lock         - blocking overlay while the primary is busy
//! ```
//!
//! Input arrives as [`Message`]s; each call to [`Viewer::handle`] returns the
//! [`Effect`]s the host has to carry out (scrolling, pointer routing).

use crate::config::Config;
use crate::gesture::{
    GestureClassifier, GestureEvent, GestureHandler, PointerEvent, PressGuard, TouchFrame,
};
use crate::layer::{LayerHandle, LayerReadiness, Subscription};
use crate::lock::{LockController, LockOverlay};
use crate::sync::SyncCoordinator;
use crate::viewport::state::parse_zoom_input;
use crate::viewport::ZoomFactor;
use iced_core::{Point, Rectangle, Size, Vector};
use std::cell::{Ref, RefCell};
use std::rc::Rc;
use std::time::Instant;

/// Messages for the viewer.
#[derive(Debug, Clone)]
pub enum Message {
    /// A frame of an ongoing two-finger gesture.
    TouchFrame(TouchFrame),
    /// All fingers lifted.
    TouchEnded,
    /// A single pointer went down.
    PointerPressed { position: Point, at: Instant },
    PointerMoved(Point),
    PointerReleased(Point),
    /// Timer tick, used to fire held-back presses.
    Tick(Instant),
    /// The scroll container reported its current offsets.
    ScrollOffsetChanged(Vector),
    ZoomIn,
    ZoomOut,
    SetZoom(f64),
    /// Zoom text field submitted.
    ZoomInputSubmitted(String),
    WorkspaceResized { width: f64, height: f64 },
    DpiChanged { x: f64, y: f64 },
    DevicePixelRatioChanged(f64),
    /// The host element changed size.
    HostResized(Rectangle),
    StatusChanged(LayerReadiness),
    Initialized,
}

/// Effects the host must apply.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Move the scroll container to these offsets.
    ScrollTo(Vector),
    /// Zoom changed; the content size is now `pixel_size`.
    ZoomChanged {
        zoom: ZoomFactor,
        pixel_size: Size<u32>,
    },
    /// Route pointer input to the content.
    Pointer(PointerEvent),
    /// A two-finger gesture finished.
    GestureEnded,
}

pub struct Viewer<O: LockOverlay + 'static> {
    primary: LayerHandle,
    sync: SyncCoordinator,
    classifier: GestureClassifier,
    press_guard: PressGuard,
    lock: Rc<RefCell<LockController<O>>>,
    _lock_binding: Subscription,
    scroll_offset: Vector,
    gesture_start_zoom: Option<ZoomFactor>,
    zoom_step: f64,
    effects: Vec<Effect>,
}

impl<O: LockOverlay + 'static> Viewer<O> {
    #[must_use]
    pub fn new(name: impl Into<String>, config: &Config, overlay: O) -> Self {
        let config = config.clone().sanitized();
        let primary = LayerHandle::new(name, &config.viewport);
        let sync = SyncCoordinator::new(&primary);
        let lock = Rc::new(RefCell::new(LockController::new(overlay)));
        let lock_binding = LockController::bind(&lock, &primary);

        Self {
            primary,
            sync,
            classifier: GestureClassifier::new(&config.gesture),
            press_guard: PressGuard::from_settings(&config.gesture),
            lock,
            _lock_binding: lock_binding,
            scroll_offset: Vector::ZERO,
            gesture_start_zoom: None,
            zoom_step: config.viewport.zoom_step_factor,
            effects: Vec::new(),
        }
    }

    /// The layer holding canonical geometry.
    #[must_use]
    pub fn primary(&self) -> &LayerHandle {
        &self.primary
    }

    #[must_use]
    pub fn sync(&self) -> &SyncCoordinator {
        &self.sync
    }

    #[must_use]
    pub fn classifier(&self) -> &GestureClassifier {
        &self.classifier
    }

    #[must_use]
    pub fn lock(&self) -> Ref<'_, LockController<O>> {
        self.lock.borrow()
    }

    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.lock.borrow().is_locked()
    }

    #[must_use]
    pub fn scroll_offset(&self) -> Vector {
        self.scroll_offset
    }

    #[must_use]
    pub fn content_pixel_size(&self) -> Size<u32> {
        self.primary.content_pixel_size()
    }

    /// Mirrors the primary geometry onto an input overlay.
    pub fn attach_overlay(&mut self, overlay: &LayerHandle) {
        self.sync.attach(overlay);
    }

    pub fn detach_overlay(&mut self, overlay: &LayerHandle) -> bool {
        self.sync.detach(overlay)
    }

    fn zoom_to(&mut self, zoom: f64) {
        self.primary.set_zoom(zoom);
        self.effects.push(Effect::ZoomChanged {
            zoom: self.primary.geometry().zoom,
            pixel_size: self.primary.content_pixel_size(),
        });
    }

    fn route_pointer(&mut self, events: Vec<PointerEvent>) {
        for event in events {
            if let PointerEvent::Click(position) = event {
                self.on_click(position);
            }
            self.effects.push(Effect::Pointer(event));
        }
    }

    fn dispatch_gestures(&mut self, events: Vec<GestureEvent>) {
        for event in events {
            event.dispatch(self);
        }
    }

    /// Handles one message and returns the resulting effects in order.
    #[allow(clippy::needless_pass_by_value)]
    pub fn handle(&mut self, msg: Message) -> Vec<Effect> {
        match msg {
            Message::TouchFrame(frame) => {
                if !self.classifier.is_active() {
                    if let Some(event) = self.press_guard.second_touch() {
                        self.route_pointer(vec![event]);
                    }
                    self.gesture_start_zoom = Some(self.primary.geometry().zoom);
                }
                let events = self.classifier.on_frame(frame, &self.scroll_offset);
                self.dispatch_gestures(events);
            }
            Message::TouchEnded => {
                let events = self.classifier.on_release();
                self.dispatch_gestures(events);
            }
            Message::PointerPressed { position, at } => {
                self.press_guard.press(position, at);
            }
            Message::PointerMoved(position) => {
                let events = self.press_guard.pointer_moved(position);
                self.route_pointer(events);
            }
            Message::PointerReleased(position) => {
                let events = self.press_guard.pointer_released(position);
                self.route_pointer(events);
            }
            Message::Tick(now) => {
                if let Some(event) = self.press_guard.poll(now) {
                    self.route_pointer(vec![event]);
                }
            }
            Message::ScrollOffsetChanged(offset) => {
                self.scroll_offset = offset;
            }
            Message::ZoomIn => {
                let zoom = self.primary.zoom() * self.zoom_step;
                self.zoom_to(zoom);
            }
            Message::ZoomOut => {
                let zoom = self.primary.zoom() / self.zoom_step;
                self.zoom_to(zoom);
            }
            Message::SetZoom(zoom) => self.zoom_to(zoom),
            Message::ZoomInputSubmitted(input) => {
                self.zoom_to(parse_zoom_input(&input));
            }
            Message::WorkspaceResized { width, height } => {
                self.primary.set_workspace_size(width, height);
            }
            Message::DpiChanged { x, y } => {
                self.primary.set_dpi(x, y);
            }
            Message::DevicePixelRatioChanged(ratio) => {
                self.primary.set_device_pixel_ratio(ratio);
            }
            Message::HostResized(bounds) => {
                self.lock.borrow_mut().set_host_bounds(bounds);
            }
            Message::StatusChanged(readiness) => {
                self.primary.set_status(readiness);
            }
            Message::Initialized => {
                self.primary.mark_initialized();
            }
        }
        std::mem::take(&mut self.effects)
    }
}

impl<O: LockOverlay + 'static> GestureHandler for Viewer<O> {
    fn on_pinch(&mut self, scale: f32, _center: Point) {
        let start = self
            .gesture_start_zoom
            .unwrap_or_else(|| self.primary.geometry().zoom);
        self.zoom_to(start.value() * f64::from(scale));
    }

    fn on_pan(&mut self, offset: Vector) {
        self.scroll_offset = offset;
        self.effects.push(Effect::ScrollTo(offset));
    }

    fn on_gesture_end(&mut self) {
        self.gesture_start_zoom = None;
        self.effects.push(Effect::GestureEnded);
    }

    fn on_click(&mut self, position: Point) {
        tracing::trace!(?position, "click");
    }
}
