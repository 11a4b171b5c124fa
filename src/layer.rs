// SPDX-License-Identifier: MPL-2.0
//! Visual layers and their change notifications.
//!
//! A [`LayerHandle`] is a cheap, single-threaded handle to one rendered layer
//! (the viewer canvas or an input overlay). It owns the layer's readiness,
//! its [`ViewportState`] and a registry of listeners notified on every
//! transition. Listeners are held through [`Subscription`] guards that
//! unregister them when dropped.

use crate::config::ViewportSettings;
use crate::viewport::{Geometry, ViewportState, ZoomFactor};
use iced_core::Size;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

/// Lifecycle status of a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LayerReadiness {
    #[default]
    Uninitialized,
    Initializing,
    Ready,
    Busy,
}

/// Notifications published by a layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LayerEvent {
    StatusChanged {
        from: LayerReadiness,
        to: LayerReadiness,
    },
    /// The layer finished its asynchronous initialization.
    Initialized,
    ZoomChanged(ZoomFactor),
    /// DPI or device pixel ratio changed.
    ResolutionChanged,
    WorkspaceResized,
    /// Geometry was overwritten from the layer this one mirrors.
    GeometryMirrored,
}

/// Returned by a listener to stay registered or to unregister itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerFlow {
    Keep,
    Remove,
}

type Listener = Rc<RefCell<dyn FnMut(&LayerHandle, &LayerEvent) -> ListenerFlow>>;

#[derive(Default)]
struct ListenerRegistry {
    next_id: u64,
    entries: Vec<(u64, Listener)>,
}

impl ListenerRegistry {
    fn contains(&self, id: u64) -> bool {
        self.entries.iter().any(|(entry, _)| *entry == id)
    }

    fn remove(&mut self, id: u64) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry, _)| *entry != id);
        self.entries.len() != before
    }
}

#[derive(Debug)]
struct LayerState {
    readiness: LayerReadiness,
    initialized: bool,
    viewport: ViewportState,
    mirrored: bool,
    entered_viewport: bool,
    pending_redraws: u32,
}

struct LayerInner {
    name: String,
    state: RefCell<LayerState>,
    listeners: RefCell<ListenerRegistry>,
}

/// Shared handle to a visual layer.
#[derive(Clone)]
pub struct LayerHandle(Rc<LayerInner>);

/// Non-owning handle, used by listeners that must not keep a layer alive.
#[derive(Clone)]
pub struct WeakLayerHandle(Weak<LayerInner>);

impl WeakLayerHandle {
    #[must_use]
    pub fn upgrade(&self) -> Option<LayerHandle> {
        self.0.upgrade().map(LayerHandle)
    }
}

impl fmt::Debug for LayerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayerHandle")
            .field("name", &self.0.name)
            .field("state", &self.0.state.borrow())
            .finish_non_exhaustive()
    }
}

impl LayerHandle {
    #[must_use]
    pub fn new(name: impl Into<String>, settings: &ViewportSettings) -> Self {
        Self(Rc::new(LayerInner {
            name: name.into(),
            state: RefCell::new(LayerState {
                readiness: LayerReadiness::default(),
                initialized: false,
                viewport: ViewportState::new(settings),
                mirrored: false,
                entered_viewport: false,
                pending_redraws: 0,
            }),
            listeners: RefCell::new(ListenerRegistry::default()),
        }))
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.0.name
    }

    #[must_use]
    pub fn downgrade(&self) -> WeakLayerHandle {
        WeakLayerHandle(Rc::downgrade(&self.0))
    }

    /// Whether both handles point at the same layer.
    #[must_use]
    pub fn ptr_eq(&self, other: &LayerHandle) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    // ----------------------------------------------------------------------
    // Lifecycle
    // ----------------------------------------------------------------------

    #[must_use]
    pub fn readiness(&self) -> LayerReadiness {
        self.0.state.borrow().readiness
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.0.state.borrow().initialized
    }

    /// Ready status and initialization both reached.
    #[must_use]
    pub fn is_ready_and_initialized(&self) -> bool {
        let state = self.0.state.borrow();
        state.readiness == LayerReadiness::Ready && state.initialized
    }

    pub fn set_status(&self, readiness: LayerReadiness) {
        let from = {
            let mut state = self.0.state.borrow_mut();
            std::mem::replace(&mut state.readiness, readiness)
        };
        if from != readiness {
            tracing::trace!(layer = %self.0.name, ?from, to = ?readiness, "layer status");
            self.emit(LayerEvent::StatusChanged {
                from,
                to: readiness,
            });
        }
    }

    /// Marks asynchronous initialization as complete. Only the first call notifies.
    pub fn mark_initialized(&self) {
        let already = std::mem::replace(&mut self.0.state.borrow_mut().initialized, true);
        if !already {
            self.emit(LayerEvent::Initialized);
        }
    }

    // ----------------------------------------------------------------------
    // Geometry
    // ----------------------------------------------------------------------

    /// Snapshot of the layer's viewport.
    #[must_use]
    pub fn viewport(&self) -> ViewportState {
        self.0.state.borrow().viewport.clone()
    }

    #[must_use]
    pub fn geometry(&self) -> Geometry {
        self.0.state.borrow().viewport.geometry()
    }

    #[must_use]
    pub fn zoom(&self) -> f64 {
        self.0.state.borrow().viewport.zoom()
    }

    /// Rendered content size in pixels.
    #[must_use]
    pub fn content_pixel_size(&self) -> Size<u32> {
        self.0.state.borrow().viewport.pixel_size()
    }

    /// Whether this layer's geometry is driven by another layer.
    #[must_use]
    pub fn is_mirrored(&self) -> bool {
        self.0.state.borrow().mirrored
    }

    /// Runs a viewport setter unless the layer mirrors another one.
    fn update_viewport<T>(
        &self,
        op: &str,
        apply: impl FnOnce(&mut ViewportState) -> T,
    ) -> Option<T> {
        let mut state = self.0.state.borrow_mut();
        if state.mirrored {
            tracing::warn!(layer = %self.0.name, op, "ignoring geometry change on mirrored layer");
            return None;
        }
        Some(apply(&mut state.viewport))
    }

    /// Sets the zoom (clamped, see [`ViewportState::set_zoom`]) and requests
    /// a redraw. Returns the effective zoom.
    pub fn set_zoom(&self, value: f64) -> f64 {
        let applied = self.update_viewport("set_zoom", |v| {
            v.set_zoom(value);
            v.zoom_factor()
        });
        match applied {
            Some(zoom) => {
                self.request_redraw();
                self.emit(LayerEvent::ZoomChanged(zoom));
                zoom.value()
            }
            None => self.zoom(),
        }
    }

    pub fn set_workspace_size(&self, width: f64, height: f64) {
        if self.update_viewport("set_workspace_size", |v| v.set_workspace_size(width, height))
            == Some(true)
        {
            self.request_redraw();
            self.emit(LayerEvent::WorkspaceResized);
        }
    }

    pub fn set_dpi(&self, dpi_x: f64, dpi_y: f64) {
        if self.update_viewport("set_dpi", |v| v.set_dpi(dpi_x, dpi_y)) == Some(true) {
            self.request_redraw();
            self.emit(LayerEvent::ResolutionChanged);
        }
    }

    pub fn set_device_pixel_ratio(&self, ratio: f64) {
        if self.update_viewport("set_device_pixel_ratio", |v| v.set_device_pixel_ratio(ratio))
            == Some(true)
        {
            self.request_redraw();
            self.emit(LayerEvent::ResolutionChanged);
        }
    }

    pub(crate) fn set_mirrored(&self, mirrored: bool) {
        let mut state = self.0.state.borrow_mut();
        state.mirrored = mirrored;
        if !mirrored {
            state.entered_viewport = false;
        }
    }

    /// Overwrites geometry from the mirrored layer and marks this layer as
    /// having entered the viewport.
    pub(crate) fn apply_mirrored_geometry(&self, geometry: Geometry) {
        {
            let mut state = self.0.state.borrow_mut();
            state.viewport.apply_geometry(geometry);
            state.entered_viewport = true;
            state.pending_redraws += 1;
        }
        self.emit(LayerEvent::GeometryMirrored);
    }

    #[must_use]
    pub fn has_entered_viewport(&self) -> bool {
        self.0.state.borrow().entered_viewport
    }

    // ----------------------------------------------------------------------
    // Redraw
    // ----------------------------------------------------------------------

    pub fn request_redraw(&self) {
        self.0.state.borrow_mut().pending_redraws += 1;
    }

    /// Returns and clears the number of redraws requested since the last call.
    pub fn take_redraw_requests(&self) -> u32 {
        std::mem::take(&mut self.0.state.borrow_mut().pending_redraws)
    }

    // ----------------------------------------------------------------------
    // Listeners
    // ----------------------------------------------------------------------

    /// Registers a listener. It stays registered until it returns
    /// [`ListenerFlow::Remove`] or the returned guard is dropped.
    #[must_use = "dropping the subscription unregisters the listener"]
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: FnMut(&LayerHandle, &LayerEvent) -> ListenerFlow + 'static,
    {
        let mut registry = self.0.listeners.borrow_mut();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.entries.push((id, Rc::new(RefCell::new(listener))));
        Subscription {
            layer: Rc::downgrade(&self.0),
            id: Some(id),
        }
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.0.listeners.borrow().entries.len()
    }

    fn emit(&self, event: LayerEvent) {
        let snapshot: Vec<(u64, Listener)> = self.0.listeners.borrow().entries.clone();
        let mut finished = Vec::new();

        for (id, listener) in snapshot {
            // An earlier listener in this pass may have cancelled this one.
            if !self.0.listeners.borrow().contains(id) {
                continue;
            }
            // Skip listeners already running further up the stack.
            let Ok(mut callback) = listener.try_borrow_mut() else {
                continue;
            };
            if (&mut *callback)(self, &event) == ListenerFlow::Remove {
                finished.push(id);
            }
        }

        if !finished.is_empty() {
            let mut registry = self.0.listeners.borrow_mut();
            for id in finished {
                registry.remove(id);
            }
        }
    }
}

/// Guard for a registered listener. Dropping it unregisters the listener.
#[derive(Debug)]
pub struct Subscription {
    layer: Weak<LayerInner>,
    id: Option<u64>,
}

impl Subscription {
    /// Unregisters the listener. Safe to call any number of times.
    pub fn cancel(&mut self) {
        if let (Some(id), Some(layer)) = (self.id.take(), self.layer.upgrade()) {
            layer.listeners.borrow_mut().remove(id);
        }
    }

    /// Whether the listener is still registered.
    #[must_use]
    pub fn is_active(&self) -> bool {
        match (self.id, self.layer.upgrade()) {
            (Some(id), Some(layer)) => layer.listeners.borrow().contains(id),
            _ => false,
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn layer(name: &str) -> LayerHandle {
        LayerHandle::new(name, &ViewportSettings::default())
    }

    #[test]
    fn new_layer_is_uninitialized() {
        let layer = layer("viewer");
        assert_eq!(layer.readiness(), LayerReadiness::Uninitialized);
        assert!(!layer.is_initialized());
        assert!(!layer.is_ready_and_initialized());
        assert_eq!(layer.name(), "viewer");
    }

    #[test]
    fn status_change_notifies_once_per_transition() {
        let layer = layer("viewer");
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let _sub = layer.subscribe(move |_, event| {
            sink.borrow_mut().push(*event);
            ListenerFlow::Keep
        });

        layer.set_status(LayerReadiness::Ready);
        layer.set_status(LayerReadiness::Ready);
        layer.mark_initialized();
        layer.mark_initialized();

        assert_eq!(
            *seen.borrow(),
            vec![
                LayerEvent::StatusChanged {
                    from: LayerReadiness::Uninitialized,
                    to: LayerReadiness::Ready
                },
                LayerEvent::Initialized,
            ]
        );
        assert!(layer.is_ready_and_initialized());
    }

    #[test]
    fn dropping_subscription_unregisters() {
        let layer = layer("viewer");
        let sub = layer.subscribe(|_, _| ListenerFlow::Keep);
        assert_eq!(layer.listener_count(), 1);
        drop(sub);
        assert_eq!(layer.listener_count(), 0);
    }

    #[test]
    fn cancel_is_idempotent() {
        let layer = layer("viewer");
        let mut sub = layer.subscribe(|_, _| ListenerFlow::Keep);
        assert!(sub.is_active());
        sub.cancel();
        sub.cancel();
        assert!(!sub.is_active());
        assert_eq!(layer.listener_count(), 0);
    }

    #[test]
    fn remove_flow_unregisters_after_first_call() {
        let layer = layer("viewer");
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let sub = layer.subscribe(move |_, _| {
            counter.set(counter.get() + 1);
            ListenerFlow::Remove
        });

        layer.set_status(LayerReadiness::Initializing);
        layer.set_status(LayerReadiness::Ready);

        assert_eq!(calls.get(), 1);
        assert!(!sub.is_active());
    }

    #[test]
    fn subscription_outliving_layer_is_harmless() {
        let layer = layer("viewer");
        let mut sub = layer.subscribe(|_, _| ListenerFlow::Keep);
        drop(layer);
        assert!(!sub.is_active());
        sub.cancel();
    }

    #[test]
    fn zoom_change_requests_redraw_and_notifies() {
        let layer = layer("viewer");
        let zooms = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&zooms);
        let _sub = layer.subscribe(move |_, event| {
            if let LayerEvent::ZoomChanged(zoom) = event {
                sink.borrow_mut().push(zoom.value());
            }
            ListenerFlow::Keep
        });

        assert_eq!(layer.set_zoom(2.0), 2.0);
        assert_eq!(*zooms.borrow(), vec![2.0]);
        assert_eq!(layer.take_redraw_requests(), 1);
        assert_eq!(layer.take_redraw_requests(), 0);
    }

    #[test]
    fn mirrored_layer_rejects_direct_geometry_changes() {
        let layer = layer("rubberband");
        layer.set_mirrored(true);

        assert_eq!(layer.set_zoom(4.0), 1.0);
        layer.set_dpi(200.0, 200.0);
        assert_eq!(layer.geometry(), Geometry::default());
        assert_eq!(layer.take_redraw_requests(), 0);
    }

    #[test]
    fn listener_may_read_layer_during_dispatch() {
        let layer = layer("viewer");
        let observed = Rc::new(Cell::new(false));
        let flag = Rc::clone(&observed);
        let _sub = layer.subscribe(move |layer, _| {
            flag.set(layer.is_ready_and_initialized());
            ListenerFlow::Keep
        });

        layer.set_status(LayerReadiness::Ready);
        assert!(!observed.get());
        layer.mark_initialized();
        assert!(observed.get());
    }
}
