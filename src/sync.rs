// SPDX-License-Identifier: MPL-2.0
//! Keeps dependent overlay layers pixel-aligned with a primary layer.
//!
//! A dependent receives the primary's geometry only once it reports both
//! `Ready` status and completed initialization. Until then the coordinator
//! waits on a one-shot listener; afterwards every zoom, resolution and
//! workspace change of the primary is mirrored onto it.

use crate::layer::{LayerEvent, LayerHandle, ListenerFlow, Subscription};
use crate::viewport::Geometry;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

#[derive(Debug)]
struct SyncLink {
    dependent: LayerHandle,
    synced: Rc<Cell<bool>>,
    /// One-shot readiness listener, present until the first push.
    pending: Option<Subscription>,
}

type Links = Rc<RefCell<Vec<SyncLink>>>;

/// Pushes the primary's full geometry and marks the dependent as in view.
fn push_full(primary: &LayerHandle, dependent: &LayerHandle) {
    dependent.apply_mirrored_geometry(primary.geometry());
    tracing::debug!(
        primary = primary.name(),
        dependent = dependent.name(),
        "dependent layer synced"
    );
}

/// Pushes zoom and resolution, keeping the dependent's workspace size.
fn push_zoom(primary: &LayerHandle, dependent: &LayerHandle) {
    let source = primary.geometry();
    let current = dependent.geometry();
    dependent.apply_mirrored_geometry(Geometry {
        workspace_width: current.workspace_width,
        workspace_height: current.workspace_height,
        ..source
    });
}

fn for_each_synced(links: &RefCell<Vec<SyncLink>>, mut push: impl FnMut(&LayerHandle)) {
    // Collect first: pushing notifies the dependent's listeners, which must
    // be free to query the coordinator.
    let targets: Vec<LayerHandle> = links
        .borrow()
        .iter()
        .filter(|link| link.synced.get())
        .map(|link| link.dependent.clone())
        .collect();
    for dependent in &targets {
        push(dependent);
    }
}

/// One-way geometry sync from a primary layer to its dependents.
#[derive(Debug)]
pub struct SyncCoordinator {
    primary: LayerHandle,
    links: Links,
    _primary_subscription: Subscription,
}

impl SyncCoordinator {
    /// Creates a coordinator mirroring every geometry change of `primary`.
    #[must_use]
    pub fn new(primary: &LayerHandle) -> Self {
        let links: Links = Rc::new(RefCell::new(Vec::new()));
        let weak_links: Weak<RefCell<Vec<SyncLink>>> = Rc::downgrade(&links);

        let subscription = primary.subscribe(move |primary, event| {
            let Some(links) = weak_links.upgrade() else {
                return ListenerFlow::Remove;
            };
            match event {
                LayerEvent::ZoomChanged(_) | LayerEvent::ResolutionChanged => {
                    for_each_synced(&links, |dependent| push_zoom(primary, dependent));
                }
                LayerEvent::WorkspaceResized => {
                    for_each_synced(&links, |dependent| push_full(primary, dependent));
                }
                _ => {}
            }
            ListenerFlow::Keep
        });

        Self {
            primary: primary.clone(),
            links,
            _primary_subscription: subscription,
        }
    }

    #[must_use]
    pub fn primary(&self) -> &LayerHandle {
        &self.primary
    }

    #[must_use]
    pub fn dependent_count(&self) -> usize {
        self.links.borrow().len()
    }

    #[must_use]
    pub fn is_attached(&self, dependent: &LayerHandle) -> bool {
        self.links
            .borrow()
            .iter()
            .any(|link| link.dependent.ptr_eq(dependent))
    }

    /// Whether `dependent` has received the primary's geometry.
    #[must_use]
    pub fn is_synced(&self, dependent: &LayerHandle) -> bool {
        self.links
            .borrow()
            .iter()
            .any(|link| link.dependent.ptr_eq(dependent) && link.synced.get())
    }

    /// Registers `dependent` as a mirror of the primary.
    ///
    /// A dependent that is already ready and initialized is synced right
    /// away. Otherwise the sync runs exactly once, as soon as both
    /// conditions hold. Attaching twice, or attaching the primary to
    /// itself, does nothing.
    pub fn attach(&mut self, dependent: &LayerHandle) {
        if dependent.ptr_eq(&self.primary) {
            tracing::warn!(layer = dependent.name(), "cannot mirror a layer onto itself");
            return;
        }
        if self.is_attached(dependent) {
            return;
        }

        dependent.set_mirrored(true);
        let synced = Rc::new(Cell::new(false));

        let pending = if dependent.is_ready_and_initialized() {
            push_full(&self.primary, dependent);
            synced.set(true);
            None
        } else {
            tracing::debug!(
                dependent = dependent.name(),
                "deferring sync until dependent is ready"
            );
            let primary = self.primary.downgrade();
            let flag = Rc::clone(&synced);
            Some(dependent.subscribe(move |dependent, event| {
                if !matches!(
                    event,
                    LayerEvent::StatusChanged { .. } | LayerEvent::Initialized
                ) {
                    return ListenerFlow::Keep;
                }
                if flag.get() {
                    return ListenerFlow::Remove;
                }
                if !dependent.is_ready_and_initialized() {
                    return ListenerFlow::Keep;
                }
                let Some(primary) = primary.upgrade() else {
                    return ListenerFlow::Remove;
                };
                flag.set(true);
                push_full(&primary, dependent);
                ListenerFlow::Remove
            }))
        };

        self.links.borrow_mut().push(SyncLink {
            dependent: dependent.clone(),
            synced,
            pending,
        });
    }

    /// Pushes the primary's current zoom and resolution to every synced
    /// dependent and requests a redraw on each.
    pub fn propagate_zoom(&self) {
        for_each_synced(&self.links, |dependent| push_zoom(&self.primary, dependent));
    }

    /// Stops mirroring onto `dependent` and drops its pending listener.
    /// Returns whether it was attached; detaching twice is harmless.
    pub fn detach(&mut self, dependent: &LayerHandle) -> bool {
        let removed = {
            let mut links = self.links.borrow_mut();
            let index = links
                .iter()
                .position(|link| link.dependent.ptr_eq(dependent));
            index.map(|index| links.remove(index))
        };

        match removed {
            Some(mut link) => {
                if let Some(mut pending) = link.pending.take() {
                    pending.cancel();
                }
                link.dependent.set_mirrored(false);
                true
            }
            None => false,
        }
    }
}

impl Drop for SyncCoordinator {
    fn drop(&mut self) {
        for link in self.links.borrow().iter() {
            link.dependent.set_mirrored(false);
        }
    }
}
