#![forbid(unsafe_code)]

//! Host surface contract and the concrete text-view surface.
//!
//! A host surface is the one view a space-reservation stack is bound to. The
//! stack never owns it: it only queries the lifecycle flag and listens for
//! the closed notification.
//!
//! # Invariants
//!
//! 1. `is_closed()` never goes back from `true` to `false`.
//! 2. The closed notifier fires at most once per surface.

use std::cell::Cell;
use std::rc::Rc;

use tracing::debug;

use crate::geometry::Rect;
use crate::notify::Notifier;

/// What a reservation stack, its providers, and their agents need from the
/// view they decorate.
pub trait HostSurface {
    /// Whether the surface has been closed. Terminal once true.
    fn is_closed(&self) -> bool;

    /// Fires once, when the surface closes.
    fn closed(&self) -> &Notifier<()>;

    /// Whether the surface is currently shown.
    fn is_visible(&self) -> bool {
        true
    }

    /// Visible area of the surface in cell coordinates.
    fn viewport(&self) -> Rect;
}

/// Shared handle to a host surface.
pub type SurfaceRef = Rc<dyn HostSurface>;

/// Single-threaded text view surface.
#[derive(Debug)]
pub struct TextViewSurface {
    closed: Cell<bool>,
    visible: Cell<bool>,
    viewport: Cell<Rect>,
    on_closed: Notifier<()>,
}

impl TextViewSurface {
    /// Create an open, visible surface.
    #[must_use]
    pub fn new(viewport: Rect) -> Self {
        Self {
            closed: Cell::new(false),
            visible: Cell::new(true),
            viewport: Cell::new(viewport),
            on_closed: Notifier::new(),
        }
    }

    /// Create an open surface already wrapped for sharing.
    #[must_use]
    pub fn shared(viewport: Rect) -> Rc<Self> {
        Rc::new(Self::new(viewport))
    }

    /// Close the surface and fire the closed notification.
    ///
    /// Returns `false` if the surface was already closed (nothing fires).
    pub fn close(&self) -> bool {
        if self.closed.replace(true) {
            return false;
        }
        debug!(
            listeners = self.on_closed.active_count(),
            "text view closed"
        );
        self.on_closed.emit(&());
        true
    }

    pub fn set_visible(&self, visible: bool) {
        self.visible.set(visible);
    }

    pub fn set_viewport(&self, viewport: Rect) {
        self.viewport.set(viewport);
    }
}

impl HostSurface for TextViewSurface {
    fn is_closed(&self) -> bool {
        self.closed.get()
    }

    fn closed(&self) -> &Notifier<()> {
        &self.on_closed
    }

    fn is_visible(&self) -> bool {
        self.visible.get()
    }

    fn viewport(&self) -> Rect {
        self.viewport.get()
    }
}
