#![forbid(unsafe_code)]

//! Single-threaded multicast notifications with revocable subscriptions.
//!
//! # Design
//!
//! [`Notifier<A>`] keeps its listeners as `Weak` references; the strong side
//! lives inside the [`Subscription`] returned by [`Notifier::subscribe`].
//! Revoking (or dropping) the subscription deactivates the listener at once
//! and the dead entry is pruned on the next emit.
//!
//! # Invariants
//!
//! 1. Listeners run in registration order.
//! 2. A revoked listener never runs again, even if it was revoked by an
//!    earlier listener during the same emit.
//! 3. No `RefCell` borrow is held while listeners run, so a listener may
//!    subscribe, revoke, or emit again.
//!
//! # Failure Modes
//!
//! - **Unbounded recursion**: a listener that re-emits the same notifier
//!   unconditionally will overflow the stack. Guard with state.
//! - **Leaked handle**: a `Subscription` stored forever keeps its listener
//!   alive. Revoke it when the owner is torn down.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

struct Listener<A> {
    active: Cell<bool>,
    callback: Box<dyn Fn(&A)>,
}

/// Type-erased view of a listener so [`Subscription`] need not be generic.
trait Revocable {
    fn revoke(&self);
    fn is_active(&self) -> bool;
}

impl<A> Revocable for Listener<A> {
    fn revoke(&self) {
        self.active.set(false);
    }

    fn is_active(&self) -> bool {
        self.active.get()
    }
}

struct NotifierInner<A> {
    listeners: Vec<Weak<Listener<A>>>,
    emitted: u64,
}

/// Multicast notification source.
///
/// Cloning a `Notifier` yields a second handle to the **same** listener list.
pub struct Notifier<A = ()> {
    inner: Rc<RefCell<NotifierInner<A>>>,
}

impl<A> Clone for Notifier<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<A> Default for Notifier<A> {
    fn default() -> Self {
        Self {
            inner: Rc::new(RefCell::new(NotifierInner {
                listeners: Vec::new(),
                emitted: 0,
            })),
        }
    }
}

impl<A> fmt::Debug for Notifier<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Notifier")
            .field("listeners", &inner.listeners.len())
            .field("emitted", &inner.emitted)
            .finish()
    }
}

impl<A: 'static> Notifier<A> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback`. It runs on every emit until the returned
    /// [`Subscription`] is revoked or dropped.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe(&self, callback: impl Fn(&A) + 'static) -> Subscription {
        let listener = Rc::new(Listener {
            active: Cell::new(true),
            callback: Box::new(callback),
        });
        self.inner
            .borrow_mut()
            .listeners
            .push(Rc::downgrade(&listener));
        let handle: Rc<dyn Revocable> = listener;
        Subscription {
            listener: Some(handle),
        }
    }

    /// Deliver `args` to every active listener, in registration order.
    pub fn emit(&self, args: &A) {
        let live: Vec<Rc<Listener<A>>> = {
            let mut inner = self.inner.borrow_mut();
            inner.emitted += 1;
            inner
                .listeners
                .retain(|w| w.upgrade().is_some_and(|l| l.active.get()));
            inner.listeners.iter().filter_map(Weak::upgrade).collect()
        };

        for listener in &live {
            if listener.active.get() {
                (listener.callback)(args);
            }
        }
    }

    /// Registered listeners, including revoked ones not yet pruned.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().listeners.len()
    }

    /// Listeners that would run if the notifier emitted now.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.inner
            .borrow()
            .listeners
            .iter()
            .filter(|w| w.upgrade().is_some_and(|l| l.active.get()))
            .count()
    }

    /// Total number of emits so far.
    #[must_use]
    pub fn emit_count(&self) -> u64 {
        self.inner.borrow().emitted
    }
}

/// Handle for one registered listener.
///
/// Revoking, either explicitly via [`Subscription::revoke`] or by dropping
/// the handle, stops the listener from running.
pub struct Subscription {
    listener: Option<Rc<dyn Revocable>>,
}

impl Subscription {
    /// Stop the listener now.
    pub fn revoke(mut self) {
        self.revoke_in_place();
    }

    /// Whether the listener is still registered and active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.listener.as_ref().is_some_and(|l| l.is_active())
    }

    fn revoke_in_place(&mut self) {
        if let Some(listener) = self.listener.take() {
            listener.revoke();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.revoke_in_place();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}
