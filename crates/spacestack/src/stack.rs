#![forbid(unsafe_code)]

//! Reservation stack: named providers with one aggregate focus signal.
//!
//! A [`ReservationStack`] is bound to one host surface. It owns a fixed slot
//! table keyed by the names it was built with, creates each provider the
//! first time its name is requested, and republishes the providers' focus
//! changes as a single edge-triggered signal.
//!
//! # Invariants
//!
//! 1. A slot is filled at most once and is only emptied by teardown.
//! 2. `has_aggregate_focus()` is the OR of every live provider's focus as of
//!    the last provider notification; got/lost fire only on a change of that
//!    OR, never both for one notification.
//! 3. Open → Closed happens once and is terminal: on the surface's closed
//!    notification, or on the first call that finds the surface closed or
//!    dropped. Teardown revokes every subscription the stack holds before it
//!    releases the providers.
//! 4. No internal borrow is held while provider code or a listener runs.
//!
//! # Failure Modes
//!
//! | Call | Condition | Result |
//! |------|-----------|--------|
//! | `get_provider` | surface closed | `InvalidOperation` |
//! | `get_provider` | empty name | `InvalidArgument` |
//! | `get_provider` | name not in table | `NotFound` |
//! | provider focus notification | surface closed | ignored |
//! | `refresh` | surface closed or no live provider | no-op |

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use spacestack_core::logging::{debug, debug_span, trace, warn};
use spacestack_core::{HostSurface, Notifier, RegionGroup, Subscription, SurfaceRef};

use crate::config::StackConfig;
use crate::error::StackError;
use crate::provider::{ProviderFactory, ReservationProvider};

/// Lifecycle state of a stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum StackState {
    Open,
    Closed,
}

/// Point-in-time view of a stack, for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct StackSnapshot {
    pub state: StackState,
    pub names: Vec<String>,
    /// Parallel to `names`: whether that slot holds a provider.
    pub populated: Vec<bool>,
    pub has_aggregate_focus: bool,
}

struct Slot<P> {
    provider: Rc<P>,
    got_focus: Subscription,
    lost_focus: Subscription,
}

struct Shared<P> {
    surface: Weak<dyn HostSurface>,
    names: Box<[String]>,
    factory: Box<dyn ProviderFactory<P>>,
    state: Cell<StackState>,
    has_aggregate_focus: Cell<bool>,
    slots: RefCell<Vec<Option<Slot<P>>>>,
    surface_closed: RefCell<Option<Subscription>>,
    got_aggregate_focus: Notifier<()>,
    lost_aggregate_focus: Notifier<()>,
}

/// Named set of providers bound to one host surface.
pub struct ReservationStack<P: ReservationProvider> {
    shared: Rc<Shared<P>>,
}

impl<P: ReservationProvider> ReservationStack<P> {
    /// Create a stack bound to `surface` with the given name table.
    ///
    /// Subscribes to the surface's closed notification. A surface that is
    /// already closed yields a stack that starts out closed.
    pub fn new<S, N, F>(surface: &Rc<S>, names: N, factory: F) -> Self
    where
        S: HostSurface + 'static,
        N: IntoIterator,
        N::Item: Into<String>,
        F: ProviderFactory<P> + 'static,
    {
        let surface: SurfaceRef = surface.clone();
        let names: Box<[String]> = names.into_iter().map(Into::into).collect();
        Self::from_parts(&surface, names, Box::new(factory))
    }

    /// Start a [`StackBuilder`].
    #[must_use]
    pub fn builder() -> StackBuilder<P> {
        StackBuilder::new()
    }

    fn from_parts(
        surface: &SurfaceRef,
        names: Box<[String]>,
        factory: Box<dyn ProviderFactory<P>>,
    ) -> Self {
        for (index, name) in names.iter().enumerate() {
            if names[..index].contains(name) {
                warn!(name = %name, index, "duplicate manager name; first occurrence wins");
            }
        }

        let already_closed = surface.is_closed();
        let slot_count = names.len();
        let shared = Rc::new_cyclic(|weak: &Weak<Shared<P>>| {
            let surface_closed = if already_closed {
                None
            } else {
                let weak = weak.clone();
                Some(surface.closed().subscribe(move |_| {
                    if let Some(shared) = weak.upgrade() {
                        shared.on_surface_closed();
                    }
                }))
            };
            Shared {
                surface: Rc::downgrade(surface),
                names,
                factory,
                state: Cell::new(if already_closed {
                    StackState::Closed
                } else {
                    StackState::Open
                }),
                has_aggregate_focus: Cell::new(false),
                slots: RefCell::new((0..slot_count).map(|_| None).collect()),
                surface_closed: RefCell::new(surface_closed),
                got_aggregate_focus: Notifier::new(),
                lost_aggregate_focus: Notifier::new(),
            }
        });
        debug!(slots = slot_count, closed = already_closed, "reservation stack created");
        Self { shared }
    }

    /// Return the provider for `name`, creating it on first request.
    ///
    /// # Errors
    ///
    /// - [`StackError::InvalidOperation`] once the surface has closed.
    /// - [`StackError::InvalidArgument`] for an empty name.
    /// - [`StackError::NotFound`] if `name` is not in the name table.
    pub fn get_provider(&self, name: &str) -> Result<Rc<P>, StackError> {
        let shared = &self.shared;
        if shared.is_closed() {
            return Err(StackError::surface_closed());
        }
        if name.is_empty() {
            return Err(StackError::InvalidArgument { what: "name" });
        }
        let index = shared.index_of(name).ok_or_else(|| StackError::NotFound {
            name: name.to_owned(),
        })?;

        if let Some(slot) = &shared.slots.borrow()[index] {
            return Ok(Rc::clone(&slot.provider));
        }

        let surface = shared
            .surface
            .upgrade()
            .ok_or_else(StackError::surface_closed)?;
        let provider = Rc::new(shared.factory.create(name, &surface));

        // The factory ran with no borrow held; it may have closed the
        // surface or filled this slot through a nested request.
        if shared.is_closed() {
            return Err(StackError::surface_closed());
        }
        if let Some(slot) = &shared.slots.borrow()[index] {
            return Ok(Rc::clone(&slot.provider));
        }

        let got_focus = provider.got_aggregate_focus().subscribe(focus_handler(shared));
        let lost_focus = provider
            .lost_aggregate_focus()
            .subscribe(focus_handler(shared));
        shared.slots.borrow_mut()[index] = Some(Slot {
            provider: Rc::clone(&provider),
            got_focus,
            lost_focus,
        });
        debug!(name, index, "space reservation manager created");
        Ok(provider)
    }

    /// Whether the pointer is over content of any live provider.
    #[must_use]
    pub fn is_mouse_over(&self) -> bool {
        if self.shared.is_closed() {
            return false;
        }
        self.shared
            .live_providers()
            .iter()
            .any(|provider| provider.is_mouse_over())
    }

    /// Cached aggregate focus: true while any live provider has focus.
    #[must_use]
    pub fn has_aggregate_focus(&self) -> bool {
        !self.shared.is_closed() && self.shared.has_aggregate_focus.get()
    }

    /// Fires when aggregate focus goes from false to true.
    #[must_use]
    pub fn got_aggregate_focus(&self) -> &Notifier<()> {
        &self.shared.got_aggregate_focus
    }

    /// Fires when aggregate focus goes from true to false.
    #[must_use]
    pub fn lost_aggregate_focus(&self) -> &Notifier<()> {
        &self.shared.lost_aggregate_focus
    }

    /// Ask every live provider, in name-table order, to position and show
    /// itself against one shared region accumulator.
    ///
    /// Returns the accumulated region, or `None` if the surface is closed or
    /// no provider has been created yet (no accumulator is built then).
    pub fn refresh(&self) -> Option<RegionGroup> {
        if self.shared.is_closed() {
            return None;
        }
        let providers = self.shared.live_providers();
        if providers.is_empty() {
            return None;
        }

        let _span = debug_span!("spacestack.refresh", providers = providers.len()).entered();
        let mut region = RegionGroup::new();
        for provider in &providers {
            provider.position_and_display(&mut region);
        }
        trace!(reserved = region.len(), "refresh complete");
        Some(region)
    }

    /// Lifecycle state. Always agrees with [`is_closed`](Self::is_closed):
    /// a surface that reports closed, or has been dropped, tears the stack
    /// down on the next call even if no closed notification arrived.
    #[must_use]
    pub fn state(&self) -> StackState {
        if self.shared.is_closed() {
            StackState::Closed
        } else {
            StackState::Open
        }
    }

    /// Whether the stack is closed or its surface reports closed (or is gone).
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.shared.is_closed()
    }

    /// The name table, in slot order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.shared.names
    }

    /// Number of slots currently holding a provider.
    #[must_use]
    pub fn populated_count(&self) -> usize {
        self.shared.is_closed();
        self.shared.slots.borrow().iter().flatten().count()
    }

    #[must_use]
    pub fn snapshot(&self) -> StackSnapshot {
        StackSnapshot {
            state: self.state(),
            names: self.shared.names.to_vec(),
            populated: self.shared.slots.borrow().iter().map(Option::is_some).collect(),
            has_aggregate_focus: self.has_aggregate_focus(),
        }
    }
}

impl<P: ReservationProvider> fmt::Debug for ReservationStack<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReservationStack")
            .field("state", &self.state())
            .field("names", &self.shared.names)
            .field("populated", &self.populated_count())
            .field("has_aggregate_focus", &self.has_aggregate_focus())
            .finish()
    }
}

fn focus_handler<P: ReservationProvider>(shared: &Rc<Shared<P>>) -> impl Fn(&()) + 'static {
    let weak = Rc::downgrade(shared);
    move |_| {
        if let Some(shared) = weak.upgrade() {
            shared.update_aggregate_focus();
        }
    }
}

impl<P: ReservationProvider> Shared<P> {
    /// Closed check. A surface that closed or was dropped without this
    /// stack seeing the notification triggers teardown here.
    fn is_closed(&self) -> bool {
        if self.state.get() == StackState::Closed {
            return true;
        }
        let surface_gone = self
            .surface
            .upgrade()
            .is_none_or(|surface| surface.is_closed());
        if surface_gone {
            self.on_surface_closed();
        }
        surface_gone
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Providers in slot order, cloned out so no borrow outlives the call.
    fn live_providers(&self) -> Vec<Rc<P>> {
        self.slots
            .borrow()
            .iter()
            .flatten()
            .map(|slot| Rc::clone(&slot.provider))
            .collect()
    }

    fn update_aggregate_focus(&self) {
        if self.is_closed() {
            trace!("focus notification after close ignored");
            return;
        }
        let focused = self
            .live_providers()
            .iter()
            .any(|provider| provider.has_aggregate_focus());
        if focused == self.has_aggregate_focus.replace(focused) {
            return;
        }
        trace!(focused, "aggregate focus changed");
        if focused {
            self.got_aggregate_focus.emit(&());
        } else {
            self.lost_aggregate_focus.emit(&());
        }
    }

    fn on_surface_closed(&self) {
        if self.state.replace(StackState::Closed) == StackState::Closed {
            return;
        }
        let closed_sub = self.surface_closed.borrow_mut().take();
        if let Some(sub) = closed_sub {
            sub.revoke();
        }

        let released: Vec<Slot<P>> = self
            .slots
            .borrow_mut()
            .iter_mut()
            .filter_map(Option::take)
            .collect();
        let count = released.len();
        for slot in released {
            slot.got_focus.revoke();
            slot.lost_focus.revoke();
            drop(slot.provider);
        }
        // No live providers remain, so the OR is false. No event fires.
        self.has_aggregate_focus.set(false);
        debug!(released = count, "reservation stack closed");
    }
}

/// Builder for [`ReservationStack`].
///
/// `build()` fails with [`StackError::InvalidArgument`] when the surface,
/// the name table, or the factory is missing.
pub struct StackBuilder<P> {
    surface: Option<SurfaceRef>,
    names: Option<Box<[String]>>,
    factory: Option<Box<dyn ProviderFactory<P>>>,
}

impl<P> Default for StackBuilder<P> {
    fn default() -> Self {
        Self {
            surface: None,
            names: None,
            factory: None,
        }
    }
}

impl<P: ReservationProvider> StackBuilder<P> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn surface<S: HostSurface + 'static>(mut self, surface: &Rc<S>) -> Self {
        let surface: SurfaceRef = surface.clone();
        self.surface = Some(surface);
        self
    }

    #[must_use]
    pub fn names<N>(mut self, names: N) -> Self
    where
        N: IntoIterator,
        N::Item: Into<String>,
    {
        self.names = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Take the name table from `config`.
    #[must_use]
    pub fn config(self, config: &StackConfig) -> Self {
        self.names(config.names.iter().cloned())
    }

    #[must_use]
    pub fn factory<F: ProviderFactory<P> + 'static>(mut self, factory: F) -> Self {
        self.factory = Some(Box::new(factory));
        self
    }

    pub fn build(self) -> Result<ReservationStack<P>, StackError> {
        let surface = self
            .surface
            .ok_or(StackError::InvalidArgument { what: "surface" })?;
        let names = self
            .names
            .ok_or(StackError::InvalidArgument { what: "names" })?;
        let factory = self
            .factory
            .ok_or(StackError::InvalidArgument { what: "factory" })?;
        Ok(ReservationStack::from_parts(&surface, names, factory))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spacestack_core::{Rect, TextViewSurface};

    #[derive(Debug, Default)]
    struct Probe {
        focused: Cell<bool>,
        hovered: Cell<bool>,
        positioned: Cell<u32>,
        got: Notifier<()>,
        lost: Notifier<()>,
    }

    impl Probe {
        fn set_focus(&self, focused: bool) {
            if self.focused.replace(focused) == focused {
                return;
            }
            if focused {
                self.got.emit(&());
            } else {
                self.lost.emit(&());
            }
        }
    }

    impl ReservationProvider for Probe {
        fn is_mouse_over(&self) -> bool {
            self.hovered.get()
        }
        fn has_aggregate_focus(&self) -> bool {
            self.focused.get()
        }
        fn got_aggregate_focus(&self) -> &Notifier<()> {
            &self.got
        }
        fn lost_aggregate_focus(&self) -> &Notifier<()> {
            &self.lost
        }
        fn position_and_display(&self, region: &mut RegionGroup) {
            self.positioned.set(self.positioned.get() + 1);
            region.push(Rect::new(0, region.len() as u16, 4, 1));
        }
    }

    fn surface() -> Rc<TextViewSurface> {
        TextViewSurface::shared(Rect::from_size(80, 24))
    }

    fn probe_factory(created: Rc<Cell<u32>>) -> impl Fn(&str, &SurfaceRef) -> Probe {
        move |_, _| {
            created.set(created.get() + 1);
            Probe::default()
        }
    }

    fn stack_with(names: &[&str]) -> (Rc<TextViewSurface>, ReservationStack<Probe>, Rc<Cell<u32>>) {
        let surface = surface();
        let created = Rc::new(Cell::new(0));
        let stack = ReservationStack::new(
            &surface,
            names.iter().copied(),
            probe_factory(Rc::clone(&created)),
        );
        (surface, stack, created)
    }

    fn counter(notifier: &Notifier<()>) -> (Rc<Cell<u32>>, Subscription) {
        let count = Rc::new(Cell::new(0u32));
        let count_clone = Rc::clone(&count);
        let sub = notifier.subscribe(move |_| count_clone.set(count_clone.get() + 1));
        (count, sub)
    }

    #[test]
    fn new_stack_is_open_and_empty() {
        let (surface, stack, created) = stack_with(&["a", "b"]);
        assert_eq!(stack.state(), StackState::Open);
        assert_eq!(stack.populated_count(), 0);
        assert!(!stack.has_aggregate_focus());
        assert_eq!(created.get(), 0);
        assert_eq!(surface.closed().active_count(), 1);
    }

    #[test]
    fn provider_created_once() {
        let (_surface, stack, created) = stack_with(&["a", "b"]);
        let first = stack.get_provider("a").unwrap();
        let second = stack.get_provider("a").unwrap();
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(created.get(), 1);
        assert_eq!(first.got.active_count(), 1);
        assert_eq!(first.lost.active_count(), 1);
    }

    #[test]
    fn unknown_name_is_not_found() {
        let (_surface, stack, created) = stack_with(&["a"]);
        let err = stack.get_provider("A").unwrap_err();
        assert_eq!(err, StackError::NotFound { name: "A".into() });
        assert_eq!(created.get(), 0);
    }

    #[test]
    fn empty_name_is_invalid_argument() {
        let (_surface, stack, _) = stack_with(&["a"]);
        assert_eq!(
            stack.get_provider("").unwrap_err(),
            StackError::InvalidArgument { what: "name" }
        );
    }

    #[test]
    fn empty_name_table_never_yields_providers() {
        let (_surface, stack, created) = stack_with(&[]);
        assert!(matches!(
            stack.get_provider("a"),
            Err(StackError::NotFound { .. })
        ));
        assert_eq!(created.get(), 0);
        assert!(stack.refresh().is_none());
    }

    #[test]
    fn duplicate_names_resolve_to_first_slot() {
        let (_surface, stack, created) = stack_with(&["a", "a"]);
        stack.get_provider("a").unwrap();
        assert_eq!(stack.snapshot().populated, vec![true, false]);
        assert_eq!(created.get(), 1);
    }

    #[test]
    fn focus_transitions_are_edge_triggered() {
        let (_surface, stack, _) = stack_with(&["a", "b"]);
        let (got, _g) = counter(stack.got_aggregate_focus());
        let (lost, _l) = counter(stack.lost_aggregate_focus());
        let a = stack.get_provider("a").unwrap();
        let b = stack.get_provider("b").unwrap();

        a.set_focus(true);
        assert!(stack.has_aggregate_focus());
        b.set_focus(true);
        a.set_focus(false);
        assert!(stack.has_aggregate_focus());
        assert_eq!((got.get(), lost.get()), (1, 0));

        b.set_focus(false);
        assert!(!stack.has_aggregate_focus());
        assert_eq!((got.get(), lost.get()), (1, 1));
    }

    #[test]
    fn spurious_notification_raises_nothing() {
        let (_surface, stack, _) = stack_with(&["a"]);
        let (got, _g) = counter(stack.got_aggregate_focus());
        let (lost, _l) = counter(stack.lost_aggregate_focus());
        let a = stack.get_provider("a").unwrap();

        // Lost without a prior gain: OR is still false.
        a.lost.emit(&());
        assert_eq!((got.get(), lost.get()), (0, 0));
    }

    #[test]
    fn listener_may_query_stack_during_event() {
        let (_surface, stack, _) = stack_with(&["a"]);
        let stack = Rc::new(stack);
        let seen = Rc::new(Cell::new(false));
        let seen_clone = Rc::clone(&seen);
        let weak = Rc::downgrade(&stack);
        let _sub = stack.got_aggregate_focus().subscribe(move |_| {
            if let Some(stack) = weak.upgrade() {
                seen_clone.set(stack.has_aggregate_focus() && !stack.is_mouse_over());
            }
        });

        stack.get_provider("a").unwrap().set_focus(true);
        assert!(seen.get());
    }

    #[test]
    fn mouse_over_scans_live_providers() {
        let (_surface, stack, _) = stack_with(&["a", "b"]);
        assert!(!stack.is_mouse_over());
        let b = stack.get_provider("b").unwrap();
        assert!(!stack.is_mouse_over());
        b.hovered.set(true);
        assert!(stack.is_mouse_over());
    }

    #[test]
    fn refresh_without_providers_builds_nothing() {
        let (_surface, stack, _) = stack_with(&["a", "b"]);
        assert!(stack.refresh().is_none());
    }

    #[test]
    fn refresh_shares_one_region_in_slot_order() {
        let (_surface, stack, _) = stack_with(&["a", "b", "c"]);
        // Request out of order; refresh still walks slot order.
        let c = stack.get_provider("c").unwrap();
        let a = stack.get_provider("a").unwrap();

        let region = stack.refresh().unwrap();
        assert_eq!(region.rects(), &[Rect::new(0, 0, 4, 1), Rect::new(0, 1, 4, 1)]);
        assert_eq!(a.positioned.get(), 1);
        assert_eq!(c.positioned.get(), 1);
    }

    #[test]
    fn close_tears_down_everything() {
        let (surface, stack, _) = stack_with(&["a", "b"]);
        let a = stack.get_provider("a").unwrap();
        let b = stack.get_provider("b").unwrap();
        a.set_focus(true);
        b.hovered.set(true);

        surface.close();

        assert_eq!(stack.state(), StackState::Closed);
        assert_eq!(stack.populated_count(), 0);
        assert_eq!(a.got.active_count(), 0);
        assert_eq!(a.lost.active_count(), 0);
        assert_eq!(b.got.active_count(), 0);
        assert_eq!(surface.closed().active_count(), 0);
        assert!(!stack.is_mouse_over());
        assert!(!stack.has_aggregate_focus());
        // Only the caller's handles keep the providers alive now.
        assert_eq!(Rc::strong_count(&a), 1);
    }

    #[test]
    fn calls_after_close() {
        let (surface, stack, created) = stack_with(&["a"]);
        let a = stack.get_provider("a").unwrap();
        surface.close();

        assert_eq!(
            stack.get_provider("a").unwrap_err(),
            StackError::surface_closed()
        );
        assert!(stack.refresh().is_none());
        assert_eq!(a.positioned.get(), 0);
        assert_eq!(created.get(), 1);
    }

    #[test]
    fn late_focus_notifications_are_ignored() {
        let (surface, stack, _) = stack_with(&["a"]);
        let (got, _g) = counter(stack.got_aggregate_focus());
        let a = stack.get_provider("a").unwrap();
        surface.close();

        a.set_focus(true);
        a.got.emit(&());
        assert_eq!(got.get(), 0);
        assert!(!stack.has_aggregate_focus());
    }

    #[test]
    fn notification_racing_close_is_ignored() {
        // A closed listener registered before the stack sees the surface
        // closed first and pokes a provider before the stack's teardown runs.
        let surface = surface();
        let provider_slot: Rc<RefCell<Option<Rc<Probe>>>> = Rc::new(RefCell::new(None));
        let slot_clone = Rc::clone(&provider_slot);
        let _early = surface.closed().subscribe(move |_| {
            if let Some(p) = slot_clone.borrow().as_ref() {
                p.set_focus(true);
            }
        });
        let stack = ReservationStack::new(&surface, ["a"], |_: &str, _: &SurfaceRef| {
            Probe::default()
        });
        let (got, _g) = counter(stack.got_aggregate_focus());
        *provider_slot.borrow_mut() = Some(stack.get_provider("a").unwrap());

        surface.close();
        assert_eq!(got.get(), 0);
        assert_eq!(stack.state(), StackState::Closed);
    }

    #[test]
    fn stack_on_closed_surface_starts_closed() {
        let surface = surface();
        surface.close();
        let stack = ReservationStack::new(&surface, ["a"], |_: &str, _: &SurfaceRef| {
            Probe::default()
        });
        assert_eq!(stack.state(), StackState::Closed);
        assert_eq!(surface.closed().subscriber_count(), 0);
        assert!(stack.get_provider("a").is_err());
    }

    #[test]
    fn dropped_surface_counts_as_closed() {
        let surface = surface();
        let stack = ReservationStack::new(&surface, ["a"], |_: &str, _: &SurfaceRef| {
            Probe::default()
        });
        let a = stack.get_provider("a").unwrap();
        a.hovered.set(true);
        a.set_focus(true);
        assert!(stack.has_aggregate_focus());

        drop(surface);

        assert_eq!(stack.state(), StackState::Closed);
        assert!(stack.is_closed());
        assert_eq!(stack.populated_count(), 0);
        assert!(!stack.is_mouse_over());
        assert!(!stack.has_aggregate_focus());
        assert_eq!(a.got.active_count(), 0);
        assert_eq!(a.lost.active_count(), 0);
        assert_eq!(stack.snapshot().populated, vec![false]);
        assert_eq!(
            stack.get_provider("a").unwrap_err(),
            StackError::surface_closed()
        );
        assert!(stack.refresh().is_none());
        assert_eq!(a.positioned.get(), 0);
    }

    #[test]
    fn unnotified_close_is_seen_by_state() {
        // Runs before the stack's own closed listener: the surface already
        // reports closed but the stack has not been notified.
        let surface = surface();
        let target: Rc<RefCell<Option<Weak<ReservationStack<Probe>>>>> =
            Rc::new(RefCell::new(None));
        let seen = Rc::new(Cell::new(None));
        let target_clone = Rc::clone(&target);
        let seen_clone = Rc::clone(&seen);
        let _early = surface.closed().subscribe(move |_| {
            if let Some(stack) = target_clone.borrow().as_ref().and_then(Weak::upgrade) {
                seen_clone.set(Some((stack.state(), stack.populated_count())));
            }
        });
        let stack = Rc::new(ReservationStack::new(&surface, ["a"], |_: &str, _: &SurfaceRef| {
            Probe::default()
        }));
        stack.get_provider("a").unwrap();
        *target.borrow_mut() = Some(Rc::downgrade(&stack));

        surface.close();
        assert_eq!(seen.get(), Some((StackState::Closed, 0)));
        assert_eq!(surface.closed().active_count(), 1);
    }

    #[test]
    fn dropping_stack_revokes_subscriptions() {
        let (surface, stack, _) = stack_with(&["a"]);
        let a = stack.get_provider("a").unwrap();
        drop(stack);
        assert_eq!(a.got.active_count(), 0);
        assert_eq!(surface.closed().active_count(), 0);
    }

    #[test]
    fn builder_requires_every_part() {
        let surface = surface();
        let missing_surface = ReservationStack::<Probe>::builder()
            .names(["a"])
            .factory(|_: &str, _: &SurfaceRef| Probe::default())
            .build();
        assert_eq!(
            missing_surface.unwrap_err(),
            StackError::InvalidArgument { what: "surface" }
        );

        let missing_names = ReservationStack::<Probe>::builder()
            .surface(&surface)
            .factory(|_: &str, _: &SurfaceRef| Probe::default())
            .build();
        assert_eq!(
            missing_names.unwrap_err(),
            StackError::InvalidArgument { what: "names" }
        );

        let missing_factory = ReservationStack::<Probe>::builder()
            .surface(&surface)
            .names(["a"])
            .build();
        assert_eq!(
            missing_factory.unwrap_err(),
            StackError::InvalidArgument { what: "factory" }
        );
    }

    #[test]
    fn builder_takes_names_from_config() {
        let surface = surface();
        let stack = ReservationStack::<Probe>::builder()
            .surface(&surface)
            .config(&StackConfig::default())
            .factory(|_: &str, _: &SurfaceRef| Probe::default())
            .build()
            .unwrap();
        assert_eq!(stack.names(), crate::names::DEFAULT_ORDER);
        assert!(stack.get_provider(crate::names::QUICK_INFO).is_ok());
    }

    #[test]
    fn factory_receives_name_and_surface() {
        let surface = surface();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = Rc::clone(&seen);
        let stack = ReservationStack::new(&surface, ["x", "y"], move |name: &str, s: &SurfaceRef| {
            seen_clone.borrow_mut().push((name.to_owned(), s.viewport()));
            Probe::default()
        });
        stack.get_provider("y").unwrap();
        assert_eq!(
            *seen.borrow(),
            vec![("y".to_owned(), Rect::from_size(80, 24))]
        );
    }

    #[test]
    fn debug_format() {
        let (_surface, stack, _) = stack_with(&["a"]);
        let dbg = format!("{stack:?}");
        assert!(dbg.contains("ReservationStack"));
        assert!(dbg.contains("Open"));
    }
}
