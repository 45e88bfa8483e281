#![forbid(unsafe_code)]

//! Agent-hosting provider.
//!
//! A [`SpaceReservationManager`] owns an ordered list of
//! [`ReservationAgent`]s (tooltips, completion lists, signature popups) and
//! presents them to a [`ReservationStack`](crate::ReservationStack) as one
//! [`ReservationProvider`]. Each refresh it asks its agents where they want
//! to go, given the space already reserved, and records what they took.
//!
//! # Invariants
//!
//! 1. An agent appears in the list at most once (pointer identity).
//! 2. Every listed agent has exactly two live focus subscriptions; removal
//!    revokes both and hides the agent.
//! 3. Focus got/lost fire only on a change of "any agent has focus".
//! 4. After the surface closes the list is empty and stays empty.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use spacestack_core::logging::{debug, trace};
use spacestack_core::{HostSurface, Notifier, Rect, RegionGroup, Subscription, SurfaceRef};

use crate::config::StackConfig;
use crate::error::StackError;
use crate::provider::ReservationProvider;

/// One piece of overlay content positioned by a manager.
pub trait ReservationAgent {
    fn has_focus(&self) -> bool;

    fn is_mouse_over(&self) -> bool;

    /// Choose a position given everything reserved so far and show there.
    ///
    /// Returning `None` withdraws the agent; the manager removes it.
    fn position_and_display(&self, reserved: &RegionGroup) -> Option<Rect>;

    fn hide(&self);

    fn got_focus(&self) -> &Notifier<()>;

    fn lost_focus(&self) -> &Notifier<()>;
}

/// Shared handle to an agent.
pub type AgentRef = Rc<dyn ReservationAgent>;

/// Payload of [`SpaceReservationManager::agent_changed`].
#[derive(Clone)]
pub struct AgentChange {
    pub added: Option<AgentRef>,
    pub removed: Option<AgentRef>,
}

impl fmt::Debug for AgentChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentChange")
            .field("added", &self.added.is_some())
            .field("removed", &self.removed.is_some())
            .finish()
    }
}

struct AgentEntry {
    agent: AgentRef,
    got_focus: Subscription,
    lost_focus: Subscription,
}

impl AgentEntry {
    fn release(self) -> AgentRef {
        self.got_focus.revoke();
        self.lost_focus.revoke();
        self.agent
    }
}

struct ManagerShared {
    surface: Weak<dyn HostSurface>,
    hide_when_invisible: bool,
    agents: RefCell<Vec<AgentEntry>>,
    has_focus: Cell<bool>,
    got_focus: Notifier<()>,
    lost_focus: Notifier<()>,
    agent_changed: Notifier<AgentChange>,
    surface_closed: RefCell<Option<Subscription>>,
}

/// Provider that positions a list of agents.
pub struct SpaceReservationManager {
    shared: Rc<ManagerShared>,
}

impl SpaceReservationManager {
    /// Manager bound to `surface` that hides its agents while the surface
    /// is invisible.
    #[must_use]
    pub fn new(surface: &SurfaceRef) -> Self {
        Self::with_hide_when_invisible(surface, true)
    }

    #[must_use]
    pub fn with_hide_when_invisible(surface: &SurfaceRef, hide_when_invisible: bool) -> Self {
        let already_closed = surface.is_closed();
        let shared = Rc::new_cyclic(|weak: &Weak<ManagerShared>| {
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
            ManagerShared {
                surface: Rc::downgrade(surface),
                hide_when_invisible,
                agents: RefCell::new(Vec::new()),
                has_focus: Cell::new(false),
                got_focus: Notifier::new(),
                lost_focus: Notifier::new(),
                agent_changed: Notifier::new(),
                surface_closed: RefCell::new(surface_closed),
            }
        });
        Self { shared }
    }

    /// Provider factory for a [`ReservationStack`](crate::ReservationStack)
    /// that applies `config` to every manager it creates.
    pub fn factory(config: &StackConfig) -> impl Fn(&str, &SurfaceRef) -> Self + 'static {
        let hide_when_invisible = config.hide_when_invisible;
        move |name: &str, surface: &SurfaceRef| {
            debug!(name, hide_when_invisible, "creating space reservation manager");
            Self::with_hide_when_invisible(surface, hide_when_invisible)
        }
    }

    /// Append `agent` and start tracking its focus.
    ///
    /// # Errors
    ///
    /// - [`StackError::InvalidOperation`] once the surface has closed.
    /// - [`StackError::InvalidArgument`] if `agent` is already listed.
    pub fn add_agent(&self, agent: AgentRef) -> Result<(), StackError> {
        let shared = &self.shared;
        if shared.is_closed() {
            return Err(StackError::surface_closed());
        }
        if shared.position_of(&agent).is_some() {
            return Err(StackError::InvalidArgument {
                what: "agent already added",
            });
        }

        let entry = AgentEntry {
            got_focus: agent.got_focus().subscribe(focus_handler(shared)),
            lost_focus: agent.lost_focus().subscribe(focus_handler(shared)),
            agent: Rc::clone(&agent),
        };
        shared.agents.borrow_mut().push(entry);
        trace!(agents = shared.agents.borrow().len(), "agent added");

        shared.agent_changed.emit(&AgentChange {
            added: Some(agent),
            removed: None,
        });
        shared.update_focus();
        Ok(())
    }

    /// Remove `agent`, hiding it. Returns `false` if it was not listed.
    pub fn remove_agent(&self, agent: &AgentRef) -> bool {
        self.shared.remove(agent)
    }

    /// Listed agents, in insertion order.
    #[must_use]
    pub fn agents(&self) -> Vec<AgentRef> {
        self.shared.snapshot()
    }

    #[must_use]
    pub fn agent_changed(&self) -> &Notifier<AgentChange> {
        &self.shared.agent_changed
    }

    #[must_use]
    pub fn hide_when_invisible(&self) -> bool {
        self.shared.hide_when_invisible
    }
}

impl fmt::Debug for SpaceReservationManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpaceReservationManager")
            .field("agents", &self.shared.agents.borrow().len())
            .field("has_focus", &self.shared.has_focus.get())
            .field("hide_when_invisible", &self.shared.hide_when_invisible)
            .finish()
    }
}

impl ReservationProvider for SpaceReservationManager {
    fn is_mouse_over(&self) -> bool {
        self.shared
            .snapshot()
            .iter()
            .any(|agent| agent.is_mouse_over())
    }

    fn has_aggregate_focus(&self) -> bool {
        self.shared.has_focus.get()
    }

    fn got_aggregate_focus(&self) -> &Notifier<()> {
        &self.shared.got_focus
    }

    fn lost_aggregate_focus(&self) -> &Notifier<()> {
        &self.shared.lost_focus
    }

    fn position_and_display(&self, region: &mut RegionGroup) {
        let shared = &self.shared;
        shared.update_focus();
        if shared.is_closed() {
            return;
        }
        let agents = shared.snapshot();
        if agents.is_empty() {
            return;
        }

        let visible = shared
            .surface
            .upgrade()
            .is_some_and(|surface| surface.is_visible());
        if !visible && shared.hide_when_invisible {
            for agent in &agents {
                agent.hide();
            }
            return;
        }

        for agent in &agents {
            match agent.position_and_display(region) {
                Some(rect) => {
                    region.push(rect);
                }
                None => {
                    shared.remove(agent);
                }
            }
        }
    }
}

fn focus_handler(shared: &Rc<ManagerShared>) -> impl Fn(&()) + 'static {
    let weak = Rc::downgrade(shared);
    move |_| {
        if let Some(shared) = weak.upgrade() {
            shared.update_focus();
        }
    }
}

impl ManagerShared {
    fn is_closed(&self) -> bool {
        self.surface
            .upgrade()
            .is_none_or(|surface| surface.is_closed())
    }

    fn position_of(&self, agent: &AgentRef) -> Option<usize> {
        self.agents
            .borrow()
            .iter()
            .position(|entry| std::ptr::addr_eq(Rc::as_ptr(&entry.agent), Rc::as_ptr(agent)))
    }

    fn snapshot(&self) -> Vec<AgentRef> {
        self.agents
            .borrow()
            .iter()
            .map(|entry| Rc::clone(&entry.agent))
            .collect()
    }

    fn remove(&self, agent: &AgentRef) -> bool {
        let Some(index) = self.position_of(agent) else {
            return false;
        };
        let agent = self.agents.borrow_mut().remove(index).release();
        agent.hide();
        trace!(agents = self.agents.borrow().len(), "agent removed");

        self.agent_changed.emit(&AgentChange {
            added: None,
            removed: Some(agent),
        });
        self.update_focus();
        true
    }

    fn update_focus(&self) {
        if self.is_closed() {
            return;
        }
        let focused = self.snapshot().iter().any(|agent| agent.has_focus());
        if focused == self.has_focus.replace(focused) {
            return;
        }
        if focused {
            self.got_focus.emit(&());
        } else {
            self.lost_focus.emit(&());
        }
    }

    fn on_surface_closed(&self) {
        if let Some(sub) = self.surface_closed.borrow_mut().take() {
            sub.revoke();
        }
        let released = std::mem::take(&mut *self.agents.borrow_mut());
        let count = released.len();
        for entry in released {
            entry.release().hide();
        }
        self.has_focus.set(false);
        debug!(released = count, "space reservation manager closed");
    }
}

impl Drop for ManagerShared {
    fn drop(&mut self) {
        // Orphaned agents are hidden.
        for entry in self.agents.get_mut().drain(..) {
            entry.release().hide();
        }
    }
}
