#![forbid(unsafe_code)]

//! Provider contract consumed by the reservation stack.

use spacestack_core::{Notifier, RegionGroup, SurfaceRef};

/// A named overlay-content manager owned by a
/// [`ReservationStack`](crate::ReservationStack).
///
/// Methods take `&self`: the stack hands providers out as `Rc<P>`, so
/// implementations keep their mutable state behind `Cell`/`RefCell`.
///
/// Focus notifiers must be emitted with no internal borrow held; the stack's
/// handler calls back into [`has_aggregate_focus`](Self::has_aggregate_focus)
/// on every provider it owns.
pub trait ReservationProvider: 'static {
    /// Whether the pointer is over any content this provider shows.
    fn is_mouse_over(&self) -> bool;

    /// Whether any content this provider shows has keyboard focus.
    fn has_aggregate_focus(&self) -> bool;

    /// Fires when [`has_aggregate_focus`](Self::has_aggregate_focus) becomes true.
    fn got_aggregate_focus(&self) -> &Notifier<()>;

    /// Fires when [`has_aggregate_focus`](Self::has_aggregate_focus) becomes false.
    fn lost_aggregate_focus(&self) -> &Notifier<()>;

    /// Position and show this provider's content.
    ///
    /// `region` already holds everything reserved by providers positioned
    /// earlier in the same refresh. Implementations may append to it but
    /// cannot remove anything.
    fn position_and_display(&self, region: &mut RegionGroup);
}

/// Builds the provider for a slot the first time its name is requested.
pub trait ProviderFactory<P> {
    fn create(&self, name: &str, surface: &SurfaceRef) -> P;
}

impl<P, F> ProviderFactory<P> for F
where
    F: Fn(&str, &SurfaceRef) -> P,
{
    fn create(&self, name: &str, surface: &SurfaceRef) -> P {
        self(name, surface)
    }
}
