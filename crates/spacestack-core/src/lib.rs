#![forbid(unsafe_code)]

//! Core: geometry, notifications, and the host-surface contract.
//!
//! # Role in spacestack
//! `spacestack-core` holds the pieces every space-reservation participant
//! agrees on. The stack itself lives in the `spacestack` crate and only talks
//! to surfaces, providers, and agents through the types defined here.
//!
//! # Primary responsibilities
//! - **Rect**: cell-space rectangles used for viewports and agent regions.
//! - **RegionGroup**: append-only accumulator shared across one refresh pass.
//! - **Notifier / Subscription**: single-threaded multicast notifications with
//!   revocable handles.
//! - **HostSurface**: the closed/visible/viewport contract of a text view, plus
//!   the concrete [`TextViewSurface`].
//!
//! # Threading
//! Everything here is `Rc`/`Cell` based and therefore `!Send`. A surface, its
//! stack, and all providers live on the thread that owns the view.

pub mod geometry;
pub mod logging;
pub mod notify;
pub mod region;
pub mod surface;

pub use geometry::Rect;
pub use notify::{Notifier, Subscription};
pub use region::RegionGroup;
pub use surface::{HostSurface, SurfaceRef, TextViewSurface};
