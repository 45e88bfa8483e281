#![forbid(unsafe_code)]

//! Space reservation stack for a text view.
//!
//! # Role in spacestack
//! A text view hosts several kinds of overlay content (completion lists,
//! signature help, quick info, smart tags). Each kind is owned by a named
//! provider. The [`ReservationStack`] creates those providers on demand,
//! tells the host whether any of them holds keyboard focus, and positions
//! them in a fixed order so later ones avoid space earlier ones reserved.
//!
//! # Primary responsibilities
//! - **ReservationStack**: lazy named slots, aggregate focus, refresh, and
//!   teardown when the surface closes.
//! - **SpaceReservationManager**: the stock provider, hosting a list of
//!   [`ReservationAgent`]s.
//! - **StackConfig**: name table and visibility policy, env-overridable.
//!
//! # Example
//! ```
//! use std::rc::Rc;
//! use spacestack::{names, ReservationStack, SpaceReservationManager, StackConfig};
//! use spacestack_core::{Rect, TextViewSurface};
//!
//! let surface = TextViewSurface::shared(Rect::from_size(80, 24));
//! let config = StackConfig::default();
//! let stack = ReservationStack::<SpaceReservationManager>::builder()
//!     .surface(&surface)
//!     .config(&config)
//!     .factory(SpaceReservationManager::factory(&config))
//!     .build()
//!     .unwrap();
//!
//! let quick_info = stack.get_provider(names::QUICK_INFO).unwrap();
//! assert!(Rc::ptr_eq(&quick_info, &stack.get_provider(names::QUICK_INFO).unwrap()));
//! assert!(stack.refresh().is_some());
//!
//! surface.close();
//! assert!(stack.is_closed());
//! ```

pub mod config;
pub mod error;
pub mod manager;
pub mod names;
pub mod provider;
pub mod stack;

pub use config::{ConfigError, StackConfig, StackConfigParse};
pub use error::StackError;
pub use manager::{AgentChange, AgentRef, ReservationAgent, SpaceReservationManager};
pub use provider::{ProviderFactory, ReservationProvider};
pub use stack::{ReservationStack, StackBuilder, StackSnapshot, StackState};
