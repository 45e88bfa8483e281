#![forbid(unsafe_code)]

//! Error taxonomy for stack and manager calls.

use std::fmt;

/// Errors surfaced synchronously by [`ReservationStack`](crate::ReservationStack)
/// and [`SpaceReservationManager`](crate::SpaceReservationManager).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StackError {
    /// A required input was missing or empty.
    InvalidArgument { what: &'static str },
    /// The call is not allowed in the current lifecycle state.
    InvalidOperation { reason: &'static str },
    /// The name is not part of the stack's name table.
    NotFound { name: String },
}

impl StackError {
    pub(crate) fn surface_closed() -> Self {
        Self::InvalidOperation {
            reason: "host surface is closed",
        }
    }
}

impl fmt::Display for StackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument { what } => write!(f, "invalid argument: {what}"),
            Self::InvalidOperation { reason } => write!(f, "invalid operation: {reason}"),
            Self::NotFound { name } => write!(f, "no space reservation manager named '{name}'"),
        }
    }
}

impl std::error::Error for StackError {}
