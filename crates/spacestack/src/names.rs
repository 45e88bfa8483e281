//! Predefined space reservation manager names.
//!
//! Hosts usually build their name table from these. Order matters: managers
//! earlier in the table are positioned first during a refresh, so later ones
//! see (and can avoid) the space they reserved.

pub const COMPLETION: &str = "completion";
pub const SIGNATURE_HELP: &str = "signaturehelp";
pub const QUICK_INFO: &str = "quickinfo";
pub const SMART_TAG: &str = "smarttag";

/// Default stacking order.
pub const DEFAULT_ORDER: [&str; 4] = [COMPLETION, SIGNATURE_HELP, QUICK_INFO, SMART_TAG];
