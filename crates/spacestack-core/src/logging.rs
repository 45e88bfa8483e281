#![forbid(unsafe_code)]

//! Logging helpers.
//!
//! All crates log through `tracing`. Libraries never install a subscriber;
//! hosts that want structured output can call [`init_json`] (feature
//! `tracing-json`), which reads its filter from `SPACESTACK_LOG` and falls
//! back to `info`.

pub use tracing::{debug, debug_span, error, info, trace, warn};

/// Environment variable holding the `EnvFilter` directive string.
pub const LOG_ENV: &str = "SPACESTACK_LOG";

/// Install a global JSON subscriber.
///
/// Fails if a global subscriber is already installed.
#[cfg(feature = "tracing-json")]
pub fn init_json() -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .try_init()
}
