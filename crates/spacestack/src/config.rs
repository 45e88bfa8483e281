#![forbid(unsafe_code)]

//! Stack configuration (env-overridable).
//!
//! # Environment Variables
//! - `SPACESTACK_NAMES`: comma-separated name table, in stacking order
//! - `SPACESTACK_HIDE_WHEN_INVISIBLE` (bool)

use std::env;
use std::fmt;

use spacestack_core::logging::warn;

use crate::names;

const ENV_NAMES: &str = "SPACESTACK_NAMES";
const ENV_HIDE_WHEN_INVISIBLE: &str = "SPACESTACK_HIDE_WHEN_INVISIBLE";

/// Configuration shared by a stack and the managers it creates.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StackConfig {
    /// Manager names in stacking order.
    pub names: Vec<String>,
    /// Hide every agent instead of positioning it while the surface is hidden.
    pub hide_when_invisible: bool,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            names: names::DEFAULT_ORDER.iter().map(|n| (*n).to_owned()).collect(),
            hide_when_invisible: true,
        }
    }
}

/// Configuration parse diagnostics (env + validation).
#[derive(Debug, Clone)]
pub struct StackConfigParse {
    pub config: StackConfig,
    pub errors: Vec<ConfigError>,
}

/// Configuration error with field context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub field: &'static str,
    pub value: String,
    pub message: String,
}

impl ConfigError {
    fn new(field: &'static str, value: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={} ({})", self.field, self.value, self.message)
    }
}

impl std::error::Error for ConfigError {}

impl StackConfig {
    /// Parse config from environment variables, logging any diagnostics.
    #[must_use]
    pub fn from_env() -> StackConfig {
        let parsed = Self::from_env_with_diagnostics();
        for err in &parsed.errors {
            warn!(field = err.field, value = %err.value, "{}", err.message);
        }
        parsed.config
    }

    /// Parse config from environment variables and return diagnostics.
    #[must_use]
    pub fn from_env_with_diagnostics() -> StackConfigParse {
        from_env_with(|key| env::var(key).ok())
    }

    /// Validate config constraints and return all violations.
    ///
    /// Duplicate names are reported even though a stack accepts them (the
    /// first occurrence wins and later ones are unreachable).
    pub fn validate(&self) -> Result<(), Vec<ConfigError>> {
        let mut errors = Vec::new();
        for (index, name) in self.names.iter().enumerate() {
            if name.trim().is_empty() {
                errors.push(ConfigError::new(
                    "names",
                    format!("#{index}"),
                    "manager names must be non-empty",
                ));
            } else if self.names[..index].contains(name) {
                errors.push(ConfigError::new(
                    "names",
                    name.clone(),
                    "duplicate manager name is unreachable",
                ));
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn from_env_with<F>(mut get: F) -> StackConfigParse
where
    F: FnMut(&str) -> Option<String>,
{
    let mut config = StackConfig::default();
    let mut errors = Vec::new();

    if let Some(value) = get(ENV_NAMES) {
        config.names = parse_names(&value);
    }

    if let Some(value) = get(ENV_HIDE_WHEN_INVISIBLE) {
        match parse_bool(&value) {
            Some(parsed) => config.hide_when_invisible = parsed,
            None => errors.push(ConfigError::new(
                "hide_when_invisible",
                value,
                "expected bool (1/0/true/false)",
            )),
        }
    }

    if let Err(mut invalid) = config.validate() {
        errors.append(&mut invalid);
    }

    StackConfigParse { config, errors }
}

fn parse_names(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|name| name.trim().to_owned())
        .collect()
}

#[inline]
fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
