//! Container configuration.
//!
//! The strictness switches decide whether ambiguous or mismatched requests
//! fail or fall back to a deterministic choice. They can be set in code,
//! read from environment variables, or (with the `config` feature) loaded
//! from JSON.

use std::env;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

use crate::error::{DiError, DiResult};

/// Default environment variable prefix for [`ContainerConfig::from_env`].
pub const DEFAULT_ENV_PREFIX: &str = "LIFECYCLE_DI";

const DEFAULT_MAX_RESOLUTION_DEPTH: usize = 1024;

/// Behavioural switches for a [`Container`](crate::Container).
///
/// All three strictness switches default to `true`: ambiguity and policy
/// coercion are reported as errors unless explicitly relaxed.
///
/// # Examples
///
/// ```rust
/// use lifecycle_di::{Container, ContainerConfig};
///
/// let config = ContainerConfig::default()
///     .throw_on_multiple_resolutions(false)
///     .exactly_once_singletons(true);
/// assert!(!config.throw_on_multiple_resolutions);
/// assert!(config.throw_on_storage_rule_coercion);
///
/// let container = Container::with_config(config);
/// assert!(container.config().exactly_once_singletons);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct ContainerConfig {
    /// Fail when several contracts qualify and no tie-break picks one
    pub throw_on_multiple_resolutions: bool,
    /// Fail when no contract carries the requested storage policy
    pub throw_on_storage_rule_coercion: bool,
    /// Fail when more than one owner type is registered for a requested type
    pub throw_when_more_than_one_owner_contract: bool,
    /// Maximum nesting of constructions before `DepthExceeded`
    pub max_resolution_depth: usize,
    /// Keep the first stored instance when two constructions race
    pub exactly_once_singletons: bool,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            throw_on_multiple_resolutions: true,
            throw_on_storage_rule_coercion: true,
            throw_when_more_than_one_owner_contract: true,
            max_resolution_depth: DEFAULT_MAX_RESOLUTION_DEPTH,
            exactly_once_singletons: false,
        }
    }
}

impl ContainerConfig {
    /// Every strictness switch off: ambiguity picks the first candidate and
    /// policy mismatches coerce to the registered policy.
    pub fn lenient() -> Self {
        Self {
            throw_on_multiple_resolutions: false,
            throw_on_storage_rule_coercion: false,
            throw_when_more_than_one_owner_contract: false,
            ..Self::default()
        }
    }

    pub fn throw_on_multiple_resolutions(mut self, value: bool) -> Self {
        self.throw_on_multiple_resolutions = value;
        self
    }

    pub fn throw_on_storage_rule_coercion(mut self, value: bool) -> Self {
        self.throw_on_storage_rule_coercion = value;
        self
    }

    pub fn throw_when_more_than_one_owner_contract(mut self, value: bool) -> Self {
        self.throw_when_more_than_one_owner_contract = value;
        self
    }

    pub fn max_resolution_depth(mut self, depth: usize) -> Self {
        self.max_resolution_depth = depth;
        self
    }

    pub fn exactly_once_singletons(mut self, value: bool) -> Self {
        self.exactly_once_singletons = value;
        self
    }

    /// Reads overrides from `LIFECYCLE_DI_*` environment variables.
    pub fn from_env() -> DiResult<Self> {
        Self::from_env_with_prefix(DEFAULT_ENV_PREFIX)
    }

    /// Reads overrides from `{PREFIX}_THROW_ON_MULTIPLE_RESOLUTIONS`,
    /// `{PREFIX}_THROW_ON_STORAGE_RULE_COERCION`,
    /// `{PREFIX}_THROW_WHEN_MORE_THAN_ONE_OWNER_CONTRACT`,
    /// `{PREFIX}_MAX_RESOLUTION_DEPTH` and `{PREFIX}_EXACTLY_ONCE_SINGLETONS`.
    /// Unset variables keep their defaults.
    pub fn from_env_with_prefix(prefix: &str) -> DiResult<Self> {
        let var = |name: &str| env::var(format!("{}_{}", prefix.to_uppercase(), name)).ok();
        let mut config = Self::default();

        if let Some(raw) = var("THROW_ON_MULTIPLE_RESOLUTIONS") {
            config.throw_on_multiple_resolutions = parse_bool("THROW_ON_MULTIPLE_RESOLUTIONS", &raw)?;
        }
        if let Some(raw) = var("THROW_ON_STORAGE_RULE_COERCION") {
            config.throw_on_storage_rule_coercion = parse_bool("THROW_ON_STORAGE_RULE_COERCION", &raw)?;
        }
        if let Some(raw) = var("THROW_WHEN_MORE_THAN_ONE_OWNER_CONTRACT") {
            config.throw_when_more_than_one_owner_contract =
                parse_bool("THROW_WHEN_MORE_THAN_ONE_OWNER_CONTRACT", &raw)?;
        }
        if let Some(raw) = var("MAX_RESOLUTION_DEPTH") {
            config.max_resolution_depth = raw.trim().parse().map_err(|_| {
                DiError::InvalidConfig(format!("MAX_RESOLUTION_DEPTH is not a number: {}", raw))
            })?;
        }
        if let Some(raw) = var("EXACTLY_ONCE_SINGLETONS") {
            config.exactly_once_singletons = parse_bool("EXACTLY_ONCE_SINGLETONS", &raw)?;
        }

        Ok(config)
    }

    /// Parses a JSON document; missing fields keep their defaults.
    #[cfg(feature = "config")]
    pub fn from_json_str(json: &str) -> DiResult<Self> {
        serde_json::from_str(json).map_err(|e| DiError::InvalidConfig(e.to_string()))
    }

    #[cfg(feature = "config")]
    pub fn to_json_string(&self) -> DiResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| DiError::InvalidConfig(e.to_string()))
    }
}

fn parse_bool(name: &str, raw: &str) -> DiResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(DiError::InvalidConfig(format!("{} is not a boolean: {}", name, raw))),
    }
}
