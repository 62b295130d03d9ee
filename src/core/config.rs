//! Resolver options and configuration files.

use crate::catalog::signature::AttributeDeclaration;
use crate::core::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default cap on the number of stages the reordering search will permute.
pub const DEFAULT_MAX_PERMUTABLE_STAGES: usize = 8;

/// Largest cap a configuration may set.
///
/// The search tracks used stages in a `u32` bitmask; past this size the
/// factorial worst case is no longer a usable latency bound anyway.
pub const MAX_PERMUTABLE_CEILING: usize = 16;

/// Options controlling chain resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverOptions {
    /// Maximum number of non-pinned stages the reordering search will permute.
    /// Chains above this size are reported as unresolvable without searching.
    pub max_permutable_stages: usize,
    /// Whether to look for a missing null guard when a chain fails.
    pub suggest_guards: bool,
    /// Whether the final flow type must be assignable back to the member type.
    pub require_assignable_result: bool,
    /// Whether to analyze members in parallel.
    pub parallel: bool,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            max_permutable_stages: DEFAULT_MAX_PERMUTABLE_STAGES,
            suggest_guards: true,
            require_assignable_result: false,
            parallel: true,
        }
    }
}

impl ResolverOptions {
    /// Create options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the permutation cap.
    pub fn with_max_permutable_stages(mut self, max: usize) -> Self {
        self.max_permutable_stages = max;
        self
    }

    /// Enable/disable null guard suggestions.
    pub fn with_guard_suggestions(mut self, enabled: bool) -> Self {
        self.suggest_guards = enabled;
        self
    }

    /// Enable/disable the assignment-back check.
    pub fn with_assignable_result(mut self, required: bool) -> Self {
        self.require_assignable_result = required;
        self
    }

    /// Enable/disable parallel analysis.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Check that the options are usable.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_permutable_stages == 0 || self.max_permutable_stages > MAX_PERMUTABLE_CEILING {
            return Err(ConfigError::Invalid(format!(
                "max_permutable_stages must be between 1 and {}, got {}",
                MAX_PERMUTABLE_CEILING, self.max_permutable_stages
            )));
        }
        Ok(())
    }
}

/// Contents of a configuration file.
///
/// ```toml
/// include_builtins = true
///
/// [resolver]
/// max_permutable_stages = 6
///
/// [[attribute]]
/// name = "Slug"
/// signatures = [["string"]]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Whether the built-in attribute declarations are loaded before `attributes`.
    pub include_builtins: bool,
    /// Resolver options.
    pub resolver: ResolverOptions,
    /// Additional (or overriding) attribute declarations.
    #[serde(rename = "attribute")]
    pub attributes: Vec<AttributeDeclaration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            include_builtins: true,
            resolver: ResolverOptions::default(),
            attributes: Vec::new(),
        }
    }
}

impl Config {
    /// Parse from a TOML string and validate.
    pub fn from_toml(text: &str) -> ConfigResult<Self> {
        let config: Config = toml::from_str(text)?;
        config.resolver.validate()?;
        Ok(config)
    }

    /// Load from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&text)
    }
}
