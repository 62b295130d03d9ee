//! Error types for attrchain.
//!
//! Incompatible or unresolvable chains are not errors: they are reported as
//! structured results and diagnostics. The errors here cover malformed
//! configuration, malformed catalogs and malformed host input.

use crate::core::types::{TypeParseError, TypeRef};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Top-level error type for attrchain.
#[derive(Error, Debug)]
pub enum AttrChainError {
    #[error("Catalog error: {} malformed attribute type(s): {}", .0.len(), join_errors(.0))]
    Catalog(Vec<CatalogError>),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Input error: {0}")]
    Input(#[from] InputError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<Vec<CatalogError>> for AttrChainError {
    fn from(errors: Vec<CatalogError>) -> Self {
        AttrChainError::Catalog(errors)
    }
}

fn join_errors(errors: &[CatalogError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// A malformed attribute type, detected while building the catalog.
///
/// At most one of these is produced per attribute type.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CatalogError {
    #[error("attribute '{attribute}' declares no signatures")]
    EmptySignatures { attribute: String },

    #[error("attribute '{attribute}' has a signature with {arity} type argument(s); expected 1 or 2")]
    InvalidArity { attribute: String, arity: usize },

    #[error("attribute '{attribute}' is ambiguous: input '{input}' maps to both '{first}' and '{second}'")]
    AmbiguousSignatures {
        attribute: String,
        input: TypeRef,
        first: TypeRef,
        second: TypeRef,
    },
}

impl CatalogError {
    /// Name of the attribute type this error is about.
    pub fn attribute(&self) -> &str {
        match self {
            CatalogError::EmptySignatures { attribute }
            | CatalogError::InvalidArity { attribute, .. }
            | CatalogError::AmbiguousSignatures { attribute, .. } => attribute,
        }
    }
}

/// Errors loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Errors in the host-supplied member descriptions.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputError {
    #[error("unknown attribute '{attribute}' on member '{member}'")]
    UnknownAttribute { member: String, attribute: String },

    #[error("invalid type on member '{member}': {error}")]
    InvalidType { member: String, error: TypeParseError },

    #[error("unsupported input format version {found} (supported: {supported})")]
    UnsupportedVersion { found: String, supported: String },
}

/// Result type alias for attrchain operations.
pub type AttrChainResult<T> = Result<T, AttrChainError>;

/// Result type alias for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type alias for input conversion.
pub type InputResult<T> = Result<T, InputError>;
